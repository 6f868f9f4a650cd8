//! Network seam between the fetcher and the relays.

use async_trait::async_trait;
use courier_error::{FetchError, FetchResult, HttpError, TransientCause};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use tracing::{debug, instrument};

/// Request body forwarded through a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` body
    Form(String),
    /// `application/json` body
    Json(String),
}

impl RequestBody {
    /// MIME type sent with this body.
    pub fn content_type(&self) -> &'static str {
        match self {
            RequestBody::Form(_) => "application/x-www-form-urlencoded",
            RequestBody::Json(_) => "application/json",
        }
    }

    /// Raw body text.
    pub fn as_str(&self) -> &str {
        match self {
            RequestBody::Form(body) | RequestBody::Json(body) => body,
        }
    }
}

/// A single network request, already wrapped in a relay URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    /// HTTP method
    pub method: Method,
    /// Fully relayed URL
    pub url: String,
    /// Optional body for non-GET methods
    pub body: Option<RequestBody>,
}

/// Status and body returned by a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl RelayResponse {
    /// Create a response from status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one request and returns whatever the relay answered.
///
/// Implementations report only transport failures as errors; status codes are
/// returned as-is and classified by the fetcher.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Send a request and return its status and body.
    async fn send(&self, request: RelayRequest) -> FetchResult<RelayResponse>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RelayTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: RelayRequest) -> FetchResult<RelayResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, body.content_type())
                .body(body.as_str().to_owned());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::transient(TransientCause::Connection(e.to_string())))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transient(TransientCause::Connection(e.to_string())))?;
        debug!(status, bytes = body.len(), "Relay responded");

        Ok(RelayResponse { status, body })
    }
}

//! Client for the external content scoring service.
//!
//! The service is opaque: items go out as a minimized JSON batch and scores
//! come back unchanged. Calls are direct (not relayed), made once, and never
//! cached.

use crate::{ClassifierConfig, Comment, Post};
use courier_error::{ConfigError, CourierResult, FetchError, JsonError, TransientCause};
use courier_fetch::{RelayRequest, RelayTransport, RequestBody, classify_response};
use derive_getters::Getters;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// One item submitted for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ScoreItem {
    /// Caller's identifier, echoed back in the score
    id: String,
    /// Headline
    title: String,
    /// Body text, truncated before sending
    text: String,
}

impl ScoreItem {
    /// Create an item.
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
        }
    }

    fn truncated(&self, max_chars: usize) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            text: self.text.chars().take(max_chars).collect(),
        }
    }
}

impl From<&Post> for ScoreItem {
    fn from(post: &Post) -> Self {
        Self::new(post.name(), post.title(), post.selftext())
    }
}

impl From<&Comment> for ScoreItem {
    fn from(comment: &Comment) -> Self {
        Self::new(comment.name(), "", comment.body())
    }
}

/// Score returned for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ContentScore {
    /// Identifier of the scored item
    id: String,
    /// Service-defined score
    score: f64,
    /// Optional explanation
    #[serde(default)]
    reason: Option<String>,
    /// Whether the service flagged the item
    #[serde(default)]
    flagged: bool,
}

/// Sends item batches to the scoring endpoint.
#[derive(Clone)]
pub struct ClassifierClient {
    endpoint: String,
    max_text_chars: usize,
    timeout: Duration,
    transport: Arc<dyn RelayTransport>,
}

impl std::fmt::Debug for ClassifierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierClient")
            .field("endpoint", &self.endpoint)
            .field("max_text_chars", &self.max_text_chars)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ClassifierClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured.
    pub fn new(
        config: &ClassifierConfig,
        timeout: Duration,
        transport: Arc<dyn RelayTransport>,
    ) -> Result<Self, ConfigError> {
        let endpoint = config
            .endpoint()
            .clone()
            .ok_or_else(|| ConfigError::new("No classifier endpoint configured"))?;
        Ok(Self {
            endpoint,
            max_text_chars: *config.max_text_chars(),
            timeout,
            transport,
        })
    }

    /// Score a batch of items with a single request.
    ///
    /// # Errors
    ///
    /// Returns a fetch error when the request fails or times out, or a JSON
    /// error when the response is not a list of scores.
    #[instrument(skip(self, items, cancel), fields(items = items.len()))]
    pub async fn score(
        &self,
        items: &[ScoreItem],
        cancel: &CancellationToken,
    ) -> CourierResult<Vec<ContentScore>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let batch: Vec<ScoreItem> = items
            .iter()
            .map(|item| item.truncated(self.max_text_chars))
            .collect();
        let body = serde_json::to_string(&batch)
            .map_err(|e| JsonError::new(format!("Failed to encode score batch: {}", e)))?;
        let request = RelayRequest {
            method: Method::POST,
            url: self.endpoint.clone(),
            body: Some(RequestBody::Json(body)),
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::cancelled().into()),
            result = tokio::time::timeout(self.timeout, self.transport.send(request)) => result
                .map_err(|_| FetchError::transient(TransientCause::Timeout(self.timeout)))??,
        };

        let value = classify_response(response.status, &response.body)?;
        let scores: Vec<ContentScore> = serde_json::from_value(value)
            .map_err(|e| JsonError::new(format!("Malformed score response: {}", e)))?;
        debug!(scores = scores.len(), "Received scores");
        Ok(scores)
    }
}


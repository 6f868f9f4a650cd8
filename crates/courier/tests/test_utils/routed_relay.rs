//! Relay transport that answers by inspecting each request.

use async_trait::async_trait;
use courier::{FetchResult, RelayRequest, RelayResponse, RelayTransport};
use std::sync::Mutex;
use std::time::Duration;

use super::RELAY_PREFIX;

/// A routed reply.
#[derive(Debug, Clone)]
pub struct Routed {
    pub status: u16,
    pub body: String,
    pub latency: Duration,
}

impl Routed {
    /// 200 with a JSON body and no latency.
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            latency: Duration::ZERO,
        }
    }

    /// Status with an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            latency: Duration::ZERO,
        }
    }

    /// Delay the reply.
    pub fn after(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

type Route = Box<dyn Fn(&RelayRequest) -> Routed + Send + Sync>;

/// Mock relay that routes each request through a closure.
pub struct RoutedRelay {
    route: Route,
    calls: Mutex<Vec<RelayRequest>>,
    completed: Mutex<Vec<String>>,
}

impl RoutedRelay {
    /// Create a relay answering with `route`.
    pub fn new(route: impl Fn(&RelayRequest) -> Routed + Send + Sync + 'static) -> Self {
        Self {
            route: Box::new(route),
            calls: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Upstream URLs requested, with the relay prefix removed.
    pub fn targets(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| target(call).to_string())
            .collect()
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<RelayRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Request bodies in completion order.
    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

/// Upstream URL of a relayed request.
pub fn target(request: &RelayRequest) -> &str {
    request
        .url
        .strip_prefix(RELAY_PREFIX)
        .unwrap_or(&request.url)
}

#[async_trait]
impl RelayTransport for RoutedRelay {
    async fn send(&self, request: RelayRequest) -> FetchResult<RelayResponse> {
        self.calls.lock().unwrap().push(request.clone());
        let routed = (self.route)(&request);
        if !routed.latency.is_zero() {
            tokio::time::sleep(routed.latency).await;
        }
        let body = request
            .body
            .as_ref()
            .map(|b| b.as_str().to_string())
            .unwrap_or_default();
        self.completed.lock().unwrap().push(body);
        Ok(RelayResponse::new(routed.status, routed.body))
    }
}

//! Scripted relay transport for testing.

use async_trait::async_trait;
use courier_error::{FetchError, FetchResult, TransientCause};
use courier_fetch::{RelayRequest, RelayResponse, RelayTransport};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// A single scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Respond with a status and body
    Respond(u16, String),
    /// Fail to connect
    ConnectionFailure,
    /// Never answer within any reasonable deadline
    Hang,
}

impl MockReply {
    /// 200 with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Respond(200, body.into())
    }

    /// Status with an empty body.
    pub fn status(status: u16) -> Self {
        Self::Respond(status, String::new())
    }
}

/// Behavior configuration for the mock relay.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always reply the same way
    Always(MockReply),
    /// Reply in order; the last reply repeats once the script runs out
    Sequence(Vec<MockReply>),
}

/// One request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub request: RelayRequest,
}

/// Mock relay transport.
///
/// Records every request with its start time and tracks how many requests
/// were in flight at once.
pub struct MockRelay {
    behavior: MockBehavior,
    latency: Duration,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockRelay {
    /// Create a mock relay with the given behavior and no latency.
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Always reply with the same status and body.
    pub fn new_always(reply: MockReply) -> Self {
        Self::new(MockBehavior::Always(reply))
    }

    /// Reply with a scripted sequence.
    pub fn new_sequence(replies: Vec<MockReply>) -> Self {
        Self::new(MockBehavior::Sequence(replies))
    }

    /// Simulate time spent on the network per request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of simultaneously in-flight requests.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, request: RelayRequest) -> MockReply {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(RecordedCall {
            at: Instant::now(),
            request,
        });

        match &self.behavior {
            MockBehavior::Always(reply) => reply.clone(),
            MockBehavior::Sequence(replies) => replies
                .get(index)
                .or_else(|| replies.last())
                .cloned()
                .unwrap_or(MockReply::ConnectionFailure),
        }
    }
}

#[async_trait]
impl RelayTransport for MockRelay {
    async fn send(&self, request: RelayRequest) -> FetchResult<RelayResponse> {
        let reply = self.next_reply(request);
        let _in_flight = InFlight::enter(&self.in_flight, &self.peak_in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match reply {
            MockReply::Respond(status, body) => Ok(RelayResponse::new(status, body)),
            MockReply::ConnectionFailure => Err(FetchError::transient(TransientCause::Connection(
                "connection refused".to_string(),
            ))),
            MockReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(RelayResponse::new(504, ""))
            }
        }
    }
}

/// Counts a request as in flight until dropped, including on timeout.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

//! Resilient fetcher: cache, admission, relay rotation and retry.

use crate::{
    AdmissionQueue, BackoffSchedule, FetchConfig, RelayBuilder, RelayDirectory, RelayRequest,
    RelayTransport, RequestBody,
};
use courier_cache::{CachedResponse, ResourceCategory, ResponseCache};
use courier_error::{FetchError, FetchErrorKind, FetchResult, RetryableError, TransientCause};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Method;
use serde_json::Value as JsonValue;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_retry2::{Retry, RetryError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One logical request handed to the fetcher.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: String,
    method: Method,
    body: Option<RequestBody>,
    bypass_cache: bool,
    cancel: CancellationToken,
}

impl FetchRequest {
    /// GET request for a canonical URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            body: None,
            bypass_cache: false,
            cancel: CancellationToken::new(),
        }
    }

    /// POST request with a url-encoded form body.
    pub fn post_form(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            body: Some(RequestBody::Form(body.into())),
            bypass_cache: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Skip the cache read and defeat intermediate caches.
    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Observe a shared cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Canonical URL, also the cache key.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Only GET results are read from and written to the cache.
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET
    }
}

/// Turns logical requests into completed network operations.
///
/// A request whose payload is cached returns without touching the queue.
/// Otherwise its whole attempt sequence occupies one admission slot: attempt
/// `n` uses relay `n mod len` from this call's order, waits out the backoff
/// delay first, and is bounded by the per-attempt deadline.
///
/// # Example
///
/// ```rust,ignore
/// let fetcher = ResilientFetcher::new(config, directory, ResponseCache::default(), transport);
/// let listing = fetcher
///     .fetch(FetchRequest::get("https://www.reddit.com/r/rust/hot.json?limit=25"))
///     .await?;
/// ```
pub struct ResilientFetcher {
    config: FetchConfig,
    directory: RelayDirectory,
    queue: AdmissionQueue,
    cache: Mutex<ResponseCache>,
    transport: Arc<dyn RelayTransport>,
    backoff: BackoffSchedule,
    jitter_rng: Mutex<StdRng>,
    pacer: Option<Arc<DirectRateLimiter>>,
}

impl std::fmt::Debug for ResilientFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientFetcher")
            .field("config", &self.config)
            .field("directory", &self.directory)
            .field("queue", &self.queue)
            .field("backoff", &self.backoff)
            .field("paced", &self.pacer.is_some())
            .finish_non_exhaustive()
    }
}

impl ResilientFetcher {
    /// Create a fetcher that owns its queue and cache.
    pub fn new(
        config: FetchConfig,
        directory: RelayDirectory,
        cache: ResponseCache,
        transport: Arc<dyn RelayTransport>,
    ) -> Self {
        let queue = AdmissionQueue::new(*config.max_concurrent());
        let backoff = BackoffSchedule::new(config.base_backoff(), config.max_jitter());
        let pacer = (*config.requests_per_minute())
            .and_then(NonZeroU32::new)
            .map(|rpm| {
                // Burst of one spaces attempts evenly at 60s / rpm.
                let quota = Quota::per_minute(rpm).allow_burst(NonZeroU32::MIN);
                Arc::new(GovernorRateLimiter::direct(quota))
            });

        info!(
            max_concurrent = queue.max_concurrent(),
            max_retries = config.max_retries(),
            relays = directory.relays().len(),
            "Created resilient fetcher"
        );

        Self {
            config,
            directory,
            queue,
            cache: Mutex::new(cache),
            transport,
            backoff,
            jitter_rng: Mutex::new(StdRng::from_entropy()),
            pacer,
        }
    }

    /// Replace the jitter source, for reproducible backoff delays.
    pub fn with_jitter_rng(self, rng: StdRng) -> Self {
        Self {
            jitter_rng: Mutex::new(rng),
            ..self
        }
    }

    /// Fetcher configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Admission queue shared by every request of this fetcher.
    pub fn queue(&self) -> &AdmissionQueue {
        &self.queue
    }

    /// Number of cached entries, expired ones included until read.
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Drop every cached entry.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Snapshot of the cache entry for a canonical URL.
    pub fn cached_entry(&self, url: &str) -> Option<CachedResponse> {
        self.lock_cache().entry(url).cloned()
    }

    /// Fetch a JSON payload.
    ///
    /// # Errors
    ///
    /// - `Terminal` when the resource is private or removed (one attempt)
    /// - `RetryBudgetExhausted` when every attempt failed transiently
    /// - `Cancelled` when the request's token fired; nothing is cached then
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn fetch(&self, request: FetchRequest) -> FetchResult<JsonValue> {
        if request.cancel.is_cancelled() {
            return Err(FetchError::cancelled());
        }

        if request.is_cacheable() && !request.bypass_cache {
            if let Some(payload) = self.lock_cache().get(&request.url) {
                debug!("Cache hit");
                return Ok(payload);
            }
            debug!("Cache miss");
        }

        let target = if request.bypass_cache {
            with_cache_buster(&request.url)
        } else {
            request.url.clone()
        };
        let relays = self.directory.select_order(&request.method);
        if relays.is_empty() {
            return Err(FetchError::new(FetchErrorKind::InvalidRequest(format!(
                "No relay can carry a {} request",
                request.method
            ))));
        }
        let delays = {
            let mut rng = self.jitter_rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.backoff.delays(*self.config.max_retries(), &mut *rng)
        };
        debug!(
            order = ?relays.iter().map(|r| r.name().as_str()).collect::<Vec<_>>(),
            "Selected relay order"
        );

        let payload = tokio::select! {
            biased;
            _ = request.cancel.cancelled() => Err(FetchError::cancelled()),
            result = self.queue.submit(self.run_attempts(&request, &target, &relays, delays)) => result.and_then(|attempts| attempts),
        }?;

        if request.cancel.is_cancelled() {
            return Err(FetchError::cancelled());
        }

        if request.is_cacheable() {
            let category = ResourceCategory::classify(&request.url);
            self.lock_cache()
                .put(request.url.clone(), payload.clone(), category);
            debug!(%category, "Stored response");
        }

        Ok(payload)
    }

    async fn run_attempts(
        &self,
        request: &FetchRequest,
        target: &str,
        relays: &[RelayBuilder],
        delays: Vec<Duration>,
    ) -> FetchResult<JsonValue> {
        let attempts = AtomicU32::new(0);

        let result = Retry::spawn(delays, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            let relay = &relays[n as usize % relays.len()];
            async move {
                match self.attempt(request, target, relay).await {
                    Ok(payload) => Ok(payload),
                    Err(e) if e.is_retryable() => {
                        warn!(attempt = n, relay = %relay.name(), error = %e, "Attempt failed, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        debug!(attempt = n, relay = %relay.name(), error = %e, "Permanent failure");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await;

        result.map_err(|e| {
            if e.is_retryable() {
                let made = attempts.load(Ordering::SeqCst);
                warn!(attempts = made, error = %e, "Retry budget exhausted");
                FetchError::new(FetchErrorKind::RetryBudgetExhausted {
                    attempts: made,
                    last: Box::new(e.kind),
                })
            } else {
                e
            }
        })
    }

    async fn attempt(
        &self,
        request: &FetchRequest,
        target: &str,
        relay: &RelayBuilder,
    ) -> FetchResult<JsonValue> {
        if request.cancel.is_cancelled() {
            return Err(FetchError::cancelled());
        }
        if let Some(pacer) = &self.pacer {
            pacer.until_ready().await;
        }

        let relay_request = RelayRequest {
            method: request.method.clone(),
            url: relay.build(target),
            body: request.body.clone(),
        };
        let deadline = self.config.attempt_timeout();
        let response = tokio::time::timeout(deadline, self.transport.send(relay_request))
            .await
            .map_err(|_| FetchError::transient(TransientCause::Timeout(deadline)))??;

        classify_response(response.status, &response.body)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Classify a relay response into a payload or a typed failure.
///
/// ```
/// use courier_error::FetchErrorKind;
/// use courier_fetch::classify_response;
///
/// assert!(classify_response(200, r#"{"kind":"Listing"}"#).is_ok());
/// assert!(matches!(classify_response(429, "").unwrap_err().kind, FetchErrorKind::RateLimited));
/// assert!(classify_response(404, "").unwrap_err().kind.is_terminal());
/// ```
pub fn classify_response(status: u16, body: &str) -> FetchResult<JsonValue> {
    match status {
        429 => Err(FetchError::new(FetchErrorKind::RateLimited)),
        403 | 404 => Err(FetchError::new(FetchErrorKind::Terminal {
            status: Some(status),
            message: status_message(status).to_string(),
        })),
        s if s >= 500 => Err(FetchError::transient(TransientCause::ServerError(s))),
        200..=299 => {
            let payload: JsonValue = serde_json::from_str(body)
                .map_err(|e| FetchError::transient(TransientCause::MalformedBody(e.to_string())))?;
            match embedded_error(&payload) {
                Some(kind) => Err(FetchError::new(kind)),
                None => Ok(payload),
            }
        }
        s => Err(FetchError::transient(TransientCause::UnexpectedStatus(s))),
    }
}

fn embedded_error(payload: &JsonValue) -> Option<FetchErrorKind> {
    if let Some(error) = payload.get("error") {
        let message = payload
            .get("message")
            .or_else(|| payload.get("reason"))
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Some(match error.as_u64() {
            Some(code @ (403 | 404)) => FetchErrorKind::Terminal {
                status: u16::try_from(code).ok(),
                message,
            },
            _ => FetchErrorKind::Transient(TransientCause::UpstreamError(format!(
                "{}: {}",
                error, message
            ))),
        });
    }

    let errors = payload
        .get("json")
        .and_then(|json| json.get("errors"))
        .and_then(JsonValue::as_array)?;
    if errors.is_empty() {
        return None;
    }
    Some(FetchErrorKind::Transient(TransientCause::UpstreamError(
        JsonValue::Array(errors.clone()).to_string(),
    )))
}

fn status_message(status: u16) -> &'static str {
    match status {
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Unavailable",
    }
}

/// Append a `_cb=<epoch millis>` parameter that defeats intermediate caches.
pub fn with_cache_buster(url: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}_cb={}", url, separator, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_not_found_is_terminal() {
        let err = classify_response(200, r#"{"error": 404, "message": "Not Found"}"#).unwrap_err();
        assert!(err.kind.is_terminal());
    }

    #[test]
    fn embedded_other_error_is_retryable() {
        let err = classify_response(200, r#"{"error": 500, "message": "busy"}"#).unwrap_err();
        assert!(err.is_retryable());

        let err = classify_response(200, r#"{"json": {"errors": [["RATELIMIT", "slow down"]]}}"#)
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn empty_errors_array_is_success() {
        assert!(classify_response(200, r#"{"json": {"errors": [], "data": {}}}"#).is_ok());
    }

    #[test]
    fn html_block_page_is_retryable() {
        let err = classify_response(200, "<html>blocked</html>").unwrap_err();
        assert!(matches!(
            err.kind,
            FetchErrorKind::Transient(TransientCause::MalformedBody(_))
        ));
    }

    #[test]
    fn other_statuses_are_transient() {
        for status in [400, 408, 302] {
            let err = classify_response(status, "").unwrap_err();
            assert_eq!(
                err.kind,
                FetchErrorKind::Transient(TransientCause::UnexpectedStatus(status))
            );
        }
        assert_eq!(
            classify_response(503, "").unwrap_err().kind,
            FetchErrorKind::Transient(TransientCause::ServerError(503))
        );
    }

    #[test]
    fn cache_buster_uses_right_separator() {
        assert!(with_cache_buster("https://h.test/a.json").starts_with("https://h.test/a.json?_cb="));
        assert!(with_cache_buster("https://h.test/a.json?limit=5").starts_with("https://h.test/a.json?limit=5&_cb="));
    }
}

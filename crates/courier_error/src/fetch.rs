//! Fetch error types and retry classification.

use std::time::Duration;

/// Why a relayed attempt failed in a way that may succeed on another attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TransientCause {
    /// Relay or upstream returned a 5xx status
    #[display("server error status {}", _0)]
    ServerError(u16),
    /// Relay returned a status with no specific meaning to the fetcher
    #[display("unexpected status {}", _0)]
    UnexpectedStatus(u16),
    /// Body was not valid JSON (usually an HTML block page from a relay)
    #[display("malformed body: {}", _0)]
    MalformedBody(String),
    /// Body was JSON carrying the upstream API's own error field
    #[display("upstream error: {}", _0)]
    UpstreamError(String),
    /// Attempt exceeded its deadline
    #[display("attempt timed out after {:?}", _0)]
    Timeout(Duration),
    /// Connection to the relay could not be established or was reset
    #[display("connection failed: {}", _0)]
    Connection(String),
}

/// Closed set of fetch failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum FetchErrorKind {
    /// Relay fault, malformed body, or timeout
    #[display("transient relay error: {}", _0)]
    Transient(TransientCause),
    /// HTTP 429 from the relay or upstream
    #[display("rate limited")]
    RateLimited,
    /// Resource is private or removed; retrying cannot help
    #[display("resource unavailable (status {:?}): {}", status, message)]
    Terminal {
        /// HTTP status, or the code embedded in the upstream error body
        status: Option<u16>,
        /// Short description for the caller
        message: String,
    },
    /// Every attempt failed with a transient cause
    #[display("retry budget exhausted after {} attempts, last error: {}", attempts, last)]
    RetryBudgetExhausted {
        /// Number of network attempts made
        attempts: u32,
        /// The last underlying failure
        last: Box<FetchErrorKind>,
    },
    /// The shared cancellation token fired
    #[display("request cancelled")]
    Cancelled,
    /// Request could not be built
    #[display("invalid request: {}", _0)]
    InvalidRequest(String),
}

impl FetchErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchErrorKind::Transient(_) | FetchErrorKind::RateLimited)
    }

    /// Check if this error means the resource itself is unavailable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchErrorKind::Terminal { .. })
    }
}

/// Fetch error with source location tracking.
///
/// # Examples
///
/// ```
/// use courier_error::{FetchError, FetchErrorKind, TransientCause};
///
/// let err = FetchError::new(FetchErrorKind::Transient(TransientCause::ServerError(502)));
/// assert!(format!("{}", err).contains("502"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Fetch Error: {} at line {} in {}", kind, line, file)]
pub struct FetchError {
    /// The kind of error that occurred
    pub kind: FetchErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FetchError {
    /// Create a new FetchError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FetchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a transient failure.
    #[track_caller]
    pub fn transient(cause: TransientCause) -> Self {
        Self::new(FetchErrorKind::Transient(cause))
    }

    /// Shorthand for a cancelled request.
    #[track_caller]
    pub fn cancelled() -> Self {
        Self::new(FetchErrorKind::Cancelled)
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FetchErrorKind {
        &self.kind
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use courier_error::{FetchError, FetchErrorKind, RetryableError};
///
/// let err = FetchError::new(FetchErrorKind::RateLimited);
/// assert!(err.is_retryable());
///
/// let err = FetchError::new(FetchErrorKind::Terminal {
///     status: Some(404),
///     message: "Not Found".to_string(),
/// });
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Transient relay faults and 429 responses return true. Missing or
    /// private resources, cancellation and malformed requests return false.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for FetchError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

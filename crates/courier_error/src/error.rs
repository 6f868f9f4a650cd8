//! Top-level error wrapper types.

use crate::{ConfigError, FetchError, HttpError, JsonError};

/// Foundation error enum aggregating every Courier error source.
///
/// # Examples
///
/// ```
/// use courier_error::{CourierError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: CourierError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum CourierErrorKind {
    /// Relayed fetch error
    #[from(FetchError)]
    Fetch(FetchError),
    /// HTTP client error
    #[from(HttpError)]
    Http(HttpError),
    /// Payload shape error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Courier error with kind discrimination.
///
/// # Examples
///
/// ```
/// use courier_error::{CourierError, CourierResult, ConfigError};
///
/// fn might_fail() -> CourierResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Courier Error: {}", _0)]
pub struct CourierError(Box<CourierErrorKind>);

impl CourierError {
    /// Create a new error from a kind.
    pub fn new(kind: CourierErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CourierErrorKind {
        &self.0
    }

    /// The fetch failure behind this error, if it came from the fetch layer.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self.kind() {
            CourierErrorKind::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl<T> From<T> for CourierError
where
    T: Into<CourierErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Courier operations.
pub type CourierResult<T> = std::result::Result<T, CourierError>;

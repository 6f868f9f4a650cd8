//! Error types for the Courier library.
//!
//! This crate provides the foundation error types used throughout the Courier workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! The fetch layer switches on [`FetchErrorKind`] directly, so retry decisions
//! never depend on message text.
//!
//! # Examples
//!
//! ```
//! use courier_error::{CourierResult, FetchError, FetchErrorKind};
//!
//! fn load_listing() -> CourierResult<String> {
//!     Err(FetchError::new(FetchErrorKind::RateLimited))?
//! }
//!
//! match load_listing() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod fetch;
mod http;
mod json;

pub use config::ConfigError;
pub use error::{CourierError, CourierErrorKind, CourierResult};
pub use fetch::{FetchError, FetchErrorKind, FetchResult, RetryableError, TransientCause};
pub use http::HttpError;
pub use json::JsonError;

//! Resilient relayed fetching.
//!
//! Every upstream call goes through one of several unreliable public relays.
//! This crate turns a logical request into a completed network operation:
//!
//! - [`RelayDirectory`] picks the relay order for each call
//! - [`AdmissionQueue`] bounds in-flight operations and admits waiters in order
//! - [`BackoffSchedule`] spaces retries exponentially with bounded jitter
//! - [`ResilientFetcher`] ties them together with the response cache, retrying
//!   transient faults and failing fast on missing or private resources
//!
//! The network itself sits behind the [`RelayTransport`] trait.

#![warn(missing_docs)]

mod backoff;
mod config;
mod fetcher;
mod queue;
mod relay;
mod transport;

pub use backoff::BackoffSchedule;
pub use config::{FetchConfig, FetchConfigBuilder};
pub use fetcher::{FetchRequest, ResilientFetcher, classify_response, with_cache_buster};
pub use queue::AdmissionQueue;
pub use relay::{RelayBuilder, RelayDirectory, RelayOrdering};
pub use transport::{RelayRequest, RelayResponse, RelayTransport, RequestBody, ReqwestTransport};

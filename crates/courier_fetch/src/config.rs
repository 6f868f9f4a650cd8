//! Configuration for the resilient fetcher.

use crate::RelayOrdering;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fetcher tuning: admission, retry budget, backoff and deadlines.
///
/// # Example
///
/// ```toml
/// [fetch]
/// max_concurrent = 3
/// max_retries = 3
/// base_backoff_ms = 500
/// max_jitter_ms = 250
/// attempt_timeout_ms = 10_000
/// relay_ordering = "shuffled"
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct FetchConfig {
    /// Maximum simultaneously admitted logical requests
    #[serde(default = "default_max_concurrent")]
    #[builder(default = "default_max_concurrent()")]
    max_concurrent: usize,

    /// Retries after the first attempt; a request makes at most `max_retries + 1` attempts
    #[serde(default = "default_max_retries")]
    #[builder(default = "default_max_retries()")]
    max_retries: u32,

    /// Backoff base: attempt `n` waits `base * 2^n + jitter`
    #[serde(default = "default_base_backoff_ms")]
    #[builder(default = "default_base_backoff_ms()")]
    base_backoff_ms: u64,

    /// Upper bound of the random jitter added to each backoff
    #[serde(default = "default_max_jitter_ms")]
    #[builder(default = "default_max_jitter_ms()")]
    max_jitter_ms: u64,

    /// Deadline for a single relayed attempt
    #[serde(default = "default_attempt_timeout_ms")]
    #[builder(default = "default_attempt_timeout_ms()")]
    attempt_timeout_ms: u64,

    /// Optional client-side pacing: attempts are spaced at least `60s / rpm` apart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    requests_per_minute: Option<u32>,

    /// Order in which read requests try relays
    #[serde(default)]
    #[builder(default)]
    relay_ordering: RelayOrdering,

    /// User agent sent to relays
    #[serde(default = "default_user_agent")]
    #[builder(default = "default_user_agent()")]
    user_agent: String,
}

fn default_max_concurrent() -> usize {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_jitter_ms() -> u64 {
    250
}

fn default_attempt_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    format!("courier/{}", env!("CARGO_PKG_VERSION"))
}

impl FetchConfig {
    /// Backoff base as a duration.
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    /// Jitter bound as a duration.
    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    /// Per-attempt deadline as a duration.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            requests_per_minute: None,
            relay_ordering: RelayOrdering::default(),
            user_agent: default_user_agent(),
        }
    }
}

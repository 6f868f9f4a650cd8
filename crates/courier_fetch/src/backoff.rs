//! Exponential backoff with additive jitter.

use rand::Rng;
use std::time::Duration;

/// Delay schedule between attempts of one logical request.
///
/// Attempt `n > 0` waits `base * 2^n + jitter`. Jitter is kept strictly below
/// `base`, so successive delays always increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffSchedule {
    base: Duration,
    max_jitter: Duration,
}

impl BackoffSchedule {
    /// Create a schedule; `max_jitter` is clamped below `base`.
    pub fn new(base: Duration, max_jitter: Duration) -> Self {
        let max_jitter = max_jitter.min(base.saturating_sub(Duration::from_nanos(1)));
        Self { base, max_jitter }
    }

    /// Backoff base.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Effective jitter bound.
    pub fn max_jitter(&self) -> Duration {
        self.max_jitter
    }

    /// Delay before attempt `attempt` with the given jitter.
    pub fn delay_for_attempt(&self, attempt: u32, jitter: Duration) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.base
            .saturating_mul(multiplier)
            .saturating_add(jitter.min(self.max_jitter))
    }

    /// Delays before attempts `1..=max_retries`, drawing jitter from `rng`.
    pub fn delays<R: Rng>(&self, max_retries: u32, rng: &mut R) -> Vec<Duration> {
        let jitter_bound = u64::try_from(self.max_jitter.as_nanos()).unwrap_or(u64::MAX);
        (1..=max_retries)
            .map(|attempt| {
                let jitter = Duration::from_nanos(rng.gen_range(0..=jitter_bound));
                self.delay_for_attempt(attempt, jitter)
            })
            .collect()
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(250))
    }
}

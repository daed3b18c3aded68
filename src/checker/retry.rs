// src/checker/retry.rs
// =============================================================================
// Exponential backoff between retries of one URL.
//
// Delays double on every retry: base, 2*base, 4*base, ... up to a cap.
// Two budgets bound the retries of a single URL:
// - max_retries: how many extra attempts after the first one
// - max_retry_time: total time spent *waiting* between attempts
//
// The last delay is shortened to whatever is left of the time budget, so a
// flaky host never holds a URL longer than max_retry_time in backoff.
// =============================================================================

use std::time::Duration;

use crate::config::CrawlConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub max_retry_time: Duration,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            max_retry_time: config.max_retry_time,
            base_delay: config.backoff_base,
            max_delay: config.backoff_max,
        }
    }

    /// Uncapped-by-budget delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// How long to wait before the next retry, or None when the URL is out
    /// of budget. `retries_done` counts retries already made, `waited` the
    /// backoff time already spent.
    pub fn next_delay(&self, retries_done: u32, waited: Duration) -> Option<Duration> {
        if retries_done >= self.max_retries {
            return None;
        }
        let remaining = self.max_retry_time.checked_sub(waited)?;
        if remaining.is_zero() {
            return None;
        }
        Some(self.delay_for(retries_done + 1).min(remaining))
    }
}

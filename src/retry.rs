//! Exponential backoff shared by the CSV fetcher and the translator.
//!
//! The delay before retry `n` (1-based) is:
//!
//! ```text
//! delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=250ms)
//! ```

use std::time::Duration;

use rand::{Rng, rng};

/// Bounded retry with exponential backoff and jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: usize,
    /// Delay before the first retry; doubles with each further retry.
    pub base_delay: Duration,
    /// Cap on the exponential part of the delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt <= self.max_retries
    }

    /// Backoff before retry number `attempt` (1-based), without jitter.
    pub fn base_backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    /// Backoff before retry number `attempt`, with 0–250ms of jitter.
    pub fn backoff(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let jitter_ms: u64 = rng().random_range(0..=250);
        self.base_backoff(attempt) + Duration::from_millis(jitter_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.base_backoff(1), Duration::from_secs(1));
        assert_eq!(policy.base_backoff(2), Duration::from_secs(2));
        assert_eq!(policy.base_backoff(3), Duration::from_secs(4));
        assert_eq!(policy.base_backoff(10), Duration::from_secs(30));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        for _ in 0..50 {
            let d = policy.backoff(1);
            assert!(d >= Duration::from_secs(1));
            assert!(d <= Duration::from_millis(1250));
        }
    }

    #[test]
    fn retry_budget_is_bounded() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!RetryPolicy::none().should_retry(1));
    }

    #[test]
    fn zero_base_delay_means_no_wait() {
        assert_eq!(RetryPolicy::none().backoff(3), Duration::ZERO);
    }
}

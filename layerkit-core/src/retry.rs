//! Exponential backoff used by the storage client.
//!
//! The delay for a retry is `min(MAXIMUM_RETRY_DELAY_MS, 2^attempts * base)`, where
//! `attempts` is the number of attempts already made. [`RetryPolicy`] turns that
//! function into a [`backon`] backoff sequence capped at `max_attempts` total attempts.
//! Throttled requests back off from a larger base than other retryable failures.

use std::time::Duration;

/// Upper bound of any single retry delay, in milliseconds.
pub const MAXIMUM_RETRY_DELAY_MS: u64 = 30 * 1000;

/// Total attempts (initial request included) before the last error is surfaced.
pub const MAX_ATTEMPTS: u32 = 10;

/// Delay base for transient failures, in milliseconds.
pub const DEFAULT_DELAY_BASE_MS: u64 = 100;

/// Delay base for throttled requests, in milliseconds.
pub const DEFAULT_THROTTLING_DELAY_BASE_MS: u64 = 500;

/// Signature of a delay decider: `(base_ms, attempts) -> delay_ms`.
pub type DelayFn = fn(u64, u32) -> u64;

/// `min(MAXIMUM_RETRY_DELAY_MS, 2^attempts * base)`.
///
/// Saturates instead of overflowing, so any `attempts` value is accepted.
pub fn delay_decider(base: u64, attempts: u32) -> u64 {
    if base == 0 {
        return 0;
    }
    let scaled = 2u64
        .checked_pow(attempts)
        .map_or(u64::MAX, |factor| factor.saturating_mul(base));
    scaled.min(MAXIMUM_RETRY_DELAY_MS)
}

/// Closed retry configuration attached to every storage client.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_base: Duration,
    pub throttling_delay_base: Duration,
    pub delay_fn: DelayFn,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay_base: Duration::from_millis(DEFAULT_DELAY_BASE_MS),
            throttling_delay_base: Duration::from_millis(DEFAULT_THROTTLING_DELAY_BASE_MS),
            delay_fn: delay_decider,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delay_base(mut self, delay_base: Duration) -> Self {
        self.delay_base = delay_base;
        self
    }

    pub fn with_throttling_delay_base(mut self, throttling_delay_base: Duration) -> Self {
        self.throttling_delay_base = throttling_delay_base;
        self
    }

    /// Delay before the retry that follows `attempts` completed attempts.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        self.scaled(self.delay_base, attempts)
    }

    /// Same as [`RetryPolicy::delay_for`], for a throttled request.
    pub fn throttled_delay_for(&self, attempts: u32) -> Duration {
        self.scaled(self.throttling_delay_base, attempts)
    }

    fn scaled(&self, base: Duration, attempts: u32) -> Duration {
        let base = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis((self.delay_fn)(base, attempts))
    }

    /// Fresh backoff sequence for one logical request.
    pub fn backoff(&self) -> PolicyBackoff {
        PolicyBackoff {
            policy: *self,
            attempts: 1,
        }
    }
}

/// Iterator of retry delays; yields `max_attempts - 1` values.
///
/// Any `Iterator<Item = Duration>` is a `backon` backoff, so this plugs
/// straight into `Retryable::retry`.
#[derive(Debug, Clone)]
pub struct PolicyBackoff {
    policy: RetryPolicy,
    attempts: u32,
}

impl Iterator for PolicyBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        let delay = self.policy.delay_for(self.attempts);
        self.attempts += 1;
        Some(delay)
    }
}

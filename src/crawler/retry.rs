//! Retry policy for upstream requests
//!
//! Kept apart from the HTTP client so the schedule can be tested without
//! any I/O.

use crate::config::FetchConfig;
use crate::FetchError;
use std::time::Duration;

/// How many times a request is attempted and how long to wait in between
///
/// | Attempt | Wait before it        |
/// |---------|-----------------------|
/// | 1       | none                  |
/// | k ≥ 2   | `2^(k-1) * base_delay` |
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Backoff unit
    pub base_delay: Duration,

    /// Decides whether a failed attempt may be retried
    pub retryable: fn(&FetchError) -> bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            retryable: is_transient,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay())
    }

    /// A policy that never retries
    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn with_predicate(mut self, retryable: fn(&FetchError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Delay to wait before the given 1-based attempt
    ///
    /// Returns `None` for the first attempt and for attempts beyond the
    /// budget, so nothing is ever waited after the final attempt.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt < 2 || attempt > self.max_attempts {
            return None;
        }
        // Cap the exponent so the multiplier cannot overflow
        let exponent = (attempt - 1).min(31);
        Some(self.base_delay.saturating_mul(1u32 << exponent))
    }

    /// Whether a failure on the given 1-based attempt leads to another one
    pub fn should_retry(&self, attempt: u32, error: &FetchError) -> bool {
        attempt < self.max_attempts && (self.retryable)(error)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Default predicate: every network-level failure and every unexpected
/// status is worth another attempt
pub fn is_transient(error: &FetchError) -> bool {
    matches!(
        error,
        FetchError::Timeout { .. }
            | FetchError::Network { .. }
            | FetchError::Status { .. }
            | FetchError::Body { .. }
    )
}

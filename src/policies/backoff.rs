//! # Retry policy and backoff calculation.
//!
//! [`RetryPolicy`] controls how many times a failed call is retried and how long to
//! wait between attempts. It is parameterized by:
//! - [`RetryPolicy::count`] the number of retries after the first attempt;
//! - [`RetryPolicy::backoff`] how the delay grows ([`Backoff`]);
//! - [`RetryPolicy::base_delay`] the unit delay;
//! - [`RetryPolicy::max_delay`] the cap;
//! - [`RetryPolicy::jitter`] whether delays are randomly scaled into `[0.5, 1.0)`.
//!
//! The raw delay for retry index `n` (0-based; the first retry uses `n = 0`) is:
//! - `Exponential`: `base × 2^n`
//! - `Linear`: `base × (n + 1)`
//! - `Fixed`: `base`
//!
//! Jitter is applied to the raw delay, then the result is clamped to `max_delay`.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use callguard::{Backoff, RetryPolicy};
//!
//! let policy = RetryPolicy {
//!     count: 5,
//!     backoff: Backoff::Exponential,
//!     base_delay: Duration::from_millis(100),
//!     max_delay: Duration::from_secs(1),
//!     jitter: false,
//! };
//!
//! assert_eq!(policy.delay(0), Duration::from_millis(100));
//! assert_eq!(policy.delay(1), Duration::from_millis(200));
//! // 100ms × 2^10 is capped at max_delay
//! assert_eq!(policy.delay(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter;

/// Delay growth strategy between attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backoff {
    /// `base × 2^n` (default).
    #[default]
    Exponential,
    /// `base × (n + 1)`.
    Linear,
    /// Constant `base`.
    Fixed,
}

/// Retry policy.
///
/// Values are taken as given: a `count` of `0` means a single attempt, and a
/// `max_delay` below `base_delay` simply caps every delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub count: u32,
    /// Delay growth strategy.
    pub backoff: Backoff,
    /// Unit delay fed into the growth strategy.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// Randomly scale each delay into `[0.5, 1.0)` of its raw value.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    /// Returns a policy with:
    /// - `count = 0` (no retries);
    /// - `backoff = Exponential`;
    /// - `base_delay = 1s`, `max_delay = 30s`;
    /// - `jitter = true`.
    fn default() -> Self {
        Self {
            count: 0,
            backoff: Backoff::Exponential,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Total number of attempts a call may make: `max(1, count + 1)`.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.count.saturating_add(1).max(1)
    }

    /// Computes the delay before retry `attempt` (0-indexed).
    ///
    /// Arithmetic is done in integer nanoseconds and saturates; anything at or
    /// above `max_delay` resolves to `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let raw = self.raw_nanos(attempt);
        let nanos = if self.jitter {
            (raw as f64 * jitter::factor()) as u128
        } else {
            raw
        };

        if nanos >= self.max_delay.as_nanos() {
            self.max_delay
        } else {
            from_nanos(nanos)
        }
    }

    fn raw_nanos(&self, attempt: u32) -> u128 {
        let base = self.base_delay.as_nanos();
        match self.backoff {
            Backoff::Exponential => {
                let multiplier = 1u128.checked_shl(attempt).unwrap_or(u128::MAX);
                base.saturating_mul(multiplier)
            }
            Backoff::Linear => base.saturating_mul(u128::from(attempt) + 1),
            Backoff::Fixed => base,
        }
    }
}

/// Builds a `Duration` from nanoseconds known to be below some existing `Duration`.
fn from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    Duration::new((nanos / NANOS_PER_SEC) as u64, (nanos % NANOS_PER_SEC) as u32)
}

//! # Circuit breaker thresholds.
//!
//! [`BreakerPolicy`] is the resolved configuration of a
//! [`CircuitBreaker`](crate::CircuitBreaker). A disabled breaker admits every call
//! and ignores recorded outcomes.

use std::time::Duration;

/// Circuit breaker configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakerPolicy {
    /// Whether the breaker gates calls at all.
    pub enabled: bool,
    /// Consecutive failed calls that trip the breaker open.
    pub threshold: u32,
    /// How long the breaker stays open after the last failure before it admits a probe.
    pub reset_timeout: Duration,
}

impl Default for BreakerPolicy {
    /// Returns a disabled breaker with `threshold = 5` and `reset_timeout = 60s`.
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

//! # Circuit breaker.
//!
//! Tracks consecutive failed calls and gates whether a new call may start.
//!
//! ```text
//!            threshold consecutive failures
//!  Closed ─────────────────────────────────► Open
//!    ▲                                        │ reset_timeout elapsed since last failure
//!    │ success                                ▼ (evaluated lazily by can_execute)
//!    └───────────────────────────────────── HalfOpen ──── failure ───► Open
//! ```
//!
//! ## Rules
//! - A disabled breaker admits every call and ignores recorded outcomes.
//! - `Open → HalfOpen` happens inside [`CircuitBreaker::can_execute`], never on a timer.
//! - `HalfOpen` admits every caller; concurrent probes are not serialized.
//! - Only a success in `HalfOpen` resets the failure counter. A success while
//!   `Closed` leaves a nonzero counter untouched.
//! - State is guarded by a mutex, so outcome recording from concurrent calls is atomic
//!   with respect to `can_execute`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;
use tracing::debug;

use crate::policies::BreakerPolicy;

/// Breaker state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through (initial state).
    Closed,
    /// Calls are refused until `reset_timeout` elapses.
    Open,
    /// Calls are admitted as probes; the next outcome decides the state.
    HalfOpen,
}

impl CircuitState {
    /// Returns a short stable label (kebab-case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
}

impl BreakerState {
    const INITIAL: Self = Self {
        state: CircuitState::Closed,
        failures: 0,
        last_failure: None,
    };
}

/// Failure-count circuit breaker shared by a guarded callable and every override derived from it.
#[derive(Debug)]
pub struct CircuitBreaker {
    policy: BreakerPolicy,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(BreakerState::INITIAL),
        }
    }

    /// Returns the policy the breaker was created with.
    pub fn policy(&self) -> &BreakerPolicy {
        &self.policy
    }

    /// Returns whether a call may start now.
    ///
    /// Performs the lazy `Open → HalfOpen` transition once `reset_timeout` has
    /// elapsed since the last recorded failure.
    pub fn can_execute(&self) -> bool {
        if !self.policy.enabled {
            return true;
        }
        let mut s = self.lock();
        match s.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed_enough = s
                    .last_failure
                    .is_none_or(|at| at.elapsed() >= self.policy.reset_timeout);
                if elapsed_enough {
                    s.state = CircuitState::HalfOpen;
                    debug!(from = "open", to = "half-open", "circuit breaker transition");
                }
                elapsed_enough
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        if !self.policy.enabled {
            return;
        }
        let mut s = self.lock();
        if s.state == CircuitState::HalfOpen {
            s.state = CircuitState::Closed;
            s.failures = 0;
            debug!(from = "half-open", to = "closed", "circuit breaker transition");
        }
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        if !self.policy.enabled {
            return;
        }
        let mut s = self.lock();
        s.failures = s.failures.saturating_add(1);
        s.last_failure = Some(Instant::now());
        if s.state == CircuitState::HalfOpen || s.failures >= self.policy.threshold {
            if s.state != CircuitState::Open {
                debug!(
                    from = s.state.as_label(),
                    to = "open",
                    failures = s.failures,
                    "circuit breaker transition"
                );
            }
            s.state = CircuitState::Open;
        }
    }

    /// Forces the breaker back to `Closed` with no failure history.
    pub fn reset(&self) {
        *self.lock() = BreakerState::INITIAL;
    }

    /// Returns the stored state without performing the lazy `Open → HalfOpen` transition.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Returns the current consecutive-failure count.
    pub fn failures(&self) -> u32 {
        self.lock().failures
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn enabled(threshold: u32, reset_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(BreakerPolicy {
            enabled: true,
            threshold,
            reset_timeout: Duration::from_millis(reset_ms),
        })
    }

    #[test]
    fn disabled_breaker_ignores_everything() {
        let b = CircuitBreaker::new(BreakerPolicy::default());
        for _ in 0..20 {
            b.record_failure();
        }
        assert!(b.can_execute());
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn opens_at_threshold() {
        let b = enabled(3, 1000);
        b.record_failure();
        b.record_failure();
        assert!(b.can_execute());
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(!b.can_execute());
    }

    #[tokio::test(start_paused = true)]
    async fn half_opens_after_reset_timeout_and_closes_on_success() {
        let b = enabled(2, 1000);
        b.record_failure();
        b.record_failure();
        assert!(!b.can_execute());

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!b.can_execute());
        assert_eq!(b.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(b.can_execute());
        assert_eq!(b.state(), CircuitState::HalfOpen);
        // every caller is admitted while half-open
        assert!(b.can_execute());

        b.record_success();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens_immediately() {
        let b = enabled(5, 100);
        for _ in 0..5 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(b.can_execute());

        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(!b.can_execute());
        assert_eq!(b.failures(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_success_keeps_failure_streak() {
        // Only a half-open success resets the counter; this is preserved behavior.
        let b = enabled(3, 1000);
        b.record_failure();
        b.record_failure();
        b.record_success();
        assert_eq!(b.failures(), 2);
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_initial_state() {
        let b = enabled(1, 60_000);
        b.record_failure();
        assert!(!b.can_execute());
        b.reset();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.failures(), 0);
        assert!(b.can_execute());
    }
}

//! Retry and circuit-breaker policies.
//!
//! This module groups the knobs that control **how often** a call is retried,
//! **how long** to wait between attempts, and **when** repeated failures stop
//! further calls.
//!
//! ## Contents
//! - [`RetryPolicy`] retry count plus delay growth (exponential / linear / fixed)
//! - [`Backoff`] the delay growth strategy
//! - [`BreakerPolicy`] circuit breaker thresholds
//!
//! ## Quick wiring
//! ```text
//! Config { retry: RetryPolicy, circuit_breaker: BreakerPolicy, .. }
//!      └─► core::engine uses:
//!           - retry.max_attempts() to bound the attempt loop
//!           - retry.delay(n) to wait before retry n
//!      └─► core::breaker::CircuitBreaker is built from circuit_breaker
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → no retries, exponential, base=1s, max=30s, jitter on.
//! - `BreakerPolicy::default()` → disabled, threshold=5, reset_timeout=60s.

mod backoff;
mod breaker;
mod jitter;

pub use backoff::{Backoff, RetryPolicy};
pub use breaker::BreakerPolicy;

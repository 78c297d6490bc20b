//! Runtime core: guarded execution.
//!
//! Public API from this module is [`Guarded`] (with [`guard`]), the instance factory
//! [`Guard`], and the shared [`CircuitBreaker`].
//!
//! Internal modules:
//! - [`runner`]: executes one attempt with timeout, cancellation and panic capture;
//! - [`engine`]: the retry loop that drives callbacks and the breaker;
//! - [`breaker`]: three-state circuit breaker;
//! - [`guarded`]: wrapped operations, overrides and reset;
//! - [`instance`]: instance-wide defaults for many operations.

mod breaker;
mod engine;
mod guarded;
mod instance;
mod runner;

pub use breaker::{CircuitBreaker, CircuitState};
pub use guarded::{Guarded, guard};
pub use instance::Guard;

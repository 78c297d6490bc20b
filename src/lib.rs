//! # callguard
//!
//! **Callguard** wraps async operations with a per-attempt timeout, retries with
//! backoff, a circuit breaker, cancellation, and lifecycle callbacks.
//!
//! Configuration is assembled from layers (instance defaults, per-operation options,
//! per-call overrides), resolved once when an operation is wrapped.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//!  │ instance Layer│   │operation Layer│   │override Layers│
//!  │   (Guard)     │   │ (wrap/guard)  │   │(with_overrides│
//!  └──────┬────────┘   └──────┬────────┘   └──────┬────────┘
//!         └─────────────┬─────┴───────────────────┘
//!                       ▼
//!               resolve(layers) ──► Config (frozen)
//!                       │
//!                       ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │ Guarded { operation, Config, Arc<CircuitBreaker> }        │
//! │   call(args) ──► engine::execute                          │
//! └──────────────────────────┬────────────────────────────────┘
//!                            ▼
//!                  runner::run_once (timeout, signal, panic)
//! ```
//!
//! ### Lifecycle of one call
//! ```text
//! breaker.can_execute()?
//!   └─ no  ──► on_error(CircuitOpen) ──► Err(CircuitOpen)
//!
//! on_loading(true)
//! loop attempt in 0..max_attempts {
//!   ├─► run_once(op, args, timeout, signal)
//!   │       ├─ Ok        ──► breaker.record_success, on_success,
//!   │       │                on_loading(false), on_finish ──► Ok(value)
//!   │       ├─ Cancelled ──► on_error(Aborted), on_loading(false), on_finish
//!   │       └─ Failed / TimedOut:
//!   │             ├─ last attempt ──► break
//!   │             ├─ on_retry(n, reason)
//!   │             └─ sleep(retry.delay(n - 1)) (cancellable)
//! }
//! breaker.record_failure
//! on_error(Timeout | RetryExhausted), on_loading(false), on_finish
//! ```
//!
//! ## Features
//! | Area               | Description                                              | Key types / traits                          |
//! |--------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Configuration**  | Layered, partial options merged into a resolved config.  | [`Layer`], [`AnyLayer`], [`Config`], [`resolve`] |
//! | **Policies**       | Retry/backoff and circuit-breaker settings.              | [`RetryPolicy`], [`Backoff`], [`BreakerPolicy`] |
//! | **Operations**     | Define guarded work as closures or trait objects.        | [`Operation`], [`OperationFn`]              |
//! | **Execution**      | Wrap, override, reset and share breakers.                | [`Guarded`], [`guard`], [`Guard`]           |
//! | **Observers**      | Lifecycle callbacks with an execution context.           | [`Observer`], [`ExecutionContext`]          |
//! | **Errors**         | Typed terminal and per-attempt errors.                   | [`GuardError`], [`AttemptError`]            |
//!
//! ## Optional features
//! - `logging`: exports [`log_observer`], a tracing-backed observer _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use callguard::{AnyLayer, BoxError, Guard, Layer, RetryPatch, Backoff};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let guard = Guard::new(AnyLayer::new().with_timeout(Duration::from_secs(5)));
//!
//!     let lookup = guard.wrap(
//!         |key: &'static str| async move {
//!             if key.is_empty() {
//!                 return Err::<String, BoxError>("empty key".into());
//!             }
//!             Ok(key.to_uppercase())
//!         },
//!         Layer::new()
//!             .with_name("lookup")
//!             .with_retry(
//!                 RetryPatch::new()
//!                     .with_count(2)
//!                     .with_backoff(Backoff::Fixed)
//!                     .with_base_delay(Duration::from_millis(10)),
//!             )
//!             .on_retry(|n, reason, _| eprintln!("retry #{n}: {reason}")),
//!     );
//!
//!     assert_eq!(lookup.call("abc").await?, "ABC");
//!     assert!(lookup.call("").await.unwrap_err().is_retry_exhausted());
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod observers;
mod operations;
mod policies;

// ---- Public re-exports ----

pub use config::{
    AnyLayer, BreakerPatch, Config, DEFAULT_NAME, DEFAULT_TIMEOUT, Layer, RetryPatch, resolve,
};
pub use core::{CircuitBreaker, CircuitState, Guard, Guarded, guard};
pub use error::{AttemptError, BoxError, GuardError};
pub use observers::{
    AnyValue, ErrorFn, ExecutionContext, FinishFn, LoadingFn, Observer, RetryFn, SuccessFn,
};
pub use operations::{Operation, OperationFn, OperationRef};
pub use policies::{Backoff, BreakerPolicy, RetryPolicy};

// Optional: expose a tracing-backed observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::log_observer;

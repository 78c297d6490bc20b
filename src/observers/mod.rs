//! # Lifecycle observers for guarded calls.
//!
//! This module provides the [`Observer`] callback set and the [`ExecutionContext`]
//! handed to every callback.
//!
//! ## Architecture
//! ```text
//! Engine ── on_loading / on_retry / on_success / on_error / on_finish ──► Observer
//!                                                                          │
//!                                                          ┌───────────────┼──────────────┐
//!                                                          ▼               ▼              ▼
//!                                                        toast          spinner      log_observer
//! ```
//!
//! ## Rules
//! - Callbacks run synchronously on the task driving the call.
//! - Every terminal path fires `on_success`/`on_error`, then `on_loading(false)`, then `on_finish`.
//! - A call refused by the circuit breaker fires only `on_error`.

mod context;
mod observer;

#[cfg(feature = "logging")]
mod log;

pub use context::ExecutionContext;
pub use observer::{AnyValue, ErrorFn, FinishFn, LoadingFn, Observer, RetryFn, SuccessFn};

#[cfg(feature = "logging")]
pub use log::log_observer;

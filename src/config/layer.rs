//! # Configuration layers.
//!
//! A [`Layer`] is a sparse patch over [`Config`](crate::Config): every field is
//! optional and only the fields that are set take part in resolution. Layers are
//! built with `with_*` methods and the flattened `on_*` callback shorthands.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use callguard::{Backoff, Layer, RetryPatch};
//!
//! let layer: Layer<String> = Layer::new()
//!     .with_name("fetch_user")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_retries(3)
//!     .with_retry(RetryPatch::new().with_backoff(Backoff::Linear))
//!     .on_error(|err, _ctx| eprintln!("{err}"));
//!
//! assert_eq!(layer.timeout(), Some(Duration::from_secs(5)));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AttemptError, GuardError};
use crate::observers::{AnyValue, ExecutionContext, Observer};
use crate::policies::{Backoff, BreakerPolicy, RetryPolicy};

/// Untyped layer used for instance-wide defaults.
pub type AnyLayer = Layer<AnyValue>;

/// Partial [`RetryPolicy`]: only set fields override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryPatch {
    pub count: Option<u32>,
    pub backoff: Option<Backoff>,
    pub base_delay: Option<Duration>,
    pub max_delay: Option<Duration>,
    pub jitter: Option<bool>,
}

impl RetryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Writes every set field into `policy`.
    pub(crate) fn apply(&self, policy: &mut RetryPolicy) {
        if let Some(count) = self.count {
            policy.count = count;
        }
        if let Some(backoff) = self.backoff {
            policy.backoff = backoff;
        }
        if let Some(delay) = self.base_delay {
            policy.base_delay = delay;
        }
        if let Some(delay) = self.max_delay {
            policy.max_delay = delay;
        }
        if let Some(jitter) = self.jitter {
            policy.jitter = jitter;
        }
    }
}

/// Partial [`BreakerPolicy`]: only set fields override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreakerPatch {
    pub enabled: Option<bool>,
    pub threshold: Option<u32>,
    pub reset_timeout: Option<Duration>,
}

impl BreakerPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an enabled breaker with the remaining fields inherited.
    pub fn enabled() -> Self {
        Self::default().with_enabled(true)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_reset_timeout(mut self, reset_timeout: Duration) -> Self {
        self.reset_timeout = Some(reset_timeout);
        self
    }

    pub(crate) fn apply(&self, policy: &mut BreakerPolicy) {
        if let Some(enabled) = self.enabled {
            policy.enabled = enabled;
        }
        if let Some(threshold) = self.threshold {
            policy.threshold = threshold;
        }
        if let Some(reset_timeout) = self.reset_timeout {
            policy.reset_timeout = reset_timeout;
        }
    }
}

/// # Sparse configuration patch for operations producing `T`.
///
/// ### Field rules
/// - `retries` is shorthand for `retry.count` and is applied *before* `retry`
///   from the same layer, so the structured patch wins on conflict.
/// - The flattened `on_*` callbacks are applied *before* `observer` from the
///   same layer, so the explicit observer wins on conflict.
/// - Nested records (`retry`, `circuit_breaker`, `observer`) merge field by field
///   during resolution.
pub struct Layer<T: ?Sized> {
    pub(crate) name: Option<Arc<str>>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) retries: Option<u32>,
    pub(crate) retry: Option<RetryPatch>,
    pub(crate) circuit_breaker: Option<BreakerPatch>,
    pub(crate) signal: Option<CancellationToken>,
    pub(crate) observer: Option<Observer<T>>,
    pub(crate) callbacks: Observer<T>,
}

impl<T: ?Sized> Layer<T> {
    /// Creates an empty layer (resolves to the inherited values).
    pub fn new() -> Self {
        Self {
            name: None,
            timeout: None,
            retries: None,
            retry: None,
            circuit_breaker: None,
            signal: None,
            observer: None,
            callbacks: Observer::new(),
        }
    }

    /// Sets the operation name used in errors and contexts.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the per-attempt timeout (`Duration::ZERO` or `Duration::MAX` disables it).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Shorthand for `retry.count`.
    pub fn with_retries(mut self, count: u32) -> Self {
        self.retries = Some(count);
        self
    }

    /// Sets the structured retry patch.
    pub fn with_retry(mut self, retry: RetryPatch) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets the circuit breaker patch.
    pub fn with_circuit_breaker(mut self, breaker: BreakerPatch) -> Self {
        self.circuit_breaker = Some(breaker);
        self
    }

    /// Sets the cancellation signal for calls made with this configuration.
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Sets the explicit observer record.
    pub fn with_observer(mut self, observer: Observer<T>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Flattened shorthand for `observer.on_loading`.
    pub fn on_loading(mut self, f: impl Fn(bool, &ExecutionContext) + Send + Sync + 'static) -> Self {
        self.callbacks = self.callbacks.on_loading(f);
        self
    }

    /// Flattened shorthand for `observer.on_success`.
    pub fn on_success(mut self, f: impl Fn(&T, &ExecutionContext) + Send + Sync + 'static) -> Self {
        self.callbacks = self.callbacks.on_success(f);
        self
    }

    /// Flattened shorthand for `observer.on_error`.
    pub fn on_error(
        mut self,
        f: impl Fn(&GuardError, &ExecutionContext) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks = self.callbacks.on_error(f);
        self
    }

    /// Flattened shorthand for `observer.on_retry`.
    pub fn on_retry(
        mut self,
        f: impl Fn(u32, &AttemptError, &ExecutionContext) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks = self.callbacks.on_retry(f);
        self
    }

    /// Flattened shorthand for `observer.on_finish`.
    pub fn on_finish(mut self, f: impl Fn(&ExecutionContext) + Send + Sync + 'static) -> Self {
        self.callbacks = self.callbacks.on_finish(f);
        self
    }

    /// Returns the timeout set by this layer, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the retry shorthand set by this layer, if any.
    pub fn retries(&self) -> Option<u32> {
        self.retries
    }

    /// Returns the name set by this layer, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Shallow-merges `newer` into `self`.
    ///
    /// Every top-level field set in `newer` replaces the one in `self` wholesale,
    /// including the nested `retry`, `circuit_breaker` and `observer` records.
    /// Flattened callbacks are top-level fields and are replaced one by one.
    pub fn overlay(&mut self, newer: &Layer<T>) {
        if let Some(name) = &newer.name {
            self.name = Some(Arc::clone(name));
        }
        if newer.timeout.is_some() {
            self.timeout = newer.timeout;
        }
        if newer.retries.is_some() {
            self.retries = newer.retries;
        }
        if newer.retry.is_some() {
            self.retry = newer.retry;
        }
        if newer.circuit_breaker.is_some() {
            self.circuit_breaker = newer.circuit_breaker;
        }
        if let Some(signal) = &newer.signal {
            self.signal = Some(signal.clone());
        }
        if let Some(observer) = &newer.observer {
            self.observer = Some(observer.clone());
        }
        self.callbacks.merge(&newer.callbacks);
    }
}

impl AnyLayer {
    /// Specializes an untyped layer for operations producing `U`.
    pub fn typed<U: std::any::Any + Send + Sync>(&self) -> Layer<U> {
        Layer {
            name: self.name.clone(),
            timeout: self.timeout,
            retries: self.retries,
            retry: self.retry,
            circuit_breaker: self.circuit_breaker,
            signal: self.signal.clone(),
            observer: self.observer.as_ref().map(|o| o.typed::<U>()),
            callbacks: self.callbacks.typed::<U>(),
        }
    }
}

impl<T: ?Sized> Default for Layer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Layer<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            timeout: self.timeout,
            retries: self.retries,
            retry: self.retry,
            circuit_breaker: self.circuit_breaker,
            signal: self.signal.clone(),
            observer: self.observer.clone(),
            callbacks: self.callbacks.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Layer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("retry", &self.retry)
            .field("circuit_breaker", &self.circuit_breaker)
            .field("signal", &self.signal)
            .field("observer", &self.observer)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

//! # Resolved configuration.
//!
//! Provides [`Config`], the fully populated snapshot a guarded call runs with, and
//! [`resolve`], which folds an ordered list of [`Layer`]s over the defaults.
//!
//! Config is produced in two ways:
//! 1. **Guarded creation**: `guard(op, layer)` resolves once and freezes the result.
//! 2. **Instance introspection**: `Guard::defaults()` resolves the instance layer alone.
//!
//! ## Sentinel values
//! - `timeout = 0s` or `Duration::MAX` → no timeout (see [`Config::timeout_limit`])
//! - `retry.count = 0` → a single attempt

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Layer;
use crate::observers::Observer;
use crate::policies::{BreakerPolicy, RetryPolicy};

/// Name used when no layer sets one.
pub const DEFAULT_NAME: &str = "anonymous";
/// Per-attempt timeout used when no layer sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fully resolved configuration for operations producing `T`.
///
/// ## Field semantics
/// - `name`: identifier used in error messages and contexts
/// - `timeout`: per-attempt timeout (`0s`/`Duration::MAX` = disabled)
/// - `retry`: retry count and delay growth
/// - `circuit_breaker`: breaker thresholds (used when the breaker is created)
/// - `signal`: optional cancellation signal shared by every call
/// - `observer`: merged lifecycle callbacks
///
/// Values are not validated; out-of-range inputs are used as given.
pub struct Config<T: ?Sized> {
    /// Operation name.
    pub name: Arc<str>,

    /// Per-attempt timeout.
    ///
    /// Restarts for every attempt; it does not bound the whole call.
    pub timeout: Duration,

    /// Retry policy.
    pub retry: RetryPolicy,

    /// Circuit breaker policy.
    pub circuit_breaker: BreakerPolicy,

    /// Cancellation signal.
    ///
    /// Once cancelled, every in-flight and future call made with this configuration
    /// terminates with [`GuardError::Aborted`](crate::GuardError::Aborted).
    pub signal: Option<CancellationToken>,

    /// Lifecycle callbacks.
    pub observer: Observer<T>,
}

impl<T: ?Sized> Config<T> {
    /// Returns the per-attempt timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per attempt
    #[inline]
    pub fn timeout_limit(&self) -> Option<Duration> {
        if self.timeout.is_zero() || self.timeout == Duration::MAX {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the maximum number of attempts per call.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.retry.max_attempts()
    }
}

impl<T: ?Sized> Default for Config<T> {
    /// Default configuration:
    ///
    /// - `name = "anonymous"`
    /// - `timeout = 30s`
    /// - `retry = RetryPolicy::default()` (no retries, exponential, 1s..30s, jitter)
    /// - `circuit_breaker = BreakerPolicy::default()` (disabled, 5 failures, 60s)
    /// - no signal, no callbacks
    fn default() -> Self {
        Self {
            name: Arc::from(DEFAULT_NAME),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            circuit_breaker: BreakerPolicy::default(),
            signal: None,
            observer: Observer::new(),
        }
    }
}

impl<T: ?Sized> Clone for Config<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            timeout: self.timeout,
            retry: self.retry,
            circuit_breaker: self.circuit_breaker,
            signal: self.signal.clone(),
            observer: self.observer.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Config<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("circuit_breaker", &self.circuit_breaker)
            .field("signal", &self.signal)
            .field("observer", &self.observer)
            .finish()
    }
}

/// Folds `layers` (earliest first) over the defaults.
///
/// ### Per-layer order
/// 1. scalars: `name`, `timeout`, `signal`
/// 2. observer: flattened `on_*` callbacks, then the explicit `observer`
/// 3. retry: `retries` shorthand, then the structured `retry` patch
/// 4. circuit breaker patch
pub fn resolve<'a, T, I>(layers: I) -> Config<T>
where
    T: ?Sized + 'a,
    I: IntoIterator<Item = &'a Layer<T>>,
{
    let mut cfg = Config::default();

    for layer in layers {
        if let Some(name) = &layer.name {
            cfg.name = Arc::clone(name);
        }
        if let Some(timeout) = layer.timeout {
            cfg.timeout = timeout;
        }
        if let Some(signal) = &layer.signal {
            cfg.signal = Some(signal.clone());
        }

        cfg.observer.merge(&layer.callbacks);
        if let Some(observer) = &layer.observer {
            cfg.observer.merge(observer);
        }

        if let Some(count) = layer.retries {
            cfg.retry.count = count;
        }
        if let Some(retry) = &layer.retry {
            retry.apply(&mut cfg.retry);
        }

        if let Some(breaker) = &layer.circuit_breaker {
            breaker.apply(&mut cfg.circuit_breaker);
        }
    }

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerPatch, RetryPatch};
    use crate::observers::ExecutionContext;
    use crate::policies::Backoff;
    use std::sync::Mutex;
    use std::time::SystemTime;

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            function_name: Arc::from("op"),
            duration: Duration::ZERO,
            timestamp: SystemTime::now(),
            attempt: 1,
            max_attempts: 1,
        }
    }

    #[test]
    fn no_layers_yield_defaults() {
        let cfg: Config<u32> = resolve(std::iter::empty());
        assert_eq!(&*cfg.name, "anonymous");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.retry, RetryPolicy::default());
        assert_eq!(cfg.retry.backoff, Backoff::Exponential);
        assert!(cfg.retry.jitter);
        assert!(!cfg.circuit_breaker.enabled);
        assert_eq!(cfg.circuit_breaker.threshold, 5);
        assert_eq!(cfg.circuit_breaker.reset_timeout, Duration::from_secs(60));
        assert!(cfg.signal.is_none());
        assert!(cfg.observer.is_empty());
    }

    #[test]
    fn later_layers_override_field_by_field() {
        let global: Layer<u32> = Layer::new()
            .with_timeout(Duration::from_secs(10))
            .with_retry(RetryPatch::new().with_count(2).with_jitter(false));
        let local: Layer<u32> = Layer::new()
            .with_name("local")
            .with_retry(RetryPatch::new().with_backoff(Backoff::Fixed));

        let cfg = resolve([&global, &local]);

        assert_eq!(&*cfg.name, "local");
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.retry.count, 2);
        assert!(!cfg.retry.jitter);
        assert_eq!(cfg.retry.backoff, Backoff::Fixed);
    }

    #[test]
    fn structured_retry_wins_over_shorthand_in_same_layer() {
        let layer: Layer<u32> = Layer::new()
            .with_retries(7)
            .with_retry(RetryPatch::new().with_count(1));
        assert_eq!(resolve([&layer]).retry.count, 1);

        let shorthand_only: Layer<u32> = Layer::new()
            .with_retries(7)
            .with_retry(RetryPatch::new().with_jitter(false));
        let cfg = resolve([&shorthand_only]);
        assert_eq!(cfg.retry.count, 7);
        assert!(!cfg.retry.jitter);
    }

    #[test]
    fn explicit_observer_wins_over_flat_callbacks_in_same_layer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let flat = Arc::clone(&seen);
        let explicit = Arc::clone(&seen);
        let flat_only = Arc::clone(&seen);

        let layer: Layer<u32> = Layer::new()
            .on_finish(move |_| flat.lock().unwrap().push("flat-finish"))
            .on_loading(move |_, _| flat_only.lock().unwrap().push("flat-loading"))
            .with_observer(
                Observer::new().on_finish(move |_| explicit.lock().unwrap().push("explicit-finish")),
            );

        let cfg = resolve([&layer]);
        cfg.observer.loading(true, &ctx());
        cfg.observer.finish(&ctx());

        assert_eq!(*seen.lock().unwrap(), vec!["flat-loading", "explicit-finish"]);
    }

    #[test]
    fn breaker_patch_merges_key_by_key() {
        let a: Layer<u32> =
            Layer::new().with_circuit_breaker(BreakerPatch::new().with_threshold(2));
        let b: Layer<u32> = Layer::new().with_circuit_breaker(BreakerPatch::enabled());
        let cfg = resolve([&a, &b]);
        assert!(cfg.circuit_breaker.enabled);
        assert_eq!(cfg.circuit_breaker.threshold, 2);
    }

    #[test]
    fn out_of_range_values_are_accepted() {
        let layer: Layer<u32> = Layer::new()
            .with_timeout(Duration::ZERO)
            .with_circuit_breaker(BreakerPatch::new().with_threshold(0));
        let cfg = resolve([&layer]);
        assert_eq!(cfg.circuit_breaker.threshold, 0);
        assert_eq!(cfg.timeout_limit(), None);
    }

    #[test]
    fn timeout_limit_sentinels() {
        let mut cfg: Config<u32> = Config::default();
        assert_eq!(cfg.timeout_limit(), Some(Duration::from_secs(30)));
        cfg.timeout = Duration::MAX;
        assert_eq!(cfg.timeout_limit(), None);
        cfg.timeout = Duration::ZERO;
        assert_eq!(cfg.timeout_limit(), None);
    }
}

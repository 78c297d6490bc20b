//! # Lifecycle observer.
//!
//! [`Observer`] is a fixed set of optional callback slots invoked by the engine at
//! defined points of a guarded call:
//!
//! ```text
//! on_loading(true) ─► attempt ─► [on_retry ─► delay ─► attempt]* ─┬─► on_success ─► on_loading(false) ─► on_finish
//!                                                                 └─► on_error   ─► on_loading(false) ─► on_finish
//! ```
//!
//! Callbacks are synchronous and run inline on the task driving the call; keep them
//! short and hand heavy work off elsewhere.
//!
//! ## Merging
//! Observers from successive configuration layers are merged slot by slot: a slot set
//! in a later layer replaces the same slot from an earlier one, unset slots are kept.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{AttemptError, GuardError};
use crate::observers::ExecutionContext;

/// Type-erased success value used by untyped (instance-level) observers.
pub type AnyValue = dyn Any + Send + Sync;

/// Callback fired with `true` before the first attempt and `false` after the outcome.
pub type LoadingFn = Arc<dyn Fn(bool, &ExecutionContext) + Send + Sync>;
/// Callback fired with the successful value.
pub type SuccessFn<T> = Arc<dyn Fn(&T, &ExecutionContext) + Send + Sync>;
/// Callback fired with the terminal error.
pub type ErrorFn = Arc<dyn Fn(&GuardError, &ExecutionContext) + Send + Sync>;
/// Callback fired before each retry with the retry number (1-based) and the failure that caused it.
pub type RetryFn = Arc<dyn Fn(u32, &AttemptError, &ExecutionContext) + Send + Sync>;
/// Callback fired once at the very end of a call that got past the circuit breaker.
pub type FinishFn = Arc<dyn Fn(&ExecutionContext) + Send + Sync>;

/// Optional lifecycle callbacks for a guarded call producing `T`.
pub struct Observer<T: ?Sized> {
    pub(crate) on_loading: Option<LoadingFn>,
    pub(crate) on_success: Option<SuccessFn<T>>,
    pub(crate) on_error: Option<ErrorFn>,
    pub(crate) on_retry: Option<RetryFn>,
    pub(crate) on_finish: Option<FinishFn>,
}

impl<T: ?Sized> Observer<T> {
    /// Creates an observer with every slot empty.
    pub fn new() -> Self {
        Self {
            on_loading: None,
            on_success: None,
            on_error: None,
            on_retry: None,
            on_finish: None,
        }
    }

    /// Sets the loading callback.
    pub fn on_loading(mut self, f: impl Fn(bool, &ExecutionContext) + Send + Sync + 'static) -> Self {
        self.on_loading = Some(Arc::new(f));
        self
    }

    /// Sets the success callback.
    pub fn on_success(mut self, f: impl Fn(&T, &ExecutionContext) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Sets the error callback.
    pub fn on_error(
        mut self,
        f: impl Fn(&GuardError, &ExecutionContext) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Sets the retry callback.
    pub fn on_retry(
        mut self,
        f: impl Fn(u32, &AttemptError, &ExecutionContext) + Send + Sync + 'static,
    ) -> Self {
        self.on_retry = Some(Arc::new(f));
        self
    }

    /// Sets the finish callback.
    pub fn on_finish(mut self, f: impl Fn(&ExecutionContext) + Send + Sync + 'static) -> Self {
        self.on_finish = Some(Arc::new(f));
        self
    }

    /// Returns `true` when no slot is set.
    pub fn is_empty(&self) -> bool {
        self.on_loading.is_none()
            && self.on_success.is_none()
            && self.on_error.is_none()
            && self.on_retry.is_none()
            && self.on_finish.is_none()
    }

    /// Overwrites every slot that is set in `other`.
    pub(crate) fn merge(&mut self, other: &Observer<T>) {
        if let Some(f) = &other.on_loading {
            self.on_loading = Some(Arc::clone(f));
        }
        if let Some(f) = &other.on_success {
            self.on_success = Some(Arc::clone(f));
        }
        if let Some(f) = &other.on_error {
            self.on_error = Some(Arc::clone(f));
        }
        if let Some(f) = &other.on_retry {
            self.on_retry = Some(Arc::clone(f));
        }
        if let Some(f) = &other.on_finish {
            self.on_finish = Some(Arc::clone(f));
        }
    }

    pub(crate) fn loading(&self, loading: bool, ctx: &ExecutionContext) {
        if let Some(f) = &self.on_loading {
            f(loading, ctx);
        }
    }

    pub(crate) fn success(&self, value: &T, ctx: &ExecutionContext) {
        if let Some(f) = &self.on_success {
            f(value, ctx);
        }
    }

    pub(crate) fn error(&self, err: &GuardError, ctx: &ExecutionContext) {
        if let Some(f) = &self.on_error {
            f(err, ctx);
        }
    }

    pub(crate) fn retry(&self, retry: u32, err: &AttemptError, ctx: &ExecutionContext) {
        if let Some(f) = &self.on_retry {
            f(retry, err, ctx);
        }
    }

    pub(crate) fn finish(&self, ctx: &ExecutionContext) {
        if let Some(f) = &self.on_finish {
            f(ctx);
        }
    }
}

impl Observer<AnyValue> {
    /// Specializes an untyped observer for operations producing `U`.
    ///
    /// The success callback receives the value as `&dyn Any`.
    pub fn typed<U: Any + Send + Sync>(&self) -> Observer<U> {
        Observer {
            on_loading: self.on_loading.clone(),
            on_success: self.on_success.clone().map(|f| -> SuccessFn<U> {
                Arc::new(move |value: &U, ctx: &ExecutionContext| f(value as &AnyValue, ctx))
            }),
            on_error: self.on_error.clone(),
            on_retry: self.on_retry.clone(),
            on_finish: self.on_finish.clone(),
        }
    }
}

impl<T: ?Sized> Default for Observer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            on_loading: self.on_loading.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            on_retry: self.on_retry.clone(),
            on_finish: self.on_finish.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("on_loading", &self.on_loading.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, SystemTime};

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
    fn merge_replaces_only_set_slots() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let l1 = Arc::clone(&log);
        let l2 = Arc::clone(&log);
        let mut base: Observer<u32> = Observer::new()
            .on_finish(move |_| l1.lock().unwrap().push("base-finish"))
            .on_loading(move |_, _| l2.lock().unwrap().push("base-loading"));

        let l3 = Arc::clone(&log);
        let patch: Observer<u32> =
            Observer::new().on_finish(move |_| l3.lock().unwrap().push("patch-finish"));

        base.merge(&patch);
        base.loading(true, &ctx());
        base.finish(&ctx());

        assert_eq!(*log.lock().unwrap(), vec!["base-loading", "patch-finish"]);
    }

    #[test]
    fn typed_forwards_success_as_any() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let untyped: Observer<AnyValue> =
            Observer::new().on_success(move |v: &AnyValue, _| {
                *sink.lock().unwrap() = v.downcast_ref::<u32>().copied();
            });

        untyped.typed::<u32>().success(&7, &ctx());
        assert_eq!(*seen.lock().unwrap(), Some(7));
    }

    #[test]
    fn empty_observer_is_noop() {
        let obs: Observer<u32> = Observer::default();
        assert!(obs.is_empty());
        obs.loading(true, &ctx());
        obs.success(&1, &ctx());
        obs.finish(&ctx());
    }
}

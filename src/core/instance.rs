//! # Guard instance: shared defaults for many guarded operations.
//!
//! A [`Guard`] holds an instance-wide [`AnyLayer`]. Every operation wrapped through
//! it resolves `[instance layer, per-operation layer]`.
//!
//! ## Rules
//! - [`Guard::configure`] shallow-merges into the instance layer and only affects
//!   operations wrapped afterwards.
//! - [`Guard::defaults`] resolves the instance layer alone, without side effects.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use callguard::{AnyLayer, BoxError, Guard, Layer};
//!
//! let mut guard = Guard::new(AnyLayer::new().with_retries(2).with_timeout(Duration::from_secs(10)));
//!
//! let fetch = guard.wrap(
//!     |id: u64| async move { Ok::<_, BoxError>(id) },
//!     Layer::new().with_name("fetch").with_timeout(Duration::from_secs(5)),
//! );
//! assert_eq!(fetch.config().retry.count, 2);
//! assert_eq!(fetch.config().timeout, Duration::from_secs(5));
//!
//! guard.configure(AnyLayer::new().with_retries(4));
//! assert_eq!(guard.defaults().retry.count, 4);
//! assert_eq!(fetch.config().retry.count, 2);
//! ```

use std::any::Any;
use std::future::Future;

use crate::config::{AnyLayer, Config, Layer, resolve};
use crate::core::guarded::Guarded;
use crate::error::BoxError;
use crate::observers::AnyValue;
use crate::operations::{OperationFn, OperationRef};

/// Factory for guarded operations seeded with instance-wide defaults.
#[derive(Clone, Debug, Default)]
pub struct Guard {
    defaults: AnyLayer,
}

impl Guard {
    /// Creates an instance with `defaults` as its instance layer.
    pub fn new(defaults: AnyLayer) -> Self {
        Self { defaults }
    }

    /// Wraps the async closure `f`, layering `layer` over the instance defaults.
    pub fn wrap<A, T, E, F, Fut>(&self, f: F, layer: Layer<T>) -> Guarded<A, T>
    where
        A: Clone + Send + 'static,
        T: Any + Send + Sync,
        E: Into<BoxError> + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.wrap_operation(OperationFn::arc(f), layer)
    }

    /// Wraps a shared [`Operation`], layering `layer` over the instance defaults.
    pub fn wrap_operation<A, T>(&self, op: OperationRef<A, T>, layer: Layer<T>) -> Guarded<A, T>
    where
        A: Clone + Send + 'static,
        T: Any + Send + Sync,
    {
        Guarded::new(op, vec![self.defaults.typed::<T>(), layer])
    }

    /// Shallow-merges `layer` into the instance defaults for future `wrap` calls.
    pub fn configure(&mut self, layer: AnyLayer) {
        self.defaults.overlay(&layer);
    }

    /// Returns the resolved instance defaults.
    pub fn defaults(&self) -> Config<AnyValue> {
        resolve([&self.defaults])
    }

    /// Returns the raw instance layer.
    pub fn layer(&self) -> &AnyLayer {
        &self.defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPatch;
    use crate::policies::Backoff;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn configure_is_shallow_and_not_retroactive() {
        let mut guard = Guard::new(
            AnyLayer::new().with_retry(RetryPatch::new().with_count(3).with_jitter(false)),
        );
        let before = guard.wrap(|n: u32| async move { Ok::<_, BoxError>(n) }, Layer::new());

        guard.configure(AnyLayer::new().with_retry(RetryPatch::new().with_backoff(Backoff::Linear)));

        let defaults = guard.defaults();
        assert_eq!(defaults.retry.backoff, Backoff::Linear);
        assert_eq!(defaults.retry.count, 0, "nested retry record replaced wholesale");
        assert!(defaults.retry.jitter);

        assert_eq!(before.config().retry.count, 3);
        assert_eq!(before.config().retry.backoff, Backoff::Exponential);
    }

    #[test]
    fn defaults_without_layers_are_the_builtins() {
        let defaults = Guard::default().defaults();
        assert_eq!(&*defaults.name, "anonymous");
        assert_eq!(defaults.timeout, Duration::from_secs(30));
        assert!(!defaults.circuit_breaker.enabled);
    }

    #[tokio::test]
    async fn instance_callbacks_reach_typed_operations() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let guard = Guard::new(AnyLayer::new().on_success(move |v, ctx| {
            let v = v.downcast_ref::<String>().cloned().unwrap_or_default();
            sink.lock().unwrap().push(format!("{}={v}", ctx.function_name));
        }));

        let greet = guard.wrap(
            |name: &'static str| async move { Ok::<_, BoxError>(format!("hi {name}")) },
            Layer::new().with_name("greet"),
        );
        greet.call("ada").await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["greet=hi ada"]);
    }

    #[tokio::test]
    async fn operation_layer_overrides_instance_callbacks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (s1, s2) = (Arc::clone(&seen), Arc::clone(&seen));
        let guard = Guard::new(AnyLayer::new().on_finish(move |_| s1.lock().unwrap().push("instance")));

        let op = guard.wrap(
            |_: ()| async { Ok::<_, BoxError>(()) },
            Layer::new().on_finish(move |_| s2.lock().unwrap().push("operation")),
        );
        op.call(()).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["operation"]);
    }
}

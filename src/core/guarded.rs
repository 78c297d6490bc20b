//! # Guarded operation.
//!
//! [`Guarded`] is the callable produced from an operation plus its configuration
//! layers. The configuration is resolved **once**, at construction, and frozen.
//!
//! ## Sharing
//! ```text
//! guard(op, layer) ──► Guarded { layers: [layer],        breaker: B }
//!                        └─ with_overrides(o1) ──► Guarded { layers: [layer, o1],     breaker: B }
//!                              └─ with_overrides(o2) ──► Guarded { layers: [layer, o1, o2], breaker: B }
//! ```
//! Every derived callable shares the breaker `B`: a failure recorded through any of
//! them is visible to all. A freshly constructed `Guarded` gets its own breaker.
//! The breaker keeps the thresholds it was created with; override layers do not
//! change them.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use callguard::{BoxError, Layer, guard};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetch = guard(
//!     |id: u64| async move { Ok::<_, BoxError>(format!("user-{id}")) },
//!     Layer::new().with_name("fetch_user").with_retries(2),
//! );
//!
//! assert_eq!(fetch.call(7).await?, "user-7");
//!
//! let patient = fetch.with_overrides(Layer::new().with_timeout(Duration::from_secs(60)));
//! assert_eq!(patient.config().timeout, Duration::from_secs(60));
//! assert_eq!(fetch.config().timeout, Duration::from_secs(30));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::{Config, Layer, resolve};
use crate::core::breaker::CircuitBreaker;
use crate::core::engine::execute;
use crate::error::{BoxError, GuardError};
use crate::operations::{Operation, OperationFn, OperationRef};

/// An operation wrapped with timeout, retry, circuit breaking, cancellation and callbacks.
pub struct Guarded<A, T> {
    op: OperationRef<A, T>,
    layers: Arc<[Layer<T>]>,
    config: Arc<Config<T>>,
    breaker: Arc<CircuitBreaker>,
}

impl<A, T> Guarded<A, T>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
{
    /// Wraps `op` with the given layers (earliest first) and a fresh breaker.
    pub fn new(op: OperationRef<A, T>, layers: impl Into<Arc<[Layer<T>]>>) -> Self {
        Self::build(op, layers.into(), None)
    }

    /// Wraps an [`Operation`] implementation with a single layer.
    pub fn from_operation<O>(op: O, layer: Layer<T>) -> Self
    where
        O: Operation<A, Output = T>,
    {
        Self::new(Arc::new(op), vec![layer])
    }

    fn build(
        op: OperationRef<A, T>,
        layers: Arc<[Layer<T>]>,
        breaker: Option<Arc<CircuitBreaker>>,
    ) -> Self {
        let config = resolve(layers.iter());
        let breaker =
            breaker.unwrap_or_else(|| Arc::new(CircuitBreaker::new(config.circuit_breaker)));
        Self {
            op,
            layers,
            config: Arc::new(config),
            breaker,
        }
    }

    /// Runs the operation under the frozen configuration.
    pub async fn call(&self, args: A) -> Result<T, GuardError> {
        execute(self.op.as_ref(), args, &self.config, &self.breaker).await
    }

    /// Returns a new callable with `layer` appended to this one's layers.
    ///
    /// The new callable shares this callable's circuit breaker; this callable's
    /// configuration is left untouched.
    pub fn with_overrides(&self, layer: Layer<T>) -> Self {
        let layers: Vec<Layer<T>> = self.layers.iter().cloned().chain([layer]).collect();
        Self::build(
            Arc::clone(&self.op),
            layers.into(),
            Some(Arc::clone(&self.breaker)),
        )
    }

    /// Resets the shared circuit breaker to its initial closed state.
    pub fn reset(&self) {
        self.breaker.reset();
    }
}

impl<A, T> Guarded<A, T> {
    /// Returns the frozen resolved configuration.
    pub fn config(&self) -> &Config<T> {
        &self.config
    }

    /// Returns the circuit breaker shared with derived callables.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Returns the configured operation name.
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

impl<A, T> Clone for Guarded<A, T> {
    fn clone(&self) -> Self {
        Self {
            op: Arc::clone(&self.op),
            layers: Arc::clone(&self.layers),
            config: Arc::clone(&self.config),
            breaker: Arc::clone(&self.breaker),
        }
    }
}

impl<A, T> fmt::Debug for Guarded<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("config", &self.config)
            .field("layers", &self.layers.len())
            .field("breaker", &self.breaker)
            .finish()
    }
}

/// Wraps the async closure `f` with a single configuration layer.
///
/// `f` is called once per attempt with a fresh clone of the arguments. Use a tuple
/// for operations taking several arguments.
pub fn guard<A, T, E, F, Fut>(f: F, layer: Layer<T>) -> Guarded<A, T>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Guarded::new(OperationFn::arc(f), vec![layer])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerPatch, RetryPatch};
    use crate::core::breaker::CircuitState;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn failing(calls: Arc<AtomicU32>) -> Guarded<(), u32> {
        guard(
            move |_: ()| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(std::io::Error::other("down")) }
            },
            Layer::new()
                .with_name("failing")
                .with_retry(RetryPatch::new().with_jitter(false))
                .with_circuit_breaker(BreakerPatch::enabled().with_threshold(2)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn overrides_compose_without_touching_the_original() {
        let base = guard(
            |n: u32| async move { Ok::<_, BoxError>(n) },
            Layer::new().with_name("base").with_retries(3),
        );
        let derived = base
            .with_overrides(Layer::new().with_timeout(Duration::from_secs(1)))
            .with_overrides(Layer::new().with_name("derived"));

        assert_eq!(base.name(), "base");
        assert_eq!(base.config().timeout, Duration::from_secs(30));
        assert_eq!(derived.name(), "derived");
        assert_eq!(derived.config().timeout, Duration::from_secs(1));
        assert_eq!(derived.config().retry.count, 3);
        assert!(Arc::ptr_eq(base.breaker(), derived.breaker()));
        assert_eq!(derived.call(9).await.unwrap(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn derived_failures_trip_the_original() {
        let calls = Arc::new(AtomicU32::new(0));
        let base = failing(Arc::clone(&calls));
        let derived = base.with_overrides(Layer::new().with_name("derived"));

        assert!(derived.call(()).await.unwrap_err().is_retry_exhausted());
        assert!(base.call(()).await.unwrap_err().is_retry_exhausted());

        let err = base.call(()).await.unwrap_err();
        assert!(err.is_circuit_open());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        derived.reset();
        assert_eq!(base.breaker().state(), CircuitState::Closed);
        assert!(base.call(()).await.unwrap_err().is_retry_exhausted());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_guards_do_not_share_breakers() {
        let calls = Arc::new(AtomicU32::new(0));
        let a = failing(Arc::clone(&calls));
        let b = failing(Arc::clone(&calls));

        let _ = a.call(()).await;
        let _ = a.call(()).await;
        assert!(a.call(()).await.unwrap_err().is_circuit_open());
        assert!(b.call(()).await.unwrap_err().is_retry_exhausted());
    }

    #[tokio::test]
    async fn from_operation_uses_trait_impl() {
        struct Double;

        #[async_trait::async_trait]
        impl Operation<u32> for Double {
            type Output = u32;

            async fn call(&self, n: u32) -> Result<u32, BoxError> {
                Ok(n * 2)
            }
        }

        let g = Guarded::from_operation(Double, Layer::new());
        assert_eq!(g.call(4).await.unwrap(), 8);
        assert_eq!(g.name(), "anonymous");
    }
}

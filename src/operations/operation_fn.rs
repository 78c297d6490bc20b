//! # Function-backed operation (`OperationFn`)
//!
//! [`OperationFn`] wraps a closure `F: Fn(A) -> Fut`, producing a fresh future per
//! attempt. Any error type convertible into [`BoxError`] is accepted.
//!
//! ## Example
//! ```rust
//! use callguard::{Operation, OperationFn};
//!
//! let op = OperationFn::new(|id: u64| async move {
//!     if id == 0 {
//!         return Err(std::io::Error::other("unknown id"));
//!     }
//!     Ok(format!("user-{id}"))
//! });
//! # let _ = op;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::operations::Operation;

/// Function-backed operation.
#[derive(Debug)]
pub struct OperationFn<F> {
    f: F,
}

impl<F> OperationFn<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<A, T, E, F, Fut> Operation<A> for OperationFn<F>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    type Output = T;

    async fn call(&self, args: A) -> Result<T, BoxError> {
        (self.f)(args).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_value_and_boxes_error() {
        let op = OperationFn::new(|n: u32| async move {
            if n == 0 {
                Err(std::io::Error::other("zero"))
            } else {
                Ok(n * 2)
            }
        });

        assert_eq!(op.call(21).await.unwrap(), 42);
        let err = op.call(0).await.unwrap_err();
        assert_eq!(err.to_string(), "zero");
    }
}

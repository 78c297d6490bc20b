//! # Operation abstraction.
//!
//! This module defines the [`Operation`] trait: an async unit of work taking
//! arguments `A` and producing `Output` or a [`BoxError`]. The common handle type is
//! [`OperationRef`], an `Arc<dyn Operation>` suitable for sharing across guarded
//! callables derived from one another.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// Shared handle to an operation.
pub type OperationRef<A, T> = Arc<dyn Operation<A, Output = T>>;

/// # Asynchronous unit of work.
///
/// The engine calls [`call`](Operation::call) once per attempt with a fresh clone of
/// the arguments. A panic while building or polling the returned future is treated
/// exactly like an `Err`.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use callguard::{BoxError, Operation};
///
/// struct Lookup;
///
/// #[async_trait]
/// impl Operation<u64> for Lookup {
///     type Output = String;
///
///     async fn call(&self, id: u64) -> Result<String, BoxError> {
///         if id == 0 {
///             return Err("unknown id".into());
///         }
///         Ok(format!("user-{id}"))
///     }
/// }
/// ```
#[async_trait]
pub trait Operation<A>: Send + Sync + 'static
where
    A: Send + 'static,
{
    /// Value produced on success.
    type Output: Send + 'static;

    /// Runs one attempt.
    async fn call(&self, args: A) -> Result<Self::Output, BoxError>;
}

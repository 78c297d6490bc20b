//! # Operation abstractions.
//!
//! - [`Operation`] - trait for async units of work taking arguments `A`
//! - [`OperationFn`] - closure-backed implementation
//! - [`OperationRef`] - shared reference to an operation (`Arc<dyn Operation>`)

mod operation;
mod operation_fn;

pub use operation::{Operation, OperationRef};
pub use operation_fn::OperationFn;

//! Layered configuration.
//!
//! ## Contents
//! - [`Layer`] sparse patch (plus [`RetryPatch`], [`BreakerPatch`] for nested records)
//! - [`Config`] fully resolved snapshot
//! - [`resolve`] folds layers over the defaults
//!
//! ## Precedence
//! ```text
//! defaults ◄── instance layer ◄── per-operation layer ◄── override layers (with_overrides)
//! ```

mod layer;
mod resolved;

pub use layer::{AnyLayer, BreakerPatch, Layer, RetryPatch};
pub use resolved::{Config, DEFAULT_NAME, DEFAULT_TIMEOUT, resolve};

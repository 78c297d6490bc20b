//! # Execution context passed to every callback.
//!
//! A fresh [`ExecutionContext`] is captured right before each callback fires and
//! is never retained by the engine.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

/// Snapshot of a guarded call at the moment a callback fires.
///
/// - `attempt` is 1-based: the first attempt is `1`, the first retry is `2`.
/// - `duration` is measured from the start of the call, not of the attempt.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// Name of the guarded operation (`"anonymous"` unless configured).
    pub function_name: Arc<str>,
    /// Time elapsed since the call started.
    pub duration: Duration,
    /// Wall-clock timestamp of the snapshot.
    pub timestamp: SystemTime,
    /// Current attempt number (1-based).
    pub attempt: u32,
    /// Maximum number of attempts for this call (`retry.count + 1`).
    pub max_attempts: u32,
}

impl ExecutionContext {
    /// Captures a context for the 0-based `attempt_index`.
    pub(crate) fn capture(
        name: &Arc<str>,
        started: Instant,
        attempt_index: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            function_name: Arc::clone(name),
            duration: started.elapsed(),
            timestamp: SystemTime::now(),
            attempt: attempt_index.saturating_add(1),
            max_attempts,
        }
    }
}

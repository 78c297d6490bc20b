//! Error types surfaced by guarded operations.
//!
//! This module defines:
//!
//! - [`GuardError`]: the terminal failure of one guarded call. Exactly one of its
//!   four kinds is returned for every failing execution.
//! - [`AttemptError`]: the failure of a single attempt, reported to `on_retry`
//!   before the next attempt starts. It is never returned to the caller.
//!
//! Both types provide `as_label` helpers for logs/metrics.

use std::time::Duration;

use thiserror::Error;

use crate::observers::ExecutionContext;

/// Boxed error returned by wrapped operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Terminal failure of a guarded call.
///
/// Every variant carries the [`ExecutionContext`] captured when the call gave up.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GuardError {
    /// The final attempt did not settle within the configured timeout.
    #[error("\"{}\" timed out after {timeout:?}", context.function_name)]
    Timeout {
        /// Context of the final attempt.
        context: ExecutionContext,
        /// The per-attempt timeout that was exceeded.
        timeout: Duration,
    },

    /// Every attempt failed and the last failure was not a timeout.
    #[error(
        "\"{}\" failed after {} attempt(s): {cause}",
        context.function_name,
        context.max_attempts
    )]
    RetryExhausted {
        /// Context of the final attempt.
        context: ExecutionContext,
        /// The error returned by the final attempt.
        #[source]
        cause: BoxError,
    },

    /// The circuit breaker refused the call; the operation was not invoked.
    #[error("circuit breaker is open for \"{}\"", context.function_name)]
    CircuitOpen {
        /// Context at the moment the call was refused.
        context: ExecutionContext,
    },

    /// The cancellation signal fired during an attempt or a backoff delay.
    #[error("execution of \"{}\" was aborted", context.function_name)]
    Aborted {
        /// Context of the attempt (or pending attempt) that was interrupted.
        context: ExecutionContext,
    },
}

impl GuardError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use callguard::GuardError;
    /// # fn label(err: &GuardError) -> &'static str {
    /// err.as_label() // "timeout", "retry_exhausted", "circuit_open" or "aborted"
    /// # }
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            GuardError::Timeout { .. } => "timeout",
            GuardError::RetryExhausted { .. } => "retry_exhausted",
            GuardError::CircuitOpen { .. } => "circuit_open",
            GuardError::Aborted { .. } => "aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            GuardError::Timeout { timeout, .. } => format!("timeout: {timeout:?}"),
            GuardError::RetryExhausted { cause, context } => {
                format!("exhausted {} attempt(s): {cause}", context.max_attempts)
            }
            GuardError::CircuitOpen { .. } => "circuit open".to_string(),
            GuardError::Aborted { .. } => "aborted".to_string(),
        }
    }

    /// Returns the execution context captured when the call terminated.
    pub fn context(&self) -> &ExecutionContext {
        match self {
            GuardError::Timeout { context, .. }
            | GuardError::RetryExhausted { context, .. }
            | GuardError::CircuitOpen { context }
            | GuardError::Aborted { context } => context,
        }
    }

    /// `true` for [`GuardError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, GuardError::Timeout { .. })
    }

    /// `true` for [`GuardError::RetryExhausted`].
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, GuardError::RetryExhausted { .. })
    }

    /// `true` for [`GuardError::CircuitOpen`].
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, GuardError::CircuitOpen { .. })
    }

    /// `true` for [`GuardError::Aborted`].
    pub fn is_aborted(&self) -> bool {
        matches!(self, GuardError::Aborted { .. })
    }
}

/// # Failure of a single attempt.
///
/// Passed to the `on_retry` callback as the reason for the upcoming retry.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AttemptError {
    /// The operation returned an error (or panicked).
    #[error("{0}")]
    Failed(BoxError),

    /// The attempt did not settle within the per-attempt timeout.
    #[error("timed out after {timeout:?}")]
    TimedOut {
        /// The per-attempt timeout that was exceeded.
        timeout: Duration,
    },
}

impl AttemptError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptError::Failed(_) => "attempt_failed",
            AttemptError::TimedOut { .. } => "attempt_timeout",
        }
    }
}

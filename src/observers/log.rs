//! # log_observer: tracing-backed callback set
//!
//! A ready-made [`Observer`] that writes every lifecycle callback as a
//! `tracing::info!` event. Use it for tests or demos.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO callguard: [loading] name="fetch_user" attempt=1 loading=true
//! INFO callguard: [retry] name="fetch_user" attempt=2 retry=1 err="connection refused"
//! INFO callguard: [success] name="fetch_user" attempt=2 duration=1.012s
//! INFO callguard: [loading] name="fetch_user" attempt=2 loading=false
//! INFO callguard: [finish] name="fetch_user" attempt=2 duration=1.012s
//! ```

use tracing::info;

use crate::observers::Observer;

/// Builds an observer that logs every callback through `tracing`.
#[must_use]
pub fn log_observer<T: ?Sized + 'static>() -> Observer<T> {
    Observer::new()
        .on_loading(|loading, ctx| {
            info!(name = %ctx.function_name, attempt = ctx.attempt, loading, "[loading]");
        })
        .on_success(|_value: &T, ctx| {
            info!(
                name = %ctx.function_name,
                attempt = ctx.attempt,
                duration = ?ctx.duration,
                "[success]"
            );
        })
        .on_error(|err, ctx| {
            info!(
                name = %ctx.function_name,
                attempt = ctx.attempt,
                kind = err.as_label(),
                err = %err,
                "[error]"
            );
        })
        .on_retry(|retry, err, ctx| {
            info!(
                name = %ctx.function_name,
                attempt = ctx.attempt,
                retry,
                err = %err,
                "[retry]"
            );
        })
        .on_finish(|ctx| {
            info!(
                name = %ctx.function_name,
                attempt = ctx.attempt,
                duration = ?ctx.duration,
                "[finish]"
            );
        })
}

//! # Engine: the guarded-call control loop.
//!
//! Drives one call of a guarded operation through the circuit breaker, the attempt
//! loop and the observer callbacks.
//!
//! ## Flow
//! ```text
//! breaker.can_execute()? ── no ──► on_error(CircuitOpen) ──► Err
//!        │ yes
//!        ▼
//! on_loading(true)
//! loop {
//!   ├─► run_once(op, args, timeout, signal)
//!   │       ├─ Done      ─► breaker.record_success ─► on_success ─► on_loading(false) ─► on_finish ─► Ok
//!   │       ├─ Cancelled ─► on_error(Aborted) ─► on_loading(false) ─► on_finish ─► Err
//!   │       └─ Failed / TimedOut ─► remember as last failure
//!   ├─► last attempt? ─► break
//!   ├─► on_retry(n, last failure)
//!   └─► sleep(retry.delay(n - 1)) racing the signal ─► Cancelled ⇒ Aborted (as above)
//! }
//! breaker.record_failure()
//! last failure TimedOut ⇒ Timeout, otherwise ⇒ RetryExhausted(cause)
//! on_error ─► on_loading(false) ─► on_finish ─► Err
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially**; attempt `n + 1` never starts before attempt `n`
//!   settled and its backoff delay elapsed.
//! - Cancellation is always terminal and never triggers a retry.
//! - Only an exhausted call records a breaker failure; aborted calls record nothing.
//! - Internal outcomes are translated to [`GuardError`] here and nowhere else.

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::breaker::CircuitBreaker;
use crate::core::runner::{Outcome, run_once, sleep_or_cancel};
use crate::error::{AttemptError, GuardError};
use crate::observers::ExecutionContext;
use crate::operations::Operation;

/// Runs one guarded call of `op` with `args` under `cfg`.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(name = %cfg.name, max_attempts = cfg.max_attempts())
)]
pub(crate) async fn execute<A, T>(
    op: &dyn Operation<A, Output = T>,
    args: A,
    cfg: &Config<T>,
    breaker: &CircuitBreaker,
) -> Result<T, GuardError>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
{
    let max_attempts = cfg.max_attempts();
    let signal = cfg.signal.as_ref();
    let timeout = cfg.timeout_limit();

    if !breaker.can_execute() {
        let context = ExecutionContext::capture(&cfg.name, Instant::now(), 0, max_attempts);
        let err = GuardError::CircuitOpen {
            context: context.clone(),
        };
        warn!(kind = err.as_label(), "call refused");
        cfg.observer.error(&err, &context);
        return Err(err);
    }

    let started = Instant::now();
    let ctx = |attempt: u32| ExecutionContext::capture(&cfg.name, started, attempt, max_attempts);

    cfg.observer.loading(true, &ctx(0));

    let mut attempt: u32 = 0;
    let last_failure = loop {
        debug!(attempt = attempt + 1, "attempt starting");

        let failure = match run_once(op, args.clone(), timeout, signal).await {
            Outcome::Done(value) => {
                breaker.record_success();
                debug!(attempt = attempt + 1, "attempt succeeded");
                return Ok(succeed(cfg, &ctx(attempt), value));
            }
            Outcome::Cancelled => {
                let context = ctx(attempt);
                return Err(fail(cfg, GuardError::Aborted { context }));
            }
            Outcome::Failed(err) => AttemptError::Failed(err),
            Outcome::TimedOut(timeout) => AttemptError::TimedOut { timeout },
        };

        if attempt + 1 >= max_attempts {
            break failure;
        }
        attempt += 1;

        cfg.observer.retry(attempt, &failure, &ctx(attempt));

        let delay = cfg.retry.delay(attempt - 1);
        debug!(
            attempt,
            delay = ?delay,
            err = %failure,
            "retry scheduled"
        );
        if let Outcome::Cancelled = sleep_or_cancel(delay, signal).await {
            let context = ctx(attempt);
            return Err(fail(cfg, GuardError::Aborted { context }));
        }
    };

    breaker.record_failure();

    let context = ctx(attempt);
    let err = match last_failure {
        AttemptError::TimedOut { .. } => GuardError::Timeout {
            context,
            timeout: cfg.timeout,
        },
        AttemptError::Failed(cause) => GuardError::RetryExhausted { context, cause },
    };
    Err(fail(cfg, err))
}

/// Fires the success callbacks in order and hands the value back.
fn succeed<T>(cfg: &Config<T>, ctx: &ExecutionContext, value: T) -> T {
    cfg.observer.success(&value, ctx);
    cfg.observer.loading(false, ctx);
    cfg.observer.finish(ctx);
    value
}

/// Fires the failure callbacks in order and hands the error back.
fn fail<T: ?Sized>(cfg: &Config<T>, err: GuardError) -> GuardError {
    let ctx = err.context().clone();
    warn!(
        attempt = ctx.attempt,
        kind = err.as_label(),
        err = %err,
        "call failed"
    );
    cfg.observer.error(&err, &ctx);
    cfg.observer.loading(false, &ctx);
    cfg.observer.finish(&ctx);
    err
}

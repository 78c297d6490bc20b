//! # Run a single attempt of an operation.
//!
//! Executes one attempt of an [`Operation`] racing three outcomes:
//!
//! ```text
//!   op.call(args) ──────► Done(value) / Failed(error)   (panics become Failed)
//!   timeout elapses ────► TimedOut(timeout)             (skipped when disabled)
//!   signal cancelled ───► Cancelled                     (checked up front, then awaited)
//! ```
//!
//! ## Rules
//! - The first settled branch wins; the losing branches are dropped, which releases
//!   the timer and the cancellation listener.
//! - An already-cancelled signal short-circuits before the operation is invoked.
//! - Child futures are never detached: nothing outlives the returned [`Outcome`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::operations::Operation;

/// Settled result of one attempt or one backoff wait.
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    /// The operation produced a value.
    Done(T),
    /// The operation returned an error or panicked.
    Failed(BoxError),
    /// The per-attempt timeout elapsed first.
    TimedOut(Duration),
    /// The cancellation signal fired first.
    Cancelled,
}

/// Executes a single attempt of `op` with optional timeout and cancellation.
///
/// ### Timeout behavior
/// If `timeout` is `Some(dur)`, the attempt is wrapped in `tokio::time::timeout`;
/// on expiry the operation future is dropped and `TimedOut(dur)` is returned.
///
/// ### Cancellation semantics
/// `signal` is checked before the operation is invoked and then raced against it.
/// The operation does not receive the signal; dropping its future is the only
/// way it is stopped.
pub(crate) async fn run_once<A, T>(
    op: &dyn Operation<A, Output = T>,
    args: A,
    timeout: Option<Duration>,
    signal: Option<&CancellationToken>,
) -> Outcome<T>
where
    A: Send + 'static,
    T: Send + 'static,
{
    if signal.is_some_and(CancellationToken::is_cancelled) {
        return Outcome::Cancelled;
    }

    // The call happens on first poll, so a panic while building the future is caught too.
    let attempt = AssertUnwindSafe(async move { op.call(args).await }).catch_unwind();

    let timed = async move {
        match timeout {
            Some(dur) => match time::timeout(dur, attempt).await {
                Ok(res) => settle(res),
                Err(_elapsed) => Outcome::TimedOut(dur),
            },
            None => settle(attempt.await),
        }
    };

    match signal {
        Some(token) => select! {
            biased;
            _ = token.cancelled() => Outcome::Cancelled,
            out = timed => out,
        },
        None => timed.await,
    }
}

/// Sleeps for `delay` unless `signal` fires first.
///
/// Returns `Outcome::Done(())` when the full delay elapsed and `Outcome::Cancelled`
/// otherwise.
pub(crate) async fn sleep_or_cancel(
    delay: Duration,
    signal: Option<&CancellationToken>,
) -> Outcome<()> {
    let Some(token) = signal else {
        time::sleep(delay).await;
        return Outcome::Done(());
    };
    if token.is_cancelled() {
        return Outcome::Cancelled;
    }

    let sleep = time::sleep(delay);
    tokio::pin!(sleep);
    select! {
        biased;
        _ = token.cancelled() => Outcome::Cancelled,
        _ = &mut sleep => Outcome::Done(()),
    }
}

fn settle<T>(res: Result<Result<T, BoxError>, Box<dyn Any + Send>>) -> Outcome<T> {
    match res {
        Ok(Ok(value)) => Outcome::Done(value),
        Ok(Err(err)) => Outcome::Failed(err),
        Err(panic) => Outcome::Failed(panic_message(panic.as_ref()).into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("operation panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("operation panicked: {msg}")
    } else {
        "operation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::OperationFn;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sleeper(ms: u64) -> OperationFn<impl Fn(u32) -> futures::future::BoxFuture<'static, Result<u32, BoxError>>> {
        OperationFn::new(move |n: u32| {
            async move {
                time::sleep(Duration::from_millis(ms)).await;
                Ok::<_, BoxError>(n)
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn value_wins_before_timeout() {
        let op = sleeper(10);
        let out = run_once(&op, 5, Some(Duration::from_millis(100)), None).await;
        assert!(matches!(out, Outcome::Done(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_wins_over_slow_operation() {
        let op = sleeper(150);
        let out = run_once(&op, 5, Some(Duration::from_millis(100)), None).await;
        assert!(matches!(out, Outcome::TimedOut(d) if d == Duration::from_millis(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_timeout_waits_for_operation() {
        let op = sleeper(60_000);
        let out = run_once(&op, 1, None, None).await;
        assert!(matches!(out, Outcome::Done(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn pre_cancelled_signal_skips_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let op = OperationFn::new(move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, BoxError>(()) }
        });
        let token = CancellationToken::new();
        token.cancel();

        let out = run_once(&op, (), None, Some(&token)).await;
        assert!(matches!(out, Outcome::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_mid_attempt_wins() {
        let op = sleeper(1_000);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let out = run_once(&op, 1, Some(Duration::from_millis(500)), Some(&token)).await;
        assert!(matches!(out, Outcome::Cancelled));
    }

    #[tokio::test]
    async fn panic_becomes_failure() {
        let op = OperationFn::new(|n: u32| async move {
            if n > 0 {
                panic!("bad input {n}");
            }
            Ok::<u32, BoxError>(n)
        });
        match run_once(&op, 3, None, None).await {
            Outcome::Failed(err) => assert!(err.to_string().contains("bad input 3")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_is_interrupted_by_signal() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let out = sleep_or_cancel(Duration::from_secs(60), Some(&token)).await;
        assert!(matches!(out, Outcome::Cancelled));

        let out = sleep_or_cancel(Duration::from_millis(5), None).await;
        assert!(matches!(out, Outcome::Done(())));
    }
}

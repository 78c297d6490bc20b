//! # Example: basic_usage
//!
//! Wraps a flaky async operation with retries, a timeout and a circuit breaker,
//! and logs every lifecycle callback through [`log_observer`].
//!
//! The operation fails twice before succeeding, then a second guarded operation
//! that always fails trips its breaker.
//!
//! ## Flow
//! ```text
//! flaky.call(42)
//!   ├─► on_loading(true)
//!   ├─► attempt 1 → Err("boom #1") ─► on_retry(1) ─► sleep(≈100ms)
//!   ├─► attempt 2 → Err("boom #2") ─► on_retry(2) ─► sleep(≈200ms)
//!   ├─► attempt 3 → Ok(84)
//!   └─► on_success ─► on_loading(false) ─► on_finish
//!
//! broken.call(()) ×3 → RetryExhausted, RetryExhausted, CircuitOpen
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_usage --features logging
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use callguard::{
    AnyLayer, BoxError, BreakerPatch, Guard, Layer, RetryPatch, log_observer,
};
use tracing_subscriber::EnvFilter;

static FAIL_COUNT: AtomicU32 = AtomicU32::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Instance defaults: every wrapped operation logs and waits at most 2s per attempt.
    let guard = Guard::new(
        AnyLayer::new()
            .with_timeout(Duration::from_secs(2))
            .with_observer(log_observer()),
    );

    // 2. An operation that fails twice before succeeding.
    let flaky = guard.wrap(
        |n: u64| async move {
            let attempt = FAIL_COUNT.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt <= 2 {
                return Err::<u64, BoxError>(format!("boom #{attempt}").into());
            }
            Ok(n * 2)
        },
        Layer::new().with_name("flaky").with_retry(
            RetryPatch::new()
                .with_count(3)
                .with_base_delay(Duration::from_millis(100)),
        ),
    );
    println!("flaky returned {}", flaky.call(42).await?);

    // 3. An operation that never succeeds, guarded by a breaker with threshold 2.
    let broken = guard.wrap(
        |_: ()| async { Err::<(), BoxError>("service down".into()) },
        Layer::new()
            .with_name("broken")
            .with_circuit_breaker(BreakerPatch::enabled().with_threshold(2)),
    );
    for _ in 0..3 {
        if let Err(err) = broken.call(()).await {
            println!("broken: {} ({})", err, err.as_label());
        }
    }
    println!("breaker is {}", broken.breaker().state().as_label());

    Ok(())
}

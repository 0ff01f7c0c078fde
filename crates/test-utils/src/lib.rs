pub mod builders;

use std::sync::Once;
use std::time::Duration;

use calcdag::engine::wait_for_terminal;
use calcdag::store::{Operation, OperationStore};
use calcdag::types::OperationId;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Wait (at most 5 seconds) until every id is `Done` or `Error`.
pub async fn settle(store: &dyn OperationStore, ids: &[OperationId]) -> Vec<Operation> {
    with_timeout(wait_for_terminal(store, ids, Duration::from_millis(5)))
        .await
        .expect("store failed while settling")
}

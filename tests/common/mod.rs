#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use calcdag::engine::{Injector, Orchestrator, OrchestratorOptions};
use calcdag::ingest::{Submission, SubmissionLedger, SubmitRequest, submit_expression};
use calcdag::store::OperationStore;

pub use calcdag_test_utils::builders;
pub use calcdag_test_utils::{init_tracing, settle, with_timeout};

/// Zero simulated duration and a short poll interval.
pub fn fast_options(worker_count: usize) -> OrchestratorOptions {
    OrchestratorOptions {
        worker_count,
        operation_duration: Duration::ZERO,
        poll_interval: Duration::from_millis(20),
        queue_capacity: 16,
    }
}

pub fn start(store: Arc<dyn OperationStore>, worker_count: usize) -> Orchestrator {
    Orchestrator::start(store, fast_options(worker_count))
}

/// Store an expression and signal its operations directly.
pub async fn submit(store: &dyn OperationStore, injector: &Injector, expression: &str) -> Submission {
    let ledger = SubmissionLedger::new();
    let submission = submit_expression(store, &ledger, SubmitRequest::new(expression))
        .await
        .expect("submit expression");
    injector
        .submit_all(&submission.operations)
        .await
        .expect("signal resolver");
    submission
}

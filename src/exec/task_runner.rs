// src/exec/task_runner.rs

//! Processing of a single operation by a worker.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::calc::calculate;
use crate::errors::Result;
use crate::exec::executor_loop::WorkerContext;
use crate::store::FailureReason;
use crate::types::{OperationId, OperationState};

/// What happened to a unit taken from the worker input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitOutcome {
    /// A result or a failure was stored.
    Recorded,
    /// The operation was no longer `Pending`; nothing was touched.
    Stale,
}

/// Claim, compute and record one operation.
///
/// 1. Under the update lock: load, check `Pending`, mark `Processing`.
/// 2. Without the lock: run the calculation (including its delay).
/// 3. Under the update lock: reload fresh, record result or failure.
pub(crate) async fn run_unit(
    worker: usize,
    ctx: &WorkerContext,
    id: OperationId,
) -> Result<UnitOutcome> {
    let (operator, operands) = {
        let _guard = ctx.store.update_lock().lock().await;
        let mut op = ctx.store.get(id)?;

        if op.state != OperationState::Pending {
            debug!(worker, operation = %id, state = %op.state, "not pending; skipping stale unit");
            return Ok(UnitOutcome::Stale);
        }

        op.state = OperationState::Processing;
        ctx.store.update(&op)?;
        (op.operator, op.operands())
    };

    info!(worker, operation = %id, %operator, "operation claimed");

    let outcome = match operands {
        Some((left, right)) => calculate(operator, left, right, ctx.operation_duration)
            .await
            .map_err(FailureReason::Calculation),
        None => Err(FailureReason::Internal(
            "operands were not resolved when the operation was claimed".to_string(),
        )),
    };

    {
        let _guard = ctx.store.update_lock().lock().await;
        let mut op = ctx.store.get(id)?;

        match outcome {
            Ok(value) => {
                info!(worker, operation = %id, result = value, "operation finished");
                op.complete(value, Utc::now());
            }
            Err(reason) => {
                warn!(worker, operation = %id, reason = %reason, "operation failed");
                op.fail(reason, Utc::now());
            }
        }

        ctx.store.update(&op)?;
    }

    Ok(UnitOutcome::Recorded)
}

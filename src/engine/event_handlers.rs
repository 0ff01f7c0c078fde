// src/engine/event_handlers.rs

//! Per-state handling logic for the resolver core.
//!
//! Every function here reads and writes the store directly and must run
//! while the caller holds the store's update lock.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, warn};

use crate::errors::{CalcdagError, Result};
use crate::store::{FailureReason, Operation, OperationStore};
use crate::types::{OperationId, OperationState};

/// Command produced by the core, to be executed by the async shell after the
/// update lock has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand this operation to the worker pool.
    Dispatch(OperationId),
    /// Feed this operation back into the resolver.
    Reactivate(OperationId),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
}

impl CoreStep {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Outcome of examining a `Created` or `Scheduled` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Both operands are values; the operation is now `Pending`.
    Ready,
    /// At least one side still waits; the operation is now `Scheduled`.
    Waiting,
    /// A sub-operation had already failed; the operation is now `Error`.
    Failed,
}

/// Handle an operation in `Created` or `Scheduled`.
///
/// Sub-operations that already reached a terminal state are applied in
/// place, so a dependency that finished before its dependent was first
/// observed does not leave the dependent waiting forever.
pub fn handle_unresolved(store: &dyn OperationStore, mut op: Operation) -> Result<Readiness> {
    let deps: Vec<OperationId> = op.dependencies().collect();

    for dep in deps {
        let upstream = match store.get(dep) {
            Ok(upstream) => upstream,
            Err(CalcdagError::OperationNotFound(_)) => {
                let reason = FailureReason::Internal(format!("sub-operation {dep} not found"));
                return fail_in_place(store, op, reason);
            }
            Err(err) => return Err(err),
        };

        match (upstream.state, upstream.result) {
            (OperationState::Done, Some(value)) => {
                op.resolve_dependency(dep, value);
                debug!(
                    operation = %op.id,
                    dependency = %dep,
                    value,
                    "sub-operation already finished; operand filled"
                );
            }
            (OperationState::Done, None) => {
                let reason = FailureReason::Internal(format!(
                    "sub-operation {dep} finished without a result"
                ));
                return fail_in_place(store, op, reason);
            }
            (OperationState::Error, _) => {
                let cause = upstream.failure.unwrap_or_else(|| {
                    FailureReason::Internal("unknown failure".to_string())
                });
                return fail_in_place(store, op, FailureReason::dependency(dep, cause));
            }
            _ => {}
        }
    }

    if op.has_dependencies() {
        if op.state == OperationState::Created {
            debug!(operation = %op.id, "waiting on sub-operations; marking Scheduled");
        }
        op.state = OperationState::Scheduled;
        store.update(&op)?;
        return Ok(Readiness::Waiting);
    }

    debug!(operation = %op.id, "operands resolved; marking Pending");
    op.state = OperationState::Pending;
    store.update(&op)?;
    Ok(Readiness::Ready)
}

/// Handle an operation in `Pending`.
///
/// `dispatched` holds every id handed to the worker pool and not yet
/// reported back; a pending id already in it is not dispatched twice.
pub fn handle_pending(dispatched: &mut HashSet<OperationId>, id: OperationId) -> Vec<CoreCommand> {
    if dispatched.insert(id) {
        debug!(operation = %id, "dispatching to worker pool");
        vec![CoreCommand::Dispatch(id)]
    } else {
        debug!(operation = %id, "already dispatched; ignoring duplicate signal");
        Vec::new()
    }
}

/// Handle an operation in `Done`: fill the matching operand of every
/// dependent and re-activate it.
pub fn cascade_result(store: &dyn OperationStore, op: &Operation) -> Result<Vec<CoreCommand>> {
    let Some(value) = op.result else {
        warn!(operation = %op.id, "done without a result; nothing to cascade");
        return Ok(Vec::new());
    };

    let mut commands = Vec::new();
    for mut dependent in store.list_all()? {
        if dependent.state.is_terminal() || !dependent.depends_on(op.id) {
            continue;
        }

        dependent.resolve_dependency(op.id, value);
        store.update(&dependent)?;

        debug!(
            operation = %dependent.id,
            dependency = %op.id,
            value,
            "operand filled from finished sub-operation"
        );
        commands.push(CoreCommand::Reactivate(dependent.id));
    }

    Ok(commands)
}

/// Handle an operation in `Error`: fail every dependent with a reason
/// naming this operation and re-activate it so the failure keeps climbing.
pub fn cascade_failure(store: &dyn OperationStore, op: &Operation) -> Result<Vec<CoreCommand>> {
    let cause = op
        .failure
        .clone()
        .unwrap_or_else(|| FailureReason::Internal("unknown failure".to_string()));

    let mut commands = Vec::new();
    for mut dependent in store.list_all()? {
        if dependent.state.is_terminal() || !dependent.depends_on(op.id) {
            continue;
        }

        let reason = FailureReason::dependency(op.id, cause.clone());
        warn!(operation = %dependent.id, reason = %reason, "operation failed");
        dependent.fail(reason, Utc::now());
        store.update(&dependent)?;

        commands.push(CoreCommand::Reactivate(dependent.id));
    }

    Ok(commands)
}

fn fail_in_place(
    store: &dyn OperationStore,
    mut op: Operation,
    reason: FailureReason,
) -> Result<Readiness> {
    warn!(operation = %op.id, reason = %reason, "operation failed");
    op.fail(reason, Utc::now());
    store.update(&op)?;
    Ok(Readiness::Failed)
}

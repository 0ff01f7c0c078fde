// tests/orchestrator_scenarios.rs

mod common;
use crate::common::builders::OperationBuilder;
use crate::common::{init_tracing, settle, start, submit};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use calcdag::calc::CalcError;
use calcdag::errors::Result;
use calcdag::store::{
    FailureReason, InMemoryStore, NewOperation, Operand, Operation, OperationStore, UpdateLock,
};
use calcdag::types::{OperationId, OperationState, Operator};

/// Store that remembers every state each operation was written with.
#[derive(Debug, Default)]
struct RecordingStore {
    inner: InMemoryStore,
    history: Mutex<HashMap<OperationId, Vec<OperationState>>>,
}

impl RecordingStore {
    fn record(&self, id: OperationId, state: OperationState) {
        let mut history = self.history.lock().unwrap();
        let states = history.entry(id).or_default();
        if states.last() != Some(&state) {
            states.push(state);
        }
    }

    fn history(&self, id: OperationId) -> Vec<OperationState> {
        self.history.lock().unwrap().get(&id).cloned().unwrap_or_default()
    }
}

impl OperationStore for RecordingStore {
    fn create(&self, draft: NewOperation) -> Result<OperationId> {
        let id = self.inner.create(draft)?;
        self.record(id, OperationState::Created);
        Ok(id)
    }

    fn get(&self, id: OperationId) -> Result<Operation> {
        self.inner.get(id)
    }

    fn update(&self, op: &Operation) -> Result<()> {
        self.inner.update(op)?;
        self.record(op.id, op.state);
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Operation>> {
        self.inner.list_all()
    }

    fn update_lock(&self) -> &UpdateLock {
        self.inner.update_lock()
    }
}

#[tokio::test]
async fn nested_expression_resolves_through_dependency() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let orchestrator = start(store.clone(), 2);

    let sub = submit(store.as_ref(), &orchestrator.injector(), "2+2*2").await;
    let ops = settle(store.as_ref(), &sub.operations).await;

    let (a, b) = (&ops[0], &ops[1]);
    assert_eq!(a.operator, Operator::Multiply);
    assert_eq!(a.state, OperationState::Done);
    assert_eq!(a.result, Some(4.0));

    assert_eq!(b.state, OperationState::Done);
    assert_eq!(b.right, Operand::Value(4.0));
    assert_eq!(b.result, Some(6.0));
    assert!(b.finished_at.is_some());

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn division_by_zero_ends_in_error_without_result() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let orchestrator = start(store.clone(), 1);

    let sub = submit(store.as_ref(), &orchestrator.injector(), "5/0").await;
    let c = settle(store.as_ref(), &[sub.root]).await.remove(0);

    assert_eq!(c.state, OperationState::Error);
    assert_eq!(c.result, None);
    assert_eq!(
        c.failure,
        Some(FailureReason::Calculation(CalcError::DivisionByZero))
    );
    assert!(c.finished_at.is_some());

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn dependent_of_failed_operation_fails_with_chain() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let c = OperationBuilder::new(Operator::Divide)
        .values(5.0, 0.0)
        .insert(store.as_ref());
    let d = OperationBuilder::new(Operator::Add)
        .left_after(c)
        .right(Operand::Value(3.0))
        .insert(store.as_ref());

    // Nothing injected: the startup sweep finds both.
    let orchestrator = start(store.clone(), 2);
    let d_op = settle(store.as_ref(), &[d]).await.remove(0);

    assert_eq!(d_op.state, OperationState::Error);
    assert_eq!(d_op.result, None);
    assert_eq!(d_op.left, Operand::Abandoned);
    let reason = d_op.failure.expect("failure reason");
    assert_eq!(reason.chain(), vec![c]);
    assert_eq!(
        reason.root_cause(),
        &FailureReason::Calculation(CalcError::DivisionByZero)
    );

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn one_failing_side_fails_dependent_exactly_once() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let orchestrator = start(store.clone(), 4);

    let sub = submit(store.as_ref(), &orchestrator.injector(), "(1/0)+(2*3)").await;
    let ops = settle(store.as_ref(), &sub.operations).await;

    let failed = ops.iter().find(|op| op.operator == Operator::Divide).unwrap();
    let good = ops.iter().find(|op| op.operator == Operator::Multiply).unwrap();
    let root = ops.last().unwrap();

    assert_eq!(failed.state, OperationState::Error);
    assert_eq!(good.state, OperationState::Done);
    assert_eq!(good.result, Some(6.0));

    assert_eq!(root.state, OperationState::Error);
    assert_eq!(root.failure.as_ref().unwrap().chain(), vec![failed.id]);

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn dependency_already_done_before_start_is_applied() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let done = OperationBuilder::new(Operator::Multiply)
        .values(2.0, 2.0)
        .done(4.0)
        .insert(store.as_ref());
    let dependent = OperationBuilder::new(Operator::Subtract)
        .left(Operand::Value(10.0))
        .right_after(done)
        .insert(store.as_ref());

    let orchestrator = start(store.clone(), 1);
    let op = settle(store.as_ref(), &[dependent]).await.remove(0);

    assert_eq!(op.state, OperationState::Done);
    assert_eq!(op.result, Some(6.0));

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn pending_leftovers_are_picked_up_at_startup() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let id = OperationBuilder::new(Operator::Add)
        .values(1.5, 2.5)
        .state(OperationState::Pending)
        .insert(store.as_ref());

    let orchestrator = start(store.clone(), 1);
    let op = settle(store.as_ref(), &[id]).await.remove(0);

    assert_eq!(op.result, Some(4.0));
    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn wide_fan_in_settles_with_single_worker() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let orchestrator = start(store.clone(), 1);

    let expr = (1..=40).map(|n| format!("({n}*1)")).collect::<Vec<_>>().join("+");
    let sub = submit(store.as_ref(), &orchestrator.injector(), &expr).await;
    let root = settle(store.as_ref(), &[sub.root]).await.remove(0);

    assert_eq!(root.result, Some((1..=40).sum::<i32>() as f64));
    assert!(
        store
            .list_all()
            .unwrap()
            .iter()
            .all(|op| op.state == OperationState::Done)
    );

    orchestrator.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_operation_and_its_dependent_follow_expected_transitions() {
    use OperationState::*;

    init_tracing();
    let store = Arc::new(RecordingStore::default());
    let c = OperationBuilder::new(Operator::Divide)
        .values(5.0, 0.0)
        .insert(store.as_ref());
    let d = OperationBuilder::new(Operator::Add)
        .left_after(c)
        .right(Operand::Value(3.0))
        .insert(store.as_ref());

    let orchestrator = start(store.clone(), 2);
    settle(store.as_ref(), &[c, d]).await;
    orchestrator.shutdown().await.unwrap();

    assert_eq!(store.history(c), vec![Created, Pending, Processing, Error]);

    let d_history = store.history(d);
    assert_eq!(d_history.first(), Some(&Created));
    assert_eq!(d_history.last(), Some(&Error));
    assert!(
        !d_history.contains(&Processing) && !d_history.contains(&Pending),
        "dependent of a failed operation was never runnable: {d_history:?}"
    );
}

#[tokio::test]
async fn single_dependency_moves_dependent_from_scheduled_to_done() {
    use OperationState::*;

    init_tracing();
    let store = Arc::new(RecordingStore::default());
    let orchestrator = start(store.clone(), 1);

    let sub = submit(store.as_ref(), &orchestrator.injector(), "2+2*2").await;
    let ops = settle(store.as_ref(), &sub.operations).await;
    orchestrator.shutdown().await.unwrap();

    assert_eq!(ops[1].result, Some(6.0));
    assert_eq!(store.history(sub.operations[0]), vec![Created, Pending, Processing, Done]);

    // The root is written once more by ingestion (expression text) while
    // still `Created`; consecutive duplicates are collapsed.
    let root = store.history(sub.root);
    assert_eq!(root.last(), Some(&Done));
    assert!(root.ends_with(&[Pending, Processing, Done]), "{root:?}");
    assert!(!root.contains(&Error));
}

#![allow(dead_code)]

use calcdag::store::{NewOperation, Operand, OperationStore};
use calcdag::types::{OperationId, OperationState, Operator};

/// Builder for hand-made operation records, e.g. to seed a store in a state
/// ingestion would never produce.
pub struct OperationBuilder {
    draft: NewOperation,
    state: OperationState,
    result: Option<f64>,
}

impl OperationBuilder {
    pub fn new(operator: Operator) -> Self {
        Self {
            draft: NewOperation::new(operator, Operand::Value(0.0), Operand::Value(0.0)),
            state: OperationState::Created,
            result: None,
        }
    }

    pub fn values(mut self, left: f64, right: f64) -> Self {
        self.draft.left = Operand::Value(left);
        self.draft.right = Operand::Value(right);
        self
    }

    pub fn left(mut self, operand: Operand) -> Self {
        self.draft.left = operand;
        self
    }

    pub fn right(mut self, operand: Operand) -> Self {
        self.draft.right = operand;
        self
    }

    pub fn left_after(self, dep: OperationId) -> Self {
        self.left(Operand::Awaiting(dep))
    }

    pub fn right_after(self, dep: OperationId) -> Self {
        self.right(Operand::Awaiting(dep))
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.draft = self.draft.owned_by(owner);
        self
    }

    pub fn state(mut self, state: OperationState) -> Self {
        self.state = state;
        self
    }

    /// Mark as `Done` with the given result.
    pub fn done(mut self, value: f64) -> Self {
        self.state = OperationState::Done;
        self.result = Some(value);
        self
    }

    /// Create the record, then force the requested state.
    pub fn insert(self, store: &dyn OperationStore) -> OperationId {
        let id = store.create(self.draft).expect("create operation");
        if self.state != OperationState::Created || self.result.is_some() {
            let mut op = store.get(id).expect("read back created operation");
            op.state = self.state;
            op.result = self.result;
            store.update(&op).expect("force operation state");
        }
        id
    }
}

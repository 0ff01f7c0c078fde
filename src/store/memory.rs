// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::trace;

use crate::errors::{CalcdagError, Result};
use crate::store::operation::{NewOperation, Operation};
use crate::store::{OperationStore, UpdateLock};
use crate::types::OperationId;

/// Operation store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<OperationId, Operation>>,
    update_lock: UpdateLock,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored operations.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<OperationId, Operation>>> {
        self.records
            .read()
            .map_err(|_| CalcdagError::StoreUnavailable("record lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<OperationId, Operation>>> {
        self.records
            .write()
            .map_err(|_| CalcdagError::StoreUnavailable("record lock poisoned".to_string()))
    }
}

impl OperationStore for InMemoryStore {
    fn create(&self, draft: NewOperation) -> Result<OperationId> {
        let mut records = self.write()?;

        // Start from len + 1 and step past anything already taken.
        let mut next = records.len() as u64 + 1;
        while records.contains_key(&OperationId::new(next)) {
            next += 1;
        }
        let id = OperationId::new(next);

        let op = draft.into_operation(id, Utc::now());
        trace!(operation = %id, "storing new operation");
        records.insert(id, op);

        Ok(id)
    }

    fn get(&self, id: OperationId) -> Result<Operation> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(CalcdagError::OperationNotFound(id))
    }

    fn update(&self, op: &Operation) -> Result<()> {
        let mut records = self.write()?;
        match records.get_mut(&op.id) {
            Some(slot) => {
                *slot = op.clone();
                Ok(())
            }
            None => Err(CalcdagError::OperationNotFound(op.id)),
        }
    }

    fn list_all(&self) -> Result<Vec<Operation>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn update_lock(&self) -> &UpdateLock {
        &self.update_lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Operand;
    use crate::types::{OperationState, Operator};

    fn literal(operator: Operator, left: f64, right: f64) -> NewOperation {
        NewOperation::new(operator, Operand::Value(left), Operand::Value(right))
    }

    #[test]
    fn create_assigns_increasing_ids_and_initial_state() {
        let store = InMemoryStore::new();
        let a = store.create(literal(Operator::Add, 1.0, 2.0)).unwrap();
        let b = store.create(literal(Operator::Multiply, 3.0, 4.0)).unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);

        let op = store.get(a).unwrap();
        assert_eq!(op.state, OperationState::Created);
        assert!(op.finished_at.is_none());
        assert!(op.result.is_none());
    }

    #[test]
    fn create_steps_past_colliding_ids() {
        let store = InMemoryStore::new();
        // Seed a record at id 2 directly so that `len + 1` collides.
        {
            let mut records = store.write().unwrap();
            let op = literal(Operator::Add, 0.0, 0.0).into_operation(OperationId::new(2), Utc::now());
            records.insert(op.id, op);
        }

        let id = store.create(literal(Operator::Add, 1.0, 1.0)).unwrap();
        assert_eq!(id.get(), 3);
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.get(OperationId::new(2)).unwrap().left, Operand::Value(0.0));
    }

    #[test]
    fn get_and_update_unknown_id_fail() {
        let store = InMemoryStore::new();
        let missing = OperationId::new(42);
        assert!(matches!(store.get(missing), Err(CalcdagError::OperationNotFound(id)) if id == missing));

        let op = literal(Operator::Add, 1.0, 1.0).into_operation(missing, Utc::now());
        assert!(matches!(store.update(&op), Err(CalcdagError::OperationNotFound(_))));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn update_of_fetched_record_is_a_no_op() {
        let store = InMemoryStore::new();
        let id = store
            .create(literal(Operator::Divide, 5.0, 2.0).owned_by("alice").with_expression("5/2"))
            .unwrap();
        let before = store.get(id).unwrap();
        store.update(&before).unwrap();
        assert_eq!(store.get(id).unwrap(), before);
    }

    #[test]
    fn list_all_is_ordered_by_id() {
        let store = InMemoryStore::new();
        for n in 0..5 {
            store.create(literal(Operator::Add, n as f64, 0.0)).unwrap();
        }
        let ids: Vec<u64> = store.list_all().unwrap().iter().map(|op| op.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }
}

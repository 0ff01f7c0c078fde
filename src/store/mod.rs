// src/store/mod.rs

//! Operation store contract.
//!
//! The orchestrator only talks to storage through [`OperationStore`]:
//! `create`, `get`, `update`, `list_all`, plus one store-wide update lock.
//! Every multi-step read-modify-write (resolver cascades, worker claims and
//! results, ingestion of an expression) holds that lock for its whole
//! sequence. The individual methods are atomic on their own but do not take
//! the update lock themselves.
//!
//! - [`operation`] defines the persisted record.
//! - [`memory`] is the in-process implementation used by the binary and tests.

use std::fmt::Debug;

use crate::errors::Result;
use crate::types::OperationId;

pub mod memory;
pub mod operation;

pub use memory::InMemoryStore;
pub use operation::{FailureReason, NewOperation, Operand, Operation};

/// Store-wide mutual exclusion for read-modify-write sequences.
pub type UpdateLock = tokio::sync::Mutex<()>;

/// Abstract keyed storage for operation records.
pub trait OperationStore: Send + Sync + Debug {
    /// Insert a new operation in state `Created` and return its fresh id.
    ///
    /// Never overwrites an existing id.
    fn create(&self, draft: NewOperation) -> Result<OperationId>;

    /// Fetch an operation by id.
    ///
    /// Fails with `OperationNotFound` if the id is unknown.
    fn get(&self, id: OperationId) -> Result<Operation>;

    /// Replace the stored record with the same id.
    ///
    /// Fails with `OperationNotFound` if the id is unknown.
    fn update(&self, op: &Operation) -> Result<()>;

    /// Snapshot of every stored operation, ordered by id.
    fn list_all(&self) -> Result<Vec<Operation>>;

    /// The store-wide update lock.
    fn update_lock(&self) -> &UpdateLock;
}

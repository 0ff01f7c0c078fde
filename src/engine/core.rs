// src/engine/core.rs

//! Synchronous resolver state machine.
//!
//! [`ResolverCore`] consumes one [`ResolverEvent`] at a time and returns the
//! commands the async shell (`engine::runtime::Runtime`) should carry out:
//! dispatching ready operations to workers and re-activating dependents.
//!
//! The core has no channels and never awaits. The shell calls
//! [`ResolverCore::step`] while holding the store's update lock and executes
//! the returned commands after releasing it, so a cascade never blocks on
//! the resolver's own input.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::engine::ResolverEvent;
use crate::engine::event_handlers::{
    CoreCommand, CoreStep, Readiness, cascade_failure, cascade_result, handle_pending,
    handle_unresolved,
};
use crate::errors::Result;
use crate::store::OperationStore;
use crate::types::{OperationId, OperationState};

/// Resolver state: the store plus the ids currently handed to workers.
pub struct ResolverCore {
    store: Arc<dyn OperationStore>,
    dispatched: HashSet<OperationId>,
}

impl fmt::Debug for ResolverCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverCore")
            .field("dispatched", &self.dispatched)
            .finish_non_exhaustive()
    }
}

impl ResolverCore {
    pub fn new(store: Arc<dyn OperationStore>) -> Self {
        Self {
            store,
            dispatched: HashSet::new(),
        }
    }

    /// Number of operations dispatched and not yet reported back by a worker.
    pub fn in_flight(&self) -> usize {
        self.dispatched.len()
    }

    pub fn is_dispatched(&self, id: OperationId) -> bool {
        self.dispatched.contains(&id)
    }

    /// Forget a dispatch the shell never delivered to a worker. The record
    /// stays `Pending` in the store for the next startup sweep.
    pub fn withdraw(&mut self, id: OperationId) -> bool {
        self.dispatched.remove(&id)
    }

    /// Handle a single event.
    ///
    /// Must be called with the store's update lock held.
    pub fn step(&mut self, event: ResolverEvent) -> Result<CoreStep> {
        let id = event.operation();

        match event {
            ResolverEvent::Released(_) => {
                self.dispatched.remove(&id);
                debug!(operation = %id, "worker released unit");
                return Ok(CoreStep::idle());
            }
            ResolverEvent::Completed(_) => {
                self.dispatched.remove(&id);
            }
            _ => {}
        }

        let store = self.store.as_ref();
        let op = store.get(id)?;

        let commands = match op.state {
            OperationState::Created | OperationState::Scheduled => {
                match handle_unresolved(store, op)? {
                    Readiness::Ready => handle_pending(&mut self.dispatched, id),
                    Readiness::Waiting => Vec::new(),
                    // Re-enter as `Error` so the failure reaches this
                    // operation's own dependents.
                    Readiness::Failed => vec![CoreCommand::Reactivate(id)],
                }
            }
            OperationState::Pending => handle_pending(&mut self.dispatched, id),
            OperationState::Processing => {
                debug!(operation = %id, "already processing; ignoring signal");
                Vec::new()
            }
            OperationState::Done => cascade_result(store, &op)?,
            OperationState::Error => cascade_failure(store, &op)?,
        };

        Ok(CoreStep { commands })
    }
}

// src/engine/mod.rs

//! Orchestration engine for calcdag.
//!
//! This module ties together:
//! - the dependency resolver, the single control loop that owns every
//!   operation state transition
//! - the worker pool it dispatches ready operations to
//! - the discovery poller feeding it newly created operations
//!
//! The synchronous state machine lives in [`core`] (with the per-state
//! logic in [`event_handlers`]); the async shell reading channels is
//! [`runtime`]; [`orchestrator`] spawns and shuts down the whole set.

use std::time::Duration;

use crate::types::OperationId;

/// Events flowing into the resolver.
///
/// Every event names one operation; the resolver's reaction depends on the
/// operation's stored state, not on the event kind. The kind is kept for
/// logging and for the resolver's in-flight bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverEvent {
    /// Found by the discovery poller.
    Discovered(OperationId),
    /// Signalled directly by ingestion right after creation.
    Submitted(OperationId),
    /// A worker recorded a result or a failure for this operation.
    Completed(OperationId),
    /// A worker gave the unit back without touching it (stale or missing).
    Released(OperationId),
    /// A dependent re-examined after a cascade.
    Reactivated(OperationId),
}

impl ResolverEvent {
    pub fn operation(&self) -> OperationId {
        match *self {
            ResolverEvent::Discovered(id)
            | ResolverEvent::Submitted(id)
            | ResolverEvent::Completed(id)
            | ResolverEvent::Released(id)
            | ResolverEvent::Reactivated(id) => id,
        }
    }
}

/// Plain-value settings consumed by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Number of concurrent workers (at least 1).
    pub worker_count: usize,
    /// Simulated cost of every calculation.
    pub operation_duration: Duration,
    /// Interval of the discovery poller.
    pub poll_interval: Duration,
    /// Capacity of the resolver input and worker input channels.
    pub queue_capacity: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            worker_count: 4,
            operation_duration: Duration::from_secs(1),
            poll_interval: Duration::from_secs(5),
            queue_capacity: 64,
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod orchestrator;
pub mod runtime;
pub mod settle;

pub use core::ResolverCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use orchestrator::{Injector, Orchestrator};
pub use runtime::Runtime;
pub use settle::wait_for_terminal;

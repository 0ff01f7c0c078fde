// src/exec/executor_loop.rs

//! Worker pool loops that pull operation ids and run them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::ResolverEvent;
use crate::errors::{CalcdagError, Result};
use crate::exec::task_runner::{UnitOutcome, run_unit};
use crate::store::OperationStore;
use crate::types::OperationId;

/// Worker pool sizing and the simulated cost of each calculation.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub count: usize,
    pub operation_duration: Duration,
}

/// Shared state every worker loop needs.
#[derive(Debug, Clone)]
pub(crate) struct WorkerContext {
    pub store: Arc<dyn OperationStore>,
    pub report_tx: mpsc::Sender<ResolverEvent>,
    pub shutdown: CancellationToken,
    pub operation_duration: Duration,
}

/// Handles of the spawned worker tasks.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<Result<()>>>,
}

impl WorkerPool {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit; returns the first error.
    ///
    /// Workers exit once the worker input channel is closed and drained.
    pub async fn join(self) -> Result<()> {
        let mut first_err = None;

        for (worker, handle) in self.handles.into_iter().enumerate() {
            let res = match handle.await {
                Ok(res) => res,
                Err(err) => Err(CalcdagError::Other(anyhow!("worker {worker} failed: {err}"))),
            };
            if let Err(err) = res {
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Spawn `settings.count` workers sharing one input channel.
///
/// Every unit taken from `worker_rx` is reported back on `report_tx`, either
/// as `Completed` (a result or failure was recorded) or `Released` (the unit
/// was dropped), so the resolver's in-flight count stays exact.
pub fn spawn_workers(
    settings: WorkerSettings,
    store: Arc<dyn OperationStore>,
    worker_rx: mpsc::Receiver<OperationId>,
    report_tx: mpsc::Sender<ResolverEvent>,
    shutdown: CancellationToken,
) -> WorkerPool {
    let worker_rx = Arc::new(Mutex::new(worker_rx));
    let ctx = WorkerContext {
        store,
        report_tx,
        shutdown,
        operation_duration: settings.operation_duration,
    };

    let handles = (0..settings.count)
        .map(|worker| {
            let ctx = ctx.clone();
            let rx = Arc::clone(&worker_rx);
            tokio::spawn(async move { run_worker(worker, ctx, rx).await })
        })
        .collect();

    WorkerPool { handles }
}

async fn run_worker(
    worker: usize,
    ctx: WorkerContext,
    worker_rx: Arc<Mutex<mpsc::Receiver<OperationId>>>,
) -> Result<()> {
    debug!(worker, "worker started");

    loop {
        let next = {
            let mut rx = worker_rx.lock().await;
            rx.recv().await
        };
        let Some(id) = next else {
            break;
        };

        let report = match run_unit(worker, &ctx, id).await {
            Ok(UnitOutcome::Recorded) => ResolverEvent::Completed(id),
            Ok(UnitOutcome::Stale) => ResolverEvent::Released(id),
            Err(err) if !err.is_fatal() => {
                warn!(worker, operation = %id, error = %err, "dropping unit");
                ResolverEvent::Released(id)
            }
            Err(err) => {
                error!(worker, operation = %id, error = %err, "fatal store error; shutting down");
                ctx.shutdown.cancel();
                if ctx.report_tx.send(ResolverEvent::Released(id)).await.is_ok() {
                    release_remaining(worker, &ctx, &worker_rx).await;
                }
                return Err(err);
            }
        };

        if ctx.report_tx.send(report).await.is_err() {
            debug!(worker, "resolver input closed; worker exiting");
            break;
        }
    }

    info!(worker, "worker finished (input closed)");
    Ok(())
}

/// Hand back every unit still queued for the pool without touching the
/// store, until the resolver closes the worker input. Every dispatched id
/// must be reported for the resolver's in-flight count to reach zero.
async fn release_remaining(
    worker: usize,
    ctx: &WorkerContext,
    worker_rx: &Mutex<mpsc::Receiver<OperationId>>,
) {
    let mut released = 0usize;
    loop {
        let next = {
            let mut rx = worker_rx.lock().await;
            rx.recv().await
        };
        let Some(id) = next else {
            break;
        };
        if ctx.report_tx.send(ResolverEvent::Released(id)).await.is_err() {
            break;
        }
        released += 1;
    }
    debug!(worker, released, "released queued units after fatal error");
}

// src/engine/orchestrator.rs

//! Spawning and ordered shutdown of the resolver, worker pool and poller.

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::discovery::spawn_poller;
use crate::errors::{CalcdagError, Result};
use crate::exec::{WorkerPool, WorkerSettings, spawn_workers};
use crate::store::OperationStore;
use crate::types::OperationId;

use super::runtime::Runtime;
use super::{OrchestratorOptions, ResolverEvent};

/// Cloneable handle used by ingestion to signal new operations directly.
#[derive(Debug, Clone)]
pub struct Injector {
    tx: mpsc::Sender<ResolverEvent>,
}

impl Injector {
    pub fn new(tx: mpsc::Sender<ResolverEvent>) -> Self {
        Self { tx }
    }

    /// Signal one freshly created operation.
    pub async fn submit(&self, id: OperationId) -> Result<()> {
        self.tx
            .send(ResolverEvent::Submitted(id))
            .await
            .map_err(|_| CalcdagError::ChannelClosed("resolver input"))
    }

    /// Signal several operations, in order.
    pub async fn submit_all(&self, ids: &[OperationId]) -> Result<()> {
        for id in ids {
            self.submit(*id).await?;
        }
        Ok(())
    }
}

/// A running orchestrator: resolver loop, worker pool and discovery poller.
pub struct Orchestrator {
    injector: Injector,
    shutdown: CancellationToken,
    resolver: JoinHandle<Result<()>>,
    workers: WorkerPool,
    poller: JoinHandle<Result<()>>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("workers", &self.workers.len())
            .field("shutdown_requested", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Spawn every component on the current Tokio runtime.
    pub fn start(store: Arc<dyn OperationStore>, options: OrchestratorOptions) -> Self {
        let capacity = options.queue_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<ResolverEvent>(capacity);
        let (worker_tx, worker_rx) = mpsc::channel::<OperationId>(capacity);
        let shutdown = CancellationToken::new();

        let workers = spawn_workers(
            WorkerSettings {
                count: options.worker_count.max(1),
                operation_duration: options.operation_duration,
            },
            store.clone(),
            worker_rx,
            event_tx.clone(),
            shutdown.clone(),
        );

        let runtime = Runtime::new(store.clone(), event_rx, worker_tx, shutdown.clone());
        let resolver = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let res = runtime.run().await;
                if let Err(ref err) = res {
                    error!(error = %err, "resolver stopped on error; shutting down");
                    shutdown.cancel();
                }
                res
            })
        };

        let poller = spawn_poller(
            store,
            options.poll_interval,
            event_tx.clone(),
            shutdown.clone(),
        );

        info!(
            workers = options.worker_count,
            operation_duration = ?options.operation_duration,
            poll_interval = ?options.poll_interval,
            "orchestrator started"
        );

        Self {
            injector: Injector::new(event_tx),
            shutdown,
            resolver,
            workers,
            poller,
        }
    }

    pub fn injector(&self) -> Injector {
        self.injector.clone()
    }

    /// Token that starts the shutdown sequence when cancelled.
    ///
    /// Components also cancel it themselves on a fatal store error.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop discovery, let in-flight calculations finish, then close the
    /// worker input and the resolver input, in that order.
    ///
    /// Returns the first fatal error any component hit.
    pub async fn shutdown(self) -> Result<()> {
        info!("orchestrator shutting down");
        self.shutdown.cancel();

        let poller = join("discovery poller", self.poller).await;
        let resolver = join("resolver", self.resolver).await;
        let workers = self.workers.join().await;

        debug!("all orchestrator tasks joined");
        resolver.and(workers).and(poller)
    }
}

async fn join(name: &str, handle: JoinHandle<Result<()>>) -> Result<()> {
    match handle.await {
        Ok(res) => res,
        Err(err) => Err(CalcdagError::Other(anyhow!("{name} task failed: {err}"))),
    }
}

// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{CalcdagError, Result};
use crate::store::OperationStore;
use crate::types::OperationId;

use super::core::ResolverCore;
use super::{CoreCommand, ResolverEvent};

/// Drives the resolver core in response to `ResolverEvent`s and feeds ready
/// operations to the worker pool.
///
/// This is the async IO shell around [`ResolverCore`]. It owns two local
/// queues:
/// - `reactivated`: dependents produced by a cascade, handled before the
///   next channel event. Keeping them local means the resolver never sends
///   into its own bounded input.
/// - `ready`: operations waiting for room in the worker input channel. The
///   resolver keeps receiving events while workers are saturated.
pub struct Runtime {
    core: ResolverCore,
    store: Arc<dyn OperationStore>,
    event_rx: mpsc::Receiver<ResolverEvent>,
    worker_tx: mpsc::Sender<OperationId>,
    shutdown: CancellationToken,
    reactivated: VecDeque<OperationId>,
    ready: VecDeque<OperationId>,
    draining: bool,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("reactivated", &self.reactivated)
            .field("ready", &self.ready)
            .field("draining", &self.draining)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        store: Arc<dyn OperationStore>,
        event_rx: mpsc::Receiver<ResolverEvent>,
        worker_tx: mpsc::Sender<OperationId>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            core: ResolverCore::new(store.clone()),
            store,
            event_rx,
            worker_tx,
            shutdown,
            reactivated: VecDeque::new(),
            ready: VecDeque::new(),
            draining: false,
        }
    }

    /// Main event loop.
    ///
    /// - Drains local re-activations first.
    /// - Otherwise waits for a channel event or for room in the worker
    ///   input, whichever comes first.
    /// - On shutdown, stops dispatching, keeps handling events until every
    ///   dispatched operation has been reported back, then closes the
    ///   worker input followed by its own input.
    pub async fn run(mut self) -> Result<()> {
        info!("resolver started");
        let worker_tx = self.worker_tx.clone();

        loop {
            if let Some(id) = self.reactivated.pop_front() {
                self.handle(ResolverEvent::Reactivated(id)).await?;
                continue;
            }

            if self.draining && self.core.in_flight() == 0 {
                info!("no operations in flight; resolver stopping");
                break;
            }

            let can_dispatch = !self.draining && !self.ready.is_empty();

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled(), if !self.draining => {
                    self.start_draining();
                }

                permit = worker_tx.reserve(), if can_dispatch => {
                    let permit = permit.map_err(|_| CalcdagError::ChannelClosed("worker input"))?;
                    if let Some(id) = self.ready.pop_front() {
                        debug!(operation = %id, "sent to worker input");
                        permit.send(id);
                    }
                }

                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.handle(event).await?,
                        None => {
                            info!("resolver input closed; exiting");
                            break;
                        }
                    }
                }
            }
        }

        // Worker input first, then our own input.
        drop(worker_tx);
        let Runtime {
            worker_tx, event_rx, ..
        } = self;
        drop(worker_tx);
        drop(event_rx);

        info!("resolver exiting");
        Ok(())
    }

    /// Stop dispatching. Undelivered ready operations are withdrawn so only
    /// units actually held by workers keep the drain open.
    fn start_draining(&mut self) {
        self.draining = true;
        let undispatched = self.ready.len();
        for id in self.ready.drain(..) {
            self.core.withdraw(id);
        }
        info!(
            in_flight = self.core.in_flight(),
            undispatched,
            "shutdown requested; draining in-flight operations"
        );
    }

    /// Run one event through the core under the update lock, then execute
    /// the resulting commands with the lock released.
    async fn handle(&mut self, event: ResolverEvent) -> Result<()> {
        debug!(?event, "resolver received event");

        let step = {
            let _guard = self.store.update_lock().lock().await;
            self.core.step(event)
        };

        let step = match step {
            Ok(step) => step,
            Err(CalcdagError::OperationNotFound(id)) => {
                warn!(operation = %id, ?event, "operation not found; dropping event");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        for command in step.commands {
            match command {
                CoreCommand::Dispatch(id) if self.draining => {
                    self.core.withdraw(id);
                    debug!(operation = %id, "draining; left pending for the next start");
                }
                CoreCommand::Dispatch(id) => self.ready.push_back(id),
                CoreCommand::Reactivate(id) => self.reactivated.push_back(id),
            }
        }

        Ok(())
    }
}

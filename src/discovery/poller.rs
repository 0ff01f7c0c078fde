// src/discovery/poller.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::engine::ResolverEvent;
use crate::errors::Result;
use crate::store::{Operation, OperationStore};
use crate::types::OperationState;

/// Which operations a sweep picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// First pass at startup: `Created` plus `Pending` work left unclaimed.
    Startup,
    /// Interval pass: `Created` only.
    Periodic,
}

impl Sweep {
    pub fn selects(self, op: &Operation) -> bool {
        match self {
            Sweep::Startup => matches!(
                op.state,
                OperationState::Created | OperationState::Pending
            ),
            Sweep::Periodic => op.state == OperationState::Created,
        }
    }
}

/// Spawn the discovery poller.
///
/// It sweeps once immediately, then every `interval`, until `shutdown` is
/// cancelled. A store failure is fatal: the poller cancels `shutdown` and
/// returns the error.
pub fn spawn_poller(
    store: Arc<dyn OperationStore>,
    interval: Duration,
    resolver_tx: mpsc::Sender<ResolverEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        let res = run_poller(store, interval, resolver_tx, shutdown.clone()).await;
        if let Err(err) = &res {
            error!(error = %err, "discovery poller failed; shutting down");
            shutdown.cancel();
        }
        res
    })
}

async fn run_poller(
    store: Arc<dyn OperationStore>,
    interval: Duration,
    resolver_tx: mpsc::Sender<ResolverEvent>,
    shutdown: CancellationToken,
) -> Result<()> {
    info!(?interval, "discovery poller started");

    if !sweep(store.as_ref(), Sweep::Startup, &resolver_tx, &shutdown).await? {
        return Ok(());
    }

    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the startup sweep covered it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if !sweep(store.as_ref(), Sweep::Periodic, &resolver_tx, &shutdown).await? {
                    break;
                }
            }
        }
    }

    info!("discovery poller stopped");
    Ok(())
}

/// Emit every selected operation to the resolver.
///
/// Returns `Ok(false)` when the poller should stop (shutdown or resolver
/// gone).
pub async fn sweep(
    store: &dyn OperationStore,
    kind: Sweep,
    resolver_tx: &mpsc::Sender<ResolverEvent>,
    shutdown: &CancellationToken,
) -> Result<bool> {
    let found: Vec<_> = store
        .list_all()?
        .into_iter()
        .filter(|op| kind.selects(op))
        .map(|op| op.id)
        .collect();

    if !found.is_empty() {
        debug!(?kind, count = found.len(), "discovered operations");
    }

    for id in found {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(false),
            sent = resolver_tx.send(ResolverEvent::Discovered(id)) => {
                if sent.is_err() {
                    debug!("resolver input closed; poller stopping");
                    return Ok(false);
                }
                debug!(operation = %id, "sent discovered operation to resolver");
            }
        }
    }

    Ok(true)
}

// src/engine/settle.rs

use std::time::Duration;

use tracing::trace;

use crate::errors::Result;
use crate::store::{Operation, OperationStore};
use crate::types::OperationId;

/// Wait until every operation in `ids` is `Done` or `Error`, checking the
/// store every `every`. Returns the terminal records in `ids` order.
///
/// There is no built-in deadline; wrap in `tokio::time::timeout` if needed.
pub async fn wait_for_terminal(
    store: &dyn OperationStore,
    ids: &[OperationId],
    every: Duration,
) -> Result<Vec<Operation>> {
    loop {
        let ops = ids
            .iter()
            .map(|id| store.get(*id))
            .collect::<Result<Vec<_>>>()?;

        let open = ops.iter().filter(|op| !op.state.is_terminal()).count();
        if open == 0 {
            return Ok(ops);
        }

        trace!(open, "waiting for operations to settle");
        tokio::time::sleep(every).await;
    }
}

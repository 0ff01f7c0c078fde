// src/status.rs

//! Human-readable status of stored operations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::Operation;
use crate::types::{OperationId, OperationState};

/// Short status line for an operation.
pub fn describe(op: &Operation) -> String {
    match op.state {
        OperationState::Created => "just created".to_string(),
        OperationState::Scheduled => "waiting for other operation".to_string(),
        OperationState::Pending => "in queue for calculation".to_string(),
        OperationState::Processing => "calculating".to_string(),
        OperationState::Done => "done".to_string(),
        OperationState::Error => match &op.failure {
            Some(reason) => format!("error: {reason}"),
            None => "error: unknown".to_string(),
        },
    }
}

/// Serializable snapshot of one operation for CLI output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationReport {
    pub id: OperationId,
    /// `"expression"` for the root of a submitted expression, else `"operation"`.
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub state: OperationState,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    /// Failed sub-operations, nearest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_chain: Vec<OperationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Operation> for OperationReport {
    fn from(op: &Operation) -> Self {
        Self {
            id: op.id,
            kind: if op.expression.is_some() {
                "expression"
            } else {
                "operation"
            },
            expression: op.expression.clone(),
            state: op.state,
            status: describe(op),
            result: op.result,
            failed_chain: op
                .failure
                .as_ref()
                .map(|reason| reason.chain())
                .unwrap_or_default(),
            owner: op.owner.clone(),
            created_at: op.created_at,
            finished_at: op.finished_at,
        }
    }
}

impl OperationReport {
    /// One line of plain-text output.
    pub fn to_line(&self) -> String {
        let subject = self
            .expression
            .as_deref()
            .map(str::to_string)
            .unwrap_or_else(|| format!("operation {}", self.id));
        match self.result {
            Some(value) if self.state == OperationState::Done => {
                format!("{subject} = {value}")
            }
            _ => format!("{subject}: {}", self.status),
        }
    }
}

// src/store/operation.rs

//! Operation records as persisted by an [`OperationStore`](super::OperationStore).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calc::CalcError;
use crate::types::{OperationId, OperationState, Operator};

/// One side of a binary operation.
///
/// A side is either a literal value or waits on the result of an earlier
/// operation. When that dependency finishes the resolver replaces
/// `Awaiting` with `Value`, so the two representations never coexist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Operand {
    Value(f64),
    Awaiting(OperationId),
    /// Dependency cleared by a failure cascade; no value will ever arrive.
    Abandoned,
}

impl Operand {
    pub fn value(&self) -> Option<f64> {
        match self {
            Operand::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn awaiting(&self) -> Option<OperationId> {
        match self {
            Operand::Awaiting(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{v}"),
            Operand::Awaiting(id) => write!(f, "#{id}"),
            Operand::Abandoned => f.write_str("_"),
        }
    }
}

/// Why an operation ended in [`OperationState::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The calculation engine rejected the operands.
    Calculation(CalcError),
    /// A sub-operation failed; `cause` is that sub-operation's own reason.
    Dependency {
        operation: OperationId,
        cause: Box<FailureReason>,
    },
    Internal(String),
}

impl FailureReason {
    pub fn dependency(operation: OperationId, cause: FailureReason) -> Self {
        FailureReason::Dependency {
            operation,
            cause: Box::new(cause),
        }
    }

    /// Ids of failed sub-operations, nearest first.
    pub fn chain(&self) -> Vec<OperationId> {
        let mut ids = Vec::new();
        let mut current = self;
        while let FailureReason::Dependency { operation, cause } = current {
            ids.push(*operation);
            current = cause;
        }
        ids
    }

    /// The reason at the bottom of the chain.
    pub fn root_cause(&self) -> &FailureReason {
        match self {
            FailureReason::Dependency { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Calculation(err) => write!(f, "calculate failed: {err}"),
            FailureReason::Dependency { operation, cause } => {
                write!(f, "sub-operation {operation} failed: {cause}")
            }
            FailureReason::Internal(msg) => f.write_str(msg),
        }
    }
}

/// A stored binary operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub operator: Operator,
    pub state: OperationState,
    pub left: Operand,
    pub right: Operand,
    /// Set only when `state == Done`.
    pub result: Option<f64>,
    /// Set only when `state == Error`.
    pub failure: Option<FailureReason>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Opaque owner tag, never interpreted by the orchestrator.
    pub owner: Option<String>,
    /// Source expression, usually only set on the root of a submission.
    pub expression: Option<String>,
}

impl Operation {
    /// Sub-operations this operation still waits on.
    pub fn dependencies(&self) -> impl Iterator<Item = OperationId> + '_ {
        [self.left.awaiting(), self.right.awaiting()]
            .into_iter()
            .flatten()
    }

    pub fn has_dependencies(&self) -> bool {
        self.dependencies().next().is_some()
    }

    pub fn depends_on(&self, id: OperationId) -> bool {
        self.dependencies().any(|dep| dep == id)
    }

    /// Both operand values, if neither side is still waiting.
    pub fn operands(&self) -> Option<(f64, f64)> {
        Some((self.left.value()?, self.right.value()?))
    }

    /// Fill every side waiting on `dependency` with `value`.
    ///
    /// Returns whether anything changed; a second call for the same
    /// dependency is a no-op.
    pub fn resolve_dependency(&mut self, dependency: OperationId, value: f64) -> bool {
        let mut changed = false;
        for side in [&mut self.left, &mut self.right] {
            if side.awaiting() == Some(dependency) {
                *side = Operand::Value(value);
                changed = true;
            }
        }
        changed
    }

    /// Record a successful result.
    pub fn complete(&mut self, value: f64, at: DateTime<Utc>) {
        self.state = OperationState::Done;
        self.result = Some(value);
        self.failure = None;
        self.finished_at = Some(at);
    }

    /// Move to `Error`, clearing both dependencies so later signals from the
    /// other side find nothing to update.
    pub fn fail(&mut self, reason: FailureReason, at: DateTime<Utc>) {
        self.state = OperationState::Error;
        self.result = None;
        self.failure = Some(reason);
        self.finished_at = Some(at);
        for side in [&mut self.left, &mut self.right] {
            if side.awaiting().is_some() {
                *side = Operand::Abandoned;
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {} [{}]",
            self.id, self.left, self.operator, self.right, self.state
        )
    }
}

/// Operation draft handed to [`OperationStore::create`](super::OperationStore::create).
///
/// The store assigns the id, the creation time and the initial state.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub operator: Operator,
    pub left: Operand,
    pub right: Operand,
    pub owner: Option<String>,
    pub expression: Option<String>,
}

impl NewOperation {
    pub fn new(operator: Operator, left: Operand, right: Operand) -> Self {
        Self {
            operator,
            left,
            right,
            owner: None,
            expression: None,
        }
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub(crate) fn into_operation(self, id: OperationId, created_at: DateTime<Utc>) -> Operation {
        Operation {
            id,
            operator: self.operator,
            state: OperationState::Created,
            left: self.left,
            right: self.right,
            result: None,
            failure: None,
            created_at,
            finished_at: None,
            owner: self.owner,
            expression: self.expression,
        }
    }
}

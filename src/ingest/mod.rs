// src/ingest/mod.rs

//! Turning expression strings into stored operations.
//!
//! - [`lexer`] splits the source into tokens.
//! - [`parser`] builds an [`Expr`] tree with the usual precedence.
//! - [`ledger`] remembers idempotency tokens.
//!
//! [`submit_expression`] stores one operation per binary node, children
//! before parents, so every dependency names an operation created earlier.

use tracing::{debug, info};

use crate::errors::{CalcdagError, Result};
use crate::store::{NewOperation, Operand, OperationStore};
use crate::types::OperationId;

pub mod ledger;
pub mod lexer;
pub mod parser;

pub use ledger::SubmissionLedger;
pub use parser::{Expr, parse_expression};

/// Input of [`submit_expression`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitRequest<'a> {
    pub expression: &'a str,
    pub owner: Option<&'a str>,
    pub idempotency_token: Option<&'a str>,
}

impl<'a> SubmitRequest<'a> {
    pub fn new(expression: &'a str) -> Self {
        Self {
            expression,
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, owner: &'a str) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_token(mut self, token: &'a str) -> Self {
        self.idempotency_token = Some(token);
        self
    }
}

/// Operations created for one expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// The operation whose result is the value of the whole expression.
    pub root: OperationId,
    /// Every created id, leaves first; `root` is last.
    pub operations: Vec<OperationId>,
}

/// Parse `request.expression` and store its operations.
///
/// Creation happens under the store's update lock, so the resolver never
/// observes a half-built graph. A repeated idempotency token returns the
/// first submission without creating anything.
pub async fn submit_expression(
    store: &dyn OperationStore,
    ledger: &SubmissionLedger,
    request: SubmitRequest<'_>,
) -> Result<Submission> {
    let expr = parse_expression(request.expression)?;
    if expr.operation_count() == 0 {
        return Err(CalcdagError::ParseError(
            "the expression does not contain any operations".to_string(),
        ));
    }

    let _guard = store.update_lock().lock().await;

    if let Some(token) = request.idempotency_token {
        if let Some(existing) = ledger.lookup(token)? {
            info!(token, root = %existing.root, "idempotency token already used; returning earlier submission");
            return Ok(existing);
        }
    }

    let mut operations = Vec::with_capacity(expr.operation_count());
    store_node(store, &expr, request.owner, &mut operations)?;

    let root = *operations.last().ok_or_else(|| {
        CalcdagError::ParseError("the expression does not contain any operations".to_string())
    })?;

    let mut root_op = store.get(root)?;
    root_op.expression = Some(request.expression.trim().to_string());
    store.update(&root_op)?;

    let submission = Submission { root, operations };
    if let Some(token) = request.idempotency_token {
        ledger.record(token, &submission)?;
    }

    info!(
        root = %root,
        operations = submission.operations.len(),
        expression = request.expression,
        "expression stored"
    );
    Ok(submission)
}

fn store_node(
    store: &dyn OperationStore,
    expr: &Expr,
    owner: Option<&str>,
    created: &mut Vec<OperationId>,
) -> Result<Operand> {
    match expr {
        Expr::Literal(value) => Ok(Operand::Value(*value)),
        Expr::Binary {
            operator,
            left,
            right,
        } => {
            let left = store_node(store, left, owner, created)?;
            let right = store_node(store, right, owner, created)?;

            let mut draft = NewOperation::new(*operator, left, right);
            if let Some(owner) = owner {
                draft = draft.owned_by(owner);
            }

            let id = store.create(draft)?;
            debug!(operation = %id, %operator, %left, %right, "operation stored");
            created.push(id);
            Ok(Operand::Awaiting(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{OperationState, Operator};

    #[tokio::test]
    async fn splits_expression_into_dependent_operations() {
        let store = InMemoryStore::new();
        let ledger = SubmissionLedger::new();

        let sub = submit_expression(&store, &ledger, SubmitRequest::new("2+2*2").owned_by("u1"))
            .await
            .unwrap();

        assert_eq!(sub.operations.len(), 2);
        let a = store.get(sub.operations[0]).unwrap();
        let b = store.get(sub.root).unwrap();

        assert_eq!(a.operator, Operator::Multiply);
        assert_eq!((a.left, a.right), (Operand::Value(2.0), Operand::Value(2.0)));
        assert_eq!(b.operator, Operator::Add);
        assert_eq!((b.left, b.right), (Operand::Value(2.0), Operand::Awaiting(a.id)));
        assert_eq!(b.expression.as_deref(), Some("2+2*2"));
        assert!(a.expression.is_none());
        assert_eq!(a.owner.as_deref(), Some("u1"));
        assert_eq!(b.state, OperationState::Created);
    }

    #[tokio::test]
    async fn dependencies_always_point_to_earlier_operations() {
        let store = InMemoryStore::new();
        let ledger = SubmissionLedger::new();

        submit_expression(&store, &ledger, SubmitRequest::new("(1+2)*(3-4)/(5+6*7)"))
            .await
            .unwrap();

        for op in store.list_all().unwrap() {
            for dep in op.dependencies() {
                assert!(dep < op.id, "{dep} is not older than {}", op.id);
            }
        }
    }

    #[tokio::test]
    async fn repeated_token_returns_first_submission() {
        let store = InMemoryStore::new();
        let ledger = SubmissionLedger::new();
        let request = SubmitRequest::new("1+1").with_token("tok-1");

        let first = submit_expression(&store, &ledger, request).await.unwrap();
        let second = submit_expression(&store, &ledger, request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn bare_number_is_rejected_without_storing_anything() {
        let store = InMemoryStore::new();
        let ledger = SubmissionLedger::new();

        let err = submit_expression(&store, &ledger, SubmitRequest::new("(42)"))
            .await
            .unwrap_err();

        assert!(matches!(err, CalcdagError::ParseError(msg) if msg.contains("does not contain any operations")));
        assert!(store.is_empty().unwrap());
    }
}

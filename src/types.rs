// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calc::CalcError;

/// Identifier of a stored operation.
///
/// Ids are assigned by the store on creation, start at 1 and are never
/// reused. There is no "zero" id: an operand that does not depend on another
/// operation is simply not `Operand::Awaiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(u64);

impl OperationId {
    pub fn new(raw: u64) -> Self {
        OperationId(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary arithmetic operator of a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            other => Err(CalcError::UnknownOperator(other.to_string())),
        }
    }
}

/// Lifecycle state of an operation.
///
/// - `Created`: stored by ingestion, not yet seen by the resolver.
/// - `Scheduled`: waiting for one or two sub-operations.
/// - `Pending`: ready to run, handed to (or waiting for) a worker.
/// - `Processing`: claimed by a worker.
/// - `Done` / `Error`: terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    Created,
    Scheduled,
    Pending,
    Processing,
    Done,
    Error,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationState::Done | OperationState::Error)
    }
}

impl Default for OperationState {
    fn default() -> Self {
        OperationState::Created
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationState::Created => "created",
            OperationState::Scheduled => "scheduled",
            OperationState::Pending => "pending",
            OperationState::Processing => "processing",
            OperationState::Done => "done",
            OperationState::Error => "error",
        };
        f.write_str(s)
    }
}

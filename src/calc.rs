// src/calc.rs

//! Calculation engine.
//!
//! Applies a single binary operator after a simulated compute delay. It has
//! no access to the store; the delay is a parameter so tests can pass
//! `Duration::ZERO`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Operator;

/// Domain error produced by a calculation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("result of {0} is not a finite number")]
    NonFinite(String),
}

/// Wait for `duration`, then apply `operator` to the operands.
pub async fn calculate(
    operator: Operator,
    left: f64,
    right: f64,
    duration: Duration,
) -> Result<f64, CalcError> {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
    apply(operator, left, right)
}

/// Same as [`calculate`] but takes the operator as its textual symbol.
pub async fn calculate_symbol(
    symbol: &str,
    left: f64,
    right: f64,
    duration: Duration,
) -> Result<f64, CalcError> {
    let operator: Operator = symbol.parse()?;
    calculate(operator, left, right, duration).await
}

/// Apply an operator without any delay.
pub fn apply(operator: Operator, left: f64, right: f64) -> Result<f64, CalcError> {
    let value = match operator {
        Operator::Add => left + right,
        Operator::Subtract => left - right,
        Operator::Multiply => left * right,
        Operator::Divide => {
            if right == 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            left / right
        }
    };

    if !value.is_finite() {
        return Err(CalcError::NonFinite(format!("{left} {operator} {right}")));
    }

    Ok(value)
}

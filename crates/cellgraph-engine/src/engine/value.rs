//! Evaluated cell values.
//!
//! A [`Value`] is what a cell reads as: a number, text, or a [`FormulaError`].
//! Formula errors are ordinary data here. They are cached and flow into
//! dependent formulas like any other value.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::format::format_number;

/// Category of a value-level formula failure.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum FormulaErrorKind {
    /// Reference to a position outside the grid.
    Ref,
    /// Operand that cannot be read as a number.
    Value,
    /// Division by zero or a non-finite result.
    Div0,
}

impl FormulaErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaErrorKind::Ref => "#REF!",
            FormulaErrorKind::Value => "#VALUE!",
            FormulaErrorKind::Div0 => "#DIV/0!",
        }
    }
}

#[derive(Error, Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[error("{}", .kind.as_str())]
pub struct FormulaError {
    pub kind: FormulaErrorKind,
}

impl FormulaError {
    pub const fn new(kind: FormulaErrorKind) -> FormulaError {
        FormulaError { kind }
    }

    pub fn kind(&self) -> FormulaErrorKind {
        self.kind
    }
}

impl From<FormulaErrorKind> for FormulaError {
    fn from(kind: FormulaErrorKind) -> Self {
        FormulaError::new(kind)
    }
}

/// The value a cell evaluates to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl Value {
    pub fn empty() -> Value {
        Value::Text(String::new())
    }

    pub fn as_error(&self) -> Option<FormulaError> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Read this value as a formula operand.
    ///
    /// Empty text counts as 0. Other text must be a number in its entirety.
    pub fn to_operand(&self) -> Result<f64, FormulaError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(s) if s.is_empty() => Ok(0.0),
            Value::Text(s) => s
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or(FormulaError::new(FormulaErrorKind::Value)),
            Value::Error(e) => Err(*e),
        }
    }
}

impl From<Result<f64, FormulaError>> for Value {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

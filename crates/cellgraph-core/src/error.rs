//! Error types for cellgraph core.

use cellgraph_engine::engine::{FormulaSyntaxError, Position};
use thiserror::Error;

/// Structural failures of sheet operations.
///
/// Value-level problems such as division by zero are not errors here; they
/// are stored as [`cellgraph_engine::engine::Value::Error`] and read back
/// like any other value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("Invalid position: row {}, column {}", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("Invalid formula: {0}")]
    FormulaSyntax(#[from] FormulaSyntaxError),

    #[error("Circular dependency detected: {}", format_path(.path))]
    CircularDependency { cell: Position, path: Vec<Position> },
}

fn format_path(path: &[Position]) -> String {
    path.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, SheetError>;

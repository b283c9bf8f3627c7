//! cellgraph-core - Sheet model with a live dependency graph.

pub mod error;
pub mod sheet;

pub use error::{Result, SheetError};
pub use sheet::{CellContent, CellView, Sheet};

pub use cellgraph_engine::engine::{FormulaError, FormulaErrorKind, Position, Size, Value};

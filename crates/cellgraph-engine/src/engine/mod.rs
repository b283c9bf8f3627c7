//! Spreadsheet engine API.
//!
//! This module provides the value-level building blocks of a sheet:
//!
//! - [`Position`], [`Size`] - Cell coordinates (A1 notation ↔ row/col indices) and grid bounds
//! - [`Value`], [`FormulaError`] - What a cell evaluates to
//! - [`parse_formula`], [`Formula`] - Parse and evaluate arithmetic formulas
//! - [`format_number`] - Format numbers for display

mod format;
mod formula;
mod lexer;
mod position;
mod value;

pub use format::format_number;
pub use formula::{Formula, FormulaSyntaxError, parse_formula};
pub use position::{MAX_COLS, MAX_ROWS, Position, Size};
pub use value::{FormulaError, FormulaErrorKind, Value};

/// Leading character that marks cell input as a formula.
pub const FORMULA_SIGN: char = '=';

/// Leading character that makes the rest of the input literal text.
pub const ESCAPE_SIGN: char = '\'';

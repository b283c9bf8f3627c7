//! Cell contents and per-cell graph state.
//!
//! - [`CellContent`] - What a cell holds (empty, literal text, or a formula)
//! - [`Cell`] - Content plus its value cache and dependency edges
//! - [`CellView`] - Read-only view of a cell borrowed from its [`Sheet`]

use std::cell::RefCell;
use std::collections::HashSet;

use cellgraph_engine::engine::{
    ESCAPE_SIGN, FORMULA_SIGN, Formula, FormulaSyntaxError, Position, Value, parse_formula,
};

use super::Sheet;

/// The content stored in a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    Empty,
    /// Literal text, stored verbatim (including a leading escape sign).
    Text(String),
    Formula(Formula),
}

impl CellContent {
    /// Parse user input into cell content.
    /// - Empty string -> Empty
    /// - `=` followed by at least one character -> Formula (without the `=`)
    /// - Otherwise -> Text
    pub fn parse(input: &str) -> Result<CellContent, FormulaSyntaxError> {
        if input.is_empty() {
            return Ok(CellContent::Empty);
        }
        if let Some(expression) = input.strip_prefix(FORMULA_SIGN)
            && !expression.is_empty()
        {
            return Ok(CellContent::Formula(parse_formula(expression)?));
        }
        Ok(CellContent::Text(input.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    /// The text a user would edit: literal text verbatim, formulas in
    /// canonical form behind the formula sign.
    pub fn text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(f) => format!("{}{}", FORMULA_SIGN, f.canonical_text()),
        }
    }

    /// Positions this content reads from.
    pub fn referenced_cells(&self) -> Vec<Position> {
        match self {
            CellContent::Formula(f) => f.referenced_positions(),
            CellContent::Empty | CellContent::Text(_) => Vec::new(),
        }
    }
}

/// A cell owned by a [`Sheet`].
///
/// Edges are stored as positions and always resolved through the sheet.
/// `outgoing` and `incoming` mirror each other across cells.
#[derive(Debug)]
pub(crate) struct Cell {
    pub(crate) content: CellContent,
    /// Memoized value; `None` until read after the last relevant change.
    pub(crate) cache: RefCell<Option<Value>>,
    /// Cells this cell reads from.
    pub(crate) outgoing: HashSet<Position>,
    /// Cells that read from this cell.
    pub(crate) incoming: HashSet<Position>,
    /// Cleared while still referenced; dropped once the last reader goes.
    pub(crate) cleared: bool,
}

impl Cell {
    pub(crate) fn new_empty() -> Cell {
        Cell {
            content: CellContent::Empty,
            cache: RefCell::new(None),
            outgoing: HashSet::new(),
            incoming: HashSet::new(),
            cleared: false,
        }
    }

    pub(crate) fn cached_value(&self) -> Option<Value> {
        self.cache.borrow().clone()
    }

    /// Read the cell's value, evaluating and caching it if needed.
    ///
    /// Operands are read through the sheet, so callers warm precedents with
    /// [`Sheet::evaluate`] to keep this from recursing down the chain.
    pub(crate) fn value(&self, sheet: &Sheet) -> Value {
        if let Some(value) = self.cached_value() {
            return value;
        }
        let value = match &self.content {
            CellContent::Empty => Value::empty(),
            CellContent::Text(s) => Value::Text(s.strip_prefix(ESCAPE_SIGN).unwrap_or(s).to_string()),
            CellContent::Formula(f) => f.evaluate(|pos| sheet.resolve_operand(pos)).into(),
        };
        sheet.record_evaluation();
        *self.cache.borrow_mut() = Some(value.clone());
        value
    }
}

/// A cell as seen through its sheet.
#[derive(Clone, Copy)]
pub struct CellView<'a> {
    pub(crate) sheet: &'a Sheet,
    pub(crate) pos: Position,
    pub(crate) cell: &'a Cell,
}

impl<'a> CellView<'a> {
    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn content(&self) -> &'a CellContent {
        &self.cell.content
    }

    pub fn value(&self) -> Value {
        self.sheet.evaluate(self.pos, self.cell)
    }

    pub fn text(&self) -> String {
        self.cell.content.text()
    }

    pub fn referenced_cells(&self) -> Vec<Position> {
        self.cell.content.referenced_cells()
    }

    /// Cells whose formulas read this cell, in row-major order.
    pub fn dependents(&self) -> Vec<Position> {
        let mut dependents: Vec<Position> = self.cell.incoming.iter().copied().collect();
        dependents.sort();
        dependents
    }
}

impl std::fmt::Debug for CellView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellView")
            .field("pos", &self.pos)
            .field("content", &self.cell.content)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert_eq!(CellContent::parse("").unwrap(), CellContent::Empty);
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(
            CellContent::parse("hello").unwrap(),
            CellContent::Text("hello".to_string())
        );
        assert_eq!(CellContent::parse("42").unwrap(), CellContent::Text("42".to_string()));
    }

    #[test]
    fn test_lone_formula_sign_is_text() {
        assert_eq!(CellContent::parse("=").unwrap(), CellContent::Text("=".to_string()));
    }

    #[test]
    fn test_escaped_formula_is_text() {
        let content = CellContent::parse("'=A1+1").unwrap();
        assert_eq!(content, CellContent::Text("'=A1+1".to_string()));
        assert!(content.referenced_cells().is_empty());
        assert_eq!(content.text(), "'=A1+1");
    }

    #[test]
    fn test_parse_formula() {
        let content = CellContent::parse("= A1 + B2").unwrap();
        assert!(matches!(content, CellContent::Formula(_)));
        assert_eq!(content.text(), "=A1+B2");
        assert_eq!(
            content.referenced_cells(),
            vec![Position::new(0, 0), Position::new(1, 1)]
        );
    }

    #[test]
    fn test_parse_formula_syntax_error() {
        assert!(CellContent::parse("=1+").is_err());
        assert!(CellContent::parse("=(").is_err());
    }
}

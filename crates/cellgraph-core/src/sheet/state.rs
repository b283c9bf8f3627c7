use std::collections::{HashMap, HashSet};

use cellgraph_engine::engine::{FormulaError, Position, Size, Value};

use super::cell::{Cell, CellView};
use crate::error::{Result, SheetError};

/// A sparse grid of cells with a live dependency graph.
///
/// The sheet owns every cell. Cells relate to each other only by position,
/// so any lookup of a neighbour goes through [`Sheet::cells`].
#[derive(Debug, Default)]
pub struct Sheet {
    /// Materialized cells; an absent key is an empty cell.
    pub(crate) cells: HashMap<Position, Cell>,
    /// Smallest rectangle covering every cell with non-empty content.
    pub(crate) bounds: Size,
    /// Number of cold evaluations performed, for instrumentation.
    pub(crate) evaluations: std::cell::Cell<usize>,
}

impl Sheet {
    /// Create an empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn validate(pos: Position) -> Result<()> {
        if pos.is_valid() {
            Ok(())
        } else {
            Err(SheetError::InvalidPosition(pos))
        }
    }

    /// Look up a cell without creating it.
    pub fn get_cell(&self, pos: Position) -> Result<Option<CellView<'_>>> {
        Self::validate(pos)?;
        Ok(self.cells.get(&pos).map(|cell| CellView {
            sheet: self,
            pos,
            cell,
        }))
    }

    /// Value of the cell at `pos`; empty text for an absent cell.
    pub fn value(&self, pos: Position) -> Result<Value> {
        Ok(self
            .get_cell(pos)?
            .map(|cell| cell.value())
            .unwrap_or_else(Value::empty))
    }

    /// Editable text of the cell at `pos`; empty for an absent cell.
    pub fn text(&self, pos: Position) -> Result<String> {
        Ok(self.get_cell(pos)?.map(|cell| cell.text()).unwrap_or_default())
    }

    /// The bounding rectangle of non-empty cells.
    pub fn printable_size(&self) -> Size {
        self.bounds
    }

    /// Number of materialized cells, including empty ones kept for references.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// How many times a cell value was computed rather than read from cache.
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.get()
    }

    pub(crate) fn record_evaluation(&self) {
        self.evaluations.set(self.evaluations.get() + 1);
    }

    /// Drop every cached value. The next reads recompute from scratch.
    pub fn clear_caches(&mut self) {
        for cell in self.cells.values_mut() {
            cell.cache.get_mut().take();
        }
    }

    /// Value of `cell` at `pos`.
    ///
    /// Uncached precedents are evaluated first, deepest first, so each
    /// formula finds its operands already cached and evaluation depth stays
    /// constant however long the dependency chain is.
    pub(crate) fn evaluate(&self, pos: Position, cell: &Cell) -> Value {
        if let Some(value) = cell.cached_value() {
            return value;
        }
        self.warm_precedents(pos);
        cell.value(self)
    }

    fn warm_precedents(&self, origin: Position) {
        // (position, children already pushed)
        let mut stack = vec![(origin, false)];
        let mut visited: HashSet<Position> = HashSet::new();

        while let Some((current, expanded)) = stack.pop() {
            let Some(cell) = self.cells.get(&current) else {
                continue;
            };
            if expanded {
                cell.value(self);
                continue;
            }
            if cell.cache.borrow().is_some() || !visited.insert(current) {
                continue;
            }
            stack.push((current, true));
            stack.extend(
                cell.outgoing
                    .iter()
                    .filter(|p| !visited.contains(*p))
                    .map(|&p| (p, false)),
            );
        }
    }

    /// Read the cell at `pos` as a formula operand.
    pub(crate) fn resolve_operand(&self, pos: Position) -> std::result::Result<f64, FormulaError> {
        match self.cells.get(&pos) {
            Some(cell) => cell.value(self).to_operand(),
            None => Ok(0.0),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self, pos: Position) -> bool {
        self.cells
            .get(&pos)
            .is_some_and(|cell| cell.cache.borrow().is_some())
    }
}

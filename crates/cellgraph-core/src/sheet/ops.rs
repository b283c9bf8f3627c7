use std::collections::HashSet;

use cellgraph_engine::engine::{Position, Size};
use log::{debug, trace};

use super::Sheet;
use super::cell::{Cell, CellContent};
use super::cycle::find_cycle;
use crate::error::{Result, SheetError};

impl Sheet {
    /// Set cell contents from input text.
    ///
    /// Either the whole edit is committed or the sheet is left exactly as it
    /// was: a syntax error or a circular reference leaves content, edges,
    /// caches and the set of materialized cells untouched.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        Self::validate(pos)?;
        let content = CellContent::parse(text)?;
        let refs = content.referenced_cells();

        let target_created = self.materialize(pos);
        let vivified: Vec<Position> = refs
            .iter()
            .copied()
            .filter(|&r| self.materialize(r))
            .collect();

        if let Some(path) = find_cycle(&self.cells, pos, &refs) {
            for r in vivified {
                self.cells.remove(&r);
            }
            if target_created {
                self.cells.remove(&pos);
            }
            debug!("rejected {} = {:?}: circular reference", pos, text);
            return Err(SheetError::CircularDependency { cell: pos, path });
        }

        self.rewire(pos, &refs);
        self.invalidate_from(pos);

        let non_empty = !content.is_empty();
        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.content = content;
            cell.cleared = false;
        }
        if non_empty {
            self.bounds = self.bounds.extended_to(pos);
        }

        debug!("set {} ({} refs, bounds {})", pos, refs.len(), self.bounds);
        Ok(())
    }

    /// Clear the specified cell.
    ///
    /// The cell's content and outgoing edges are dropped and its dependents
    /// are invalidated. The storage entry is removed right away unless other
    /// formulas still read this position; in that case it stays as an empty
    /// cell until the last of them is rewired.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        Self::validate(pos)?;
        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        self.rewire(pos, &[]);
        self.invalidate_from(pos);

        let referenced = match self.cells.get_mut(&pos) {
            Some(cell) if !cell.incoming.is_empty() => {
                cell.content = CellContent::Empty;
                cell.cache.get_mut().take();
                cell.cleared = true;
                true
            }
            _ => false,
        };
        if !referenced {
            self.cells.remove(&pos);
        }

        if self.bounds.is_on_edge(pos) {
            self.recompute_bounds();
        }
        debug!(
            "cleared {} ({}, bounds {})",
            pos,
            if referenced { "kept for dependents" } else { "removed" },
            self.bounds
        );
        Ok(())
    }

    /// Ensure a cell exists at `pos`. Returns true if it was created.
    fn materialize(&mut self, pos: Position) -> bool {
        if self.cells.contains_key(&pos) {
            return false;
        }
        self.cells.insert(pos, Cell::new_empty());
        true
    }

    /// Replace the outgoing edges of `pos`, keeping `incoming` sets in sync.
    ///
    /// New edges are added before old ones are dropped, so a position that
    /// stays referenced is never reclaimed. A dropped precedent is reclaimed
    /// once it is empty, unread, and either cleared or outside the bounds.
    fn rewire(&mut self, pos: Position, refs: &[Position]) {
        let old = match self.cells.get_mut(&pos) {
            Some(cell) => std::mem::replace(&mut cell.outgoing, refs.iter().copied().collect()),
            None => return,
        };

        for &next in refs {
            if let Some(cell) = self.cells.get_mut(&next) {
                cell.incoming.insert(pos);
            }
        }

        for prev in old.into_iter().filter(|p| !refs.contains(p)) {
            let reclaim = match self.cells.get_mut(&prev) {
                Some(cell) => {
                    cell.incoming.remove(&pos);
                    cell.content.is_empty()
                        && cell.incoming.is_empty()
                        && (cell.cleared || !self.bounds.contains(prev))
                }
                None => false,
            };
            if reclaim {
                trace!("reclaiming unreferenced empty cell {}", prev);
                self.cells.remove(&prev);
            }
        }
    }

    /// Drop the cached value of `pos` and of every cell that transitively
    /// reads it.
    ///
    /// A cell whose cache is already empty is not descended into: anything
    /// reading it was invalidated when its cache was dropped.
    pub(crate) fn invalidate_from(&mut self, pos: Position) {
        let mut stack = vec![pos];
        let mut visited: HashSet<Position> = HashSet::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(cell) = self.cells.get_mut(&current) else {
                continue;
            };
            if cell.cache.get_mut().take().is_none() {
                continue;
            }
            trace!("invalidated {}", current);
            stack.extend(cell.incoming.iter().copied());
        }
    }

    /// Shrink `bounds` to the cells that still have content.
    fn recompute_bounds(&mut self) {
        self.bounds = self
            .cells
            .iter()
            .filter(|(_, cell)| !cell.content.is_empty())
            .fold(Size::empty(), |size, (&p, _)| size.extended_to(p));
        debug!("recomputed bounds: {}", self.bounds);
    }
}

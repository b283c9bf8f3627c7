//! Circular dependency detection for formula cells.
//!
//! Before a formula is committed we must verify that none of the cells it
//! reads can reach the cell being edited through existing `outgoing` edges
//! (e.g., A1 reads B1, B1 reads C1, and C1 is now being set to read A1).
//! The search only reads the graph.

use std::collections::{HashMap, HashSet};

use cellgraph_engine::engine::Position;
use log::trace;

use super::cell::Cell;

/// Search for a path from any of `refs` back to `origin`.
///
/// Returns the cycle as `origin -> ... -> origin` if one exists.
/// Every position is expanded at most once, so the walk terminates even on
/// a graph that already contains a cycle not involving `origin`.
pub(crate) fn find_cycle(
    cells: &HashMap<Position, Cell>,
    origin: Position,
    refs: &[Position],
) -> Option<Vec<Position>> {
    let mut visited: HashSet<Position> = HashSet::new();
    let mut parent: HashMap<Position, Position> = HashMap::new();
    let mut stack: Vec<Position> = Vec::new();

    for &start in refs.iter().rev() {
        if start == origin {
            return Some(vec![origin, origin]);
        }
        if visited.insert(start) {
            parent.insert(start, origin);
            stack.push(start);
        }
    }

    while let Some(current) = stack.pop() {
        trace!("cycle check from {}: visiting {}", origin, current);
        let Some(cell) = cells.get(&current) else {
            continue;
        };

        let mut next: Vec<Position> = cell.outgoing.iter().copied().collect();
        next.sort_unstable_by(|a, b| b.cmp(a));
        for dep in next {
            if dep == origin {
                return Some(build_path(&parent, origin, current));
            }
            if visited.insert(dep) {
                parent.insert(dep, current);
                stack.push(dep);
            }
        }
    }

    None
}

fn build_path(
    parent: &HashMap<Position, Position>,
    origin: Position,
    last: Position,
) -> Vec<Position> {
    let mut path = vec![origin];
    let mut current = last;
    while current != origin {
        path.push(current);
        match parent.get(&current) {
            Some(&p) => current = p,
            None => break,
        }
    }
    path.reverse();
    path.insert(0, origin);
    path
}

//! Sheet state and logic.

mod cell;
mod cycle;
mod io;
mod ops;
mod state;

pub use cell::{CellContent, CellView};
pub use state::Sheet;

//! Tab-separated dumps of a sheet's printable area.

use std::io::{self, Write};

use cellgraph_engine::engine::Position;

use super::Sheet;
use super::cell::CellView;

impl Sheet {
    /// Write every cell value in the printable area, one row per line.
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell| cell.value().to_string())
    }

    /// Write every cell's editable text in the printable area, one row per line.
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell| cell.text())
    }

    fn print_with<W, F>(&self, out: &mut W, render: F) -> io::Result<()>
    where
        W: Write,
        F: Fn(CellView<'_>) -> String,
    {
        let size = self.printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    out.write_all(b"\t")?;
                }
                let pos = Position::new(row, col);
                if let Some(cell) = self.cells.get(&pos) {
                    let view = CellView {
                        sheet: self,
                        pos,
                        cell,
                    };
                    out.write_all(render(view).as_bytes())?;
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

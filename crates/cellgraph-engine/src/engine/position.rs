//! Cell positions and grid sizes.
//!
//! Provides bidirectional conversion between spreadsheet-style references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates.
//!
//! # Examples
//!
//! ```
//! use cellgraph_engine::engine::Position;
//!
//! let pos = Position::from_a1("B3").unwrap();
//! assert_eq!(pos.row, 2);
//! assert_eq!(pos.col, 1);
//! assert_eq!(pos.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of addressable rows.
pub const MAX_ROWS: usize = 16384;
/// Number of addressable columns.
pub const MAX_COLS: usize = 16384;

/// A cell coordinate (0-indexed). Orders by row, then column.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }

    /// Whether the position lies inside the addressable grid.
    pub fn is_valid(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Parse a reference in A1 notation ("A1", "b2", "AA10").
    ///
    /// Returns None if the text is not a reference or its coordinates overflow.
    /// A well-formed reference beyond the grid is returned as-is; check
    /// [`Position::is_valid`] before using it.
    pub fn from_a1(name: &str) -> Option<Position> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        let col = col_acc.checked_sub(1)?;

        let row = numbers.parse::<usize>().ok()?.checked_sub(1)?;

        Some(Position::new(row, col))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Position::col_to_letters(self.col), self.row + 1)
    }
}

/// Extent of a rectangle anchored at A1.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub rows: usize,
    pub cols: usize,
}

impl Size {
    pub const fn new(rows: usize, cols: usize) -> Size {
        Size { rows, cols }
    }

    pub const fn empty() -> Size {
        Size { rows: 0, cols: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Smallest size covering both `self` and `pos`.
    pub fn extended_to(&self, pos: Position) -> Size {
        Size {
            rows: self.rows.max(pos.row + 1),
            cols: self.cols.max(pos.col + 1),
        }
    }

    /// Whether `pos` sits on the last row or last column of this size.
    pub fn is_on_edge(&self, pos: Position) -> bool {
        pos.row + 1 == self.rows || pos.col + 1 == self.cols
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_a1_single_letter_columns() {
        assert_eq!(Position::from_a1("A1"), Some(Position::new(0, 0)));
        assert_eq!(Position::from_a1("B1"), Some(Position::new(0, 1)));
        assert_eq!(Position::from_a1("Z1"), Some(Position::new(0, 25)));
    }

    #[test]
    fn test_from_a1_multi_letter_columns() {
        assert_eq!(Position::from_a1("AA1").unwrap().col, 26);
        assert_eq!(Position::from_a1("AZ1").unwrap().col, 51);
        assert_eq!(Position::from_a1("BA1").unwrap().col, 52);
    }

    #[test]
    fn test_from_a1_case_insensitive() {
        assert_eq!(Position::from_a1("a1"), Some(Position::new(0, 0)));
        assert_eq!(Position::from_a1("aA10"), Some(Position::new(9, 26)));
    }

    #[test]
    fn test_from_a1_invalid_inputs() {
        assert!(Position::from_a1("").is_none());
        assert!(Position::from_a1("123").is_none());
        assert!(Position::from_a1("ABC").is_none());
        assert!(Position::from_a1("A0").is_none());
        assert!(Position::from_a1("1A").is_none());
        assert!(Position::from_a1("A 1").is_none());
    }

    #[test]
    fn test_from_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(Position::from_a1(&huge).is_none());
    }

    #[test]
    fn test_out_of_range_reference_parses_but_is_invalid() {
        let pos = Position::from_a1("A16385").unwrap();
        assert_eq!(pos.row, 16384);
        assert!(!pos.is_valid());
        assert!(Position::from_a1("XFD16384").unwrap().is_valid());
        assert!(!Position::from_a1("XFE1").unwrap().is_valid());
    }

    #[test]
    fn test_display_round_trip() {
        for name in ["A1", "Z9", "AA10", "XFD16384"] {
            assert_eq!(Position::from_a1(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn test_ordering_is_row_major() {
        let mut positions = vec![Position::new(1, 0), Position::new(0, 5), Position::new(0, 1)];
        positions.sort();
        assert_eq!(
            positions,
            vec![Position::new(0, 1), Position::new(0, 5), Position::new(1, 0)]
        );
    }

    #[test]
    fn test_size_extended_and_edges() {
        let size = Size::empty().extended_to(Position::new(2, 1));
        assert_eq!(size, Size::new(3, 2));
        assert!(size.contains(Position::new(2, 1)));
        assert!(!size.contains(Position::new(3, 0)));
        assert!(size.is_on_edge(Position::new(2, 0)));
        assert!(size.is_on_edge(Position::new(0, 1)));
        assert!(!size.is_on_edge(Position::new(0, 0)));
        assert_eq!(size.extended_to(Position::new(0, 0)), size);
    }
}

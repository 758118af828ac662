//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates, plus
//! the canonical `"row,col"` key used by formula maps.
//!
//! # Examples
//!
//! ```
//! use sheetcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::parse_a1("B3").unwrap();
//! assert_eq!(cell.row, 2);  // 0-indexed
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.to_string(), "B3");
//! assert_eq!(cell.key(), "2,1");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::{FormulaError, FormulaResult};

/// Maximum number of column letters accepted in a reference (`ZZZ`).
pub const MAX_COL_LETTERS: usize = 3;
/// Maximum number of row digits accepted in a reference.
pub const MAX_ROW_DIGITS: usize = 7;
/// Number of rows addressable in A1 notation (`1` through `9999999`).
pub const MAX_ROWS: usize = 9_999_999;
/// Number of columns addressable in A1 notation (`A` through `ZZZ`).
pub const MAX_COLS: usize = 18_278;

/// A reference to a cell by row and column indices (0-indexed).
///
/// Ordering is row-major, which keeps graph traversal and evaluation order
/// deterministic.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a reference in A1 notation (1-3 letters, 1-7 digits, row >= 1).
    pub fn parse_a1(text: &str) -> FormulaResult<CellRef> {
        let caps = a1_re()
            .captures(text.trim())
            .ok_or_else(|| FormulaError::InvalidRef(format!("bad cell reference: {}", text)))?;
        let row = caps["row"]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| FormulaError::InvalidRef(format!("row must be >= 1: {}", text)))?;
        Ok(CellRef::new(row, column_to_index(&caps["col"])))
    }

    /// Canonical `"row,col"` key.
    pub fn key(&self) -> String {
        format!("{},{}", self.row, self.col)
    }

    /// Parse a canonical `"row,col"` key.
    pub fn from_key(key: &str) -> Option<CellRef> {
        let (row, col) = key.split_once(',')?;
        let row: usize = row.trim().parse().ok()?;
        let col: usize = col.trim().parse().ok()?;
        (row < MAX_ROWS && col < MAX_COLS).then_some(CellRef::new(row, col))
    }

    /// Offset by a signed delta, or `None` if either coordinate would go negative.
    pub fn offset(&self, row_delta: isize, col_delta: isize) -> Option<CellRef> {
        Some(CellRef::new(
            self.row.checked_add_signed(row_delta)?,
            self.col.checked_add_signed(col_delta)?,
        ))
    }
}

impl std::str::FromStr for CellRef {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", index_to_column(self.col), self.row as u128 + 1)
    }
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^(?<col>[A-Za-z]{{1,{}}})(?<row>[0-9]{{1,{}}})$",
            MAX_COL_LETTERS, MAX_ROW_DIGITS
        ))
        .expect("A1 reference regex must compile")
    })
}

/// Anything shaped like a bare reference (`A1`, `zzzz12`). Validity of the
/// letter and digit counts is left to [`CellRef::parse_a1`].
pub(crate) fn bare_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z]+[0-9]+\b").expect("bare reference regex must compile")
    })
}

/// Convert column letters to a 0-based index (A -> 0, Z -> 25, AA -> 26).
///
/// Letters are case-insensitive and non-letters are ignored. The length limit
/// is enforced by [`CellRef::parse_a1`], not here.
pub fn column_to_index(letters: &str) -> usize {
    let mut acc = 0usize;
    for c in letters.bytes().filter(u8::is_ascii_alphabetic) {
        let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
        acc = acc.saturating_mul(26).saturating_add(digit);
    }
    acc.saturating_sub(1)
}

/// Convert a 0-based column index to letters (0 -> A, 25 -> Z, 26 -> AA).
pub fn index_to_column(col: usize) -> String {
    let mut result = String::new();
    let mut n = col as u128 + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Parse `"A1"` into `(row, col)`.
pub fn parse_cell_ref(text: &str) -> FormulaResult<(usize, usize)> {
    let cell = CellRef::parse_a1(text)?;
    Ok((cell.row, cell.col))
}

/// A normalised rectangular range of cells.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    /// Build a range from any two corners.
    pub fn new(a: CellRef, b: CellRef) -> RangeRef {
        RangeRef {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse `"A1:B3"`. Corners may be given in any order.
    pub fn parse(text: &str) -> FormulaResult<RangeRef> {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() != 2 {
            return Err(FormulaError::InvalidRef(format!("bad range: {}", text)));
        }
        Ok(RangeRef::new(
            CellRef::parse_a1(parts[0])?,
            CellRef::parse_a1(parts[1])?,
        ))
    }

    pub fn rows(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    /// Number of cells, or `None` on overflow.
    pub fn len(&self) -> Option<usize> {
        self.rows().checked_mul(self.cols())
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row)
            .flat_map(move |row| (self.start.col..=self.end.col).map(move |col| CellRef::new(row, col)))
    }
}

/// Expand `"A1:B3"` into every `(row, col)` of the rectangle, row-major.
pub fn expand_range(text: &str) -> FormulaResult<Vec<(usize, usize)>> {
    let range = RangeRef::parse(text)?;
    Ok(range.cells().map(|c| (c.row, c.col)).collect())
}

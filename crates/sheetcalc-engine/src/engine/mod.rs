//! Spreadsheet formula engine API.
//!
//! - [`CellRef`], [`RangeRef`] - A1 reference parsing and `"row,col"` keys
//! - [`validate_formula`] - Static syntax and reference checks
//! - [`evaluate`] - Evaluate one formula against a [`Resolver`]
//! - [`DependencyGraph`] - Forward/reverse edges and evaluation order
//! - [`recalculate`] - Write formula results into a value grid
//! - [`shift_refs`] and the [`structure`] helpers - Keep formulas consistent
//!   across paste and row/column edits

mod cell_ref;
mod deps;
mod error;
mod eval;
mod format;
mod parser;
mod recalc;
mod shift;
pub mod structure;
mod validate;

pub use crate::builtins::descriptions as builtin_descriptions;
pub use cell_ref::{
    CellRef, MAX_COL_LETTERS, MAX_COLS, MAX_ROW_DIGITS, MAX_ROWS, RangeRef, column_to_index,
    expand_range, index_to_column, parse_cell_ref,
};
pub use deps::{DependencyGraph, MAX_DEPTH, extract_refs};
pub use error::{ErrorCode, FormulaError, FormulaResult};
pub use eval::{Bounds, Resolver, evaluate};
pub use format::format_number;
pub use parser::parse_arithmetic;
pub use recalc::{
    FormulaMap, Grid, RecalcOptions, RecalcReport, parse_formula_map, parse_number, recalculate,
    recalculate_with,
};
pub use shift::shift_refs;
pub use structure::Axis;
pub use validate::validate_formula;

//! Formula evaluation.
//!
//! A formula is evaluated in three passes over its text, the same way it is
//! scanned for dependencies:
//!
//! 1. built-in range calls (`SUM(A1:B3)`) are replaced by their value,
//! 2. bare references (`A1`) are replaced by the referenced cell's value,
//! 3. the remaining arithmetic is handed to the recursive-descent parser.
//!
//! Cell values come from a [`Resolver`], which keeps this module ignorant of
//! grids, caches and dependency graphs.

use regex::Captures;

use super::cell_ref::{CellRef, RangeRef, bare_ref_re};
use super::error::{FormulaError, FormulaResult};
use super::parser::parse_arithmetic;
use crate::builtins;

/// Supplies cell values to the evaluator.
pub trait Resolver {
    /// Numeric value of a cell. Blank and non-numeric cells are `0`.
    fn resolve_cell(&mut self, row: usize, col: usize) -> FormulaResult<f64>;

    /// Whether a cell counts as non-empty for `COUNT`.
    fn has_content(&self, row: usize, col: usize) -> bool;
}

/// Sheet dimensions used for `#REF` checks. A zero dimension is not checked.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Bounds {
    pub rows: usize,
    pub cols: usize,
}

impl Bounds {
    pub fn new(rows: usize, cols: usize) -> Self {
        Bounds { rows, cols }
    }

    pub fn check(&self, cell: CellRef) -> FormulaResult<()> {
        if self.rows > 0 && cell.row >= self.rows {
            return Err(FormulaError::InvalidRef(format!("row out of bounds: {}", cell)));
        }
        if self.cols > 0 && cell.col >= self.cols {
            return Err(FormulaError::InvalidRef(format!("column out of bounds: {}", cell)));
        }
        Ok(())
    }
}

/// Evaluate a formula (leading `=` optional) to a number.
pub fn evaluate(
    formula: &str,
    resolver: &mut dyn Resolver,
    bounds: Option<Bounds>,
) -> FormulaResult<f64> {
    let body = formula_body(formula);
    if body.is_empty() {
        return Err(FormulaError::Syntax("empty formula".to_string()));
    }

    let mut failure: Option<FormulaError> = None;

    let with_functions = builtins::range_fn_re()
        .replace_all(body, |caps: &Captures| {
            if failure.is_some() {
                return String::new();
            }
            match eval_range_call(caps, resolver, bounds) {
                Ok(value) => operand(value),
                Err(e) => {
                    failure = Some(e);
                    String::new()
                }
            }
        })
        .into_owned();
    if let Some(e) = failure {
        return Err(e);
    }

    if builtins::call_like_re().is_match(&with_functions) {
        return Err(FormulaError::Syntax("unsupported or malformed function".to_string()));
    }

    let with_refs = bare_ref_re()
        .replace_all(&with_functions, |caps: &Captures| {
            if failure.is_some() {
                return String::new();
            }
            let resolved = CellRef::parse_a1(&caps[0]).and_then(|cell| {
                if let Some(bounds) = bounds {
                    bounds.check(cell)?;
                }
                resolver.resolve_cell(cell.row, cell.col)
            });
            match resolved {
                Ok(value) => operand(value),
                Err(e) => {
                    failure = Some(e);
                    String::new()
                }
            }
        })
        .into_owned();
    if let Some(e) = failure {
        return Err(e);
    }

    let value = parse_arithmetic(&with_refs)?;
    if !value.is_finite() {
        return Err(FormulaError::Syntax("result is not a finite number".to_string()));
    }
    Ok(value)
}

/// Formula text without the leading `=` and surrounding whitespace.
pub(crate) fn formula_body(formula: &str) -> &str {
    formula.trim().trim_start_matches('=').trim()
}

fn eval_range_call(
    caps: &Captures,
    resolver: &mut dyn Resolver,
    bounds: Option<Bounds>,
) -> FormulaResult<f64> {
    let aggregate = builtins::lookup(&caps[1])
        .ok_or_else(|| FormulaError::Syntax(format!("unknown function: {}", &caps[1])))?;
    let range = RangeRef::new(CellRef::parse_a1(&caps[2])?, CellRef::parse_a1(&caps[3])?);
    if let Some(bounds) = bounds {
        // The far corner is out of bounds whenever any cell is.
        bounds.check(range.end)?;
    }
    builtins::apply(aggregate, &range, resolver)
}

/// Render a value for substitution back into formula text. Always
/// parenthesised so it cannot fuse with neighbouring digits or dots.
fn operand(value: f64) -> String {
    format!("({})", value)
}

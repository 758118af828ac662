//! Built-in aggregate functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing names are ALL CAPS (e.g. `SUM`, `AVG`) and matched
//!   case-insensitively.
//! - Every built-in takes exactly one `REF:REF` range argument.
//! - If you add a new built-in, update `RANGE_BUILTINS` and handle its
//!   `Aggregate` in `apply`.

use regex::Regex;
use std::sync::OnceLock;

use crate::engine::{FormulaResult, RangeRef, Resolver};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Aggregate {
    Sum,
    Average,
    Count,
    Min,
    Max,
}

pub struct RangeBuiltin {
    pub sheet_name: &'static str,
    pub aggregate: Aggregate,
    pub description: &'static str,
}

pub const RANGE_BUILTINS: &[RangeBuiltin] = &[
    RangeBuiltin {
        sheet_name: "SUM",
        aggregate: Aggregate::Sum,
        description: "Sum of numeric values in a cell range",
    },
    RangeBuiltin {
        sheet_name: "AVERAGE",
        aggregate: Aggregate::Average,
        description: "Mean of the values in a cell range (blank cells count as 0)",
    },
    RangeBuiltin {
        sheet_name: "AVG",
        aggregate: Aggregate::Average,
        description: "Alias of AVERAGE",
    },
    RangeBuiltin {
        sheet_name: "COUNT",
        aggregate: Aggregate::Count,
        description: "Count of non-empty cells in a cell range",
    },
    RangeBuiltin {
        sheet_name: "MIN",
        aggregate: Aggregate::Min,
        description: "Minimum value in a cell range",
    },
    RangeBuiltin {
        sheet_name: "MAX",
        aggregate: Aggregate::Max,
        description: "Maximum value in a cell range",
    },
];

/// Look up a built-in by its spreadsheet name (case-insensitive).
pub fn lookup(name: &str) -> Option<Aggregate> {
    RANGE_BUILTINS
        .iter()
        .find(|b| b.sheet_name.eq_ignore_ascii_case(name))
        .map(|b| b.aggregate)
}

/// `(name, description)` for every built-in, in table order.
pub fn descriptions() -> impl Iterator<Item = (&'static str, &'static str)> {
    RANGE_BUILTINS.iter().map(|b| (b.sheet_name, b.description))
}

/// Regex that matches built-in range calls like `SUM(A1:B5)`.
///
/// Captures:
/// - group 1: function name (e.g. `SUM`)
/// - group 2: start cell ref (e.g. `A1`)
/// - group 3: end cell ref (e.g. `B5`)
///
/// Reference groups are deliberately loose (any letters + digits) so callers
/// can tell a malformed reference (`#REF`) from a malformed call (`#ERROR`).
pub fn range_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = RANGE_BUILTINS
            .iter()
            .map(|b| b.sheet_name)
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"(?i)\b({})\(\s*([A-Za-z]+[0-9]+)\s*:\s*([A-Za-z]+[0-9]+)\s*\)",
            names
        ))
        .expect("built-in range regex must compile")
    })
}

/// Regex for anything that still looks like a call once built-ins are gone.
pub fn call_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]+\(").expect("call regex must compile"))
}

/// Apply an aggregate over a range through the resolver.
pub fn apply(
    aggregate: Aggregate,
    range: &RangeRef,
    resolver: &mut dyn Resolver,
) -> FormulaResult<f64> {
    let result = match aggregate {
        Aggregate::Count => range
            .cells()
            .filter(|cell| resolver.has_content(cell.row, cell.col))
            .count() as f64,
        Aggregate::Sum => resolve_values(range, resolver)?.iter().sum::<f64>(),
        Aggregate::Average => {
            let values = resolve_values(range, resolver)?;
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
        Aggregate::Min => resolve_values(range, resolver)?
            .into_iter()
            .reduce(f64::min)
            .unwrap_or(0.0),
        Aggregate::Max => resolve_values(range, resolver)?
            .into_iter()
            .reduce(f64::max)
            .unwrap_or(0.0),
    };
    Ok(result)
}

fn resolve_values(range: &RangeRef, resolver: &mut dyn Resolver) -> FormulaResult<Vec<f64>> {
    range
        .cells()
        .map(|cell| resolver.resolve_cell(cell.row, cell.col))
        .collect()
}

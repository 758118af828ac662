//! Sheet recalculation.
//!
//! [`recalculate`] evaluates formulas into a value grid in place. All state
//! (graph, value cache, recorded errors, the visiting set used for cycle
//! detection) lives in a `RecalcSession` built for one call and dropped at
//! the end, so separate sheets can be recalculated concurrently.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::cell_ref::CellRef;
use super::deps::{DependencyGraph, MAX_DEPTH};
use super::error::{ErrorCode, FormulaError, FormulaResult};
use super::eval::{Bounds, Resolver, evaluate};
use super::format::format_number;
use super::validate::validate_formula;

/// Formula text (`=...`) keyed by canonical `"row,col"` cell key.
pub type FormulaMap = BTreeMap<String, String>;

/// Rows of display strings. Rows may be ragged.
pub type Grid = Vec<Vec<String>>;

/// Tunables for a recalculation pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecalcOptions {
    /// Bound on both propagation hops and nested formula resolution.
    pub max_depth: usize,
    /// Report references past the grid edge as `#REF`.
    pub enforce_bounds: bool,
}

impl Default for RecalcOptions {
    fn default() -> Self {
        RecalcOptions {
            max_depth: MAX_DEPTH,
            enforce_bounds: true,
        }
    }
}

/// What a recalculation pass did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecalcReport {
    /// Formula cells in the order they were evaluated.
    pub order: Vec<CellRef>,
    /// Error codes written, by cell.
    pub errors: BTreeMap<CellRef, ErrorCode>,
}

/// Recalculate with default options.
///
/// - `changed = None`: every formula, in dependency order.
/// - `changed = Some(empty)`: nothing.
/// - `changed = Some(cells)`: only formulas transitively reading `cells`
///   (plus any of `cells` that are formulas themselves).
pub fn recalculate(
    grid: &mut Grid,
    formulas: &FormulaMap,
    changed: Option<&BTreeSet<CellRef>>,
) -> RecalcReport {
    recalculate_with(grid, formulas, changed, &RecalcOptions::default())
}

/// Recalculate with explicit options. Errors are written into the grid as
/// display codes; nothing is returned as `Err`.
pub fn recalculate_with(
    grid: &mut Grid,
    formulas: &FormulaMap,
    changed: Option<&BTreeSet<CellRef>>,
    options: &RecalcOptions,
) -> RecalcReport {
    if formulas.is_empty() {
        return RecalcReport::default();
    }
    if changed.is_some_and(|cells| cells.is_empty()) {
        return RecalcReport::default();
    }

    let parsed = parse_formula_map(formulas);
    let graph =
        DependencyGraph::build_with_depth(parsed.iter().map(|(k, v)| (*k, *v)), options.max_depth);
    let order = match changed {
        Some(cells) => graph.affected(cells),
        None => graph.topo_sort_all(),
    };
    if order.is_empty() {
        return RecalcReport::default();
    }

    debug!(
        "recalculating {} of {} formula(s) ({})",
        order.len(),
        parsed.len(),
        if changed.is_some() { "targeted" } else { "full" }
    );

    let mut session = RecalcSession::new(grid, parsed, &order, options);
    for cell in &order {
        session.evaluate_top_level(*cell);
    }

    let errors = session.errors;
    debug!("recalculation wrote {} error(s)", errors.len());
    RecalcReport { order, errors }
}

/// Parse formula-map keys, skipping (and logging) anything malformed.
pub fn parse_formula_map(formulas: &FormulaMap) -> BTreeMap<CellRef, &str> {
    formulas
        .iter()
        .filter_map(|(key, text)| match CellRef::from_key(key) {
            Some(cell) => Some((cell, text.as_str())),
            None => {
                warn!("ignoring formula with malformed cell key {:?}", key);
                None
            }
        })
        .collect()
}

/// Parse a display string as a number. Blank, non-numeric and non-finite
/// content yields `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Request-scoped evaluation state for one recalculation pass.
struct RecalcSession<'a> {
    grid: &'a mut Grid,
    formulas: BTreeMap<CellRef, &'a str>,
    eval_set: BTreeSet<CellRef>,
    cache: HashMap<CellRef, f64>,
    errors: BTreeMap<CellRef, ErrorCode>,
    visiting: HashSet<CellRef>,
    depth: usize,
    max_depth: usize,
    bounds: Option<Bounds>,
}

impl<'a> RecalcSession<'a> {
    fn new(
        grid: &'a mut Grid,
        formulas: BTreeMap<CellRef, &'a str>,
        order: &[CellRef],
        options: &RecalcOptions,
    ) -> Self {
        let rows = grid.len();
        let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
        RecalcSession {
            grid,
            formulas,
            eval_set: order.iter().copied().collect(),
            cache: HashMap::new(),
            errors: BTreeMap::new(),
            visiting: HashSet::new(),
            depth: 0,
            max_depth: options.max_depth,
            bounds: options.enforce_bounds.then(|| Bounds::new(rows, cols)),
        }
    }

    fn display(&self, cell: CellRef) -> Option<&str> {
        self.grid
            .get(cell.row)
            .and_then(|row| row.get(cell.col))
            .map(String::as_str)
    }

    fn write(&mut self, cell: CellRef, value: String) {
        if let Some(slot) = self.grid.get_mut(cell.row).and_then(|row| row.get_mut(cell.col)) {
            *slot = value;
        }
    }

    fn evaluate_top_level(&mut self, cell: CellRef) {
        let Some(&formula) = self.formulas.get(&cell) else {
            return;
        };
        // Formulas keyed outside the grid have no slot to write into.
        if self.display(cell).is_none() {
            return;
        }

        let result = match validate_formula(formula) {
            Some(code) => Err(code),
            None => self.resolve(cell).map_err(|e| e.code()),
        };
        match result {
            Ok(value) => {
                let shown = format_number(value);
                trace!("{} = {}", cell, shown);
                self.write(cell, shown);
            }
            Err(code) => {
                trace!("{} = {}", cell, code);
                self.errors.insert(cell, code);
                self.write(cell, code.as_str().to_string());
            }
        }
    }

    fn resolve(&mut self, cell: CellRef) -> FormulaResult<f64> {
        if self.depth > self.max_depth {
            return Err(FormulaError::DepthExceeded(self.max_depth));
        }
        if let Some(code) = self.errors.get(&cell) {
            return Err(FormulaError::Propagated(*code));
        }
        if let Some(value) = self.cache.get(&cell) {
            return Ok(*value);
        }
        if self.visiting.contains(&cell) {
            return Err(FormulaError::Cycle(cell));
        }

        let Some(&formula) = self.formulas.get(&cell) else {
            // Plain cell.
            return Ok(self.display(cell).and_then(parse_number).unwrap_or(0.0));
        };

        if !self.eval_set.contains(&cell) {
            // Not part of this pass: reuse its last computed value.
            let shown = self.display(cell).unwrap_or("");
            if shown.starts_with('#') {
                return Err(FormulaError::Propagated(
                    shown.parse().unwrap_or(ErrorCode::Error),
                ));
            }
            let value = parse_number(shown);
            if let Some(value) = value {
                self.cache.insert(cell, value);
            }
            return Ok(value.unwrap_or(0.0));
        }

        if let Some(code) = validate_formula(formula) {
            return Err(FormulaError::Propagated(code));
        }

        let bounds = self.bounds;
        self.visiting.insert(cell);
        self.depth += 1;
        let result = evaluate(formula, self, bounds);
        self.depth -= 1;
        self.visiting.remove(&cell);

        let value = result?;
        self.cache.insert(cell, value);
        Ok(value)
    }
}

impl Resolver for RecalcSession<'_> {
    fn resolve_cell(&mut self, row: usize, col: usize) -> FormulaResult<f64> {
        self.resolve(CellRef::new(row, col))
    }

    fn has_content(&self, row: usize, col: usize) -> bool {
        let cell = CellRef::new(row, col);
        self.formulas.contains_key(&cell)
            || self.display(cell).is_some_and(|shown| !shown.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn formulas(entries: &[(&str, &str)]) -> FormulaMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_full_recalculation() {
        let mut g = grid(&[&["1", "", ""], &["2", "", ""], &["3", "", ""]]);
        let f = formulas(&[("0,1", "=SUM(A1:A3)"), ("0,2", "=B1*2"), ("1,1", "=A2/A1")]);
        let report = recalculate(&mut g, &f, None);
        assert_eq!(g[0][1], "6");
        assert_eq!(g[0][2], "12");
        assert_eq!(g[1][1], "2");
        assert!(report.errors.is_empty());
        // B1 must come before C1, which reads it.
        let b1 = report.order.iter().position(|c| *c == CellRef::new(0, 1));
        let c1 = report.order.iter().position(|c| *c == CellRef::new(0, 2));
        assert!(b1 < c1);
    }

    #[test]
    fn test_empty_change_set_is_noop() {
        let mut g = grid(&[&["1", "stale"]]);
        let f = formulas(&[("0,1", "=A1")]);
        let report = recalculate(&mut g, &f, Some(&BTreeSet::new()));
        assert_eq!(report, RecalcReport::default());
        assert_eq!(g[0][1], "stale");
    }

    #[test]
    fn test_targeted_recalculation_reuses_untouched_formulas() {
        let mut g = grid(&[&["1", "", ""], &["5", "", ""]]);
        let f = formulas(&[("0,1", "=A1*10"), ("1,1", "=A2+1"), ("0,2", "=B1+B2")]);
        recalculate(&mut g, &f, None);
        assert_eq!(g[0][2], "16");

        g[1][0] = "7".to_string();
        let report = recalculate(&mut g, &f, Some(&BTreeSet::from([CellRef::new(1, 0)])));
        assert_eq!(report.order, vec![CellRef::new(1, 1), CellRef::new(0, 2)]);
        assert_eq!(g[1][1], "8");
        // B1 was not re-evaluated; its displayed value was read back.
        assert_eq!(g[0][2], "18");
    }

    #[test]
    fn test_untouched_error_cell_propagates() {
        let mut g = grid(&[&["1", "#DIV/0", "", "3"]]);
        let f = formulas(&[("0,1", "=A1/0"), ("0,2", "=B1+D1")]);
        let report = recalculate(&mut g, &f, Some(&BTreeSet::from([CellRef::new(0, 3)])));
        assert_eq!(report.order, vec![CellRef::new(0, 2)]);
        assert_eq!(g[0][2], "#DIV/0");
    }

    #[test]
    fn test_first_cause_error_is_preserved() {
        let mut g = grid(&[&["10", "0", "", "", ""]]);
        let f = formulas(&[("0,2", "=A1/B1"), ("0,3", "=C1+1"), ("0,4", "=D1*2")]);
        let report = recalculate(&mut g, &f, None);
        assert_eq!(g[0][2], "#DIV/0");
        assert_eq!(g[0][3], "#DIV/0");
        assert_eq!(g[0][4], "#DIV/0");
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn test_cycle_marks_both_cells() {
        let mut g = grid(&[&["", ""]]);
        let f = formulas(&[("0,0", "=B1"), ("0,1", "=A1")]);
        recalculate(&mut g, &f, Some(&BTreeSet::from([CellRef::new(0, 0)])));
        assert_eq!(g[0], vec!["#CYCLE", "#CYCLE"]);

        let mut g = grid(&[&["", ""]]);
        recalculate(&mut g, &f, None);
        assert_eq!(g[0], vec!["#CYCLE", "#CYCLE"]);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut g = grid(&[&[""]]);
        recalculate(&mut g, &formulas(&[("0,0", "=A1+1")]), None);
        assert_eq!(g[0][0], "#CYCLE");
    }

    #[test]
    fn test_validation_errors_short_circuit() {
        let mut g = grid(&[&["", "", "", ""]]);
        let f = formulas(&[("0,0", "=2+"), ("0,1", "=A1*2"), ("0,2", "=ZZZZ1"), ("0,3", "=C1")]);
        recalculate(&mut g, &f, None);
        assert_eq!(g[0], vec!["#ERROR", "#ERROR", "#REF", "#REF"]);
    }

    #[test]
    fn test_out_of_bounds_reference() {
        let mut g = grid(&[&["1", ""], &["2", ""]]);
        let f = formulas(&[("0,1", "=A3"), ("1,1", "=SUM(A1:A2)")]);
        recalculate(&mut g, &f, None);
        assert_eq!(g[0][1], "#REF");
        assert_eq!(g[1][1], "3");

        let mut g = grid(&[&["1", ""], &["2", ""]]);
        let options = RecalcOptions {
            enforce_bounds: false,
            ..Default::default()
        };
        recalculate_with(&mut g, &f, None, &options);
        assert_eq!(g[0][1], "0");
    }

    #[test]
    fn test_depth_limit() {
        // B1 -> B2 -> B3 -> B4 -> A11 <-> B11. Everything sits behind the cycle,
        // so nothing is topologically ordered and B1 resolves the whole chain.
        let mut f = formulas(&[
            ("0,1", "=B2"),
            ("1,1", "=B3"),
            ("2,1", "=B4"),
            ("3,1", "=A11"),
            ("10,0", "=B11"),
            ("10,1", "=A11"),
        ]);
        let blank = || -> Grid { (0..11).map(|_| vec![String::new(), String::new()]).collect() };

        let mut g = blank();
        let options = RecalcOptions {
            max_depth: 2,
            ..Default::default()
        };
        recalculate_with(&mut g, &f, None, &options);
        assert_eq!(g[0][1], "#ERROR");
        assert_eq!(g[10][0], "#CYCLE");

        let mut g = blank();
        recalculate(&mut g, &f, None);
        assert!((0..4).all(|r| g[r][1] == "#CYCLE"));
        assert_eq!(g[10][0], "#CYCLE");
        assert_eq!(g[10][1], "#CYCLE");

        // Breaking the cycle lets the whole chain evaluate.
        f.insert("10,1".into(), "=7".into());
        let mut g = blank();
        recalculate(&mut g, &f, None);
        assert!((0..4).all(|r| g[r][1] == "7"));
    }

    #[test]
    fn test_count_counts_formula_cells() {
        let mut g = grid(&[&["1", ""], &["", ""], &["x", ""], &["", ""]]);
        let f = formulas(&[("1,0", "=1/0"), ("3,1", "=COUNT(A1:A4)")]);
        recalculate(&mut g, &f, None);
        assert_eq!(g[1][0], "#DIV/0");
        assert_eq!(g[3][1], "3");
    }

    #[test]
    fn test_non_numeric_cells_read_as_zero() {
        let mut g = grid(&[&["abc", "  ", "2.5", ""]]);
        let f = formulas(&[("0,3", "=A1+B1+C1")]);
        recalculate(&mut g, &f, None);
        assert_eq!(g[0][3], "2.5");
    }

    #[test]
    fn test_malformed_keys_and_out_of_grid_formulas_are_skipped() {
        let mut g = grid(&[&["4", ""]]);
        let f = formulas(&[("nope", "=1"), ("9,9", "=A1"), ("0,1", "=A1+1")]);
        let report = recalculate(&mut g, &f, None);
        assert_eq!(g, grid(&[&["4", "5"]]));
        assert!(report.errors.is_empty());
    }
}

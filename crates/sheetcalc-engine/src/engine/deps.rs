//! Dependency extraction and the formula dependency graph.
//!
//! Parses formula text to find all cell references (e.g., `A1`, `SUM(B2:C5)`)
//! that the formula depends on, and builds forward/reverse edges over a whole
//! formula map. The graph is rebuilt from scratch for every recalculation
//! pass; nothing is maintained incrementally across edits.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::cell_ref::{CellRef, RangeRef, bare_ref_re};
use crate::builtins;

/// Ranges larger than this contribute no dependency edges.
const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Default bound on propagation hops and recursive resolution depth.
pub const MAX_DEPTH: usize = 20;

/// Extract all cells a formula reads.
///
/// Walks the text the same way the evaluator does: built-in range calls are
/// expanded first, then removed so their endpoints are not counted twice, then
/// the remaining bare references are collected. Malformed references are
/// skipped; the validator reports them.
pub fn extract_refs(formula: &str) -> BTreeSet<CellRef> {
    let body = super::eval::formula_body(formula);
    let mut refs = BTreeSet::new();

    let range_re = builtins::range_fn_re();
    for caps in range_re.captures_iter(body) {
        let (Ok(start), Ok(end)) = (CellRef::parse_a1(&caps[2]), CellRef::parse_a1(&caps[3]))
        else {
            continue;
        };
        let range = RangeRef::new(start, end);
        match range.len() {
            Some(n) if n <= MAX_DEPENDENCY_RANGE_CELLS => refs.extend(range.cells()),
            _ => continue,
        }
    }

    let reduced = range_re.replace_all(body, "0");
    for m in bare_ref_re().find_iter(&reduced) {
        if let Ok(cell) = CellRef::parse_a1(m.as_str()) {
            refs.insert(cell);
        }
    }

    refs
}

/// Tracks which formulas depend on which cells.
///
/// - `forward`: formula cell -> cells it reads
/// - `reverse`: cell -> formula cells that read it
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    forward: BTreeMap<CellRef, BTreeSet<CellRef>>,
    reverse: BTreeMap<CellRef, BTreeSet<CellRef>>,
    max_depth: usize,
}

impl DependencyGraph {
    /// Build the graph for every formula in `formulas`.
    pub fn build<'a, I>(formulas: I) -> Self
    where
        I: IntoIterator<Item = (CellRef, &'a str)>,
    {
        Self::build_with_depth(formulas, MAX_DEPTH)
    }

    /// Build the graph with a custom propagation bound.
    pub fn build_with_depth<'a, I>(formulas: I, max_depth: usize) -> Self
    where
        I: IntoIterator<Item = (CellRef, &'a str)>,
    {
        let mut graph = DependencyGraph {
            max_depth,
            ..Default::default()
        };
        for (cell, formula) in formulas {
            let refs = extract_refs(formula);
            for r in &refs {
                graph.reverse.entry(*r).or_default().insert(cell);
            }
            graph.forward.insert(cell, refs);
        }
        graph
    }

    pub fn is_formula(&self, cell: &CellRef) -> bool {
        self.forward.contains_key(cell)
    }

    /// Cells the formula at `cell` reads.
    pub fn precedents(&self, cell: &CellRef) -> impl Iterator<Item = &CellRef> + '_ {
        self.forward.get(cell).into_iter().flatten()
    }

    /// Formula cells that read `cell`.
    pub fn dependents(&self, cell: &CellRef) -> impl Iterator<Item = &CellRef> + '_ {
        self.reverse.get(cell).into_iter().flatten()
    }

    /// Formula cells needing recalculation after `changed` cells were edited,
    /// in dependency order.
    ///
    /// Breadth-first over reverse edges; propagation stops `max_depth` hops
    /// from the change set. Changed cells that are formulas themselves are
    /// included at depth zero.
    pub fn affected(&self, changed: &BTreeSet<CellRef>) -> Vec<CellRef> {
        let mut affected: BTreeSet<CellRef> = BTreeSet::new();
        let mut queue: VecDeque<(CellRef, usize)> = VecDeque::new();

        for cell in changed {
            if self.is_formula(cell) {
                affected.insert(*cell);
            }
            for dep in self.dependents(cell) {
                if affected.insert(*dep) {
                    queue.push_back((*dep, 1));
                }
            }
        }

        while let Some((cell, depth)) = queue.pop_front() {
            if depth >= self.max_depth {
                continue;
            }
            for dep in self.dependents(&cell) {
                if affected.insert(*dep) {
                    queue.push_back((*dep, depth + 1));
                }
            }
        }

        self.topo_sort(&affected)
    }

    /// Every formula cell in dependency order.
    pub fn topo_sort_all(&self) -> Vec<CellRef> {
        let all: BTreeSet<CellRef> = self.forward.keys().copied().collect();
        self.topo_sort(&all)
    }

    /// Kahn's algorithm restricted to `keys`.
    ///
    /// An edge `r -> k` exists when `k` reads `r` and both are in `keys`.
    /// Cells left with a non-zero in-degree sit on (or behind) a cycle; they are
    /// appended after everything that could be ordered.
    pub fn topo_sort(&self, keys: &BTreeSet<CellRef>) -> Vec<CellRef> {
        if keys.is_empty() {
            return Vec::new();
        }

        let mut in_degree: BTreeMap<CellRef, usize> = keys.iter().map(|k| (*k, 0)).collect();
        let mut adj: BTreeMap<CellRef, Vec<CellRef>> = BTreeMap::new();
        for k in keys {
            for r in self.precedents(k) {
                if keys.contains(r) {
                    adj.entry(*r).or_default().push(*k);
                    *in_degree.entry(*k).or_default() += 1;
                }
            }
        }

        let mut queue: VecDeque<CellRef> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(k, _)| *k)
            .collect();
        let mut result = Vec::with_capacity(keys.len());
        let mut placed: BTreeSet<CellRef> = BTreeSet::new();

        while let Some(node) = queue.pop_front() {
            result.push(node);
            placed.insert(node);
            for next in adj.get(&node).into_iter().flatten() {
                if let Some(d) = in_degree.get_mut(next) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }

        result.extend(keys.iter().filter(|k| !placed.contains(*k)));
        result
    }
}

//! Formula-key bookkeeping for structural edits.
//!
//! Rows and columns of the value grid get inserted, deleted, duplicated,
//! moved and sorted by the caller. The formula map is keyed by position, so
//! every such edit needs the same transform applied to its keys. These helpers
//! do exactly that and nothing else: formula text is never rewritten, only the
//! cell it lives in.

use std::collections::BTreeMap;

use log::warn;

use super::cell_ref::CellRef;
use super::recalc::FormulaMap;
use super::shift::shift_refs;

/// Axis of a structural edit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    /// The coordinate of `cell` along this axis.
    pub fn coord(&self, cell: CellRef) -> usize {
        match self {
            Axis::Row => cell.row,
            Axis::Column => cell.col,
        }
    }

    /// `cell` with its coordinate along this axis replaced.
    pub fn with_coord(&self, cell: CellRef, coord: usize) -> CellRef {
        match self {
            Axis::Row => CellRef::new(coord, cell.col),
            Axis::Column => CellRef::new(cell.row, coord),
        }
    }
}

/// Rebuild `formulas` with every key's axis coordinate passed through `map`.
/// Keys mapped to `None` are dropped.
fn remap<F>(formulas: &FormulaMap, axis: Axis, map: F) -> FormulaMap
where
    F: Fn(usize) -> Option<usize>,
{
    let mut out = BTreeMap::new();
    for (key, text) in formulas {
        let Some(cell) = CellRef::from_key(key) else {
            warn!("dropping formula with malformed key {:?}", key);
            continue;
        };
        if let Some(coord) = map(axis.coord(cell)) {
            out.insert(axis.with_coord(cell, coord).key(), text.clone());
        }
    }
    out
}

/// Keys at or after `at` move one step along `axis`.
pub fn insert_at(formulas: &FormulaMap, axis: Axis, at: usize) -> FormulaMap {
    remap(formulas, axis, |c| if c >= at { c.checked_add(1) } else { Some(c) })
}

/// Formulas at `at` are dropped; keys after it move back one step.
pub fn delete_at(formulas: &FormulaMap, axis: Axis, at: usize) -> FormulaMap {
    remap(formulas, axis, |c| match c.cmp(&at) {
        std::cmp::Ordering::Less => Some(c),
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(c - 1),
    })
}

/// Formulas at `at` are copied to `at + 1`; keys after `at` move one step.
pub fn duplicate_at(formulas: &FormulaMap, axis: Axis, at: usize) -> FormulaMap {
    let mut out = remap(formulas, axis, |c| if c > at { c.checked_add(1) } else { Some(c) });
    let copies: Vec<(String, String)> = out
        .iter()
        .filter_map(|(key, text)| {
            let cell = CellRef::from_key(key)?;
            let next = at.checked_add(1)?;
            (axis.coord(cell) == at).then(|| (axis.with_coord(cell, next).key(), text.clone()))
        })
        .collect();
    out.extend(copies);
    out
}

/// Move the line at `from` so it ends up at index `to`, the way
/// `Vec::remove(from)` followed by `Vec::insert(to, ..)` would.
pub fn move_to(formulas: &FormulaMap, axis: Axis, from: usize, to: usize) -> FormulaMap {
    remap(formulas, axis, |c| {
        Some(if c == from {
            to
        } else if from < to && c > from && c <= to {
            c - 1
        } else if to < from && c >= to && c < from {
            c + 1
        } else {
            c
        })
    })
}

/// Reorder keys along `axis` so that new position `i` holds what was at
/// `order[i]`. Coordinates past the end of `order` stay put; coordinates the
/// permutation does not mention are dropped.
pub fn apply_permutation(formulas: &FormulaMap, axis: Axis, order: &[usize]) -> FormulaMap {
    let mut new_of_old: BTreeMap<usize, usize> = BTreeMap::new();
    for (new, old) in order.iter().enumerate() {
        new_of_old.insert(*old, new);
    }
    let len = order.len();
    remap(formulas, axis, |c| {
        if c >= len {
            Some(c)
        } else {
            new_of_old.get(&c).copied()
        }
    })
}

/// Formula text for a paste `row_delta`/`col_delta` away from its source.
///
/// A shift that would push any reference off the sheet pastes the original
/// text unchanged.
pub fn paste_formula(formula: &str, row_delta: isize, col_delta: isize) -> String {
    shift_refs(formula, row_delta, col_delta)
}

use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::Sheet;
use crate::column::Column;
use crate::error::{Result, SheetError};
use sheetcalc_engine::engine::structure::{
    apply_permutation, delete_at, duplicate_at, insert_at, move_to, paste_formula,
};
use sheetcalc_engine::engine::{Axis, CellRef, FormulaMap, Grid, RecalcReport, parse_number};

/// One copied cell, positioned relative to the top-left of the copied region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipCell {
    pub row: usize,
    pub col: usize,
    /// Raw input: `=...` for a formula, otherwise a plain value
    pub input: String,
}

impl ClipCell {
    pub fn new(row: usize, col: usize, input: impl Into<String>) -> Self {
        ClipCell {
            row,
            col,
            input: input.into(),
        }
    }
}

fn is_formula(input: &str) -> bool {
    input.starts_with('=')
}

/// Move `items[from]` to index `to`.
fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

/// Sort key comparison: numbers before text, numbers numerically, text
/// case-insensitively. Blank cells are handled by the caller.
fn compare_values(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

impl Sheet {
    /// Apply a cell edit.
    ///
    /// Input starting with `=` becomes the cell's formula: the grid slot is
    /// cleared and the cell is recalculated along with everything reading it.
    /// Anything else must fit the column's type; it replaces any formula that
    /// was there.
    pub fn set_cell(&mut self, row: usize, col: usize, input: &str) -> Result<RecalcReport> {
        let cell = self.check_cell(row, col)?;
        self.normalise_rows();
        if is_formula(input) {
            self.formulas.insert(cell.key(), input.to_string());
            self.rows[row][col] = String::new();
        } else {
            self.columns[col].validate(input)?;
            self.formulas.remove(&cell.key());
            self.rows[row][col] = input.to_string();
        }
        self.modified = true;
        Ok(self.recalc(Some(&BTreeSet::from([cell]))))
    }

    /// What the user typed into a cell: its formula text, or its plain value.
    pub fn cell_input(&self, row: usize, col: usize) -> Option<String> {
        let cell = CellRef::new(row, col);
        if let Some(formula) = self.formulas.get(&cell.key()) {
            return Some(formula.clone());
        }
        self.value(row, col).map(str::to_string)
    }

    /// Apply the same key transform to the formula map and fully recalculate.
    fn finish_structural(&mut self, formulas: FormulaMap) -> RecalcReport {
        self.formulas = formulas;
        self.modified = true;
        self.recalc(None)
    }

    /// Insert an empty row above `at` (`at == row_count()` appends).
    pub fn insert_row(&mut self, at: usize) -> Result<RecalcReport> {
        if at > self.rows.len() {
            return Err(SheetError::OutOfBounds { row: at, col: 0 });
        }
        self.rows.insert(at, vec![String::new(); self.columns.len()]);
        let formulas = insert_at(&self.formulas, Axis::Row, at);
        Ok(self.finish_structural(formulas))
    }

    /// Delete row `at` together with any formulas on it.
    pub fn delete_row(&mut self, at: usize) -> Result<RecalcReport> {
        if at >= self.rows.len() {
            return Err(SheetError::OutOfBounds { row: at, col: 0 });
        }
        self.rows.remove(at);
        let formulas = delete_at(&self.formulas, Axis::Row, at);
        Ok(self.finish_structural(formulas))
    }

    /// Copy row `at` (values and formulas) into a new row directly below it.
    pub fn duplicate_row(&mut self, at: usize) -> Result<RecalcReport> {
        if at >= self.rows.len() {
            return Err(SheetError::OutOfBounds { row: at, col: 0 });
        }
        let copy = self.rows[at].clone();
        self.rows.insert(at + 1, copy);
        let formulas = duplicate_at(&self.formulas, Axis::Row, at);
        Ok(self.finish_structural(formulas))
    }

    /// Insert `column` before index `at` (`at == column_count()` appends).
    pub fn insert_column(&mut self, at: usize, column: Column) -> Result<RecalcReport> {
        if at > self.columns.len() {
            return Err(SheetError::OutOfBounds { row: 0, col: at });
        }
        self.normalise_rows();
        self.columns.insert(at, column);
        for row in &mut self.rows {
            row.insert(at, String::new());
        }
        let formulas = insert_at(&self.formulas, Axis::Column, at);
        Ok(self.finish_structural(formulas))
    }

    /// Delete column `at` together with any formulas in it.
    pub fn delete_column(&mut self, at: usize) -> Result<RecalcReport> {
        if at >= self.columns.len() {
            return Err(SheetError::OutOfBounds { row: 0, col: at });
        }
        self.normalise_rows();
        self.columns.remove(at);
        for row in &mut self.rows {
            row.remove(at);
        }
        let formulas = delete_at(&self.formulas, Axis::Column, at);
        Ok(self.finish_structural(formulas))
    }

    /// Move column `from` so it ends up at index `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<RecalcReport> {
        let len = self.columns.len();
        if from >= len || to >= len {
            return Err(SheetError::InvalidMove { from, to, len });
        }
        self.normalise_rows();
        move_item(&mut self.columns, from, to);
        for row in &mut self.rows {
            move_item(row, from, to);
        }
        let formulas = move_to(&self.formulas, Axis::Column, from, to);
        Ok(self.finish_structural(formulas))
    }

    /// Move row `from` so it ends up at index `to`.
    pub fn move_row(&mut self, from: usize, to: usize) -> Result<RecalcReport> {
        let len = self.rows.len();
        if from >= len || to >= len {
            return Err(SheetError::InvalidMove { from, to, len });
        }
        move_item(&mut self.rows, from, to);
        let formulas = move_to(&self.formulas, Axis::Row, from, to);
        Ok(self.finish_structural(formulas))
    }

    /// Stable sort of rows by the displayed values in column `col`.
    ///
    /// Blank cells always sort last, in either direction.
    pub fn sort_rows(&mut self, col: usize, ascending: bool) -> Result<RecalcReport> {
        if col >= self.columns.len() {
            return Err(SheetError::OutOfBounds { row: 0, col });
        }
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        let rows = &self.rows;
        let shown = |i: usize| rows[i].get(col).map(|s| s.trim()).unwrap_or("");
        order.sort_by(|&a, &b| {
            let (va, vb) = (shown(a), shown(b));
            match (va.is_empty(), vb.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) if ascending => compare_values(va, vb),
                (false, false) => compare_values(vb, va),
            }
        });

        let mut old_rows: Vec<Option<Vec<String>>> =
            std::mem::take(&mut self.rows).into_iter().map(Some).collect();
        let sorted: Grid = order
            .iter()
            .filter_map(|&old| old_rows[old].take())
            .collect();
        self.rows = sorted;

        debug!("sorted {} row(s) by column {}", order.len(), col);
        let formulas = apply_permutation(&self.formulas, Axis::Row, &order);
        Ok(self.finish_structural(formulas))
    }

    /// Paste copied cells with their top-left corner at `target`.
    ///
    /// `source_origin` is where the copied region's top-left corner was; the
    /// difference is the shift applied to pasted formula references. Plain
    /// values are checked against the destination column types first, and
    /// nothing is written unless every cell fits.
    pub fn paste(
        &mut self,
        target: CellRef,
        source_origin: CellRef,
        clipboard: &[ClipCell],
    ) -> Result<RecalcReport> {
        let row_delta = target.row as isize - source_origin.row as isize;
        let col_delta = target.col as isize - source_origin.col as isize;

        let mut prepared: Vec<(CellRef, String)> = Vec::with_capacity(clipboard.len());
        for clip in clipboard {
            let (Some(row), Some(col)) = (
                target.row.checked_add(clip.row),
                target.col.checked_add(clip.col),
            ) else {
                return Err(SheetError::OutOfBounds {
                    row: target.row.saturating_add(clip.row),
                    col: target.col.saturating_add(clip.col),
                });
            };
            let cell = self.check_cell(row, col)?;
            let input = if is_formula(&clip.input) {
                paste_formula(&clip.input, row_delta, col_delta)
            } else {
                self.columns[cell.col].validate(&clip.input)?;
                clip.input.clone()
            };
            prepared.push((cell, input));
        }

        if prepared.is_empty() {
            return Ok(RecalcReport::default());
        }

        self.normalise_rows();
        let mut changed = BTreeSet::new();
        for (cell, input) in prepared {
            if is_formula(&input) {
                self.formulas.insert(cell.key(), input);
                self.rows[cell.row][cell.col] = String::new();
            } else {
                self.formulas.remove(&cell.key());
                self.rows[cell.row][cell.col] = input;
            }
            changed.insert(cell);
        }
        self.modified = true;
        Ok(self.recalc(Some(&changed)))
    }

    /// Replace values and formulas wholesale (e.g. from an undo snapshot).
    pub fn restore(&mut self, rows: Grid, formulas: FormulaMap) -> RecalcReport {
        self.rows = rows;
        self.normalise_rows();
        self.finish_structural(formulas)
    }
}

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::column::Column;
use crate::error::{Result, SheetError};
use sheetcalc_engine::engine::{
    CellRef, FormulaMap, Grid, RecalcOptions, RecalcReport, recalculate_with,
};

/// A typed sheet: declared columns, a grid of display strings and the
/// formulas behind some of those cells.
///
/// Formula cells hold their last computed value (or error code) in `rows`;
/// the formula text itself lives in `formulas` under its `"row,col"` key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Grid,
    #[serde(default)]
    pub formulas: FormulaMap,
    /// Options for every recalculation this sheet runs
    #[serde(skip)]
    pub options: RecalcOptions,
    /// Whether the sheet changed since it was loaded or saved
    #[serde(skip)]
    pub modified: bool,
}

impl Sheet {
    /// Create an empty sheet with the given columns and no rows.
    pub fn new(columns: Vec<Column>) -> Self {
        Sheet {
            columns,
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: RecalcOptions) -> Self {
        self.options = options;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Displayed value of a cell.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Pad or truncate every row to the column count.
    pub(crate) fn normalise_rows(&mut self) {
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    pub(crate) fn check_cell(&self, row: usize, col: usize) -> Result<CellRef> {
        if row >= self.rows.len() || col >= self.columns.len() {
            return Err(SheetError::OutOfBounds { row, col });
        }
        Ok(CellRef::new(row, col))
    }

    /// Recalculate `changed` (or everything with `None`) using this sheet's options.
    pub(crate) fn recalc(&mut self, changed: Option<&BTreeSet<CellRef>>) -> RecalcReport {
        let report = recalculate_with(&mut self.rows, &self.formulas, changed, &self.options);
        if !report.errors.is_empty() {
            debug!("{} formula cell(s) hold errors", report.errors.len());
        }
        report
    }

    /// Recalculate every formula.
    pub fn recalculate_all(&mut self) -> RecalcReport {
        self.recalc(None)
    }
}

//! Error types for sheetcalc core.

use thiserror::Error;

use crate::column::ColumnType;

/// Errors that can occur while editing or persisting a sheet.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Cell ({row}, {col}) is outside the sheet")]
    OutOfBounds { row: usize, col: usize },

    #[error("Column {column:?} expects a {kind} value, got {value:?}")]
    InvalidValue {
        column: String,
        kind: ColumnType,
        value: String,
    },

    #[error("Cannot move from {from} to {to}: sheet has {len} entries")]
    InvalidMove { from: usize, to: usize, len: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SheetError>;

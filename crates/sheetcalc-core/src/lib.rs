//! sheetcalc-core - typed sheet document model over the formula engine.

pub mod column;
pub mod config;
pub mod document;
pub mod error;

pub use column::{Column, ColumnType};
pub use document::{ClipCell, Sheet};
pub use error::{Result, SheetError};

pub use sheetcalc_engine::engine::{CellRef, RecalcOptions, RecalcReport};

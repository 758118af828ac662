//! sheetcalc-engine - formula evaluation, dependency tracking and recalculation
//! for grid-of-strings spreadsheets.

pub(crate) mod builtins;
pub mod engine;

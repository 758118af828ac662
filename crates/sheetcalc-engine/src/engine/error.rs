//! Formula error types and the display codes written into cells.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::cell_ref::CellRef;

/// The closed set of error codes a formula cell can display.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    /// Malformed syntax, unsupported function, or propagation depth exceeded.
    Error,
    /// Division by zero.
    DivZero,
    /// Malformed or out-of-bounds reference.
    Ref,
    /// Circular dependency.
    Cycle,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Error => "#ERROR",
            ErrorCode::DivZero => "#DIV/0",
            ErrorCode::Ref => "#REF",
            ErrorCode::Cycle => "#CYCLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ();

    /// Read a code back out of a grid cell. Any other `#...` text maps to `#ERROR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "#DIV/0" => Ok(ErrorCode::DivZero),
            "#REF" => Ok(ErrorCode::Ref),
            "#CYCLE" => Ok(ErrorCode::Cycle),
            other if other.starts_with('#') => Ok(ErrorCode::Error),
            _ => Err(()),
        }
    }
}

/// Errors raised while parsing or evaluating a formula.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid reference: {0}")]
    InvalidRef(String),

    #[error("Circular reference at {0}")]
    Cycle(CellRef),

    #[error("Maximum evaluation depth {0} exceeded")]
    DepthExceeded(usize),

    /// An error already recorded for a referenced cell.
    #[error("Referenced cell holds {0}")]
    Propagated(ErrorCode),
}

impl FormulaError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FormulaError::Syntax(_) | FormulaError::DepthExceeded(_) => ErrorCode::Error,
            FormulaError::DivisionByZero => ErrorCode::DivZero,
            FormulaError::InvalidRef(_) => ErrorCode::Ref,
            FormulaError::Cycle(_) => ErrorCode::Cycle,
            FormulaError::Propagated(code) => *code,
        }
    }
}

pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

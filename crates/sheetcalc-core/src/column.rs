//! Column declarations and plain-value validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SheetError};

/// Declared type of a column. Formula cells are not checked against it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    Boolean,
    Date,
    #[default]
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Text => "text",
        }
    }

    /// Whether `value` is acceptable as a plain value. Empty is always fine.
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return true;
        }
        match self {
            ColumnType::Number => value.parse::<f64>().is_ok_and(f64::is_finite),
            ColumnType::Boolean => matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "yes" | "no" | "1" | "0"
            ),
            ColumnType::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            ColumnType::Text => true,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed column.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }

    /// Reject `value` if it does not fit this column's type.
    pub fn validate(&self, value: &str) -> Result<()> {
        if self.kind.accepts(value) {
            Ok(())
        } else {
            Err(SheetError::InvalidValue {
                column: self.name.clone(),
                kind: self.kind,
                value: value.to_string(),
            })
        }
    }
}

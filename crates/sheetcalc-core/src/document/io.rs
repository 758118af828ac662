use log::debug;
use std::path::Path;

use super::Sheet;
use crate::error::{Result, SheetError};

const MAX_SHEET_FILE_BYTES: u64 = 64 * 1_048_576; // 64 MiB

impl Sheet {
    /// Parse a sheet from its JSON form (`columns`, `rows`, `formulas`).
    ///
    /// Rows are padded to the column count. Stored values are trusted as the
    /// last computed results; nothing is recalculated.
    pub fn from_json(text: &str) -> Result<Sheet> {
        let mut sheet: Sheet = serde_json::from_str(text)?;
        sheet.normalise_rows();
        Ok(sheet)
    }

    /// Serialise the sheet as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a sheet from a JSON file.
    pub fn load_file(path: &Path) -> Result<Sheet> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_SHEET_FILE_BYTES {
            return Err(SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Refusing to read {}: sheet file too large ({} bytes, max {})",
                    path.display(),
                    meta.len(),
                    MAX_SHEET_FILE_BYTES
                ),
            )));
        }
        let sheet = Sheet::from_json(&std::fs::read_to_string(path)?)?;
        debug!(
            "loaded {} ({} rows, {} formulas)",
            path.display(),
            sheet.rows.len(),
            sheet.formulas.len()
        );
        Ok(sheet)
    }

    /// Write the sheet to a JSON file and clear the modified flag.
    pub fn save_file(&mut self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        self.modified = false;
        Ok(())
    }
}

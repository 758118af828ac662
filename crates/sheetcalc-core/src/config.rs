//! Recalculation options loaded from TOML.
//!
//! ```toml
//! max_depth = 20
//! enforce_bounds = true
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected.

use log::warn;
use std::path::Path;

use crate::error::{Result, SheetError};
use sheetcalc_engine::engine::RecalcOptions;

pub(crate) const MAX_CONFIG_FILE_BYTES: u64 = 65_536; // 64 KiB

/// Parse options from TOML text.
pub fn parse_options(text: &str) -> Result<RecalcOptions> {
    toml::from_str::<RecalcOptions>(text).map_err(|e| SheetError::Config(e.to_string()))
}

/// Read options from a TOML file.
pub fn load_options(path: &Path) -> Result<RecalcOptions> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        warn!("refusing oversized config file {}", path.display());
        return Err(SheetError::Config(format!(
            "Refusing to read {}: config file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        )));
    }
    let content = std::fs::read_to_string(path)?;
    parse_options(&content).inspect_err(|e| warn!("failed to parse {}: {}", path.display(), e))
}

//! JSON export for batch reports.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Writes `report` as pretty-printed JSON, creating missing parent
/// directories of `output_path`.
pub fn export_to_json<T: Serialize>(report: &T, output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(output_path, json)
        .context(format!("Failed to write JSON file: {}", output_path.display()))?;

    crate::log(&format!("Exported JSON to {}", output_path.display()));
    Ok(())
}

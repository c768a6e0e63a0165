use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use dcf_model_core::ParameterBundle;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Absolute path to an existing regular file.
fn existing_file(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let full = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if !full.is_file() {
        let reason = if full.exists() { "not a file" } else { "file not found" };
        return Err(format!("{}: {}", reason, full.display()).into());
    }
    Ok(full)
}

/// Resolve a workbook path and check it carries a spreadsheet extension.
pub fn workbook_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let full = existing_file(path)?;
    let ext = full
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        return Err(format!(
            "'{}' is not a workbook (expected one of: {})",
            full.display(),
            WORKBOOK_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(full)
}

/// Read a JSON parameter bundle previously written by `dcfm load`.
pub fn read_bundle(path: &str) -> Result<ParameterBundle, Box<dyn std::error::Error>> {
    let full = existing_file(path)?;
    let contents = fs::read_to_string(&full)
        .map_err(|e| format!("failed to read '{}': {}", full.display(), e))?;
    let bundle = parse_bundle(&contents)
        .map_err(|e| format!("failed to parse '{}': {}", full.display(), e))?;
    debug!(path = %full.display(), streams = bundle.drivers.streams.len(), "read parameter bundle");
    Ok(bundle)
}

/// Accepts either a bare bundle or the envelope printed by `dcfm load`,
/// whose bundle sits under `result.parameters`.
pub fn parse_bundle(contents: &str) -> Result<ParameterBundle, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    match value.pointer("/result/parameters") {
        Some(inner) => serde_json::from_value(inner.clone()),
        None => serde_json::from_value(value),
    }
}

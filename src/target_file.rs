//! Loading the target list.
//!
//! The file is plain text with one URL per line. Every non-empty line is a
//! target, trimmed and kept in order.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::errors::StartupError;

/// Reads the target list at `path`.
pub fn load_targets(path: impl AsRef<Path>) -> Result<Vec<String>, StartupError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| StartupError::TargetFile {
        path: path.to_path_buf(),
        source,
    })?;

    let targets = parse_targets(&content);
    info!(
        path = %path.display(),
        targets = targets.len(),
        "Loaded target list"
    );
    Ok(targets)
}

/// Splits file content into target addresses.
pub fn parse_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

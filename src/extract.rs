//! Extraction-dump loading.
//!
//! The pipeline's input is a JSON dump produced by an external PDF
//! extraction tool: an `elements` array of records carrying a `Path`
//! string plus optional `Page` and `Text` fields. This module is a thin
//! format layer; all structure recovery happens in [`crate::tree`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::Fragment;

#[derive(Debug, Deserialize)]
struct ExtractFile {
    #[serde(default)]
    elements: Vec<Fragment>,
}

/// Load extraction fragments from a dump file, preserving record order.
///
/// Unknown keys on each record are ignored; records missing `Page` or
/// `Text` are kept here and filtered by the tree builder.
pub fn load_extract(path: &Path) -> Result<Vec<Fragment>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read extract file: {}", path.display()))?;
    let parsed: ExtractFile =
        serde_json::from_str(&content).with_context(|| "Failed to parse extract file")?;

    tracing::debug!(
        fragments = parsed.elements.len(),
        file = %path.display(),
        "extract loaded"
    );
    Ok(parsed.elements)
}

//! Import command implementation.

use super::{format_size, parse_json, store_document};
use docpack_core::{Document, DocumentConfig};
use std::path::Path;
use tracing::debug;

/// Runs the import command: JSON file in, document file out.
pub fn run(input: &Path, output: &Path, max_depth: usize) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(input)
        .map_err(|e| format!("cannot read {}: {e}", input.display()))?;
    let value = parse_json(&text)?;
    let config = DocumentConfig::new().max_depth(max_depth);
    let doc = Document::make_document_with_config(&value, config)?;
    store_document(&doc, output)?;

    let stats = doc.stats();
    debug!(leaves = stats.leaf_count, buffer_len = stats.buffer_len, "imported document");
    println!(
        "Imported {} -> {} ({} leaves, {} buffer)",
        input.display(),
        output.display(),
        stats.leaf_count,
        format_size(stats.buffer_len)
    );
    Ok(())
}

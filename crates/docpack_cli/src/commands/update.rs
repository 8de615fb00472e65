//! Update command implementation.

use super::{format_size, load_document_with_config, read_json_arg, store_document};
use docpack_core::{DocumentConfig, FieldOutcome};
use std::path::Path;

/// Runs the update command: applies an update document, commits, and
/// writes the result back (or to `output`).
pub fn run(
    path: &Path,
    spec: &str,
    all_fields: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = read_json_arg(spec)?;
    let config = DocumentConfig::new().apply_all_fields(all_fields);
    let mut doc = load_document_with_config(path, config)?;

    let report = doc.update_with_report(&spec)?;
    for field in &report.fields {
        let marker = match field.outcome {
            FieldOutcome::Changed => '~',
            FieldOutcome::Unchanged => '=',
            FieldOutcome::Skipped { .. } => '!',
        };
        println!("  {marker} {} {}: {}", field.operator, field.path, field.outcome);
    }
    if report.stopped_early {
        println!("  (stopped after the first change; pass --all-fields to apply every field)");
    }

    let compaction = doc.commit()?;
    let target = output.unwrap_or(path);
    if report.changed || output.is_some() {
        store_document(&doc, target)?;
    }

    if report.changed {
        println!(
            "Updated {} ({} changed, {} reclaimed)",
            target.display(),
            report.changed_count(),
            format_size(compaction.bytes_reclaimed)
        );
    } else {
        println!("No changes");
    }
    Ok(())
}

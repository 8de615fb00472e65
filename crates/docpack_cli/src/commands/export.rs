//! Export command implementation.

use super::{load_document, render_json};
use std::path::Path;

/// Runs the export command: prints the whole document as JSON.
pub fn run(path: &Path, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(path)?;
    let value = doc.to_value()?;
    println!("{}", render_json(&value, pretty)?);
    Ok(())
}

//! Get command implementation.

use super::{load_document, render_json};
use std::path::Path;

/// Runs the get command: prints one field as JSON.
pub fn run(path: &Path, field: &str, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(path)?;
    match doc.get_value(field)? {
        Some(value) => {
            println!("{}", render_json(&value, pretty)?);
            Ok(())
        }
        None => Err(format!("field {field:?} not found").into()),
    }
}

//! CLI command implementations.

pub mod export;
pub mod get;
pub mod import;
pub mod inspect;
pub mod update;
pub mod verify;

use crate::convert;
use docpack_core::{deserialize_document_with_config, Document, DocumentConfig, Value};
use std::path::Path;

/// Reads and deserializes a document file.
pub(crate) fn load_document(path: &Path) -> Result<Document, Box<dyn std::error::Error>> {
    load_document_with_config(path, DocumentConfig::default())
}

/// Reads and deserializes a document file with a custom configuration.
pub(crate) fn load_document_with_config(
    path: &Path,
    config: DocumentConfig,
) -> Result<Document, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    Ok(deserialize_document_with_config(&bytes, config)?)
}

/// Serializes a document into a file.
pub(crate) fn store_document(doc: &Document, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = doc.serialize()?;
    std::fs::write(path, bytes).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    Ok(())
}

/// Parses JSON text into a document value.
pub(crate) fn parse_json(text: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(convert::from_json(&json)?)
}

/// Reads inline JSON, or the file named after a leading `@`.
pub(crate) fn read_json_arg(arg: &str) -> Result<Value, Box<dyn std::error::Error>> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
            parse_json(&text)
        }
        None => parse_json(arg),
    }
}

/// Renders a value as JSON text.
pub(crate) fn render_json(value: &Value, pretty: bool) -> Result<String, Box<dyn std::error::Error>> {
    let json = convert::to_json(value);
    Ok(if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    })
}

/// Human-readable byte count.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

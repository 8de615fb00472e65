//! Test fixtures and document helpers.
//!
//! Provides sample documents, an update document builder, and temporary
//! files for tests that go through the filesystem.

use docpack_codec::Value;
use docpack_core::{Document, DocumentConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small flat record.
pub fn person() -> Value {
    Value::map([
        ("name", Value::from("Alice")),
        ("age", Value::Unsigned(30)),
        ("balance", Value::Integer(-120)),
        ("rating", Value::Float(4.5)),
        ("active", Value::Bool(true)),
        ("nickname", Value::Null),
    ])
}

/// A nested record with arrays of dicts.
pub fn order() -> Value {
    Value::map([
        ("id", Value::from("ord-1001")),
        (
            "customer",
            Value::map([
                ("name", Value::from("Bob")),
                (
                    "address",
                    Value::map([("city", Value::from("Bergen")), ("zip", Value::from("5003"))]),
                ),
            ]),
        ),
        (
            "items",
            Value::Array(vec![
                Value::map([
                    ("sku", Value::from("A-1")),
                    ("qty", Value::Unsigned(2)),
                    ("price", Value::Float(9.99)),
                ]),
                Value::map([
                    ("sku", Value::from("B-7")),
                    ("qty", Value::Unsigned(1)),
                    ("price", Value::Float(24.5)),
                ]),
            ]),
        ),
        ("tags", Value::Array(vec![Value::from("gift"), Value::from("express")])),
        ("checksum", Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef])),
    ])
}

/// Builds a document from a fixture value.
pub fn document_from(value: &Value) -> Document {
    Document::make_document(value).expect("Failed to build fixture document")
}

/// Builds a document from a fixture value with `apply_all_fields` set.
pub fn all_fields_document_from(value: &Value) -> Document {
    Document::make_document_with_config(value, DocumentConfig::new().apply_all_fields(true))
        .expect("Failed to build fixture document")
}

/// Builder for update documents.
///
/// # Example
///
/// ```rust
/// use docpack_testkit::UpdateSpec;
/// use docpack_codec::Value;
///
/// let spec = UpdateSpec::new()
///     .set("name", Value::from("Bob"))
///     .inc("age", Value::Unsigned(1))
///     .build();
/// assert!(spec.get("$set").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct UpdateSpec {
    spec: Value,
}

impl UpdateSpec {
    /// Creates an empty update document.
    pub fn new() -> Self {
        Self {
            spec: Value::empty_map(),
        }
    }

    /// Adds `path → operand` under `operator`.
    pub fn field(mut self, operator: &str, path: &str, operand: Value) -> Self {
        if let Value::Map(blocks) = &mut self.spec {
            match blocks.iter_mut().find(|(op, _)| op == operator) {
                Some((_, block)) => {
                    block.set(path, operand);
                }
                None => blocks.push((operator.to_string(), Value::map([(path, operand)]))),
            }
        }
        self
    }

    /// Adds a `$set` field.
    pub fn set(self, path: &str, value: Value) -> Self {
        self.field("$set", path, value)
    }

    /// Adds an `$inc` field.
    pub fn inc(self, path: &str, by: Value) -> Self {
        self.field("$inc", path, by)
    }

    /// Adds an `$unset` field.
    pub fn unset(self, path: &str) -> Self {
        self.field("$unset", path, Value::Null)
    }

    /// The update document.
    pub fn build(self) -> Value {
        self.spec
    }
}

impl Default for UpdateSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// A temporary directory holding document files, removed on drop.
pub struct TempDocDir {
    dir: TempDir,
}

impl TempDocDir {
    /// Creates a new temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// The directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file in the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Serializes `doc` into `name` and returns the file path.
    pub fn write_document(&self, name: &str, doc: &Document) -> PathBuf {
        let path = self.file(name);
        let bytes = doc.serialize().expect("Failed to serialize document");
        std::fs::write(&path, bytes).expect("Failed to write document file");
        path
    }

    /// Writes text into `name` and returns the file path.
    pub fn write_text(&self, name: &str, text: &str) -> PathBuf {
        let path = self.file(name);
        std::fs::write(&path, text).expect("Failed to write file");
        path
    }

    /// Reads and deserializes the document stored in `name`.
    pub fn read_document(&self, name: &str) -> Document {
        let bytes = std::fs::read(self.file(name)).expect("Failed to read document file");
        Document::deserialize(&bytes).expect("Failed to deserialize document")
    }
}

impl Default for TempDocDir {
    fn default() -> Self {
        Self::new()
    }
}

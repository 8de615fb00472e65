//! # DocPack Core
//!
//! Packed semi-structured documents with in-place field updates.
//!
//! A [`Document`] keeps its shape and its values apart:
//!
//! - a [`Structure`] tree of dicts and arrays whose leaves are
//!   [`IndexNode`]s `(type, offset, size)`
//! - a value buffer holding every scalar as MessagePack, back to back
//!
//! Reading a field resolves its path to a leaf and decodes only that
//! leaf's bytes. Updating a field appends the new bytes and marks the old
//! span dead; [`Document::commit`] later removes the dead spans and shifts
//! every later offset down.
//!
//! ## Example
//!
//! ```rust
//! use docpack_core::Document;
//! use docpack_codec::Value;
//!
//! let mut doc = Document::make_document(&Value::map([
//!     ("name", Value::from("Alice")),
//!     ("visits", Value::Unsigned(1)),
//! ]))
//! .unwrap();
//!
//! let inc = Value::map([("$inc", Value::map([("visits", Value::Unsigned(1))]))]);
//! assert!(doc.update(&inc).unwrap());
//! doc.commit().unwrap();
//!
//! assert_eq!(doc.get_value("visits").unwrap(), Some(Value::Unsigned(2)));
//! let restored = docpack_core::Document::deserialize(&doc.serialize().unwrap()).unwrap();
//! assert_eq!(restored, doc);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod compaction;
mod config;
mod document;
mod error;
pub mod path;
mod ranges;
mod stats;
pub mod structure;
pub mod update;
mod wire;

pub use compaction::{CompactionResult, Compactor};
pub use config::{DocumentConfig, DEFAULT_MAX_DEPTH, DEFAULT_PATH_SEPARATOR};
pub use document::Document;
pub use error::{CoreError, CoreResult};
pub use path::looks_like_array_index;
pub use ranges::{DataRange, DataRanges};
pub use stats::DocumentStats;
pub use structure::{IndexNode, Node, NodeId, NodeKind, Structure};
pub use update::{FieldOutcome, FieldReport, SkipReason, UpdateOperator, UpdateReport};
pub use wire::{deserialize_document, deserialize_document_with_config, serialize_document};

// Re-export the value type so callers need only one import.
pub use docpack_codec::{Value, WireType};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

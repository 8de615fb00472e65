//! Fuzz testing harnesses for DocPack.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use crate::invariants::{check_committed, check_invariants};
use docpack_codec::{from_msgpack, to_msgpack, Value};
use docpack_core::{Document, DocumentConfig};

/// Fuzz target for MessagePack decoding.
///
/// Tests that arbitrary byte sequences either:
/// - Decode successfully to a valid Value, or
/// - Return a proper error (no panics)
pub fn fuzz_msgpack_decode(data: &[u8]) {
    let _ = from_msgpack(data);
}

/// Fuzz target for MessagePack roundtrip.
///
/// Anything that decodes must re-encode and decode to the same value.
pub fn fuzz_msgpack_roundtrip(data: &[u8]) {
    if let Ok(value) = from_msgpack(data) {
        if let Ok(encoded) = to_msgpack(&value) {
            let decoded = from_msgpack(&encoded).expect("re-encoded value must decode");
            assert_eq!(
                format!("{value:?}"),
                format!("{decoded:?}"),
                "Roundtrip mismatch"
            );
        }
    }
}

/// Fuzz target for document deserialization.
///
/// Anything that deserializes must satisfy the committed-document
/// invariants and serialize back to the same bytes.
pub fn fuzz_document_decode(data: &[u8]) {
    if let Ok(doc) = Document::deserialize(data) {
        let _ = doc.to_value();
        if let Ok(bytes) = doc.serialize() {
            let again = Document::deserialize(&bytes).expect("serialized document must decode");
            assert_eq!(again, doc, "document roundtrip mismatch");
        }
    }
}

/// Structured fuzzing input for document updates.
#[derive(Debug, Clone)]
pub enum FuzzOp {
    /// `$set` a small value.
    Set {
        /// Field path.
        path: String,
        /// New value.
        value: Value,
    },
    /// `$inc` by a small amount.
    Inc {
        /// Field path.
        path: String,
        /// Increment.
        by: i64,
    },
    /// `$unset`.
    Unset {
        /// Field path.
        path: String,
    },
    /// Commit pending dead ranges.
    Commit,
    /// Roll back pending dead ranges.
    Rollback,
}

const SEGMENTS: [&str; 6] = ["a", "b", "c", "0", "1", "items"];

impl FuzzOp {
    /// Parse operations from fuzzer input.
    pub fn parse_sequence(data: &[u8]) -> Vec<FuzzOp> {
        let mut ops = Vec::new();
        let mut offset = 0;

        while offset + 2 < data.len() {
            let op_type = data[offset];
            let path = Self::parse_path(data[offset + 1]);
            let arg = data[offset + 2];
            offset += 3;

            let op = match op_type % 5 {
                0 => FuzzOp::Set {
                    path,
                    value: match arg % 4 {
                        0 => Value::Unsigned(u64::from(arg)),
                        1 => Value::Integer(-i64::from(arg)),
                        2 => Value::Text("x".repeat(usize::from(arg % 16))),
                        _ => Value::map([("k", Value::Bool(arg % 2 == 0))]),
                    },
                },
                1 => FuzzOp::Inc {
                    path,
                    by: i64::from(arg as i8),
                },
                2 => FuzzOp::Unset { path },
                3 => FuzzOp::Commit,
                _ => FuzzOp::Rollback,
            };
            ops.push(op);
        }

        ops
    }

    /// One to three segments picked from a small alphabet, so paths
    /// collide often.
    fn parse_path(byte: u8) -> String {
        let depth = usize::from(byte % 3) + 1;
        (0..depth)
            .map(|i| SEGMENTS[usize::from(byte >> (i * 2)) % SEGMENTS.len()])
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The update document for a field operation.
    pub fn to_spec(&self) -> Option<Value> {
        let (operator, path, operand) = match self {
            FuzzOp::Set { path, value } => ("$set", path, value.clone()),
            FuzzOp::Inc { path, by } => ("$inc", path, Value::Integer(*by)),
            FuzzOp::Unset { path } => ("$unset", path, Value::Null),
            FuzzOp::Commit | FuzzOp::Rollback => return None,
        };
        Some(Value::map([(operator, Value::map([(path.clone(), operand)]))]))
    }

    /// Execute a sequence of operations, checking invariants after each.
    pub fn execute_sequence(ops: &[FuzzOp], doc: &mut Document) {
        for op in ops {
            match op {
                FuzzOp::Commit => {
                    doc.commit().expect("commit must succeed on a consistent document");
                    check_committed(doc).expect("committed invariants");
                }
                FuzzOp::Rollback => {
                    doc.rollback();
                }
                field_op => {
                    if let Some(spec) = field_op.to_spec() {
                        doc.update(&spec).expect("well-formed update must apply");
                    }
                }
            }
            check_invariants(doc).expect("document invariants");
        }
    }
}

/// Fuzz target for update sequences.
///
/// Tests that arbitrary update/commit/rollback sequences keep the document
/// consistent.
pub fn fuzz_update_sequence(data: &[u8]) {
    let ops = FuzzOp::parse_sequence(data);
    let config = DocumentConfig::new().apply_all_fields(true);
    let mut doc = Document::with_config(config);
    FuzzOp::execute_sequence(&ops, &mut doc);
    doc.commit().expect("final commit");
    check_committed(&doc).expect("final committed invariants");
}

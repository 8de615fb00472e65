//! Test vectors for the DocPack wire formats.
//!
//! Vectors are plain data so they can be exported as JSON and checked by
//! any other reader of the format.

use docpack_codec::CodecError;
use docpack_core::CoreError;
use serde::{Deserialize, Serialize};

/// A wire-format test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Input data (hex-encoded).
    pub input_hex: String,
    /// Expected output data (hex-encoded).
    pub expected_hex: String,
    /// Expected error code (if this should fail).
    pub expected_error: Option<String>,
}

fn ok(id: &str, description: &str, input_hex: &str, expected_hex: &str) -> TestVector {
    TestVector {
        id: id.into(),
        description: description.into(),
        input_hex: input_hex.into(),
        expected_hex: expected_hex.into(),
        expected_error: None,
    }
}

fn err(id: &str, description: &str, input_hex: &str, code: &str) -> TestVector {
    TestVector {
        id: id.into(),
        description: description.into(),
        input_hex: input_hex.into(),
        expected_hex: String::new(),
        expected_error: Some(code.into()),
    }
}

/// Scalar codec vectors: decoding `input_hex` and re-encoding the value
/// yields `expected_hex`.
pub fn msgpack_vectors() -> Vec<TestVector> {
    vec![
        ok("nil", "nil", "c0", "c0"),
        ok("true", "true", "c3", "c3"),
        ok("false", "false", "c2", "c2"),
        ok("uint_0", "positive fixint 0", "00", "00"),
        ok("uint_127", "largest positive fixint", "7f", "7f"),
        ok("uint_128", "smallest uint8", "cc80", "cc80"),
        ok("uint_256", "smallest uint16", "cd0100", "cd0100"),
        ok("uint8_small", "uint8 holding a fixint value shrinks", "cc05", "05"),
        ok("int8_positive", "non-negative signed stays signed", "d005", "d005"),
        ok("int_neg_1", "negative fixint -1", "ff", "ff"),
        ok("int_neg_33", "smallest int8 outside fixint", "d0df", "d0df"),
        ok("int_neg_200", "int16 -200", "d1ff38", "d1ff38"),
        ok("float32_widens", "float32 re-encodes as float64", "ca3fc00000", "cb3ff8000000000000"),
        ok("float64", "float64 1.5", "cb3ff8000000000000", "cb3ff8000000000000"),
        ok("fixstr", "fixstr \"a\"", "a161", "a161"),
        ok("str8_small", "str8 holding a short string shrinks", "d90161", "a161"),
        ok("bin8", "bin8 [1, 2]", "c4020102", "c4020102"),
        ok("fixarray", "fixarray [1, -1]", "9201ff", "9201ff"),
        ok("fixmap", "fixmap {\"a\": 1}", "81a16101", "81a16101"),
        err("never_used", "reserved marker 0xc1", "c1", "invalid_structure"),
        err("truncated", "uint16 missing a byte", "cd01", "unexpected_eof"),
        err("ext", "fixext1 is not supported", "d40100", "unsupported_type"),
        err("int_key", "map with an integer key", "810101", "unsupported_type"),
        err("trailing", "two values where one is expected", "c0c0", "trailing_bytes"),
    ]
}

/// Serialized document vectors: `input_hex` must deserialize and
/// serialize back to `expected_hex`, or fail with `expected_error`.
pub fn document_vectors() -> Vec<TestVector> {
    vec![
        ok("empty_dict", "empty document", "92c40080", "92c40080"),
        ok(
            "single_unsigned",
            "{\"a\": 1}",
            "92c4010181a16193020001",
            "92c4010181a16193020001",
        ),
        ok(
            "array_root",
            "[\"x\"]",
            "92c402a1789193050002",
            "92c402a1789193050002",
        ),
        ok(
            "versioned_leaf",
            "leaf with a version slot",
            "92c4010181a1769402000107",
            "92c4010181a1769402000107",
        ),
        err(
            "leaf_out_of_bounds",
            "leaf size runs past the buffer",
            "92c4010181a16193020005",
            "invalid_format",
        ),
        err(
            "leaf_root",
            "root is a leaf",
            "92c4010193020001",
            "invalid_format",
        ),
        err(
            "shared_bytes",
            "two leaves over the same byte",
            "92c4010182a16193020001a16293020001",
            "invalid_format",
        ),
        err("not_a_pair", "one top-level element", "91c400", "invalid_format"),
    ]
}

/// Stable code for a codec error.
pub fn codec_error_code(error: &CodecError) -> &'static str {
    match error {
        CodecError::EncodingFailed { .. } => "encoding_failed",
        CodecError::InvalidUtf8 => "invalid_utf8",
        CodecError::UnexpectedEof => "unexpected_eof",
        CodecError::TrailingBytes { .. } => "trailing_bytes",
        CodecError::InvalidStructure { .. } => "invalid_structure",
        CodecError::UnsupportedType { .. } => "unsupported_type",
        CodecError::SizeLimitExceeded { .. } => "size_limit_exceeded",
        CodecError::DepthLimitExceeded { .. } => "depth_limit_exceeded",
    }
}

/// Stable code for a core error.
pub fn core_error_code(error: &CoreError) -> &'static str {
    match error {
        CoreError::Codec(inner) => codec_error_code(inner),
        CoreError::Corruption { .. } => "corruption",
        CoreError::InvalidFormat { .. } => "invalid_format",
        CoreError::InvalidInput { .. } => "invalid_input",
        CoreError::InvalidUpdate { .. } => "invalid_update",
        CoreError::InvalidOperation { .. } => "invalid_operation",
    }
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes lowercase or uppercase hex. Panics on malformed input.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "odd-length hex string");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

/// Exports all vectors as JSON.
pub fn all_vectors_json() -> String {
    #[derive(Serialize)]
    struct AllVectors {
        msgpack: Vec<TestVector>,
        document: Vec<TestVector>,
    }

    let vectors = AllVectors {
        msgpack: msgpack_vectors(),
        document: document_vectors(),
    };
    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpack_codec::{from_msgpack, to_msgpack};
    use docpack_core::Document;

    #[test]
    fn test_msgpack_vectors() {
        for vector in msgpack_vectors() {
            let input = hex_decode(&vector.input_hex);
            match (from_msgpack(&input), &vector.expected_error) {
                (Ok(value), None) => {
                    let encoded = to_msgpack(&value).unwrap();
                    assert_eq!(hex_encode(&encoded), vector.expected_hex, "{}", vector.id);
                }
                (Err(e), Some(code)) => assert_eq!(codec_error_code(&e), code.as_str(), "{}", vector.id),
                (result, expected) => {
                    panic!("{}: got {result:?}, expected {expected:?}", vector.id)
                }
            }
        }
    }

    #[test]
    fn test_document_vectors() {
        for vector in document_vectors() {
            let input = hex_decode(&vector.input_hex);
            match (Document::deserialize(&input), &vector.expected_error) {
                (Ok(doc), None) => {
                    let encoded = doc.serialize().unwrap();
                    assert_eq!(hex_encode(&encoded), vector.expected_hex, "{}", vector.id);
                }
                (Err(e), Some(code)) => assert_eq!(core_error_code(&e), code.as_str(), "{}", vector.id),
                (Ok(_), Some(code)) => panic!("{}: decoded, expected {code}", vector.id),
                (Err(e), None) => panic!("{}: {e}", vector.id),
            }
        }
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(hex_encode(&[0x00, 0xab, 0xff]), "00abff");
        assert_eq!(hex_decode("00ABff"), vec![0x00, 0xab, 0xff]);
    }

    #[test]
    fn test_all_vectors_json() {
        let json = all_vectors_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["msgpack"].as_array().unwrap().len() >= 20);
        assert!(parsed["document"].as_array().unwrap().len() >= 5);
    }
}

//! # DocPack Codec
//!
//! MessagePack scalar codec for DocPack.
//!
//! Documents keep every scalar in a packed value buffer; this crate turns
//! single values into bytes and back. It is also used for the container
//! encoding of the serialized `(buffer, structure)` pair.
//!
//! ## Width classes
//!
//! The encoder keeps the four numeric/text classes that `$inc` relies on
//! distinguishable after a round trip:
//!
//! - Unsigned integers use positive fixint and uint8..uint64
//! - Signed integers use negative fixint and int8..int64
//! - Floats use float64
//! - Strings use fixstr and str8..str32
//!
//! ## Usage
//!
//! ```
//! use docpack_codec::{from_msgpack, to_msgpack, Value};
//!
//! let value = Value::Integer(42);
//! let bytes = to_msgpack(&value).unwrap();
//!
//! let decoded = from_msgpack(&bytes).unwrap();
//! assert_eq!(value, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;
mod wire_type;

pub use decoder::{from_msgpack, from_msgpack_with_max_depth, MsgpackDecoder, DEFAULT_MAX_DEPTH};
pub use encoder::{to_msgpack, MsgpackEncoder};
pub use error::{CodecError, CodecResult};
pub use value::Value;
pub use wire_type::WireType;

/// Trait for types that can be encoded to MessagePack.
pub trait Encode {
    /// Encode this value to MessagePack bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from MessagePack.
pub trait Decode: Sized {
    /// Decode this value from MessagePack bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for Value {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_msgpack(self)
    }
}

impl Decode for Value {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_msgpack(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roundtrip_nested() {
        let value = Value::map([
            (
                "users",
                Value::Array(vec![
                    Value::map([("name", Value::from("Alice")), ("age", Value::Unsigned(30))]),
                    Value::map([("name", Value::from("Bob")), ("delta", Value::Integer(-5))]),
                ]),
            ),
            ("ratio", Value::Float(0.25)),
            ("blob", Value::Bytes(vec![0, 1, 2])),
            ("none", Value::Null),
        ]);
        let bytes = value.encode().unwrap();
        assert_eq!(Value::decode(&bytes).unwrap(), value);
    }

    proptest! {
        #[test]
        fn signed_values_stay_signed(n in any::<i64>()) {
            let decoded = from_msgpack(&to_msgpack(&Value::Integer(n)).unwrap()).unwrap();
            prop_assert_eq!(decoded, Value::Integer(n));
        }

        #[test]
        fn unsigned_values_stay_unsigned(n in any::<u64>()) {
            let decoded = from_msgpack(&to_msgpack(&Value::Unsigned(n)).unwrap()).unwrap();
            prop_assert_eq!(decoded, Value::Unsigned(n));
        }

        #[test]
        fn text_lengths_roundtrip(s in ".{0,300}") {
            let value = Value::Text(s);
            let decoded = from_msgpack(&to_msgpack(&value).unwrap()).unwrap();
            prop_assert_eq!(decoded, value);
        }
    }
}

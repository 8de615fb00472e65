//! MessagePack encoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Encode a value to MessagePack bytes.
///
/// The output uses the shortest form within each width class:
/// - Unsigned integers use positive fixint or uint8..uint64
/// - Signed integers use negative fixint or int8..int64, never positive
///   fixint, so they decode back as signed
/// - Floats always use float64
/// - Map entries are written in the map's own order
///
/// # Errors
///
/// Returns an error if a string, byte string or container is longer than
/// MessagePack can express (`u32::MAX`).
pub fn to_msgpack(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = MsgpackEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// A MessagePack encoder writing into an owned buffer.
pub struct MsgpackEncoder {
    buffer: Vec<u8>,
}

impl MsgpackEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => {
                self.buffer.push(0xc0);
                Ok(())
            }
            Value::Bool(b) => {
                self.buffer.push(if *b { 0xc3 } else { 0xc2 });
                Ok(())
            }
            Value::Unsigned(n) => {
                self.encode_unsigned(*n);
                Ok(())
            }
            Value::Integer(n) => {
                self.encode_signed(*n);
                Ok(())
            }
            Value::Float(f) => {
                self.buffer.push(0xcb);
                self.buffer.extend_from_slice(&f.to_bits().to_be_bytes());
                Ok(())
            }
            Value::Text(s) => self.encode_text(s),
            Value::Bytes(b) => self.encode_bytes(b),
            Value::Array(arr) => self.encode_array(arr),
            Value::Map(pairs) => self.encode_map(pairs),
        }
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_unsigned(&mut self, n: u64) {
        if n < 0x80 {
            self.buffer.push(n as u8);
        } else if let Ok(v) = u8::try_from(n) {
            self.buffer.push(0xcc);
            self.buffer.push(v);
        } else if let Ok(v) = u16::try_from(n) {
            self.buffer.push(0xcd);
            self.buffer.extend_from_slice(&v.to_be_bytes());
        } else if let Ok(v) = u32::try_from(n) {
            self.buffer.push(0xce);
            self.buffer.extend_from_slice(&v.to_be_bytes());
        } else {
            self.buffer.push(0xcf);
            self.buffer.extend_from_slice(&n.to_be_bytes());
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn encode_signed(&mut self, n: i64) {
        if (-32..0).contains(&n) {
            // negative fixint: 0xe0..=0xff is the two's complement byte
            self.buffer.push(n as i8 as u8);
        } else if let Ok(v) = i8::try_from(n) {
            self.buffer.push(0xd0);
            self.buffer.push(v as u8);
        } else if let Ok(v) = i16::try_from(n) {
            self.buffer.push(0xd1);
            self.buffer.extend_from_slice(&v.to_be_bytes());
        } else if let Ok(v) = i32::try_from(n) {
            self.buffer.push(0xd2);
            self.buffer.extend_from_slice(&v.to_be_bytes());
        } else {
            self.buffer.push(0xd3);
            self.buffer.extend_from_slice(&n.to_be_bytes());
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_text(&mut self, text: &str) -> CodecResult<()> {
        let len = checked_len(text.len(), "string")?;
        if len < 32 {
            self.buffer.push(0xa0 | len as u8);
        } else if let Ok(v) = u8::try_from(len) {
            self.buffer.push(0xd9);
            self.buffer.push(v);
        } else if let Ok(v) = u16::try_from(len) {
            self.buffer.push(0xda);
            self.buffer.extend_from_slice(&v.to_be_bytes());
        } else {
            self.buffer.push(0xdb);
            self.buffer.extend_from_slice(&len.to_be_bytes());
        }
        self.buffer.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn encode_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let len = checked_len(bytes.len(), "byte string")?;
        if let Ok(v) = u8::try_from(len) {
            self.buffer.push(0xc4);
            self.buffer.push(v);
        } else if let Ok(v) = u16::try_from(len) {
            self.buffer.push(0xc5);
            self.buffer.extend_from_slice(&v.to_be_bytes());
        } else {
            self.buffer.push(0xc6);
            self.buffer.extend_from_slice(&len.to_be_bytes());
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_array(&mut self, arr: &[Value]) -> CodecResult<()> {
        let len = checked_len(arr.len(), "array")?;
        if len < 16 {
            self.buffer.push(0x90 | len as u8);
        } else if let Ok(v) = u16::try_from(len) {
            self.buffer.push(0xdc);
            self.buffer.extend_from_slice(&v.to_be_bytes());
        } else {
            self.buffer.push(0xdd);
            self.buffer.extend_from_slice(&len.to_be_bytes());
        }
        for item in arr {
            self.encode(item)?;
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_map(&mut self, pairs: &[(String, Value)]) -> CodecResult<()> {
        let len = checked_len(pairs.len(), "map")?;
        if len < 16 {
            self.buffer.push(0x80 | len as u8);
        } else if let Ok(v) = u16::try_from(len) {
            self.buffer.push(0xde);
            self.buffer.extend_from_slice(&v.to_be_bytes());
        } else {
            self.buffer.push(0xdf);
            self.buffer.extend_from_slice(&len.to_be_bytes());
        }
        for (key, value) in pairs {
            self.encode_text(key)?;
            self.encode(value)?;
        }
        Ok(())
    }
}

impl Default for MsgpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_len(len: usize, what: &str) -> CodecResult<u32> {
    u32::try_from(len)
        .map_err(|_| CodecError::encoding_failed(format!("{what} of length {len} is too long")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_nil_and_bool() {
        assert_eq!(to_msgpack(&Value::Null).unwrap(), vec![0xc0]);
        assert_eq!(to_msgpack(&Value::Bool(false)).unwrap(), vec![0xc2]);
        assert_eq!(to_msgpack(&Value::Bool(true)).unwrap(), vec![0xc3]);
    }

    #[test]
    fn encode_unsigned_widths() {
        assert_eq!(to_msgpack(&Value::Unsigned(0)).unwrap(), vec![0x00]);
        assert_eq!(to_msgpack(&Value::Unsigned(127)).unwrap(), vec![0x7f]);
        assert_eq!(to_msgpack(&Value::Unsigned(128)).unwrap(), vec![0xcc, 0x80]);
        assert_eq!(
            to_msgpack(&Value::Unsigned(256)).unwrap(),
            vec![0xcd, 0x01, 0x00]
        );
        assert_eq!(
            to_msgpack(&Value::Unsigned(65536)).unwrap(),
            vec![0xce, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(
            to_msgpack(&Value::Unsigned(u64::MAX)).unwrap(),
            vec![0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn encode_signed_widths() {
        assert_eq!(to_msgpack(&Value::Integer(-1)).unwrap(), vec![0xff]);
        assert_eq!(to_msgpack(&Value::Integer(-32)).unwrap(), vec![0xe0]);
        assert_eq!(to_msgpack(&Value::Integer(-33)).unwrap(), vec![0xd0, 0xdf]);
        assert_eq!(
            to_msgpack(&Value::Integer(-200)).unwrap(),
            vec![0xd1, 0xff, 0x38]
        );
        assert_eq!(
            to_msgpack(&Value::Integer(i64::MIN)).unwrap(),
            vec![0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn non_negative_signed_stays_signed() {
        // positive fixint would decode as unsigned
        assert_eq!(to_msgpack(&Value::Integer(0)).unwrap(), vec![0xd0, 0x00]);
        assert_eq!(to_msgpack(&Value::Integer(5)).unwrap(), vec![0xd0, 0x05]);
        assert_eq!(
            to_msgpack(&Value::Integer(300)).unwrap(),
            vec![0xd1, 0x01, 0x2c]
        );
    }

    #[test]
    fn encode_float() {
        assert_eq!(
            to_msgpack(&Value::Float(1.0)).unwrap(),
            vec![0xcb, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn encode_text() {
        assert_eq!(to_msgpack(&Value::from("")).unwrap(), vec![0xa0]);
        assert_eq!(
            to_msgpack(&Value::from("hi")).unwrap(),
            vec![0xa2, b'h', b'i']
        );
        let long = "x".repeat(40);
        let bytes = to_msgpack(&Value::from(long.as_str())).unwrap();
        assert_eq!(&bytes[..2], &[0xd9, 40]);
        assert_eq!(bytes.len(), 42);
    }

    #[test]
    fn encode_bytes() {
        assert_eq!(
            to_msgpack(&Value::Bytes(vec![1, 2, 3])).unwrap(),
            vec![0xc4, 3, 1, 2, 3]
        );
        let bytes = to_msgpack(&Value::Bytes(vec![0; 300])).unwrap();
        assert_eq!(&bytes[..3], &[0xc5, 0x01, 0x2c]);
    }

    #[test]
    fn encode_containers() {
        assert_eq!(to_msgpack(&Value::Array(vec![])).unwrap(), vec![0x90]);
        assert_eq!(
            to_msgpack(&Value::Array(vec![Value::Unsigned(1), Value::Unsigned(2)])).unwrap(),
            vec![0x92, 0x01, 0x02]
        );
        let map = Value::map([("b", Value::Unsigned(2)), ("a", Value::Unsigned(1))]);
        assert_eq!(
            to_msgpack(&map).unwrap(),
            vec![0x82, 0xa1, b'b', 0x02, 0xa1, b'a', 0x01]
        );
    }

    #[test]
    fn encode_array16_header() {
        let arr = Value::Array(vec![Value::Null; 16]);
        let bytes = to_msgpack(&arr).unwrap();
        assert_eq!(&bytes[..3], &[0xdc, 0x00, 0x10]);
        assert_eq!(bytes.len(), 3 + 16);
    }
}

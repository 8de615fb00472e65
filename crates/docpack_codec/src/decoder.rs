//! MessagePack decoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Decode exactly one value from MessagePack bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid MessagePack, use a type
/// DocPack does not model (extension types, non-string map keys), or
/// carry trailing bytes after the value.
pub fn from_msgpack(bytes: &[u8]) -> CodecResult<Value> {
    from_msgpack_with_max_depth(bytes, DEFAULT_MAX_DEPTH)
}

/// Decode exactly one value, accepting at most `max_depth` nested
/// containers.
///
/// # Errors
///
/// As [`from_msgpack`], plus [`CodecError::DepthLimitExceeded`] when the
/// input nests deeper than `max_depth`.
pub fn from_msgpack_with_max_depth(bytes: &[u8], max_depth: usize) -> CodecResult<Value> {
    let mut decoder = MsgpackDecoder::with_max_depth(bytes, max_depth);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: decoder.remaining().len(),
        });
    }
    Ok(value)
}

/// A MessagePack decoder over a borrowed byte slice.
pub struct MsgpackDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

/// Container nesting accepted by [`from_msgpack`] and
/// [`MsgpackDecoder::new`].
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Maximum allowed element count for arrays and maps.
/// This prevents allocation-based DoS from untrusted input.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Maximum allowed byte/string length.
const MAX_BYTES_LENGTH: u64 = 256 * 1024 * 1024;

impl<'a> MsgpackDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    /// Create a decoder that rejects more than `max_depth` nested
    /// containers.
    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Decode the next value.
    #[allow(clippy::cast_possible_wrap)]
    pub fn decode(&mut self) -> CodecResult<Value> {
        let marker = self.read_byte()?;

        match marker {
            0x00..=0x7f => Ok(Value::Unsigned(u64::from(marker))),
            0x80..=0x8f => self.decode_map(u64::from(marker & 0x0f)),
            0x90..=0x9f => self.decode_array(u64::from(marker & 0x0f)),
            0xa0..=0xbf => self.decode_text(u64::from(marker & 0x1f)),
            0xc0 => Ok(Value::Null),
            0xc2 => Ok(Value::Bool(false)),
            0xc3 => Ok(Value::Bool(true)),
            0xc4 => {
                let len = self.read_uint(1)?;
                self.decode_bin(len)
            }
            0xc5 => {
                let len = self.read_uint(2)?;
                self.decode_bin(len)
            }
            0xc6 => {
                let len = self.read_uint(4)?;
                self.decode_bin(len)
            }
            0xca => {
                let bits = self.read_uint(4)?;
                let bits = u32::try_from(bits).map_err(|_| CodecError::invalid_structure("float32"))?;
                Ok(Value::Float(f64::from(f32::from_bits(bits))))
            }
            0xcb => Ok(Value::Float(f64::from_bits(self.read_uint(8)?))),
            0xcc => Ok(Value::Unsigned(self.read_uint(1)?)),
            0xcd => Ok(Value::Unsigned(self.read_uint(2)?)),
            0xce => Ok(Value::Unsigned(self.read_uint(4)?)),
            0xcf => Ok(Value::Unsigned(self.read_uint(8)?)),
            0xd0 => Ok(Value::Integer(i64::from(self.read_uint(1)? as u8 as i8))),
            0xd1 => Ok(Value::Integer(i64::from(self.read_uint(2)? as u16 as i16))),
            0xd2 => Ok(Value::Integer(i64::from(self.read_uint(4)? as u32 as i32))),
            0xd3 => Ok(Value::Integer(self.read_uint(8)? as i64)),
            0xd9 => {
                let len = self.read_uint(1)?;
                self.decode_text(len)
            }
            0xda => {
                let len = self.read_uint(2)?;
                self.decode_text(len)
            }
            0xdb => {
                let len = self.read_uint(4)?;
                self.decode_text(len)
            }
            0xdc => {
                let len = self.read_uint(2)?;
                self.decode_array(len)
            }
            0xdd => {
                let len = self.read_uint(4)?;
                self.decode_array(len)
            }
            0xde => {
                let len = self.read_uint(2)?;
                self.decode_map(len)
            }
            0xdf => {
                let len = self.read_uint(4)?;
                self.decode_map(len)
            }
            0xe0..=0xff => Ok(Value::Integer(i64::from(marker as i8))),
            0xc7..=0xc9 | 0xd4..=0xd8 => Err(CodecError::unsupported_type(format!(
                "extension (marker {marker:#04x})"
            ))),
            0xc1 => Err(CodecError::invalid_structure("reserved marker 0xc1")),
        }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        if self.pos >= self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if len > self.data.len() - self.pos {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Reads a big-endian unsigned integer of `width` bytes.
    #[inline]
    fn read_uint(&mut self, width: usize) -> CodecResult<u64> {
        let bytes = self.read_bytes(width)?;
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    fn checked_len(len: u64, max: u64) -> CodecResult<usize> {
        if len > max {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: max,
            });
        }
        usize::try_from(len).map_err(|_| CodecError::SizeLimitExceeded {
            claimed: len,
            max_allowed: max,
        })
    }

    fn decode_bin(&mut self, len: u64) -> CodecResult<Value> {
        let len = Self::checked_len(len, MAX_BYTES_LENGTH)?;
        let bytes = self.read_bytes(len)?;
        Ok(Value::Bytes(bytes.to_vec()))
    }

    fn decode_text(&mut self, len: u64) -> CodecResult<Value> {
        Ok(Value::Text(self.read_text(len)?))
    }

    fn read_text(&mut self, len: u64) -> CodecResult<String> {
        let len = Self::checked_len(len, MAX_BYTES_LENGTH)?;
        let bytes = self.read_bytes(len)?;
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(text.to_string())
    }

    /// Enters one container level. Decoding stops at the first error, so
    /// the level is only released on success.
    fn enter(&mut self) -> CodecResult<()> {
        if self.depth >= self.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn decode_array(&mut self, len: u64) -> CodecResult<Value> {
        let len = Self::checked_len(len, MAX_CONTAINER_ELEMENTS)?;
        self.enter()?;
        // Every element takes at least one byte.
        let mut items = Vec::with_capacity(len.min(self.data.len() - self.pos));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self, len: u64) -> CodecResult<Value> {
        let len = Self::checked_len(len, MAX_CONTAINER_ELEMENTS)?;
        self.enter()?;
        let mut pairs = Vec::with_capacity(len.min(self.data.len() - self.pos));
        for _ in 0..len {
            let key = match self.read_byte()? {
                m @ 0xa0..=0xbf => self.read_text(u64::from(m & 0x1f))?,
                0xd9 => {
                    let n = self.read_uint(1)?;
                    self.read_text(n)?
                }
                0xda => {
                    let n = self.read_uint(2)?;
                    self.read_text(n)?
                }
                0xdb => {
                    let n = self.read_uint(4)?;
                    self.read_text(n)?
                }
                m => {
                    return Err(CodecError::unsupported_type(format!(
                        "non-string map key (marker {m:#04x})"
                    )))
                }
            };
            let value = self.decode()?;
            pairs.push((key, value));
        }
        self.depth -= 1;
        Ok(Value::Map(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_nil_and_bool() {
        assert_eq!(from_msgpack(&[0xc0]).unwrap(), Value::Null);
        assert_eq!(from_msgpack(&[0xc2]).unwrap(), Value::Bool(false));
        assert_eq!(from_msgpack(&[0xc3]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn decode_unsigned_family() {
        assert_eq!(from_msgpack(&[0x07]).unwrap(), Value::Unsigned(7));
        assert_eq!(from_msgpack(&[0xcc, 0xff]).unwrap(), Value::Unsigned(255));
        assert_eq!(
            from_msgpack(&[0xcd, 0x01, 0x00]).unwrap(),
            Value::Unsigned(256)
        );
        // non-shortest forms are accepted
        assert_eq!(
            from_msgpack(&[0xce, 0, 0, 0, 0x05]).unwrap(),
            Value::Unsigned(5)
        );
    }

    #[test]
    fn decode_signed_family() {
        assert_eq!(from_msgpack(&[0xff]).unwrap(), Value::Integer(-1));
        assert_eq!(from_msgpack(&[0xe0]).unwrap(), Value::Integer(-32));
        assert_eq!(from_msgpack(&[0xd0, 0x05]).unwrap(), Value::Integer(5));
        assert_eq!(
            from_msgpack(&[0xd1, 0xff, 0x38]).unwrap(),
            Value::Integer(-200)
        );
        assert_eq!(
            from_msgpack(&[0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            Value::Integer(i64::MIN)
        );
    }

    #[test]
    fn decode_floats() {
        assert_eq!(
            from_msgpack(&[0xcb, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]).unwrap(),
            Value::Float(1.0)
        );
        assert_eq!(
            from_msgpack(&[0xca, 0x3f, 0xc0, 0, 0]).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn decode_text_and_bin() {
        assert_eq!(
            from_msgpack(&[0xa2, b'h', b'i']).unwrap(),
            Value::from("hi")
        );
        assert_eq!(
            from_msgpack(&[0xd9, 1, b'x']).unwrap(),
            Value::from("x")
        );
        assert_eq!(
            from_msgpack(&[0xc4, 2, 9, 8]).unwrap(),
            Value::Bytes(vec![9, 8])
        );
    }

    #[test]
    fn decode_map_keeps_order() {
        let value = from_msgpack(&[0x82, 0xa1, b'b', 0x02, 0xa1, b'a', 0x01]).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![
                ("b".to_string(), Value::Unsigned(2)),
                ("a".to_string(), Value::Unsigned(1)),
            ])
        );
    }

    #[test]
    fn reject_non_string_map_key() {
        assert!(matches!(
            from_msgpack(&[0x81, 0x01, 0x02]),
            Err(CodecError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn reject_extension_types() {
        assert!(matches!(
            from_msgpack(&[0xd4, 0x01, 0x00]),
            Err(CodecError::UnsupportedType { .. })
        ));
        assert!(matches!(
            from_msgpack(&[0xc1]),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn unexpected_eof() {
        assert!(matches!(from_msgpack(&[]), Err(CodecError::UnexpectedEof)));
        assert!(matches!(
            from_msgpack(&[0xcd, 0x01]),
            Err(CodecError::UnexpectedEof)
        ));
        assert!(matches!(
            from_msgpack(&[0x92, 0x01]),
            Err(CodecError::UnexpectedEof)
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        assert_eq!(
            from_msgpack(&[0x01, 0x02]),
            Err(CodecError::TrailingBytes { remaining: 1 })
        );
    }

    #[test]
    fn decoder_streams_values() {
        let mut decoder = MsgpackDecoder::new(&[0x01, 0xa1, b'z']);
        assert_eq!(decoder.decode().unwrap(), Value::Unsigned(1));
        assert!(!decoder.is_empty());
        assert_eq!(decoder.decode().unwrap(), Value::from("z"));
        assert!(decoder.is_empty());
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert!(matches!(
            from_msgpack(&[0xa2, 0xff, 0xfe]),
            Err(CodecError::InvalidUtf8)
        ));
    }

    #[test]
    fn oversized_length_rejected() {
        assert!(matches!(
            from_msgpack(&[0xdd, 0xff, 0xff, 0xff, 0xff]),
            Err(CodecError::SizeLimitExceeded { .. })
        ));
    }

    #[test]
    fn deep_nesting_rejected_without_recursing() {
        let mut bytes = vec![0x91; 200_000];
        bytes.push(0x80);
        assert_eq!(
            from_msgpack(&bytes),
            Err(CodecError::DepthLimitExceeded {
                max_depth: DEFAULT_MAX_DEPTH
            })
        );
    }

    #[test]
    fn depth_limit_is_inclusive() {
        // Three containers: two arrays around an empty map.
        let bytes = [0x91, 0x91, 0x80];
        assert!(from_msgpack_with_max_depth(&bytes, 3).is_ok());
        assert!(matches!(
            from_msgpack_with_max_depth(&bytes, 2),
            Err(CodecError::DepthLimitExceeded { max_depth: 2 })
        ));
        // Scalars do not count.
        assert_eq!(from_msgpack_with_max_depth(&[0x07], 0).unwrap(), Value::Unsigned(7));
    }

    #[test]
    fn depth_is_released_between_values() {
        let mut decoder = MsgpackDecoder::with_max_depth(&[0x91, 0x01, 0x91, 0x02], 1);
        assert_eq!(decoder.decode().unwrap(), Value::Array(vec![Value::Unsigned(1)]));
        assert_eq!(decoder.decode().unwrap(), Value::Array(vec![Value::Unsigned(2)]));
    }
}

//! Scalar wire-type tags.
//!
//! Every leaf of a document's structure index records the wire type of the
//! scalar it points at. The numeric tag is part of the serialized format and
//! must never be renumbered.

use std::fmt;

/// Wire type of a serialized scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// MessagePack nil.
    Null = 0,
    /// MessagePack true/false.
    Bool = 1,
    /// Unsigned integer family (positive fixint, uint8..uint64).
    Unsigned = 2,
    /// Signed integer family (negative fixint, int8..int64).
    Integer = 3,
    /// Floating point (float32 widened, float64).
    Float = 4,
    /// UTF-8 string family.
    Text = 5,
    /// Binary family.
    Bytes = 6,
}

impl WireType {
    /// Returns the numeric tag stored in index nodes.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Parses a numeric tag.
    #[must_use]
    pub const fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            0 => Some(Self::Null),
            1 => Some(Self::Bool),
            2 => Some(Self::Unsigned),
            3 => Some(Self::Integer),
            4 => Some(Self::Float),
            5 => Some(Self::Text),
            6 => Some(Self::Bytes),
            _ => None,
        }
    }

    /// Whether `$inc` arithmetic is defined for this type.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Unsigned | Self::Integer | Self::Float)
    }

    /// Lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Unsigned => "unsigned",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(WireType::Null.tag(), 0);
        assert_eq!(WireType::Unsigned.tag(), 2);
        assert_eq!(WireType::Bytes.tag(), 6);
    }

    #[test]
    fn from_tag_rejects_unknown() {
        assert_eq!(WireType::from_tag(4), Some(WireType::Float));
        assert_eq!(WireType::from_tag(7), None);
        assert_eq!(WireType::from_tag(u64::MAX), None);
    }

    #[test]
    fn numeric_classes() {
        assert!(WireType::Unsigned.is_numeric());
        assert!(WireType::Integer.is_numeric());
        assert!(WireType::Float.is_numeric());
        assert!(!WireType::Text.is_numeric());
        assert!(!WireType::Bool.is_numeric());
    }
}

//! Dynamic document value type.

use crate::wire_type::WireType;

/// A dynamic document value.
///
/// Scalars map one-to-one onto a [`WireType`]; maps keep their keys in
/// insertion order so that a document built from a value reproduces the
/// same field order when it is materialized again.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Unsigned integer.
    Unsigned(u64),
    /// Signed integer.
    Integer(i64),
    /// Double precision float.
    Float(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Array of values.
    Array(Vec<Value>),
    /// Map of string keys to values, in insertion order.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Create a map value from key/value pairs, keeping their order.
    ///
    /// A key that appears twice keeps its first position and its last value.
    pub fn map<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut map = Value::Map(Vec::new());
        for (key, value) in pairs {
            map.set(key, value);
        }
        map
    }

    /// Create an empty map.
    #[must_use]
    pub fn empty_map() -> Self {
        Value::Map(Vec::new())
    }

    /// Returns the wire type of a scalar, `None` for arrays and maps.
    #[must_use]
    pub fn wire_type(&self) -> Option<WireType> {
        match self {
            Value::Null => Some(WireType::Null),
            Value::Bool(_) => Some(WireType::Bool),
            Value::Unsigned(_) => Some(WireType::Unsigned),
            Value::Integer(_) => Some(WireType::Integer),
            Value::Float(_) => Some(WireType::Float),
            Value::Text(_) => Some(WireType::Text),
            Value::Bytes(_) => Some(WireType::Bytes),
            Value::Array(_) | Value::Map(_) => None,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Check if this value is a map or an array.
    pub fn is_container(&self) -> bool {
        self.is_map() || self.is_array()
    }

    /// Check if this value is an unsigned, signed or floating point number.
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Unsigned(_) | Value::Integer(_) | Value::Float(_)
        )
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an unsigned integer.
    ///
    /// Non-negative signed integers convert; floats do not.
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Value::Unsigned(n) => Some(*n),
            Value::Integer(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Get this value as a signed integer.
    ///
    /// Unsigned integers convert when they fit; floats do not.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Unsigned(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Get this value as a double. Any number converts.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Unsigned(n) => Some(*n as f64),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as bytes, if it is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a position in this array value.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Insert or replace a key in this map value.
    ///
    /// Returns `false` (and leaves `self` untouched) if this is not a map.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> bool {
        let Value::Map(pairs) = self else {
            return false;
        };
        let key = key.into();
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => pairs.push((key, value)),
        }
        true
    }

    /// Append to this array value.
    ///
    /// Returns `false` (and leaves `self` untouched) if this is not an array.
    pub fn append(&mut self, value: Value) -> bool {
        match self {
            Value::Array(items) => {
                items.push(value);
                true
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Unsigned(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Unsigned(u64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keeps_insertion_order() {
        let map = Value::map([
            ("z", Value::Unsigned(1)),
            ("a", Value::Unsigned(2)),
            ("m", Value::Unsigned(3)),
        ]);

        let keys: Vec<&str> = map
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn map_duplicate_key_keeps_last_value() {
        let map = Value::map([("a", Value::Unsigned(1)), ("a", Value::Unsigned(2))]);
        assert_eq!(map.as_map().unwrap().len(), 1);
        assert_eq!(map.get("a"), Some(&Value::Unsigned(2)));
    }

    #[test]
    fn wire_types() {
        assert_eq!(Value::Null.wire_type(), Some(WireType::Null));
        assert_eq!(Value::Unsigned(1).wire_type(), Some(WireType::Unsigned));
        assert_eq!(Value::Integer(-1).wire_type(), Some(WireType::Integer));
        assert_eq!(Value::Float(0.5).wire_type(), Some(WireType::Float));
        assert_eq!(Value::Array(vec![]).wire_type(), None);
        assert_eq!(Value::empty_map().wire_type(), None);
    }

    #[test]
    fn numeric_extraction() {
        assert_eq!(Value::Unsigned(7).as_unsigned(), Some(7));
        assert_eq!(Value::Integer(7).as_unsigned(), Some(7));
        assert_eq!(Value::Integer(-7).as_unsigned(), None);
        assert_eq!(Value::Unsigned(u64::MAX).as_int(), None);
        assert_eq!(Value::Integer(-7).as_int(), Some(-7));
        assert_eq!(Value::Unsigned(2).as_double(), Some(2.0));
        assert_eq!(Value::Text("2".into()).as_double(), None);
        assert!(Value::Float(1.5).is_number());
        assert!(!Value::Bool(true).is_number());
    }

    #[test]
    fn set_and_append() {
        let mut map = Value::empty_map();
        assert!(map.set("name", Value::from("Alice")));
        assert!(map.set("name", Value::from("Bob")));
        assert_eq!(map.get("name"), Some(&Value::from("Bob")));
        assert!(!map.append(Value::Null));

        let mut array = Value::Array(vec![]);
        assert!(array.append(Value::from(1u64)));
        assert!(!array.set("k", Value::Null));
        assert_eq!(array.get_index(0), Some(&Value::Unsigned(1)));
        assert_eq!(array.get_index(1), None);
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42u64), Value::Unsigned(42));
        assert_eq!(Value::from(42i64), Value::Integer(42));
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from(1.5f64), Value::Float(1.5));
        assert_eq!(Value::from("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::from(vec![1u8, 2, 3]), Value::Bytes(vec![1, 2, 3]));
        assert_eq!(Value::from(()), Value::Null);
    }
}

//! JSON conversion at the CLI boundary.
//!
//! JSON has no byte strings, so bytes travel as `{"$bytes": "<hex>"}`.
//! Integers that fit `u64` import as unsigned, other integers as signed,
//! everything else as float. Non-finite floats export as `null`.

use docpack_core::Value;
use serde_json::{Map, Number, Value as Json};

const BYTES_KEY: &str = "$bytes";

/// Converts a JSON value into a document value.
pub fn from_json(json: &Json) -> Result<Value, String> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => number(n)?,
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(from_json).collect::<Result<_, _>>()?),
        Json::Object(map) => {
            if let Some(bytes) = bytes_object(map)? {
                return Ok(Value::Bytes(bytes));
            }
            let pairs = map
                .iter()
                .map(|(k, v)| Ok((k.clone(), from_json(v)?)))
                .collect::<Result<Vec<_>, String>>()?;
            Value::map(pairs)
        }
    })
}

/// Converts a document value into JSON.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Unsigned(n) => Json::Number(Number::from(*n)),
        Value::Integer(n) => Json::Number(Number::from(*n)),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => {
            let mut map = Map::new();
            map.insert(BYTES_KEY.to_string(), Json::String(hex(bytes)));
            Json::Object(map)
        }
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Map(pairs) => Json::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
    }
}

fn number(n: &Number) -> Result<Value, String> {
    if let Some(u) = n.as_u64() {
        Ok(Value::Unsigned(u))
    } else if let Some(i) = n.as_i64() {
        Ok(Value::Integer(i))
    } else {
        n.as_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("unrepresentable number {n}"))
    }
}

fn bytes_object(map: &Map<String, Json>) -> Result<Option<Vec<u8>>, String> {
    if map.len() != 1 {
        return Ok(None);
    }
    match map.get(BYTES_KEY) {
        Some(Json::String(hex)) => unhex(hex).map(Some),
        _ => Ok(None),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unhex(text: &str) -> Result<Vec<u8>, String> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return Err(format!("invalid hex in {BYTES_KEY}: {text:?}"));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16)
                .map_err(|_| format!("invalid hex in {BYTES_KEY}: {text:?}"))
        })
        .collect()
}

//! Property-based test generators using proptest.
//!
//! Provides strategies for generating documents and update documents
//! whose paths actually hit the generated document most of the time.

use docpack_codec::Value;
use proptest::prelude::*;

/// Strategy for dict keys: never empty, never numeric, never containing
/// the default path separator.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,7}").expect("Invalid regex")
}

/// Strategy for numbers of every width class.
pub fn numeric_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(Value::Unsigned),
        (0u64..1000).prop_map(Value::Unsigned),
        any::<i64>().prop_map(Value::Integer),
        (-1000i64..1000).prop_map(Value::Integer),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
    ]
}

/// Strategy for scalars. Floats are finite so values compare equal to
/// themselves.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        numeric_strategy(),
        prop::string::string_regex(".{0,40}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..48).prop_map(Value::Bytes),
    ]
}

/// Strategy for arbitrary nested values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((key_strategy(), inner), 0..6).prop_map(Value::map),
        ]
    })
}

/// Strategy for document roots (always a map).
pub fn document_strategy() -> impl Strategy<Value = Value> {
    prop::collection::vec((key_strategy(), value_strategy()), 0..8).prop_map(Value::map)
}

/// Strategy for values whose maps may repeat keys, as decoded MessagePack
/// can. Keys come from a three-letter alphabet so repeats are common.
pub fn repeated_key_value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::vec(("[a-c]", inner), 0..5).prop_map(Value::Map),
        ]
    })
}

/// Document roots whose maps may repeat keys.
pub fn repeated_key_document_strategy() -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-c]", repeated_key_value_strategy()), 0..8).prop_map(Value::Map)
}

/// `value` with repeated keys collapsed the way [`Value::map`] does: first
/// position, last value.
pub fn collapse_repeated_keys(value: &Value) -> Value {
    match value {
        Value::Map(pairs) => Value::map(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), collapse_repeated_keys(v))),
        ),
        Value::Array(items) => Value::Array(items.iter().map(collapse_repeated_keys).collect()),
        scalar => scalar.clone(),
    }
}

/// Every path in `value`, containers included, in document order. The
/// root itself is not listed.
pub fn collect_paths(value: &Value) -> Vec<String> {
    fn walk(value: &Value, prefix: &str, out: &mut Vec<String>) {
        let join = |segment: &str| {
            if prefix.is_empty() {
                segment.to_string()
            } else {
                format!("{prefix}.{segment}")
            }
        };
        match value {
            Value::Map(pairs) => {
                for (key, child) in pairs {
                    let path = join(key);
                    out.push(path.clone());
                    walk(child, &path, out);
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    let path = join(&index.to_string());
                    out.push(path.clone());
                    walk(child, &path, out);
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    walk(value, "", &mut out);
    out
}

/// A single field update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// `$set`
    Set {
        /// Field path.
        path: String,
        /// New value.
        value: Value,
    },
    /// `$inc`
    Inc {
        /// Field path.
        path: String,
        /// Increment.
        by: Value,
    },
    /// `$unset`
    Unset {
        /// Field path.
        path: String,
    },
}

impl UpdateOp {
    /// The field path.
    pub fn path(&self) -> &str {
        match self {
            UpdateOp::Set { path, .. } | UpdateOp::Inc { path, .. } | UpdateOp::Unset { path } => {
                path
            }
        }
    }

    /// This operation as a one-field update document.
    pub fn to_spec(&self) -> Value {
        let (operator, path, operand) = match self {
            UpdateOp::Set { path, value } => ("$set", path, value.clone()),
            UpdateOp::Inc { path, by } => ("$inc", path, by.clone()),
            UpdateOp::Unset { path } => ("$unset", path, Value::Null),
        };
        Value::map([(operator, Value::map([(path.clone(), operand)]))])
    }
}

/// Strategy for one update drawing paths from `paths`.
pub fn update_op_strategy(paths: BoxedStrategy<String>) -> impl Strategy<Value = UpdateOp> {
    prop_oneof![
        4 => (paths.clone(), value_strategy())
            .prop_map(|(path, value)| UpdateOp::Set { path, value }),
        3 => (paths.clone(), numeric_strategy())
            .prop_map(|(path, by)| UpdateOp::Inc { path, by }),
        1 => paths.prop_map(|path| UpdateOp::Unset { path }),
    ]
}

/// Paths that mostly exist in `doc`, with the occasional new key or new
/// nested path.
pub fn path_strategy(doc: &Value) -> BoxedStrategy<String> {
    let paths = collect_paths(doc);
    if paths.is_empty() {
        return key_strategy().boxed();
    }
    prop_oneof![
        6 => prop::sample::select(paths.clone()),
        1 => key_strategy(),
        1 => (prop::sample::select(paths), key_strategy())
            .prop_map(|(base, key)| format!("{base}.{key}")),
    ]
    .boxed()
}

/// Strategy for a document plus a sequence of updates against it.
pub fn document_with_updates_strategy(
    max_ops: usize,
) -> impl Strategy<Value = (Value, Vec<UpdateOp>)> {
    document_strategy().prop_flat_map(move |doc| {
        let ops = prop::collection::vec(update_op_strategy(path_strategy(&doc)), 1..max_ops);
        (Just(doc), ops)
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

//! Benchmark utilities.

use docpack_codec::Value;
use rand::Rng;

/// Generate random bytes of the specified size.
pub fn random_bytes(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// A random scalar of any wire type.
pub fn random_scalar<R: Rng>(rng: &mut R) -> Value {
    match rng.gen_range(0..6) {
        0 => Value::Null,
        1 => Value::Bool(rng.gen()),
        2 => Value::Unsigned(rng.gen()),
        3 => Value::Integer(rng.gen()),
        4 => Value::Float(rng.gen::<f64>() * 1000.0),
        _ => {
            let len = rng.gen_range(1..24);
            Value::Text((0..len).map(|_| rng.gen_range('a'..='z')).collect())
        }
    }
}

/// A flat map with `fields` numeric fields named `f0`, `f1`, ...
pub fn wide_document(fields: usize) -> Value {
    Value::map((0..fields).map(|i| (format!("f{i}"), Value::Unsigned(i as u64))))
}

/// A map nested `depth` levels deep with `width` keys per level.
pub fn nested_document(depth: usize, width: usize) -> Value {
    if depth == 0 {
        Value::Text("leaf".into())
    } else {
        Value::map((0..width).map(|i| (format!("key_{i}"), nested_document(depth - 1, width))))
    }
}

/// A map of `fields` random scalars, with a nested array every tenth field.
pub fn mixed_document(fields: usize) -> Value {
    let mut rng = rand::thread_rng();
    Value::map((0..fields).map(|i| {
        let value = if i % 10 == 9 {
            Value::Array((0..5).map(|_| random_scalar(&mut rng)).collect())
        } else {
            random_scalar(&mut rng)
        };
        (format!("f{i}"), value)
    }))
}

/// `$set` update touching the first `count` fields of a wide document.
pub fn set_update(count: usize, base: u64) -> Value {
    Value::map(vec![(
        "$set",
        Value::map((0..count).map(|i| (format!("f{i}"), Value::Unsigned(base + i as u64)))),
    )])
}

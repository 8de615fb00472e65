//! Update operators and increment arithmetic.

use super::outcome::SkipReason;
use docpack_codec::Value;
use std::fmt;

/// A field-level update operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    /// `$set`: write the operand.
    Set,
    /// `$inc`: add the operand to a numeric field.
    Inc,
    /// `$unset`: remove the field.
    Unset,
}

impl UpdateOperator {
    /// Parses an operator name such as `"$set"`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "$set" => Some(Self::Set),
            "$inc" => Some(Self::Inc),
            "$unset" => Some(Self::Unset),
            _ => None,
        }
    }

    /// The operator's name in an update document.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Set => "$set",
            Self::Inc => "$inc",
            Self::Unset => "$unset",
        }
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Adds `operand` to `old` using the arithmetic of `old`'s type.
///
/// Unsigned and signed integers wrap; the operand is converted to the
/// target's type with `as` semantics first (floats truncate toward zero,
/// negative operands wrap an unsigned target downward).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
pub(crate) fn increment(old: &Value, operand: &Value) -> Result<Value, SkipReason> {
    if !old.is_number() {
        return Err(SkipReason::NonNumericTarget);
    }
    match (old, operand) {
        (Value::Unsigned(a), Value::Unsigned(b)) => Ok(Value::Unsigned(a.wrapping_add(*b))),
        (Value::Unsigned(a), Value::Integer(b)) => Ok(Value::Unsigned(a.wrapping_add(*b as u64))),
        (Value::Unsigned(a), Value::Float(b)) => {
            Ok(Value::Unsigned(a.wrapping_add(*b as i64 as u64)))
        }
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_add(*b))),
        (Value::Integer(a), Value::Unsigned(b)) => Ok(Value::Integer(a.wrapping_add(*b as i64))),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Integer(a.wrapping_add(*b as i64))),
        (Value::Float(a), b) => b
            .as_double()
            .map(|b| Value::Float(a + b))
            .ok_or(SkipReason::NonNumericOperand),
        _ => Err(SkipReason::NonNumericOperand),
    }
}

//! Equality and ordering between runtime values.

use std::cmp::Ordering;

use crate::errors::{type_mismatch, EvalError};

use super::Value;

/// Numeric view used for mixed Integer/Float comparison.
enum Number {
    Int(i64),
    Float(f64),
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Integer(i) => Some(Number::Int(*i)),
        Value::Subrange(s) => Some(Number::Int(s.value)),
        Value::Float(x) => Some(Number::Float(*x)),
        _ => None,
    }
}

#[expect(clippy::cast_precision_loss, reason = "mixed comparisons widen to Float")]
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
        (Number::Int(a), Number::Float(b)) => (*a as f64).partial_cmp(b),
        (Number::Float(a), Number::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Number::Float(a), Number::Float(b)) => a.partial_cmp(b),
    }
}

fn unboxed(value: &Value) -> Value {
    match value {
        Value::Variant(Some(inner)) => unboxed(inner),
        other => other.clone(),
    }
}

/// Script-level `=`.
///
/// Nil equals only Nil. Objects and interfaces compare by identity of the
/// underlying object, records field by field, type tokens by RTTI id.
/// Kinds with no defined equality fail with `TypeMismatch`.
pub fn values_equal(left: &Value, right: &Value) -> Result<bool, EvalError> {
    let (left, right) = (unboxed(left), unboxed(right));
    if let (Some(a), Some(b)) = (as_number(&left), as_number(&right)) {
        return Ok(compare_numbers(&a, &b) == Some(Ordering::Equal));
    }
    match (&left, &right) {
        (Value::Nil | Value::Variant(None), Value::Nil | Value::Variant(None)) => Ok(true),
        (Value::Nil | Value::Variant(None), _) | (_, Value::Nil | Value::Variant(None)) => {
            Ok(false)
        }
        (Value::String(a), Value::String(b)) => Ok(a == b),
        (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
        (Value::Enum(a), Value::Enum(b)) if a.ty.name == b.ty.name => Ok(a.ordinal == b.ordinal),
        (Value::Set(a), Value::Set(b)) => Ok(a.same_members(b)),
        (Value::Object(_) | Value::Interface(_), Value::Object(_) | Value::Interface(_)) => {
            match (left.as_object(), right.as_object()) {
                (Some(a), Some(b)) => Ok(a.ptr_eq(b)),
                _ => Ok(false),
            }
        }
        (Value::Record(a), Value::Record(b)) => {
            if a.ptr_eq(b) {
                return Ok(true);
            }
            let (a, b) = (a.borrow(), b.borrow());
            if a.ty.name != b.ty.name {
                return Err(type_mismatch(a.ty.name.as_str(), "=", b.ty.name.as_str()));
            }
            for (x, y) in a.values.iter().zip(&b.values) {
                if !values_equal(x, y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Array(a), Value::Array(b)) => Ok(a.ptr_eq(b)),
        (Value::Function(a), Value::Function(b)) => Ok(a.same_target(b)),
        (Value::TypeMeta(a), Value::TypeMeta(b)) => Ok(a.id == b.id),
        _ => Err(type_mismatch(&left.type_name(), "=", &right.type_name())),
    }
}

/// Ordering for `<`, `<=`, `>`, `>=` and case ranges.
///
/// `Ok(None)` means unordered (a NaN operand), so every relational test is
/// false. Kinds with no ordering fail with `TypeMismatch`.
pub fn compare_values(left: &Value, right: &Value) -> Result<Option<Ordering>, EvalError> {
    let (left, right) = (unboxed(left), unboxed(right));
    if let (Some(a), Some(b)) = (as_number(&left), as_number(&right)) {
        return Ok(compare_numbers(&a, &b));
    }
    match (&left, &right) {
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Some(a.cmp(b))),
        (Value::Enum(a), Value::Enum(b)) if a.ty.name == b.ty.name => {
            Ok(Some(a.ordinal.cmp(&b.ordinal)))
        }
        _ => Err(type_mismatch(&left.type_name(), "<", &right.type_name())),
    }
}

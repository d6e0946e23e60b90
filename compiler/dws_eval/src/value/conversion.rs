//! Conversions between primitive kinds.
//!
//! Used by the primitive cast calls (`Integer(x)`, `Float(x)`, ...), by
//! `StrToInt`/`IntToStr`, and by assignment coercion. Variants are unboxed
//! first; an unassigned Variant converts to the target's zero value.

use crate::errors::{conversion_error, EvalError};

use super::Value;

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Convert to Integer. Floats truncate toward zero.
pub fn cast_to_integer(value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Subrange(s) => Ok(s.value),
        Value::Enum(e) => Ok(e.ordinal),
        Value::Boolean(b) => Ok(i64::from(*b)),
        Value::Float(x) => {
            let truncated = x.trunc();
            // 2^63 is not an i64; the upper bound is exclusive.
            if truncated.is_finite() && (-TWO_POW_63..TWO_POW_63).contains(&truncated) {
                #[expect(clippy::cast_possible_truncation, reason = "range checked above")]
                let int = truncated as i64;
                Ok(int)
            } else {
                Err(conversion_error(&format_float(*x), "Integer"))
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| conversion_error(&format!("'{s}'"), "Integer")),
        Value::Variant(None) => Ok(0),
        Value::Variant(Some(inner)) => cast_to_integer(inner),
        other => Err(conversion_error(&other.type_name(), "Integer")),
    }
}

/// Convert to Float.
pub fn cast_to_float(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Float(x) => Ok(*x),
        #[expect(clippy::cast_precision_loss, reason = "Integer to Float widening is lossy by definition")]
        Value::Integer(i) => Ok(*i as f64),
        #[expect(clippy::cast_precision_loss, reason = "Integer to Float widening is lossy by definition")]
        Value::Subrange(s) => Ok(s.value as f64),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| conversion_error(&format!("'{s}'"), "Float")),
        Value::Variant(None) => Ok(0.0),
        Value::Variant(Some(inner)) => cast_to_float(inner),
        other => Err(conversion_error(&other.type_name(), "Float")),
    }
}

/// Convert to String. Every value has a textual form except callables,
/// aliases and type tokens handled by their own `Display`.
pub fn cast_to_string(value: &Value) -> Result<String, EvalError> {
    match value {
        Value::Function(_) | Value::Reference(_) | Value::Lazy(_) => {
            Err(conversion_error(&value.type_name(), "String"))
        }
        Value::Variant(Some(inner)) => cast_to_string(inner),
        other => Ok(other.to_string()),
    }
}

/// Convert to Boolean. Numbers are true when non-zero; strings accept
/// `True`/`False` in any case.
pub fn cast_to_boolean(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(i) => Ok(*i != 0),
        Value::Subrange(s) => Ok(s.value != 0),
        Value::Float(x) => Ok(*x != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(conversion_error(&format!("'{s}'"), "Boolean")),
        },
        Value::Variant(None) => Ok(false),
        Value::Variant(Some(inner)) => cast_to_boolean(inner),
        other => Err(conversion_error(&other.type_name(), "Boolean")),
    }
}

/// Text form of a Float: shortest round-trip digits, no trailing `.0`, and
/// `INF`/`-INF`/`NAN` for the non-finite values.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        format!("{value}")
    }
}

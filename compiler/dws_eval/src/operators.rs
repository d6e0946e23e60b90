//! Built-in operator semantics.
//!
//! Direct enum-based dispatch over the fixed value set. Operator overloads
//! on classes are tried by the interpreter before these are reached; `and`
//! and `or` short-circuit in the interpreter when the left operand decides.
//!
//! Integer arithmetic wraps on overflow. `/` always yields a Float; with two
//! Integer operands a zero divisor is `DivisionByZero`, with a Float operand
//! it follows IEEE-754.

use std::cmp::Ordering;

use dws_ir::{AssignOp, BinaryOp, UnaryOp};

use crate::errors::{division_by_zero, expected_type, type_mismatch, EvalError};
use crate::value::{compare_values, values_equal, SetValue, Value};

/// Strip Variant boxing and subrange wrappers so dispatch sees base kinds.
fn normalize(value: Value) -> Value {
    match value.unbox() {
        Value::Subrange(s) => Value::Integer(s.value),
        other => other,
    }
}

fn mismatch(left: &Value, op: &str, right: &Value) -> EvalError {
    type_mismatch(&left.type_name(), op, &right.type_name())
}

#[expect(clippy::cast_precision_loss, reason = "Integer to Float widening")]
pub(crate) fn widen(value: i64) -> f64 {
    value as f64
}

/// Evaluate a binary operation.
#[expect(
    clippy::needless_pass_by_value,
    reason = "callers hand over freshly evaluated operands"
)]
pub fn evaluate_binary(left: Value, right: Value, op: BinaryOp) -> Result<Value, EvalError> {
    let (left, right) = (normalize(left), normalize(right));
    match op {
        BinaryOp::Eq => return values_equal(&left, &right).map(Value::Boolean),
        BinaryOp::NotEq => return values_equal(&left, &right).map(|eq| Value::Boolean(!eq)),
        BinaryOp::In => return eval_in(&left, &right),
        _ => {}
    }
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => eval_int_binary(*a, *b, op),
        (Value::Float(a), Value::Float(b)) => eval_float_binary(*a, *b, op, &left, &right),
        (Value::Integer(a), Value::Float(b)) => eval_float_binary(widen(*a), *b, op, &left, &right),
        (Value::Float(a), Value::Integer(b)) => eval_float_binary(*a, widen(*b), op, &left, &right),
        (Value::Boolean(a), Value::Boolean(b)) => eval_bool_binary(*a, *b, op),
        (Value::String(a), Value::String(b)) => eval_string_binary(a, b, op),
        (Value::Set(a), Value::Set(b)) => eval_set_binary(a, b, op),
        _ if op.is_comparison() => eval_ordering(&left, &right, op),
        _ => Err(mismatch(&left, op.as_symbol(), &right)),
    }
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> Result<Value, EvalError> {
    let zero_check = || {
        if b == 0 {
            Err(division_by_zero(&a.to_string(), op.as_symbol(), &b.to_string()))
        } else {
            Ok(())
        }
    };
    match op {
        BinaryOp::Add => Ok(Value::Integer(a.wrapping_add(b))),
        BinaryOp::Sub => Ok(Value::Integer(a.wrapping_sub(b))),
        BinaryOp::Mul => Ok(Value::Integer(a.wrapping_mul(b))),
        BinaryOp::Div => {
            zero_check()?;
            Ok(Value::Float(widen(a) / widen(b)))
        }
        BinaryOp::IntDiv => {
            zero_check()?;
            Ok(Value::Integer(a.wrapping_div(b)))
        }
        BinaryOp::Mod => {
            zero_check()?;
            Ok(Value::Integer(a.wrapping_rem(b)))
        }
        BinaryOp::And => Ok(Value::Integer(a & b)),
        BinaryOp::Or => Ok(Value::Integer(a | b)),
        BinaryOp::Xor => Ok(Value::Integer(a ^ b)),
        BinaryOp::Shl | BinaryOp::Shr => {
            let amount = u32::try_from(b)
                .map_err(|_| EvalError::new(format!("negative shift amount: {b}")))?;
            let shifted = if op == BinaryOp::Shl {
                a.checked_shl(amount).unwrap_or(0)
            } else {
                // Logical shift on the unsigned representation.
                #[expect(clippy::cast_sign_loss, reason = "bit reinterpretation")]
                let bits = a as u64;
                #[expect(clippy::cast_possible_wrap, reason = "bit reinterpretation")]
                let shifted = bits.checked_shr(amount).unwrap_or(0) as i64;
                shifted
            };
            Ok(Value::Integer(shifted))
        }
        BinaryOp::Lt => Ok(Value::Boolean(a < b)),
        BinaryOp::LtEq => Ok(Value::Boolean(a <= b)),
        BinaryOp::Gt => Ok(Value::Boolean(a > b)),
        BinaryOp::GtEq => Ok(Value::Boolean(a >= b)),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::In => {
            Err(type_mismatch("Integer", op.as_symbol(), "Integer"))
        }
    }
}

fn eval_float_binary(
    a: f64,
    b: f64,
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::Lt => Ok(Value::Boolean(a.partial_cmp(&b) == Some(Ordering::Less))),
        BinaryOp::LtEq => Ok(Value::Boolean(matches!(
            a.partial_cmp(&b),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::Gt => Ok(Value::Boolean(a.partial_cmp(&b) == Some(Ordering::Greater))),
        BinaryOp::GtEq => Ok(Value::Boolean(matches!(
            a.partial_cmp(&b),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        _ => Err(mismatch(left, op.as_symbol(), right)),
    }
}

fn eval_bool_binary(a: bool, b: bool, op: BinaryOp) -> Result<Value, EvalError> {
    match op {
        BinaryOp::And => Ok(Value::Boolean(a && b)),
        BinaryOp::Or => Ok(Value::Boolean(a || b)),
        BinaryOp::Xor => Ok(Value::Boolean(a ^ b)),
        BinaryOp::Lt => Ok(Value::Boolean(!a & b)),
        BinaryOp::LtEq => Ok(Value::Boolean(a <= b)),
        BinaryOp::Gt => Ok(Value::Boolean(a & !b)),
        BinaryOp::GtEq => Ok(Value::Boolean(a >= b)),
        _ => Err(type_mismatch("Boolean", op.as_symbol(), "Boolean")),
    }
}

fn eval_string_binary(a: &str, b: &str, op: BinaryOp) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => Ok(Value::from(format!("{a}{b}"))),
        BinaryOp::Lt => Ok(Value::Boolean(a < b)),
        BinaryOp::LtEq => Ok(Value::Boolean(a <= b)),
        BinaryOp::Gt => Ok(Value::Boolean(a > b)),
        BinaryOp::GtEq => Ok(Value::Boolean(a >= b)),
        _ => Err(type_mismatch("String", op.as_symbol(), "String")),
    }
}

fn eval_set_binary(a: &SetValue, b: &SetValue, op: BinaryOp) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => Ok(Value::Set(a.union(b))),
        BinaryOp::Sub => Ok(Value::Set(a.difference(b))),
        BinaryOp::Mul => Ok(Value::Set(a.intersection(b))),
        BinaryOp::LtEq => Ok(Value::Boolean(a.is_subset(b))),
        BinaryOp::GtEq => Ok(Value::Boolean(b.is_subset(a))),
        _ => Err(type_mismatch("set", op.as_symbol(), "set")),
    }
}

/// Relational operators on enums and other ordered kinds.
fn eval_ordering(left: &Value, right: &Value, op: BinaryOp) -> Result<Value, EvalError> {
    let ordering = compare_values(left, right).map_err(|_| mismatch(left, op.as_symbol(), right))?;
    let result = match op {
        BinaryOp::Lt => ordering == Some(Ordering::Less),
        BinaryOp::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => ordering == Some(Ordering::Greater),
        BinaryOp::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => return Err(mismatch(left, op.as_symbol(), right)),
    };
    Ok(Value::Boolean(result))
}

/// `value in container` for sets (by ordinal) and arrays (by equality).
fn eval_in(value: &Value, container: &Value) -> Result<Value, EvalError> {
    match container {
        Value::Set(set) => {
            let ordinal = value
                .ordinal()
                .ok_or_else(|| mismatch(value, "in", container))?;
            Ok(Value::Boolean(set.contains(ordinal)))
        }
        Value::Array(array) => {
            for item in &array.borrow().items {
                if values_equal(value, item)? {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        Value::String(haystack) => match value {
            Value::String(needle) => Ok(Value::Boolean(haystack.contains(&**needle))),
            _ => Err(mismatch(value, "in", container)),
        },
        _ => Err(mismatch(value, "in", container)),
    }
}

/// Evaluate a unary operation.
#[expect(
    clippy::needless_pass_by_value,
    reason = "callers hand over a freshly evaluated operand"
)]
pub fn evaluate_unary(operand: Value, op: UnaryOp) -> Result<Value, EvalError> {
    let operand = normalize(operand);
    match (op, &operand) {
        (UnaryOp::Neg, Value::Integer(i)) => Ok(Value::Integer(i.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Plus, Value::Integer(_) | Value::Float(_)) => Ok(operand),
        (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOp::Not, Value::Integer(i)) => Ok(Value::Integer(!i)),
        (UnaryOp::Not, _) => Err(expected_type("Boolean or Integer", &operand.type_name())),
        (UnaryOp::Neg | UnaryOp::Plus, _) => {
            Err(expected_type("numeric operand", &operand.type_name()))
        }
    }
}

/// Compute the new value of a compound assignment `target op= value`.
///
/// The result is stored through the assignment path, which re-applies the
/// target's declared type (so a subrange target is re-validated).
///
/// - Integer targets take Integer operands; `/=` divides with truncation.
/// - Float targets take Float or Integer operands.
/// - String targets take String or Variant operands for `+=`.
/// - Set targets take sets for `+=`, `-=`, `*=`.
/// - `/=` with a zero divisor is `DivisionByZero` for every numeric kind.
#[expect(
    clippy::needless_pass_by_value,
    reason = "callers hand over freshly evaluated operands"
)]
pub fn evaluate_compound(current: Value, op: AssignOp, value: Value) -> Result<Value, EvalError> {
    let Some(binary) = op.binary_op() else {
        return Ok(value);
    };
    let symbol = op.as_symbol();
    let (current, value) = (normalize(current), normalize(value));
    match (&current, &value) {
        (Value::Integer(a), Value::Integer(b)) => {
            if op == AssignOp::DivAssign {
                if *b == 0 {
                    return Err(division_by_zero(&a.to_string(), symbol, &b.to_string()));
                }
                return Ok(Value::Integer(a.wrapping_div(*b)));
            }
            eval_int_binary(*a, *b, binary)
        }
        (Value::Float(a), Value::Float(_) | Value::Integer(_)) => {
            let b = match &value {
                Value::Integer(i) => widen(*i),
                Value::Float(x) => *x,
                _ => return Err(mismatch(&current, symbol, &value)),
            };
            if op == AssignOp::DivAssign && b == 0.0 {
                return Err(division_by_zero(&current.to_string(), symbol, &value.to_string()));
            }
            eval_float_binary(*a, b, binary, &current, &value)
        }
        (Value::String(a), Value::String(b)) if op == AssignOp::AddAssign => {
            Ok(Value::from(format!("{a}{b}")))
        }
        (Value::String(a), _) if op == AssignOp::AddAssign && is_variant_source(&value) => {
            Ok(Value::from(format!("{a}{value}")))
        }
        (Value::Set(a), Value::Set(b)) if op != AssignOp::DivAssign => eval_set_binary(a, b, binary),
        _ => Err(mismatch(&current, symbol, &value)),
    }
}

/// After normalization a Variant source is any printable scalar; only
/// unassigned Variants remain boxed.
fn is_variant_source(value: &Value) -> bool {
    matches!(
        value,
        Value::Variant(None) | Value::Boolean(_) | Value::Float(_) | Value::Integer(_)
    )
}

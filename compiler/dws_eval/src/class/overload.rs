//! Overload selection by runtime argument kinds.

use dws_ir::{Expr, ParamMode};

use crate::errors::{no_matching_overload, EvalError, EvalNote};
use crate::types::TypeInfo;
use crate::value::{Reference, Value};

/// An argument ready to bind to a parameter.
#[derive(Clone, Debug)]
pub enum PreparedArg {
    Value(Value),
    /// Alias of the caller's slot, for `var` parameters.
    Reference(Reference),
    /// Unevaluated argument of a `lazy` parameter.
    Deferred(Expr),
}

/// One overload under consideration.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// Shown in the error note, e.g. `F(Integer)`.
    pub label: String,
    pub params: Vec<(ParamMode, TypeInfo)>,
    /// Parameters without a default value.
    pub required: usize,
}

/// Cost of passing `value` where `ty` is expected.
///
/// `0` is an exact match, `1` a widening (Integer to Float, subclass to
/// base, object to an implemented interface, nil to a reference type) and
/// `2` boxing into a Variant. `None` means the value is not acceptable.
pub fn conversion_cost(value: &Value, ty: &TypeInfo) -> Option<u8> {
    match (ty, value) {
        (TypeInfo::Variant, Value::Variant(_)) => Some(0),
        (TypeInfo::Variant, _) => Some(2),
        (_, Value::Variant(Some(inner))) => conversion_cost(inner, ty).map(|cost| cost.max(2)),
        (TypeInfo::Integer, Value::Integer(_)) => Some(0),
        (TypeInfo::Integer, Value::Subrange(_)) => Some(1),
        (TypeInfo::Float, Value::Float(_)) => Some(0),
        (TypeInfo::Float, Value::Integer(_) | Value::Subrange(_)) => Some(1),
        (TypeInfo::String, Value::String(_)) => Some(0),
        (TypeInfo::Boolean, Value::Boolean(_)) => Some(0),
        (TypeInfo::Enum(expected), Value::Enum(actual)) => {
            (expected.name == actual.ty.name).then_some(0)
        }
        (TypeInfo::Subrange(expected), Value::Subrange(actual)) if expected.name == actual.ty.name => {
            Some(0)
        }
        (TypeInfo::Subrange(expected), Value::Integer(_) | Value::Subrange(_)) => {
            value.as_integer().filter(|v| expected.contains(*v)).map(|_| 1)
        }
        (TypeInfo::Set(expected), Value::Set(actual)) => {
            if actual.element().name() == expected.element.name() {
                Some(0)
            } else if *actual.element() == TypeInfo::Variant {
                Some(1)
            } else {
                None
            }
        }
        (TypeInfo::Array(expected), Value::Array(actual)) => {
            if actual.borrow().element.name() == expected.element.name() {
                Some(0)
            } else {
                Some(1)
            }
        }
        (TypeInfo::Record(expected), Value::Record(actual)) => {
            (expected.name == actual.borrow().ty.name).then_some(0)
        }
        (TypeInfo::Class(_) | TypeInfo::Interface(_) | TypeInfo::Function(_), Value::Nil) => {
            Some(1)
        }
        (TypeInfo::Class(name), Value::Object(obj)) => {
            let class = obj.class();
            if &class.name == name {
                Some(0)
            } else if class.inherits_from(name) {
                Some(1)
            } else {
                None
            }
        }
        (TypeInfo::Interface(name), Value::Interface(intf)) => {
            if &intf.info.name == name {
                Some(0)
            } else if intf.info.extends(name) || intf.object.class().implements_interface(name) {
                Some(1)
            } else {
                None
            }
        }
        (TypeInfo::Interface(name), Value::Object(obj)) => {
            obj.class().implements_interface(name).then_some(1)
        }
        (TypeInfo::Function(_), Value::Function(_)) => Some(0),
        _ => None,
    }
}

/// Pick the overload that best matches `args`.
///
/// `args[i]` is `None` for an argument left unevaluated because it feeds a
/// `lazy` parameter; such positions do not affect the ranking. A single
/// candidate is taken as is. Otherwise the applicable candidate with the
/// lowest total conversion cost wins; a tie or no applicable candidate fails
/// with `NoMatchingOverload`.
pub fn select_overload(
    name: &str,
    candidates: &[Candidate],
    args: &[Option<Value>],
) -> Result<usize, EvalError> {
    if candidates.len() == 1 {
        return Ok(0);
    }

    let mut best: Option<(usize, u32)> = None;
    let mut tied = false;
    for (index, candidate) in candidates.iter().enumerate() {
        let Some(cost) = total_cost(candidate, args) else {
            continue;
        };
        match best {
            Some((_, best_cost)) if cost > best_cost => {}
            Some((_, best_cost)) if cost == best_cost => tied = true,
            _ => {
                best = Some((index, cost));
                tied = false;
            }
        }
    }

    match best {
        Some((index, _)) if !tied => Ok(index),
        _ => {
            let given: Vec<String> = args
                .iter()
                .map(|arg| arg.as_ref().map_or_else(|| "lazy".to_string(), Value::type_name))
                .collect();
            let mut err = no_matching_overload(name)
                .with_note(EvalNote::new(format!("arguments: ({})", given.join(", "))));
            for candidate in candidates {
                err = err.with_note(EvalNote::new(format!("candidate: {}", candidate.label)));
            }
            Err(err)
        }
    }
}

fn total_cost(candidate: &Candidate, args: &[Option<Value>]) -> Option<u32> {
    if args.len() < candidate.required || args.len() > candidate.params.len() {
        return None;
    }
    let mut total = 0u32;
    for (arg, (mode, ty)) in args.iter().zip(&candidate.params) {
        let cost = match (arg, mode) {
            (None, _) => 0,
            (Some(_), ParamMode::Lazy) => 1,
            (Some(value), _) => conversion_cost(value, ty)?,
        };
        total += u32::from(cost);
    }
    Some(total)
}

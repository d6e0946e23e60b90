//! Type tests and casts: `is`, `as`, `implements`, and `T(x)` calls.

use std::rc::Rc;

use dws_ir::{Expr, Name};

use super::Interpreter;
use crate::class::ClassInfo;
use crate::errors::{expected_type, invalid_cast, out_of_range, undefined_class, EvalError, EvalResult};
use crate::types::TypeInfo;
use crate::value::{
    cast_to_boolean, cast_to_float, cast_to_integer, cast_to_string, EnumValue, InterfaceRef,
    SubrangeValue, Value,
};

impl Interpreter {
    /// Look up a loaded class by name.
    pub(crate) fn lookup_class(&self, name: &Name) -> Result<Rc<ClassInfo>, EvalError> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| undefined_class(name.as_str()))
    }

    /// `value is TClass`. Nil is never an instance of anything.
    pub(super) fn eval_is(&mut self, value: &Expr, class: &Name) -> EvalResult {
        let value = self.eval_expr(value)?.unbox();
        let Some(object) = value.as_object() else {
            return match value {
                Value::Nil => Ok(Value::Boolean(false)),
                other => Err(expected_type("object", &other.type_name()).into()),
            };
        };
        let runtime = object.class();
        let result = if self.interfaces.contains_key(class) {
            runtime.implements_interface(class)
        } else {
            self.lookup_class(class)?;
            runtime.inherits_from(class)
        };
        Ok(Value::Boolean(result))
    }

    /// `value as T`: a checked downcast to a class, or an interface view.
    pub(super) fn eval_as(&mut self, value: &Expr, target: &Name) -> EvalResult {
        let value = self.eval_expr(value)?.unbox();
        if let Some(info) = self.interfaces.get(target).cloned() {
            return match value {
                Value::Nil => Ok(Value::Nil),
                Value::Object(object) | Value::Interface(InterfaceRef { object, .. }) => {
                    if object.class().implements_interface(target) {
                        Ok(Value::Interface(InterfaceRef { info, object }))
                    } else {
                        Err(invalid_cast(&object.class_name(), target.as_str()).into())
                    }
                }
                other => Err(invalid_cast(&other.type_name(), target.as_str()).into()),
            };
        }
        self.lookup_class(target)?;
        Ok(downcast(value, target)?)
    }

    /// `value implements IIntf`.
    pub(super) fn eval_implements(&mut self, value: &Expr, interface: &Name) -> EvalResult {
        let value = self.eval_expr(value)?.unbox();
        match value {
            Value::Nil => Ok(Value::Boolean(false)),
            Value::Object(object) | Value::Interface(InterfaceRef { object, .. }) => {
                Ok(Value::Boolean(object.class().implements_interface(interface)))
            }
            Value::TypeMeta(meta) => match &meta.info {
                TypeInfo::Class(name) => {
                    let class = self.lookup_class(name)?;
                    Ok(Value::Boolean(class.implements_interface(interface)))
                }
                other => Err(expected_type("class", &other.name()).into()),
            },
            other => Err(expected_type("object", &other.type_name()).into()),
        }
    }

    /// `T(value)` where `T` names a type.
    pub(super) fn cast_value(&mut self, info: &TypeInfo, value: Value) -> Result<Value, EvalError> {
        let value = value.unbox();
        match info {
            TypeInfo::Integer => Ok(Value::Integer(cast_to_integer(&value)?)),
            TypeInfo::Float => Ok(Value::Float(cast_to_float(&value)?)),
            TypeInfo::String => Ok(Value::from(cast_to_string(&value)?)),
            TypeInfo::Boolean => Ok(Value::Boolean(cast_to_boolean(&value)?)),
            TypeInfo::Variant => Ok(Value::variant(value)),
            TypeInfo::Enum(ty) => {
                let ordinal = value
                    .ordinal()
                    .ok_or_else(|| invalid_cast(&value.type_name(), ty.name.as_str()))?;
                Ok(Value::Enum(EnumValue {
                    ty: Rc::clone(ty),
                    ordinal,
                }))
            }
            TypeInfo::Subrange(ty) => {
                let number = value
                    .ordinal()
                    .ok_or_else(|| invalid_cast(&value.type_name(), ty.name.as_str()))?;
                if !ty.contains(number) {
                    return Err(out_of_range(number, ty.name.as_str(), ty.low, ty.high));
                }
                Ok(Value::Subrange(SubrangeValue {
                    value: number,
                    ty: Rc::clone(ty),
                }))
            }
            TypeInfo::Class(name) => downcast(value, name),
            TypeInfo::Interface(name) => match value {
                Value::Nil => Ok(Value::Nil),
                Value::Object(object) | Value::Interface(InterfaceRef { object, .. }) => {
                    let info = object
                        .class()
                        .find_interface(name)
                        .ok_or_else(|| invalid_cast(&object.class_name(), name.as_str()))?;
                    Ok(Value::Interface(InterfaceRef { info, object }))
                }
                other => Err(invalid_cast(&other.type_name(), name.as_str())),
            },
            _ => self.coerce_to(value, info),
        }
    }
}

/// Reinterpret an object as `target`, which it must be or descend from.
fn downcast(value: Value, target: &Name) -> Result<Value, EvalError> {
    match value {
        Value::Nil => Ok(Value::Nil),
        Value::Object(object) | Value::Interface(InterfaceRef { object, .. }) => {
            if object.class().inherits_from(target) {
                Ok(Value::Object(object))
            } else {
                Err(invalid_cast(&object.class_name(), target.as_str()))
            }
        }
        other => Err(invalid_cast(&other.type_name(), target.as_str())),
    }
}

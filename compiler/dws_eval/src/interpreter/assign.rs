//! Assignment targets, by-reference argument slots, and the coercion
//! applied whenever a value is stored into a typed slot.

use std::rc::Rc;

use dws_ir::{AssignOp, Expr, ExprKind, Name};

use super::Interpreter;
use crate::class::ClassInfo;
use crate::environment::{AssignError, Environment};
use crate::errors::{
    constant_assignment, expected_type, index_out_of_bounds, indexed_property_without_index,
    invalid_assignment_target, nil_reference, out_of_range, undefined_field, undefined_property,
    undefined_variable, ControlAction, EvalError, ExecResult,
};
use crate::operators::widen;
use crate::types::TypeInfo;
use crate::value::{
    InterfaceRef, ObjectRef, RecordValue, RefTarget, Receiver, Reference, Shared, SubrangeValue,
    Value,
};

impl Interpreter {
    /// `target := value`, `target += value`, ...
    pub(super) fn exec_assign(&mut self, target: &Expr, op: AssignOp, value: &Expr) -> ExecResult {
        if op == AssignOp::Assign {
            let value = self.eval_expr(value)?;
            return self.assign_to(target, value);
        }
        let current = self.eval_expr(target)?;
        let operand = self.eval_expr(value)?;
        let updated = self.apply_compound(op, current, operand)?;
        self.assign_to(target, updated)
    }

    pub(super) fn assign_to(&mut self, target: &Expr, value: Value) -> ExecResult {
        match &target.kind {
            ExprKind::Ident(name) => self.assign_variable(name, value),
            ExprKind::Member { object, member } => self.assign_member(object, member, value),
            ExprKind::Index { base, indices } => self.assign_index(base, indices, value),
            _ => Err(invalid_assignment_target().into()),
        }
    }

    /// Store into the slot a bare name resolves to.
    ///
    /// Order: locals, members of `Self`, globals, the running routine's
    /// name (an alias of `Result`), unit variables.
    pub(super) fn assign_variable(&mut self, name: &Name, value: Value) -> ExecResult {
        if self.env.get_before(name, &self.global).is_some() {
            let env = self.env.clone();
            return self.store_in_env(&env, name, value);
        }
        if let Some(context) = self.context.clone() {
            let class = &context.class;
            if let Some(object) = &context.self_object {
                if class.has_field(name) {
                    return Ok(self.set_field(object, name, value)?);
                }
            }
            if class.has_class_var(name) {
                return Ok(self.set_class_var(class, name, value)?);
            }
            if class.constant(name).is_some() {
                return Err(constant_assignment(name.as_str()).into());
            }
            if let Some(property) = class.find_property(name) {
                if property.is_indexed() {
                    return Err(indexed_property_without_index(name.as_str()).into());
                }
                return self.write_property(context.receiver(), &property, Vec::new(), value);
            }
        }
        if self.global.get(name).is_some() {
            let global = self.global.clone();
            return self.store_in_env(&global, name, value);
        }
        let result = Name::new("Result");
        let is_routine_name = self.routine.as_ref().is_some_and(|routine| &routine.name == name);
        if is_routine_name && self.env.get(&result).is_some() {
            let env = self.env.clone();
            return self.store_in_env(&env, &result, value);
        }
        if let Some(unit) = self.units.resolve_unqualified(name) {
            if unit.env.get(name).is_some() {
                return self.store_in_env(&unit.env, name, value);
            }
        }
        Err(undefined_variable(name.as_str()).into())
    }

    /// Store into the nearest binding of `name` seen from `env`, writing
    /// through a `var` alias if the binding is one.
    fn store_in_env(&mut self, env: &Environment, name: &Name, value: Value) -> ExecResult {
        if let Some(Value::Reference(reference)) = env.get(name) {
            return Ok(self.write_reference(&reference, value)?);
        }
        let value = match env.declared_type(name) {
            Some(ty) => self.coerce_to(value, &ty)?,
            None => value,
        };
        env.assign(name, value.copy_for_assign()).map_err(|err| match err {
            AssignError::Immutable => constant_assignment(name.as_str()),
            AssignError::Undefined => undefined_variable(name.as_str()),
        })?;
        Ok(())
    }

    /// Coerce `value` to the aliased slot's type and store it.
    pub(crate) fn write_reference(&self, reference: &Reference, value: Value) -> Result<(), EvalError> {
        let value = match reference.declared_type() {
            Some(ty) => self.coerce_to(value, &ty)?,
            None => value,
        };
        reference.write(value.copy_for_assign())
    }

    pub(super) fn set_field(&self, object: &ObjectRef, name: &Name, value: Value) -> Result<(), EvalError> {
        let value = match object.class().field_type(name) {
            Some(ty) => self.coerce_to(value, &ty)?,
            None => value,
        };
        object.borrow_mut().fields.insert(name.clone(), value.copy_for_assign());
        Ok(())
    }

    pub(super) fn set_class_var(&self, class: &ClassInfo, name: &Name, value: Value) -> Result<(), EvalError> {
        let value = match class.class_var_type(name) {
            Some(ty) => self.coerce_to(value, &ty)?,
            None => value,
        };
        class.set_class_var(name, value.copy_for_assign());
        Ok(())
    }

    fn assign_member(&mut self, object: &Expr, member: &Name, value: Value) -> ExecResult {
        if let ExprKind::Ident(unit_name) = &object.kind {
            if let Some(unit) = self.unit_named(unit_name) {
                if unit.env.get(member).is_none() {
                    return Err(undefined_variable(&format!("{unit_name}.{member}")).into());
                }
                return self.store_in_env(&unit.env, member, value);
            }
        }
        match self.eval_expr(object)?.unbox() {
            Value::Object(object) => self.assign_object_member(Receiver::Object(object), member, value),
            Value::Interface(intf) => {
                self.assign_object_member(Receiver::Object(intf.narrow(member)?), member, value)
            }
            Value::TypeMeta(meta) => match &meta.info {
                TypeInfo::Class(name) => {
                    let class = self.lookup_class(name)?;
                    self.assign_object_member(Receiver::Class(class), member, value)
                }
                other => Err(undefined_field(member.as_str(), &other.name()).into()),
            },
            Value::Record(record) => {
                let ty = Rc::clone(&record.borrow().ty);
                let index = ty
                    .field_index(member)
                    .ok_or_else(|| undefined_field(member.as_str(), ty.name.as_str()))?;
                let value = self.coerce_to(value, &ty.fields[index].ty)?;
                record.borrow_mut().values[index] = value.copy_for_assign();
                Ok(())
            }
            Value::Nil => Err(nil_reference(member.as_str()).into()),
            other => Err(undefined_field(member.as_str(), &other.type_name()).into()),
        }
    }

    fn assign_object_member(&mut self, receiver: Receiver, member: &Name, value: Value) -> ExecResult {
        let class = receiver.class();
        if let Receiver::Object(object) = &receiver {
            if class.has_field(member) {
                return Ok(self.set_field(object, member, value)?);
            }
        }
        if class.has_class_var(member) {
            return Ok(self.set_class_var(&class, member, value)?);
        }
        if class.constant(member).is_some() {
            return Err(constant_assignment(member.as_str()).into());
        }
        if let Some(property) = class.find_property(member) {
            if property.is_indexed() {
                return Err(indexed_property_without_index(member.as_str()).into());
            }
            return self.write_property(receiver, &property, Vec::new(), value);
        }
        Err(undefined_field(member.as_str(), class.name.as_str()).into())
    }

    /// `base[i, ...] := value`: array elements, string characters, and
    /// indexed or default properties.
    fn assign_index(&mut self, base: &Expr, indices: &[Expr], value: Value) -> ExecResult {
        if let ExprKind::Member { object, member } = &base.kind {
            let is_unit = matches!(&object.kind, ExprKind::Ident(name) if self.unit_named(name).is_some());
            if !is_unit {
                let target = self.eval_expr(object)?;
                if let Some(receiver) = self.receiver_of(&target)? {
                    let property = receiver.class().find_property(member);
                    if let Some(property) = property.filter(|p| p.is_indexed()) {
                        let args = self.eval_values(indices)?;
                        return self.write_property(receiver, &property, args, value);
                    }
                }
            }
        }
        if let ExprKind::Ident(name) = &base.kind {
            if self.env.get(name).is_none() {
                if let Some(context) = self.context.clone() {
                    let property = context.class.find_property(name);
                    if let Some(property) = property.filter(|p| p.is_indexed()) {
                        let args = self.eval_values(indices)?;
                        return self.write_property(context.receiver(), &property, args, value);
                    }
                }
            }
        }

        let container = self.eval_expr(base)?.unbox();
        let mut indices = self.eval_values(indices)?;
        match &container {
            Value::Object(object) => {
                if let Some(property) = object.class().default_property() {
                    return self.write_property(Receiver::Object(object.clone()), &property, indices, value);
                }
            }
            Value::Interface(intf) => {
                return Err(undefined_property("[]", intf.info.name.as_str()).into());
            }
            _ => {}
        }
        let last = indices.pop().ok_or_else(invalid_assignment_target)?;
        let nested = !indices.is_empty();
        let container = if nested {
            self.index_with(container, indices)?.unbox()
        } else {
            container
        };

        match container {
            Value::Array(array) => {
                let position = last
                    .ordinal()
                    .ok_or_else(|| expected_type("ordinal index", &last.type_name()))?;
                let element = array.borrow().element.clone();
                let value = self.coerce_to(value, &element)?;
                array.borrow_mut().set(position, value.copy_for_assign())?;
                Ok(())
            }
            Value::String(text) if !nested => {
                let updated = replace_char(&text, &last, value)?;
                self.assign_to(base, updated)
            }
            Value::Nil => Err(nil_reference("[]").into()),
            Value::String(_) => Err(invalid_assignment_target().into()),
            other => Err(expected_type("array", &other.type_name()).into()),
        }
    }

    /// Coerce `value` for storage into a slot of type `ty`.
    ///
    /// Integers widen to Float, anything boxes into Variant and unboxes out
    /// of it, subrange targets are range-checked, sets adopt the target's
    /// element type when untyped, anonymous records are rebuilt as the
    /// target record type, and objects convert to classes they inherit from
    /// or to interfaces they implement.
    #[expect(clippy::unused_self, reason = "called through the interpreter like every other store")]
    pub(crate) fn coerce_to(&self, value: Value, ty: &TypeInfo) -> Result<Value, EvalError> {
        coerce(value, ty)
    }

    /// A by-reference alias for `expr`, or `None` if it is not an lvalue.
    pub(super) fn reference_to(&mut self, expr: &Expr) -> Result<Option<Reference>, ControlAction> {
        match &expr.kind {
            ExprKind::Ident(name) => Ok(self.reference_to_name(name)),
            ExprKind::Member { object, member } => {
                if let ExprKind::Ident(unit_name) = &object.kind {
                    if let Some(unit) = self.unit_named(unit_name) {
                        return Ok(unit
                            .env
                            .get(member)
                            .map(|_| Reference::variable(&unit.env, member)));
                    }
                }
                let target = match self.eval_expr(object)?.unbox() {
                    // Interface contracts expose methods only.
                    Value::Interface(_) => return Ok(None),
                    Value::Object(object) => {
                        let class = object.class();
                        if class.has_field(member) {
                            RefTarget::Field {
                                object,
                                name: member.clone(),
                            }
                        } else if class.has_class_var(member) {
                            RefTarget::ClassVar {
                                class,
                                name: member.clone(),
                            }
                        } else {
                            return Ok(None);
                        }
                    }
                    Value::Record(record) => RefTarget::RecordField {
                        record,
                        name: member.clone(),
                    },
                    Value::TypeMeta(meta) => match &meta.info {
                        TypeInfo::Class(name) => {
                            let class = self.lookup_class(name)?;
                            if !class.has_class_var(member) {
                                return Ok(None);
                            }
                            RefTarget::ClassVar {
                                class,
                                name: member.clone(),
                            }
                        }
                        _ => return Ok(None),
                    },
                    _ => return Ok(None),
                };
                Ok(Some(Reference::new(target)))
            }
            ExprKind::Index { base, indices } => {
                let container = self.eval_expr(base)?;
                let mut indices = self.eval_values(indices)?;
                let Some(last) = indices.pop() else {
                    return Ok(None);
                };
                let container = if indices.is_empty() {
                    container
                } else {
                    self.index_with(container, indices)?
                };
                match (container.unbox(), last.ordinal()) {
                    (Value::Array(array), Some(index)) => {
                        Ok(Some(Reference::new(RefTarget::Element { array, index })))
                    }
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn reference_to_name(&self, name: &Name) -> Option<Reference> {
        if let Some(value) = self.env.get(name) {
            return match value {
                Value::Reference(reference) => Some(reference),
                Value::Lazy(_) => None,
                _ => Some(Reference::variable(&self.env, name)),
            };
        }
        if let Some(context) = &self.context {
            if let Some(object) = &context.self_object {
                if context.class.has_field(name) {
                    return Some(Reference::new(RefTarget::Field {
                        object: object.clone(),
                        name: name.clone(),
                    }));
                }
            }
            if context.class.has_class_var(name) {
                return Some(Reference::new(RefTarget::ClassVar {
                    class: Rc::clone(&context.class),
                    name: name.clone(),
                }));
            }
        }
        let result = Name::new("Result");
        let is_routine_name = self.routine.as_ref().is_some_and(|routine| &routine.name == name);
        if is_routine_name && self.env.get(&result).is_some() {
            return Some(Reference::variable(&self.env, &result));
        }
        let unit = self.units.resolve_unqualified(name)?;
        unit.env.get(name).map(|_| Reference::variable(&unit.env, name))
    }
}

fn coerce(value: Value, ty: &TypeInfo) -> Result<Value, EvalError> {
    let value = match value {
        Value::Reference(reference) => reference.read()?,
        other => other,
    };
    let coerced = match (ty, value) {
        (TypeInfo::Variant, value) => Value::variant(value),
        (_, Value::Variant(None)) => ty.default_value(),
        (_, Value::Variant(Some(inner))) => return coerce(Rc::unwrap_or_clone(inner), ty),
        (TypeInfo::Integer, value @ Value::Integer(_)) => value,
        (TypeInfo::Integer, Value::Subrange(sub)) => Value::Integer(sub.value),
        (TypeInfo::Float, value @ Value::Float(_)) => value,
        (TypeInfo::Float, Value::Integer(i)) => Value::Float(widen(i)),
        (TypeInfo::Float, Value::Subrange(sub)) => Value::Float(widen(sub.value)),
        (TypeInfo::String, value @ Value::String(_)) => value,
        (TypeInfo::Boolean, value @ Value::Boolean(_)) => value,
        (TypeInfo::Enum(expected), Value::Enum(actual)) if expected.name == actual.ty.name => {
            Value::Enum(actual)
        }
        (TypeInfo::Subrange(sub), value) => {
            let number = match &value {
                Value::Integer(i) => *i,
                Value::Subrange(other) => other.value,
                _ => return Err(expected_type(sub.name.as_str(), &value.type_name())),
            };
            if !sub.contains(number) {
                return Err(out_of_range(number, sub.name.as_str(), sub.low, sub.high));
            }
            Value::Subrange(SubrangeValue {
                value: number,
                ty: Rc::clone(sub),
            })
        }
        (TypeInfo::Set(expected), Value::Set(set)) => {
            if set.element().name() == expected.element.name() {
                Value::Set(set)
            } else if set.is_empty() || *set.element() == TypeInfo::Variant {
                Value::Set(set.with_element(expected.element.clone()))
            } else {
                return Err(expected_type(&ty.name(), &format!("set of {}", set.element())));
            }
        }
        (TypeInfo::Array(_), value @ Value::Array(_)) => value,
        (TypeInfo::Record(expected), Value::Record(record)) => {
            let actual = Rc::clone(&record.borrow().ty);
            if actual.name == expected.name {
                Value::Record(record)
            } else if actual.name.matches("record") {
                let mut rebuilt = RecordValue::with_defaults(expected);
                for (field, value) in actual.fields.iter().zip(&record.borrow().values) {
                    let index = expected
                        .field_index(&field.name)
                        .ok_or_else(|| undefined_field(field.name.as_str(), expected.name.as_str()))?;
                    rebuilt.values[index] = coerce(value.clone(), &expected.fields[index].ty)?;
                }
                Value::Record(Shared::new(rebuilt))
            } else {
                return Err(expected_type(expected.name.as_str(), actual.name.as_str()));
            }
        }
        (TypeInfo::Class(_) | TypeInfo::Interface(_) | TypeInfo::Function(_), Value::Nil) => Value::Nil,
        (TypeInfo::Class(name), Value::Object(object) | Value::Interface(InterfaceRef { object, .. }))
            if object.class().inherits_from(name) =>
        {
            Value::Object(object)
        }
        (TypeInfo::Interface(name), Value::Interface(intf)) if intf.info.extends(name) => {
            Value::Interface(intf)
        }
        (TypeInfo::Interface(name), Value::Object(object) | Value::Interface(InterfaceRef { object, .. })) => {
            match object.class().find_interface(name) {
                Some(info) => Value::Interface(InterfaceRef { info, object }),
                None => return Err(expected_type(name.as_str(), &object.class_name())),
            }
        }
        (TypeInfo::Function(_), value @ Value::Function(_)) => value,
        (ty, value) => return Err(expected_type(&ty.name(), &value.type_name())),
    };
    Ok(coerced)
}

/// `text` with its `index`th (1-based) character replaced.
fn replace_char(text: &str, index: &Value, value: Value) -> Result<Value, EvalError> {
    let position = index
        .as_integer()
        .ok_or_else(|| expected_type("Integer", &index.type_name()))?;
    let replacement = match value.unbox() {
        Value::String(s) => s,
        other => return Err(expected_type("String", &other.type_name())),
    };
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let slot = usize::try_from(position)
        .ok()
        .filter(|p| (1..=len).contains(p))
        .ok_or_else(|| index_out_of_bounds(position, 1, i64::try_from(len).unwrap_or(i64::MAX)))?;
    let mut updated = String::with_capacity(text.len() + replacement.len());
    updated.extend(&chars[..slot - 1]);
    updated.push_str(&replacement);
    updated.extend(&chars[slot..]);
    Ok(Value::from(updated))
}

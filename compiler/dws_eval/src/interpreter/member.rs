//! Member access (`a.b`), indexing (`a[i]`) and the TObject intrinsics.

use std::rc::Rc;

use dws_ir::{Expr, ExprKind, Name, Span};

use super::Interpreter;
use crate::class::ClassInfo;
use crate::errors::{
    expected_type, index_out_of_bounds, indexed_property_without_index, nil_reference,
    undefined_field, undefined_property, undefined_variable, wrong_argument_count, EvalError,
    EvalResult,
};
use crate::types::TypeInfo;
use crate::units::Unit;
use crate::value::{EnumValue, ObjectRef, Receiver, Value};

impl Interpreter {
    /// `object.member` read.
    pub(super) fn eval_member(&mut self, object: &Expr, member: &Name) -> EvalResult {
        if let ExprKind::Ident(name) = &object.kind {
            if let Some(unit) = self.unit_named(name) {
                return self.unit_member(&unit, member);
            }
        }
        let target = self.eval_expr(object)?;
        self.member_of(target, member)
    }

    /// Read `member` of an already evaluated value.
    pub(super) fn member_of(&mut self, target: Value, member: &Name) -> EvalResult {
        match target.unbox() {
            Value::Object(object) => self.object_member(Receiver::Object(object), member),
            Value::Interface(intf) => self.object_member(Receiver::Object(intf.narrow(member)?), member),
            Value::TypeMeta(meta) => match &meta.info {
                TypeInfo::Class(name) => {
                    let class = self.lookup_class(name)?;
                    self.object_member(Receiver::Class(class), member)
                }
                TypeInfo::Enum(ty) => ty
                    .ordinal_of(member)
                    .map(|ordinal| {
                        Value::Enum(EnumValue {
                            ty: Rc::clone(ty),
                            ordinal,
                        })
                    })
                    .ok_or_else(|| undefined_field(member.as_str(), ty.name.as_str()).into()),
                other => Err(undefined_field(member.as_str(), &other.name()).into()),
            },
            Value::Record(record) => Ok(record.borrow().get(member)?),
            Value::Nil => Err(nil_reference(member.as_str()).into()),
            other => Err(undefined_field(member.as_str(), &other.type_name()).into()),
        }
    }

    /// A member of an object, or of a class reference.
    ///
    /// Lookup order: class variable, class constant, field, property,
    /// intrinsic, then a parameterless method call.
    fn object_member(&mut self, receiver: Receiver, member: &Name) -> EvalResult {
        let class = receiver.class();
        if let Some(value) = class.class_var(member) {
            return Ok(value);
        }
        if let Some(value) = class.constant(member) {
            return Ok(value);
        }
        if let Receiver::Object(object) = &receiver {
            let field = object.borrow().field(member);
            if let Some(value) = field {
                return Ok(value);
            }
        }
        if let Some(property) = class.find_property(member) {
            if property.is_indexed() {
                return Err(indexed_property_without_index(member.as_str()).into());
            }
            return self.read_property(receiver, &property, Vec::new());
        }
        if let Some(value) = self.object_intrinsic(&class, member) {
            return Ok(value);
        }
        match receiver {
            Receiver::Object(object) if member.matches("Free") => self.free_object(&object),
            Receiver::Class(class)
                if member.matches("Create")
                    || !class.constructors(member).is_empty() =>
            {
                self.construct(&class, member, &[], Span::DUMMY)
            }
            receiver if class.has_method(member) => {
                self.call_method_with(receiver, member, Vec::new(), Span::DUMMY)
            }
            _ => Err(undefined_field(member.as_str(), class.name.as_str()).into()),
        }
    }

    /// `ClassName` and `ClassType`, available on objects and class references.
    pub(super) fn object_intrinsic(&mut self, class: &ClassInfo, member: &Name) -> Option<Value> {
        if member.matches("ClassName") {
            return Some(Value::string(class.name.as_str()));
        }
        if member.matches("ClassType") {
            return Some(self.type_meta(TypeInfo::Class(class.name.clone())));
        }
        None
    }

    /// `obj.Free`: runs the destructor, if any.
    pub(super) fn free_object(&mut self, object: &ObjectRef) -> EvalResult {
        let destroy = Name::new("Destroy");
        if object.class().has_method(&destroy) {
            self.call_method_with(Receiver::Object(object.clone()), &destroy, Vec::new(), Span::DUMMY)?;
        }
        Ok(Value::Nil)
    }

    /// `X.InheritsFrom(TClass)`.
    pub(super) fn inherits_from_call(&mut self, class: &ClassInfo, args: &[Expr]) -> EvalResult {
        let [arg] = args else {
            return Err(wrong_argument_count("InheritsFrom", 1, 1, args.len()).into());
        };
        match self.eval_expr(arg)?.unbox() {
            Value::TypeMeta(meta) => match &meta.info {
                TypeInfo::Class(name) => Ok(Value::Boolean(class.inherits_from(name))),
                other => Err(expected_type("class", &other.name()).into()),
            },
            Value::Nil => Ok(Value::Boolean(false)),
            other => Err(expected_type("class", &other.type_name()).into()),
        }
    }

    /// `Unit.Name`: a unit variable or constant, or a parameterless
    /// unit function.
    pub(super) fn unit_member(&mut self, unit: &Unit, name: &Name) -> EvalResult {
        if let Some(value) = unit.env.get(name) {
            return self.force(value);
        }
        if let Some(overloads) = unit.overloads(name) {
            let overloads = overloads.to_vec();
            return self.call_overloads(name, &overloads, Some(unit.env.clone()), &[], Span::DUMMY);
        }
        Err(undefined_variable(&format!("{}.{name}", unit.name)).into())
    }

    /// `base[i, j, ...]`.
    pub(super) fn eval_index(&mut self, base: &Expr, indices: &[Expr]) -> EvalResult {
        match &base.kind {
            ExprKind::Member { object, member }
                if !matches!(&object.kind, ExprKind::Ident(name) if self.unit_named(name).is_some()) =>
            {
                let target = self.eval_expr(object)?;
                if let Some(receiver) = self.receiver_of(&target)? {
                    let property = receiver.class().find_property(member);
                    if let Some(property) = property.filter(|p| p.is_indexed()) {
                        let args = self.eval_values(indices)?;
                        return self.read_property(receiver, &property, args);
                    }
                }
                let value = self.member_of(target, member)?;
                let indices = self.eval_values(indices)?;
                self.index_with(value, indices)
            }
            ExprKind::Ident(name) if self.env.get(name).is_none() => {
                let property = self
                    .context
                    .clone()
                    .and_then(|context| Some((context.class.find_property(name)?, context)));
                if let Some((property, context)) = property.filter(|(p, _)| p.is_indexed()) {
                    let args = self.eval_values(indices)?;
                    return self.read_property(context.receiver(), &property, args);
                }
                let value = self.eval_expr(base)?;
                let indices = self.eval_values(indices)?;
                self.index_with(value, indices)
            }
            _ => {
                let value = self.eval_expr(base)?;
                let indices = self.eval_values(indices)?;
                self.index_with(value, indices)
            }
        }
    }

    /// The receiver an object, interface or class reference stands for.
    pub(super) fn receiver_of(&self, value: &Value) -> Result<Option<Receiver>, EvalError> {
        Ok(match value {
            Value::Object(object) => Some(Receiver::Object(object.clone())),
            Value::TypeMeta(meta) => match &meta.info {
                TypeInfo::Class(name) => Some(Receiver::Class(self.lookup_class(name)?)),
                _ => None,
            },
            Value::Variant(Some(inner)) => self.receiver_of(inner)?,
            _ => None,
        })
    }

    /// Apply `indices` one at a time. An object consumes as many indices
    /// as its default property declares.
    pub(super) fn index_with(&mut self, value: Value, indices: Vec<Value>) -> EvalResult {
        let mut current = value;
        let mut rest = indices.into_iter();
        while let Some(index) = rest.next() {
            current = match current.unbox() {
                Value::Array(array) => {
                    let position = index
                        .ordinal()
                        .ok_or_else(|| expected_type("ordinal index", &index.type_name()))?;
                    let element = array.borrow().get(position)?;
                    element
                }
                Value::String(text) => string_char(&text, &index)?,
                Value::Interface(intf) => {
                    return Err(undefined_property("[]", intf.info.name.as_str()).into());
                }
                Value::Object(object) => {
                    let class = object.class();
                    let property = class
                        .default_property()
                        .ok_or_else(|| undefined_property("[]", class.name.as_str()))?;
                    let extra = property.decl.index_params.len().saturating_sub(1);
                    let mut args = vec![index];
                    args.extend(rest.by_ref().take(extra));
                    self.read_property(Receiver::Object(object), &property, args)?
                }
                Value::Nil => return Err(nil_reference("[]").into()),
                other => return Err(expected_type("array", &other.type_name()).into()),
            };
        }
        Ok(current)
    }
}

/// 1-based character access.
fn string_char(text: &str, index: &Value) -> Result<Value, EvalError> {
    let position = index
        .as_integer()
        .ok_or_else(|| expected_type("Integer", &index.type_name()))?;
    let len = text.chars().count();
    usize::try_from(position)
        .ok()
        .filter(|p| (1..=len).contains(p))
        .and_then(|p| text.chars().nth(p - 1))
        .map(|c| Value::from(c.to_string()))
        .ok_or_else(|| index_out_of_bounds(position, 1, i64::try_from(len).unwrap_or(i64::MAX)))
}

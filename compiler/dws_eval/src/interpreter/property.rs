//! Property reads and writes.
//!
//! A property access resolves to a field, class variable, constant, method
//! or another property of the receiver's class; read-only properties may
//! instead carry an expression. Every access in progress is recorded in
//! `property_chain` as `(receiver address, property name)`, so an accessor
//! that leads back to a property already being accessed on the same
//! receiver fails with `CircularPropertyReference` instead of recursing.

use std::rc::Rc;

use dws_ir::{Expr, FunctionDecl, MethodFlags, Name, PropertyAccess, Span};

use super::Interpreter;
use crate::class::{MethodContext, PropertyInfo};
use crate::environment::Mutability;
use crate::errors::{
    circular_property_reference, read_only_property, undefined_field, write_only_property,
    EvalResult, ExecResult,
};
use crate::value::{Receiver, Value};

impl Interpreter {
    /// Read `property` on `receiver`; `args` are the index arguments.
    pub(crate) fn read_property(
        &mut self,
        receiver: Receiver,
        property: &Rc<PropertyInfo>,
        args: Vec<Value>,
    ) -> EvalResult {
        self.enter_property(&receiver, property)?;
        let result = match &property.decl.read {
            None => Err(write_only_property(property.name().as_str()).into()),
            Some(PropertyAccess::Member(member)) => self.read_accessor(receiver, member, args),
            Some(PropertyAccess::Expression(expr)) => {
                self.read_expression(receiver, property, args, expr)
            }
        };
        self.property_chain.pop();
        result
    }

    /// Write `value` through `property` on `receiver`.
    pub(crate) fn write_property(
        &mut self,
        receiver: Receiver,
        property: &Rc<PropertyInfo>,
        args: Vec<Value>,
        value: Value,
    ) -> ExecResult {
        let value = self.coerce_to(value, &property.ty)?;
        self.enter_property(&receiver, property)?;
        let result = match &property.decl.write {
            Some(PropertyAccess::Member(member)) => self.write_accessor(receiver, member, args, value),
            Some(PropertyAccess::Expression(_)) | None => {
                Err(read_only_property(property.name().as_str()).into())
            }
        };
        self.property_chain.pop();
        result
    }

    fn enter_property(&mut self, receiver: &Receiver, property: &PropertyInfo) -> ExecResult {
        let key = (receiver.addr(), property.name().clone());
        if self.property_chain.contains(&key) {
            return Err(circular_property_reference(property.name().as_str()).into());
        }
        self.property_chain.push(key);
        Ok(())
    }

    fn read_accessor(&mut self, receiver: Receiver, member: &Name, args: Vec<Value>) -> EvalResult {
        let class = receiver.class();
        if args.is_empty() {
            if let Receiver::Object(object) = &receiver {
                let field = object.borrow().field(member);
                if let Some(value) = field {
                    return Ok(value);
                }
            }
            if let Some(value) = class.class_var(member).or_else(|| class.constant(member)) {
                return Ok(value);
            }
        }
        if class.has_method(member) {
            return self.call_method_with(receiver, member, args, Span::DUMMY);
        }
        if let Some(chained) = class.find_property(member) {
            return self.read_property(receiver, &chained, args);
        }
        Err(undefined_field(member.as_str(), class.name.as_str()).into())
    }

    fn write_accessor(&mut self, receiver: Receiver, member: &Name, args: Vec<Value>, value: Value) -> ExecResult {
        let class = receiver.class();
        if args.is_empty() {
            if let Receiver::Object(object) = &receiver {
                if class.has_field(member) {
                    return Ok(self.set_field(object, member, value)?);
                }
            }
            if class.has_class_var(member) {
                return Ok(self.set_class_var(&class, member, value)?);
            }
        }
        if class.has_method(member) {
            let mut args = args;
            args.push(value);
            self.call_method_with(receiver, member, args, Span::DUMMY)?;
            return Ok(());
        }
        if let Some(chained) = class.find_property(member) {
            return self.write_property(receiver, &chained, args, value);
        }
        Err(undefined_field(member.as_str(), class.name.as_str()).into())
    }

    /// An expression accessor runs as if it were a method body: `Self`,
    /// fields and methods resolve, and index parameters are locals.
    fn read_expression(
        &mut self,
        receiver: Receiver,
        property: &PropertyInfo,
        args: Vec<Value>,
        expr: &Expr,
    ) -> EvalResult {
        let class = receiver.class();
        let mut method = FunctionDecl::function(property.name().as_str(), property.decl.ty.clone());
        if property.decl.is_class {
            method = method.with_flags(MethodFlags::CLASS);
        }
        let self_object = match receiver {
            Receiver::Object(object) if !property.decl.is_class => Some(object),
            _ => None,
        };
        let context = MethodContext {
            self_object,
            owner: Rc::clone(&class),
            class,
            method: Rc::new(method),
        };

        let env = self.global.child();
        for (param, arg) in property.decl.index_params.iter().zip(args) {
            let ty = self.resolve_type(&param.ty)?;
            let arg = self.coerce_to(arg, &ty)?;
            env.define(param.name.clone(), arg, Some(ty), Mutability::Immutable);
        }
        let value = self.with_scope(env, Some(Rc::new(context)), |scoped| scoped.eval_expr(expr))?;
        Ok(self.coerce_to(value, &property.ty)?)
    }
}

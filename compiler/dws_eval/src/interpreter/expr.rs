//! Expression evaluation and identifier resolution.

use std::rc::Rc;

use dws_ir::{BinaryOp, Expr, ExprKind, FunctionDecl, Name, SetElement, Span};

use super::Interpreter;
use crate::builtins::type_info_of;
use crate::class::MethodContext;
use crate::environment::Environment;
use crate::errors::{
    expected_type, indexed_property_without_index, undefined_field, undefined_type,
    undefined_variable, ControlAction, EvalError, EvalResult,
};
use crate::operators::widen;
use crate::stack::ensure_sufficient_stack;
use crate::types::{RecordField, RecordType, TypeInfo};
use crate::value::{
    ArrayValue, Callable, FunctionPointer, LazyState, LazyThunk, RecordValue, SetValue, Shared,
    TypeMeta, Value,
};

impl Interpreter {
    /// Evaluate an expression.
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr))
            .map_err(|action| action.with_span(expr.span))
    }

    /// Evaluate `expr` in `env` outside any method, for load-time
    /// initializers.
    pub(crate) fn eval_in(&mut self, env: Environment, expr: &Expr) -> Result<Value, EvalError> {
        self.with_scope(env, None, |scoped| scoped.eval_expr(expr))
            .map_err(|action| self.report(action))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> EvalResult {
        match &expr.kind {
            ExprKind::Int(i) => Ok(Value::Integer(*i)),
            ExprKind::Float(x) => Ok(Value::Float(*x)),
            ExprKind::Str(s) => Ok(Value::string(s)),
            ExprKind::Bool(b) => Ok(Value::Boolean(*b)),
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Ident(name) => self.resolve_ident(name),
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right),
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(operand)?;
                self.apply_unary(*op, operand)
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args, expr.span),
            ExprKind::Member { object, member } => self.eval_member(object, member),
            ExprKind::Index { base, indices } => self.eval_index(base, indices),
            ExprKind::New { class, args } => {
                let class = self.lookup_class(class)?;
                self.construct(&class, &Name::new("Create"), args, expr.span)
            }
            ExprKind::SelfRef => self.eval_self(),
            ExprKind::Inherited { method, args } => {
                self.eval_inherited(method.as_ref(), args.as_deref(), expr.span)
            }
            ExprKind::AddressOf(target) => self.eval_address_of(target),
            ExprKind::Lambda(decl) => Ok(self.closure(decl)),
            ExprKind::ArrayLiteral(items) => self.eval_array_literal(items),
            ExprKind::SetLiteral(elements) => self.eval_set_literal(elements),
            ExprKind::RecordLiteral { type_name, fields } => {
                self.eval_record_literal(type_name.as_ref(), fields)
            }
            ExprKind::Is { value, class } => self.eval_is(value, class),
            ExprKind::As { value, target } => self.eval_as(value, target),
            ExprKind::Implements { value, interface } => self.eval_implements(value, interface),
            ExprKind::IfExpr {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(cond)? {
                    self.eval_expr(then_branch)
                } else {
                    self.eval_expr(else_branch)
                }
            }
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> EvalResult {
        let left = self.eval_expr(left)?;
        if op.is_short_circuit() {
            match (op, &left) {
                (BinaryOp::And, Value::Boolean(false)) => return Ok(Value::Boolean(false)),
                (BinaryOp::Or, Value::Boolean(true)) => return Ok(Value::Boolean(true)),
                _ => {}
            }
        }
        let right = self.eval_expr(right)?;
        self.apply_binary(op, left, right)
    }

    /// Read through `var` aliases and force `lazy` thunks.
    pub(crate) fn force(&mut self, value: Value) -> EvalResult {
        match value {
            Value::Reference(reference) => {
                let value = reference.read()?;
                self.force(value)
            }
            Value::Lazy(thunk) => self.force_lazy(&thunk),
            other => Ok(other),
        }
    }

    /// Evaluate a lazy argument in its caller's scope, at most once.
    fn force_lazy(&mut self, thunk: &LazyThunk) -> EvalResult {
        match thunk.state() {
            LazyState::Done(value) => Ok(value),
            LazyState::Pending { expr, env, context } => {
                let value = self.with_scope(env, context, |scoped| scoped.eval_expr(&expr))?;
                thunk.resolve(value.clone());
                Ok(value)
            }
        }
    }

    /// Resolve a bare identifier.
    ///
    /// Order: locals, members of `Self`, globals, the running routine's
    /// name as `Result`, functions (called without arguments), types, enum
    /// members, `ExceptObject`, unit symbols, built-ins.
    pub(super) fn resolve_ident(&mut self, name: &Name) -> EvalResult {
        if let Some(value) = self.env.get_before(name, &self.global) {
            return self.force(value);
        }
        if let Some(context) = self.context.clone() {
            if let Some(value) = self.self_member(&context, name)? {
                return Ok(value);
            }
        }
        if let Some(value) = self.global.get(name) {
            return self.force(value);
        }
        if self.routine.as_ref().is_some_and(|routine| &routine.name == name) {
            if let Some(value) = self.env.get(&Name::new("Result")) {
                return self.force(value);
            }
        }
        if let Some(overloads) = self.functions.get(name).cloned() {
            return self.call_overloads(name, &overloads, None, &[], Span::DUMMY);
        }
        if let Some(info) = self.types.get(name).cloned() {
            return Ok(self.type_meta(info));
        }
        if let Some(member) = self.enum_members.get(name) {
            return Ok(Value::Enum(member.clone()));
        }
        if name.matches("ExceptObject") {
            return Ok(self
                .handler_exception
                .as_ref()
                .map_or(Value::Nil, |active| Value::Object(active.object.clone())));
        }
        if let Some(unit) = self.units.resolve_unqualified(name) {
            return self.unit_member(&unit, name);
        }
        if let Some(builtin) = self.builtins.get(name) {
            return self.call_builtin(&builtin, &[], Span::DUMMY);
        }
        Err(undefined_variable(name.as_str()).into())
    }

    /// A member of the running method's class reached by bare name.
    fn self_member(
        &mut self,
        context: &MethodContext,
        name: &Name,
    ) -> Result<Option<Value>, ControlAction> {
        let class = &context.class;
        if let Some(value) = class.class_var(name) {
            return Ok(Some(value));
        }
        if let Some(value) = class.constant(name) {
            return Ok(Some(value));
        }
        if let Some(object) = &context.self_object {
            if let Some(value) = object.borrow().field(name) {
                return Ok(Some(value));
            }
        }
        if let Some(property) = class.find_property(name) {
            if property.is_indexed() {
                return Err(indexed_property_without_index(name.as_str()).into());
            }
            return self
                .read_property(context.receiver(), &property, Vec::new())
                .map(Some);
        }
        if class.has_method(name) {
            return self
                .call_method_with(context.receiver(), name, Vec::new(), Span::DUMMY)
                .map(Some);
        }
        Ok(None)
    }

    fn eval_self(&mut self) -> EvalResult {
        match self.context.clone() {
            Some(context) => match &context.self_object {
                Some(object) => Ok(Value::Object(object.clone())),
                None => Ok(self.type_meta(TypeInfo::Class(context.class.name.clone()))),
            },
            None => Err(undefined_variable("Self").into()),
        }
    }

    /// A first-class type token with this interpreter's RTTI id.
    pub(crate) fn type_meta(&mut self, info: TypeInfo) -> Value {
        let id = self.type_ids.id_of(&info);
        Value::TypeMeta(TypeMeta { id, info })
    }

    fn closure(&self, decl: &Rc<FunctionDecl>) -> Value {
        Value::Function(FunctionPointer {
            callable: Callable::Closure {
                decl: Rc::clone(decl),
                env: self.env.clone(),
                context: self.context.clone(),
            },
            receiver: None,
        })
    }

    /// Evaluate each expression in order.
    pub(crate) fn eval_values(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, ControlAction> {
        exprs.iter().map(|expr| self.eval_expr(expr)).collect()
    }

    /// `[a, b, c]`: elements share the first element's type, Integers
    /// widen to Float next to Floats, anything else mixed is boxed.
    fn eval_array_literal(&mut self, items: &[Expr]) -> EvalResult {
        let values: Vec<Value> = self
            .eval_values(items)?
            .into_iter()
            .map(|value| value.copy_for_assign())
            .collect();
        let element = literal_element_type(&values);
        let values = match element {
            TypeInfo::Variant => values.into_iter().map(Value::variant).collect(),
            TypeInfo::Float => values
                .into_iter()
                .map(|value| match value {
                    Value::Integer(i) => Value::Float(widen(i)),
                    other => other,
                })
                .collect(),
            _ => values,
        };
        Ok(Value::Array(Shared::new(ArrayValue::dynamic(element, values))))
    }

    fn eval_set_literal(&mut self, elements: &[SetElement]) -> EvalResult {
        let mut set: Option<SetValue> = None;
        for element in elements {
            let (low, high) = match element {
                SetElement::Single(expr) => {
                    let value = self.eval_expr(expr)?;
                    let ordinal = set_ordinal(&value)?;
                    set.get_or_insert_with(|| SetValue::empty(set_element_type(&value)));
                    (ordinal, ordinal)
                }
                SetElement::Range(low, high) => {
                    let low = self.eval_expr(low)?;
                    let high = self.eval_expr(high)?;
                    set.get_or_insert_with(|| SetValue::empty(set_element_type(&low)));
                    (set_ordinal(&low)?, set_ordinal(&high)?)
                }
            };
            if let Some(set) = set.as_mut() {
                for ordinal in low..=high {
                    set.insert(ordinal)?;
                }
            }
        }
        Ok(Value::Set(
            set.unwrap_or_else(|| SetValue::empty(TypeInfo::Variant)),
        ))
    }

    fn eval_record_literal(&mut self, type_name: Option<&Name>, fields: &[(Name, Expr)]) -> EvalResult {
        let Some(type_name) = type_name else {
            let mut record_fields = Vec::with_capacity(fields.len());
            let mut values = Vec::with_capacity(fields.len());
            for (name, expr) in fields {
                let value = self.eval_expr(expr)?.copy_for_assign();
                record_fields.push(RecordField {
                    name: name.clone(),
                    ty: type_info_of(&value),
                    default: None,
                });
                values.push(value);
            }
            let ty = Rc::new(RecordType {
                name: Name::new("record"),
                fields: record_fields,
            });
            return Ok(Value::Record(Shared::new(RecordValue { ty, values })));
        };

        let Some(TypeInfo::Record(ty)) = self.types.get(type_name).cloned() else {
            return Err(undefined_type(type_name.as_str()).into());
        };
        let mut record = RecordValue::with_defaults(&ty);
        for (name, expr) in fields {
            let index = ty
                .field_index(name)
                .ok_or_else(|| undefined_field(name.as_str(), ty.name.as_str()))?;
            let value = self.eval_expr(expr)?;
            let value = self.coerce_to(value, &ty.fields[index].ty)?;
            record.values[index] = value.copy_for_assign();
        }
        Ok(Value::Record(Shared::new(record)))
    }
}

fn literal_element_type(values: &[Value]) -> TypeInfo {
    let Some(first) = values.first() else {
        return TypeInfo::Variant;
    };
    let first_name = first.type_name();
    if values.iter().all(|value| value.type_name() == first_name) {
        return type_info_of(first);
    }
    let numeric = values
        .iter()
        .all(|value| matches!(value, Value::Integer(_) | Value::Float(_)));
    if numeric {
        TypeInfo::Float
    } else {
        TypeInfo::Variant
    }
}

fn set_ordinal(value: &Value) -> Result<i64, EvalError> {
    value
        .ordinal()
        .ok_or_else(|| expected_type("ordinal", &value.type_name()))
}

fn set_element_type(value: &Value) -> TypeInfo {
    match value {
        Value::Enum(e) => TypeInfo::Enum(Rc::clone(&e.ty)),
        Value::Boolean(_) => TypeInfo::Boolean,
        Value::String(_) => TypeInfo::String,
        Value::Variant(Some(inner)) => set_element_type(inner),
        _ => TypeInfo::Integer,
    }
}

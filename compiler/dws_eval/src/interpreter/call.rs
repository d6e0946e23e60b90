//! Calls: argument preparation, overload selection, parameter binding and
//! invocation of functions, methods, closures and built-ins.
//!
//! Every script routine body runs through [`Interpreter::invoke`], which
//! pushes the call frame (checking the recursion limit first), binds
//! parameters into a fresh child of the routine's base scope, runs the body
//! and consumes `Exit`.

use std::rc::Rc;

use dws_ir::{Expr, ExprKind, FunctionDecl, Name, ParamMode, Span};

use super::Interpreter;
use crate::builtins::{Builtin, BuiltinContext, BuiltinError};
use crate::class::{select_overload, Candidate, ClassInfo, MethodContext, MethodRef, PreparedArg};
use crate::diagnostics::CallFrame;
use crate::environment::{Environment, Mutability};
use crate::errors::{
    abstract_method_call, nil_reference, not_callable, undefined_function, undefined_method,
    wrong_argument_count, ControlAction, EvalError, EvalResult,
};
use crate::stack::ensure_sufficient_stack;
use crate::types::TypeInfo;
use crate::units::Unit;
use crate::value::{Callable, FunctionPointer, LazyThunk, ObjectRef, Receiver, Reference, Value};

/// Arguments ready to bind, plus their values for overload ranking
/// (`None` for unevaluated lazy arguments).
type Prepared = (Vec<PreparedArg>, Vec<Option<Value>>);

/// One routine body about to run.
struct Invocation<'a> {
    decl: &'a Rc<FunctionDecl>,
    /// Name shown in backtraces.
    frame: String,
    /// Scope the parameter scope is a child of.
    base_env: Environment,
    context: Option<Rc<MethodContext>>,
    args: Vec<PreparedArg>,
    span: Span,
}

impl Interpreter {
    /// `callee(args)`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> EvalResult {
        match &callee.kind {
            ExprKind::Ident(name) => self.call_named(name, args, span),
            ExprKind::Member { object, member } => self.call_member(object, member, args, span),
            _ => {
                let target = self.eval_expr(callee)?;
                self.call_value(target, args, span)
            }
        }
    }

    fn call_value(&mut self, target: Value, args: &[Expr], span: Span) -> EvalResult {
        match target.unbox() {
            Value::Function(pointer) => self.call_pointer(&pointer, args, span),
            Value::Nil => Err(nil_reference("()").into()),
            other => Err(not_callable(&other.type_name()).into()),
        }
    }

    /// A call by bare name: function-valued variable, type cast, method of
    /// `Self`, function, unit function, built-in.
    fn call_named(&mut self, name: &Name, args: &[Expr], span: Span) -> EvalResult {
        if let Some(value) = self.env.get(name) {
            return match self.force(value)?.unbox() {
                Value::Function(pointer) => self.call_pointer(&pointer, args, span),
                other => Err(not_callable(&other.type_name()).into()),
            };
        }
        if let [arg] = args {
            if let Some(info) = self.types.get(name).cloned() {
                let value = self.eval_expr(arg)?;
                return Ok(self.cast_value(&info, value)?);
            }
        }
        if let Some(context) = self.context.clone() {
            if context.class.has_method(name) {
                return self.call_method(context.receiver(), name, args, span);
            }
            let field = context
                .self_object
                .as_ref()
                .and_then(|object| object.borrow().field(name));
            if let Some(Value::Function(pointer)) = field {
                return self.call_pointer(&pointer, args, span);
            }
        }
        if let Some(overloads) = self.functions.get(name).cloned() {
            return self.call_overloads(name, &overloads, None, args, span);
        }
        if let Some(unit) = self.units.resolve_unqualified(name) {
            return self.call_unit_function(&unit, name, args, span);
        }
        if let Some(builtin) = self.builtins.get(name) {
            return self.call_builtin(&builtin, args, span);
        }
        Err(undefined_function(name.as_str()).into())
    }

    /// `object.member(args)`.
    fn call_member(&mut self, object: &Expr, member: &Name, args: &[Expr], span: Span) -> EvalResult {
        if let ExprKind::Ident(unit_name) = &object.kind {
            if let Some(unit) = self.unit_named(unit_name) {
                return self.call_unit_function(&unit, member, args, span);
            }
        }
        match self.eval_expr(object)?.unbox() {
            Value::Object(object) => self.call_object_method(object, member, args, span),
            Value::Interface(intf) => self.call_object_method(intf.narrow(member)?, member, args, span),
            Value::TypeMeta(meta) => match &meta.info {
                TypeInfo::Class(name) => {
                    let class = self.lookup_class(name)?;
                    self.call_class_member(class, member, args, span)
                }
                other => Err(undefined_method(member.as_str(), &other.name()).into()),
            },
            Value::Record(record) => {
                let field = record.borrow().get(member)?;
                self.call_value(field, args, span)
            }
            Value::Nil => Err(nil_reference(member.as_str()).into()),
            other => Err(undefined_method(member.as_str(), &other.type_name()).into()),
        }
    }

    fn call_object_method(
        &mut self,
        object: ObjectRef,
        member: &Name,
        args: &[Expr],
        span: Span,
    ) -> EvalResult {
        let class = object.class();
        if class.has_method(member) {
            return self.call_method(Receiver::Object(object), member, args, span);
        }
        if member.matches("Free") {
            return self.free_object(&object);
        }
        if member.matches("InheritsFrom") {
            return self.inherits_from_call(&class, args);
        }
        if args.is_empty() {
            if let Some(value) = self.object_intrinsic(&class, member) {
                return Ok(value);
            }
        }
        let field = object.borrow().field(member);
        match field {
            Some(value @ (Value::Function(_) | Value::Variant(_))) => self.call_value(value, args, span),
            _ => Err(undefined_method(member.as_str(), class.name.as_str()).into()),
        }
    }

    /// `TClass.member(args)`: constructors, class methods, instance methods
    /// on a fresh instance, and the class intrinsics.
    fn call_class_member(
        &mut self,
        class: Rc<ClassInfo>,
        member: &Name,
        args: &[Expr],
        span: Span,
    ) -> EvalResult {
        let overloads = class.method_overloads(member);
        if member.matches("Create") || overloads.iter().any(|m| m.decl.is_constructor()) {
            return self.construct(&class, member, args, span);
        }
        if !overloads.is_empty() {
            return self.call_method(Receiver::Class(class), member, args, span);
        }
        if member.matches("InheritsFrom") {
            return self.inherits_from_call(&class, args);
        }
        if args.is_empty() {
            if let Some(value) = self.object_intrinsic(&class, member) {
                return Ok(value);
            }
        }
        Err(undefined_method(member.as_str(), class.name.as_str()).into())
    }

    /// The unit called `name`, unless a variable shadows it.
    pub(super) fn unit_named(&self, name: &Name) -> Option<Rc<Unit>> {
        if self.env.get(name).is_some() {
            return None;
        }
        self.units.get(name)
    }

    fn call_unit_function(&mut self, unit: &Unit, name: &Name, args: &[Expr], span: Span) -> EvalResult {
        if let Some(overloads) = unit.overloads(name) {
            let overloads = overloads.to_vec();
            return self.call_overloads(name, &overloads, Some(unit.env.clone()), args, span);
        }
        if let Some(value) = unit.env.get(name) {
            return self.call_value(value, args, span);
        }
        Err(undefined_function(&format!("{}.{name}", unit.name)).into())
    }

    /// Call through a function pointer or closure.
    pub(super) fn call_pointer(&mut self, pointer: &FunctionPointer, args: &[Expr], span: Span) -> EvalResult {
        match &pointer.callable {
            Callable::Declared {
                decl,
                owner: Some(owner),
            } => {
                let (prepared, _) = self.prepare_args(args, &[decl.as_ref()])?;
                let receiver = pointer
                    .receiver
                    .clone()
                    .unwrap_or_else(|| Receiver::Class(Rc::clone(owner)));
                let method = MethodRef {
                    owner: Rc::clone(owner),
                    decl: Rc::clone(decl),
                };
                self.dispatch_method(&method, receiver, prepared, span)
            }
            Callable::Declared { decl, owner: None } => {
                let (prepared, _) = self.prepare_args(args, &[decl.as_ref()])?;
                self.invoke_function(decl, None, prepared, span)
            }
            Callable::Closure { decl, env, context } => {
                let (prepared, _) = self.prepare_args(args, &[decl.as_ref()])?;
                self.invoke(Invocation {
                    decl,
                    frame: "lambda".to_string(),
                    base_env: env.clone(),
                    context: context.clone(),
                    args: prepared,
                    span,
                })
            }
            Callable::Builtin(name) => {
                let builtin = self
                    .builtins
                    .get(name)
                    .ok_or_else(|| undefined_function(name.as_str()))?;
                self.call_builtin(&builtin, args, span)
            }
        }
    }

    /// Evaluate arguments once for a call to one of `decls`.
    ///
    /// Arguments feeding a `lazy` parameter stay unevaluated; lvalues
    /// feeding a `var` parameter become references.
    pub(super) fn prepare_args(&mut self, args: &[Expr], decls: &[&FunctionDecl]) -> Result<Prepared, ControlAction> {
        let mut prepared = Vec::with_capacity(args.len());
        let mut ranking = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let modes = decls
                .iter()
                .filter_map(|decl| decl.params.get(index).map(|param| param.mode));
            let (mut lazy, mut by_ref) = (false, false);
            for mode in modes {
                match mode {
                    ParamMode::Lazy => lazy = true,
                    ParamMode::Var => by_ref = true,
                    ParamMode::Value | ParamMode::Const => {}
                }
            }
            if lazy {
                prepared.push(PreparedArg::Deferred(arg.clone()));
                ranking.push(None);
                continue;
            }
            if by_ref {
                if let Some(reference) = self.reference_to(arg)? {
                    ranking.push(Some(reference.read()?));
                    prepared.push(PreparedArg::Reference(reference));
                    continue;
                }
            }
            let value = self.eval_expr(arg)?;
            ranking.push(Some(value.clone()));
            prepared.push(PreparedArg::Value(value));
        }
        Ok((prepared, ranking))
    }

    fn candidate(&self, decl: &FunctionDecl) -> Result<Candidate, EvalError> {
        let params = decl
            .params
            .iter()
            .map(|param| Ok((param.mode, self.resolve_type(&param.ty)?)))
            .collect::<Result<Vec<_>, EvalError>>()?;
        let types: Vec<String> = params.iter().map(|(_, ty)| ty.name()).collect();
        Ok(Candidate {
            label: format!("{}({})", decl.name, types.join(", ")),
            params,
            required: decl.required_params(),
        })
    }

    /// Index of the overload in `decls` that best fits `args`.
    pub(super) fn select_index(&self, name: &str, decls: &[&FunctionDecl], args: &[Option<Value>]) -> Result<usize, EvalError> {
        match decls {
            [] => Err(undefined_function(name)),
            [_] => Ok(0),
            _ => {
                let candidates = decls
                    .iter()
                    .map(|decl| self.candidate(decl))
                    .collect::<Result<Vec<_>, EvalError>>()?;
                select_overload(name, &candidates, args)
            }
        }
    }

    /// Pick the overload of a free function that best fits `args`.
    pub(crate) fn select_function(
        &self,
        name: &str,
        overloads: &[Rc<FunctionDecl>],
        args: &[Option<Value>],
    ) -> Result<Rc<FunctionDecl>, EvalError> {
        let decls: Vec<&FunctionDecl> = overloads.iter().map(AsRef::as_ref).collect();
        let index = self.select_index(name, &decls, args)?;
        Ok(Rc::clone(&overloads[index]))
    }

    /// Call one of `overloads` with argument expressions.
    pub(super) fn call_overloads(
        &mut self,
        name: &Name,
        overloads: &[Rc<FunctionDecl>],
        base_env: Option<Environment>,
        args: &[Expr],
        span: Span,
    ) -> EvalResult {
        let decls: Vec<&FunctionDecl> = overloads.iter().map(AsRef::as_ref).collect();
        let (prepared, ranking) = self.prepare_args(args, &decls)?;
        let index = self.select_index(name.as_str(), &decls, &ranking)?;
        self.invoke_function(&overloads[index], base_env, prepared, span)
    }

    /// Run a free function. `base_env` is the global scope unless the
    /// function belongs to a unit.
    pub(crate) fn invoke_function(
        &mut self,
        decl: &Rc<FunctionDecl>,
        base_env: Option<Environment>,
        args: Vec<PreparedArg>,
        span: Span,
    ) -> EvalResult {
        let base_env = base_env.unwrap_or_else(|| self.global.clone());
        self.invoke(Invocation {
            decl,
            frame: decl.name.to_string(),
            base_env,
            context: None,
            args,
            span,
        })
    }

    /// Call the method `name` on `receiver` with argument expressions.
    pub(crate) fn call_method(&mut self, receiver: Receiver, name: &Name, args: &[Expr], span: Span) -> EvalResult {
        let class = receiver.class();
        let overloads = class.method_overloads(name);
        if overloads.is_empty() {
            return Err(undefined_method(name.as_str(), class.name.as_str()).into());
        }
        let decls: Vec<&FunctionDecl> = overloads.iter().map(|m| m.decl.as_ref()).collect();
        let (prepared, ranking) = self.prepare_args(args, &decls)?;
        let index = self.select_index(&format!("{}.{name}", class.name), &decls, &ranking)?;
        self.dispatch_method(&overloads[index], receiver, prepared, span)
    }

    /// Call the method `name` on `receiver` with evaluated arguments.
    pub(crate) fn call_method_with(
        &mut self,
        receiver: Receiver,
        name: &Name,
        values: Vec<Value>,
        span: Span,
    ) -> EvalResult {
        let class = receiver.class();
        let overloads = class.method_overloads(name);
        if overloads.is_empty() {
            return Err(undefined_method(name.as_str(), class.name.as_str()).into());
        }
        let decls: Vec<&FunctionDecl> = overloads.iter().map(|m| m.decl.as_ref()).collect();
        let ranking: Vec<Option<Value>> = values.iter().cloned().map(Some).collect();
        let index = self.select_index(&format!("{}.{name}", class.name), &decls, &ranking)?;
        let prepared = values.into_iter().map(PreparedArg::Value).collect();
        self.dispatch_method(&overloads[index], receiver, prepared, span)
    }

    /// Run `method` on `receiver`. Instance methods and constructors called
    /// on a class reference get a freshly allocated instance.
    pub(super) fn dispatch_method(
        &mut self,
        method: &MethodRef,
        receiver: Receiver,
        args: Vec<PreparedArg>,
        span: Span,
    ) -> EvalResult {
        match receiver {
            Receiver::Class(class) if !method.decl.is_class_method() => {
                let object = self.instantiate(&class)?;
                self.invoke_method(method, Receiver::Object(object), args, span)
            }
            receiver => self.invoke_method(method, receiver, args, span),
        }
    }

    /// Run `method` with `receiver` bound as `Self` (or as the current class
    /// inside a class method). Constructors return the object.
    #[tracing::instrument(level = "debug", skip_all, fields(method = %method.decl.name))]
    pub(crate) fn invoke_method(
        &mut self,
        method: &MethodRef,
        receiver: Receiver,
        args: Vec<PreparedArg>,
        span: Span,
    ) -> EvalResult {
        let decl = &method.decl;
        if decl.is_abstract() {
            return Err(abstract_method_call(method.owner.name.as_str(), decl.name.as_str()).into());
        }
        let class = receiver.class();
        let self_object = match receiver {
            Receiver::Object(object) if !decl.is_class_method() => Some(object),
            _ => None,
        };
        let context = MethodContext {
            self_object: self_object.clone(),
            class,
            owner: Rc::clone(&method.owner),
            method: Rc::clone(decl),
        };
        let result = self.invoke(Invocation {
            decl,
            frame: format!("{}.{}", method.owner.name, decl.name),
            base_env: self.global.clone(),
            context: Some(Rc::new(context)),
            args,
            span,
        })?;
        match self_object {
            Some(object) if decl.is_constructor() => Ok(Value::Object(object)),
            _ => Ok(result),
        }
    }

    fn invoke(&mut self, call: Invocation<'_>) -> EvalResult {
        let Invocation {
            decl,
            frame,
            base_env,
            context,
            args,
            span,
        } = call;
        let Some(body) = &decl.body else {
            return Err(undefined_function(&frame).into());
        };

        let env = base_env.child();
        self.bind_params(&env, decl, args, context.as_ref())?;
        let result_name = Name::new("Result");
        if let Some(ty) = &decl.return_type {
            let ty = self.resolve_type(ty)?;
            env.define(result_name.clone(), ty.default_value(), Some(ty), Mutability::Mutable);
        }

        let frame = CallFrame {
            name: frame,
            call_span: (!span.is_dummy()).then_some(span),
        };
        self.with_frame(frame, env, context, Some(Rc::clone(decl)), |scoped| {
            match ensure_sufficient_stack(|| scoped.exec_block(body)) {
                Ok(()) | Err(ControlAction::Exit) => {}
                Err(action @ (ControlAction::Break | ControlAction::Continue)) => {
                    return Err(scoped.report(action).into());
                }
                Err(ControlAction::Error(err)) => {
                    return Err(scoped.call_stack.attach_backtrace(*err).into());
                }
                Err(other) => return Err(other),
            }
            match scoped.env.get(&result_name) {
                Some(value) => scoped.force(value),
                None => Ok(Value::Nil),
            }
        })?
    }

    /// Bind `args` to `decl`'s parameters in `env`.
    ///
    /// Runs while the caller's scope is still current, so deferred
    /// arguments that land on ordinary parameters are evaluated there.
    /// Default values are evaluated in the callee's scope.
    fn bind_params(
        &mut self,
        env: &Environment,
        decl: &FunctionDecl,
        args: Vec<PreparedArg>,
        context: Option<&Rc<MethodContext>>,
    ) -> Result<(), ControlAction> {
        let required = decl.required_params();
        if args.len() < required || args.len() > decl.params.len() {
            return Err(wrong_argument_count(
                decl.name.as_str(),
                required,
                decl.params.len(),
                args.len(),
            )
            .into());
        }

        let mut args = args.into_iter();
        for param in &decl.params {
            let ty = self.resolve_type(&param.ty)?;
            let (value, mutability) = match (param.mode, args.next()) {
                (ParamMode::Var, Some(PreparedArg::Reference(reference))) => {
                    (Value::Reference(reference), Mutability::Mutable)
                }
                (ParamMode::Lazy, Some(PreparedArg::Deferred(expr))) => {
                    let thunk = LazyThunk::new(expr, self.env.clone(), self.context.clone());
                    (Value::Lazy(thunk), Mutability::Immutable)
                }
                (mode, arg) => {
                    let value = match arg {
                        Some(PreparedArg::Value(value)) => value,
                        Some(PreparedArg::Reference(reference)) => reference.read()?,
                        Some(PreparedArg::Deferred(expr)) => self.eval_expr(&expr)?,
                        None => match &param.default {
                            Some(default) => self.with_scope(env.clone(), context.cloned(), |scoped| {
                                scoped.eval_expr(default)
                            })?,
                            None => {
                                return Err(wrong_argument_count(
                                    decl.name.as_str(),
                                    required,
                                    decl.params.len(),
                                    0,
                                )
                                .into())
                            }
                        },
                    };
                    let value = self.coerce_to(value, &ty)?.copy_for_assign();
                    let mutability = if mode == ParamMode::Const || mode == ParamMode::Lazy {
                        Mutability::Immutable
                    } else {
                        Mutability::Mutable
                    };
                    (value, mutability)
                }
            };
            env.define(param.name.clone(), value, Some(ty), mutability);
        }
        Ok(())
    }

    /// Call a built-in with argument expressions; by-reference positions
    /// receive references to the caller's slots.
    pub(super) fn call_builtin(&mut self, builtin: &Rc<Builtin>, args: &[Expr], span: Span) -> EvalResult {
        if !builtin.accepts(args.len()) {
            let max = builtin.max_args.unwrap_or(builtin.min_args);
            return Err(wrong_argument_count(builtin.name.as_str(), builtin.min_args, max, args.len())
                .with_span(span)
                .into());
        }
        let mut values = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            if builtin.is_by_ref(index) {
                if let Some(reference) = self.reference_to(arg)? {
                    values.push(Value::Reference(reference));
                    continue;
                }
            }
            values.push(self.eval_expr(arg)?);
        }
        self.invoke_builtin(builtin, &values)
    }

    pub(super) fn invoke_builtin(&mut self, builtin: &Builtin, values: &[Value]) -> EvalResult {
        let outcome = {
            let mut ctx = BuiltinContext {
                print: &self.print,
                types: &mut self.type_ids,
            };
            (builtin.func)(&mut ctx, values)
        };
        match outcome {
            Ok(value) => Ok(value),
            Err(BuiltinError::Error(err)) => Err(err.into()),
            Err(BuiltinError::Raise { class, message }) => Err(self.raise_builtin(&class, &message)),
        }
    }

    /// `inherited`, `inherited M`, `inherited M(args)`.
    ///
    /// Lookup starts at the parent of the class declaring the running
    /// method. A bare `inherited` forwards the current arguments and does
    /// nothing when no ancestor has the method.
    pub(super) fn eval_inherited(&mut self, method: Option<&Name>, args: Option<&[Expr]>, span: Span) -> EvalResult {
        let Some(context) = self.context.clone() else {
            return Err(EvalError::new("inherited used outside of a method").into());
        };
        let name = method.cloned().unwrap_or_else(|| context.method.name.clone());
        let overloads = context
            .owner
            .parent
            .as_ref()
            .map(|parent| parent.method_overloads(&name))
            .unwrap_or_default();
        if overloads.is_empty() {
            return match method {
                None => Ok(Value::Nil),
                Some(_) => Err(undefined_method(name.as_str(), context.owner.name.as_str()).into()),
            };
        }

        let decls: Vec<&FunctionDecl> = overloads.iter().map(|m| m.decl.as_ref()).collect();
        let (prepared, ranking) = match (args, method) {
            (Some(args), _) => self.prepare_args(args, &decls)?,
            (None, None) => self.forward_params(&context)?,
            (None, Some(_)) => (Vec::new(), Vec::new()),
        };
        let index = self.select_index(name.as_str(), &decls, &ranking)?;
        self.invoke_method(&overloads[index], context.receiver(), prepared, span)
    }

    /// The running method's arguments, `var` parameters passed on as
    /// references.
    fn forward_params(&mut self, context: &MethodContext) -> Result<Prepared, ControlAction> {
        let mut prepared = Vec::with_capacity(context.method.params.len());
        let mut ranking = Vec::with_capacity(context.method.params.len());
        for param in &context.method.params {
            let raw = self.env.get(&param.name).unwrap_or(Value::Nil);
            match (param.mode, raw) {
                (ParamMode::Var, Value::Reference(reference)) => {
                    ranking.push(Some(reference.read()?));
                    prepared.push(PreparedArg::Reference(reference));
                }
                (ParamMode::Var, _) => {
                    let reference = Reference::variable(&self.env, &param.name);
                    ranking.push(Some(reference.read()?));
                    prepared.push(PreparedArg::Reference(reference));
                }
                (_, raw) => {
                    let value = self.force(raw)?;
                    ranking.push(Some(value.clone()));
                    prepared.push(PreparedArg::Value(value));
                }
            }
        }
        Ok((prepared, ranking))
    }

    /// `@F`, `@obj.Method`, `@TClass.Method`.
    pub(super) fn eval_address_of(&mut self, target: &Expr) -> EvalResult {
        match &target.kind {
            ExprKind::Ident(name) => {
                if let Some(context) = self.context.clone() {
                    if let Some(method) = context.class.find_method(name) {
                        return Ok(Value::Function(FunctionPointer::method(
                            method.decl,
                            method.owner,
                            context.receiver(),
                        )));
                    }
                }
                if let Some(decl) = self.functions.get(name).and_then(|o| o.first()) {
                    return Ok(Value::Function(FunctionPointer::function(Rc::clone(decl))));
                }
                if let Some(unit) = self.units.resolve_unqualified(name) {
                    if let Some(pointer) = unit_function_pointer(&unit, name) {
                        return Ok(pointer);
                    }
                }
                if self.builtins.contains(name) {
                    return Ok(Value::Function(FunctionPointer {
                        callable: Callable::Builtin(name.clone()),
                        receiver: None,
                    }));
                }
                function_value(self.resolve_ident(name)?)
            }
            ExprKind::Member { object, member } => {
                if let ExprKind::Ident(unit_name) = &object.kind {
                    if let Some(unit) = self.unit_named(unit_name) {
                        return unit_function_pointer(&unit, member)
                            .ok_or_else(|| undefined_function(member.as_str()).into());
                    }
                }
                let receiver = match self.eval_expr(object)?.unbox() {
                    Value::Object(object) => Receiver::Object(object),
                    Value::Interface(intf) => Receiver::Object(intf.narrow(member)?),
                    Value::TypeMeta(meta) => match &meta.info {
                        TypeInfo::Class(name) => Receiver::Class(self.lookup_class(name)?),
                        other => return Err(undefined_method(member.as_str(), &other.name()).into()),
                    },
                    Value::Nil => return Err(nil_reference(member.as_str()).into()),
                    other => return Err(undefined_method(member.as_str(), &other.type_name()).into()),
                };
                let class = receiver.class();
                let method = class
                    .find_method(member)
                    .ok_or_else(|| undefined_method(member.as_str(), class.name.as_str()))?;
                Ok(Value::Function(FunctionPointer::method(
                    method.decl,
                    method.owner,
                    receiver,
                )))
            }
            _ => {
                let value = self.eval_expr(target)?;
                function_value(value)
            }
        }
    }
}

/// A pointer to a unit function, running in the unit's scope.
fn unit_function_pointer(unit: &Unit, name: &Name) -> Option<Value> {
    let decl = unit.overloads(name)?.first()?;
    Some(Value::Function(FunctionPointer {
        callable: Callable::Closure {
            decl: Rc::clone(decl),
            env: unit.env.clone(),
            context: None,
        },
        receiver: None,
    }))
}

fn function_value(value: Value) -> EvalResult {
    match value.unbox() {
        value @ Value::Function(_) => Ok(value),
        other => Err(not_callable(&other.type_name()).into()),
    }
}

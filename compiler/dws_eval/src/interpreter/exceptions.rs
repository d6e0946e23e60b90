//! Script exceptions: `raise`, `try/except/finally` and the built-in
//! exception classes.
//!
//! A raised exception travels as `ControlAction::Raise` while the object
//! itself sits in `Interpreter::active_exception`. Evaluation errors never
//! enter this channel, so `except` blocks cannot catch them.

use dws_ir::{
    ClassDecl, Decl, ExceptClause, Expr, FieldDecl, FunctionDecl, MethodFlags, Name, Param, Stmt,
    TryStmt, TypeExpr,
};

use super::{ActiveException, Interpreter};
use crate::environment::Mutability;
use crate::errors::{
    expected_type, nil_reference, reraise_outside_handler, undefined_class, ControlAction,
    ExecResult,
};
use crate::types::TypeInfo;
use crate::value::{ObjectInstance, ObjectRef, Shared, Value};

/// Exception classes every program can raise and catch.
const EXCEPTION_CLASSES: &[&str] = &[
    "EConvertError",
    "ERangeError",
    "EDivByZero",
    "EAssertionFailed",
    "EInvalidOp",
    "EScriptStackOverflow",
];

fn builtin_class_decls() -> Vec<Decl> {
    let mut decls = vec![
        Decl::class(
            ClassDecl::new("TObject")
                .method(FunctionDecl::constructor("Create").body(Vec::new()))
                .method(
                    FunctionDecl::destructor("Destroy")
                        .with_flags(MethodFlags::VIRTUAL)
                        .body(Vec::new()),
                ),
        ),
        Decl::class(
            ClassDecl::new("Exception")
                .parent("TObject")
                .field(FieldDecl::new("Message", TypeExpr::string()))
                .method(
                    FunctionDecl::constructor("Create")
                        .param(Param::value("Msg", TypeExpr::string()))
                        .body(vec![Stmt::assign(Expr::ident("Message"), Expr::ident("Msg"))]),
                ),
        ),
    ];
    decls.extend(
        EXCEPTION_CLASSES
            .iter()
            .map(|name| Decl::class(ClassDecl::new(name).parent("Exception"))),
    );
    decls
}

/// Register `TObject`, `Exception` and its standard subclasses.
pub(super) fn load_builtin_classes(interpreter: &mut Interpreter) {
    if let Err(err) = interpreter.load(&builtin_class_decls()) {
        tracing::error!(error = %err, "failed to load built-in classes");
    }
}

/// The `Message` of an exception object; empty for non-`Exception` objects.
pub(crate) fn exception_message(object: &ObjectRef) -> String {
    object
        .borrow()
        .field(&Name::new("Message"))
        .map(|message| message.to_string())
        .unwrap_or_default()
}

impl Interpreter {
    /// Make `object` the active exception and start unwinding.
    pub(crate) fn raise_object(&mut self, object: ObjectRef) -> ControlAction {
        tracing::debug!(
            class = %object.class_name(),
            message = %exception_message(&object),
            "exception raised"
        );
        self.active_exception = Some(ActiveException {
            object,
            backtrace: self.call_stack.capture(),
        });
        ControlAction::Raise
    }

    /// Raise an instance of the built-in class `class` carrying `message`.
    ///
    /// The instance is created without running a constructor.
    pub(crate) fn raise_builtin(&mut self, class: &Name, message: &str) -> ControlAction {
        let Some(info) = self.classes.get(class).cloned() else {
            return undefined_class(class.as_str()).into();
        };
        let mut instance = ObjectInstance::new(info.clone());
        for field in info.all_fields() {
            instance
                .fields
                .insert(field.name.clone(), field.ty.default_value());
        }
        instance
            .fields
            .insert(Name::new("Message"), Value::string(message));
        self.raise_object(Shared::new(instance))
    }

    /// `raise expr` or a bare `raise`.
    pub(super) fn exec_raise(&mut self, value: Option<&Expr>) -> ExecResult {
        let Some(expr) = value else {
            return match self.handler_exception.clone() {
                Some(handled) => {
                    self.active_exception = Some(handled);
                    Err(ControlAction::Raise)
                }
                None => Err(reraise_outside_handler().into()),
            };
        };
        match self.eval_expr(expr)?.unbox() {
            Value::Object(object) => Err(self.raise_object(object)),
            Value::Interface(intf) => Err(self.raise_object(intf.object)),
            Value::Nil => Err(nil_reference("raise").into()),
            other => Err(expected_type("exception object", &other.type_name()).into()),
        }
    }

    /// `try ... except ... finally ... end`.
    pub(super) fn exec_try(&mut self, stmt: &TryStmt) -> ExecResult {
        let mut result = self.exec_scoped_block(&stmt.body);
        if let (Err(ControlAction::Raise), Some(except)) = (&result, &stmt.except) {
            result = self.handle_exception(except);
        }
        let Some(finally) = &stmt.finally else {
            return result;
        };

        // The finally block runs with no exception unwinding; the pending
        // one is visible as ExceptObject.
        let pending = self.active_exception.take();
        let saved_handler = std::mem::replace(&mut self.handler_exception, pending.clone());
        let outcome = self.exec_scoped_block(finally);
        self.handler_exception = saved_handler;
        match outcome {
            Ok(()) => {
                if pending.is_some() {
                    self.active_exception = pending;
                }
                result
            }
            Err(action) => Err(action),
        }
    }

    fn handle_exception(&mut self, except: &ExceptClause) -> ExecResult {
        let Some(active) = self.active_exception.clone() else {
            return Err(ControlAction::Raise);
        };
        let class = active.object.class();
        let handler = except
            .handlers
            .iter()
            .find(|handler| class.inherits_from(&handler.class));
        if handler.is_none() && except.else_branch.is_none() {
            return Err(ControlAction::Raise);
        }

        self.active_exception = None;
        let saved_handler = self.handler_exception.replace(active.clone());
        let outcome = match (handler, &except.else_branch) {
            (Some(handler), _) => self.with_child_scope(|scoped| {
                if let Some(variable) = &handler.variable {
                    scoped.env.define(
                        variable.clone(),
                        Value::Object(active.object.clone()),
                        Some(TypeInfo::Class(handler.class.clone())),
                        Mutability::Mutable,
                    );
                }
                scoped.exec_stmt(&handler.body)
            }),
            (None, Some(body)) => self.exec_scoped_block(body),
            (None, None) => Err(ControlAction::Raise),
        };
        self.handler_exception = saved_handler;
        outcome
    }
}

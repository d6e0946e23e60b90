//! Tree-walking interpreter for DWScript programs.
//!
//! # Architecture
//!
//! Evaluation is a synchronous depth-first walk of the `dws_ir` tree.
//! Expressions return `EvalResult`, statements `ExecResult`; the `Err` side
//! carries either a real error or a cooperative signal (see
//! [`ControlAction`]). Helper modules split the walk by concern:
//!
//! - `program` - loading declarations into class, type and function tables
//! - `stmt` / `loops` - statements and loops
//! - `expr` - expressions and identifier resolution
//! - `assign` - assignment targets and coercion at the assignment boundary
//! - `call` - argument preparation, overload selection, invocation
//! - `member` / `property` - member access and the property state machine
//! - `construct` - object instantiation and constructor selection
//! - `operators` - operator overloads in front of the built-in semantics
//! - `exceptions` - raise, try/except/finally and the built-in exception classes
//!
//! # Scopes
//!
//! `env` is the scope the walk is currently in. Every routine body runs in
//! a child of `global` (or of a closure's captured scope); blocks, loops and
//! accessors open children of `env`. [`ScopedInterpreter`] restores the
//! previous scope, method context and call frame when it goes out of scope.

mod assign;
mod builder;
mod call;
mod casts;
mod construct;
mod exceptions;
mod expr;
mod loops;
mod member;
mod operators;
mod program;
mod property;
mod scope_guard;
mod stmt;

pub use builder::InterpreterBuilder;
pub use scope_guard::ScopedInterpreter;

use std::rc::Rc;

use dws_ir::{Expr, FunctionDecl, Name, Program, Span};
use rustc_hash::FxHashMap;

use crate::builtins::BuiltinRegistry;
use crate::class::{ClassInfo, InterfaceInfo, MethodContext, OperatorRegistry, PreparedArg};
use crate::diagnostics::CallStack;
use crate::environment::Environment;
use crate::errors::{uncaught_exception, undefined_function, ControlAction, EvalBacktrace, EvalError};
use crate::print_handler::SharedPrintHandler;
use crate::types::{TypeInfo, TypeRegistry};
use crate::units::UnitRegistry;
use crate::value::{EnumValue, ObjectRef, Value};

/// A raised exception that no handler has cleared yet.
#[derive(Clone, Debug)]
pub struct ActiveException {
    pub object: ObjectRef,
    /// Call stack at the raise site.
    pub backtrace: EvalBacktrace,
}

/// Tree-walking interpreter.
///
/// One interpreter owns one program's state: its scopes, class and type
/// tables, RTTI counter, registries and exception slots. Nothing is shared
/// between interpreters.
pub struct Interpreter {
    /// Scope the walk is currently in.
    pub(crate) env: Environment,
    /// Program-level scope: globals and the main body's variables.
    pub(crate) global: Environment,
    /// Method being executed, if any.
    pub(crate) context: Option<Rc<MethodContext>>,
    /// Routine whose `Result` is in scope; its name aliases `Result`.
    pub(crate) routine: Option<Rc<FunctionDecl>>,
    /// Live call stack, bounded by the recursion limit.
    pub(crate) call_stack: CallStack,
    /// Free functions by name; several entries form an overload set.
    pub(crate) functions: FxHashMap<Name, Vec<Rc<FunctionDecl>>>,
    pub(crate) classes: FxHashMap<Name, Rc<ClassInfo>>,
    pub(crate) interfaces: FxHashMap<Name, Rc<InterfaceInfo>>,
    /// Named non-class types: primitives, aliases, enums, records.
    pub(crate) types: FxHashMap<Name, TypeInfo>,
    /// Enum members reachable by bare name.
    pub(crate) enum_members: FxHashMap<Name, EnumValue>,
    /// Global operator overloads.
    pub(crate) operators: OperatorRegistry,
    pub(crate) type_ids: TypeRegistry,
    pub(crate) builtins: BuiltinRegistry,
    pub(crate) units: UnitRegistry,
    pub(crate) print: SharedPrintHandler,
    /// Exception currently unwinding.
    pub(crate) active_exception: Option<ActiveException>,
    /// Exception being handled by the innermost `except`/`finally` block;
    /// what `ExceptObject` and a bare `raise` refer to.
    pub(crate) handler_exception: Option<ActiveException>,
    /// Properties being read or written, as `(receiver address, name)`.
    pub(crate) property_chain: Vec<(usize, Name)>,
}

impl Interpreter {
    /// An interpreter with the default configuration.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    /// Start configuring an interpreter.
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Load `program`'s declarations and run its main body.
    ///
    /// Output already produced stays produced when the program fails. An
    /// exception still active at the end is reported as
    /// `UncaughtException` and also left in [`Interpreter::active_exception`].
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, program: &Program) -> Result<(), EvalError> {
        self.load(&program.declarations)?;
        self.env = self.global.clone();
        match self.exec_block(&program.body) {
            Ok(()) | Err(ControlAction::Exit) => Ok(()),
            Err(action) => Err(self.report(action)),
        }
    }

    /// Evaluate a single expression in the current scope.
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        self.eval_expr(expr).map_err(|action| self.report(action))
    }

    /// Call a free function by name with already-evaluated arguments.
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let name = Name::new(name);
        let Some(overloads) = self.functions.get(&name).cloned() else {
            return Err(undefined_function(name.as_str()));
        };
        let values: Vec<Option<Value>> = args.iter().cloned().map(Some).collect();
        let prepared = args.into_iter().map(PreparedArg::Value).collect();
        let result = self
            .select_function(name.as_str(), &overloads, &values)
            .map_err(ControlAction::from)
            .and_then(|decl| self.invoke_function(&decl, None, prepared, Span::DUMMY));
        result.map_err(|action| self.report(action))
    }

    /// The program-level scope.
    pub fn global(&self) -> &Environment {
        &self.global
    }

    /// Value of a global variable or constant.
    pub fn global_value(&self, name: &str) -> Option<Value> {
        self.global.get(&Name::new(name))
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    /// The exception left unhandled by the last run, if any.
    pub fn active_exception(&self) -> Option<&ActiveException> {
        self.active_exception.as_ref()
    }

    /// Look up a loaded class.
    pub fn class(&self, name: &str) -> Option<Rc<ClassInfo>> {
        self.classes.get(&Name::new(name)).cloned()
    }

    /// Current call depth.
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// Turn an escaping control action into the error reported to the host.
    fn report(&self, action: ControlAction) -> EvalError {
        match action {
            ControlAction::Error(err) => self.call_stack.attach_backtrace(*err),
            ControlAction::Raise => match &self.active_exception {
                Some(active) => {
                    let class = active.object.class_name();
                    let message = exceptions::exception_message(&active.object);
                    uncaught_exception(&class, &message).with_backtrace(active.backtrace.clone())
                }
                None => EvalError::new("exception raised without an exception object"),
            },
            ControlAction::Break => EvalError::new("break outside of a loop"),
            ControlAction::Continue => EvalError::new("continue outside of a loop"),
            ControlAction::Exit => EvalError::new("exit outside of a routine"),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;

//! RAII scope guards for the interpreter's scope, method context and call
//! frame.
//!
//! [`ScopedInterpreter`] holds `&mut Interpreter` and implements
//! `Deref`/`DerefMut`, so code inside a scope uses it exactly like the
//! interpreter. Dropping the guard restores the previous scope, method
//! context and routine, and pops the call frame if the guard pushed one.
//! Restoration also happens while unwinding from a panic.
//!
//! ```text
//! interpreter.with_child_scope(|scoped| {
//!     scoped.env.define_var(name, value);
//!     scoped.exec_block(body)
//! })
//! ```

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use dws_ir::FunctionDecl;

use super::Interpreter;
use crate::class::MethodContext;
use crate::diagnostics::CallFrame;
use crate::environment::Environment;
use crate::errors::EvalError;

/// Guard restoring the interpreter's scope state on drop.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
    saved_env: Environment,
    saved_context: Option<Rc<MethodContext>>,
    saved_routine: Option<Rc<FunctionDecl>>,
    pushed_frame: bool,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        self.interpreter.env = std::mem::take(&mut self.saved_env);
        self.interpreter.context = self.saved_context.take();
        self.interpreter.routine = self.saved_routine.take();
        if self.pushed_frame {
            self.interpreter.call_stack.pop();
        }
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Switch to `env`, keeping the current method context.
    pub fn scoped(&mut self, env: Environment) -> ScopedInterpreter<'_> {
        let saved_env = std::mem::replace(&mut self.env, env);
        ScopedInterpreter {
            saved_context: self.context.clone(),
            saved_routine: self.routine.clone(),
            interpreter: self,
            saved_env,
            pushed_frame: false,
        }
    }

    /// Run `f` in a fresh child of the current scope.
    pub fn with_child_scope<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let env = self.env.child();
        let mut scoped = self.scoped(env);
        f(&mut scoped)
    }

    /// Run `f` in `env` under `context`, e.g. to force a lazy argument in
    /// its caller's scope.
    pub fn with_scope<T, F>(&mut self, env: Environment, context: Option<Rc<MethodContext>>, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let mut scoped = self.scoped(env);
        scoped.context = context;
        f(&mut scoped)
    }

    /// Enter a routine body: push `frame`, then switch scope, context and
    /// routine.
    ///
    /// The depth check happens before anything changes, so on
    /// `MaxRecursionExceeded` the caller's state is untouched.
    pub fn with_frame<T, F>(
        &mut self,
        frame: CallFrame,
        env: Environment,
        context: Option<Rc<MethodContext>>,
        routine: Option<Rc<FunctionDecl>>,
        f: F,
    ) -> Result<T, EvalError>
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        self.call_stack.push(frame)?;
        let mut scoped = self.scoped(env);
        scoped.pushed_frame = true;
        scoped.context = context;
        scoped.routine = routine;
        Ok(f(&mut scoped))
    }
}

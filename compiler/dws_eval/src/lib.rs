//! DWS Eval - tree-walking interpreter for DWScript programs.
//!
//! The interpreter executes a `dws_ir::Program` directly: no bytecode, no
//! static type inference. Types are resolved when declarations are loaded
//! and re-checked only where dynamic values demand it (overload selection,
//! casts, subrange validation).
//!
//! # Architecture
//!
//! - `Value`: closed set of runtime value kinds with coercion and boxing
//! - `Environment`: lexical scope chain shared by closures and `var` aliases
//! - `ClassInfo`: class metadata with inheritance-aware member lookup
//! - `evaluate_binary` / `evaluate_unary`: built-in operator semantics
//! - `Interpreter`: statements, expressions, calls and exceptions
//! - `BuiltinRegistry` / `UnitRegistry`: host-provided routines and units
//!
//! Script-level `break`, `continue`, `exit` and exceptions travel as
//! [`ControlAction`] values on the `Err` side of every evaluation result,
//! never as host panics.
//!
//! # Example
//!
//! ```text
//! let output = buffer_handler();
//! let mut interpreter = Interpreter::builder().print_handler(output.clone()).build();
//! interpreter.run(&program)?;
//! assert_eq!(output.output(), "Hello\n");
//! ```

pub mod builtins;
pub mod class;
mod diagnostics;
pub mod environment;
pub mod errors;
pub mod interpreter;
mod operators;
mod print_handler;
mod shared;
pub mod types;
pub mod units;
pub mod value;

mod stack {
    pub use dws_stack::ensure_sufficient_stack;
}

use std::sync::Once;

pub use builtins::{Builtin, BuiltinContext, BuiltinError, BuiltinRegistry};
pub use class::{ClassInfo, InterfaceInfo, MethodContext};
pub use diagnostics::{CallFrame, CallStack};
pub use environment::{Environment, Mutability};
pub use errors::{
    BacktraceFrame, ControlAction, EvalBacktrace, EvalError, EvalErrorKind, EvalNote, EvalResult,
    ExecResult,
};
pub use interpreter::{ActiveException, Interpreter, InterpreterBuilder, ScopedInterpreter};
pub use operators::{evaluate_binary, evaluate_compound, evaluate_unary};
pub use print_handler::{buffer_handler, silent_handler, stdout_handler, PrintHandler, SharedPrintHandler};
pub use shared::Shared;
pub use stack::ensure_sufficient_stack;
pub use types::{TypeInfo, TypeRegistry};
pub use units::{Unit, UnitRegistry};
pub use value::Value;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and only the first call has any
/// effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;

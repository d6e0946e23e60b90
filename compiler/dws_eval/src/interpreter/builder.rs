//! `InterpreterBuilder` for creating configured `Interpreter` instances.

use rustc_hash::FxHashMap;

use super::{exceptions, Interpreter};
use crate::builtins::{Builtin, BuiltinRegistry};
use crate::class::OperatorRegistry;
use crate::diagnostics::CallStack;
use crate::environment::Environment;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::types::{TypeInfo, TypeRegistry};
use crate::units::{Unit, UnitRegistry};

/// Default limit on nested routine calls.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1024;

/// Builder for [`Interpreter`].
///
/// ```text
/// let interpreter = Interpreter::builder()
///     .max_recursion_depth(256)
///     .print_handler(buffer_handler())
///     .build();
/// ```
pub struct InterpreterBuilder {
    max_recursion_depth: usize,
    print_handler: Option<SharedPrintHandler>,
    builtins: Vec<Builtin>,
    units: Vec<Unit>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            print_handler: None,
            builtins: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Set the maximum call depth; deeper calls fail `MaxRecursionExceeded`.
    #[must_use]
    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Set where `Print`/`PrintLn` output goes. Default is stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Register a host built-in, replacing a core one of the same name.
    #[must_use]
    pub fn builtin(mut self, builtin: Builtin) -> Self {
        self.builtins.push(builtin);
        self
    }

    /// Register a unit.
    #[must_use]
    pub fn unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    /// Build the interpreter with the built-in classes loaded.
    pub fn build(self) -> Interpreter {
        let mut builtins = BuiltinRegistry::with_core();
        for builtin in self.builtins {
            builtins.register(builtin);
        }
        let mut units = UnitRegistry::new();
        for unit in self.units {
            units.register(unit);
        }

        let global = Environment::new();
        let mut interpreter = Interpreter {
            env: global.clone(),
            global,
            context: None,
            routine: None,
            call_stack: CallStack::new(self.max_recursion_depth),
            functions: FxHashMap::default(),
            classes: FxHashMap::default(),
            interfaces: FxHashMap::default(),
            types: primitive_types(),
            enum_members: FxHashMap::default(),
            operators: OperatorRegistry::new(),
            type_ids: TypeRegistry::new(),
            builtins,
            units,
            print: self.print_handler.unwrap_or_else(stdout_handler),
            active_exception: None,
            handler_exception: None,
            property_chain: Vec::new(),
        };
        exceptions::load_builtin_classes(&mut interpreter);
        interpreter
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn primitive_types() -> FxHashMap<dws_ir::Name, TypeInfo> {
    [
        ("Integer", TypeInfo::Integer),
        ("Int64", TypeInfo::Integer),
        ("Float", TypeInfo::Float),
        ("Double", TypeInfo::Float),
        ("String", TypeInfo::String),
        ("Boolean", TypeInfo::Boolean),
        ("Variant", TypeInfo::Variant),
    ]
    .into_iter()
    .map(|(name, ty)| (dws_ir::Name::new(name), ty))
    .collect()
}

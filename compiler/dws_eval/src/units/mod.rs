//! Host-registered units.
//!
//! A unit bundles variables, constants and functions under a name. Script
//! code reaches them as `Unit.Symbol`, or by bare name when exactly one
//! registered unit defines the symbol and nothing closer shadows it.

use std::rc::Rc;

use dws_ir::{FunctionDecl, Name};
use rustc_hash::FxHashMap;

use crate::environment::{Environment, Mutability};
use crate::types::TypeInfo;
use crate::value::Value;

/// A compiled unit as seen by the evaluator.
#[derive(Debug)]
pub struct Unit {
    pub name: Name,
    /// Root scope holding the unit's variables and constants. Unit function
    /// bodies run in a child of this scope.
    pub env: Environment,
    pub functions: FxHashMap<Name, Vec<Rc<FunctionDecl>>>,
}

impl Unit {
    pub fn new(name: &str) -> Self {
        Unit {
            name: Name::new(name),
            env: Environment::new(),
            functions: FxHashMap::default(),
        }
    }

    /// Declare a variable with its type and initial value.
    #[must_use]
    pub fn variable(self, name: &str, ty: TypeInfo, value: Value) -> Self {
        self.env
            .define(Name::new(name), value, Some(ty), Mutability::Mutable);
        self
    }

    /// Declare a constant.
    #[must_use]
    pub fn constant(self, name: &str, value: Value) -> Self {
        self.env
            .define(Name::new(name), value, None, Mutability::Immutable);
        self
    }

    /// Add a function; repeated names form an overload set.
    #[must_use]
    pub fn function(mut self, decl: FunctionDecl) -> Self {
        self.functions
            .entry(decl.name.clone())
            .or_default()
            .push(Rc::new(decl));
        self
    }

    /// Check if the unit defines `symbol` as a variable, constant or function.
    pub fn defines(&self, symbol: &Name) -> bool {
        self.env.defines_locally(symbol) || self.functions.contains_key(symbol)
    }

    /// Overloads of the function `name`.
    pub fn overloads(&self, name: &Name) -> Option<&[Rc<FunctionDecl>]> {
        self.functions.get(name).map(Vec::as_slice)
    }
}

/// All units known to one interpreter.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: FxHashMap<Name, Rc<Unit>>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, unit: Unit) {
        tracing::debug!(unit = %unit.name, "registering unit");
        self.units.insert(unit.name.clone(), Rc::new(unit));
    }

    pub fn get(&self, name: &Name) -> Option<Rc<Unit>> {
        self.units.get(name).cloned()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.units.contains_key(name)
    }

    /// The single unit defining `symbol`; `None` if no unit or several do.
    pub fn resolve_unqualified(&self, symbol: &Name) -> Option<Rc<Unit>> {
        let mut found = self.units.values().filter(|unit| unit.defines(symbol));
        let first = found.next()?;
        match found.next() {
            Some(_) => None,
            None => Some(Rc::clone(first)),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

//! Lexical environments.
//!
//! An `Environment` is a handle to one scope in a parent-linked chain. Every
//! construct that opens a scope (a block with locals, a `for` loop, a call,
//! a property accessor) creates a child; closures keep their defining scope
//! alive simply by holding the handle.

use std::fmt;

use dws_ir::Name;
use rustc_hash::FxHashMap;

use crate::shared::Shared;
use crate::types::TypeInfo;
use crate::value::Value;

/// Whether a binding can be reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    /// `var` declarations and by-value parameters.
    Mutable,
    /// `const` declarations and `const` parameters.
    Immutable,
}

impl Mutability {
    #[inline]
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

/// Error returned by [`Environment::assign`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignError {
    /// The binding exists but is immutable.
    Immutable,
    /// No scope in the chain defines the name.
    Undefined,
}

#[derive(Clone, Debug)]
struct Binding {
    value: Value,
    /// Declared type; drives coercion and subrange checks on later writes.
    declared: Option<TypeInfo>,
    mutability: Mutability,
}

/// One scope: its own bindings plus the enclosing scope.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<Name, Binding>,
    parent: Option<Environment>,
}

/// Shared handle to a scope.
#[derive(Clone, Default)]
pub struct Environment(Shared<Scope>);

impl Environment {
    /// A root scope with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new scope enclosed by this one.
    #[must_use]
    pub fn child(&self) -> Self {
        Environment(Shared::new(Scope {
            bindings: FxHashMap::default(),
            parent: Some(self.clone()),
        }))
    }

    /// The enclosing scope.
    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    /// Check if both handles name the same scope.
    #[inline]
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// Introduce a binding in this scope, shadowing any outer one.
    pub fn define(&self, name: Name, value: Value, declared: Option<TypeInfo>, mutability: Mutability) {
        self.0.borrow_mut().bindings.insert(
            name,
            Binding {
                value,
                declared,
                mutability,
            },
        );
    }

    /// Shorthand for an untyped mutable binding.
    pub fn define_var(&self, name: Name, value: Value) {
        self.define(name, value, None, Mutability::Mutable);
    }

    /// Check if this scope itself (not an ancestor) defines `name`.
    pub fn defines_locally(&self, name: &Name) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// The raw value bound to `name` in the nearest defining scope.
    ///
    /// A `var` parameter yields its `Value::Reference`; callers that want the
    /// aliased value read through it.
    pub fn get(&self, name: &Name) -> Option<Value> {
        self.find(name, None, |binding| binding.value.clone())
    }

    /// Like [`Environment::get`] but stops before reaching `boundary`, which
    /// is not searched.
    pub fn get_before(&self, name: &Name, boundary: &Environment) -> Option<Value> {
        self.find(name, Some(boundary), |binding| binding.value.clone())
    }

    /// Declared type of the nearest binding of `name`, following a `var`
    /// parameter to the slot it aliases.
    pub fn declared_type(&self, name: &Name) -> Option<TypeInfo> {
        let (value, declared) =
            self.find(name, None, |binding| (binding.value.clone(), binding.declared.clone()))?;
        match value {
            Value::Reference(reference) => reference.declared_type(),
            _ => declared,
        }
    }

    /// Check if the nearest binding of `name` can be reassigned.
    pub fn is_mutable(&self, name: &Name) -> Option<bool> {
        self.find(name, None, |binding| binding.mutability.is_mutable())
    }

    fn find<R>(
        &self,
        name: &Name,
        boundary: Option<&Environment>,
        read: impl Fn(&Binding) -> R,
    ) -> Option<R> {
        let mut scope = self.clone();
        loop {
            if boundary.is_some_and(|b| b.ptr_eq(&scope)) {
                return None;
            }
            let next = {
                let inner = scope.0.borrow();
                if let Some(binding) = inner.bindings.get(name) {
                    return Some(read(binding));
                }
                inner.parent.clone()
            };
            scope = next?;
        }
    }

    /// Replace the value of the nearest binding of `name`.
    ///
    /// This is a raw store: the caller handles `var` aliases and type
    /// coercion.
    pub fn assign(&self, name: &Name, value: Value) -> Result<(), AssignError> {
        let mut scope = self.clone();
        loop {
            let next = {
                let mut inner = scope.0.borrow_mut();
                if let Some(binding) = inner.bindings.get_mut(name) {
                    if !binding.mutability.is_mutable() {
                        return Err(AssignError::Immutable);
                    }
                    binding.value = value;
                    return Ok(());
                }
                inner.parent.clone()
            };
            match next {
                Some(parent) => scope = parent,
                None => return Err(AssignError::Undefined),
            }
        }
    }

    /// Number of scopes from here to the root, inclusive.
    pub fn depth(&self) -> usize {
        std::iter::successors(Some(self.clone()), Environment::parent).count()
    }
}

// Bindings may hold closures over this very scope; print names only.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(scope) = self.0.try_borrow() else {
            return f.write_str("Environment(<borrowed>)");
        };
        let mut names: Vec<&str> = scope.bindings.keys().map(Name::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("has_parent", &scope.parent.is_some())
            .finish()
    }
}

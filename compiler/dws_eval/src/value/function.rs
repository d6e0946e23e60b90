//! Callables, by-reference aliases and lazy thunks.

use std::rc::Rc;

use dws_ir::{Expr, FunctionDecl, Name};

use crate::class::{ClassInfo, MethodContext};
use crate::environment::{AssignError, Environment};
use crate::errors::{constant_assignment, undefined_field, undefined_variable, EvalError};
use crate::shared::Shared;
use crate::types::TypeInfo;

use super::{ArrayRef, ObjectRef, RecordRef, Value};

/// What a function pointer invokes.
#[derive(Clone, Debug)]
pub enum Callable {
    /// A declared function, or a method of `owner`.
    Declared {
        decl: Rc<FunctionDecl>,
        owner: Option<Rc<ClassInfo>>,
    },
    /// A lambda with the environment and method context it was created in.
    Closure {
        decl: Rc<FunctionDecl>,
        env: Environment,
        context: Option<Rc<MethodContext>>,
    },
    /// A registered built-in, by name.
    Builtin(Name),
}

impl Callable {
    /// The declaration behind a script callable.
    pub fn decl(&self) -> Option<&Rc<FunctionDecl>> {
        match self {
            Callable::Declared { decl, .. } | Callable::Closure { decl, .. } => Some(decl),
            Callable::Builtin(_) => None,
        }
    }
}

/// The receiver a method pointer is bound to.
#[derive(Clone, Debug)]
pub enum Receiver {
    Object(ObjectRef),
    /// A class reference, for class methods and constructors.
    Class(Rc<ClassInfo>),
}

impl Receiver {
    /// Runtime class of the receiver.
    pub fn class(&self) -> Rc<ClassInfo> {
        match self {
            Receiver::Object(object) => object.class(),
            Receiver::Class(class) => Rc::clone(class),
        }
    }

    /// Identity of the receiver, for cycle detection.
    pub fn addr(&self) -> usize {
        match self {
            Receiver::Object(object) => object.addr(),
            Receiver::Class(class) => Rc::as_ptr(class) as usize,
        }
    }
}

/// A first-class callable value (`@F`, `@obj.Method`, a lambda).
#[derive(Clone, Debug)]
pub struct FunctionPointer {
    pub callable: Callable,
    pub receiver: Option<Receiver>,
}

impl FunctionPointer {
    /// A pointer to a free function.
    pub fn function(decl: Rc<FunctionDecl>) -> Self {
        FunctionPointer {
            callable: Callable::Declared { decl, owner: None },
            receiver: None,
        }
    }

    /// A method pointer capturing `receiver`.
    pub fn method(decl: Rc<FunctionDecl>, owner: Rc<ClassInfo>, receiver: Receiver) -> Self {
        FunctionPointer {
            callable: Callable::Declared {
                decl,
                owner: Some(owner),
            },
            receiver: Some(receiver),
        }
    }

    /// Human-readable target, e.g. `TFoo.GetValue` or `lambda`.
    pub fn describe(&self) -> String {
        match &self.callable {
            Callable::Declared {
                decl,
                owner: Some(owner),
            } => format!("{}.{}", owner.name, decl.name),
            Callable::Declared { decl, owner: None } => decl.name.to_string(),
            Callable::Closure { .. } => "lambda".to_string(),
            Callable::Builtin(name) => name.to_string(),
        }
    }

    /// Check if both pointers invoke the same routine on the same receiver.
    pub fn same_target(&self, other: &FunctionPointer) -> bool {
        let same_callable = match (&self.callable, &other.callable) {
            (Callable::Builtin(a), Callable::Builtin(b)) => a == b,
            (a, b) => match (a.decl(), b.decl()) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            },
        };
        let same_receiver = match (&self.receiver, &other.receiver) {
            (None, None) => true,
            (Some(Receiver::Object(a)), Some(Receiver::Object(b))) => a.ptr_eq(b),
            (Some(Receiver::Class(a)), Some(Receiver::Class(b))) => Rc::ptr_eq(a, b),
            _ => false,
        };
        same_callable && same_receiver
    }
}

/// The slot a [`Reference`] aliases.
#[derive(Clone, Debug)]
pub enum RefTarget {
    Variable { env: Environment, name: Name },
    Field { object: ObjectRef, name: Name },
    RecordField { record: RecordRef, name: Name },
    Element { array: ArrayRef, index: i64 },
    ClassVar { class: Rc<ClassInfo>, name: Name },
}

/// An alias to a slot elsewhere, created for `var` parameters.
///
/// Reads and writes go straight to the target, so a reference passed on
/// through several call frames still updates the original slot.
#[derive(Clone, Debug)]
pub struct Reference {
    target: Rc<RefTarget>,
}

impl Reference {
    pub fn new(target: RefTarget) -> Self {
        Reference {
            target: Rc::new(target),
        }
    }

    /// A reference to the variable `name` as seen from `env`.
    pub fn variable(env: &Environment, name: &Name) -> Self {
        Self::new(RefTarget::Variable {
            env: env.clone(),
            name: name.clone(),
        })
    }

    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    /// Current value of the aliased slot.
    pub fn read(&self) -> Result<Value, EvalError> {
        match &*self.target {
            RefTarget::Variable { env, name } => match env.get(name) {
                Some(Value::Reference(inner)) => inner.read(),
                Some(value) => Ok(value),
                None => Err(undefined_variable(name.as_str())),
            },
            RefTarget::Field { object, name } => {
                let instance = object.borrow();
                instance
                    .field(name)
                    .ok_or_else(|| undefined_field(name.as_str(), instance.class.name.as_str()))
            }
            RefTarget::RecordField { record, name } => record.borrow().get(name),
            RefTarget::Element { array, index } => array.borrow().get(*index),
            RefTarget::ClassVar { class, name } => class
                .class_var(name)
                .ok_or_else(|| undefined_field(name.as_str(), class.name.as_str())),
        }
    }

    /// Store into the aliased slot. The caller has already coerced `value`
    /// to [`Reference::declared_type`].
    pub fn write(&self, value: Value) -> Result<(), EvalError> {
        match &*self.target {
            RefTarget::Variable { env, name } => {
                if let Some(Value::Reference(inner)) = env.get(name) {
                    return inner.write(value);
                }
                match env.assign(name, value) {
                    Ok(()) => Ok(()),
                    Err(AssignError::Immutable) => Err(constant_assignment(name.as_str())),
                    Err(AssignError::Undefined) => Err(undefined_variable(name.as_str())),
                }
            }
            RefTarget::Field { object, name } => {
                let mut instance = object.borrow_mut();
                match instance.fields.get_mut(name) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(undefined_field(name.as_str(), instance.class.name.as_str())),
                }
            }
            RefTarget::RecordField { record, name } => record.borrow_mut().set(name, value),
            RefTarget::Element { array, index } => array.borrow_mut().set(*index, value),
            RefTarget::ClassVar { class, name } => {
                if class.set_class_var(name, value) {
                    Ok(())
                } else {
                    Err(undefined_field(name.as_str(), class.name.as_str()))
                }
            }
        }
    }

    /// Declared type of the aliased slot, when one is known.
    pub fn declared_type(&self) -> Option<TypeInfo> {
        match &*self.target {
            RefTarget::Variable { env, name } => env.declared_type(name),
            RefTarget::Field { object, name } => object.class().field_type(name),
            RefTarget::RecordField { record, name } => {
                let record = record.borrow();
                record
                    .ty
                    .field_index(name)
                    .map(|index| record.ty.fields[index].ty.clone())
            }
            RefTarget::Element { array, .. } => Some(array.borrow().element.clone()),
            RefTarget::ClassVar { class, name } => class.class_var_type(name),
        }
    }

    /// Human-readable target for diagnostics.
    pub fn describe(&self) -> String {
        match &*self.target {
            RefTarget::Variable { name, .. } => format!("var {name}"),
            RefTarget::Field { object, name } => format!("{}.{name}", object.class_name()),
            RefTarget::RecordField { record, name } => {
                format!("{}.{name}", record.borrow().ty.name)
            }
            RefTarget::Element { index, .. } => format!("element [{index}]"),
            RefTarget::ClassVar { class, name } => format!("{}.{name}", class.name),
        }
    }
}

/// State of a `lazy` parameter.
#[derive(Clone, Debug)]
pub enum LazyState {
    /// Not yet forced: the argument expression with the caller's scope.
    Pending {
        expr: Expr,
        env: Environment,
        context: Option<Rc<MethodContext>>,
    },
    Done(Value),
}

/// A deferred argument, evaluated at most once on first read.
#[derive(Clone, Debug)]
pub struct LazyThunk(Shared<LazyState>);

impl LazyThunk {
    pub fn new(expr: Expr, env: Environment, context: Option<Rc<MethodContext>>) -> Self {
        LazyThunk(Shared::new(LazyState::Pending { expr, env, context }))
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LazyState {
        self.0.borrow().clone()
    }

    /// Record the forced value.
    pub fn resolve(&self, value: Value) {
        *self.0.borrow_mut() = LazyState::Done(value);
    }
}

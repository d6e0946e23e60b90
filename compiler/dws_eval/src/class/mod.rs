//! Class and interface metadata.
//!
//! `ClassInfo` is built once per class when the program is loaded and never
//! changes afterwards, except for class-variable slots. Lookups walk from a
//! class up through its parents and return the first match, so a search
//! that starts at an object's runtime class always finds the most-derived
//! override.
//!
//! # Member resolution
//!
//! Within one class, a member name is resolved in this order:
//! 1. class variables
//! 2. class constants
//! 3. fields
//! 4. properties
//! 5. methods
//!
//! Each step walks the whole hierarchy before the next one is tried.

mod operators;
mod overload;

pub use operators::{OperatorBinding, OperatorRegistry, OperatorTarget};
pub use overload::{conversion_cost, select_overload, Candidate, PreparedArg};

use std::cell::RefCell;
use std::rc::Rc;

use dws_ir::{ClassDecl, Expr, FunctionDecl, Name, PropertyDecl};
use rustc_hash::FxHashMap;

use crate::types::TypeInfo;
use crate::value::{ObjectRef, Receiver, Value};

/// An instance field.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: Name,
    pub ty: TypeInfo,
    /// Evaluated per instance, before the constructor runs.
    pub init: Option<Expr>,
}

/// A property with its resolved type.
#[derive(Clone, Debug)]
pub struct PropertyInfo {
    pub decl: PropertyDecl,
    pub ty: TypeInfo,
}

impl PropertyInfo {
    #[inline]
    pub fn name(&self) -> &Name {
        &self.decl.name
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.decl.is_indexed()
    }
}

/// A method found by lookup, with the class that declares it.
///
/// `owner` is what `inherited` starts from, and what class-variable access
/// inside the method body resolves against.
#[derive(Clone, Debug)]
pub struct MethodRef {
    pub owner: Rc<ClassInfo>,
    pub decl: Rc<FunctionDecl>,
}

/// The method a body is currently executing in.
#[derive(Clone, Debug)]
pub struct MethodContext {
    /// `None` inside class methods.
    pub self_object: Option<ObjectRef>,
    /// Runtime class: the object's class, or the class a class method was
    /// called on.
    pub class: Rc<ClassInfo>,
    /// Declaring class of the running method.
    pub owner: Rc<ClassInfo>,
    pub method: Rc<FunctionDecl>,
}

impl MethodContext {
    /// What `Self` refers to: the object, or the class inside a class method.
    pub fn receiver(&self) -> Receiver {
        match &self.self_object {
            Some(object) => Receiver::Object(object.clone()),
            None => Receiver::Class(Rc::clone(&self.class)),
        }
    }
}

/// Interface metadata.
#[derive(Debug)]
pub struct InterfaceInfo {
    pub name: Name,
    pub parent: Option<Rc<InterfaceInfo>>,
    pub methods: Vec<Rc<FunctionDecl>>,
}

impl InterfaceInfo {
    /// Check if this interface is `name` or extends it.
    pub fn extends(&self, name: &Name) -> bool {
        &self.name == name || self.parent.as_ref().is_some_and(|p| p.extends(name))
    }

    /// Check if the contract (including parents) declares `method`.
    pub fn declares(&self, method: &Name) -> bool {
        self.methods.iter().any(|m| &m.name == method)
            || self.parent.as_ref().is_some_and(|p| p.declares(method))
    }
}

/// Class metadata.
#[derive(Debug)]
pub struct ClassInfo {
    pub name: Name,
    pub parent: Option<Rc<ClassInfo>>,
    pub interfaces: Vec<Rc<InterfaceInfo>>,
    pub is_abstract: bool,
    pub is_external: bool,
    /// Fields declared by this class only.
    pub fields: Vec<FieldInfo>,
    pub class_vars: RefCell<FxHashMap<Name, Value>>,
    pub class_var_types: FxHashMap<Name, TypeInfo>,
    pub constants: FxHashMap<Name, Value>,
    /// Overload sets keyed by name; constructors and destructors included.
    pub methods: FxHashMap<Name, Vec<Rc<FunctionDecl>>>,
    pub properties: FxHashMap<Name, Rc<PropertyInfo>>,
    pub operators: Vec<OperatorBinding>,
    pub decl: Rc<ClassDecl>,
}

impl ClassInfo {
    /// A class with no members, used as the starting point at load time.
    pub fn empty(decl: Rc<ClassDecl>, parent: Option<Rc<ClassInfo>>) -> Self {
        ClassInfo {
            name: decl.name.clone(),
            parent,
            interfaces: Vec::new(),
            is_abstract: decl.is_abstract,
            is_external: decl.is_external,
            fields: Vec::new(),
            class_vars: RefCell::new(FxHashMap::default()),
            class_var_types: FxHashMap::default(),
            constants: FxHashMap::default(),
            methods: FxHashMap::default(),
            properties: FxHashMap::default(),
            operators: Vec::new(),
            decl,
        }
    }

    /// This class followed by each parent up to the root.
    pub fn ancestors(self: &Rc<Self>) -> impl Iterator<Item = Rc<ClassInfo>> {
        std::iter::successors(Some(Rc::clone(self)), |class| class.parent.clone())
    }

    fn chain(&self) -> impl Iterator<Item = &ClassInfo> {
        std::iter::successors(Some(self), |class| class.parent.as_deref())
    }

    /// Check if this class is `name` or descends from it.
    pub fn inherits_from(&self, name: &Name) -> bool {
        self.chain().any(|class| &class.name == name)
    }

    /// Check if this class or an ancestor implements the interface `name`
    /// (directly or through interface inheritance).
    pub fn implements_interface(&self, name: &Name) -> bool {
        self.find_interface(name).is_some()
    }

    /// The implemented interface that is `name` or extends it.
    pub fn find_interface(&self, name: &Name) -> Option<Rc<InterfaceInfo>> {
        self.chain()
            .flat_map(|class| class.interfaces.iter())
            .find(|intf| intf.extends(name))
            .cloned()
    }

    /// Every field in the hierarchy, base class first.
    pub fn all_fields(&self) -> Vec<&FieldInfo> {
        let mut classes: Vec<&ClassInfo> = self.chain().collect();
        classes.reverse();
        classes.iter().flat_map(|class| class.fields.iter()).collect()
    }

    /// Declared type of a field.
    pub fn field_type(&self, name: &Name) -> Option<TypeInfo> {
        self.chain()
            .flat_map(|class| class.fields.iter())
            .find(|field| &field.name == name)
            .map(|field| field.ty.clone())
    }

    pub fn has_field(&self, name: &Name) -> bool {
        self.field_type(name).is_some()
    }

    fn class_var_owner(&self, name: &Name) -> Option<&ClassInfo> {
        self.chain().find(|class| class.class_var_types.contains_key(name))
    }

    /// Current value of a class variable declared here or in an ancestor.
    pub fn class_var(&self, name: &Name) -> Option<Value> {
        self.class_var_owner(name)
            .and_then(|owner| owner.class_vars.borrow().get(name).cloned())
    }

    /// Store into a class variable; `false` if no class in the chain declares it.
    pub fn set_class_var(&self, name: &Name, value: Value) -> bool {
        match self.class_var_owner(name) {
            Some(owner) => {
                owner.class_vars.borrow_mut().insert(name.clone(), value);
                true
            }
            None => false,
        }
    }

    pub fn class_var_type(&self, name: &Name) -> Option<TypeInfo> {
        self.class_var_owner(name)
            .and_then(|owner| owner.class_var_types.get(name).cloned())
    }

    pub fn has_class_var(&self, name: &Name) -> bool {
        self.class_var_owner(name).is_some()
    }

    /// Value of a class constant.
    pub fn constant(&self, name: &Name) -> Option<Value> {
        self.chain().find_map(|class| class.constants.get(name).cloned())
    }

    /// Property declared here or inherited.
    pub fn find_property(&self, name: &Name) -> Option<Rc<PropertyInfo>> {
        self.chain().find_map(|class| class.properties.get(name).cloned())
    }

    /// The nearest default (`obj[i]`) property.
    pub fn default_property(&self) -> Option<Rc<PropertyInfo>> {
        self.chain()
            .find_map(|class| class.properties.values().find(|p| p.decl.is_default).cloned())
    }

    /// Check if any class in the chain declares a method called `name`.
    pub fn has_method(&self, name: &Name) -> bool {
        self.chain().any(|class| class.methods.contains_key(name))
    }

    /// First declaration of `name` walking up from this class.
    pub fn find_method(self: &Rc<Self>, name: &Name) -> Option<MethodRef> {
        self.ancestors().find_map(|class| {
            let decl = class.methods.get(name)?.first().cloned()?;
            Some(MethodRef { owner: class, decl })
        })
    }

    /// Every visible overload of `name`.
    ///
    /// Overloads are collected from this class upward; a parent overload
    /// whose signature matches one already collected is hidden.
    pub fn method_overloads(self: &Rc<Self>, name: &Name) -> Vec<MethodRef> {
        let mut found: Vec<MethodRef> = Vec::new();
        for class in self.ancestors() {
            let Some(decls) = class.methods.get(name) else {
                continue;
            };
            for decl in decls {
                if found.iter().all(|m| !m.decl.same_signature(decl)) {
                    found.push(MethodRef {
                        owner: Rc::clone(&class),
                        decl: Rc::clone(decl),
                    });
                }
            }
        }
        found
    }

    /// Every visible constructor overload called `name`.
    pub fn constructors(self: &Rc<Self>, name: &Name) -> Vec<MethodRef> {
        self.method_overloads(name)
            .into_iter()
            .filter(|m| m.decl.is_constructor())
            .collect()
    }
}

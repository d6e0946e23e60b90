//! Object instances and interface views.

use std::fmt;
use std::rc::Rc;

use dws_ir::Name;
use rustc_hash::FxHashMap;

use crate::class::{ClassInfo, InterfaceInfo};
use crate::errors::{undefined_method, EvalError};
use crate::shared::Shared;

use super::Value;

/// An instance of a script class.
pub struct ObjectInstance {
    pub class: Rc<ClassInfo>,
    pub fields: FxHashMap<Name, Value>,
}

/// Shared handle: objects have reference semantics and identity.
pub type ObjectRef = Shared<ObjectInstance>;

impl ObjectInstance {
    pub fn new(class: Rc<ClassInfo>) -> Self {
        ObjectInstance {
            class,
            fields: FxHashMap::default(),
        }
    }

    /// Field value, if the field exists.
    pub fn field(&self, name: &Name) -> Option<Value> {
        self.fields.get(name).cloned()
    }
}

// Fields may point back at this object; print only their names.
impl fmt::Debug for ObjectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.fields.keys().map(Name::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ObjectInstance")
            .field("class", &self.class.name)
            .field("fields", &names)
            .finish()
    }
}

impl Shared<ObjectInstance> {
    /// The runtime class.
    pub fn class(&self) -> Rc<ClassInfo> {
        Rc::clone(&self.borrow().class)
    }

    /// The runtime class name.
    pub fn class_name(&self) -> String {
        self.borrow().class.name.to_string()
    }
}

/// An object seen through one of the interfaces its class implements.
#[derive(Clone)]
pub struct InterfaceRef {
    pub info: Rc<InterfaceInfo>,
    pub object: ObjectRef,
}

impl fmt::Debug for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceRef({} -> {})", self.info.name, self.object.class_name())
    }
}

impl InterfaceRef {
    /// The object behind the view, when the contract declares `member`.
    pub fn narrow(&self, member: &Name) -> Result<ObjectRef, EvalError> {
        if self.info.declares(member) {
            Ok(self.object.clone())
        } else {
            Err(undefined_method(member.as_str(), self.info.name.as_str()))
        }
    }
}

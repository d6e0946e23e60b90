//! Runtime values.
//!
//! `Value` is a closed sum type: every kind the evaluator can produce is a
//! variant here, so adding a kind forces every `match` to be revisited.
//!
//! Ownership follows the language's semantics:
//! - Scalars, strings, enums, subranges and sets are immutable and cloned.
//! - Arrays and objects are shared (`Shared<T>`); assignment copies the
//!   handle, so every holder sees in-place mutation.
//! - Records are shared while being read but deep-copied by assignment and
//!   by-value parameter passing (`Value::copy_for_assign`).

mod array;
mod compare;
mod conversion;
mod function;
mod object;
mod record;
mod set;

use std::fmt;
use std::rc::Rc;

pub use crate::shared::Shared;
pub use array::{ArrayRef, ArrayValue};
pub use compare::{compare_values, values_equal};
pub use conversion::{
    cast_to_boolean, cast_to_float, cast_to_integer, cast_to_string, format_float,
};
pub use function::{Callable, FunctionPointer, LazyState, LazyThunk, Receiver, RefTarget, Reference};
pub use object::{InterfaceRef, ObjectInstance, ObjectRef};
pub use record::{RecordRef, RecordValue};
pub use set::{SetValue, MAX_SET_ORDINAL};

use crate::types::{EnumType, SubrangeType, TypeInfo};

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    Boolean(bool),
    Nil,
    Enum(EnumValue),
    Subrange(SubrangeValue),
    Set(SetValue),
    Array(ArrayRef),
    Record(RecordRef),
    Object(ObjectRef),
    Interface(InterfaceRef),
    /// A dynamically-typed box; `None` is "unassigned".
    Variant(Option<Rc<Value>>),
    Function(FunctionPointer),
    /// Alias of a slot elsewhere; produced only for `var` parameters and
    /// by-reference built-in arguments.
    Reference(Reference),
    /// A `lazy` parameter, forced on first read.
    Lazy(LazyThunk),
    TypeMeta(TypeMeta),
}

/// A member of an enumerated type.
#[derive(Clone, Debug)]
pub struct EnumValue {
    pub ty: Rc<EnumType>,
    pub ordinal: i64,
}

impl EnumValue {
    /// Member name, or `TEnum(n)` for an ordinal with no declared member.
    pub fn member_name(&self) -> String {
        match self.ty.member_name(self.ordinal) {
            Some(name) => name.to_string(),
            None => format!("{}({})", self.ty.name, self.ordinal),
        }
    }
}

/// An integer known to lie within its subrange type's bounds.
#[derive(Clone, Debug)]
pub struct SubrangeValue {
    pub value: i64,
    pub ty: Rc<SubrangeType>,
}

/// A first-class reference to a type (class references, `TypeOf` results).
#[derive(Clone, Debug)]
pub struct TypeMeta {
    /// Per-interpreter RTTI identifier.
    pub id: u32,
    pub info: TypeInfo,
}

impl Value {
    /// Create a string value.
    #[inline]
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    /// Box `value` into a Variant; already-boxed values are returned as is.
    pub fn variant(value: Value) -> Self {
        match value {
            Value::Variant(_) => value,
            other => Value::Variant(Some(Rc::new(other))),
        }
    }

    /// Name of the value's runtime type, for diagnostics and overload keys.
    pub fn type_name(&self) -> String {
        match self {
            Value::Integer(_) => "Integer".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Boolean(_) => "Boolean".to_string(),
            Value::Nil => "nil".to_string(),
            Value::Enum(e) => e.ty.name.to_string(),
            Value::Subrange(s) => s.ty.name.to_string(),
            Value::Set(s) => format!("set of {}", s.element().name()),
            Value::Array(a) => a.borrow().type_name(),
            Value::Record(r) => r.borrow().ty.name.to_string(),
            Value::Object(o) => o.class_name(),
            Value::Interface(i) => i.info.name.to_string(),
            Value::Variant(_) => "Variant".to_string(),
            Value::Function(_) => "function pointer".to_string(),
            Value::Reference(_) => "reference".to_string(),
            Value::Lazy(_) => "lazy".to_string(),
            Value::TypeMeta(meta) => format!("class of {}", meta.info.name()),
        }
    }

    /// Check if this is `nil` (including an interface or Variant holding nothing).
    pub fn is_nil(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Variant(Some(inner)) => inner.is_nil(),
            _ => false,
        }
    }

    /// Strip any Variant boxing.
    pub fn unbox(self) -> Value {
        match self {
            Value::Variant(Some(inner)) => Rc::unwrap_or_clone(inner).unbox(),
            other => other,
        }
    }

    /// Integer payload of Integer and Subrange values.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Subrange(s) => Some(s.value),
            Value::Variant(Some(inner)) => inner.as_integer(),
            _ => None,
        }
    }

    /// Ordinal of ordinal-typed values: integers, subranges, enums,
    /// booleans and single-character strings.
    pub fn ordinal(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Subrange(s) => Some(s.value),
            Value::Enum(e) => Some(e.ordinal),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(i64::from(u32::from(c))),
                    _ => None,
                }
            }
            Value::Variant(Some(inner)) => inner.ordinal(),
            _ => None,
        }
    }

    /// The object behind an Object or Interface value.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            Value::Interface(intf) => Some(&intf.object),
            _ => None,
        }
    }

    /// Copy made when the value is stored into a new slot.
    ///
    /// Records are deep-copied (value semantics); everything else keeps its
    /// handle.
    pub fn copy_for_assign(&self) -> Value {
        match self {
            Value::Record(record) => Value::Record(Shared::new(record.borrow().deep_copy())),
            Value::Variant(Some(inner)) if matches!(**inner, Value::Record(_)) => {
                Value::variant(inner.copy_for_assign())
            }
            other => other.clone(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Rc::from(value))
    }
}

/// Structural equality for tests and host code.
///
/// Script-level `=` goes through [`values_equal`], which also defines the
/// mixed-kind rules and reports `TypeMismatch`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other).unwrap_or(false)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "Integer({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Nil => f.write_str("Nil"),
            Value::Enum(e) => write!(f, "Enum({}.{})", e.ty.name, e.member_name()),
            Value::Subrange(s) => write!(f, "Subrange({}: {})", s.ty.name, s.value),
            Value::Set(s) => write!(f, "Set({s})"),
            Value::Array(a) => write!(f, "Array({a:?})"),
            Value::Record(r) => write!(f, "Record({r:?})"),
            Value::Object(o) => write!(f, "Object({} @{:x})", o.class_name(), o.addr()),
            Value::Interface(i) => write!(
                f,
                "Interface({} -> {} @{:x})",
                i.info.name,
                i.object.class_name(),
                i.object.addr()
            ),
            Value::Variant(None) => f.write_str("Variant(Unassigned)"),
            Value::Variant(Some(inner)) => write!(f, "Variant({inner:?})"),
            Value::Function(func) => write!(f, "Function({})", func.describe()),
            Value::Reference(r) => write!(f, "Reference({})", r.describe()),
            Value::Lazy(_) => f.write_str("Lazy"),
            Value::TypeMeta(meta) => write!(f, "TypeMeta({} #{})", meta.info.name(), meta.id),
        }
    }
}

/// The text `Print` produces for a value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::String(s) => f.write_str(s),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::Nil => f.write_str("nil"),
            Value::Enum(e) => f.write_str(&e.member_name()),
            Value::Subrange(s) => write!(f, "{}", s.value),
            Value::Set(s) => write!(f, "{s}"),
            Value::Array(a) => {
                let array = a.borrow();
                f.write_str("[")?;
                for (i, item) in array.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(r) => {
                let record = r.borrow();
                f.write_str("(")?;
                for (i, (field, value)) in record.ty.fields.iter().zip(&record.values).enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}: {value}", field.name)?;
                }
                f.write_str(")")
            }
            Value::Object(o) => f.write_str(&o.class_name()),
            Value::Interface(i) => f.write_str(&i.object.class_name()),
            Value::Variant(None) => Ok(()),
            Value::Variant(Some(inner)) => write!(f, "{inner}"),
            Value::Function(func) => f.write_str(&func.describe()),
            Value::Reference(r) => f.write_str(&r.describe()),
            Value::Lazy(_) => f.write_str("<lazy>"),
            Value::TypeMeta(meta) => f.write_str(&meta.info.name()),
        }
    }
}

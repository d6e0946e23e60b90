//! Runtime type descriptors.
//!
//! `TypeInfo` is what a `TypeExpr` resolves to once the program's type
//! declarations are loaded. It drives default initialization, assignment
//! coercion (Variant boxing, subrange validation, record copies) and the
//! overload ranking. Class and interface types are referenced by name so the
//! descriptors never form cycles with class metadata.

use std::fmt;
use std::rc::Rc;

use dws_ir::{Name, ParamMode};
use rustc_hash::FxHashMap;

use crate::value::{ArrayValue, EnumValue, RecordValue, SetValue, Shared, SubrangeValue, Value};

/// A resolved type.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeInfo {
    Integer,
    Float,
    String,
    Boolean,
    Variant,
    Enum(Rc<EnumType>),
    Subrange(Rc<SubrangeType>),
    Set(Rc<SetType>),
    Array(Rc<ArrayType>),
    Record(Rc<RecordType>),
    Class(Name),
    Interface(Name),
    Function(Rc<FunctionType>),
}

/// An enumerated type; members keep declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumType {
    pub name: Name,
    pub members: Vec<(Name, i64)>,
}

impl EnumType {
    /// Name of the member with `ordinal`, if any.
    pub fn member_name(&self, ordinal: i64) -> Option<&Name> {
        self.members
            .iter()
            .find(|(_, value)| *value == ordinal)
            .map(|(name, _)| name)
    }

    /// Ordinal of the member called `name`.
    pub fn ordinal_of(&self, name: &Name) -> Option<i64> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, value)| *value)
    }

    /// Declaration position of `ordinal`.
    pub fn position(&self, ordinal: i64) -> Option<usize> {
        self.members.iter().position(|(_, value)| *value == ordinal)
    }

    /// First declared ordinal.
    pub fn low(&self) -> i64 {
        self.members.first().map_or(0, |(_, value)| *value)
    }

    /// Last declared ordinal.
    pub fn high(&self) -> i64 {
        self.members.last().map_or(0, |(_, value)| *value)
    }
}

/// An integer subrange with inclusive bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubrangeType {
    pub name: Name,
    pub low: i64,
    pub high: i64,
}

impl SubrangeType {
    /// Check if `value` lies within the bounds.
    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        self.low <= value && value <= self.high
    }
}

/// `set of T`.
#[derive(Clone, Debug, PartialEq)]
pub struct SetType {
    pub element: TypeInfo,
}

/// A static (`bounds: Some`) or dynamic array type.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayType {
    pub element: TypeInfo,
    pub bounds: Option<(i64, i64)>,
}

/// A record field with its type and optional constant default.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordField {
    pub name: Name,
    pub ty: TypeInfo,
    pub default: Option<Value>,
}

/// A record type.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordType {
    pub name: Name,
    pub fields: Vec<RecordField>,
}

impl RecordType {
    /// Position of the field called `name`.
    pub fn field_index(&self, name: &Name) -> Option<usize> {
        self.fields.iter().position(|field| &field.name == name)
    }
}

/// A function-pointer signature.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub params: Vec<(ParamMode, TypeInfo)>,
    pub result: Option<TypeInfo>,
    pub of_object: bool,
}

impl TypeInfo {
    /// Display name used in diagnostics and as the RTTI key.
    pub fn name(&self) -> String {
        match self {
            TypeInfo::Integer => "Integer".to_string(),
            TypeInfo::Float => "Float".to_string(),
            TypeInfo::String => "String".to_string(),
            TypeInfo::Boolean => "Boolean".to_string(),
            TypeInfo::Variant => "Variant".to_string(),
            TypeInfo::Enum(ty) => ty.name.to_string(),
            TypeInfo::Subrange(ty) => ty.name.to_string(),
            TypeInfo::Set(ty) => format!("set of {}", ty.element.name()),
            TypeInfo::Array(ty) => match ty.bounds {
                Some((low, high)) => format!("array[{low}..{high}] of {}", ty.element.name()),
                None => format!("array of {}", ty.element.name()),
            },
            TypeInfo::Record(ty) => ty.name.to_string(),
            TypeInfo::Class(name) | TypeInfo::Interface(name) => name.to_string(),
            TypeInfo::Function(ty) => {
                let kind = if ty.result.is_some() {
                    "function"
                } else {
                    "procedure"
                };
                let params: Vec<String> = ty.params.iter().map(|(_, p)| p.name()).collect();
                let mut name = format!("{kind}({})", params.join(", "));
                if let Some(result) = &ty.result {
                    name.push_str(": ");
                    name.push_str(&result.name());
                }
                if ty.of_object {
                    name.push_str(" of object");
                }
                name
            }
        }
    }

    /// Check if values of this type are ordinals.
    pub fn is_ordinal(&self) -> bool {
        matches!(
            self,
            TypeInfo::Integer | TypeInfo::Boolean | TypeInfo::Enum(_) | TypeInfo::Subrange(_)
        )
    }

    /// The zero value a slot of this type starts with.
    ///
    /// Numbers are 0, strings empty, booleans false, references Nil. Records
    /// and static arrays are allocated with default contents.
    pub fn default_value(&self) -> Value {
        match self {
            TypeInfo::Integer => Value::Integer(0),
            TypeInfo::Float => Value::Float(0.0),
            TypeInfo::String => Value::string(""),
            TypeInfo::Boolean => Value::Boolean(false),
            TypeInfo::Variant => Value::Variant(None),
            TypeInfo::Enum(ty) => Value::Enum(EnumValue {
                ty: Rc::clone(ty),
                ordinal: ty.low(),
            }),
            TypeInfo::Subrange(ty) => Value::Subrange(SubrangeValue {
                value: if ty.contains(0) { 0 } else { ty.low },
                ty: Rc::clone(ty),
            }),
            TypeInfo::Set(ty) => Value::Set(SetValue::empty(ty.element.clone())),
            TypeInfo::Array(ty) => {
                let array = match ty.bounds {
                    Some((low, high)) => {
                        let len = usize::try_from(high.saturating_sub(low).saturating_add(1))
                            .unwrap_or(0);
                        // Each element gets its own record or array allocation.
                        let items = (0..len).map(|_| ty.element.default_value()).collect();
                        ArrayValue::fixed(ty.element.clone(), low, items)
                    }
                    None => ArrayValue::dynamic(ty.element.clone(), Vec::new()),
                };
                Value::Array(Shared::new(array))
            }
            TypeInfo::Record(ty) => Value::Record(Shared::new(RecordValue::with_defaults(ty))),
            TypeInfo::Class(_) | TypeInfo::Interface(_) | TypeInfo::Function(_) => Value::Nil,
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Per-interpreter RTTI type IDs.
///
/// IDs are assigned on first request, keyed by canonical type name. The
/// counter belongs to one interpreter, so concurrent interpreters never
/// collide.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    ids: FxHashMap<String, u32>,
    next: u32,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ID for `ty`, assigning a fresh one on first use.
    pub fn id_of(&mut self, ty: &TypeInfo) -> u32 {
        let key = Name::canonical(&ty.name());
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        self.next = self.next.wrapping_add(1);
        self.ids.insert(key, self.next);
        self.next
    }

    /// Number of types that have been assigned an ID.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;

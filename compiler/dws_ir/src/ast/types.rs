//! Resolved type annotations.
//!
//! The semantic analyzer resolves every declared type down to one of these
//! shapes. Named types (`Integer`, `TPoint`, `TColor`, class and interface
//! names, aliases) are looked up by the evaluator's type table.

use super::ParamMode;
use crate::Name;

/// A type annotation on a variable, field, parameter or alias.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// A named type: primitive, alias, enum, record, class or interface.
    Named(Name),
    /// `array[low..high] of T`.
    StaticArray {
        low: i64,
        high: i64,
        element: Box<TypeExpr>,
    },
    /// `array of T`, zero-based and resizable.
    DynamicArray(Box<TypeExpr>),
    /// `set of T` over an ordinal type.
    Set(Box<TypeExpr>),
    /// `low..high`, an integer subrange.
    Subrange { low: i64, high: i64 },
    /// `function(...): T` / `procedure(...)`, optionally `of object`.
    Function(Box<FunctionTypeExpr>),
}

/// Signature of a function-pointer type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionTypeExpr {
    pub params: Vec<(ParamMode, TypeExpr)>,
    pub return_type: Option<TypeExpr>,
    pub of_object: bool,
}

impl TypeExpr {
    /// A named type.
    pub fn named(name: &str) -> Self {
        TypeExpr::Named(Name::new(name))
    }

    /// `Integer`.
    pub fn integer() -> Self {
        Self::named("Integer")
    }

    /// `Float`.
    pub fn float() -> Self {
        Self::named("Float")
    }

    /// `String`.
    pub fn string() -> Self {
        Self::named("String")
    }

    /// `Boolean`.
    pub fn boolean() -> Self {
        Self::named("Boolean")
    }

    /// `Variant`.
    pub fn variant() -> Self {
        Self::named("Variant")
    }

    /// `array[low..high] of element`.
    pub fn static_array(low: i64, high: i64, element: TypeExpr) -> Self {
        TypeExpr::StaticArray {
            low,
            high,
            element: Box::new(element),
        }
    }

    /// `array of element`.
    pub fn dynamic_array(element: TypeExpr) -> Self {
        TypeExpr::DynamicArray(Box::new(element))
    }

    /// `set of element`.
    pub fn set_of(element: TypeExpr) -> Self {
        TypeExpr::Set(Box::new(element))
    }

    /// `low..high`.
    pub fn subrange(low: i64, high: i64) -> Self {
        TypeExpr::Subrange { low, high }
    }

    /// A function-pointer type.
    pub fn function(
        params: Vec<(ParamMode, TypeExpr)>,
        return_type: Option<TypeExpr>,
        of_object: bool,
    ) -> Self {
        TypeExpr::Function(Box::new(FunctionTypeExpr {
            params,
            return_type,
            of_object,
        }))
    }
}

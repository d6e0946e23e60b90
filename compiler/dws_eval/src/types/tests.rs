use std::rc::Rc;

use dws_ir::{Name, ParamMode};
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn default_values() {
    assert_eq!(TypeInfo::Integer.default_value(), Value::Integer(0));
    assert_eq!(TypeInfo::String.default_value(), Value::from(""));
    assert_eq!(TypeInfo::Boolean.default_value(), Value::Boolean(false));
    assert!(matches!(TypeInfo::Variant.default_value(), Value::Variant(None)));
    assert!(matches!(
        TypeInfo::Class(Name::new("TFoo")).default_value(),
        Value::Nil
    ));
}

#[test]
fn subrange_default_is_zero_or_low() {
    let with_zero = TypeInfo::Subrange(Rc::new(SubrangeType {
        name: Name::new("TSigned"),
        low: -5,
        high: 5,
    }));
    let without_zero = TypeInfo::Subrange(Rc::new(SubrangeType {
        name: Name::new("TDigit"),
        low: 1,
        high: 9,
    }));
    assert_eq!(with_zero.default_value().as_integer(), Some(0));
    assert_eq!(without_zero.default_value().as_integer(), Some(1));
}

#[test]
fn static_array_elements_are_distinct_records() {
    let record = Rc::new(RecordType {
        name: Name::new("TCell"),
        fields: vec![RecordField {
            name: Name::new("V"),
            ty: TypeInfo::Integer,
            default: None,
        }],
    });
    let ty = TypeInfo::Array(Rc::new(ArrayType {
        element: TypeInfo::Record(record),
        bounds: Some((0, 1)),
    }));
    let Value::Array(array) = ty.default_value() else {
        panic!("expected array");
    };
    let array = array.borrow();
    let (Value::Record(a), Value::Record(b)) = (&array.items[0], &array.items[1]) else {
        panic!("expected records");
    };
    assert!(!a.ptr_eq(b));
}

#[test]
fn type_names() {
    let enum_ty = Rc::new(EnumType {
        name: Name::new("TColor"),
        members: vec![(Name::new("Red"), 0), (Name::new("Blue"), 4)],
    });
    assert_eq!(enum_ty.low(), 0);
    assert_eq!(enum_ty.high(), 4);
    assert_eq!(enum_ty.ordinal_of(&Name::new("blue")), Some(4));
    assert_eq!(
        TypeInfo::Set(Rc::new(SetType {
            element: TypeInfo::Enum(enum_ty),
        }))
        .name(),
        "set of TColor"
    );
    let func = TypeInfo::Function(Rc::new(FunctionType {
        params: vec![(ParamMode::Value, TypeInfo::Integer)],
        result: Some(TypeInfo::Integer),
        of_object: true,
    }));
    assert_eq!(func.name(), "function(Integer): Integer of object");
}

#[test]
fn type_ids_are_stable_and_case_insensitive() {
    let mut registry = TypeRegistry::new();
    let a = registry.id_of(&TypeInfo::Class(Name::new("TFoo")));
    let b = registry.id_of(&TypeInfo::Class(Name::new("tfoo")));
    let c = registry.id_of(&TypeInfo::Integer);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(registry.len(), 2);
}

#[test]
fn separate_registries_do_not_share_counters() {
    let mut first = TypeRegistry::new();
    let mut second = TypeRegistry::new();
    first.id_of(&TypeInfo::Integer);
    first.id_of(&TypeInfo::Float);
    assert_eq!(second.id_of(&TypeInfo::Float), 1);
}

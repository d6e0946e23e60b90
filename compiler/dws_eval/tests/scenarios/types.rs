use dws_eval::{EvalErrorKind, Value};
use dws_ir::{
    BinaryOp, Decl, EnumDecl, Expr, FieldDecl, RecordDecl, SetElement, Stmt, TypeExpr,
};
use pretty_assertions::assert_eq;

use super::{call, int_var, println, run, typed_var};

fn point() -> Vec<Decl> {
    vec![Decl::record(
        RecordDecl::new("TPoint")
            .field(FieldDecl::new("X", TypeExpr::integer()))
            .field(FieldDecl::new("Y", TypeExpr::integer())),
    )]
}

fn colors() -> Vec<Decl> {
    vec![Decl::enumeration(EnumDecl::new("TColor", &["Red", "Green", "Blue"]))]
}

#[test]
fn records_are_copied_on_assignment() {
    let body = vec![
        Stmt::var("a", Some(TypeExpr::named("TPoint")), None),
        Stmt::assign(Expr::member(Expr::ident("a"), "X"), Expr::int(1)),
        typed_var("b", "TPoint", Expr::ident("a")),
        Stmt::assign(Expr::member(Expr::ident("b"), "X"), Expr::int(2)),
        println(vec![
            Expr::member(Expr::ident("a"), "X"),
            Expr::string(" "),
            Expr::member(Expr::ident("b"), "X"),
        ]),
    ];
    assert_eq!(run(point(), body).ok(), "1 2\n");
}

#[test]
fn record_literal_fills_named_fields() {
    let body = vec![
        typed_var(
            "p",
            "TPoint",
            Expr::record(Some("TPoint"), vec![("Y", Expr::int(7)), ("X", Expr::int(3))]),
        ),
        println(vec![Expr::ident("p")]),
    ];
    assert_eq!(run(point(), body).ok(), "(X: 3; Y: 7)\n");
}

#[test]
fn record_unknown_field_fails() {
    let body = vec![
        Stmt::var("p", Some(TypeExpr::named("TPoint")), None),
        Stmt::assign(Expr::member(Expr::ident("p"), "Z"), Expr::int(1)),
    ];
    assert!(matches!(
        run(point(), body).err(),
        EvalErrorKind::UndefinedField { .. }
    ));
}

#[test]
fn static_array_bounds() {
    let body = vec![
        Stmt::var(
            "a",
            Some(TypeExpr::static_array(1, 3, TypeExpr::integer())),
            None,
        ),
        Stmt::assign(Expr::index(Expr::ident("a"), vec![Expr::int(1)]), Expr::int(5)),
        println(vec![Expr::ident("a")]),
        println(vec![
            Expr::call("Low", vec![Expr::ident("a")]),
            Expr::string(".."),
            Expr::call("High", vec![Expr::ident("a")]),
            Expr::string(" "),
            Expr::call("Length", vec![Expr::ident("a")]),
        ]),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "[5, 0, 0]\n1..3 3\n");
}

#[test]
fn dynamic_arrays_share_storage() {
    let body = vec![
        Stmt::var("a", Some(TypeExpr::dynamic_array(TypeExpr::integer())), None),
        call("SetLength", vec![Expr::ident("a"), Expr::int(2)]),
        Stmt::var("b", None, Some(Expr::ident("a"))),
        Stmt::assign(Expr::index(Expr::ident("b"), vec![Expr::int(1)]), Expr::int(9)),
        println(vec![Expr::ident("a")]),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "[0, 9]\n");
}

#[test]
fn array_index_out_of_bounds() {
    let body = vec![
        Stmt::var(
            "a",
            Some(TypeExpr::static_array(1, 3, TypeExpr::integer())),
            None,
        ),
        println(vec![Expr::index(Expr::ident("a"), vec![Expr::int(4)])]),
    ];
    assert_eq!(
        run(Vec::new(), body).err(),
        EvalErrorKind::IndexOutOfBounds {
            index: 4,
            low: 1,
            high: 3,
        }
    );
}

#[test]
fn dynamic_arrays_grow_with_set_length() {
    let body = vec![
        Stmt::var("d", Some(TypeExpr::dynamic_array(TypeExpr::string())), None),
        call("SetLength", vec![Expr::ident("d"), Expr::int(2)]),
        Stmt::assign(Expr::index(Expr::ident("d"), vec![Expr::int(1)]), Expr::string("b")),
        println(vec![Expr::call("Length", vec![Expr::ident("d")]), Expr::ident("d")]),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "2[, b]\n");
}

#[test]
fn set_length_rejects_huge_lengths() {
    let body = vec![
        Stmt::var("d", Some(TypeExpr::dynamic_array(TypeExpr::integer())), None),
        call("SetLength", vec![Expr::ident("d"), Expr::int(1_000_000_000_000)]),
    ];
    assert_eq!(
        run(Vec::new(), body).err(),
        EvalErrorKind::OutOfRange {
            value: 1_000_000_000_000,
            type_name: "length".to_string(),
            low: 0,
            high: 1 << 24,
        }
    );
}

#[test]
fn string_characters_are_one_based() {
    let body = vec![
        typed_var("s", "String", Expr::string("cat")),
        Stmt::assign(Expr::index(Expr::ident("s"), vec![Expr::int(1)]), Expr::string("b")),
        println(vec![Expr::ident("s"), Expr::index(Expr::ident("s"), vec![Expr::int(3)])]),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "batt\n");
}

#[test]
fn enums_have_ordinals_and_successors() {
    let body = vec![
        println(vec![Expr::call("Ord", vec![Expr::ident("Blue")])]),
        println(vec![Expr::call("Succ", vec![Expr::ident("Red")])]),
        println(vec![Expr::call("TColor", vec![Expr::int(1)])]),
        println(vec![Expr::member(Expr::ident("TColor"), "Blue")]),
        println(vec![Expr::binary(BinaryOp::Lt, Expr::ident("Red"), Expr::ident("Blue"))]),
    ];
    assert_eq!(run(colors(), body).ok(), "2\nGreen\nGreen\nBlue\nTrue\n");
}

#[test]
fn sets_of_enums() {
    let body = vec![
        Stmt::var(
            "s",
            Some(TypeExpr::set_of(TypeExpr::named("TColor"))),
            Some(Expr::set(vec![
                SetElement::single(Expr::ident("Red")),
                SetElement::single(Expr::ident("Blue")),
            ])),
        ),
        println(vec![Expr::binary(BinaryOp::In, Expr::ident("Green"), Expr::ident("s"))]),
        call("Include", vec![Expr::ident("s"), Expr::ident("Green")]),
        call("Exclude", vec![Expr::ident("s"), Expr::ident("Red")]),
        println(vec![Expr::binary(BinaryOp::In, Expr::ident("Green"), Expr::ident("s"))]),
        Stmt::for_in("c", Expr::ident("s"), println(vec![Expr::ident("c")])),
    ];
    assert_eq!(run(colors(), body).ok(), "False\nTrue\nGreen\nBlue\n");
}

#[test]
fn integer_set_ranges() {
    let body = vec![
        Stmt::var(
            "digits",
            None,
            Some(Expr::set(vec![SetElement::range(Expr::int(1), Expr::int(5))])),
        ),
        println(vec![
            Expr::binary(BinaryOp::In, Expr::int(3), Expr::ident("digits")),
            Expr::binary(BinaryOp::In, Expr::int(6), Expr::ident("digits")),
        ]),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "TrueFalse\n");
}

#[test]
fn variants_box_any_value() {
    let body = vec![
        Stmt::var("v", Some(TypeExpr::variant()), Some(Expr::int(5))),
        println(vec![Expr::binary(BinaryOp::Add, Expr::ident("v"), Expr::int(1))]),
        Stmt::assign(Expr::ident("v"), Expr::string("text")),
        println(vec![Expr::ident("v")]),
    ];
    let run = run(Vec::new(), body);
    assert!(matches!(
        run.interpreter.global_value("v"),
        Some(Value::Variant(Some(_)))
    ));
    assert_eq!(run.ok(), "6\ntext\n");
}

#[test]
fn integers_widen_to_float() {
    let body = vec![
        Stmt::var("f", Some(TypeExpr::float()), Some(Expr::int(3))),
        println(vec![Expr::binary(BinaryOp::Div, Expr::ident("f"), Expr::int(2))]),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "1.5\n");
}

#[test]
fn incompatible_assignment_fails() {
    let body = vec![
        int_var("i", 1),
        Stmt::assign(Expr::ident("i"), Expr::string("x")),
    ];
    let run = run(Vec::new(), body);
    assert_eq!(run.global_int("i"), Some(1));
    assert!(matches!(run.err(), EvalErrorKind::ExpectedType { .. }));
}

#[test]
fn constants_cannot_be_assigned() {
    let body = vec![
        Stmt::const_decl("Limit", None, Expr::int(3)),
        Stmt::assign(Expr::ident("Limit"), Expr::int(4)),
    ];
    assert!(matches!(
        run(Vec::new(), body).err(),
        EvalErrorKind::ConstantAssignment { .. }
    ));
}

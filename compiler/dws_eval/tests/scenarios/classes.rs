use dws_eval::EvalErrorKind;
use dws_ir::{
    BinaryOp, ClassDecl, Decl, Expr, FieldDecl, FunctionDecl, InterfaceDecl, MethodFlags,
    OperatorDecl, OperatorKind, Param, PropertyAccess, PropertyDecl, Stmt, TypeExpr,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::{println, result_is, run, typed_var};

fn create(class: &str, args: Vec<Expr>) -> Expr {
    Expr::method_call(Expr::ident(class), "Create", args)
}

fn shapes() -> Vec<Decl> {
    let shape = ClassDecl::new("TShape").abstract_class().method(
        FunctionDecl::function("Area", TypeExpr::float())
            .with_flags(MethodFlags::VIRTUAL | MethodFlags::ABSTRACT),
    );
    let square = ClassDecl::new("TSquare")
        .parent("TShape")
        .field(FieldDecl::new("FSide", TypeExpr::float()))
        .method(
            FunctionDecl::constructor("Create")
                .param(Param::value("side", TypeExpr::float()))
                .body(vec![Stmt::assign(Expr::ident("FSide"), Expr::ident("side"))]),
        )
        .method(
            FunctionDecl::function("Area", TypeExpr::float())
                .with_flags(MethodFlags::OVERRIDE)
                .body(vec![result_is(Expr::binary(
                    BinaryOp::Mul,
                    Expr::ident("FSide"),
                    Expr::ident("FSide"),
                ))]),
        );
    let circle = ClassDecl::new("TCircle").parent("TShape");
    vec![Decl::class(shape), Decl::class(square), Decl::class(circle)]
}

#[test]
fn abstract_method_dispatches_to_override() {
    let body = vec![
        typed_var("s", "TShape", create("TSquare", vec![Expr::float(3.0)])),
        println(vec![Expr::member(Expr::ident("s"), "Area")]),
    ];
    assert_eq!(run(shapes(), body).ok(), "9\n");
}

#[test]
fn abstract_class_cannot_be_instantiated() {
    let body = vec![typed_var("s", "TShape", create("TShape", Vec::new()))];
    assert_eq!(
        run(shapes(), body).err(),
        EvalErrorKind::AbstractInstantiation {
            class: "TShape".to_string()
        }
    );
}

#[test]
fn calling_unimplemented_abstract_method_fails() {
    let body = vec![
        typed_var("c", "TShape", create("TCircle", Vec::new())),
        println(vec![Expr::member(Expr::ident("c"), "Area")]),
    ];
    assert!(matches!(
        run(shapes(), body).err(),
        EvalErrorKind::AbstractMethodCall { .. }
    ));
}

fn animals() -> Vec<Decl> {
    let animal = ClassDecl::new("TAnimal")
        .field(FieldDecl::new("FName", TypeExpr::string()))
        .method(
            FunctionDecl::constructor("Create")
                .param(Param::value("name", TypeExpr::string()))
                .body(vec![Stmt::assign(Expr::ident("FName"), Expr::ident("name"))]),
        )
        .method(
            FunctionDecl::function("Describe", TypeExpr::string())
                .with_flags(MethodFlags::VIRTUAL)
                .body(vec![result_is(Expr::ident("FName"))]),
        );
    let dog = ClassDecl::new("TDog")
        .parent("TAnimal")
        .field(FieldDecl::new("FLegs", TypeExpr::integer()))
        .method(
            FunctionDecl::constructor("Create")
                .param(Param::value("name", TypeExpr::string()))
                .body(vec![
                    Stmt::expr(Expr::inherited(Some("Create"), Some(vec![Expr::ident("name")]))),
                    Stmt::assign(Expr::ident("FLegs"), Expr::int(4)),
                ]),
        )
        .method(
            FunctionDecl::function("Describe", TypeExpr::string())
                .with_flags(MethodFlags::OVERRIDE)
                .body(vec![result_is(Expr::binary(
                    BinaryOp::Add,
                    Expr::inherited(None, None),
                    Expr::string(" the dog"),
                ))]),
        );
    vec![Decl::class(animal), Decl::class(dog)]
}

#[test]
fn inherited_reaches_parent_implementation() {
    let body = vec![
        typed_var("a", "TAnimal", create("TDog", vec![Expr::string("Rex")])),
        println(vec![Expr::member(Expr::ident("a"), "Describe")]),
        println(vec![Expr::member(Expr::ident("a"), "FLegs")]),
    ];
    assert_eq!(run(animals(), body).ok(), "Rex the dog\n4\n");
}

#[test]
fn virtual_dispatch_survives_casts() {
    let body = vec![
        typed_var("a", "TAnimal", create("TDog", vec![Expr::string("Rex")])),
        println(vec![Expr::member(
            Expr::call("TAnimal", vec![Expr::ident("a")]),
            "Describe",
        )]),
        println(vec![Expr::member(
            Expr::as_cast(Expr::ident("a"), "TAnimal"),
            "Describe",
        )]),
    ];
    assert_eq!(run(animals(), body).ok(), "Rex the dog\nRex the dog\n");
}

#[test]
fn is_and_as_follow_the_hierarchy() {
    let body = vec![
        typed_var("a", "TAnimal", create("TAnimal", vec![Expr::string("Cat")])),
        typed_var("d", "TAnimal", create("TDog", vec![Expr::string("Rex")])),
        println(vec![Expr::is(Expr::ident("d"), "TAnimal")]),
        println(vec![Expr::is(Expr::ident("a"), "TDog")]),
        println(vec![Expr::is(Expr::nil(), "TObject")]),
        println(vec![Expr::member(Expr::ident("d"), "ClassName")]),
        println(vec![Expr::method_call(
            Expr::ident("TDog"),
            "InheritsFrom",
            vec![Expr::ident("TAnimal")],
        )]),
        Stmt::expr(Expr::as_cast(Expr::ident("a"), "TDog")),
    ];
    let run = run(animals(), body);
    assert_eq!(run.output, "True\nFalse\nFalse\nTDog\nTrue\n");
    assert_eq!(
        run.err(),
        EvalErrorKind::InvalidCast {
            from: "TAnimal".to_string(),
            to: "TDog".to_string(),
        }
    );
}

fn boxes() -> Vec<Decl> {
    let class = ClassDecl::new("TBox")
        .field(FieldDecl::new("FValue", TypeExpr::integer()))
        .method(
            FunctionDecl::function("GetValue", TypeExpr::integer())
                .body(vec![result_is(Expr::ident("FValue"))]),
        )
        .method(
            FunctionDecl::procedure("SetHalf")
                .param(Param::value("v", TypeExpr::integer()))
                .body(vec![Stmt::assign(
                    Expr::ident("FValue"),
                    Expr::binary(BinaryOp::IntDiv, Expr::ident("v"), Expr::int(2)),
                )]),
        )
        .property(
            PropertyDecl::new("Value", TypeExpr::integer())
                .read(PropertyAccess::member("FValue"))
                .write(PropertyAccess::member("FValue")),
        )
        .property(
            PropertyDecl::new("Doubled", TypeExpr::integer())
                .read(PropertyAccess::Expression(Expr::binary(
                    BinaryOp::Mul,
                    Expr::ident("FValue"),
                    Expr::int(2),
                )))
                .write(PropertyAccess::member("SetHalf")),
        )
        .property(
            PropertyDecl::new("Current", TypeExpr::integer()).read(PropertyAccess::member("GetValue")),
        );
    vec![Decl::class(class)]
}

proptest! {
    #[test]
    fn field_backed_property_round_trips(v in any::<i32>()) {
        let body = vec![
            typed_var("b", "TBox", create("TBox", Vec::new())),
            Stmt::assign(Expr::member(Expr::ident("b"), "Value"), Expr::int(i64::from(v))),
            println(vec![Expr::member(Expr::ident("b"), "Value")]),
        ];
        let run = run(boxes(), body);
        prop_assert!(run.result.is_ok());
        prop_assert_eq!(run.output, format!("{v}\n"));
    }

    #[test]
    fn consistent_accessor_pair_round_trips(v in -1000i64..1000) {
        let even = v * 2;
        let body = vec![
            typed_var("b", "TBox", create("TBox", Vec::new())),
            Stmt::assign(Expr::member(Expr::ident("b"), "Doubled"), Expr::int(even)),
            println(vec![Expr::member(Expr::ident("b"), "Doubled")]),
        ];
        let run = run(boxes(), body);
        prop_assert!(run.result.is_ok());
        prop_assert_eq!(run.output, format!("{even}\n"));
    }
}

fn digit_box() -> Vec<Decl> {
    let class = ClassDecl::new("TDigitBox")
        .field(FieldDecl::new("FDigit", TypeExpr::named("TDigit")))
        .class_var(FieldDecl::new("Shared", TypeExpr::named("TDigit")).with_init(Expr::int(1)))
        .property(
            PropertyDecl::new("Digit", TypeExpr::integer())
                .read(PropertyAccess::member("FDigit"))
                .write(PropertyAccess::member("FDigit")),
        )
        .property(
            PropertyDecl::new("SharedDigit", TypeExpr::integer())
                .read(PropertyAccess::member("Shared"))
                .write(PropertyAccess::member("Shared")),
        );
    vec![
        Decl::alias("TDigit", TypeExpr::subrange(0, 9)),
        Decl::class(class),
    ]
}

fn digit_out_of_range(value: i64) -> EvalErrorKind {
    EvalErrorKind::OutOfRange {
        value,
        type_name: "TDigit".to_string(),
        low: 0,
        high: 9,
    }
}

#[test]
fn property_write_checks_backing_field_type() {
    let body = vec![
        typed_var("b", "TDigitBox", create("TDigitBox", Vec::new())),
        Stmt::assign(Expr::member(Expr::ident("b"), "Digit"), Expr::int(7)),
        println(vec![Expr::member(Expr::ident("b"), "Digit")]),
        Stmt::assign(Expr::member(Expr::ident("b"), "Digit"), Expr::int(15)),
    ];
    let run = run(digit_box(), body);
    assert_eq!(run.output, "7\n");
    assert_eq!(run.err(), digit_out_of_range(15));
}

#[test]
fn property_write_checks_backing_class_var_type() {
    let body = vec![
        typed_var("b", "TDigitBox", create("TDigitBox", Vec::new())),
        Stmt::assign(Expr::member(Expr::ident("b"), "SharedDigit"), Expr::int(-1)),
    ];
    assert_eq!(run(digit_box(), body).err(), digit_out_of_range(-1));
}

#[test]
fn read_only_property_rejects_writes() {
    let body = vec![
        typed_var("b", "TBox", create("TBox", Vec::new())),
        Stmt::assign(Expr::member(Expr::ident("b"), "Current"), Expr::int(1)),
    ];
    assert_eq!(
        run(boxes(), body).err(),
        EvalErrorKind::ReadOnlyProperty {
            property: "Current".to_string()
        }
    );
}

#[test]
fn method_pointer_captures_the_object() {
    let body = vec![
        typed_var("obj", "TBox", create("TBox", Vec::new())),
        Stmt::assign(Expr::member(Expr::ident("obj"), "Value"), Expr::int(10)),
        Stmt::var(
            "fp",
            None,
            Some(Expr::address_of(Expr::member(Expr::ident("obj"), "GetValue"))),
        ),
        Stmt::assign(Expr::member(Expr::ident("obj"), "Value"), Expr::int(20)),
        println(vec![Expr::call("fp", Vec::new())]),
    ];
    assert_eq!(run(boxes(), body).ok(), "20\n");
}

fn grid() -> Vec<Decl> {
    let class = ClassDecl::new("TGrid")
        .method(
            FunctionDecl::function("GetCell", TypeExpr::integer())
                .param(Param::value("i", TypeExpr::integer()))
                .body(vec![result_is(Expr::binary(
                    BinaryOp::Mul,
                    Expr::ident("i"),
                    Expr::int(10),
                ))]),
        )
        .property(
            PropertyDecl::new("Cells", TypeExpr::integer())
                .index_param(Param::value("i", TypeExpr::integer()))
                .read(PropertyAccess::member("GetCell"))
                .default_property(),
        );
    vec![Decl::class(class)]
}

#[test]
fn indexed_and_default_properties() {
    let body = vec![
        typed_var("g", "TGrid", create("TGrid", Vec::new())),
        println(vec![Expr::index(
            Expr::member(Expr::ident("g"), "Cells"),
            vec![Expr::int(4)],
        )]),
        println(vec![Expr::index(Expr::ident("g"), vec![Expr::int(3)])]),
        println(vec![Expr::member(Expr::ident("g"), "Cells")]),
    ];
    let run = run(grid(), body);
    assert_eq!(run.output, "40\n30\n");
    assert_eq!(
        run.err(),
        EvalErrorKind::IndexedPropertyWithoutIndex {
            property: "Cells".to_string()
        }
    );
}

#[test]
fn circular_property_is_detected() {
    let class = ClassDecl::new("TLoop")
        .property(PropertyDecl::new("A", TypeExpr::integer()).read(PropertyAccess::member("B")))
        .property(PropertyDecl::new("B", TypeExpr::integer()).read(PropertyAccess::member("A")));
    let body = vec![
        typed_var("o", "TLoop", create("TLoop", Vec::new())),
        println(vec![Expr::member(Expr::ident("o"), "A")]),
    ];
    assert!(matches!(
        run(vec![Decl::class(class)], body).err(),
        EvalErrorKind::CircularPropertyReference { .. }
    ));
}

fn counter() -> Vec<Decl> {
    let class = ClassDecl::new("TCounter")
        .class_var(FieldDecl::new("Count", TypeExpr::integer()).with_init(Expr::int(0)))
        .constant("Limit", Expr::int(10))
        .method(FunctionDecl::constructor("Create").body(vec![Stmt::assign(
            Expr::ident("Count"),
            Expr::binary(BinaryOp::Add, Expr::ident("Count"), Expr::int(1)),
        )]))
        .method(
            FunctionDecl::function("Remaining", TypeExpr::integer())
                .with_flags(MethodFlags::CLASS)
                .body(vec![result_is(Expr::binary(
                    BinaryOp::Sub,
                    Expr::ident("Limit"),
                    Expr::ident("Count"),
                ))]),
        )
        .property(
            PropertyDecl::new("Total", TypeExpr::integer())
                .read(PropertyAccess::member("Count"))
                .class_property(),
        );
    vec![Decl::class(class)]
}

#[test]
fn class_variables_are_shared() {
    let body = vec![
        Stmt::expr(create("TCounter", Vec::new())),
        typed_var("c", "TCounter", Expr::new_object("TCounter", Vec::new())),
        println(vec![Expr::member(Expr::ident("TCounter"), "Count")]),
        println(vec![Expr::member(Expr::ident("c"), "Count")]),
        println(vec![Expr::method_call(Expr::ident("TCounter"), "Remaining", Vec::new())]),
        println(vec![Expr::member(Expr::ident("TCounter"), "Total")]),
        println(vec![Expr::member(Expr::ident("c"), "Limit")]),
    ];
    assert_eq!(run(counter(), body).ok(), "2\n2\n8\n2\n10\n");
}

#[test]
fn class_constant_is_read_only() {
    let body = vec![Stmt::assign(
        Expr::member(Expr::ident("TCounter"), "Limit"),
        Expr::int(3),
    )];
    assert!(matches!(
        run(counter(), body).err(),
        EvalErrorKind::ConstantAssignment { .. }
    ));
}

fn greeters() -> Vec<Decl> {
    let intf = InterfaceDecl::new("IGreeter")
        .method(FunctionDecl::function("Hello", TypeExpr::string()));
    let class = ClassDecl::new("TEnglish")
        .implements("IGreeter")
        .method(
            FunctionDecl::function("Hello", TypeExpr::string())
                .body(vec![result_is(Expr::string("hello"))]),
        )
        .method(
            FunctionDecl::function("Secret", TypeExpr::string())
                .body(vec![result_is(Expr::string("hidden"))]),
        );
    vec![Decl::interface(intf), Decl::class(class)]
}

#[test]
fn interfaces_view_implementing_objects() {
    let body = vec![
        typed_var("g", "IGreeter", create("TEnglish", Vec::new())),
        println(vec![Expr::member(Expr::ident("g"), "Hello")]),
        println(vec![Expr::implements(Expr::ident("g"), "IGreeter")]),
        println(vec![Expr::is(Expr::ident("g"), "TEnglish")]),
        println(vec![Expr::member(
            Expr::as_cast(create("TEnglish", Vec::new()), "IGreeter"),
            "Hello",
        )]),
        println(vec![Expr::implements(Expr::ident("TObject"), "IGreeter")]),
    ];
    assert_eq!(run(greeters(), body).ok(), "hello\nTrue\nTrue\nhello\nFalse\n");
}

#[test]
fn interface_exposes_only_its_contract() {
    let body = vec![
        typed_var("g", "IGreeter", create("TEnglish", Vec::new())),
        println(vec![Expr::member(Expr::ident("g"), "Hello")]),
        println(vec![Expr::method_call(Expr::ident("g"), "Secret", Vec::new())]),
    ];
    let run = run(greeters(), body);
    assert_eq!(run.output, "hello\n");
    assert_eq!(
        run.err(),
        EvalErrorKind::UndefinedMethod {
            method: "Secret".to_string(),
            type_name: "IGreeter".to_string(),
        }
    );
}

#[test]
fn interface_member_read_outside_contract_fails() {
    let body = vec![
        typed_var("g", "IGreeter", create("TEnglish", Vec::new())),
        println(vec![Expr::member(Expr::ident("g"), "Secret")]),
    ];
    assert_eq!(
        run(greeters(), body).err(),
        EvalErrorKind::UndefinedMethod {
            method: "Secret".to_string(),
            type_name: "IGreeter".to_string(),
        }
    );
}

#[test]
fn interface_views_compare_by_object_identity() {
    let body = vec![
        typed_var("o", "TEnglish", create("TEnglish", Vec::new())),
        typed_var("g", "IGreeter", Expr::ident("o")),
        typed_var("h", "IGreeter", Expr::as_cast(Expr::ident("o"), "IGreeter")),
        typed_var("other", "IGreeter", create("TEnglish", Vec::new())),
        println(vec![Expr::binary(BinaryOp::Eq, Expr::ident("g"), Expr::ident("o"))]),
        println(vec![Expr::binary(BinaryOp::Eq, Expr::ident("g"), Expr::ident("h"))]),
        println(vec![Expr::binary(BinaryOp::Eq, Expr::ident("g"), Expr::ident("other"))]),
        println(vec![Expr::binary(BinaryOp::NotEq, Expr::ident("other"), Expr::ident("o"))]),
    ];
    assert_eq!(run(greeters(), body).ok(), "True\nTrue\nFalse\nTrue\n");
}

#[test]
fn external_class_cannot_be_instantiated() {
    let class = ClassDecl::new("TExternal").external();
    let body = vec![typed_var("e", "TExternal", create("TExternal", Vec::new()))];
    assert_eq!(
        run(vec![Decl::class(class)], body).err(),
        EvalErrorKind::ExternalInstantiation {
            class: "TExternal".to_string()
        }
    );
}

#[test]
fn free_runs_the_destructor() {
    let class = ClassDecl::new("TResource").method(
        FunctionDecl::destructor("Destroy")
            .with_flags(MethodFlags::OVERRIDE)
            .body(vec![println(vec![Expr::string("released")])]),
    );
    let body = vec![
        typed_var("r", "TResource", create("TResource", Vec::new())),
        Stmt::expr(Expr::method_call(Expr::ident("r"), "Free", Vec::new())),
    ];
    assert_eq!(run(vec![Decl::class(class)], body).ok(), "released\n");
}

#[test]
fn member_of_nil_fails() {
    let body = vec![
        typed_var("b", "TBox", Expr::nil()),
        println(vec![Expr::member(Expr::ident("b"), "Value")]),
    ];
    assert_eq!(
        run(boxes(), body).err(),
        EvalErrorKind::NilReference {
            member: "Value".to_string()
        }
    );
}

#[test]
fn class_operator_overload() {
    let class = ClassDecl::new("TVec")
        .field(FieldDecl::new("X", TypeExpr::integer()))
        .method(
            FunctionDecl::function("Plus", TypeExpr::named("TVec"))
                .param(Param::value("other", TypeExpr::named("TVec")))
                .body(vec![
                    result_is(create("TVec", Vec::new())),
                    Stmt::assign(
                        Expr::member(Expr::ident("Result"), "X"),
                        Expr::binary(
                            BinaryOp::Add,
                            Expr::ident("X"),
                            Expr::member(Expr::ident("other"), "X"),
                        ),
                    ),
                ]),
        )
        .operator(
            OperatorDecl::new(
                OperatorKind::Binary(BinaryOp::Add),
                vec![TypeExpr::named("TVec"), TypeExpr::named("TVec")],
                "Plus",
            )
            .returns(TypeExpr::named("TVec")),
        );
    let body = vec![
        typed_var("a", "TVec", create("TVec", Vec::new())),
        typed_var("b", "TVec", create("TVec", Vec::new())),
        Stmt::assign(Expr::member(Expr::ident("a"), "X"), Expr::int(2)),
        Stmt::assign(Expr::member(Expr::ident("b"), "X"), Expr::int(5)),
        Stmt::var(
            "c",
            None,
            Some(Expr::binary(BinaryOp::Add, Expr::ident("a"), Expr::ident("b"))),
        ),
        println(vec![Expr::member(Expr::ident("c"), "X")]),
    ];
    assert_eq!(run(vec![Decl::class(class)], body).ok(), "7\n");
}

#[test]
fn global_operator_overload() {
    let append = FunctionDecl::function("AppendNum", TypeExpr::string())
        .param(Param::value("s", TypeExpr::string()))
        .param(Param::value("n", TypeExpr::integer()))
        .body(vec![result_is(Expr::binary(
            BinaryOp::Add,
            Expr::ident("s"),
            Expr::call("IntToStr", vec![Expr::ident("n")]),
        ))]);
    let decls = vec![
        Decl::function(append),
        Decl::Operator(
            OperatorDecl::new(
                OperatorKind::Binary(BinaryOp::Add),
                vec![TypeExpr::string(), TypeExpr::integer()],
                "AppendNum",
            )
            .returns(TypeExpr::string()),
        ),
    ];
    let body = vec![println(vec![Expr::binary(
        BinaryOp::Add,
        Expr::string("n="),
        Expr::int(5),
    )])];
    assert_eq!(run(decls, body).ok(), "n=5\n");
}

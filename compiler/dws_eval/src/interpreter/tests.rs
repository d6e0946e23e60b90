use super::*;
use crate::errors::EvalErrorKind;
use crate::print_handler::buffer_handler;
use dws_ir::{
    AssignOp, BinaryOp, ClassDecl, Decl, ExceptClause, FieldDecl, Param, PropertyAccess,
    PropertyDecl, Stmt, TypeExpr,
};
use pretty_assertions::assert_eq;

fn interpreter() -> (Interpreter, SharedPrintHandler) {
    let output = buffer_handler();
    let interpreter = Interpreter::builder().print_handler(output.clone()).build();
    (interpreter, output)
}

fn println(args: Vec<Expr>) -> Stmt {
    Stmt::expr(Expr::call("PrintLn", args))
}

#[test]
fn run_prints_through_handler() {
    let (mut interp, output) = interpreter();
    let program = Program::new(Vec::new(), vec![println(vec![Expr::string("Hello")])]);
    interp.run(&program).unwrap();
    assert_eq!(output.output(), "Hello\n");
}

#[test]
fn globals_are_visible_after_run() {
    let (mut interp, _) = interpreter();
    let program = Program::new(
        Vec::new(),
        vec![
            Stmt::var("x", Some(TypeExpr::integer()), Some(Expr::int(4))),
            Stmt::compound(Expr::ident("x"), AssignOp::MulAssign, Expr::int(3)),
        ],
    );
    interp.run(&program).unwrap();
    assert_eq!(interp.global_value("X"), Some(Value::Integer(12)));
}

#[test]
fn call_function_selects_overload_by_value() {
    let (mut interp, _) = interpreter();
    let describe_int = FunctionDecl::function("Describe", TypeExpr::string())
        .param(Param::value("v", TypeExpr::integer()))
        .body(vec![Stmt::assign(Expr::ident("Result"), Expr::string("int"))]);
    let describe_str = FunctionDecl::function("Describe", TypeExpr::string())
        .param(Param::value("v", TypeExpr::string()))
        .body(vec![Stmt::assign(Expr::ident("Result"), Expr::string("str"))]);
    let program = Program::new(
        vec![Decl::function(describe_int), Decl::function(describe_str)],
        Vec::new(),
    );
    interp.run(&program).unwrap();

    let result = interp.call_function("Describe", vec![Value::string("x")]).unwrap();
    assert_eq!(result, Value::string("str"));
    let result = interp.call_function("describe", vec![Value::Integer(1)]).unwrap();
    assert_eq!(result, Value::string("int"));
}

#[test]
fn call_function_unknown_name() {
    let (mut interp, _) = interpreter();
    let err = interp.call_function("Missing", Vec::new()).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UndefinedFunction { .. }));
}

#[test]
fn eval_uses_current_scope() {
    let (mut interp, _) = interpreter();
    let program = Program::new(
        Vec::new(),
        vec![Stmt::var("n", Some(TypeExpr::integer()), Some(Expr::int(20)))],
    );
    interp.run(&program).unwrap();
    let value = interp
        .eval(&Expr::binary(BinaryOp::Add, Expr::ident("n"), Expr::int(1)))
        .unwrap();
    assert_eq!(value, Value::Integer(21));
}

#[test]
fn call_stack_unwinds_after_error() {
    let (mut interp, _) = interpreter();
    let fail = FunctionDecl::procedure("Fail").body(vec![Stmt::expr(Expr::binary(
        BinaryOp::IntDiv,
        Expr::int(1),
        Expr::int(0),
    ))]);
    let outer = FunctionDecl::procedure("Outer").body(vec![Stmt::expr(Expr::call("Fail", Vec::new()))]);
    let program = Program::new(
        vec![Decl::function(fail), Decl::function(outer)],
        vec![Stmt::expr(Expr::call("Outer", Vec::new()))],
    );
    let err = interp.run(&program).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::DivisionByZero { .. }));
    assert_eq!(interp.call_depth(), 0);
    assert!(interp.context.is_none());
    assert!(interp.routine.is_none());

    let frames: Vec<String> = err
        .backtrace
        .as_ref()
        .map(|bt| bt.frames().iter().map(|f| f.name.clone()).collect())
        .unwrap_or_default();
    assert_eq!(frames, vec!["Fail".to_string(), "Outer".to_string()]);
}

#[test]
fn recursion_limit_is_configurable() {
    let output = buffer_handler();
    let mut interp = Interpreter::builder()
        .max_recursion_depth(16)
        .print_handler(output)
        .build();
    let down = FunctionDecl::procedure("Down").body(vec![Stmt::expr(Expr::call("Down", Vec::new()))]);
    let program = Program::new(
        vec![Decl::function(down)],
        vec![Stmt::expr(Expr::call("Down", Vec::new()))],
    );
    let err = interp.run(&program).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::MaxRecursionExceeded { depth: 16 });
    assert_eq!(interp.call_depth(), 0);
}

#[test]
fn uncaught_exception_is_reported_and_kept() {
    let (mut interp, output) = interpreter();
    let program = Program::new(
        Vec::new(),
        vec![
            println(vec![Expr::string("before")]),
            Stmt::raise(Some(Expr::new_object(
                "Exception",
                vec![Expr::string("boom")],
            ))),
            println(vec![Expr::string("after")]),
        ],
    );
    let err = interp.run(&program).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UncaughtException {
            class: "Exception".to_string(),
            message: "boom".to_string(),
        }
    );
    assert_eq!(output.output(), "before\n");
    let active = interp.active_exception().map(|e| e.object.class_name());
    assert_eq!(active.as_deref(), Some("Exception"));
}

#[test]
fn handled_exception_clears_handler_slot() {
    let (mut interp, output) = interpreter();
    let program = Program::new(
        Vec::new(),
        vec![Stmt::try_except(
            vec![Stmt::raise(Some(Expr::new_object(
                "Exception",
                vec![Expr::string("x")],
            )))],
            ExceptClause::catch_all(vec![println(vec![Expr::string("caught")])]),
        )],
    );
    interp.run(&program).unwrap();
    assert_eq!(output.output(), "caught\n");
    assert!(interp.handler_exception.is_none());
    assert!(interp.active_exception().is_none());
}

#[test]
fn property_chain_is_empty_after_circular_failure() {
    let (mut interp, _) = interpreter();
    let class = ClassDecl::new("TLoop")
        .property(PropertyDecl::new("A", TypeExpr::integer()).read(PropertyAccess::member("B")))
        .property(PropertyDecl::new("B", TypeExpr::integer()).read(PropertyAccess::member("A")));
    let program = Program::new(
        vec![Decl::class(class)],
        vec![
            Stmt::var("o", Some(TypeExpr::named("TLoop")), Some(Expr::new_object("TLoop", Vec::new()))),
            println(vec![Expr::member(Expr::ident("o"), "A")]),
        ],
    );
    let err = interp.run(&program).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::CircularPropertyReference { .. }));
    assert!(interp.property_chain.is_empty());
}

#[test]
fn same_property_on_distinct_receivers_is_not_circular() {
    let (mut interp, output) = interpreter();
    // Next.Value reads Value on a different object, which is fine.
    let class = ClassDecl::new("TNode")
        .field(FieldDecl::new("FValue", TypeExpr::integer()))
        .field(FieldDecl::new("FNext", TypeExpr::named("TNode")))
        .method(
            FunctionDecl::function("GetValue", TypeExpr::integer()).body(vec![Stmt::if_then(
                Expr::binary(BinaryOp::Eq, Expr::ident("FNext"), Expr::nil()),
                Stmt::assign(Expr::ident("Result"), Expr::ident("FValue")),
                Some(Stmt::assign(
                    Expr::ident("Result"),
                    Expr::binary(
                        BinaryOp::Add,
                        Expr::ident("FValue"),
                        Expr::member(Expr::ident("FNext"), "Value"),
                    ),
                )),
            )]),
        )
        .property(PropertyDecl::new("Value", TypeExpr::integer()).read(PropertyAccess::member("GetValue")));
    let program = Program::new(
        vec![Decl::class(class)],
        vec![
            Stmt::var("a", Some(TypeExpr::named("TNode")), Some(Expr::new_object("TNode", Vec::new()))),
            Stmt::var("b", Some(TypeExpr::named("TNode")), Some(Expr::new_object("TNode", Vec::new()))),
            Stmt::assign(Expr::member(Expr::ident("a"), "FValue"), Expr::int(1)),
            Stmt::assign(Expr::member(Expr::ident("b"), "FValue"), Expr::int(2)),
            Stmt::assign(Expr::member(Expr::ident("a"), "FNext"), Expr::ident("b")),
            println(vec![Expr::member(Expr::ident("a"), "Value")]),
        ],
    );
    interp.run(&program).unwrap();
    assert_eq!(output.output(), "3\n");
}

#[test]
fn scope_is_restored_after_block() {
    let (mut interp, _) = interpreter();
    let program = Program::new(
        Vec::new(),
        vec![Stmt::block(vec![Stmt::var(
            "inner",
            Some(TypeExpr::integer()),
            Some(Expr::int(1)),
        )])],
    );
    interp.run(&program).unwrap();
    assert_eq!(interp.global_value("inner"), None);
    let err = interp.eval(&Expr::ident("inner")).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UndefinedVariable { .. }));
}

#[test]
fn builtin_classes_are_loaded() {
    let interp = Interpreter::new();
    for name in ["TObject", "Exception", "EConvertError", "EDivByZero", "EScriptStackOverflow"] {
        assert!(interp.class(name).is_some(), "{name} missing");
    }
}

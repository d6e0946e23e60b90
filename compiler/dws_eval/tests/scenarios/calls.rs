use dws_eval::{EvalErrorKind, Interpreter};
use dws_ir::{
    AssignOp, BinaryOp, Decl, Expr, FunctionDecl, Param, ParamMode, Stmt, TypeExpr,
};
use pretty_assertions::assert_eq;

use super::{call, int_var, println, result_is, run, run_with, typed_var};

fn describe_overloads() -> Vec<Decl> {
    let int = FunctionDecl::function("f", TypeExpr::string())
        .param(Param::value("v", TypeExpr::integer()))
        .body(vec![result_is(Expr::string("Integer"))]);
    let float = FunctionDecl::function("f", TypeExpr::string())
        .param(Param::value("v", TypeExpr::float()))
        .body(vec![result_is(Expr::string("Float"))]);
    vec![Decl::function(int), Decl::function(float)]
}

#[test]
fn overload_selected_by_argument_type() {
    let body = vec![
        println(vec![Expr::call("f", vec![Expr::int(3)])]),
        println(vec![Expr::call("f", vec![Expr::float(3.0)])]),
    ];
    assert_eq!(run(describe_overloads(), body).ok(), "Integer\nFloat\n");
}

#[test]
fn overload_without_compatible_candidate_fails() {
    let body = vec![println(vec![Expr::call("f", vec![Expr::string("x")])])];
    assert!(matches!(
        run(describe_overloads(), body).err(),
        EvalErrorKind::NoMatchingOverload { .. }
    ));
}

#[test]
fn single_routine_checks_argument_count() {
    let one = FunctionDecl::procedure("One")
        .param(Param::value("a", TypeExpr::integer()))
        .body(Vec::new());
    let body = vec![call("One", vec![Expr::int(1), Expr::int(2)])];
    assert!(matches!(
        run(vec![Decl::function(one)], body).err(),
        EvalErrorKind::WrongArgumentCount { got: 2, .. }
    ));
}

#[test]
fn unknown_routine_fails() {
    let body = vec![call("Nowhere", Vec::new())];
    assert!(matches!(
        run(Vec::new(), body).err(),
        EvalErrorKind::UndefinedFunction { .. }
    ));
}

#[test]
fn default_parameters_fill_missing_arguments() {
    let greet = FunctionDecl::function("Greet", TypeExpr::string())
        .param(Param::value("name", TypeExpr::string()).with_default(Expr::string("World")))
        .body(vec![result_is(Expr::binary(
            BinaryOp::Add,
            Expr::string("Hello "),
            Expr::ident("name"),
        ))]);
    let body = vec![
        println(vec![Expr::call("Greet", Vec::new())]),
        println(vec![Expr::call("Greet", vec![Expr::string("Bob")])]),
    ];
    assert_eq!(run(vec![Decl::function(greet)], body).ok(), "Hello World\nHello Bob\n");
}

#[test]
fn var_parameters_alias_the_caller_variable() {
    let swap = FunctionDecl::procedure("Swap")
        .param(Param::var("a", TypeExpr::integer()))
        .param(Param::var("b", TypeExpr::integer()))
        .body(vec![
            int_var("t", 0),
            Stmt::assign(Expr::ident("t"), Expr::ident("a")),
            Stmt::assign(Expr::ident("a"), Expr::ident("b")),
            Stmt::assign(Expr::ident("b"), Expr::ident("t")),
        ]);
    let body = vec![
        int_var("x", 1),
        int_var("y", 2),
        call("Swap", vec![Expr::ident("x"), Expr::ident("y")]),
        println(vec![Expr::ident("x"), Expr::string(","), Expr::ident("y")]),
    ];
    assert_eq!(run(vec![Decl::function(swap)], body).ok(), "2,1\n");
}

#[test]
fn const_parameters_are_read_only() {
    let touch = FunctionDecl::procedure("Touch")
        .param(Param::constant("c", TypeExpr::integer()))
        .body(vec![Stmt::assign(Expr::ident("c"), Expr::int(1))]);
    let body = vec![call("Touch", vec![Expr::int(0)])];
    assert!(matches!(
        run(vec![Decl::function(touch)], body).err(),
        EvalErrorKind::ConstantAssignment { .. }
    ));
}

fn lazy_program() -> Vec<Decl> {
    let tick = FunctionDecl::function("Tick", TypeExpr::integer()).body(vec![
        Stmt::compound(Expr::ident("ticks"), AssignOp::AddAssign, Expr::int(1)),
        result_is(Expr::int(7)),
    ]);
    let pick = FunctionDecl::function("Pick", TypeExpr::integer())
        .param(Param::value("take", TypeExpr::boolean()))
        .param(Param::lazy("value", TypeExpr::integer()))
        .body(vec![Stmt::if_then(
            Expr::ident("take"),
            result_is(Expr::binary(BinaryOp::Add, Expr::ident("value"), Expr::ident("value"))),
            Some(result_is(Expr::int(0))),
        )]);
    vec![Decl::function(tick), Decl::function(pick)]
}

#[test]
fn lazy_parameter_is_evaluated_on_demand() {
    let body = vec![
        int_var("ticks", 0),
        println(vec![Expr::call(
            "Pick",
            vec![Expr::bool(false), Expr::call("Tick", Vec::new())],
        )]),
        println(vec![Expr::ident("ticks")]),
        println(vec![Expr::call(
            "Pick",
            vec![Expr::bool(true), Expr::call("Tick", Vec::new())],
        )]),
        println(vec![Expr::ident("ticks")]),
    ];
    assert_eq!(run(lazy_program(), body).ok(), "0\n0\n14\n1\n");
}

#[test]
fn routine_name_aliases_result() {
    let fact = FunctionDecl::function("Fact", TypeExpr::integer())
        .param(Param::value("n", TypeExpr::integer()))
        .body(vec![Stmt::if_then(
            Expr::binary(BinaryOp::LtEq, Expr::ident("n"), Expr::int(1)),
            Stmt::assign(Expr::ident("Fact"), Expr::int(1)),
            Some(Stmt::assign(
                Expr::ident("Fact"),
                Expr::binary(
                    BinaryOp::Mul,
                    Expr::ident("n"),
                    Expr::call(
                        "Fact",
                        vec![Expr::binary(BinaryOp::Sub, Expr::ident("n"), Expr::int(1))],
                    ),
                ),
            )),
        )]);
    let body = vec![println(vec![Expr::call("Fact", vec![Expr::int(5)])])];
    assert_eq!(run(vec![Decl::function(fact)], body).ok(), "120\n");
}

#[test]
fn recursion_limit_stops_runaway_calls() {
    let spin = FunctionDecl::procedure("Spin").body(vec![call("Spin", Vec::new())]);
    let body = vec![println(vec![Expr::string("start")]), call("Spin", Vec::new())];
    let run = run_with(
        Interpreter::builder().max_recursion_depth(50),
        vec![Decl::function(spin)],
        body,
    );
    assert_eq!(run.output, "start\n");
    assert_eq!(run.interpreter.call_depth(), 0);
    assert_eq!(run.err(), EvalErrorKind::MaxRecursionExceeded { depth: 50 });
}

#[test]
fn lambda_captures_its_scope() {
    let add = FunctionDecl::function("", TypeExpr::integer())
        .param(Param::value("x", TypeExpr::integer()))
        .body(vec![result_is(Expr::binary(
            BinaryOp::Add,
            Expr::ident("x"),
            Expr::ident("offset"),
        ))]);
    let body = vec![
        int_var("offset", 10),
        Stmt::var("add", None, Some(Expr::lambda(add))),
        println(vec![Expr::call("add", vec![Expr::int(5)])]),
        Stmt::assign(Expr::ident("offset"), Expr::int(20)),
        println(vec![Expr::call("add", vec![Expr::int(5)])]),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "15\n25\n");
}

#[test]
fn function_pointers_to_free_functions() {
    let double = FunctionDecl::function("Double", TypeExpr::integer())
        .param(Param::value("x", TypeExpr::integer()))
        .body(vec![result_is(Expr::binary(
            BinaryOp::Mul,
            Expr::ident("x"),
            Expr::int(2),
        ))]);
    let apply = FunctionDecl::function("Apply", TypeExpr::integer())
        .param(Param::value(
            "fn",
            TypeExpr::function(
                vec![(ParamMode::Value, TypeExpr::integer())],
                Some(TypeExpr::integer()),
                false,
            ),
        ))
        .param(Param::value("x", TypeExpr::integer()))
        .body(vec![result_is(Expr::call("fn", vec![Expr::ident("x")]))]);
    let body = vec![
        Stmt::var("f", None, Some(Expr::address_of(Expr::ident("Double")))),
        println(vec![Expr::call("f", vec![Expr::int(4)])]),
        println(vec![Expr::call(
            "Apply",
            vec![Expr::address_of(Expr::ident("Double")), Expr::int(21)],
        )]),
    ];
    assert_eq!(
        run(vec![Decl::function(double), Decl::function(apply)], body).ok(),
        "8\n42\n"
    );
}

#[test]
fn calling_a_non_function_value_fails() {
    let body = vec![
        typed_var("s", "String", Expr::string("x")),
        Stmt::expr(Expr::call_expr(Expr::ident("s"), Vec::new())),
    ];
    assert!(matches!(
        run(Vec::new(), body).err(),
        EvalErrorKind::NotCallable { .. }
    ));
}

use dws_eval::{
    Builtin, BuiltinContext, BuiltinError, EvalErrorKind, Interpreter, TypeInfo, Unit, Value,
};
use dws_ir::{
    AssignOp, BinaryOp, Decl, ExceptClause, ExceptHandler, Expr, FieldDecl, FunctionDecl, Param,
    RecordDecl, Stmt, TypeExpr,
};
use pretty_assertions::assert_eq;

use super::{call, int_var, println, result_is, run, run_with, typed_var, Run};

fn math() -> Unit {
    let twice = FunctionDecl::function("Twice", TypeExpr::integer())
        .param(Param::value("x", TypeExpr::integer()))
        .body(vec![
            Stmt::compound(Expr::ident("Calls"), AssignOp::AddAssign, Expr::int(1)),
            result_is(Expr::binary(BinaryOp::Mul, Expr::ident("x"), Expr::int(2))),
        ]);
    Unit::new("Math")
        .constant("Answer", Value::Integer(42))
        .variable("Calls", TypeInfo::Integer, Value::Integer(0))
        .function(twice)
}

fn run_math(decls: Vec<Decl>, body: Vec<Stmt>) -> Run {
    run_with(Interpreter::builder().unit(math()), decls, body)
}

#[test]
fn unit_symbols_resolve_qualified_and_bare() {
    let body = vec![
        println(vec![Expr::member(Expr::ident("Math"), "Answer")]),
        println(vec![Expr::ident("Answer")]),
        println(vec![Expr::method_call(Expr::ident("Math"), "Twice", vec![Expr::int(4)])]),
        println(vec![Expr::call("Twice", vec![Expr::int(5)])]),
        println(vec![Expr::member(Expr::ident("Math"), "Calls")]),
    ];
    assert_eq!(run_math(Vec::new(), body).ok(), "42\n42\n8\n10\n2\n");
}

#[test]
fn unit_variables_are_assignable() {
    let body = vec![
        Stmt::assign(Expr::member(Expr::ident("Math"), "Calls"), Expr::int(5)),
        call("Inc", vec![Expr::ident("Calls")]),
        println(vec![Expr::ident("Calls")]),
    ];
    assert_eq!(run_math(Vec::new(), body).ok(), "6\n");
}

#[test]
fn unit_constants_are_read_only() {
    let body = vec![Stmt::assign(
        Expr::member(Expr::ident("Math"), "Answer"),
        Expr::int(1),
    )];
    assert!(matches!(
        run_math(Vec::new(), body).err(),
        EvalErrorKind::ConstantAssignment { .. }
    ));
}

#[test]
fn local_variable_shadows_unit_name() {
    let point = RecordDecl::new("TPoint").field(FieldDecl::new("X", TypeExpr::integer()));
    let body = vec![
        Stmt::var("Math", Some(TypeExpr::named("TPoint")), None),
        Stmt::assign(Expr::member(Expr::ident("Math"), "X"), Expr::int(4)),
        println(vec![Expr::member(Expr::ident("Math"), "X")]),
    ];
    assert_eq!(run_math(vec![Decl::record(point)], body).ok(), "4\n");
}

#[test]
fn program_functions_take_precedence_over_units() {
    let twice = FunctionDecl::function("Twice", TypeExpr::integer())
        .param(Param::value("x", TypeExpr::integer()))
        .body(vec![result_is(Expr::int(0))]);
    let body = vec![
        println(vec![Expr::call("Twice", vec![Expr::int(5)])]),
        println(vec![Expr::method_call(Expr::ident("Math"), "Twice", vec![Expr::int(5)])]),
    ];
    assert_eq!(run_math(vec![Decl::function(twice)], body).ok(), "0\n10\n");
}

fn shout(ctx: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    let text = args[0].to_string().to_uppercase();
    ctx.print.println(&text);
    Ok(Value::Integer(i64::try_from(text.len()).unwrap_or(i64::MAX)))
}

fn refuse(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    Err(BuiltinError::raise("ERangeError", format!("refused {}", args[0])))
}

#[test]
fn host_builtins_are_callable() {
    let builder = Interpreter::builder()
        .builtin(Builtin::new("Shout", 1, Some(1), shout))
        .builtin(Builtin::new("Refuse", 1, Some(1), refuse));
    let body = vec![
        int_var("n", 0),
        Stmt::assign(Expr::ident("n"), Expr::call("Shout", vec![Expr::string("hey")])),
        println(vec![Expr::ident("n")]),
        Stmt::try_except(
            vec![call("Refuse", vec![Expr::int(7)])],
            ExceptClause::handlers(
                vec![ExceptHandler::on(
                    Some("E"),
                    "ERangeError",
                    println(vec![Expr::member(Expr::ident("E"), "Message")]),
                )],
                None,
            ),
        ),
    ];
    assert_eq!(run_with(builder, Vec::new(), body).ok(), "HEY\n3\nrefused 7\n");
}

#[test]
fn builtin_argument_count_is_checked() {
    let body = vec![println(vec![Expr::call(
        "Length",
        vec![Expr::string("a"), Expr::string("b")],
    )])];
    assert!(matches!(
        run(Vec::new(), body).err(),
        EvalErrorKind::WrongArgumentCount { got: 2, .. }
    ));
}

#[test]
fn core_builtins() {
    let body = vec![
        int_var("i", 10),
        call("Inc", vec![Expr::ident("i")]),
        call("Inc", vec![Expr::ident("i"), Expr::int(4)]),
        call("Dec", vec![Expr::ident("i"), Expr::int(2)]),
        println(vec![Expr::ident("i")]),
        println(vec![
            Expr::call("Chr", vec![Expr::int(65)]),
            Expr::call("Ord", vec![Expr::string("B")]),
        ]),
        println(vec![
            Expr::call("IntToStr", vec![Expr::int(12)]),
            Expr::string("/"),
            Expr::call("FloatToStr", vec![Expr::float(2.5)]),
        ]),
        println(vec![Expr::call("Length", vec![Expr::string("hello")])]),
        Stmt::var("o", Some(TypeExpr::named("TObject")), Some(Expr::nil())),
        println(vec![Expr::call("Assigned", vec![Expr::ident("o")])]),
        Stmt::assign(Expr::ident("o"), Expr::new_object("TObject", Vec::new())),
        println(vec![Expr::call("Assigned", vec![Expr::ident("o")])]),
        typed_var("s", "String", Expr::call("StrToInt", vec![Expr::string("x")])),
    ];
    let run = run(Vec::new(), body);
    assert_eq!(run.output, "13\nA66\n12/2.5\n5\nFalse\nTrue\n");
    assert_eq!(
        run.err(),
        EvalErrorKind::UncaughtException {
            class: "EConvertError".to_string(),
            message: "'x' is not a valid integer value".to_string(),
        }
    );
}

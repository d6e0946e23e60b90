use dws_eval::EvalErrorKind;
use dws_ir::{
    BinaryOp, ClassDecl, Decl, ExceptClause, ExceptHandler, Expr, FunctionDecl, Stmt,
};
use pretty_assertions::assert_eq;

use super::{call, println, run};

fn raise_new(class: &str, message: &str) -> Stmt {
    Stmt::raise(Some(Expr::new_object(class, vec![Expr::string(message)])))
}

fn message_of(var: &str) -> Expr {
    Expr::member(Expr::ident(var), "Message")
}

fn my_error() -> Vec<Decl> {
    vec![Decl::class(ClassDecl::new("EMyError").parent("Exception"))]
}

#[test]
fn builtin_failure_is_catchable_by_class() {
    let body = vec![Stmt::try_except(
        vec![
            println(vec![Expr::call("StrToInt", vec![Expr::string("abc")])]),
            println(vec![Expr::string("not reached")]),
        ],
        ExceptClause::handlers(
            vec![
                ExceptHandler::on(Some("E"), "ERangeError", println(vec![Expr::string("range")])),
                ExceptHandler::on(
                    Some("E"),
                    "EConvertError",
                    println(vec![Expr::member(Expr::ident("E"), "ClassName")]),
                ),
            ],
            None,
        ),
    )];
    assert_eq!(run(Vec::new(), body).ok(), "EConvertError\n");
}

#[test]
fn handler_for_base_class_catches_subclasses() {
    let body = vec![Stmt::try_except(
        vec![raise_new("EMyError", "custom")],
        ExceptClause::handlers(
            vec![ExceptHandler::on(
                Some("E"),
                "Exception",
                println(vec![Expr::member(Expr::ident("E"), "ClassName"), message_of("E")]),
            )],
            None,
        ),
    )];
    assert_eq!(run(my_error(), body).ok(), "EMyErrorcustom\n");
}

#[test]
fn unmatched_exception_escapes_as_uncaught() {
    let body = vec![
        Stmt::try_except(
            vec![raise_new("EMyError", "lost")],
            ExceptClause::handlers(
                vec![ExceptHandler::on(None, "EConvertError", println(vec![Expr::string("no")]))],
                None,
            ),
        ),
        println(vec![Expr::string("not reached")]),
    ];
    let run = run(my_error(), body);
    assert_eq!(run.output, "");
    assert_eq!(
        run.err(),
        EvalErrorKind::UncaughtException {
            class: "EMyError".to_string(),
            message: "lost".to_string(),
        }
    );
}

#[test]
fn finally_runs_on_both_paths() {
    let body = vec![
        Stmt::try_finally(
            vec![println(vec![Expr::string("body")])],
            vec![println(vec![Expr::string("finally 1")])],
        ),
        Stmt::try_except(
            vec![Stmt::try_finally(
                vec![raise_new("Exception", "x"), println(vec![Expr::string("skipped")])],
                vec![println(vec![Expr::string("finally 2")])],
            )],
            ExceptClause::catch_all(vec![println(vec![Expr::string("caught")])]),
        ),
    ];
    assert_eq!(
        run(Vec::new(), body).ok(),
        "body\nfinally 1\nfinally 2\ncaught\n"
    );
}

#[test]
fn finally_runs_when_exit_leaves_the_routine() {
    let proc = FunctionDecl::procedure("Leave").body(vec![Stmt::try_finally(
        vec![Stmt::exit(None), println(vec![Expr::string("skipped")])],
        vec![println(vec![Expr::string("cleanup")])],
    )]);
    let body = vec![call("Leave", Vec::new()), println(vec![Expr::string("done")])];
    assert_eq!(run(vec![Decl::function(proc)], body).ok(), "cleanup\ndone\n");
}

#[test]
fn bare_raise_rethrows_the_handled_exception() {
    let body = vec![Stmt::try_except(
        vec![Stmt::try_except(
            vec![raise_new("EMyError", "again")],
            ExceptClause::catch_all(vec![
                println(vec![Expr::string("inner")]),
                Stmt::raise(None),
            ]),
        )],
        ExceptClause::handlers(
            vec![ExceptHandler::on(
                Some("E"),
                "EMyError",
                println(vec![Expr::string("outer "), message_of("E")]),
            )],
            None,
        ),
    )];
    assert_eq!(run(my_error(), body).ok(), "inner\nouter again\n");
}

#[test]
fn bare_raise_outside_handler_fails() {
    let body = vec![Stmt::raise(None)];
    assert_eq!(run(Vec::new(), body).err(), EvalErrorKind::ReraiseOutsideHandler);
}

#[test]
fn evaluation_errors_bypass_handlers() {
    let body = vec![Stmt::try_except(
        vec![Stmt::expr(Expr::binary(BinaryOp::IntDiv, Expr::int(1), Expr::int(0)))],
        ExceptClause::catch_all(vec![println(vec![Expr::string("caught")])]),
    )];
    let run = run(Vec::new(), body);
    assert_eq!(run.output, "");
    assert!(matches!(run.err(), EvalErrorKind::DivisionByZero { .. }));
}

#[test]
fn assert_raises_assertion_failed() {
    let body = vec![Stmt::try_except(
        vec![call("Assert", vec![Expr::bool(false), Expr::string("broken")])],
        ExceptClause::handlers(
            vec![ExceptHandler::on(Some("E"), "EAssertionFailed", println(vec![message_of("E")]))],
            None,
        ),
    )];
    assert_eq!(run(Vec::new(), body).ok(), "Assertion failed: broken\n");
}

#[test]
fn except_object_names_the_handled_exception() {
    let body = vec![
        Stmt::try_except(
            vec![raise_new("EMyError", "x")],
            ExceptClause::catch_all(vec![println(vec![Expr::member(
                Expr::ident("ExceptObject"),
                "ClassName",
            )])]),
        ),
        println(vec![Expr::call("Assigned", vec![Expr::ident("ExceptObject")])]),
    ];
    assert_eq!(run(my_error(), body).ok(), "EMyError\nFalse\n");
}

#[test]
fn exception_unwinds_through_routines() {
    let inner = FunctionDecl::procedure("Inner").body(vec![raise_new("EMyError", "deep")]);
    let outer = FunctionDecl::procedure("Outer").body(vec![
        call("Inner", Vec::new()),
        println(vec![Expr::string("not reached")]),
    ]);
    let mut decls = my_error();
    decls.push(Decl::function(inner));
    decls.push(Decl::function(outer));
    let body = vec![call("Outer", Vec::new())];

    let run = run(decls, body);
    let frames: Vec<String> = run
        .interpreter
        .active_exception()
        .map(|active| {
            active
                .backtrace
                .frames()
                .iter()
                .map(|frame| frame.name.clone())
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(frames, vec!["Inner".to_string(), "Outer".to_string()]);
    assert_eq!(run.interpreter.call_depth(), 0);
    assert!(matches!(run.err(), EvalErrorKind::UncaughtException { .. }));
}

#[test]
fn raise_in_finally_replaces_pending_exception() {
    let body = vec![Stmt::try_except(
        vec![Stmt::try_finally(
            vec![raise_new("EMyError", "first")],
            vec![raise_new("Exception", "second")],
        )],
        ExceptClause::catch_all(vec![println(vec![
            Expr::member(Expr::ident("ExceptObject"), "ClassName"),
            Expr::string(" "),
            message_of("ExceptObject"),
        ])]),
    )];
    assert_eq!(run(my_error(), body).ok(), "Exception second\n");
}

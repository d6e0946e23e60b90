use dws_eval::EvalErrorKind;
use dws_ir::{
    AssignOp, BinaryOp, CaseBranch, CaseLabel, Decl, EnumDecl, Expr, ForDirection, FunctionDecl,
    Stmt, TypeExpr,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::{int_var, println, result_is, run, typed_var};

fn counting_loop(lo: i64, hi: i64, direction: ForDirection) -> Vec<Stmt> {
    vec![
        int_var("count", 0),
        Stmt::for_loop(
            "i",
            Expr::int(lo),
            Expr::int(hi),
            direction,
            None,
            Stmt::compound(Expr::ident("count"), AssignOp::AddAssign, Expr::int(1)),
        ),
    ]
}

proptest! {
    #[test]
    fn for_to_runs_body_once_per_value(lo in -20i64..20, hi in -20i64..20) {
        let run = run(Vec::new(), counting_loop(lo, hi, ForDirection::To));
        prop_assert!(run.result.is_ok());
        prop_assert_eq!(run.global_int("count"), Some((hi - lo + 1).max(0)));
    }

    #[test]
    fn for_downto_runs_body_once_per_value(lo in -20i64..20, hi in -20i64..20) {
        let run = run(Vec::new(), counting_loop(lo, hi, ForDirection::Downto));
        prop_assert!(run.result.is_ok());
        prop_assert_eq!(run.global_int("count"), Some((lo - hi + 1).max(0)));
    }

    #[test]
    fn case_range_is_inclusive(v in -10i64..10, a in -10i64..10, b in -10i64..10) {
        let body = vec![
            int_var("hit", 0),
            Stmt::case(
                Expr::int(v),
                vec![CaseBranch::new(
                    vec![CaseLabel::Range(Expr::int(a), Expr::int(b))],
                    Stmt::assign(Expr::ident("hit"), Expr::int(1)),
                )],
                None,
            ),
        ];
        let run = run(Vec::new(), body);
        prop_assert!(run.result.is_ok());
        let expected = i64::from(a <= v && v <= b);
        prop_assert_eq!(run.global_int("hit"), Some(expected));
    }
}

#[test]
fn for_step_skips_values() {
    let body = vec![Stmt::for_loop(
        "i",
        Expr::int(1),
        Expr::int(6),
        ForDirection::To,
        Some(Expr::int(2)),
        println(vec![Expr::ident("i")]),
    )];
    assert_eq!(run(Vec::new(), body).ok(), "1\n3\n5\n");
}

#[test]
fn for_step_must_be_positive() {
    for step in [0, -1] {
        let body = vec![Stmt::for_loop(
            "i",
            Expr::int(1),
            Expr::int(3),
            ForDirection::To,
            Some(Expr::int(step)),
            println(vec![Expr::ident("i")]),
        )];
        let run = run(Vec::new(), body);
        assert_eq!(run.output, "");
        assert_eq!(run.err(), EvalErrorKind::InvalidStep { step });
    }
}

#[test]
fn for_variable_is_scoped_to_the_loop() {
    let body = vec![
        Stmt::for_loop(
            "i",
            Expr::int(1),
            Expr::int(2),
            ForDirection::To,
            None,
            Stmt::block(Vec::new()),
        ),
        println(vec![Expr::ident("i")]),
    ];
    assert!(matches!(
        run(Vec::new(), body).err(),
        EvalErrorKind::UndefinedVariable { .. }
    ));
}

#[test]
fn case_first_matching_branch_wins() {
    let classify = |v: i64| {
        Stmt::case(
            Expr::int(v),
            vec![
                CaseBranch::new(
                    vec![CaseLabel::Range(Expr::int(1), Expr::int(4))],
                    println(vec![Expr::string("low")]),
                ),
                CaseBranch::new(
                    vec![
                        CaseLabel::Range(Expr::int(4), Expr::int(9)),
                        CaseLabel::Value(Expr::int(12)),
                    ],
                    println(vec![Expr::string("mid")]),
                ),
            ],
            Some(vec![println(vec![Expr::string("other")])]),
        )
    };
    let body = vec![classify(4), classify(5), classify(12), classify(10)];
    assert_eq!(run(Vec::new(), body).ok(), "low\nmid\nmid\nother\n");
}

#[test]
fn case_on_strings() {
    let body = vec![Stmt::case(
        Expr::string("b"),
        vec![
            CaseBranch::new(
                vec![CaseLabel::Value(Expr::string("a"))],
                println(vec![Expr::string("A")]),
            ),
            CaseBranch::new(
                vec![CaseLabel::Value(Expr::string("b"))],
                println(vec![Expr::string("B")]),
            ),
        ],
        None,
    )];
    assert_eq!(run(Vec::new(), body).ok(), "B\n");
}

#[test]
fn while_with_break_and_continue() {
    // Prints odd numbers below 8, stopping at 7.
    let body = vec![
        int_var("i", 0),
        Stmt::while_do(
            Expr::bool(true),
            Stmt::block(vec![
                Stmt::compound(Expr::ident("i"), AssignOp::AddAssign, Expr::int(1)),
                Stmt::if_then(
                    Expr::binary(BinaryOp::Gt, Expr::ident("i"), Expr::int(7)),
                    Stmt::break_loop(),
                    None,
                ),
                Stmt::if_then(
                    Expr::binary(
                        BinaryOp::Eq,
                        Expr::binary(BinaryOp::Mod, Expr::ident("i"), Expr::int(2)),
                        Expr::int(0),
                    ),
                    Stmt::continue_loop(),
                    None,
                ),
                println(vec![Expr::ident("i")]),
            ]),
        ),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "1\n3\n5\n7\n");
}

#[test]
fn repeat_runs_at_least_once() {
    let body = vec![
        int_var("n", 10),
        Stmt::repeat_until(
            vec![
                println(vec![Expr::ident("n")]),
                Stmt::compound(Expr::ident("n"), AssignOp::AddAssign, Expr::int(1)),
            ],
            Expr::binary(BinaryOp::Gt, Expr::ident("n"), Expr::int(5)),
        ),
    ];
    assert_eq!(run(Vec::new(), body).ok(), "10\n");
}

#[test]
fn exit_inside_loop_leaves_the_function() {
    let find = FunctionDecl::function("FirstOver", TypeExpr::integer())
        .param(dws_ir::Param::value("limit", TypeExpr::integer()))
        .body(vec![
            result_is(Expr::int(-1)),
            Stmt::for_loop(
                "i",
                Expr::int(1),
                Expr::int(100),
                ForDirection::To,
                None,
                Stmt::if_then(
                    Expr::binary(
                        BinaryOp::Gt,
                        Expr::binary(BinaryOp::Mul, Expr::ident("i"), Expr::ident("i")),
                        Expr::ident("limit"),
                    ),
                    Stmt::exit(Some(Expr::ident("i"))),
                    None,
                ),
            ),
            println(vec![Expr::string("unreachable")]),
        ]);
    let body = vec![println(vec![Expr::call("FirstOver", vec![Expr::int(50)])])];
    assert_eq!(run(vec![Decl::function(find)], body).ok(), "8\n");
}

#[test]
fn for_in_iterates_strings_arrays_and_enums() {
    let body = vec![
        Stmt::for_in("c", Expr::string("abc"), println(vec![Expr::ident("c")])),
        Stmt::for_in(
            "n",
            Expr::array(vec![Expr::int(3), Expr::int(1)]),
            println(vec![Expr::ident("n")]),
        ),
        Stmt::for_in("color", Expr::ident("TColor"), println(vec![Expr::ident("color")])),
    ];
    let decls = vec![Decl::enumeration(EnumDecl::new("TColor", &["Red", "Green", "Blue"]))];
    assert_eq!(run(decls, body).ok(), "a\nb\nc\n3\n1\nRed\nGreen\nBlue\n");
}

#[test]
fn for_in_rejects_integers() {
    let body = vec![Stmt::for_in("x", Expr::int(5), Stmt::block(Vec::new()))];
    assert!(matches!(
        run(Vec::new(), body).err(),
        EvalErrorKind::NotIterable { .. }
    ));
}

#[test]
fn divide_assign_by_zero_fails() {
    let body = vec![
        int_var("a", 10),
        Stmt::compound(Expr::ident("a"), AssignOp::DivAssign, Expr::int(0)),
    ];
    let run = run(Vec::new(), body);
    assert_eq!(run.global_int("a"), Some(10));
    assert_eq!(
        run.err(),
        EvalErrorKind::DivisionByZero {
            left: "10".to_string(),
            op: "/=".to_string(),
            right: "0".to_string(),
        }
    );

    let body = vec![
        Stmt::var("f", Some(TypeExpr::float()), Some(Expr::float(1.5))),
        Stmt::compound(Expr::ident("f"), AssignOp::DivAssign, Expr::float(0.0)),
    ];
    assert!(matches!(
        super::run(Vec::new(), body).err(),
        EvalErrorKind::DivisionByZero { .. }
    ));
}

#[test]
fn subrange_write_out_of_range_keeps_value() {
    let decls = vec![Decl::alias("TDigit", TypeExpr::subrange(0, 9))];
    let body = vec![
        typed_var("d", "TDigit", Expr::int(5)),
        Stmt::assign(Expr::ident("d"), Expr::int(15)),
    ];
    let run = run(decls, body);
    assert_eq!(run.global_int("d"), Some(5));
    assert_eq!(
        run.err(),
        EvalErrorKind::OutOfRange {
            value: 15,
            type_name: "TDigit".to_string(),
            low: 0,
            high: 9,
        }
    );
}

#[test]
fn break_outside_loop_fails() {
    let body = vec![println(vec![Expr::int(1)]), Stmt::break_loop(), println(vec![Expr::int(2)])];
    let run = run(Vec::new(), body);
    assert_eq!(run.output, "1\n");
    assert_eq!(
        run.err(),
        EvalErrorKind::Custom {
            message: "break outside of a loop".to_string(),
        }
    );
}

#[test]
fn continue_inside_routine_without_loop_fails() {
    let skip = FunctionDecl::procedure("Skip").body(vec![Stmt::continue_loop()]);
    let body = vec![super::call("Skip", Vec::new())];
    assert_eq!(
        run(vec![Decl::function(skip)], body).err(),
        EvalErrorKind::Custom {
            message: "continue outside of a loop".to_string(),
        }
    );
}

proptest! {
    #[test]
    fn subrange_accepts_exactly_its_bounds(v in -5i64..15) {
        let decls = vec![Decl::alias("TDigit", TypeExpr::subrange(0, 9))];
        let body = vec![
            typed_var("d", "TDigit", Expr::int(0)),
            Stmt::assign(Expr::ident("d"), Expr::int(v)),
        ];
        let run = run(decls, body);
        prop_assert_eq!(run.result.is_ok(), (0..=9).contains(&v));
    }
}

//! Tests for the Math object

use super::*;
use jsrun::ast::{BinaryOp, Expression, LogicalOp};
use jsrun::builder::*;

fn math(name: &str, args: Vec<Expression>) -> Expression {
    method(ident("Math"), name, args)
}

#[test]
fn test_rounding() {
    let lines = output(vec![
        log(vec![
            math("floor", vec![num(-1.5)]),
            math("ceil", vec![num(1.2)]),
            math("trunc", vec![num(-1.7)]),
            math("abs", vec![num(-3.0)]),
        ]),
        log(vec![
            math("round", vec![num(2.5)]),
            math("round", vec![num(-2.5)]),
            math("round", vec![num(-0.4)]),
            math("round", vec![string("7.6")]),
        ]),
        log(vec![math("floor", vec![]), math("sign", vec![num(-8.0)])]),
    ]);
    assert_eq!(lines, vec!["-2 2 -1 3", "3 -2 -0 8", "NaN -1"]);
}

#[test]
fn test_min_and_max() {
    let lines = output(vec![
        log(vec![
            math("min", vec![num(3.0), num(1.0), num(2.0)]),
            math("max", vec![num(3.0), num(1.0), num(2.0)]),
        ]),
        log(vec![math("min", vec![]), math("max", vec![])]),
        log(vec![
            math("max", vec![num(1.0), ident("NaN"), num(5.0)]),
            math("min", vec![num(0.0), num(-0.0)]),
        ]),
    ]);
    assert_eq!(lines, vec!["1 3", "Infinity -Infinity", "NaN -0"]);
}

#[test]
fn test_min_coerces_every_argument() {
    let lines = output(vec![
        let_("calls", num(0.0)),
        const_(
            "counted",
            object(vec![(
                "valueOf",
                arrow(&[], vec![expr(increment("calls")), return_(Some(num(4.0)))]),
            )]),
        ),
        log(vec![
            math("min", vec![ident("NaN"), ident("counted"), ident("counted")]),
            ident("calls"),
        ]),
    ]);
    assert_eq!(lines, vec!["NaN 2"]);
}

#[test]
fn test_pow_sqrt_and_constants() {
    let lines = output(vec![log(vec![
        math("pow", vec![num(2.0), num(10.0)]),
        math("sqrt", vec![num(81.0)]),
        binary(BinaryOp::Gt, member(ident("Math"), "PI"), num(3.14)),
    ])]);
    assert_eq!(lines, vec!["1024 9 true"]);
}

#[test]
fn test_random_is_in_unit_interval() {
    let lines = output(vec![
        let_("ok", boolean(true)),
        for_let(
            "i",
            num(0.0),
            binary(BinaryOp::Lt, ident("i"), num(200.0)),
            increment("i"),
            block(vec![
                const_("r", math("random", vec![])),
                if_(
                    logical(
                        LogicalOp::Or,
                        binary(BinaryOp::Lt, ident("r"), num(0.0)),
                        binary(BinaryOp::GtEq, ident("r"), num(1.0)),
                    ),
                    expr(assign("ok", boolean(false))),
                    None,
                ),
            ]),
        ),
        log(vec![ident("ok")]),
    ]);
    assert_eq!(lines, vec!["true"]);
}

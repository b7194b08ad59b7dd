//! Tests for control-flow signals: break/continue/return/throw through
//! loops, labels, switch and try/finally

use super::*;
use jsrun::ast::{BinaryOp, LogicalOp};
use jsrun::builder::*;
use jsrun::{ControlSignal, JsString, JsValue};

// ═══════════════════════════════════════════════════════════════
// Labels and loops
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_labeled_break_exits_outer_loop() {
    let lines = output(vec![labeled(
        "outer",
        for_let(
            "i",
            num(0.0),
            binary(BinaryOp::Lt, ident("i"), num(3.0)),
            increment("i"),
            for_let(
                "j",
                num(0.0),
                binary(BinaryOp::Lt, ident("j"), num(3.0)),
                increment("j"),
                block(vec![
                    if_(
                        binary(BinaryOp::StrictEq, ident("j"), num(1.0)),
                        break_(Some("outer")),
                        None,
                    ),
                    log(vec![ident("i"), ident("j")]),
                ]),
            ),
        ),
    )]);
    assert_eq!(lines, vec!["0 0"]);
}

#[test]
fn test_labeled_continue_resumes_outer_loop() {
    let lines = output(vec![labeled(
        "outer",
        for_let(
            "i",
            num(0.0),
            binary(BinaryOp::Lt, ident("i"), num(2.0)),
            increment("i"),
            for_let(
                "j",
                num(0.0),
                binary(BinaryOp::Lt, ident("j"), num(3.0)),
                increment("j"),
                block(vec![
                    if_(
                        binary(BinaryOp::StrictEq, ident("j"), num(1.0)),
                        continue_(Some("outer")),
                        None,
                    ),
                    log(vec![ident("i"), ident("j")]),
                ]),
            ),
        ),
    )]);
    assert_eq!(lines, vec!["0 0", "1 0"]);
}

#[test]
fn test_break_out_of_labeled_block() {
    let lines = output(vec![
        labeled(
            "done",
            block(vec![
                log(vec![string("before")]),
                break_(Some("done")),
                log(vec![string("skipped")]),
            ]),
        ),
        log(vec![string("after")]),
    ]);
    assert_eq!(lines, vec!["before", "after"]);
}

#[test]
fn test_while_and_do_while() {
    let lines = output(vec![
        let_("n", num(0.0)),
        while_(
            boolean(true),
            block(vec![
                expr(increment("n")),
                if_(
                    binary(BinaryOp::Lt, ident("n"), num(3.0)),
                    continue_(None),
                    None,
                ),
                break_(None),
            ]),
        ),
        log(vec![ident("n")]),
        do_while(log(vec![string("once")]), boolean(false)),
    ]);
    assert_eq!(lines, vec!["3", "once"]);
}

#[test]
fn test_return_from_inside_loop() {
    let lines = output(vec![
        function(
            "firstOver",
            &["list", "limit"],
            vec![
                for_of(
                    Some(jsrun::ast::VariableKind::Const),
                    "x",
                    ident("list"),
                    if_(
                        binary(BinaryOp::Gt, ident("x"), ident("limit")),
                        return_(Some(ident("x"))),
                        None,
                    ),
                ),
                return_(Some(num(-1.0))),
            ],
        ),
        log(vec![call(
            ident("firstOver"),
            vec![array(vec![num(1.0), num(5.0), num(9.0)]), num(4.0)],
        )]),
        log(vec![call(
            ident("firstOver"),
            vec![array(vec![num(1.0)]), num(4.0)],
        )]),
    ]);
    assert_eq!(lines, vec!["5", "-1"]);
}

// ═══════════════════════════════════════════════════════════════
// Switch
// ═══════════════════════════════════════════════════════════════

fn classify(value: f64) -> Vec<String> {
    output(vec![switch(
        num(value),
        vec![
            case(num(1.0), vec![log(vec![string("one")])]),
            default_case(vec![log(vec![string("default")])]),
            case(num(2.0), vec![log(vec![string("two")]), break_(None)]),
            case(num(3.0), vec![log(vec![string("three")])]),
        ],
    )])
}

#[test]
fn test_switch_fallthrough_and_default_position() {
    assert_eq!(classify(1.0), vec!["one", "default", "two"]);
    assert_eq!(classify(2.0), vec!["two"]);
    assert_eq!(classify(3.0), vec!["three"]);
    assert_eq!(classify(7.0), vec!["default", "two"]);
}

#[test]
fn test_switch_uses_strict_equality() {
    let lines = output(vec![switch(
        string("1"),
        vec![
            case(num(1.0), vec![log(vec![string("number")])]),
            case(string("1"), vec![log(vec![string("string")])]),
        ],
    )]);
    assert_eq!(lines, vec!["string"]);
}

#[test]
fn test_continue_inside_switch_targets_loop() {
    let lines = output(vec![for_let(
        "i",
        num(0.0),
        binary(BinaryOp::Lt, ident("i"), num(3.0)),
        increment("i"),
        block(vec![
            switch(
                ident("i"),
                vec![case(num(1.0), vec![continue_(None)])],
            ),
            log(vec![ident("i")]),
        ]),
    )]);
    assert_eq!(lines, vec!["0", "2"]);
}

// ═══════════════════════════════════════════════════════════════
// Try / catch / finally
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_finally_return_overrides_try_return() {
    let lines = output(vec![
        function(
            "f",
            &[],
            vec![try_finally(
                vec![return_(Some(string("try")))],
                vec![return_(Some(string("finally")))],
            )],
        ),
        log(vec![call(ident("f"), vec![])]),
    ]);
    assert_eq!(lines, vec!["finally"]);
}

#[test]
fn test_finally_return_swallows_throw() {
    let lines = output(vec![
        function(
            "f",
            &[],
            vec![try_finally(
                vec![throw(string("lost"))],
                vec![return_(Some(string("recovered")))],
            )],
        ),
        log(vec![call(ident("f"), vec![])]),
    ]);
    assert_eq!(lines, vec!["recovered"]);
}

#[test]
fn test_finally_throw_replaces_return() {
    let lines = output(vec![
        function(
            "f",
            &[],
            vec![try_finally(
                vec![return_(Some(num(1.0)))],
                vec![throw(string("from finally"))],
            )],
        ),
        try_catch(
            vec![expr(call(ident("f"), vec![]))],
            "e",
            vec![log(vec![ident("e")])],
        ),
    ]);
    assert_eq!(lines, vec!["from finally"]);
}

#[test]
fn test_finally_runs_on_break_and_normal_completion_keeps_signal() {
    let lines = output(vec![
        while_(
            boolean(true),
            try_finally(
                vec![log(vec![string("body")]), break_(None)],
                vec![log(vec![string("cleanup")])],
            ),
        ),
        log(vec![string("after")]),
    ]);
    assert_eq!(lines, vec!["body", "cleanup", "after"]);
}

#[test]
fn test_catch_then_finally_order() {
    let lines = output(vec![try_(
        vec![log(vec![string("try")]), throw(num(1.0))],
        Some((Some("e"), vec![log(vec![string("catch"), ident("e")])])),
        Some(vec![log(vec![string("finally")])]),
    )]);
    assert_eq!(lines, vec!["try", "catch 1", "finally"]);
}

#[test]
fn test_catch_without_binding() {
    let lines = output(vec![try_(
        vec![throw(string("x"))],
        Some((None, vec![log(vec![string("caught")])])),
        None,
    )]);
    assert_eq!(lines, vec!["caught"]);
}

#[test]
fn test_rethrow_from_catch_reaches_outer_handler() {
    let lines = output(vec![try_catch(
        vec![try_catch(
            vec![throw(object(vec![("code", num(7.0))]))],
            "inner",
            vec![
                log(vec![string("inner"), member(ident("inner"), "code")]),
                throw(ident("inner")),
            ],
        )],
        "outer",
        vec![log(vec![string("outer"), ident("outer")])],
    )]);
    assert_eq!(lines, vec!["inner 7", "outer { code: 7 }"]);
}

#[test]
fn test_catch_throwing_new_value_replaces_original() {
    let lines = output(vec![
        let_("cleanups", num(0.0)),
        try_catch(
            vec![try_(
                vec![throw(string("first"))],
                Some((Some("e"), vec![throw(string("second"))])),
                Some(vec![expr(increment("cleanups"))]),
            )],
            "outer",
            vec![log(vec![ident("outer"), ident("cleanups")])],
        ),
    ]);
    assert_eq!(lines, vec!["second 1"]);
}

#[test]
fn test_finally_runs_on_continue() {
    let lines = output(vec![
        let_("cleanups", num(0.0)),
        let_("bodies", num(0.0)),
        for_let(
            "i",
            num(0.0),
            binary(BinaryOp::Lt, ident("i"), num(3.0)),
            increment("i"),
            try_finally(
                vec![continue_(None), expr(increment("bodies"))],
                vec![expr(increment("cleanups"))],
            ),
        ),
        log(vec![ident("cleanups"), ident("bodies")]),
    ]);
    assert_eq!(lines, vec!["3 0"]);
}

#[test]
fn test_runtime_faults_are_catchable_errors() {
    let lines = output(vec![try_catch(
        vec![expr(member(null(), "x"))],
        "e",
        vec![log(vec![
            member(ident("e"), "name"),
            binary(
                BinaryOp::Instanceof,
                ident("e"),
                ident("TypeError"),
            ),
        ])],
    )]);
    assert_eq!(lines, vec!["TypeError true"]);
}

// ═══════════════════════════════════════════════════════════════
// Completion values
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_completion_value_of_last_statement() {
    let value = eval(vec![
        let_("x", num(1.0)),
        expr(binary(BinaryOp::Add, ident("x"), num(1.0))),
        if_(boolean(true), block(vec![expr(num(10.0))]), None),
    ]);
    assert_eq!(value, JsValue::Number(10.0));

    let value = eval(vec![expr(string("kept")), let_("y", num(2.0))]);
    assert_eq!(value, JsValue::from("kept"));
}

#[test]
fn test_top_level_signals_reach_the_host() {
    let signal = eval_signal(vec![return_(Some(num(3.0))), log(vec![string("unreached")])]);
    assert_eq!(signal, ControlSignal::Return(JsValue::Number(3.0)));

    let signal = eval_signal(vec![throw(string("up"))]);
    assert_eq!(signal, ControlSignal::Throw(JsValue::from("up")));

    let signal = eval_signal(vec![break_(Some("nowhere"))]);
    assert_eq!(signal, ControlSignal::Break(Some(JsString::from("nowhere"))));
}

#[test]
fn test_logical_operators_short_circuit() {
    let lines = output(vec![
        let_("calls", num(0.0)),
        const_(
            "touch",
            arrow(&[], vec![expr(increment("calls")), return_(Some(boolean(true)))]),
        ),
        expr(logical(LogicalOp::And, boolean(false), call(ident("touch"), vec![]))),
        expr(logical(LogicalOp::Or, boolean(true), call(ident("touch"), vec![]))),
        log(vec![
            ident("calls"),
            logical(LogicalOp::NullishCoalesce, null(), string("fallback")),
            logical(LogicalOp::NullishCoalesce, num(0.0), string("unused")),
            conditional(string(""), string("yes"), string("no")),
        ]),
    ]);
    assert_eq!(lines, vec!["0 fallback 0 no"]);
}

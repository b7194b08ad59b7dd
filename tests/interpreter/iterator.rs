//! Tests for the iteration protocol: for-of, for-in and iterator closing

use super::*;
use jsrun::ast::{BinaryOp, Expression, Statement, UnaryOp, VariableKind};
use jsrun::builder::*;

fn iterator_key() -> Expression {
    member(ident("Symbol"), "iterator")
}

fn for_of_const(name: &str, right: Expression, body: Vec<Statement>) -> Statement {
    for_of(Some(VariableKind::Const), name, right, block(body))
}

/// An iterable yielding 1, 2, 3 that logs when it is closed.
fn counting_iterable() -> Statement {
    const_(
        "iterable",
        object_with(vec![computed_prop(
            iterator_key(),
            func(
                None,
                &[],
                vec![
                    let_("n", num(0.0)),
                    return_(Some(object(vec![
                        (
                            "next",
                            arrow(
                                &[],
                                vec![
                                    expr(increment("n")),
                                    return_(Some(object(vec![
                                        ("value", ident("n")),
                                        ("done", binary(BinaryOp::Gt, ident("n"), num(3.0))),
                                    ]))),
                                ],
                            ),
                        ),
                        (
                            "return",
                            arrow(
                                &[],
                                vec![
                                    log(vec![string("closed")]),
                                    return_(Some(object(vec![("done", boolean(true))]))),
                                ],
                            ),
                        ),
                    ]))),
                ],
            ),
        )]),
    )
}

// ═══════════════════════════════════════════════════════════════
// for-of
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_for_of_array_skips_holes() {
    let lines = output(vec![for_of_const(
        "x",
        sparse_array(vec![
            Some(num(0.0)),
            Some(num(1.0)),
            Some(num(2.0)),
            None,
            Some(num(4.0)),
        ]),
        vec![log(vec![ident("x")])],
    )]);
    assert_eq!(lines, vec!["0", "1", "2", "4"]);
}

#[test]
fn test_for_of_sees_elements_pushed_during_loop() {
    let lines = output(vec![
        const_("a", array(vec![num(1.0)])),
        for_of_const(
            "x",
            ident("a"),
            vec![
                log(vec![ident("x")]),
                if_(
                    binary(BinaryOp::Lt, ident("x"), num(3.0)),
                    expr(method(
                        ident("a"),
                        "push",
                        vec![binary(BinaryOp::Add, ident("x"), num(1.0))],
                    )),
                    None,
                ),
            ],
        ),
    ]);
    assert_eq!(lines, vec!["1", "2", "3"]);
}

#[test]
fn test_for_of_string_yields_code_points() {
    let lines = output(vec![for_of_const(
        "ch",
        string("a😀b"),
        vec![log(vec![ident("ch")])],
    )]);
    assert_eq!(lines, vec!["a", "😀", "b"]);
}

#[test]
fn test_for_of_custom_iterable_runs_to_completion_without_close() {
    let lines = output(vec![
        counting_iterable(),
        for_of_const("v", ident("iterable"), vec![log(vec![ident("v")])]),
    ]);
    assert_eq!(lines, vec!["1", "2", "3"]);
}

#[test]
fn test_break_closes_iterator() {
    let lines = output(vec![
        counting_iterable(),
        for_of_const(
            "v",
            ident("iterable"),
            vec![
                log(vec![ident("v")]),
                if_(
                    binary(BinaryOp::StrictEq, ident("v"), num(2.0)),
                    break_(None),
                    None,
                ),
            ],
        ),
        log(vec![string("after")]),
    ]);
    assert_eq!(lines, vec!["1", "2", "closed", "after"]);
}

#[test]
fn test_throw_closes_iterator_and_keeps_original_error() {
    let lines = output(vec![
        counting_iterable(),
        try_catch(
            vec![for_of_const(
                "v",
                ident("iterable"),
                vec![throw(string("stop"))],
            )],
            "e",
            vec![log(vec![string("caught"), ident("e")])],
        ),
    ]);
    assert_eq!(lines, vec!["closed", "caught stop"]);
}

#[test]
fn test_return_from_function_closes_iterator() {
    let lines = output(vec![
        counting_iterable(),
        function(
            "first",
            &[],
            vec![for_of_const(
                "v",
                ident("iterable"),
                vec![return_(Some(ident("v")))],
            )],
        ),
        log(vec![call(ident("first"), vec![])]),
    ]);
    assert_eq!(lines, vec!["closed", "1"]);
}

#[test]
fn test_non_iterable_is_type_error() {
    let message = thrown_message(vec![for_of_const("x", num(5.0), vec![])]);
    assert_eq!(message, "TypeError: 5 is not iterable");

    let message = thrown_message(vec![for_of_const("x", object(vec![]), vec![])]);
    assert_eq!(message, "TypeError: {} is not iterable");
}

#[test]
fn test_non_object_iterator_result_is_type_error() {
    let message = thrown_message(vec![
        const_(
            "bad",
            object_with(vec![computed_prop(
                iterator_key(),
                arrow_expr(
                    &[],
                    object(vec![("next", arrow_expr(&[], num(1.0)))]),
                ),
            )]),
        ),
        for_of_const("x", ident("bad"), vec![]),
    ]);
    assert_eq!(message, "TypeError: Iterator result 1 is not an object");
}

#[test]
fn test_array_iterator_object() {
    let lines = output(vec![
        const_(
            "it",
            call(
                index(array(vec![num(1.0)]), iterator_key()),
                vec![],
            ),
        ),
        log(vec![method(ident("it"), "next", vec![])]),
        log(vec![method(ident("it"), "next", vec![])]),
        log(vec![ident("it")]),
    ]);
    assert_eq!(
        lines,
        vec![
            "{ value: 1, done: false }",
            "{ value: undefined, done: true }",
            "Object [Array Iterator] {}",
        ]
    );
}

#[test]
fn test_overridden_array_iterator_is_used() {
    let lines = output(vec![
        const_("a", array(vec![num(1.0), num(2.0)])),
        expr(assign(
            at(ident("a"), iterator_key()),
            func(
                None,
                &[],
                vec![return_(Some(call(
                    index(array(vec![string("replaced")]), iterator_key()),
                    vec![],
                )))],
            ),
        )),
        for_of_const("x", ident("a"), vec![log(vec![ident("x")])]),
    ]);
    assert_eq!(lines, vec!["replaced"]);
}

// ═══════════════════════════════════════════════════════════════
// for-in
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_for_in_order_and_inheritance() {
    let lines = output(vec![
        const_("proto", object(vec![("inherited", num(1.0)), ("b", num(0.0))])),
        const_("o", method(ident("Object"), "create", vec![ident("proto")])),
        expr(assign(dot(ident("o"), "b"), num(1.0))),
        expr(assign(at(ident("o"), num(10.0)), num(1.0))),
        expr(assign(dot(ident("o"), "a"), num(1.0))),
        expr(assign(at(ident("o"), num(2.0)), num(1.0))),
        expr(method(
            ident("Object"),
            "defineProperty",
            vec![ident("o"), string("hidden"), object(vec![("value", num(1.0))])],
        )),
        const_("seen", array(vec![])),
        for_in(
            Some(VariableKind::Const),
            "k",
            ident("o"),
            expr(method(ident("seen"), "push", vec![ident("k")])),
        ),
        log(vec![ident("seen")]),
    ]);
    assert_eq!(lines, vec!["[ '2', '10', 'b', 'a', 'inherited' ]"]);
}

#[test]
fn test_for_in_skips_keys_deleted_during_loop() {
    let lines = output(vec![
        const_(
            "o",
            object(vec![("a", num(1.0)), ("b", num(2.0)), ("c", num(3.0))]),
        ),
        for_in(
            Some(VariableKind::Let),
            "k",
            ident("o"),
            block(vec![
                log(vec![ident("k")]),
                if_(
                    binary(BinaryOp::StrictEq, ident("k"), string("a")),
                    expr(unary(UnaryOp::Delete, member(ident("o"), "b"))),
                    None,
                ),
            ]),
        ),
    ]);
    assert_eq!(lines, vec!["a", "c"]);
}

#[test]
fn test_for_in_over_null_and_primitives() {
    let lines = output(vec![
        for_in(
            Some(VariableKind::Const),
            "k",
            null(),
            log(vec![string("never")]),
        ),
        for_in(
            Some(VariableKind::Const),
            "k",
            string("hi"),
            log(vec![ident("k")]),
        ),
        log(vec![string("done")]),
    ]);
    assert_eq!(lines, vec!["0", "1", "done"]);
}

#[test]
fn test_for_in_array_visits_indices_and_named_keys() {
    let lines = output(vec![
        const_("a", sparse_array(vec![Some(string("x")), None, Some(string("z"))])),
        expr(assign(dot(ident("a"), "extra"), boolean(true))),
        for_in(
            Some(VariableKind::Const),
            "k",
            ident("a"),
            log(vec![ident("k")]),
        ),
    ]);
    assert_eq!(lines, vec!["0", "2", "extra"]);
}

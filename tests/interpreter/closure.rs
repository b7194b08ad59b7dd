//! Tests for the scope chain: closures, block scoping, hoisting and `this`

use super::*;
use jsrun::ast::{AssignmentOp, BinaryOp, Expression, ForInit, UnaryOp, VariableKind};
use jsrun::builder::*;

fn call_each(list: &str) -> jsrun::ast::Statement {
    expr(method(
        ident(list),
        "forEach",
        vec![arrow(&["f"], vec![log(vec![call(ident("f"), vec![])])])],
    ))
}

fn capture(name: &str) -> Expression {
    arrow_expr(&[], ident(name))
}

/// `name += 1`
fn bump(name: &str) -> Expression {
    assign_op(AssignmentOp::AddAssign, name, num(1.0))
}

// ═══════════════════════════════════════════════════════════════
// Closures
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_counters_keep_independent_state() {
    let lines = output(vec![
        function(
            "makeCounter",
            &[],
            vec![
                let_("count", num(0.0)),
                return_(Some(arrow_expr(&[], bump("count")))),
            ],
        ),
        const_("a", call(ident("makeCounter"), vec![])),
        const_("b", call(ident("makeCounter"), vec![])),
        expr(call(ident("a"), vec![])),
        expr(call(ident("a"), vec![])),
        log(vec![call(ident("a"), vec![]), call(ident("b"), vec![])]),
    ]);
    assert_eq!(lines, vec!["3 1"]);
}

#[test]
fn test_closures_from_one_call_share_bindings() {
    let lines = output(vec![
        function(
            "pair",
            &[],
            vec![
                let_("value", num(0.0)),
                return_(Some(object(vec![
                    (
                        "set",
                        arrow(&["v"], vec![expr(assign("value", ident("v")))]),
                    ),
                    ("get", capture("value")),
                ]))),
            ],
        ),
        const_("p", call(ident("pair"), vec![])),
        expr(method(ident("p"), "set", vec![num(42.0)])),
        log(vec![method(ident("p"), "get", vec![])]),
    ]);
    assert_eq!(lines, vec!["42"]);
}

#[test]
fn test_closure_sees_later_assignment() {
    let lines = output(vec![
        let_("x", num(1.0)),
        const_("read", capture("x")),
        expr(assign("x", num(2.0))),
        log(vec![call(ident("read"), vec![])]),
    ]);
    assert_eq!(lines, vec!["2"]);
}

#[test]
fn test_for_let_creates_binding_per_iteration() {
    let lines = output(vec![
        const_("fns", array(vec![])),
        for_let(
            "i",
            num(0.0),
            binary(BinaryOp::Lt, ident("i"), num(3.0)),
            increment("i"),
            block(vec![expr(method(ident("fns"), "push", vec![capture("i")]))]),
        ),
        call_each("fns"),
    ]);
    assert_eq!(lines, vec!["0", "1", "2"]);
}

#[test]
fn test_for_var_shares_one_binding() {
    let lines = output(vec![
        const_("fns", array(vec![])),
        var("i", None),
        for_(
            Some(ForInit::Expression(assign("i", num(0.0)))),
            Some(binary(BinaryOp::Lt, ident("i"), num(3.0))),
            Some(increment("i")),
            block(vec![expr(method(ident("fns"), "push", vec![capture("i")]))]),
        ),
        call_each("fns"),
    ]);
    assert_eq!(lines, vec!["3", "3", "3"]);
}

#[test]
fn test_for_of_const_binding_per_iteration() {
    let lines = output(vec![
        const_("fns", array(vec![])),
        for_of(
            Some(VariableKind::Const),
            "v",
            array(vec![string("a"), string("b")]),
            block(vec![expr(method(ident("fns"), "push", vec![capture("v")]))]),
        ),
        call_each("fns"),
    ]);
    assert_eq!(lines, vec!["a", "b"]);
}

// ═══════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_function_declarations_are_hoisted() {
    let lines = output(vec![
        log(vec![call(ident("later"), vec![num(2.0)])]),
        function(
            "later",
            &["n"],
            vec![return_(Some(binary(BinaryOp::Mul, ident("n"), num(10.0))))],
        ),
    ]);
    assert_eq!(lines, vec!["20"]);
}

#[test]
fn test_var_is_function_scoped_and_let_is_block_scoped() {
    let lines = output(vec![
        function(
            "f",
            &[],
            vec![
                block(vec![var("v", Some(num(1.0))), let_("l", num(2.0))]),
                return_(Some(binary(
                    BinaryOp::Add,
                    ident("v"),
                    unary(UnaryOp::Typeof, ident("l")),
                ))),
            ],
        ),
        log(vec![call(ident("f"), vec![])]),
    ]);
    assert_eq!(lines, vec!["1undefined"]);
}

#[test]
fn test_block_shadowing() {
    let lines = output(vec![
        let_("x", string("outer")),
        block(vec![let_("x", string("inner")), log(vec![ident("x")])]),
        log(vec![ident("x")]),
    ]);
    assert_eq!(lines, vec!["inner", "outer"]);
}

#[test]
fn test_const_assignment_is_type_error() {
    let message = thrown_message(vec![
        const_("c", num(1.0)),
        expr(assign("c", num(2.0))),
    ]);
    assert_eq!(message, "TypeError: Assignment to constant variable.");
}

#[test]
fn test_unresolved_identifier() {
    let message = thrown_message(vec![log(vec![ident("missing")])]);
    assert_eq!(message, "ReferenceError: missing is not defined");

    let message = thrown_message(vec![expr(assign("undeclared", num(1.0)))]);
    assert_eq!(message, "ReferenceError: undeclared is not defined");
}

#[test]
fn test_typeof_unresolved_is_undefined() {
    let lines = output(vec![log(vec![unary(UnaryOp::Typeof, ident("nothing"))])]);
    assert_eq!(lines, vec!["undefined"]);
}

#[test]
fn test_duplicate_let_is_syntax_error() {
    let message = thrown_message(vec![let_("x", num(1.0)), let_("x", num(2.0))]);
    assert_eq!(message, "SyntaxError: Identifier 'x' has already been declared");
}

#[test]
fn test_globals_resolve_through_global_object() {
    let lines = output(vec![
        expr(assign(dot(ident("globalThis"), "late"), string("hi"))),
        log(vec![ident("late")]),
        expr(assign("late", string("changed"))),
        log(vec![member(ident("globalThis"), "late")]),
    ]);
    assert_eq!(lines, vec!["hi", "changed"]);
}

// ═══════════════════════════════════════════════════════════════
// this
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_method_call_binds_this() {
    let lines = output(vec![
        const_(
            "o",
            object(vec![
                ("name", string("box")),
                (
                    "describe",
                    func(None, &[], vec![return_(Some(member(this(), "name")))]),
                ),
            ]),
        ),
        log(vec![method(ident("o"), "describe", vec![])]),
        log(vec![unary(
            UnaryOp::Typeof,
            call(
                func(None, &[], vec![return_(Some(this()))]),
                vec![],
            ),
        )]),
    ]);
    assert_eq!(lines, vec!["box", "undefined"]);
}

#[test]
fn test_arrow_captures_lexical_this() {
    let lines = output(vec![
        const_(
            "o",
            object(vec![
                ("tag", string("outer")),
                (
                    "run",
                    func(
                        None,
                        &[],
                        vec![
                            const_("inner", arrow_expr(&[], member(this(), "tag"))),
                            return_(Some(call(ident("inner"), vec![]))),
                        ],
                    ),
                ),
            ]),
        ),
        log(vec![method(ident("o"), "run", vec![])]),
    ]);
    assert_eq!(lines, vec!["outer"]);
}

#[test]
fn test_call_apply_bind() {
    let show = func(
        None,
        &["a", "b"],
        vec![return_(Some(binary(
            BinaryOp::Add,
            binary(BinaryOp::Add, member(this(), "p"), ident("a")),
            ident("b"),
        )))],
    );
    let lines = output(vec![
        const_("show", show),
        const_("ctx", object(vec![("p", string("<"))])),
        log(vec![method(
            ident("show"),
            "call",
            vec![ident("ctx"), string("1"), string("2")],
        )]),
        log(vec![method(
            ident("show"),
            "apply",
            vec![ident("ctx"), array(vec![string("3"), string("4")])],
        )]),
        const_(
            "bound",
            method(ident("show"), "bind", vec![ident("ctx"), string("5")]),
        ),
        log(vec![call(ident("bound"), vec![string("6")])]),
    ]);
    assert_eq!(lines, vec!["<12", "<34", "<56"]);
}

#[test]
fn test_constructor_call_with_new() {
    let lines = output(vec![
        function(
            "Point",
            &["x", "y"],
            vec![
                expr(assign(dot(this(), "x"), ident("x"))),
                expr(assign(dot(this(), "y"), ident("y"))),
            ],
        ),
        expr(assign(
            dot(member(ident("Point"), "prototype"), "sum"),
            func(
                None,
                &[],
                vec![return_(Some(binary(
                    BinaryOp::Add,
                    member(this(), "x"),
                    member(this(), "y"),
                )))],
            ),
        )),
        const_("p", new(ident("Point"), vec![num(1.0), num(2.0)])),
        log(vec![ident("p"), method(ident("p"), "sum", vec![])]),
        log(vec![binary(BinaryOp::Instanceof, ident("p"), ident("Point"))]),
    ]);
    assert_eq!(lines, vec!["Point { x: 1, y: 2 } 3", "true"]);
}

#[test]
fn test_runaway_recursion_is_catchable_range_error() {
    let config = RuntimeConfig {
        max_call_depth: 32,
        ..RuntimeConfig::default()
    };
    let (report, lines) = run_script_on(
        create_test_runtime_with(config),
        vec![
            function(
                "down",
                &["n"],
                vec![return_(Some(call(
                    ident("down"),
                    vec![binary(BinaryOp::Add, ident("n"), num(1.0))],
                )))],
            ),
            try_catch(
                vec![expr(call(ident("down"), vec![num(0.0)]))],
                "e",
                vec![log(vec![ident("e")])],
            ),
        ],
    );
    assert!(report.faults.is_empty());
    assert_eq!(lines, vec!["RangeError: Maximum call stack size exceeded"]);
}

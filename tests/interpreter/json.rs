//! Tests for JSON.stringify and JSON.parse

use super::*;
use jsrun::ast::{BinaryOp, Expression, UnaryOp};
use jsrun::builder::*;

fn stringify(args: Vec<Expression>) -> Expression {
    method(ident("JSON"), "stringify", args)
}

fn parse(args: Vec<Expression>) -> Expression {
    method(ident("JSON"), "parse", args)
}

// ═══════════════════════════════════════════════════════════════
// stringify
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_stringify_values() {
    let lines = output(vec![
        log(vec![stringify(vec![object(vec![
            ("b", num(1.0)),
            (
                "a",
                array(vec![
                    num(1.5),
                    string("x"),
                    null(),
                    undefined(),
                    arrow(&[], vec![]),
                ]),
            ),
            ("s", string("q\"\n")),
            ("n", ident("NaN")),
            ("u", undefined()),
            ("f", arrow(&[], vec![])),
            ("nested", object(vec![])),
        ])])]),
        log(vec![
            stringify(vec![string("text")]),
            stringify(vec![num(-0.0)]),
            stringify(vec![boolean(true)]),
        ]),
        log(vec![unary(UnaryOp::Typeof, stringify(vec![undefined()]))]),
    ]);
    assert_eq!(
        lines,
        vec![
            r#"{"b":1,"a":[1.5,"x",null,null,null],"s":"q\"\n","n":null,"nested":{}}"#,
            r#""text" 0 true"#,
            "undefined",
        ]
    );
}

#[test]
fn test_stringify_key_order_and_holes() {
    let lines = output(vec![
        const_("o", object(vec![("b", num(1.0))])),
        expr(assign(at(ident("o"), num(2.0)), num(2.0))),
        expr(assign(dot(ident("o"), "a"), num(3.0))),
        log(vec![stringify(vec![ident("o")])]),
        log(vec![stringify(vec![sparse_array(vec![Some(num(1.0)), None, Some(num(3.0))])])]),
    ]);
    assert_eq!(lines, vec![r#"{"2":2,"b":1,"a":3}"#, "[1,null,3]"]);
}

#[test]
fn test_stringify_indentation() {
    let value = object(vec![
        ("a", array(vec![num(1.0), object(vec![("b", num(2.0))])])),
        ("e", array(vec![])),
    ]);
    let lines = output(vec![
        log(vec![stringify(vec![value, null(), num(2.0)])]),
        log(vec![stringify(vec![array(vec![num(1.0)]), null(), string("--")])]),
    ]);
    assert_eq!(
        lines,
        vec![
            "{\n  \"a\": [\n    1,\n    {\n      \"b\": 2\n    }\n  ],\n  \"e\": []\n}",
            "[\n--1\n]",
        ]
    );
}

#[test]
fn test_stringify_to_json_and_replacers() {
    let lines = output(vec![
        const_(
            "stamp",
            object(vec![(
                "toJSON",
                func(
                    None,
                    &["key"],
                    vec![return_(Some(binary(BinaryOp::Add, string("at:"), ident("key"))))],
                ),
            )]),
        ),
        log(vec![stringify(vec![object(vec![("when", ident("stamp"))])])]),
        log(vec![stringify(vec![
            object(vec![("a", num(1.0)), ("b", string("keep")), ("c", num(3.0))]),
            arrow(
                &["k", "v"],
                vec![return_(Some(conditional(
                    binary(
                        BinaryOp::StrictEq,
                        unary(UnaryOp::Typeof, ident("v")),
                        string("number"),
                    ),
                    binary(BinaryOp::Mul, ident("v"), num(10.0)),
                    ident("v"),
                )))],
            ),
        ])]),
        log(vec![stringify(vec![
            object(vec![("a", num(1.0)), ("b", num(2.0)), ("c", num(3.0))]),
            array(vec![string("c"), string("a"), string("c")]),
        ])]),
    ]);
    assert_eq!(
        lines,
        vec![
            r#"{"when":"at:when"}"#,
            r#"{"a":10,"b":"keep","c":30}"#,
            r#"{"c":3,"a":1}"#,
        ]
    );
}

#[test]
fn test_stringify_circular_is_type_error() {
    let message = thrown_message(vec![
        const_("o", object(vec![])),
        expr(assign(dot(ident("o"), "self"), ident("o"))),
        expr(stringify(vec![ident("o")])),
    ]);
    assert_eq!(message, "TypeError: Converting circular structure to JSON");
}

#[test]
fn test_stringify_shared_reference_is_not_circular() {
    let lines = output(vec![
        const_("shared", object(vec![("x", num(1.0))])),
        log(vec![stringify(vec![array(vec![ident("shared"), ident("shared")])])]),
    ]);
    assert_eq!(lines, vec![r#"[{"x":1},{"x":1}]"#]);
}

// ═══════════════════════════════════════════════════════════════
// parse
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_parse_builds_objects_in_source_order() {
    let lines = output(vec![
        const_(
            "o",
            parse(vec![string(
                r#"{"b": 1, "a": [true, null, "s", 2.5], "__proto__": 5}"#,
            )]),
        ),
        log(vec![method(ident("Object"), "keys", vec![ident("o")])]),
        log(vec![member(ident("o"), "a")]),
        log(vec![
            method(ident("Object"), "hasOwn", vec![ident("o"), string("__proto__")]),
            binary(
                BinaryOp::StrictEq,
                method(ident("Object"), "getPrototypeOf", vec![ident("o")]),
                member(ident("Object"), "prototype"),
            ),
        ]),
    ]);
    assert_eq!(
        lines,
        vec![
            "[ 'b', 'a', '__proto__' ]",
            "[ true, null, 's', 2.5 ]",
            "true true",
        ]
    );
}

#[test]
fn test_parse_invalid_text_is_syntax_error() {
    let lines = output(vec![try_catch(
        vec![expr(parse(vec![string("{ bad json")]))],
        "e",
        vec![log(vec![
            member(ident("e"), "name"),
            binary(BinaryOp::Instanceof, ident("e"), ident("SyntaxError")),
        ])],
    )]);
    assert_eq!(lines, vec!["SyntaxError true"]);
}

#[test]
fn test_parse_reviver_transforms_and_deletes() {
    let lines = output(vec![
        const_(
            "o",
            parse(vec![
                string(r#"{"a": 1, "drop": true, "b": {"c": 2}}"#),
                arrow(
                    &["k", "v"],
                    vec![
                        if_(
                            binary(BinaryOp::StrictEq, ident("k"), string("drop")),
                            return_(Some(undefined())),
                            None,
                        ),
                        return_(Some(conditional(
                            binary(
                                BinaryOp::StrictEq,
                                unary(UnaryOp::Typeof, ident("v")),
                                string("number"),
                            ),
                            binary(BinaryOp::Mul, ident("v"), num(10.0)),
                            ident("v"),
                        ))),
                    ],
                ),
            ]),
        ),
        log(vec![ident("o")]),
    ]);
    assert_eq!(lines, vec!["{ a: 10, b: { c: 20 } }"]);
}

#[test]
fn test_round_trip_through_text() {
    let lines = output(vec![log(vec![stringify(vec![parse(vec![string(
        r#"[1,{"k":"v"},[]]"#,
    )])])])]);
    assert_eq!(lines, vec![r#"[1,{"k":"v"},[]]"#]);
}

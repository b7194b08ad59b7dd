//! Tests for own properties, attributes, accessors and prototype lookup

use super::*;
use jsrun::ast::{BinaryOp, UnaryOp};
use jsrun::builder::*;

fn object_ctor(name: &str, args: Vec<jsrun::ast::Expression>) -> jsrun::ast::Expression {
    method(ident("Object"), name, args)
}

// ═══════════════════════════════════════════════════════════════
// Attributes
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_non_writable_assignment_is_ignored() {
    let lines = output(vec![
        const_("o", object(vec![])),
        expr(object_ctor(
            "defineProperty",
            vec![
                ident("o"),
                string("x"),
                object(vec![("value", num(1.0)), ("writable", boolean(false))]),
            ],
        )),
        expr(assign(dot(ident("o"), "x"), num(2.0))),
        log(vec![member(ident("o"), "x")]),
        log(vec![member(object_ctor("keys", vec![ident("o")]), "length")]),
    ]);
    assert_eq!(lines, vec!["1", "0"]);
}

#[test]
fn test_define_property_defaults_to_locked_attributes() {
    let lines = output(vec![
        const_("o", object(vec![])),
        expr(object_ctor(
            "defineProperty",
            vec![ident("o"), string("x"), object(vec![("value", num(1.0))])],
        )),
        log(vec![object_ctor(
            "getOwnPropertyDescriptor",
            vec![ident("o"), string("x")],
        )]),
    ]);
    assert_eq!(
        lines,
        vec!["{ value: 1, writable: false, enumerable: false, configurable: false }"]
    );
}

#[test]
fn test_delete_respects_configurable() {
    let lines = output(vec![
        const_("o", object(vec![("a", num(1.0))])),
        expr(object_ctor(
            "defineProperty",
            vec![ident("o"), string("fixed"), object(vec![("value", num(2.0))])],
        )),
        log(vec![unary(UnaryOp::Delete, member(ident("o"), "a"))]),
        log(vec![unary(UnaryOp::Delete, member(ident("o"), "fixed"))]),
        log(vec![
            binary(BinaryOp::In, string("a"), ident("o")),
            member(ident("o"), "fixed"),
        ]),
    ]);
    assert_eq!(lines, vec!["true", "false", "false 2"]);
}

#[test]
fn test_prevent_extensions_blocks_new_keys() {
    let lines = output(vec![
        const_("o", object(vec![("a", num(1.0))])),
        expr(object_ctor("preventExtensions", vec![ident("o")])),
        expr(assign(dot(ident("o"), "b"), num(2.0))),
        expr(assign(dot(ident("o"), "a"), num(3.0))),
        log(vec![ident("o"), object_ctor("isExtensible", vec![ident("o")])]),
    ]);
    assert_eq!(lines, vec!["{ a: 3 } false"]);
}

// ═══════════════════════════════════════════════════════════════
// Accessors
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_getter_and_setter_receive_receiver() {
    let lines = output(vec![
        const_(
            "o",
            object_with(vec![
                prop("_v", num(1.0)),
                getter(
                    "v",
                    vec![return_(Some(binary(
                        BinaryOp::Mul,
                        member(this(), "_v"),
                        num(10.0),
                    )))],
                ),
                setter("v", "x", vec![expr(assign(dot(this(), "_v"), ident("x")))]),
            ]),
        ),
        expr(assign(dot(ident("o"), "v"), num(5.0))),
        log(vec![member(ident("o"), "v")]),
        log(vec![ident("o")]),
    ]);
    assert_eq!(lines, vec!["50", "{ _v: 5, v: [Getter/Setter] }"]);
}

#[test]
fn test_inherited_getter_sees_derived_this() {
    let lines = output(vec![
        const_(
            "base",
            object_with(vec![getter(
                "label",
                vec![return_(Some(binary(
                    BinaryOp::Add,
                    string("item "),
                    member(this(), "id"),
                )))],
            )]),
        ),
        const_("child", object_ctor("create", vec![ident("base")])),
        expr(assign(dot(ident("child"), "id"), num(7.0))),
        log(vec![member(ident("child"), "label")]),
    ]);
    assert_eq!(lines, vec!["item 7"]);
}

#[test]
fn test_getter_only_property_ignores_writes() {
    let lines = output(vec![
        const_(
            "o",
            object_with(vec![getter("k", vec![return_(Some(num(1.0)))])]),
        ),
        expr(assign(dot(ident("o"), "k"), num(9.0))),
        log(vec![member(ident("o"), "k")]),
    ]);
    assert_eq!(lines, vec!["1"]);
}

// ═══════════════════════════════════════════════════════════════
// Key order and prototypes
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_integer_keys_come_first() {
    let lines = output(vec![
        const_("o", object(vec![("b", num(1.0)), ("a", num(2.0))])),
        expr(assign(at(ident("o"), num(2.0)), string("two"))),
        expr(assign(at(ident("o"), string("1")), string("one"))),
        log(vec![object_ctor("keys", vec![ident("o")])]),
    ]);
    assert_eq!(lines, vec!["[ '1', '2', 'b', 'a' ]"]);
}

#[test]
fn test_redefining_keeps_insertion_position() {
    let lines = output(vec![
        const_("o", object(vec![("x", num(1.0)), ("y", num(2.0))])),
        expr(assign(dot(ident("o"), "x"), num(3.0))),
        log(vec![ident("o")]),
    ]);
    assert_eq!(lines, vec!["{ x: 3, y: 2 }"]);
}

#[test]
fn test_prototype_chain_lookup_and_shadowing() {
    let lines = output(vec![
        const_("proto", object(vec![("greeting", string("hi"))])),
        const_("o", object_ctor("create", vec![ident("proto")])),
        log(vec![
            member(ident("o"), "greeting"),
            method(ident("o"), "hasOwnProperty", vec![string("greeting")]),
        ]),
        expr(assign(dot(ident("o"), "greeting"), string("hello"))),
        log(vec![
            member(ident("o"), "greeting"),
            member(ident("proto"), "greeting"),
        ]),
        log(vec![method(ident("proto"), "isPrototypeOf", vec![ident("o")])]),
    ]);
    assert_eq!(lines, vec!["hi false", "hello hi", "true"]);
}

#[test]
fn test_null_prototype_object() {
    let lines = output(vec![
        const_("o", object_ctor("create", vec![null()])),
        expr(assign(dot(ident("o"), "x"), num(1.0))),
        log(vec![ident("o")]),
        log(vec![unary(UnaryOp::Typeof, member(ident("o"), "hasOwnProperty"))]),
    ]);
    assert_eq!(lines, vec!["[Object: null prototype] { x: 1 }", "undefined"]);
}

#[test]
fn test_cyclic_prototype_is_rejected() {
    let message = thrown_message(vec![
        const_("a", object(vec![])),
        const_("b", object_ctor("create", vec![ident("a")])),
        expr(object_ctor("setPrototypeOf", vec![ident("a"), ident("b")])),
    ]);
    assert_eq!(message, "TypeError: Cyclic __proto__ value");
}

#[test]
fn test_symbol_keys_are_hidden_from_keys() {
    let lines = output(vec![
        const_("s", call(ident("Symbol"), vec![string("tag")])),
        const_("o", object(vec![("a", num(1.0))])),
        expr(assign(at(ident("o"), ident("s")), num(2.0))),
        log(vec![object_ctor("keys", vec![ident("o")])]),
        log(vec![index(ident("o"), ident("s"))]),
        log(vec![ident("o")]),
    ]);
    assert_eq!(lines, vec!["[ 'a' ]", "2", "{ a: 1, [Symbol(tag)]: 2 }"]);
}

// ═══════════════════════════════════════════════════════════════
// Object.assign / Object.hasOwn
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_assign_copies_own_enumerable_properties() {
    let lines = output(vec![
        const_("proto", object(vec![("inherited", num(1.0))])),
        const_("source", object_ctor("create", vec![ident("proto")])),
        expr(assign(dot(ident("source"), "a"), num(1.0))),
        expr(object_ctor(
            "defineProperty",
            vec![ident("source"), string("hidden"), object(vec![("value", num(2.0))])],
        )),
        const_(
            "target",
            object_ctor(
                "assign",
                vec![
                    object(vec![("a", num(0.0)), ("z", num(9.0))]),
                    ident("source"),
                    null(),
                    object(vec![("b", num(3.0))]),
                ],
            ),
        ),
        log(vec![ident("target")]),
    ]);
    assert_eq!(lines, vec!["{ a: 1, z: 9, b: 3 }"]);
}

#[test]
fn test_assign_reads_getters_and_runs_setters() {
    let lines = output(vec![
        const_(
            "target",
            object_with(vec![setter(
                "value",
                "v",
                vec![log(vec![string("set"), ident("v")])],
            )]),
        ),
        expr(object_ctor(
            "assign",
            vec![
                ident("target"),
                object_with(vec![getter("value", vec![return_(Some(num(5.0)))])]),
            ],
        )),
    ]);
    assert_eq!(lines, vec!["set 5"]);
}

#[test]
fn test_has_own_ignores_prototype() {
    let lines = output(vec![
        const_("o", object_ctor("create", vec![object(vec![("up", num(1.0))])])),
        expr(assign(dot(ident("o"), "own"), num(1.0))),
        log(vec![
            object_ctor("hasOwn", vec![ident("o"), string("own")]),
            object_ctor("hasOwn", vec![ident("o"), string("up")]),
            object_ctor("hasOwn", vec![array(vec![num(1.0)]), num(0.0)]),
        ]),
    ]);
    assert_eq!(lines, vec!["true false true"]);
}

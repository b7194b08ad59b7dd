//! Tests for string primitives, String.prototype, Number formatting and Symbol

use super::*;
use jsrun::ast::{BinaryOp, Expression};
use jsrun::builder::*;

fn on(text: &str, name: &str, args: Vec<Expression>) -> Expression {
    method(string(text), name, args)
}

// ═══════════════════════════════════════════════════════════════
// Indexing and length
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_length_counts_utf16_units() {
    let lines = output(vec![log(vec![
        member(string("abc"), "length"),
        member(string("a😀"), "length"),
        member(string(""), "length"),
    ])]);
    assert_eq!(lines, vec!["3 3 0"]);
}

#[test]
fn test_char_access() {
    let lines = output(vec![
        log(vec![
            on("abc", "charAt", vec![num(1.0)]),
            index(string("abc"), num(2.0)),
            on("abc", "charCodeAt", vec![num(0.0)]),
        ]),
        log(vec![
            on("abc", "charAt", vec![num(5.0)]),
            index(string("abc"), num(5.0)),
            on("abc", "charCodeAt", vec![num(-1.0)]),
        ]),
    ]);
    assert_eq!(lines, vec!["b c 97", " undefined NaN"]);
}

// ═══════════════════════════════════════════════════════════════
// Searching
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_search_methods() {
    let lines = output(vec![
        log(vec![
            on("banana", "indexOf", vec![string("an")]),
            on("banana", "indexOf", vec![string("an"), num(2.0)]),
            on("banana", "indexOf", vec![string("x")]),
            on("banana", "indexOf", vec![string("")]),
        ]),
        log(vec![
            on("banana", "includes", vec![string("nan")]),
            on("banana", "startsWith", vec![string("ban")]),
            on("banana", "startsWith", vec![string("nan"), num(2.0)]),
            on("banana", "endsWith", vec![string("ana")]),
            on("banana", "endsWith", vec![string("ban"), num(3.0)]),
        ]),
    ]);
    assert_eq!(lines, vec!["1 3 -1 0", "true true true true true"]);
}

// ═══════════════════════════════════════════════════════════════
// Extraction and transformation
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_slice_and_substring() {
    let lines = output(vec![log(vec![
        on("hello", "slice", vec![num(1.0), num(3.0)]),
        on("hello", "slice", vec![num(-3.0)]),
        on("hello", "slice", vec![num(3.0), num(1.0)]),
        on("hello", "substring", vec![num(3.0), num(1.0)]),
        on("hello", "substring", vec![num(-2.0), num(2.0)]),
    ])]);
    assert_eq!(lines, vec!["el llo  el he"]);
}

#[test]
fn test_split() {
    let lines = output(vec![
        log(vec![on("a,b,c", "split", vec![string(",")])]),
        log(vec![on("abc", "split", vec![string("")])]),
        log(vec![on("a,b,c", "split", vec![string(","), num(2.0)])]),
        log(vec![on("abc", "split", vec![])]),
        log(vec![on(",a,", "split", vec![string(",")])]),
    ]);
    assert_eq!(
        lines,
        vec![
            "[ 'a', 'b', 'c' ]",
            "[ 'a', 'b', 'c' ]",
            "[ 'a', 'b' ]",
            "[ 'abc' ]",
            "[ '', 'a', '' ]",
        ]
    );
}

#[test]
fn test_case_trim_repeat_concat() {
    let lines = output(vec![log(vec![
        on("MiXeD", "toUpperCase", vec![]),
        on("MiXeD", "toLowerCase", vec![]),
        binary(BinaryOp::Add, binary(BinaryOp::Add, string("["), on("  pad \n", "trim", vec![])), string("]")),
        on("ab", "repeat", vec![num(3.0)]),
        on("a", "concat", vec![num(1.0), null(), boolean(true)]),
    ])]);
    assert_eq!(lines, vec!["MIXED mixed [pad] ababab a1nulltrue"]);
}

#[test]
fn test_repeat_rejects_negative_count() {
    let message = thrown_message(vec![expr(on("x", "repeat", vec![num(-1.0)]))]);
    assert_eq!(message, "RangeError: Invalid count value: -1");
}

#[test]
fn test_methods_on_null_receiver() {
    let message = thrown_message(vec![expr(method(
        member(member(ident("String"), "prototype"), "trim"),
        "call",
        vec![null()],
    ))]);
    assert_eq!(
        message,
        "TypeError: String.prototype.trim called on null or undefined"
    );
}

// ═══════════════════════════════════════════════════════════════
// Conversion
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_string_conversion() {
    let lines = output(vec![
        log(vec![
            call(ident("String"), vec![num(12.5)]),
            call(ident("String"), vec![null()]),
            call(ident("String"), vec![array(vec![num(1.0), num(2.0)])]),
            call(ident("String"), vec![object(vec![])]),
        ]),
        log(vec![new(ident("String"), vec![string("ab")])]),
        log(vec![binary(BinaryOp::Add, num(1.0), string("2"))]),
    ]);
    assert_eq!(lines, vec!["12.5 null 1,2 [object Object]", "[String: 'ab']", "12"]);
}

#[test]
fn test_symbols_describe_but_do_not_coerce() {
    let lines = output(vec![
        const_("s", call(ident("Symbol"), vec![string("tag")])),
        log(vec![
            call(ident("String"), vec![ident("s")]),
            member(ident("s"), "description"),
            member(call(ident("Symbol"), vec![]), "description"),
        ]),
        log(vec![binary(
            BinaryOp::StrictEq,
            call(ident("Symbol"), vec![string("tag")]),
            ident("s"),
        )]),
    ]);
    assert_eq!(lines, vec!["Symbol(tag) tag undefined", "false"]);

    let message = thrown_message(vec![expr(binary(
        BinaryOp::Add,
        string("x"),
        call(ident("Symbol"), vec![]),
    ))]);
    assert_eq!(message, "TypeError: Cannot convert a Symbol value to a string");
}

#[test]
fn test_number_formatting() {
    let lines = output(vec![
        log(vec![
            method(num(3.14159), "toFixed", vec![num(2.0)]),
            method(num(255.0), "toString", vec![num(16.0)]),
            method(num(-5.0), "toString", vec![num(2.0)]),
            method(num(0.5), "toString", vec![num(2.0)]),
        ]),
        log(vec![
            num(1e21),
            num(0.1),
            binary(BinaryOp::Div, num(1.0), num(0.0)),
            num(-0.0),
        ]),
    ]);
    assert_eq!(lines, vec!["3.14 ff -101 0.1", "1e+21 0.1 Infinity -0"]);

    let message = thrown_message(vec![expr(method(num(1.0), "toString", vec![num(1.0)]))]);
    assert_eq!(message, "RangeError: toString() radix must be between 2 and 36");
}

#[test]
fn test_parse_int_and_parse_float() {
    let lines = output(vec![log(vec![
        call(ident("parseInt"), vec![string("  42px")]),
        call(ident("parseInt"), vec![string("0x1f")]),
        call(ident("parseInt"), vec![string("z"), num(36.0)]),
        call(ident("parseInt"), vec![string("abc")]),
        call(ident("parseFloat"), vec![string("3.5e2 rest")]),
    ])]);
    assert_eq!(lines, vec!["42 31 35 NaN 350"]);
}

#[test]
fn test_from_char_code_truncates_to_code_units() {
    let lines = output(vec![
        const_(
            "s",
            method(
                ident("String"),
                "fromCharCode",
                vec![num(72.0), string("105"), num(65_536.0 + 33.0)],
            ),
        ),
        log(vec![ident("s"), member(ident("s"), "length")]),
        log(vec![member(method(ident("String"), "fromCharCode", vec![]), "length")]),
    ]);
    assert_eq!(lines, vec!["Hi! 3", "0"]);
}

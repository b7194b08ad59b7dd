//! Tests for promise settlement, reaction ordering and unhandled rejections

use super::*;
use jsrun::ast::{BinaryOp, Expression, Statement};
use jsrun::builder::*;
use jsrun::{FaultKind, TaskId};

fn then(promise: Expression, handler: Expression) -> Expression {
    method(promise, "then", vec![handler])
}

fn catch(promise: Expression, handler: Expression) -> Expression {
    method(promise, "catch", vec![handler])
}

/// `() => console.log(text)`
fn logger(text: &str) -> Expression {
    arrow(&[], vec![log(vec![string(text)])])
}

fn resolved(value: Expression) -> Expression {
    method(ident("Promise"), "resolve", vec![value])
}

fn rejected(value: Expression) -> Expression {
    method(ident("Promise"), "reject", vec![value])
}

fn error(message: &str) -> Expression {
    new(ident("Error"), vec![string(message)])
}

/// `e => console.log(e.message)`
fn log_message() -> Expression {
    arrow(&["e"], vec![log(vec![member(ident("e"), "message")])])
}

fn new_promise(executor: Expression) -> Expression {
    new(ident("Promise"), vec![executor])
}

// ═══════════════════════════════════════════════════════════════
// Ordering
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_microtasks_run_before_timers() {
    let lines = output(vec![
        log(vec![string("sync 1")]),
        expr(call(ident("setTimeout"), vec![logger("timeout"), num(0.0)])),
        expr(then(resolved(undefined()), logger("then"))),
        expr(call(ident("queueMicrotask"), vec![logger("queued")])),
        log(vec![string("sync 2")]),
    ]);
    assert_eq!(lines, vec!["sync 1", "sync 2", "then", "queued", "timeout"]);
}

#[test]
fn test_then_chain_passes_values() {
    let lines = output(vec![expr(then(
        then(
            resolved(num(1.0)),
            arrow_expr(&["x"], binary(BinaryOp::Add, ident("x"), num(1.0))),
        ),
        arrow(&["x"], vec![log(vec![ident("x")])]),
    ))]);
    assert_eq!(lines, vec!["2"]);
}

#[test]
fn test_interleaved_chains() {
    let chain = |name: &str| -> Statement {
        expr(then(
            then(resolved(undefined()), logger(&format!("{name}1"))),
            logger(&format!("{name}2")),
        ))
    };
    let lines = output(vec![chain("a"), chain("b")]);
    assert_eq!(lines, vec!["a1", "b1", "a2", "b2"]);
}

#[test]
fn test_adopting_a_promise_takes_two_extra_ticks() {
    let lines = output(vec![
        const_("p", resolved(num(1.0))),
        expr(then(
            new_promise(arrow(&["r"], vec![expr(call(ident("r"), vec![ident("p")]))])),
            logger("adopted"),
        )),
        expr(then(
            then(then(ident("p"), logger("a")), logger("b")),
            logger("c"),
        )),
    ]);
    assert_eq!(lines, vec!["a", "b", "adopted", "c"]);
}

#[test]
fn test_microtasks_queued_by_timer_run_before_next_timer() {
    let lines = output(vec![
        expr(call(
            ident("setTimeout"),
            vec![
                arrow(
                    &[],
                    vec![
                        log(vec![string("timer 1")]),
                        expr(then(resolved(undefined()), logger("micro from timer 1"))),
                    ],
                ),
                num(0.0),
            ],
        )),
        expr(call(ident("setTimeout"), vec![logger("timer 2"), num(0.0)])),
    ]);
    assert_eq!(lines, vec!["timer 1", "micro from timer 1", "timer 2"]);
}

// ═══════════════════════════════════════════════════════════════
// Settlement
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_only_first_resolution_counts() {
    let lines = output(vec![expr(then(
        new_promise(arrow(
            &["resolve", "reject"],
            vec![
                expr(call(ident("resolve"), vec![num(1.0)])),
                expr(call(ident("reject"), vec![num(2.0)])),
                expr(call(ident("resolve"), vec![num(3.0)])),
            ],
        )),
        arrow(&["v"], vec![log(vec![ident("v")])]),
    ))]);
    assert_eq!(lines, vec!["1"]);
}

#[test]
fn test_executor_throw_rejects() {
    let lines = output(vec![expr(catch(
        new_promise(arrow(&[], vec![throw(error("boom"))])),
        log_message(),
    ))]);
    assert_eq!(lines, vec!["boom"]);
}

#[test]
fn test_executor_throw_after_resolve_is_ignored() {
    let lines = output(vec![expr(then(
        new_promise(arrow(
            &["resolve"],
            vec![
                expr(call(ident("resolve"), vec![string("ok")])),
                throw(error("ignored")),
            ],
        )),
        arrow(&["v"], vec![log(vec![ident("v")])]),
    ))]);
    assert_eq!(lines, vec!["ok"]);
}

#[test]
fn test_handler_throw_rejects_derived_promise() {
    let lines = output(vec![expr(catch(
        then(resolved(undefined()), arrow(&[], vec![throw(error("in handler"))])),
        log_message(),
    ))]);
    assert_eq!(lines, vec!["in handler"]);
}

#[test]
fn test_missing_handlers_pass_through() {
    let lines = output(vec![
        expr(then(
            method(resolved(num(7.0)), "then", vec![null()]),
            arrow(&["v"], vec![log(vec![ident("v")])]),
        )),
        expr(catch(
            then(rejected(string("r")), logger("skipped")),
            arrow(&["e"], vec![log(vec![string("caught"), ident("e")])]),
        )),
    ]);
    assert_eq!(lines, vec!["7", "caught r"]);
}

#[test]
fn test_thenable_objects_are_adopted() {
    let thenable = object(vec![(
        "then",
        func(
            None,
            &["resolve"],
            vec![expr(call(ident("resolve"), vec![num(42.0)]))],
        ),
    )]);
    let lines = output(vec![expr(then(
        resolved(thenable),
        arrow(&["v"], vec![log(vec![ident("v")])]),
    ))]);
    assert_eq!(lines, vec!["42"]);
}

#[test]
fn test_rejected_thenable_is_adopted() {
    let lines = output(vec![expr(catch(
        new_promise(arrow(
            &["r"],
            vec![expr(call(ident("r"), vec![rejected(error("inner"))]))],
        )),
        log_message(),
    ))]);
    assert_eq!(lines, vec!["inner"]);
}

#[test]
fn test_throwing_then_getter_rejects() {
    let hostile = object_with(vec![getter("then", vec![throw(error("getter"))])]);
    let lines = output(vec![expr(catch(resolved(hostile), log_message()))]);
    assert_eq!(lines, vec!["getter"]);
}

#[test]
fn test_self_resolution_is_type_error() {
    let lines = output(vec![
        let_uninit("resolveSelf"),
        const_(
            "p",
            new_promise(arrow(
                &["r"],
                vec![expr(assign("resolveSelf", ident("r")))],
            )),
        ),
        expr(call(ident("resolveSelf"), vec![ident("p")])),
        expr(catch(
            ident("p"),
            arrow(
                &["e"],
                vec![log(vec![member(ident("e"), "name"), member(ident("e"), "message")])],
            ),
        )),
    ]);
    assert_eq!(
        lines,
        vec!["TypeError Chaining cycle detected for promise #<Promise>"]
    );
}

#[test]
fn test_promise_requires_new_and_callable_executor() {
    let message = thrown_message(vec![expr(call(ident("Promise"), vec![logger("x")]))]);
    assert_eq!(
        message,
        "TypeError: Promise constructor cannot be invoked without 'new'"
    );

    let message = thrown_message(vec![expr(new_promise(num(1.0)))]);
    assert_eq!(message, "TypeError: Promise resolver 1 is not a function");
}

#[test]
fn test_resolve_passes_promises_through() {
    let lines = output(vec![
        const_("p", resolved(num(1.0))),
        log(vec![binary(BinaryOp::StrictEq, resolved(ident("p")), ident("p"))]),
    ]);
    assert_eq!(lines, vec!["true"]);
}

// ═══════════════════════════════════════════════════════════════
// finally
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_finally_keeps_fulfillment_value() {
    let lines = output(vec![expr(then(
        method(resolved(num(1.0)), "finally", vec![logger("fin")]),
        arrow(&["v"], vec![log(vec![ident("v")])]),
    ))]);
    assert_eq!(lines, vec!["fin", "1"]);
}

#[test]
fn test_finally_keeps_rejection_reason() {
    let lines = output(vec![expr(catch(
        method(rejected(error("kept")), "finally", vec![logger("fin")]),
        log_message(),
    ))]);
    assert_eq!(lines, vec!["fin", "kept"]);
}

#[test]
fn test_finally_throw_replaces_outcome() {
    let lines = output(vec![expr(catch(
        method(
            resolved(num(1.0)),
            "finally",
            vec![arrow(&[], vec![throw(error("replaced"))])],
        ),
        log_message(),
    ))]);
    assert_eq!(lines, vec!["replaced"]);
}

// ═══════════════════════════════════════════════════════════════
// Unhandled rejections and inspection
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_unhandled_rejection_is_reported() {
    let (report, lines) = run_script(vec![
        expr(rejected(error("nobody"))),
        log(vec![string("script done")]),
    ]);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].kind, FaultKind::UnhandledRejection);
    assert_eq!(report.faults[0].task, TaskId::from_u64(0));
    assert_eq!(report.faults[0].message, "Error: nobody");
    assert_eq!(
        lines,
        vec![
            "script done",
            "Unhandled promise rejection in task 0: Error: nobody"
        ]
    );
}

#[test]
fn test_rejection_handled_during_same_drain_is_not_reported() {
    let lines = output(vec![
        const_("p", rejected(num(1.0))),
        expr(then(
            resolved(undefined()),
            arrow(&[], vec![expr(catch(ident("p"), logger("late")))]),
        )),
    ]);
    assert_eq!(lines, vec!["late"]);
}

#[test]
fn test_rejection_in_timer_names_the_timer_task() {
    let (report, _) = run_script(vec![expr(call(
        ident("setTimeout"),
        vec![arrow(&[], vec![expr(rejected(num(5.0)))]), num(10.0)],
    ))]);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].kind, FaultKind::UnhandledRejection);
    assert_eq!(report.faults[0].task, TaskId::from_u64(1));
    assert_eq!(report.faults[0].message, "5");
}

#[test]
fn test_inspect_promise_states() {
    let lines = output(vec![
        log(vec![resolved(num(5.0))]),
        log(vec![new_promise(arrow(&[], vec![]))]),
        const_("r", rejected(num(3.0))),
        expr(catch(ident("r"), arrow(&[], vec![]))),
        log(vec![ident("r")]),
    ]);
    assert_eq!(
        lines,
        vec![
            "Promise { 5 }",
            "Promise { <pending> }",
            "Promise { <rejected> 3 }"
        ]
    );
}

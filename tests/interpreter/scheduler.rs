//! Tests for timers, task ordering and fault isolation in the event loop

use super::*;
use jsrun::ast::{BinaryOp, Expression, Statement, UnaryOp, VariableKind};
use jsrun::builder::*;
use jsrun::{BufferedConsole, ConsoleLevel, FaultKind, JsError, JsValue, RuntimeConfig, TaskId};

fn set_timeout(callback: Expression, delay: f64) -> Expression {
    call(ident("setTimeout"), vec![callback, num(delay)])
}

fn logger(text: &str) -> Expression {
    arrow(&[], vec![log(vec![string(text)])])
}

fn schedule_log(text: &str, delay: f64) -> Statement {
    expr(set_timeout(logger(text), delay))
}

// ═══════════════════════════════════════════════════════════════
// Ordering
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_timers_run_by_due_time_then_schedule_order() {
    let (report, lines) = run_script(vec![
        schedule_log("b", 10.0),
        schedule_log("a", 5.0),
        schedule_log("c", 5.0),
        schedule_log("zero", 0.0),
    ]);
    assert!(report.faults.is_empty());
    assert_eq!(lines, vec!["zero", "a", "c", "b"]);
    assert_eq!(report.elapsed_ms, 10);
}

#[test]
fn test_nested_timer_delay_is_relative_to_current_time() {
    let (report, lines) = run_script(vec![
        expr(set_timeout(
            arrow(
                &[],
                vec![log(vec![string("outer")]), schedule_log("inner", 5.0)],
            ),
            5.0,
        )),
        schedule_log("at 7", 7.0),
    ]);
    assert_eq!(lines, vec!["outer", "at 7", "inner"]);
    assert_eq!(report.elapsed_ms, 10);
}

#[test]
fn test_negative_and_nan_delays_run_immediately() {
    let lines = output(vec![
        schedule_log("later", 1.0),
        expr(call(ident("setTimeout"), vec![logger("nan"), ident("NaN")])),
        schedule_log("negative", -50.0),
    ]);
    assert_eq!(lines, vec!["nan", "negative", "later"]);
}

#[test]
fn test_extra_arguments_reach_callback() {
    let lines = output(vec![expr(call(
        ident("setTimeout"),
        vec![
            arrow(&["a", "b"], vec![log(vec![ident("a"), ident("b")])]),
            num(0.0),
            string("x"),
            num(2.0),
        ],
    ))]);
    assert_eq!(lines, vec!["x 2"]);
}

#[test]
fn test_timer_ids_are_distinct_numbers() {
    let lines = output(vec![
        const_("a", set_timeout(logger("a"), 0.0)),
        const_("b", set_timeout(logger("b"), 0.0)),
        log(vec![
            binary(BinaryOp::Gt, ident("b"), ident("a")),
            unary(UnaryOp::Typeof, ident("a")),
        ]),
    ]);
    assert_eq!(lines, vec!["true number", "a", "b"]);
}

// ═══════════════════════════════════════════════════════════════
// Cancellation
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_clear_timeout_before_it_runs() {
    let lines = output(vec![
        const_("id", set_timeout(logger("cancelled"), 5.0)),
        schedule_log("kept", 10.0),
        expr(call(ident("clearTimeout"), vec![ident("id")])),
        expr(call(ident("clearTimeout"), vec![string("not an id")])),
        expr(call(ident("clearTimeout"), vec![num(9999.0)])),
    ]);
    assert_eq!(lines, vec!["kept"]);
}

#[test]
fn test_timer_cancels_a_later_timer() {
    let lines = output(vec![
        let_uninit("second"),
        expr(set_timeout(
            arrow(
                &[],
                vec![
                    log(vec![string("first")]),
                    expr(call(ident("clearTimeout"), vec![ident("second")])),
                ],
            ),
            1.0,
        )),
        expr(assign("second", set_timeout(logger("second"), 2.0))),
    ]);
    assert_eq!(lines, vec!["first"]);
}

#[test]
fn test_interval_cancelled_from_its_own_callback() {
    let (report, lines) = run_script(vec![
        let_("count", num(0.0)),
        const_(
            "id",
            call(
                ident("setInterval"),
                vec![
                    arrow(
                        &[],
                        vec![
                            expr(increment("count")),
                            log(vec![string("tick"), ident("count")]),
                            if_(
                                binary(BinaryOp::StrictEq, ident("count"), num(3.0)),
                                expr(call(ident("clearInterval"), vec![ident("id")])),
                                None,
                            ),
                        ],
                    ),
                    num(10.0),
                ],
            ),
        ),
    ]);
    assert!(report.faults.is_empty());
    assert_eq!(lines, vec!["tick 1", "tick 2", "tick 3"]);
    assert_eq!(report.elapsed_ms, 30);
}

#[test]
fn test_interval_interleaves_with_timeouts() {
    let lines = output(vec![
        const_(
            "id",
            call(ident("setInterval"), vec![logger("tick"), num(4.0)]),
        ),
        schedule_log("t10", 10.0),
        expr(set_timeout(
            arrow(&[], vec![expr(call(ident("clearInterval"), vec![ident("id")]))]),
            13.0,
        )),
    ]);
    assert_eq!(lines, vec!["tick", "tick", "t10", "tick"]);
}

#[test]
fn test_non_callable_timer_callback() {
    let message = thrown_message(vec![expr(call(
        ident("setTimeout"),
        vec![string("code"), num(0.0)],
    ))]);
    assert_eq!(
        message,
        "TypeError: The \"callback\" argument must be of type function. Received 'code'"
    );
}

// ═══════════════════════════════════════════════════════════════
// Faults
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_throwing_timer_does_not_stop_the_loop() {
    let (report, lines) = run_script(vec![
        expr(set_timeout(
            arrow(&[], vec![throw(new(ident("Error"), vec![string("bad timer")]))]),
            1.0,
        )),
        schedule_log("next", 2.0),
    ]);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].kind, FaultKind::Macrotask);
    assert_eq!(report.faults[0].task, TaskId::from_u64(1));
    assert_eq!(report.faults[0].message, "Error: bad timer");
    assert_eq!(
        lines,
        vec!["Unhandled exception in task 1: Error: bad timer", "next"]
    );
}

#[test]
fn test_throwing_microtask_is_isolated() {
    let (report, lines) = run_script(vec![
        expr(call(
            ident("queueMicrotask"),
            vec![arrow(&[], vec![throw(string("micro"))])],
        )),
        expr(call(ident("queueMicrotask"), vec![logger("still drained")])),
    ]);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].kind, FaultKind::Microtask);
    assert_eq!(
        lines,
        vec!["Unhandled exception in task 1: micro", "still drained"]
    );
}

#[test]
fn test_timeout_aborts_task_and_is_not_catchable() {
    let config = RuntimeConfig {
        timeout_ms: 50,
        ..RuntimeConfig::default()
    };
    let (report, lines) = run_script_on(
        create_test_runtime_with(config),
        vec![
            schedule_log("timer still runs", 0.0),
            try_(
                vec![while_(boolean(true), block(vec![]))],
                Some((None, vec![log(vec![string("caught")])])),
                Some(vec![log(vec![string("finally")])]),
            ),
        ],
    );
    assert_eq!(report.completion, None);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].kind, FaultKind::Script);
    assert_eq!(report.faults[0].message, "Timeout: execution exceeded 50ms");
    assert_eq!(
        lines,
        vec![
            "Unhandled exception in task 0: Timeout: execution exceeded 50ms",
            "timer still runs"
        ]
    );
}

#[test]
fn test_timeout_in_iterator_close_is_not_swallowed() {
    let config = RuntimeConfig {
        timeout_ms: 50,
        ..RuntimeConfig::default()
    };
    let stuck_iterable = object_with(vec![computed_prop(
        member(ident("Symbol"), "iterator"),
        arrow_expr(
            &[],
            object(vec![
                (
                    "next",
                    arrow_expr(
                        &[],
                        object(vec![("value", num(1.0)), ("done", boolean(false))]),
                    ),
                ),
                ("return", arrow(&[], vec![while_(boolean(true), block(vec![]))])),
            ]),
        ),
    )]);
    let (report, lines) = run_script_on(
        create_test_runtime_with(config),
        vec![try_catch(
            vec![for_of(
                Some(VariableKind::Const),
                "v",
                stuck_iterable,
                throw(string("stop")),
            )],
            "e",
            vec![log(vec![string("caught"), ident("e")])],
        )],
    );
    assert_eq!(report.completion, None);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].message, "Timeout: execution exceeded 50ms");
    assert_eq!(
        lines,
        vec!["Unhandled exception in task 0: Timeout: execution exceeded 50ms"]
    );
}

fn huge_sparse_array(name: &str) -> Vec<Statement> {
    vec![
        const_(name, array(vec![])),
        expr(assign(dot(ident(name), "length"), num(4_294_967_295.0))),
        expr(assign(at(ident(name), num(4_000_000_000.0)), string("far"))),
    ]
}

#[test]
fn test_sparse_array_traversal_skips_hole_runs() {
    let config = RuntimeConfig {
        timeout_ms: 1_000,
        ..RuntimeConfig::default()
    };
    let mut body = huge_sparse_array("a");
    body.extend([
        for_of(
            Some(VariableKind::Const),
            "x",
            ident("a"),
            log(vec![ident("x")]),
        ),
        expr(method(
            ident("a"),
            "forEach",
            vec![arrow(&["v", "i"], vec![log(vec![ident("i")])])],
        )),
        log(vec![method(ident("a"), "indexOf", vec![string("far")])]),
        log(vec![method(
            call(
                index(ident("a"), member(ident("Symbol"), "iterator")),
                vec![],
            ),
            "next",
            vec![],
        )]),
    ]);
    let (report, lines) = run_script_on(create_test_runtime_with(config), body);
    assert!(report.faults.is_empty(), "{:?}", report.faults);
    assert_eq!(
        lines,
        vec![
            "far",
            "4000000000",
            "4000000000",
            "{ value: 'far', done: false }"
        ]
    );
}

#[test]
fn test_timeout_interrupts_dense_walk_over_holes() {
    let config = RuntimeConfig {
        timeout_ms: 50,
        ..RuntimeConfig::default()
    };
    let mut body = huge_sparse_array("a");
    body.push(expr(method(ident("a"), "join", vec![])));
    let (report, _) = run_script_on(create_test_runtime_with(config), body);
    assert_eq!(report.completion, None);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].message, "Timeout: execution exceeded 50ms");
}

#[test]
fn test_min_timer_delay_clamps_delays() {
    let config = RuntimeConfig {
        min_timer_delay_ms: 4,
        ..RuntimeConfig::default()
    };
    let (report, _) = run_script_on(
        create_test_runtime_with(config),
        vec![schedule_log("clamped", 0.0)],
    );
    assert_eq!(report.elapsed_ms, 4);
}

// ═══════════════════════════════════════════════════════════════
// Host tasks
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_host_tasks_share_the_queues() {
    let mut runtime = create_test_runtime();
    let console = BufferedConsole::new();
    runtime.set_console(Box::new(console.clone()));

    runtime.schedule_macrotask(
        |interp| {
            interp.emit(ConsoleLevel::Log, &[JsValue::from("host timer")]);
            Ok(())
        },
        3,
    );
    runtime.schedule_microtask(|interp| {
        interp.emit(ConsoleLevel::Log, &[JsValue::from("host micro")]);
        Ok(())
    });

    let report = runtime.run(&program(vec![
        schedule_log("script timer", 5.0),
        log(vec![string("script")]),
    ]));
    assert!(report.faults.is_empty());
    assert_eq!(
        console.lines(),
        vec!["script", "host micro", "host timer", "script timer"]
    );
}

#[test]
fn test_run_next_macrotask_steps_one_timer() {
    let mut runtime = create_test_runtime();
    let console = BufferedConsole::new();
    runtime.set_console(Box::new(console.clone()));

    let signal = runtime.evaluate(&program(vec![
        schedule_log("one", 1.0),
        schedule_log("two", 2.0),
    ]));
    assert!(signal.is_ok());
    let interp = runtime.interpreter_mut();
    interp.run_microtasks();
    assert!(interp.run_next_macrotask());
    assert_eq!(console.lines(), vec!["one"]);
    assert_eq!(interp.now(), 1);
    assert!(interp.has_pending_tasks());
    assert!(interp.run_next_macrotask());
    assert!(!interp.run_next_macrotask());
    assert_eq!(console.lines(), vec!["one", "two"]);
}

#[test]
fn test_host_macrotask_error_is_reported() {
    let mut runtime = create_test_runtime();
    let console = BufferedConsole::new();
    runtime.set_console(Box::new(console.clone()));
    let id = runtime.schedule_macrotask(
        |_| Err(JsError::type_error("host failure")),
        0,
    );
    let faults = runtime.run_event_loop();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].task, id);
    assert_eq!(faults[0].message, "TypeError: host failure");
}

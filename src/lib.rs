//! Execution core for a prototype-based scripting runtime
//!
//! The crate evaluates statement trees (built with [`builder`] or by an
//! external front end) against an arena heap of objects and scope frames,
//! and drives deferred work through a microtask/macrotask [`Scheduler`].
//!
//! # Example
//!
//! ```
//! use jsrun::builder::*;
//! use jsrun::{BufferedConsole, Runtime};
//!
//! let console = BufferedConsole::new();
//! let mut runtime = Runtime::new();
//! runtime.set_console(Box::new(console.clone()));
//!
//! let report = runtime.run(&program(vec![
//!     expr(call(
//!         ident("setTimeout"),
//!         vec![arrow(&[], vec![log(vec![string("timer")])]), num(0.0)],
//!     )),
//!     log(vec![string("script")]),
//! ]));
//!
//! assert!(report.faults.is_empty());
//! assert_eq!(console.lines(), vec!["script", "timer"]);
//! ```

pub mod array;
pub mod ast;
pub mod builder;
pub mod completion;
pub mod config;
pub mod error;
pub mod heap;
pub mod interpreter;
pub mod iterator;
pub mod object;
pub mod platform;
pub mod property;
pub mod scheduler;
pub mod scope;
pub mod value;

pub use completion::{Completion, ControlSignal};
pub use config::RuntimeConfig;
pub use error::{BindingError, ErrorKind, JsError};
pub use interpreter::{FaultKind, Interpreter, MacroTask, TaskFault};
pub use platform::{BufferedConsole, ConsoleLevel, ConsoleProvider, PatternMatch, PatternMatcher};
pub use property::{Property, PropertyDescriptor, PropertyStore};
pub use scheduler::{Scheduler, TaskId};
pub use value::{CheapClone, JsString, JsSymbol, JsValue, ObjectId, PropertyKey};

use std::rc::Rc;

use ast::Program;

/// Outcome of [`Runtime::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// How the script body itself finished; `None` when a host-level error
    /// (timeout, internal failure) aborted it.
    pub completion: Option<ControlSignal>,
    /// Faults from the script and every task that ran afterwards.
    pub faults: Vec<TaskFault>,
    /// Virtual time when the event loop went idle.
    pub elapsed_ms: u64,
}

/// Script plus event loop: the embedding entry point
pub struct Runtime {
    interpreter: Interpreter,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            interpreter: Interpreter::with_config(config),
        }
    }

    /// Evaluate `program` as task 0, then run queued microtasks and timers
    /// until nothing is left.
    ///
    /// A throw escaping the script is reported like any other task fault
    /// and does not stop already scheduled tasks from running.
    pub fn run(&mut self, program: &Program) -> RunReport {
        let script_task = TaskId::from_u64(0);
        self.interpreter.begin_task(script_task);
        let completion = match self.interpreter.evaluate_program(program) {
            Ok(ControlSignal::Throw(value)) => {
                self.interpreter.report_fault(
                    script_task,
                    FaultKind::Script,
                    &JsError::Thrown(value.clone()),
                );
                Some(ControlSignal::Throw(value))
            }
            Ok(signal) => Some(signal),
            Err(err) => {
                self.interpreter
                    .report_fault(script_task, FaultKind::Script, &err);
                None
            }
        };
        self.interpreter.run_event_loop();
        RunReport {
            completion,
            faults: self.interpreter.take_faults(),
            elapsed_ms: self.interpreter.now(),
        }
    }

    /// Evaluate `program` without draining the task queues.
    pub fn evaluate(&mut self, program: &Program) -> Result<ControlSignal, JsError> {
        self.interpreter.begin_task(TaskId::from_u64(0));
        self.interpreter.evaluate_program(program)
    }

    /// Drain queued work; see [`Interpreter::run_event_loop`].
    pub fn run_event_loop(&mut self) -> Vec<TaskFault> {
        self.interpreter.run_event_loop();
        self.interpreter.take_faults()
    }

    /// Schedule host code as a macrotask `delay_ms` from now.
    pub fn schedule_macrotask(
        &mut self,
        callback: impl Fn(&mut Interpreter) -> Result<(), JsError> + 'static,
        delay_ms: u64,
    ) -> TaskId {
        self.interpreter
            .schedule_macrotask(MacroTask::Host(Rc::new(callback)), delay_ms)
    }

    /// Schedule host code as a microtask.
    pub fn schedule_microtask(
        &mut self,
        callback: impl FnOnce(&mut Interpreter) -> Result<(), JsError> + 'static,
    ) -> TaskId {
        self.interpreter.schedule_host_microtask(callback)
    }

    /// Cancel a pending macrotask. Has no effect once it started running.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.interpreter.cancel(id)
    }

    /// Replace the console sink, returning the previous one.
    pub fn set_console(&mut self, console: Box<dyn ConsoleProvider>) -> Box<dyn ConsoleProvider> {
        self.interpreter.set_console(console)
    }

    pub fn set_pattern_matcher(&mut self, matcher: Box<dyn PatternMatcher>) {
        self.interpreter.set_pattern_matcher(matcher);
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

//! Task execution on top of the [`Scheduler`](crate::scheduler::Scheduler)
//!
//! Microtasks carry [`Job`]s (promise reactions, thenable adoption, queued
//! callbacks); macrotasks carry [`MacroTask`]s (timer callbacks). A task that
//! throws is reported as a [`TaskFault`] and the loop carries on with the
//! next task.

use std::fmt;
use std::rc::Rc;

use crate::error::JsError;
use crate::object::{ObjectKind, PromiseReaction};
use crate::platform::ConsoleLevel;
use crate::scheduler::{ReadyTask, TaskId};
use crate::value::{JsValue, ObjectId};

use super::{Interpreter, builtins};

/// One-shot host work queued as a microtask.
pub type HostCallback = Box<dyn FnOnce(&mut Interpreter) -> Result<(), JsError>>;

/// Host work run as a macrotask. Shared so intervals can run it repeatedly.
pub type HostTimer = Rc<dyn Fn(&mut Interpreter) -> Result<(), JsError>>;

/// Microtask payload
pub enum Job {
    /// Run a promise reaction with the settlement value.
    Reaction {
        reaction: PromiseReaction,
        argument: JsValue,
    },
    /// Adopt the state of a thenable by calling its `then`.
    ResolveThenable {
        promise: ObjectId,
        thenable: JsValue,
        then: JsValue,
    },
    /// `queueMicrotask(callback)`
    Callback { callback: JsValue, args: Vec<JsValue> },
    Host(HostCallback),
}

impl Job {
    /// Heap values this job keeps alive while queued.
    pub(crate) fn trace_roots(&self, roots: &mut Vec<JsValue>) {
        match self {
            Job::Reaction { reaction, argument } => {
                roots.push(argument.clone());
                roots.extend(reaction.handler.iter().cloned());
                roots.extend(reaction.capability.map(JsValue::Object));
            }
            Job::ResolveThenable {
                promise,
                thenable,
                then,
            } => {
                roots.push(JsValue::Object(*promise));
                roots.push(thenable.clone());
                roots.push(then.clone());
            }
            Job::Callback { callback, args } => {
                roots.push(callback.clone());
                roots.extend(args.iter().cloned());
            }
            Job::Host(_) => {}
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Reaction { reaction, .. } => write!(f, "Job::Reaction({:?})", reaction.kind),
            Job::ResolveThenable { promise, .. } => write!(f, "Job::ResolveThenable({promise:?})"),
            Job::Callback { .. } => f.write_str("Job::Callback"),
            Job::Host(_) => f.write_str("Job::Host"),
        }
    }
}

/// Macrotask payload
#[derive(Clone)]
pub enum MacroTask {
    /// `setTimeout` / `setInterval` callback with its extra arguments.
    Callback { callback: JsValue, args: Vec<JsValue> },
    Host(HostTimer),
}

impl MacroTask {
    pub(crate) fn trace_roots(&self, roots: &mut Vec<JsValue>) {
        if let MacroTask::Callback { callback, args } = self {
            roots.push(callback.clone());
            roots.extend(args.iter().cloned());
        }
    }
}

impl fmt::Debug for MacroTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroTask::Callback { .. } => f.write_str("MacroTask::Callback"),
            MacroTask::Host(_) => f.write_str("MacroTask::Host"),
        }
    }
}

/// Where an unhandled fault happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The top-level script body
    Script,
    Microtask,
    Macrotask,
    /// A promise rejected with nobody listening
    UnhandledRejection,
}

/// An error that escaped a task. The script counts as task 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFault {
    pub task: TaskId,
    pub kind: FaultKind,
    pub message: String,
}

impl Interpreter {
    // ═══════════════════════════════════════════════════════════════
    // Scheduling
    // ═══════════════════════════════════════════════════════════════

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub(crate) fn enqueue_job(&mut self, job: Job) -> TaskId {
        self.scheduler.enqueue_microtask(job)
    }

    /// Queue a script callback as a microtask.
    pub fn schedule_microtask(&mut self, callback: JsValue, args: Vec<JsValue>) -> TaskId {
        self.enqueue_job(Job::Callback { callback, args })
    }

    pub fn schedule_host_microtask(
        &mut self,
        job: impl FnOnce(&mut Interpreter) -> Result<(), JsError> + 'static,
    ) -> TaskId {
        self.enqueue_job(Job::Host(Box::new(job)))
    }

    /// Run `task` once, `delay_ms` from now.
    pub fn schedule_macrotask(&mut self, task: MacroTask, delay_ms: u64) -> TaskId {
        let delay = delay_ms.max(self.config.min_timer_delay_ms);
        self.scheduler.schedule(task, delay, None)
    }

    /// Run `task` every `period_ms` until cancelled.
    pub fn schedule_interval(&mut self, task: MacroTask, period_ms: u64) -> TaskId {
        let period = period_ms.max(self.config.min_timer_delay_ms).max(1);
        self.scheduler.schedule(task, period, Some(period))
    }

    /// Cancel a pending task. Unknown or finished ids are ignored.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.scheduler.cancel(id)
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.scheduler.is_idle()
    }

    pub fn faults(&self) -> &[TaskFault] {
        &self.faults
    }

    pub fn take_faults(&mut self) -> Vec<TaskFault> {
        std::mem::take(&mut self.faults)
    }

    // ═══════════════════════════════════════════════════════════════
    // Running
    // ═══════════════════════════════════════════════════════════════

    /// Run every queued microtask, including ones queued while draining,
    /// then report promises that were rejected without a handler.
    pub fn run_microtasks(&mut self) {
        while let Some((id, job)) = self.scheduler.pop_microtask() {
            self.begin_task(id);
            tracing::trace!(task = %id, ?job, "running microtask");
            if let Err(err) = self.run_job(job) {
                self.report_fault(id, FaultKind::Microtask, &err);
            }
        }
        self.report_unhandled_rejections();
    }

    fn run_job(&mut self, job: Job) -> Result<(), JsError> {
        match job {
            Job::Reaction { reaction, argument } => {
                builtins::promise::run_reaction(self, reaction, argument)
            }
            Job::ResolveThenable {
                promise,
                thenable,
                then,
            } => builtins::promise::resolve_thenable(self, promise, thenable, then),
            Job::Callback { callback, args } => {
                self.call_function(&callback, JsValue::Undefined, &args)?;
                Ok(())
            }
            Job::Host(job) => job(self),
        }
    }

    /// Run the event loop until no work is left.
    ///
    /// Each macrotask is followed by a full microtask drain; collections run
    /// between tasks once the allocation threshold is reached.
    pub fn run_event_loop(&mut self) {
        self.run_microtasks();
        self.maybe_collect_garbage();
        while let Some(task) = self.scheduler.next_macrotask() {
            self.run_macrotask(&task);
            self.scheduler.finish_macrotask(task);
            self.run_microtasks();
            self.maybe_collect_garbage();
        }
        tracing::debug!(time = self.now(), "event loop idle");
    }

    /// Run a single ready macrotask and drain the microtasks it queued.
    /// Returns `false` when nothing is scheduled.
    pub fn run_next_macrotask(&mut self) -> bool {
        let Some(task) = self.scheduler.next_macrotask() else {
            return false;
        };
        self.run_macrotask(&task);
        self.scheduler.finish_macrotask(task);
        self.run_microtasks();
        true
    }

    fn run_macrotask(&mut self, task: &ReadyTask<MacroTask>) {
        self.begin_task(task.id);
        tracing::trace!(task = %task.id, time = self.now(), "running macrotask");
        let result = match &task.payload {
            MacroTask::Callback { callback, args } => self
                .call_function(callback, JsValue::Undefined, args)
                .map(|_| ()),
            MacroTask::Host(host) => host(self),
        };
        if let Err(err) = result {
            self.report_fault(task.id, FaultKind::Macrotask, &err);
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Faults
    // ═══════════════════════════════════════════════════════════════

    /// Record an error that escaped a task and print it on the console.
    pub(crate) fn report_fault(&mut self, task: TaskId, kind: FaultKind, err: &JsError) {
        let message = self.describe_error(err);
        tracing::error!(task = %task, ?kind, %message, "unhandled exception");
        self.write_console(
            ConsoleLevel::Error,
            &format!("Unhandled exception in task {task}: {message}"),
        );
        self.faults.push(TaskFault {
            task,
            kind,
            message,
        });
    }

    pub(crate) fn track_rejection(&mut self, promise: ObjectId) {
        let task = self.current_task();
        self.pending_rejections.push((promise, task));
    }

    fn report_unhandled_rejections(&mut self) {
        for (promise, task) in std::mem::take(&mut self.pending_rejections) {
            let reason = match self.heap.object(promise).map(|r| &r.kind) {
                Ok(ObjectKind::Promise(state)) if !state.handled => state.result.clone(),
                _ => continue,
            };
            let message = self.display(&reason);
            tracing::warn!(task = %task, %message, "unhandled promise rejection");
            self.write_console(
                ConsoleLevel::Error,
                &format!("Unhandled promise rejection in task {task}: {message}"),
            );
            self.faults.push(TaskFault {
                task,
                kind: FaultKind::UnhandledRejection,
                message,
            });
        }
    }
}

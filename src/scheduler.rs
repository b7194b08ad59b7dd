//! Two-tier task scheduler
//!
//! Microtasks run FIFO. Macrotasks (timers) sit in a min-heap keyed by
//! `(due time, registration sequence)` over a virtual millisecond clock:
//! popping a timer advances the clock to its due time, so nothing ever
//! sleeps. The scheduler only orders payloads; running them and draining
//! microtasks between macrotasks is the interpreter's event loop.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;

use rustc_hash::FxHashMap;

/// Identifier handed out for every scheduled task, in scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(id: u64) -> Self {
        TaskId(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Microtask,
    Macrotask,
}

/// A timer ready to run, returned by [`Scheduler::next_macrotask`].
#[derive(Debug)]
pub struct ReadyTask<T> {
    pub id: TaskId,
    pub payload: T,
    /// Repeat period for intervals.
    pub interval: Option<u64>,
}

#[derive(Debug)]
struct TimerEntry<T> {
    payload: T,
    interval: Option<u64>,
    cancelled: bool,
}

/// Heap key: due time first, then registration order.
type TimerKey = Reverse<(u64, u64, TaskId)>;

#[derive(Debug)]
pub struct Scheduler<M, T> {
    microtasks: VecDeque<(TaskId, M)>,
    timer_heap: BinaryHeap<TimerKey>,
    timers: FxHashMap<TaskId, TimerEntry<T>>,
    next_id: u64,
    next_seq: u64,
    now: u64,
    /// Timer currently executing, so it can cancel itself.
    running: Option<TaskId>,
    running_cancelled: bool,
}

impl<M, T> Default for Scheduler<M, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, T> Scheduler<M, T> {
    pub fn new() -> Self {
        Self {
            microtasks: VecDeque::new(),
            timer_heap: BinaryHeap::new(),
            timers: FxHashMap::default(),
            next_id: 1,
            next_seq: 0,
            now: 0,
            running: None,
            running_cancelled: false,
        }
    }

    fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push_timer(&mut self, id: TaskId, due: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timer_heap.push(Reverse((due, seq, id)));
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn enqueue_microtask(&mut self, payload: M) -> TaskId {
        let id = self.allocate_id();
        tracing::trace!(task = id.0, "microtask queued");
        self.microtasks.push_back((id, payload));
        id
    }

    /// Register a timer due `delay_ms` after the current virtual time.
    /// With `interval` set it is re-registered after every run.
    pub fn schedule(&mut self, payload: T, delay_ms: u64, interval: Option<u64>) -> TaskId {
        let id = self.allocate_id();
        let due = self.now.saturating_add(delay_ms);
        tracing::trace!(task = id.0, due, "macrotask scheduled");
        self.timers.insert(
            id,
            TimerEntry {
                payload,
                interval,
                cancelled: false,
            },
        );
        self.push_timer(id, due);
        id
    }

    /// Cancel a pending timer, or a running interval so it is not re-armed.
    /// Returns `false` for unknown or already finished tasks.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(entry) = self.timers.get_mut(&id) {
            entry.cancelled = true;
            return true;
        }
        if self.running == Some(id) {
            self.running_cancelled = true;
            return true;
        }
        false
    }

    pub fn pop_microtask(&mut self) -> Option<(TaskId, M)> {
        self.microtasks.pop_front()
    }

    pub fn has_microtasks(&self) -> bool {
        !self.microtasks.is_empty()
    }

    /// Live (non-cancelled) timers still waiting.
    pub fn pending_macrotasks(&self) -> usize {
        self.timers.values().filter(|t| !t.cancelled).count()
    }

    pub fn is_idle(&self) -> bool {
        self.microtasks.is_empty() && self.pending_macrotasks() == 0
    }

    /// Dequeue the earliest due timer, skipping cancelled ones, and advance
    /// the clock to its due time.
    pub fn next_macrotask(&mut self) -> Option<ReadyTask<T>> {
        while let Some(Reverse((due, _, id))) = self.timer_heap.pop() {
            let Some(entry) = self.timers.remove(&id) else {
                continue;
            };
            if entry.cancelled {
                tracing::debug!(task = id.0, "skipping cancelled macrotask");
                continue;
            }
            self.now = self.now.max(due);
            self.running = Some(id);
            self.running_cancelled = false;
            return Some(ReadyTask {
                id,
                payload: entry.payload,
                interval: entry.interval,
            });
        }
        None
    }

    /// Finish the running timer. Intervals hand their payload back to be
    /// re-armed unless they were cancelled while running.
    pub fn finish_macrotask(&mut self, task: ReadyTask<T>) {
        let cancelled = self.running == Some(task.id) && self.running_cancelled;
        self.running = None;
        self.running_cancelled = false;
        let Some(interval) = task.interval else {
            return;
        };
        if cancelled {
            tracing::debug!(task = task.id.0, "interval cancelled while running");
            return;
        }
        self.timers.insert(
            task.id,
            TimerEntry {
                payload: task.payload,
                interval: Some(interval),
                cancelled: false,
            },
        );
        let due = self.now.saturating_add(interval);
        self.push_timer(task.id, due);
    }

    pub fn microtask_payloads(&self) -> impl Iterator<Item = &M> {
        self.microtasks.iter().map(|(_, m)| m)
    }

    pub fn macrotask_payloads(&self) -> impl Iterator<Item = &T> {
        self.timers.values().map(|t| &t.payload)
    }
}

//! Control-flow signals
//!
//! Statement evaluation returns `Result<Completion, JsError>`. The `Err` arm
//! is the throwing state, so `?` propagates exceptions through every
//! construct that does not catch them. `ControlSignal` is the flattened
//! form handed back to hosts.

use crate::value::{JsString, JsValue};

/// Completion record for statement execution
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal(JsValue),
    Return(JsValue),
    Break(Option<JsString>),
    Continue(Option<JsString>),
}

impl Completion {
    pub fn normal() -> Self {
        Completion::Normal(JsValue::Undefined)
    }

    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }
}

/// Signal observed at the evaluator boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSignal {
    Normal(JsValue),
    Return(JsValue),
    Break(Option<JsString>),
    Continue(Option<JsString>),
    Throw(JsValue),
}

impl ControlSignal {
    /// The completion value for `Normal`/`Return`, nothing otherwise.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            ControlSignal::Normal(v) | ControlSignal::Return(v) => Some(v),
            ControlSignal::Break(_) | ControlSignal::Continue(_) | ControlSignal::Throw(_) => None,
        }
    }

    pub fn is_throw(&self) -> bool {
        matches!(self, ControlSignal::Throw(_))
    }
}

impl From<Completion> for ControlSignal {
    fn from(completion: Completion) -> Self {
        match completion {
            Completion::Normal(v) => ControlSignal::Normal(v),
            Completion::Return(v) => ControlSignal::Return(v),
            Completion::Break(l) => ControlSignal::Break(l),
            Completion::Continue(l) => ControlSignal::Continue(l),
        }
    }
}

/// What a loop does with the completion of one body run
#[derive(Debug, PartialEq)]
pub enum LoopAction {
    /// Proceed to the next iteration.
    Next,
    /// Leave the loop normally.
    Exit,
    /// Leave the loop and hand the completion to the enclosing construct.
    Propagate(Completion),
}

/// Decide how a loop carrying `labels` reacts to a body completion.
///
/// Unlabelled break/continue always target the innermost loop; labelled
/// ones only when the label belongs to this loop.
pub fn loop_action(completion: Completion, labels: &[JsString]) -> LoopAction {
    match completion {
        Completion::Normal(_) => LoopAction::Next,
        Completion::Break(None) => LoopAction::Exit,
        Completion::Continue(None) => LoopAction::Next,
        Completion::Break(Some(ref label)) if labels.contains(label) => LoopAction::Exit,
        Completion::Continue(Some(ref label)) if labels.contains(label) => LoopAction::Next,
        other => LoopAction::Propagate(other),
    }
}

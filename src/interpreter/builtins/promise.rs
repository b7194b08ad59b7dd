//! Promise built-in methods
//!
//! A promise settles once. Reactions never run synchronously: settling (or
//! calling `then` on a settled promise) queues one [`Job::Reaction`] per
//! registered reaction, and resolving with a thenable queues a
//! [`Job::ResolveThenable`] that calls its `then` from a fresh microtask.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{ErrorKind, JsError};
use crate::interpreter::{Interpreter, Job};
use crate::object::{
    FunctionKind, ObjectKind, ObjectRecord, PromiseReaction, PromiseState, PromiseStatus,
    ReactionKind,
};
use crate::value::{JsValue, ObjectId};

use super::arg;

/// Initialize Promise.prototype and the Promise constructor
pub fn init_promise(interp: &mut Interpreter) {
    let proto = interp.intrinsics.promise_prototype;

    interp.register_method(proto, "then", promise_then, 2);
    interp.register_method(proto, "catch", promise_catch, 1);
    interp.register_method(proto, "finally", promise_finally, 1);

    let ctor = interp.create_constructor("Promise", promise_constructor, 1, proto);
    interp.register_method(ctor, "resolve", promise_resolve_static, 1);
    interp.register_method(ctor, "reject", promise_reject_static, 1);

    interp.define_global("Promise", JsValue::Object(ctor));
}

/// `new Promise(executor)`
pub fn promise_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let Some(promise) = interp.new_target() else {
        return Err(JsError::type_error(
            "Promise constructor cannot be invoked without 'new'",
        ));
    };
    let executor = arg(args, 0);
    if !interp.is_callable(&executor) {
        return Err(JsError::type_error(format!(
            "Promise resolver {} is not a function",
            interp.inspect(&executor)
        )));
    }
    interp.heap.object_mut(promise)?.kind = ObjectKind::Promise(PromiseState::new());

    let (resolve, reject, already_resolved) = create_resolving_functions(interp, promise);
    if let Err(err) = interp.call_function(&executor, JsValue::Undefined, &[resolve, reject]) {
        let reason = interp.error_to_value(err)?;
        if !already_resolved.replace(true) {
            reject_promise(interp, promise, reason)?;
        }
    }
    Ok(JsValue::Object(promise))
}

/// The `resolve`/`reject` pair for `promise`, sharing one "already
/// resolved" flag.
pub fn create_resolving_functions(
    interp: &mut Interpreter,
    promise: ObjectId,
) -> (JsValue, JsValue, Rc<Cell<bool>>) {
    let already_resolved = Rc::new(Cell::new(false));
    let mut resolver = |reject: bool| {
        JsValue::Object(interp.heap.alloc(ObjectRecord::new(
            Some(interp.intrinsics.function_prototype),
            ObjectKind::Function(FunctionKind::PromiseResolver {
                promise,
                already_resolved: Rc::clone(&already_resolved),
                reject,
            }),
        )))
    };
    let resolve = resolver(false);
    let reject = resolver(true);
    (resolve, reject, already_resolved)
}

/// Body of a resolving function. Only the first call of the pair counts.
pub fn run_resolver(
    interp: &mut Interpreter,
    promise: ObjectId,
    already_resolved: &Cell<bool>,
    reject: bool,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    if already_resolved.replace(true) {
        return Ok(JsValue::Undefined);
    }
    let value = arg(args, 0);
    if reject {
        reject_promise(interp, promise, value)?;
    } else {
        resolve_promise(interp, promise, value)?;
    }
    Ok(JsValue::Undefined)
}

/// Resolve `promise` with `resolution`, adopting thenables.
pub fn resolve_promise(
    interp: &mut Interpreter,
    promise: ObjectId,
    resolution: JsValue,
) -> Result<(), JsError> {
    if resolution == JsValue::Object(promise) {
        let error = interp.create_error(
            ErrorKind::TypeError,
            "Chaining cycle detected for promise #<Promise>",
        );
        return reject_promise(interp, promise, JsValue::Object(error));
    }
    if !matches!(resolution, JsValue::Object(_)) {
        return fulfill_promise(interp, promise, resolution);
    }
    let then = match interp.get_named(&resolution, "then") {
        Ok(then) => then,
        Err(err) => {
            let reason = interp.error_to_value(err)?;
            return reject_promise(interp, promise, reason);
        }
    };
    if interp.is_callable(&then) {
        interp.enqueue_job(Job::ResolveThenable {
            promise,
            thenable: resolution,
            then,
        });
        return Ok(());
    }
    fulfill_promise(interp, promise, resolution)
}

pub fn fulfill_promise(
    interp: &mut Interpreter,
    promise: ObjectId,
    value: JsValue,
) -> Result<(), JsError> {
    settle(interp, promise, PromiseStatus::Fulfilled, value)
}

/// Reject `promise`. A rejection nobody handles by the end of the current
/// microtask drain is reported as a fault.
pub fn reject_promise(
    interp: &mut Interpreter,
    promise: ObjectId,
    reason: JsValue,
) -> Result<(), JsError> {
    settle(interp, promise, PromiseStatus::Rejected, reason)
}

fn settle(
    interp: &mut Interpreter,
    promise: ObjectId,
    status: PromiseStatus,
    value: JsValue,
) -> Result<(), JsError> {
    let (reactions, handled) = {
        let state = promise_state(interp, promise)?;
        if state.status != PromiseStatus::Pending {
            return Ok(());
        }
        state.status = status;
        state.result = value.clone();
        let fulfill = std::mem::take(&mut state.fulfill_reactions);
        let reject = std::mem::take(&mut state.reject_reactions);
        let reactions = if status == PromiseStatus::Fulfilled { fulfill } else { reject };
        (reactions, state.handled)
    };
    tracing::trace!(?promise, ?status, reactions = reactions.len(), "promise settled");
    for reaction in reactions {
        interp.enqueue_job(Job::Reaction {
            reaction,
            argument: value.clone(),
        });
    }
    if status == PromiseStatus::Rejected && !handled {
        interp.track_rejection(promise);
    }
    Ok(())
}

fn promise_state(interp: &mut Interpreter, promise: ObjectId) -> Result<&mut PromiseState, JsError> {
    match &mut interp.heap.object_mut(promise)?.kind {
        ObjectKind::Promise(state) => Ok(state),
        _ => Err(JsError::internal_error("promise operation on a non-promise")),
    }
}

fn this_promise(interp: &Interpreter, this: &JsValue, method: &str) -> Result<ObjectId, JsError> {
    if let JsValue::Object(id) = this {
        if matches!(interp.heap.object(*id)?.kind, ObjectKind::Promise(_)) {
            return Ok(*id);
        }
    }
    Err(JsError::type_error(format!(
        "Method Promise.prototype.{method} called on incompatible receiver {}",
        interp.inspect(this)
    )))
}

/// Register reactions on `promise`; `derived` receives the handler outcome.
/// Non-callable handlers pass the settlement through.
pub fn perform_then(
    interp: &mut Interpreter,
    promise: ObjectId,
    on_fulfilled: JsValue,
    on_rejected: JsValue,
    derived: Option<ObjectId>,
) -> Result<(), JsError> {
    let fulfill = PromiseReaction {
        capability: derived,
        handler: interp.is_callable(&on_fulfilled).then_some(on_fulfilled),
        kind: ReactionKind::Fulfill,
    };
    let reject = PromiseReaction {
        capability: derived,
        handler: interp.is_callable(&on_rejected).then_some(on_rejected),
        kind: ReactionKind::Reject,
    };

    let state = promise_state(interp, promise)?;
    state.handled = true;
    let ready = match state.status {
        PromiseStatus::Pending => {
            state.fulfill_reactions.push(fulfill);
            state.reject_reactions.push(reject);
            None
        }
        PromiseStatus::Fulfilled => Some((fulfill, state.result.clone())),
        PromiseStatus::Rejected => Some((reject, state.result.clone())),
    };
    if let Some((reaction, argument)) = ready {
        interp.enqueue_job(Job::Reaction { reaction, argument });
    }
    Ok(())
}

/// Microtask body for [`Job::Reaction`].
pub fn run_reaction(
    interp: &mut Interpreter,
    reaction: PromiseReaction,
    argument: JsValue,
) -> Result<(), JsError> {
    let outcome = match &reaction.handler {
        None => match reaction.kind {
            ReactionKind::Fulfill => Ok(argument),
            ReactionKind::Reject => Err(argument),
        },
        Some(handler) => match interp.call_function(handler, JsValue::Undefined, &[argument]) {
            Ok(value) => Ok(value),
            Err(err) => Err(interp.error_to_value(err)?),
        },
    };
    match (reaction.capability, outcome) {
        (Some(derived), Ok(value)) => resolve_promise(interp, derived, value),
        (Some(derived), Err(reason)) => reject_promise(interp, derived, reason),
        (None, Ok(_)) => Ok(()),
        (None, Err(reason)) => Err(JsError::Thrown(reason)),
    }
}

/// Microtask body for [`Job::ResolveThenable`]: `then.call(thenable, resolve, reject)`.
pub fn resolve_thenable(
    interp: &mut Interpreter,
    promise: ObjectId,
    thenable: JsValue,
    then: JsValue,
) -> Result<(), JsError> {
    let (resolve, reject, already_resolved) = create_resolving_functions(interp, promise);
    if let Err(err) = interp.call_function(&then, thenable, &[resolve, reject]) {
        let reason = interp.error_to_value(err)?;
        if !already_resolved.replace(true) {
            reject_promise(interp, promise, reason)?;
        }
    }
    Ok(())
}

/// PromiseResolve: promises pass through, anything else is wrapped.
pub fn promise_resolve(interp: &mut Interpreter, value: JsValue) -> Result<ObjectId, JsError> {
    if let JsValue::Object(id) = &value {
        let record = interp.heap.object(*id)?;
        if matches!(record.kind, ObjectKind::Promise(_))
            && record.prototype == Some(interp.intrinsics.promise_prototype)
        {
            return Ok(*id);
        }
    }
    let promise = interp.create_promise();
    resolve_promise(interp, promise, value)?;
    Ok(promise)
}

pub fn promise_then(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let promise = this_promise(interp, &this, "then")?;
    let derived = interp.create_promise();
    perform_then(interp, promise, arg(args, 0), arg(args, 1), Some(derived))?;
    Ok(JsValue::Object(derived))
}

fn invoke_then(interp: &mut Interpreter, target: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let then = interp.get_named(target, "then")?;
    interp.call_function(&then, target.clone(), args)
}

/// `p.catch(f)` is `p.then(undefined, f)`, looked up dynamically.
pub fn promise_catch(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    invoke_then(interp, &this, &[JsValue::Undefined, arg(args, 0)])
}

/// `p.finally(f)` runs `f` with no arguments on either outcome, waits for
/// its result, then passes the original settlement through. A throw (or
/// rejection) from `f` replaces it.
pub fn promise_finally(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    if !matches!(this, JsValue::Object(_)) {
        return Err(JsError::type_error(
            "Promise.prototype.finally called on a non-object",
        ));
    }
    let on_finally = arg(args, 0);
    if !interp.is_callable(&on_finally) {
        return invoke_then(interp, &this, &[on_finally.clone(), on_finally]);
    }
    let then_finally = interp.create_capturing_function("", finally_fulfilled, vec![on_finally.clone()]);
    let catch_finally = interp.create_capturing_function("", finally_rejected, vec![on_finally]);
    invoke_then(
        interp,
        &this,
        &[JsValue::Object(then_finally), JsValue::Object(catch_finally)],
    )
}

fn finally_fulfilled(
    interp: &mut Interpreter,
    captures: &[JsValue],
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value_thunk = interp.create_capturing_function("", return_captured, vec![arg(args, 0)]);
    after_finally(interp, captures, value_thunk)
}

fn finally_rejected(
    interp: &mut Interpreter,
    captures: &[JsValue],
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let thrower = interp.create_capturing_function("", throw_captured, vec![arg(args, 0)]);
    after_finally(interp, captures, thrower)
}

/// Call the `finally` callback, then continue with `continuation` once
/// whatever it returned has settled.
fn after_finally(
    interp: &mut Interpreter,
    captures: &[JsValue],
    continuation: ObjectId,
) -> Result<JsValue, JsError> {
    let on_finally = arg(captures, 0);
    let result = interp.call_function(&on_finally, JsValue::Undefined, &[])?;
    let waited = promise_resolve(interp, result)?;
    invoke_then(interp, &JsValue::Object(waited), &[JsValue::Object(continuation)])
}

fn return_captured(
    _interp: &mut Interpreter,
    captures: &[JsValue],
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(arg(captures, 0))
}

fn throw_captured(
    _interp: &mut Interpreter,
    captures: &[JsValue],
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Err(JsError::Thrown(arg(captures, 0)))
}

/// `Promise.resolve(value)`
pub fn promise_resolve_static(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Object(promise_resolve(interp, arg(args, 0))?))
}

/// `Promise.reject(reason)`
pub fn promise_reject_static(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let promise = interp.create_promise();
    reject_promise(interp, promise, arg(args, 0))?;
    Ok(JsValue::Object(promise))
}

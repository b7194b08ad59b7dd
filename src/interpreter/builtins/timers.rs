//! Timer globals: setTimeout, setInterval, their clear functions and
//! queueMicrotask
//!
//! Timer ids are the scheduler's [`TaskId`]s exposed as numbers.

use crate::error::JsError;
use crate::interpreter::{Interpreter, MacroTask};
use crate::scheduler::TaskId;
use crate::value::JsValue;

use super::arg;

pub fn init_timers(interp: &mut Interpreter) {
    let global = interp.global;

    interp.register_method(global, "setTimeout", set_timeout, 2);
    interp.register_method(global, "clearTimeout", clear_timer, 1);
    interp.register_method(global, "setInterval", set_interval, 2);
    interp.register_method(global, "clearInterval", clear_timer, 1);
    interp.register_method(global, "queueMicrotask", queue_microtask, 1);
}

fn require_callback(interp: &Interpreter, callback: &JsValue) -> Result<(), JsError> {
    if interp.is_callable(callback) {
        return Ok(());
    }
    Err(JsError::type_error(format!(
        "The \"callback\" argument must be of type function. Received {}",
        interp.inspect(callback)
    )))
}

/// Delay argument in whole milliseconds; NaN and negatives become 0.
fn delay_arg(interp: &mut Interpreter, value: &JsValue) -> Result<u64, JsError> {
    let ms = interp.to_number(value)?;
    Ok(if ms.is_nan() || ms <= 0.0 {
        0
    } else {
        ms.trunc().min(u64::MAX as f64) as u64
    })
}

fn timer_task(args: &[JsValue]) -> MacroTask {
    MacroTask::Callback {
        callback: arg(args, 0),
        args: args.get(2..).unwrap_or_default().to_vec(),
    }
}

/// `setTimeout(callback, delay, ...args)`
pub fn set_timeout(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    require_callback(interp, &arg(args, 0))?;
    let delay = delay_arg(interp, &arg(args, 1))?;
    let id = interp.schedule_macrotask(timer_task(args), delay);
    Ok(JsValue::Number(id.as_u64() as f64))
}

/// `setInterval(callback, period, ...args)`
pub fn set_interval(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    require_callback(interp, &arg(args, 0))?;
    let period = delay_arg(interp, &arg(args, 1))?;
    let id = interp.schedule_interval(timer_task(args), period);
    Ok(JsValue::Number(id.as_u64() as f64))
}

/// `clearTimeout(id)` / `clearInterval(id)`. Anything that is not a live
/// timer id is ignored.
pub fn clear_timer(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    if let JsValue::Number(n) = arg(args, 0) {
        if n.is_finite() && n >= 1.0 && n.fract() == 0.0 {
            interp.cancel(TaskId::from_u64(n as u64));
        }
    }
    Ok(JsValue::Undefined)
}

/// `queueMicrotask(callback)`
pub fn queue_microtask(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let callback = arg(args, 0);
    require_callback(interp, &callback)?;
    interp.schedule_microtask(callback, Vec::new());
    Ok(JsValue::Undefined)
}

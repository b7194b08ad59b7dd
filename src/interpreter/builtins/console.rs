//! Console built-in methods
//!
//! Values are formatted by the interpreter and handed to the host's
//! [`ConsoleProvider`](crate::platform::ConsoleProvider).

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::platform::ConsoleLevel;
use crate::value::JsValue;

/// Create the console object with log, info, debug, warn and error
pub fn init_console(interp: &mut Interpreter) {
    let console = interp.create_object();

    interp.register_method(console, "log", console_log, 0);
    interp.register_method(console, "info", console_info, 0);
    interp.register_method(console, "debug", console_debug, 0);
    interp.register_method(console, "warn", console_warn, 0);
    interp.register_method(console, "error", console_error, 0);

    interp.define_global("console", JsValue::Object(console));
}

pub fn console_log(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    interp.emit(ConsoleLevel::Log, args);
    Ok(JsValue::Undefined)
}

pub fn console_info(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    interp.emit(ConsoleLevel::Info, args);
    Ok(JsValue::Undefined)
}

pub fn console_debug(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    interp.emit(ConsoleLevel::Debug, args);
    Ok(JsValue::Undefined)
}

pub fn console_warn(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    interp.emit(ConsoleLevel::Warn, args);
    Ok(JsValue::Undefined)
}

pub fn console_error(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    interp.emit(ConsoleLevel::Error, args);
    Ok(JsValue::Undefined)
}

//! Error constructor built-in methods

use crate::error::{ErrorKind, JsError};
use crate::interpreter::Interpreter;
use crate::object::{NativeFn, ObjectKind, ObjectRecord};
use crate::property::Property;
use crate::value::{JsValue, PropertyKey};

/// Initialize Error and all derived error constructors and add them to globals
pub fn init_error(interp: &mut Interpreter) {
    let error_proto = interp.intrinsics.error_prototype;
    interp.register_method(error_proto, "toString", error_to_string, 0);

    for kind in ErrorKind::ALL {
        let proto = interp.intrinsics.error_prototype_for(kind);
        interp.define_builtin(proto, "name", Property::hidden(JsValue::from(kind.name())));
        interp.define_builtin(proto, "message", Property::hidden(JsValue::from("")));

        let ctor = interp.create_constructor(kind.name(), constructor_for(kind), 1, proto);
        interp.define_global(kind.name(), JsValue::Object(ctor));
    }
}

fn constructor_for(kind: ErrorKind) -> NativeFn {
    match kind {
        ErrorKind::Error => error_constructor,
        ErrorKind::TypeError => type_error_constructor,
        ErrorKind::RangeError => range_error_constructor,
        ErrorKind::ReferenceError => reference_error_constructor,
        ErrorKind::SyntaxError => syntax_error_constructor,
    }
}

pub fn error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::Error, args)
}

pub fn type_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::TypeError, args)
}

pub fn range_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::RangeError, args)
}

pub fn reference_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::ReferenceError, args)
}

pub fn syntax_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::SyntaxError, args)
}

/// `new XError(message, { cause })`. Calling without `new` behaves the same.
fn construct_error(
    interp: &mut Interpreter,
    kind: ErrorKind,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let error = match interp.new_target() {
        Some(target) => {
            interp.heap.object_mut(target)?.kind = ObjectKind::Error(kind);
            target
        }
        None => interp.heap.alloc(ObjectRecord::new(
            Some(interp.intrinsics.error_prototype_for(kind)),
            ObjectKind::Error(kind),
        )),
    };

    if let Some(message) = args.first().filter(|m| !m.is_undefined()) {
        let message = interp.to_js_string(message)?;
        interp.define_builtin(error, "message", Property::hidden(JsValue::String(message)));
    }

    if let Some(options @ JsValue::Object(options_id)) = args.get(1) {
        if interp.heap.has_property(*options_id, &PropertyKey::from("cause"))? {
            let cause = interp.get_named(options, "cause")?;
            interp.define_builtin(error, "cause", Property::hidden(cause));
        }
    }

    Ok(JsValue::Object(error))
}

/// Error.prototype.toString: `name: message`, omitting empty parts.
pub fn error_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    if !matches!(this, JsValue::Object(_)) {
        return Err(JsError::type_error(
            "Error.prototype.toString called on non-object",
        ));
    }
    let name = match interp.get_named(&this, "name")? {
        JsValue::Undefined => "Error".into(),
        other => interp.to_js_string(&other)?,
    };
    let message = match interp.get_named(&this, "message")? {
        JsValue::Undefined => "".into(),
        other => interp.to_js_string(&other)?,
    };
    let text = match (name.is_empty(), message.is_empty()) {
        (_, true) => name.to_string(),
        (true, false) => message.to_string(),
        (false, false) => format!("{name}: {message}"),
    };
    Ok(JsValue::from(text))
}

//! RegExp built-in: object model on top of the host [`PatternMatcher`]
//!
//! Matching itself is delegated; this module owns flags, `lastIndex`
//! bookkeeping and the shape of match result arrays.
//!
//! [`PatternMatcher`]: crate::platform::PatternMatcher

use crate::error::{ErrorKind, JsError};
use crate::interpreter::Interpreter;
use crate::object::{ObjectKind, ObjectRecord};
use crate::platform::PatternMatch;
use crate::property::Property;
use crate::value::{CheapClone, JsString, JsValue, ObjectId, PropertyKey};

use super::arg;

const VALID_FLAGS: &str = "gimsuy";

/// Initialize RegExp.prototype, the RegExp constructor and
/// `String.prototype.match`
pub fn init_regexp(interp: &mut Interpreter) {
    let proto = interp.intrinsics.regexp_prototype;

    interp.register_method(proto, "exec", regexp_exec, 1);
    interp.register_method(proto, "test", regexp_test, 1);
    interp.register_method(proto, "toString", regexp_to_string, 0);

    let ctor = interp.create_constructor("RegExp", regexp_constructor, 2, proto);
    interp.define_global("RegExp", JsValue::Object(ctor));

    let string_proto = interp.intrinsics.string_prototype;
    interp.register_method(string_proto, "match", string_match, 1);
}

/// Allocate a RegExp object. Flags and the pattern are validated up front
/// so a bad literal fails where it is evaluated.
pub fn create_regexp(
    interp: &mut Interpreter,
    source: JsString,
    flags: JsString,
) -> Result<ObjectId, JsError> {
    let mut seen = String::new();
    for flag in flags.as_str().chars() {
        if !VALID_FLAGS.contains(flag) || seen.contains(flag) {
            return Err(interp.throw_error(
                ErrorKind::SyntaxError,
                format!("Invalid flags supplied to RegExp constructor '{flags}'"),
            ));
        }
        seen.push(flag);
    }
    if let Err(message) = interp
        .matcher
        .match_pattern("", source.as_str(), flags.as_str(), 0)
    {
        return Err(interp.throw_error(ErrorKind::SyntaxError, message));
    }

    let regexp = interp.heap.alloc(ObjectRecord::new(
        Some(interp.intrinsics.regexp_prototype),
        ObjectKind::RegExp {
            source: source.cheap_clone(),
            flags: flags.cheap_clone(),
        },
    ));
    interp.define_builtin(
        regexp,
        "lastIndex",
        Property::Data {
            value: JsValue::Number(0.0),
            writable: true,
            enumerable: false,
            configurable: false,
        },
    );
    let has = |flag: char| JsValue::Boolean(flags.as_str().contains(flag));
    let own = [
        ("source", JsValue::String(source.cheap_clone())),
        ("flags", JsValue::String(flags.cheap_clone())),
        ("global", has('g')),
        ("ignoreCase", has('i')),
        ("multiline", has('m')),
        ("sticky", has('y')),
    ];
    for (name, value) in own {
        interp.define_builtin(regexp, name, Property::constant(value));
    }
    Ok(regexp)
}

/// `RegExp(pattern, flags)` and `new RegExp(pattern, flags)` behave the same.
pub fn regexp_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let pattern = arg(args, 0);
    let flags_arg = arg(args, 1);

    let existing = match &pattern {
        JsValue::Object(id) => regexp_parts(interp, *id).ok(),
        _ => None,
    };
    let (source, flags) = match existing {
        Some((source, flags)) if flags_arg.is_undefined() => (source, flags),
        Some((source, _)) => (source, interp.to_js_string(&flags_arg)?),
        None => {
            let source = match &pattern {
                JsValue::Undefined => JsString::from("(?:)"),
                other => interp.to_js_string(other)?,
            };
            let flags = match &flags_arg {
                JsValue::Undefined => JsString::from(""),
                other => interp.to_js_string(other)?,
            };
            (source, flags)
        }
    };
    Ok(JsValue::Object(create_regexp(interp, source, flags)?))
}

fn regexp_parts(interp: &Interpreter, id: ObjectId) -> Result<(JsString, JsString), JsError> {
    match &interp.heap.object(id)?.kind {
        ObjectKind::RegExp { source, flags } => Ok((source.cheap_clone(), flags.cheap_clone())),
        _ => Err(JsError::type_error("Receiver is not a RegExp")),
    }
}

fn this_regexp(interp: &Interpreter, this: &JsValue, method: &str) -> Result<ObjectId, JsError> {
    match this {
        JsValue::Object(id) if regexp_parts(interp, *id).is_ok() => Ok(*id),
        other => Err(JsError::type_error(format!(
            "RegExp.prototype.{method} requires that 'this' be a RegExp object, got {}",
            interp.inspect(other)
        ))),
    }
}

/// Run one match honouring `lastIndex` for global and sticky patterns.
fn exec_raw(
    interp: &mut Interpreter,
    regexp: ObjectId,
    text: &JsString,
) -> Result<Option<PatternMatch>, JsError> {
    let (source, flags) = regexp_parts(interp, regexp)?;
    let global = flags.as_str().contains('g');
    let sticky = flags.as_str().contains('y');
    let this = JsValue::Object(regexp);
    let key = PropertyKey::from("lastIndex");

    let from = if global || sticky {
        let last_index = interp.get(&this, &key)?;
        let n = interp.to_number(&last_index)?;
        if n.is_nan() || n < 0.0 { 0 } else { n.trunc() as usize }
    } else {
        0
    };
    if from > text.as_str().chars().count() {
        interp.put(&this, key, JsValue::Number(0.0))?;
        return Ok(None);
    }

    let found = interp
        .matcher
        .match_pattern(text.as_str(), source.as_str(), flags.as_str(), from)
        .map_err(|message| interp.throw_error(ErrorKind::SyntaxError, message))?;
    let found = Some(found).filter(|m| m.matched && (!sticky || m.start == from));

    if global || sticky {
        let next = found.as_ref().map_or(0, |m| m.end);
        interp.put(&this, key, JsValue::Number(next as f64))?;
    }
    Ok(found)
}

/// Match array: captures, then `index`, `input` and `groups`.
fn match_result(interp: &mut Interpreter, found: PatternMatch, input: &JsString) -> Result<JsValue, JsError> {
    let captures = found
        .captures
        .into_iter()
        .map(|c| c.map_or(JsValue::Undefined, JsValue::from))
        .collect();
    let array = interp.create_array(captures);
    interp.define_builtin(array, "index", Property::data(JsValue::Number(found.start as f64)));
    interp.define_builtin(array, "input", Property::data(JsValue::String(input.cheap_clone())));

    let groups = if found.named_captures.is_empty() {
        JsValue::Undefined
    } else {
        let groups = interp.heap.alloc(ObjectRecord::new(None, ObjectKind::Ordinary));
        for (name, value) in found.named_captures {
            let value = value.map_or(JsValue::Undefined, JsValue::from);
            interp.define_builtin(groups, &name, Property::data(value));
        }
        JsValue::Object(groups)
    };
    interp.define_builtin(array, "groups", Property::data(groups));
    Ok(JsValue::Object(array))
}

pub fn regexp_exec(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let regexp = this_regexp(interp, &this, "exec")?;
    let text = interp.to_js_string(&arg(args, 0))?;
    match exec_raw(interp, regexp, &text)? {
        Some(found) => match_result(interp, found, &text),
        None => Ok(JsValue::Null),
    }
}

pub fn regexp_test(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let regexp = this_regexp(interp, &this, "test")?;
    let text = interp.to_js_string(&arg(args, 0))?;
    Ok(JsValue::Boolean(exec_raw(interp, regexp, &text)?.is_some()))
}

pub fn regexp_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let regexp = this_regexp(interp, &this, "toString")?;
    let (source, flags) = regexp_parts(interp, regexp)?;
    Ok(JsValue::from(format!("/{source}/{flags}")))
}

/// String.prototype.match: `exec` for plain patterns, every whole match
/// for global ones.
pub fn string_match(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    if this.is_null_or_undefined() {
        return Err(JsError::type_error(
            "String.prototype.match called on null or undefined",
        ));
    }
    let text = interp.to_js_string(&this)?;
    let pattern = arg(args, 0);
    let regexp = match &pattern {
        JsValue::Object(id) if regexp_parts(interp, *id).is_ok() => *id,
        JsValue::Undefined => create_regexp(interp, JsString::from("(?:)"), JsString::from(""))?,
        other => {
            let source = interp.to_js_string(other)?;
            create_regexp(interp, source, JsString::from(""))?
        }
    };

    let (_, flags) = regexp_parts(interp, regexp)?;
    if !flags.as_str().contains('g') {
        return match exec_raw(interp, regexp, &text)? {
            Some(found) => match_result(interp, found, &text),
            None => Ok(JsValue::Null),
        };
    }

    let target = JsValue::Object(regexp);
    let key = PropertyKey::from("lastIndex");
    interp.put(&target, key.clone(), JsValue::Number(0.0))?;
    let mut matches = Vec::new();
    while let Some(found) = exec_raw(interp, regexp, &text)? {
        if found.start == found.end {
            // empty match: step past it or loop forever
            interp.put(&target, key.clone(), JsValue::Number((found.end + 1) as f64))?;
        }
        let whole = found.captures.into_iter().next().flatten().unwrap_or_default();
        matches.push(JsValue::from(whole));
    }
    if matches.is_empty() {
        Ok(JsValue::Null)
    } else {
        Ok(JsValue::Object(interp.create_array(matches)))
    }
}

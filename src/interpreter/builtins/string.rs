//! String constructor and String.prototype
//!
//! Positions are UTF-16 code unit offsets, as scripts see them through
//! `length` and indexing.

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::object::{ObjectKind, ObjectRecord};
use crate::property::Property;
use crate::value::{CheapClone, JsString, JsValue, PropertyKey};

use super::arg;

pub fn init_string(interp: &mut Interpreter) {
    let proto = interp.intrinsics.string_prototype;

    // Character access
    interp.register_method(proto, "charAt", string_char_at, 1);
    interp.register_method(proto, "charCodeAt", string_char_code_at, 1);

    // Search methods
    interp.register_method(proto, "indexOf", string_index_of, 1);
    interp.register_method(proto, "includes", string_includes, 1);
    interp.register_method(proto, "startsWith", string_starts_with, 1);
    interp.register_method(proto, "endsWith", string_ends_with, 1);

    // Extraction and transformation
    interp.register_method(proto, "slice", string_slice, 2);
    interp.register_method(proto, "substring", string_substring, 2);
    interp.register_method(proto, "toLowerCase", string_to_lower_case, 0);
    interp.register_method(proto, "toUpperCase", string_to_upper_case, 0);
    interp.register_method(proto, "trim", string_trim, 0);
    interp.register_method(proto, "split", string_split, 2);
    interp.register_method(proto, "repeat", string_repeat, 1);
    interp.register_method(proto, "concat", string_concat, 1);

    // Primitive conversion
    interp.register_method(proto, "valueOf", string_value_of, 0);
    interp.register_method(proto, "toString", string_value_of, 0);

    let iterator = interp.create_native_function("[Symbol.iterator]", string_iterator, 0);
    let key = PropertyKey::Symbol(interp.iterator_symbol());
    if let Ok(record) = interp.heap.object_mut(proto) {
        record
            .properties
            .insert(key, Property::hidden(JsValue::Object(iterator)));
    }

    let ctor = interp.create_constructor("String", string_constructor, 1, proto);
    interp.register_method(ctor, "fromCharCode", string_from_char_code, 1);
    interp.define_global("String", JsValue::Object(ctor));
}

/// `String.fromCharCode(...units)`. Unpaired surrogates become U+FFFD since
/// strings are stored as UTF-8.
pub fn string_from_char_code(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut units = Vec::with_capacity(args.len());
    for value in args {
        units.push(crate::value::to_uint32(interp.to_number(value)?) as u16);
    }
    Ok(JsValue::from(String::from_utf16_lossy(&units)))
}

/// `String(value)` converts; `new String(value)` builds a wrapper object.
pub fn string_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = match args.first() {
        None => JsString::from(""),
        // String(symbol) is allowed and describes the symbol
        Some(JsValue::Symbol(sym)) if interp.new_target().is_none() => JsString::from(sym.to_string()),
        Some(value) => interp.to_js_string(value)?,
    };
    match interp.new_target() {
        Some(target) => {
            interp.heap.object_mut(target)?.kind = ObjectKind::StringWrapper(text);
            Ok(JsValue::Object(target))
        }
        None => Ok(JsValue::String(text)),
    }
}

/// thisStringValue: primitives, wrappers, or anything coercible.
fn this_string(interp: &mut Interpreter, this: &JsValue, method: &str) -> Result<JsString, JsError> {
    match this {
        JsValue::String(s) => Ok(s.cheap_clone()),
        JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
            "String.prototype.{method} called on null or undefined"
        ))),
        JsValue::Object(id) => {
            if let ObjectKind::StringWrapper(s) = &interp.heap.object(*id)?.kind {
                return Ok(s.cheap_clone());
            }
            interp.to_js_string(this)
        }
        other => interp.to_js_string(other),
    }
}

fn units(s: &JsString) -> Vec<u16> {
    s.as_str().encode_utf16().collect()
}

fn from_units(units: &[u16]) -> JsValue {
    JsValue::from(String::from_utf16_lossy(units))
}

/// ToIntegerOrInfinity clamped into `0..=len`, with negative values
/// counted from the end when `from_end` is set.
fn relative_index(interp: &mut Interpreter, value: &JsValue, len: usize, from_end: bool) -> Result<usize, JsError> {
    let n = interp.to_number(value)?;
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let len_f = len as f64;
    let resolved = if n < 0.0 && from_end { (len_f + n).max(0.0) } else { n.clamp(0.0, len_f) };
    Ok(resolved.min(len_f) as usize)
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

pub fn string_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    match &this {
        JsValue::String(_) => Ok(this),
        JsValue::Object(id) => match &interp.heap.object(*id)?.kind {
            ObjectKind::StringWrapper(s) => Ok(JsValue::String(s.cheap_clone())),
            _ => Err(JsError::type_error("String.prototype.valueOf requires that 'this' be a String")),
        },
        _ => Err(JsError::type_error("String.prototype.valueOf requires that 'this' be a String")),
    }
}

pub fn string_char_at(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units(&this_string(interp, &this, "charAt")?);
    let pos = interp.to_number(&arg(args, 0))?;
    let pos = if pos.is_nan() { 0.0 } else { pos.trunc() };
    if pos < 0.0 {
        return Ok(JsValue::from(""));
    }
    Ok(s.get(pos as usize)
        .map(|unit| from_units(&[*unit]))
        .unwrap_or_else(|| JsValue::from("")))
}

pub fn string_char_code_at(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units(&this_string(interp, &this, "charCodeAt")?);
    let pos = interp.to_number(&arg(args, 0))?;
    let pos = if pos.is_nan() { 0.0 } else { pos.trunc() };
    if pos < 0.0 {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(
        s.get(pos as usize).map_or(f64::NAN, |unit| f64::from(*unit)),
    ))
}

pub fn string_index_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units(&this_string(interp, &this, "indexOf")?);
    let needle = units(&interp.to_js_string(&arg(args, 0))?);
    let from = relative_index(interp, &arg(args, 1), s.len(), false)?;
    Ok(JsValue::Number(
        find_units(&s, &needle, from).map_or(-1.0, |i| i as f64),
    ))
}

pub fn string_includes(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units(&this_string(interp, &this, "includes")?);
    let needle = units(&interp.to_js_string(&arg(args, 0))?);
    let from = relative_index(interp, &arg(args, 1), s.len(), false)?;
    Ok(JsValue::Boolean(find_units(&s, &needle, from).is_some()))
}

pub fn string_starts_with(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units(&this_string(interp, &this, "startsWith")?);
    let needle = units(&interp.to_js_string(&arg(args, 0))?);
    let from = relative_index(interp, &arg(args, 1), s.len(), false)?;
    Ok(JsValue::Boolean(
        s.get(from..).is_some_and(|rest| rest.starts_with(&needle)),
    ))
}

pub fn string_ends_with(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units(&this_string(interp, &this, "endsWith")?);
    let needle = units(&interp.to_js_string(&arg(args, 0))?);
    let end = match args.get(1) {
        Some(v) if !v.is_undefined() => relative_index(interp, v, s.len(), false)?,
        _ => s.len(),
    };
    Ok(JsValue::Boolean(
        s.get(..end).is_some_and(|head| head.ends_with(&needle)),
    ))
}

pub fn string_slice(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units(&this_string(interp, &this, "slice")?);
    let start = relative_index(interp, &arg(args, 0), s.len(), true)?;
    let end = match args.get(1) {
        Some(v) if !v.is_undefined() => relative_index(interp, v, s.len(), true)?,
        _ => s.len(),
    };
    Ok(from_units(s.get(start..end.max(start)).unwrap_or_default()))
}

pub fn string_substring(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units(&this_string(interp, &this, "substring")?);
    let a = relative_index(interp, &arg(args, 0), s.len(), false)?;
    let b = match args.get(1) {
        Some(v) if !v.is_undefined() => relative_index(interp, v, s.len(), false)?,
        _ => s.len(),
    };
    Ok(from_units(s.get(a.min(b)..a.max(b)).unwrap_or_default()))
}

pub fn string_to_lower_case(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "toLowerCase")?;
    Ok(JsValue::from(s.as_str().to_lowercase()))
}

pub fn string_to_upper_case(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "toUpperCase")?;
    Ok(JsValue::from(s.as_str().to_uppercase()))
}

pub fn string_trim(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "trim")?;
    Ok(JsValue::from(s.as_str().trim()))
}

/// `split` with a string separator (or none).
pub fn string_split(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "split")?;
    let limit = match args.get(1) {
        Some(v) if !v.is_undefined() => crate::value::to_uint32(interp.to_number(v)?) as usize,
        _ => usize::MAX,
    };
    let parts: Vec<JsValue> = match args.first() {
        None | Some(JsValue::Undefined) => vec![JsValue::String(s)],
        Some(sep) => {
            let sep = interp.to_js_string(sep)?;
            if sep.is_empty() {
                units(&s).iter().map(|u| from_units(&[*u])).collect()
            } else {
                s.as_str().split(sep.as_str()).map(JsValue::from).collect()
            }
        }
    };
    let parts = parts.into_iter().take(limit).collect();
    Ok(JsValue::Object(interp.create_array(parts)))
}

pub fn string_repeat(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "repeat")?;
    let count = interp.to_number(&arg(args, 0))?;
    let count = if count.is_nan() { 0.0 } else { count.trunc() };
    if count < 0.0 || count.is_infinite() {
        return Err(JsError::range_error(format!("Invalid count value: {count}")));
    }
    Ok(JsValue::from(s.as_str().repeat(count as usize)))
}

pub fn string_concat(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut result = this_string(interp, &this, "concat")?.to_string();
    for value in args {
        result.push_str(interp.to_js_string(value)?.as_str());
    }
    Ok(JsValue::from(result))
}

/// `String.prototype[Symbol.iterator]`: an array iterator over the code
/// points. `for-of` over a primitive string never calls this.
pub fn string_iterator(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "[Symbol.iterator]")?;
    let chars = s.as_str().chars().map(|c| JsValue::from(c.to_string())).collect();
    let array = interp.create_array(chars);
    let iterator = interp.heap.alloc(ObjectRecord::new(
        Some(interp.intrinsics.array_iterator_prototype),
        ObjectKind::ArrayIterator {
            array,
            next_index: 0,
            done: false,
        },
    ));
    Ok(JsValue::Object(iterator))
}

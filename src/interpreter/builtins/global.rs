//! Global value properties and functions (globalThis, NaN, parseInt, ...)

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::property::Property;
use crate::value::JsValue;

use super::arg;

/// Register global values and functions on the global object
pub fn init_globals(interp: &mut Interpreter) {
    let global = interp.global;

    interp.define_global("globalThis", JsValue::Object(global));
    for (name, value) in [
        ("undefined", JsValue::Undefined),
        ("NaN", JsValue::Number(f64::NAN)),
        ("Infinity", JsValue::Number(f64::INFINITY)),
    ] {
        interp.define_builtin(global, name, Property::constant(value));
    }

    interp.register_method(global, "parseInt", global_parse_int, 2);
    interp.register_method(global, "parseFloat", global_parse_float, 1);
    interp.register_method(global, "isNaN", global_is_nan, 1);
    interp.register_method(global, "isFinite", global_is_finite, 1);
}

/// Native body of `Function.prototype` itself: accepts anything, returns
/// `undefined`.
pub fn return_undefined(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Undefined)
}

pub fn global_parse_int(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let string = interp.to_js_string(&arg(args, 0))?;
    let radix = crate::value::to_int32(interp.to_number(&arg(args, 1))?);
    Ok(JsValue::Number(parse_int(string.as_str(), radix)))
}

fn parse_int(input: &str, radix: i32) -> f64 {
    let s = input.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let hex_prefixed = s.starts_with("0x") || s.starts_with("0X");
    let (radix, s) = match radix {
        0 if hex_prefixed => (16, s.get(2..).unwrap_or_default()),
        0 => (10, s),
        16 if hex_prefixed => (16, s.get(2..).unwrap_or_default()),
        r if (2..=36).contains(&r) => (r as u32, s),
        _ => return f64::NAN,
    };

    let digits: Vec<u32> = s.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    // accumulate in f64 so long inputs lose precision instead of overflowing
    let value = digits
        .iter()
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(*d));
    if negative { -value } else { value }
}

pub fn global_parse_float(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let string = interp.to_js_string(&arg(args, 0))?;
    Ok(JsValue::Number(parse_float(string.as_str())))
}

/// Longest numeric prefix, as `parseFloat` reads it.
fn parse_float(input: &str) -> f64 {
    let s = input.trim_start();
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.starts_with("Infinity") {
        return if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let mut end = s.len() - unsigned.len();
    let mut has_dot = false;
    let mut has_exp = false;
    let mut last_digit_end = None;
    let bytes = s.as_bytes();
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => {
                end += 1;
                last_digit_end = Some(end);
            }
            b'.' if !has_dot && !has_exp => {
                has_dot = true;
                end += 1;
            }
            b'e' | b'E' if !has_exp && last_digit_end.is_some() => {
                has_exp = true;
                end += 1;
                if matches!(bytes.get(end), Some(b'+' | b'-')) {
                    end += 1;
                }
            }
            _ => break,
        }
    }
    // drop a dangling exponent marker like "1e" or "1e+"
    let candidate = s.get(..end).unwrap_or_default();
    candidate
        .parse::<f64>()
        .ok()
        .or_else(|| {
            last_digit_end
                .and_then(|e| s.get(..e))
                .and_then(|prefix| prefix.trim_end_matches(['e', 'E', '+', '-']).parse().ok())
        })
        .unwrap_or(f64::NAN)
}

/// Global isNaN coerces its argument first
pub fn global_is_nan(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(interp.to_number(&arg(args, 0))?.is_nan()))
}

pub fn global_is_finite(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(interp.to_number(&arg(args, 0))?.is_finite()))
}

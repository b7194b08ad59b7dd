//! Number and Boolean constructors and their prototypes

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::object::ObjectKind;
use crate::property::Property;
use crate::value::{JsValue, number_to_string};

use super::arg;

/// Largest integer a double represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

/// Initialize Number.prototype and the Number constructor
pub fn init_number(interp: &mut Interpreter) {
    let proto = interp.intrinsics.number_prototype;

    interp.register_method(proto, "toFixed", number_to_fixed, 1);
    interp.register_method(proto, "toString", number_to_string_method, 1);
    interp.register_method(proto, "valueOf", number_value_of, 0);

    let ctor = interp.create_constructor("Number", number_constructor, 1, proto);
    interp.register_method(ctor, "isNaN", number_is_nan, 1);
    interp.register_method(ctor, "isFinite", number_is_finite, 1);
    interp.register_method(ctor, "isInteger", number_is_integer, 1);
    interp.register_method(ctor, "isSafeInteger", number_is_safe_integer, 1);

    let constants = [
        ("MAX_SAFE_INTEGER", MAX_SAFE_INTEGER),
        ("MIN_SAFE_INTEGER", -MAX_SAFE_INTEGER),
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("EPSILON", f64::EPSILON),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("NaN", f64::NAN),
    ];
    for (name, value) in constants {
        interp.define_builtin(ctor, name, Property::constant(JsValue::Number(value)));
    }

    interp.define_global("Number", JsValue::Object(ctor));
}

/// Initialize Boolean.prototype and the Boolean constructor
pub fn init_boolean(interp: &mut Interpreter) {
    let proto = interp.intrinsics.boolean_prototype;

    interp.register_method(proto, "toString", boolean_to_string, 0);
    interp.register_method(proto, "valueOf", boolean_value_of, 0);

    let ctor = interp.create_constructor("Boolean", boolean_constructor, 1, proto);
    interp.define_global("Boolean", JsValue::Object(ctor));
}

/// `Number(value)` converts; `new Number(value)` wraps.
pub fn number_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = match args.first() {
        Some(value) => interp.to_number(value)?,
        None => 0.0,
    };
    match interp.new_target() {
        Some(target) => {
            interp.heap.object_mut(target)?.kind = ObjectKind::NumberWrapper(n);
            Ok(JsValue::Object(target))
        }
        None => Ok(JsValue::Number(n)),
    }
}

/// thisNumberValue
fn this_number(interp: &Interpreter, this: &JsValue, method: &str) -> Result<f64, JsError> {
    match this {
        JsValue::Number(n) => Ok(*n),
        JsValue::Object(id) => match interp.heap.object(*id)?.kind {
            ObjectKind::NumberWrapper(n) => Ok(n),
            _ => Err(JsError::type_error(format!(
                "Number.prototype.{method} requires that 'this' be a Number"
            ))),
        },
        _ => Err(JsError::type_error(format!(
            "Number.prototype.{method} requires that 'this' be a Number"
        ))),
    }
}

pub fn number_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(this_number(interp, &this, "valueOf")?))
}

/// Number.prototype.toString(radix)
pub fn number_to_string_method(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = this_number(interp, &this, "toString")?;
    let radix = match args.first() {
        Some(v) if !v.is_undefined() => interp.to_number(v)?.trunc(),
        _ => 10.0,
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JsError::range_error(
            "toString() radix must be between 2 and 36",
        ));
    }
    if radix == 10.0 || !n.is_finite() {
        return Ok(JsValue::from(number_to_string(n)));
    }
    Ok(JsValue::from(to_radix_string(n, radix as u32)))
}

/// Integer part in `radix`, followed by up to 20 fractional digits.
fn to_radix_string(n: f64, radix: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let digit = |d: u32| DIGITS.get(d as usize).map_or('0', |b| char::from(*b));

    let negative = n < 0.0;
    let n = n.abs();
    let mut int_part = n.trunc();
    let mut frac = n - int_part;

    let mut int_digits = Vec::new();
    if int_part == 0.0 {
        int_digits.push('0');
    }
    while int_part >= 1.0 {
        let d = libm::fmod(int_part, f64::from(radix)) as u32;
        int_digits.push(digit(d));
        int_part = (int_part / f64::from(radix)).trunc();
    }
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(int_digits.iter().rev());

    if frac > 0.0 {
        out.push('.');
        for _ in 0..20 {
            frac *= f64::from(radix);
            let d = frac.trunc();
            out.push(digit(d as u32));
            frac -= d;
            if frac <= 0.0 {
                break;
            }
        }
    }
    out
}

pub fn number_to_fixed(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = this_number(interp, &this, "toFixed")?;
    let digits = interp.to_number(&arg(args, 0))?;
    let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
    if !(0.0..=100.0).contains(&digits) {
        return Err(JsError::range_error(
            "toFixed() digits argument must be between 0 and 100",
        ));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(JsValue::from(number_to_string(n)));
    }
    Ok(JsValue::from(format!("{:.prec$}", n, prec = digits as usize)))
}

// Number.isNaN and friends never coerce

pub fn number_is_nan(
    _interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(
        matches!(args.first(), Some(JsValue::Number(n)) if n.is_nan()),
    ))
}

pub fn number_is_finite(
    _interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(
        matches!(args.first(), Some(JsValue::Number(n)) if n.is_finite()),
    ))
}

pub fn number_is_integer(
    _interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(
        matches!(args.first(), Some(JsValue::Number(n)) if n.is_finite() && n.trunc() == *n),
    ))
}

pub fn number_is_safe_integer(
    _interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(
        args.first(),
        Some(JsValue::Number(n)) if n.is_finite() && n.trunc() == *n && n.abs() <= MAX_SAFE_INTEGER
    )))
}

/// `Boolean(value)` converts; `new Boolean(value)` wraps.
pub fn boolean_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let b = arg(args, 0).to_boolean();
    match interp.new_target() {
        Some(target) => {
            interp.heap.object_mut(target)?.kind = ObjectKind::BooleanWrapper(b);
            Ok(JsValue::Object(target))
        }
        None => Ok(JsValue::Boolean(b)),
    }
}

fn this_boolean(interp: &Interpreter, this: &JsValue, method: &str) -> Result<bool, JsError> {
    match this {
        JsValue::Boolean(b) => Ok(*b),
        JsValue::Object(id) => match interp.heap.object(*id)?.kind {
            ObjectKind::BooleanWrapper(b) => Ok(b),
            _ => Err(JsError::type_error(format!(
                "Boolean.prototype.{method} requires that 'this' be a Boolean"
            ))),
        },
        _ => Err(JsError::type_error(format!(
            "Boolean.prototype.{method} requires that 'this' be a Boolean"
        ))),
    }
}

pub fn boolean_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(this_boolean(interp, &this, "valueOf")?))
}

pub fn boolean_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let b = this_boolean(interp, &this, "toString")?;
    Ok(JsValue::from(if b { "true" } else { "false" }))
}

//! Math built-in methods

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::property::Property;
use crate::value::JsValue;

/// Create the Math object with its constants and methods
pub fn init_math(interp: &mut Interpreter) {
    let math = interp.create_object();

    for (name, value) in [
        ("PI", std::f64::consts::PI),
        ("E", std::f64::consts::E),
        ("LN2", std::f64::consts::LN_2),
        ("LN10", std::f64::consts::LN_10),
        ("SQRT2", std::f64::consts::SQRT_2),
    ] {
        interp.define_builtin(math, name, Property::constant(JsValue::Number(value)));
    }

    // Rounding
    interp.register_method(math, "abs", math_abs, 1);
    interp.register_method(math, "floor", math_floor, 1);
    interp.register_method(math, "ceil", math_ceil, 1);
    interp.register_method(math, "round", math_round, 1);
    interp.register_method(math, "trunc", math_trunc, 1);
    interp.register_method(math, "sign", math_sign, 1);

    interp.register_method(math, "min", math_min, 2);
    interp.register_method(math, "max", math_max, 2);
    interp.register_method(math, "pow", math_pow, 2);
    interp.register_method(math, "sqrt", math_sqrt, 1);
    interp.register_method(math, "random", math_random, 0);

    interp.define_global("Math", JsValue::Object(math));
}

/// ToNumber of the first argument, NaN when absent.
fn number_arg(interp: &mut Interpreter, args: &[JsValue]) -> Result<f64, JsError> {
    match args.first() {
        Some(value) => interp.to_number(value),
        None => Ok(f64::NAN),
    }
}

pub fn math_abs(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(number_arg(interp, args)?.abs()))
}

pub fn math_floor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(libm::floor(number_arg(interp, args)?)))
}

pub fn math_ceil(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(libm::ceil(number_arg(interp, args)?)))
}

/// Halves round towards +Infinity, unlike `f64::round`.
pub fn math_round(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(round_half_up(number_arg(interp, args)?)))
}

fn round_half_up(n: f64) -> f64 {
    if !n.is_finite() || n == 0.0 {
        return n;
    }
    let floor = libm::floor(n);
    let rounded = if n - floor >= 0.5 { floor + 1.0 } else { floor };
    // -0.4 rounds to -0
    if rounded == 0.0 && n < 0.0 { -0.0 } else { rounded }
}

pub fn math_trunc(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(libm::trunc(number_arg(interp, args)?)))
}

pub fn math_sign(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = number_arg(interp, args)?;
    let sign = if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        // NaN, 0 and -0 map to themselves
        n
    };
    Ok(JsValue::Number(sign))
}

/// Shared body of `min`/`max`: every argument is coerced (so valueOf side
/// effects all run) before NaN short-circuits the result.
fn fold_extreme(
    interp: &mut Interpreter,
    args: &[JsValue],
    start: f64,
    prefer: fn(f64, f64) -> bool,
) -> Result<f64, JsError> {
    let mut best = start;
    let mut saw_nan = false;
    for value in args {
        let n = interp.to_number(value)?;
        if n.is_nan() {
            saw_nan = true;
        } else if prefer(n, best) || (n == best && n == 0.0 && prefer(zero_rank(n), zero_rank(best))) {
            best = n;
        }
    }
    Ok(if saw_nan { f64::NAN } else { best })
}

/// Orders -0 below +0 for `min`/`max`.
fn zero_rank(zero: f64) -> f64 {
    if zero.is_sign_negative() { -1.0 } else { 1.0 }
}

pub fn math_min(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = fold_extreme(interp, args, f64::INFINITY, |a, b| a < b)?;
    Ok(JsValue::Number(n))
}

pub fn math_max(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = fold_extreme(interp, args, f64::NEG_INFINITY, |a, b| a > b)?;
    Ok(JsValue::Number(n))
}

pub fn math_pow(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let base = number_arg(interp, args)?;
    let exponent = match args.get(1) {
        Some(value) => interp.to_number(value)?,
        None => f64::NAN,
    };
    Ok(JsValue::Number(crate::interpreter::eval_expr::exponentiate(base, exponent)))
}

pub fn math_sqrt(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(libm::sqrt(number_arg(interp, args)?)))
}

/// Uniform in `[0, 1)`, drawn from the interpreter's xorshift generator.
pub fn math_random(
    interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(interp.next_random()))
}

impl Interpreter {
    /// xorshift64*: the top 53 bits become the mantissa of a float in [0, 1).
    pub(crate) fn next_random(&mut self) -> f64 {
        let mut x = self.random_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.random_state = x;
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        bits as f64 / (1u64 << 53) as f64
    }
}

//! Function.prototype built-in methods (call, apply, bind, toString)

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsValue, to_uint32};

use super::arg;

/// Initialize Function.prototype with call, apply, bind methods
pub fn init_function(interp: &mut Interpreter) {
    let proto = interp.intrinsics.function_prototype;

    interp.register_method(proto, "call", function_call, 1);
    interp.register_method(proto, "apply", function_apply, 2);
    interp.register_method(proto, "bind", function_bind, 1);
    interp.register_method(proto, "toString", function_to_string, 0);
}

fn require_callable(interp: &Interpreter, this: &JsValue, method: &str) -> Result<(), JsError> {
    if interp.is_callable(this) {
        Ok(())
    } else {
        Err(JsError::type_error(format!(
            "Function.prototype.{method} called on non-function"
        )))
    }
}

/// `f.call(thisArg, ...args)`
pub fn function_call(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    require_callable(interp, &this, "call")?;
    let this_arg = arg(args, 0);
    let rest = args.get(1..).unwrap_or_default();
    interp.call_function(&this, this_arg, rest)
}

/// Longest argument list `apply` will spread.
const MAX_APPLY_ARGUMENTS: u32 = 1 << 16;

/// `f.apply(thisArg, argsArray)`; the array may be any array-like.
pub fn function_apply(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    require_callable(interp, &this, "apply")?;
    let this_arg = arg(args, 0);
    let list = arg(args, 1);
    let call_args = match &list {
        JsValue::Undefined | JsValue::Null => Vec::new(),
        JsValue::Object(_) => {
            let length = interp.get_named(&list, "length")?;
            let length = to_uint32(interp.to_number(&length)?);
            if length > MAX_APPLY_ARGUMENTS {
                return Err(JsError::range_error("Maximum call stack size exceeded"));
            }
            let mut values = Vec::with_capacity(length.min(1024) as usize);
            for i in 0..length {
                interp.check_budget()?;
                values.push(interp.get(&list, &i.into())?);
            }
            values
        }
        _ => {
            return Err(JsError::type_error(
                "CreateListFromArrayLike called on non-object",
            ));
        }
    };
    interp.call_function(&this, this_arg, &call_args)
}

/// `f.bind(thisArg, ...args)` produces a capturing function holding the
/// target, the bound `this` and the leading arguments.
pub fn function_bind(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    require_callable(interp, &this, "bind")?;
    let name = this
        .as_object()
        .and_then(|f| interp.function_name(f))
        .map(|n| format!("bound {n}"))
        .unwrap_or_else(|| "bound ".to_string());
    let mut captures = vec![this, arg(args, 0)];
    captures.extend(args.get(1..).unwrap_or_default().iter().cloned());
    let bound = interp.create_capturing_function(&name, call_bound, captures);
    Ok(JsValue::Object(bound))
}

fn call_bound(
    interp: &mut Interpreter,
    captures: &[JsValue],
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let [target, bound_this, leading @ ..] = captures else {
        return Err(JsError::internal_error("bound function without target"));
    };
    let mut call_args = leading.to_vec();
    call_args.extend(args.iter().cloned());
    interp.call_function(target, bound_this.clone(), &call_args)
}

pub fn function_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    require_callable(interp, &this, "toString")?;
    let name = this
        .as_object()
        .and_then(|f| interp.function_name(f))
        .map(|n| n.to_string())
        .unwrap_or_default();
    Ok(JsValue::from(format!("function {name}() {{ [native code] }}")))
}

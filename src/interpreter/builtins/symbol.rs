//! Symbol built-in object implementation

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::property::Property;
use crate::value::{CheapClone, JsString, JsSymbol, JsValue};

/// Initialize the Symbol function, its well-known symbols and prototype
pub fn init_symbol(interp: &mut Interpreter) {
    let proto = interp.intrinsics.symbol_prototype;

    interp.register_method(proto, "toString", symbol_to_string, 0);
    interp.register_method(proto, "valueOf", symbol_value_of, 0);
    interp.register_getter(proto, "description", symbol_description);

    // Symbol() is callable but not constructable
    let symbol_fn = interp.create_native_function("Symbol", symbol_constructor, 0);
    interp.define_builtin(
        symbol_fn,
        "prototype",
        Property::constant(JsValue::Object(proto)),
    );
    interp.define_builtin(
        proto,
        "constructor",
        Property::hidden(JsValue::Object(symbol_fn)),
    );
    interp.define_builtin(
        symbol_fn,
        "iterator",
        Property::constant(JsValue::Symbol(interp.iterator_symbol())),
    );

    interp.define_global("Symbol", JsValue::Object(symbol_fn));
}

/// `Symbol(description)`: a fresh symbol, unique per call.
pub fn symbol_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let description = match args.first() {
        None | Some(JsValue::Undefined) => None,
        Some(value) => Some(interp.to_js_string(value)?),
    };
    Ok(JsValue::Symbol(interp.new_symbol(description)))
}

/// thisSymbolValue. Boxed symbols (`Object(sym)`) are not modelled.
fn this_symbol(this: &JsValue) -> Result<JsSymbol, JsError> {
    match this {
        JsValue::Symbol(sym) => Ok(sym.cheap_clone()),
        _ => Err(JsError::type_error(
            "Symbol.prototype method called on incompatible receiver",
        )),
    }
}

pub fn symbol_to_string(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let sym = this_symbol(&this)?;
    Ok(JsValue::String(JsString::from(sym.to_string())))
}

pub fn symbol_value_of(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Symbol(this_symbol(&this)?))
}

pub fn symbol_description(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let sym = this_symbol(&this)?;
    Ok(sym
        .description()
        .map_or(JsValue::Undefined, |d| JsValue::String(d.clone())))
}

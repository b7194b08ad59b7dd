//! Object constructor and Object.prototype

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::object::{ObjectKind, ObjectRecord};
use crate::property::{Property, PropertyDescriptor};
use crate::value::{JsValue, ObjectId, PropertyKey};

use super::arg;

pub fn init_object(interp: &mut Interpreter) {
    let proto = interp.intrinsics.object_prototype;

    interp.register_method(proto, "hasOwnProperty", object_has_own_property, 1);
    interp.register_method(proto, "isPrototypeOf", object_is_prototype_of, 1);
    interp.register_method(proto, "propertyIsEnumerable", object_property_is_enumerable, 1);
    interp.register_method(proto, "toString", object_to_string, 0);
    interp.register_method(proto, "valueOf", object_value_of, 0);

    // __proto__ as an accessor pair on Object.prototype
    let getter = interp.create_native_function("get __proto__", object_get_proto, 0);
    let setter = interp.create_native_function("set __proto__", object_set_proto, 1);
    interp.define_builtin(
        proto,
        "__proto__",
        Property::Accessor {
            getter: Some(getter),
            setter: Some(setter),
            enumerable: false,
            configurable: true,
        },
    );

    let ctor = interp.create_constructor("Object", object_constructor, 1, proto);
    interp.register_method(ctor, "defineProperty", object_define_property, 3);
    interp.register_method(ctor, "getOwnPropertyDescriptor", object_get_own_property_descriptor, 2);
    interp.register_method(ctor, "keys", object_keys, 1);
    interp.register_method(ctor, "assign", object_assign, 2);
    interp.register_method(ctor, "hasOwn", object_has_own, 2);
    interp.register_method(ctor, "create", object_create, 2);
    interp.register_method(ctor, "getPrototypeOf", object_get_prototype_of, 1);
    interp.register_method(ctor, "setPrototypeOf", object_set_prototype_of, 2);
    interp.register_method(ctor, "preventExtensions", object_prevent_extensions, 1);
    interp.register_method(ctor, "isExtensible", object_is_extensible, 1);
    interp.define_global("Object", JsValue::Object(ctor));
}

/// `Object(value)` wraps primitives; `null`/`undefined` give a fresh object.
pub fn object_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = arg(args, 0);
    if value.is_null_or_undefined() {
        return Ok(JsValue::Object(match interp.new_target() {
            Some(target) => target,
            None => interp.create_object(),
        }));
    }
    Ok(JsValue::Object(interp.to_object(&value)?))
}

fn target_object(value: &JsValue, method: &str) -> Result<ObjectId, JsError> {
    value
        .as_object()
        .ok_or_else(|| JsError::type_error(format!("Object.{method} called on non-object")))
}

/// ToPropertyDescriptor
pub fn to_property_descriptor(
    interp: &mut Interpreter,
    value: &JsValue,
) -> Result<PropertyDescriptor, JsError> {
    let JsValue::Object(obj) = value else {
        return Err(JsError::type_error(format!(
            "Property description must be an object: {}",
            interp.inspect(value)
        )));
    };
    let mut desc = PropertyDescriptor::default();
    let field = |interp: &mut Interpreter, name: &str| -> Result<Option<JsValue>, JsError> {
        if interp.heap.has_property(*obj, &PropertyKey::from(name))? {
            Ok(Some(interp.get_named(value, name)?))
        } else {
            Ok(None)
        }
    };

    desc.enumerable = field(interp, "enumerable")?.map(|v| v.to_boolean());
    desc.configurable = field(interp, "configurable")?.map(|v| v.to_boolean());
    desc.value = field(interp, "value")?;
    desc.writable = field(interp, "writable")?.map(|v| v.to_boolean());

    for (name, slot) in [("get", &mut desc.get), ("set", &mut desc.set)] {
        let Some(func) = field(interp, name)? else {
            continue;
        };
        if func.is_undefined() {
            *slot = Some(None);
        } else if interp.is_callable(&func) {
            *slot = Some(func.as_object());
        } else {
            let label = if name == "get" { "Getter" } else { "Setter" };
            return Err(JsError::type_error(format!(
                "{label} must be a function: {}",
                interp.inspect(&func)
            )));
        }
    }

    if desc.is_accessor() && desc.is_data() {
        return Err(JsError::type_error(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
        ));
    }
    Ok(desc)
}

/// FromPropertyDescriptor
fn from_property(interp: &mut Interpreter, prop: &Property) -> JsValue {
    let obj = interp.create_object();
    let fn_value = |f: &Option<ObjectId>| f.map(JsValue::Object).unwrap_or_default();
    let entries: Vec<(&str, JsValue)> = match prop {
        Property::Data {
            value,
            writable,
            enumerable,
            configurable,
        } => vec![
            ("value", value.clone()),
            ("writable", JsValue::Boolean(*writable)),
            ("enumerable", JsValue::Boolean(*enumerable)),
            ("configurable", JsValue::Boolean(*configurable)),
        ],
        Property::Accessor {
            getter,
            setter,
            enumerable,
            configurable,
        } => vec![
            ("get", fn_value(getter)),
            ("set", fn_value(setter)),
            ("enumerable", JsValue::Boolean(*enumerable)),
            ("configurable", JsValue::Boolean(*configurable)),
        ],
    };
    for (name, value) in entries {
        interp.define_builtin(obj, name, Property::data(value));
    }
    JsValue::Object(obj)
}

/// `Object.defineProperty(obj, key, descriptor)`. A refused definition
/// leaves the object untouched and is not reported.
pub fn object_define_property(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target_value = arg(args, 0);
    let target = target_object(&target_value, "defineProperty")?;
    let key = interp.to_property_key(&arg(args, 1))?;
    let desc = to_property_descriptor(interp, &arg(args, 2))?;
    if !interp.define_property(target, key.clone(), desc)? {
        tracing::debug!(%key, "defineProperty refused");
    }
    Ok(target_value)
}

pub fn object_get_own_property_descriptor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = interp.to_object(&arg(args, 0))?;
    let key = interp.to_property_key(&arg(args, 1))?;
    match interp.heap.own_property(target, &key)? {
        Some(prop) => Ok(from_property(interp, &prop)),
        None => Ok(JsValue::Undefined),
    }
}

pub fn object_keys(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = interp.to_object(&arg(args, 0))?;
    let mut keys = Vec::new();
    for key in interp.heap.own_keys(target)? {
        if key.is_symbol() {
            continue;
        }
        if interp
            .heap
            .own_property(target, &key)?
            .is_some_and(|p| p.enumerable())
        {
            keys.push(JsValue::String(key.to_value().to_js_string()));
        }
    }
    Ok(JsValue::Object(interp.create_array(keys)))
}

/// `Object.assign(target, ...sources)` copies own enumerable properties,
/// reading through getters and writing through setters.
pub fn object_assign(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = JsValue::Object(interp.to_object(&arg(args, 0))?);
    for source in args.iter().skip(1) {
        if source.is_null_or_undefined() {
            continue;
        }
        let from = interp.to_object(source)?;
        for key in interp.heap.own_keys(from)? {
            let enumerable = interp
                .heap
                .own_property(from, &key)?
                .is_some_and(|p| p.enumerable());
            if !enumerable {
                continue;
            }
            let value = interp.get(&JsValue::Object(from), &key)?;
            interp.put(&target, key, value)?;
        }
    }
    Ok(target)
}

/// `Object.hasOwn(obj, key)`
pub fn object_has_own(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = interp.to_object(&arg(args, 0))?;
    let key = interp.to_property_key(&arg(args, 1))?;
    Ok(JsValue::Boolean(interp.heap.has_own_property(target, &key)?))
}

pub fn object_create(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let proto = match arg(args, 0) {
        JsValue::Object(proto) => Some(proto),
        JsValue::Null => None,
        other => {
            return Err(JsError::type_error(format!(
                "Object prototype may only be an Object or null: {}",
                interp.inspect(&other)
            )));
        }
    };
    let obj = interp
        .heap
        .alloc(ObjectRecord::new(proto, ObjectKind::Ordinary));
    if let JsValue::Object(props) = arg(args, 1) {
        for key in interp.heap.own_keys(props)? {
            let desc_value = interp.get(&JsValue::Object(props), &key)?;
            let desc = to_property_descriptor(interp, &desc_value)?;
            interp.define_property(obj, key, desc)?;
        }
    }
    Ok(JsValue::Object(obj))
}

pub fn object_get_prototype_of(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = interp.to_object(&arg(args, 0))?;
    Ok(interp
        .heap
        .object(target)?
        .prototype
        .map(JsValue::Object)
        .unwrap_or(JsValue::Null))
}

/// Replace the prototype link, refusing to create a cycle.
fn set_prototype(interp: &mut Interpreter, target: ObjectId, proto: &JsValue) -> Result<bool, JsError> {
    let proto = match proto {
        JsValue::Object(p) => Some(*p),
        JsValue::Null => None,
        _ => return Ok(false),
    };
    if let Some(p) = proto
        && (p == target || interp.heap.inherits_from(p, target)?)
    {
        return Err(JsError::type_error("Cyclic __proto__ value"));
    }
    let record = interp.heap.object_mut(target)?;
    if !record.extensible && record.prototype != proto {
        return Ok(false);
    }
    record.prototype = proto;
    Ok(true)
}

pub fn object_set_prototype_of(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target_value = arg(args, 0);
    let target = target_object(&target_value, "setPrototypeOf")?;
    let proto = arg(args, 1);
    if !matches!(proto, JsValue::Object(_) | JsValue::Null) {
        return Err(JsError::type_error(format!(
            "Object prototype may only be an Object or null: {}",
            interp.inspect(&proto)
        )));
    }
    if !set_prototype(interp, target, &proto)? {
        return Err(JsError::type_error("#<Object> is not extensible"));
    }
    Ok(target_value)
}

pub fn object_prevent_extensions(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = arg(args, 0);
    if let JsValue::Object(id) = target {
        interp.heap.object_mut(id)?.extensible = false;
    }
    Ok(target)
}

pub fn object_is_extensible(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(match arg(args, 0) {
        JsValue::Object(id) => interp.heap.object(id)?.extensible,
        _ => false,
    }))
}

pub fn object_has_own_property(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let key = interp.to_property_key(&arg(args, 0))?;
    let target = interp.to_object(&this)?;
    Ok(JsValue::Boolean(interp.heap.has_own_property(target, &key)?))
}

pub fn object_is_prototype_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(candidate) = arg(args, 0) else {
        return Ok(JsValue::Boolean(false));
    };
    let proto = interp.to_object(&this)?;
    Ok(JsValue::Boolean(interp.heap.inherits_from(candidate, proto)?))
}

pub fn object_property_is_enumerable(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let key = interp.to_property_key(&arg(args, 0))?;
    let target = interp.to_object(&this)?;
    Ok(JsValue::Boolean(
        interp
            .heap
            .own_property(target, &key)?
            .is_some_and(|p| p.enumerable()),
    ))
}

pub fn object_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Object(id) => match &interp.heap.object(*id)?.kind {
            ObjectKind::Array { .. } => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error(_) => "Error",
            ObjectKind::BooleanWrapper(_) => "Boolean",
            ObjectKind::NumberWrapper(_) => "Number",
            ObjectKind::StringWrapper(_) => "String",
            ObjectKind::RegExp { .. } => "RegExp",
            ObjectKind::Promise(_) => "Promise",
            ObjectKind::Ordinary | ObjectKind::ArrayIterator { .. } => "Object",
        },
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::String(_) => "String",
        JsValue::Symbol(_) => "Symbol",
    };
    Ok(JsValue::from(format!("[object {tag}]")))
}

pub fn object_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Object(interp.to_object(&this)?))
}

pub fn object_get_proto(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = interp.to_object(&this)?;
    Ok(interp
        .heap
        .object(target)?
        .prototype
        .map(JsValue::Object)
        .unwrap_or(JsValue::Null))
}

pub fn object_set_proto(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    if let JsValue::Object(target) = this {
        set_prototype(interp, target, &arg(args, 0))?;
    }
    Ok(JsValue::Undefined)
}

//! JSON built-in methods
//!
//! `parse` goes through `serde_json` (with `preserve_order`, so object keys
//! keep their source order). `stringify` walks the heap directly because it
//! has to honour `toJSON`, replacers and property order.

use crate::error::{ErrorKind, JsError};
use crate::interpreter::Interpreter;
use crate::object::ObjectKind;
use crate::property::{Property, PropertyDescriptor};
use crate::value::{JsString, JsValue, ObjectId, PropertyKey, number_to_string, to_uint32};

use super::arg;

/// Deepest object nesting `stringify` follows before giving up.
const MAX_JSON_DEPTH: usize = 512;

/// Initialize the JSON object and add it to globals
pub fn init_json(interp: &mut Interpreter) {
    let json = interp.create_object();
    interp.register_method(json, "stringify", json_stringify, 3);
    interp.register_method(json, "parse", json_parse, 2);
    interp.define_global("JSON", JsValue::Object(json));
}

// ═══════════════════════════════════════════════════════════════
// JSON.parse
// ═══════════════════════════════════════════════════════════════

pub fn json_parse(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = interp.to_js_string(&arg(args, 0))?;
    let json: serde_json::Value = serde_json::from_str(text.as_str()).map_err(|e| {
        interp.throw_error(ErrorKind::SyntaxError, format!("JSON parse error: {e}"))
    })?;
    let value = json_to_value(interp, &json);

    let reviver = arg(args, 1);
    if !interp.is_callable(&reviver) {
        return Ok(value);
    }
    let root = interp.create_object();
    interp.put(&JsValue::Object(root), PropertyKey::from(""), value)?;
    internalize(interp, &reviver, root, PropertyKey::from(""), 0)
}

fn json_to_value(interp: &mut Interpreter, json: &serde_json::Value) -> JsValue {
    match json {
        serde_json::Value::Null => JsValue::Null,
        serde_json::Value::Bool(b) => JsValue::Boolean(*b),
        serde_json::Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => JsValue::from(s.as_str()),
        serde_json::Value::Array(items) => {
            let values = items.iter().map(|item| json_to_value(interp, item)).collect();
            JsValue::Object(interp.create_array(values))
        }
        serde_json::Value::Object(entries) => {
            let obj = interp.create_object();
            for (key, item) in entries {
                let value = json_to_value(interp, item);
                // own data properties even for "__proto__"
                if let Ok(record) = interp.heap.object_mut(obj) {
                    record
                        .properties
                        .insert(PropertyKey::from(key.as_str()), Property::data(value));
                }
            }
            JsValue::Object(obj)
        }
    }
}

/// InternalizeJSONProperty: feed every parsed value, innermost first, to
/// the reviver. `undefined` results delete the property.
fn internalize(
    interp: &mut Interpreter,
    reviver: &JsValue,
    holder: ObjectId,
    key: PropertyKey,
    depth: usize,
) -> Result<JsValue, JsError> {
    interp.check_budget()?;
    if depth > MAX_JSON_DEPTH {
        return Err(JsError::range_error("Maximum call stack size exceeded"));
    }
    let value = interp.get(&JsValue::Object(holder), &key)?;
    if let JsValue::Object(obj) = value {
        let keys: Vec<PropertyKey> = if interp.heap.is_array(obj)? {
            (0..interp.heap.array_length(obj)?).map(PropertyKey::Index).collect()
        } else {
            enumerable_string_keys(interp, obj)?
        };
        for child in keys {
            let revived = internalize(interp, reviver, obj, child.clone(), depth + 1)?;
            if revived.is_undefined() {
                interp.delete_property(obj, &child)?;
            } else {
                interp.define_property(obj, child, PropertyDescriptor::from_property(&Property::data(revived)))?;
            }
        }
    }
    interp.call_function(reviver, JsValue::Object(holder), &[key_string(&key), value])
}

// ═══════════════════════════════════════════════════════════════
// JSON.stringify
// ═══════════════════════════════════════════════════════════════

pub fn json_stringify(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut writer = JsonWriter {
        replacer: None,
        allow_list: None,
        gap: gap_from(interp, &arg(args, 2))?,
        indent: String::new(),
        stack: Vec::new(),
    };
    match arg(args, 1) {
        replacer if interp.is_callable(&replacer) => writer.replacer = Some(replacer),
        JsValue::Object(list) if interp.heap.is_array(list)? => {
            writer.allow_list = Some(allow_list_from(interp, list)?);
        }
        _ => {}
    }

    let root = interp.create_object();
    interp.put(&JsValue::Object(root), PropertyKey::from(""), arg(args, 0))?;
    Ok(match writer.property(interp, root, PropertyKey::from(""))? {
        Some(text) => JsValue::from(text),
        None => JsValue::Undefined,
    })
}

/// The `space` argument: up to ten spaces or the first ten characters.
fn gap_from(interp: &mut Interpreter, space: &JsValue) -> Result<String, JsError> {
    let space = unwrap_primitive(interp, space.clone())?;
    Ok(match space {
        JsValue::Number(n) => {
            let count = if n.is_nan() { 0.0 } else { n.clamp(0.0, 10.0).trunc() };
            " ".repeat(count as usize)
        }
        JsValue::String(s) => s.as_str().chars().take(10).collect(),
        _ => String::new(),
    })
}

/// Property names from an array replacer, deduplicated in order.
fn allow_list_from(interp: &mut Interpreter, list: ObjectId) -> Result<Vec<PropertyKey>, JsError> {
    let mut keys: Vec<PropertyKey> = Vec::new();
    for index in 0..interp.heap.array_length(list)? {
        interp.check_budget()?;
        let item = interp.get(&JsValue::Object(list), &PropertyKey::Index(index))?;
        let name = match unwrap_primitive(interp, item)? {
            JsValue::String(s) => s,
            JsValue::Number(n) => JsString::from(number_to_string(n)),
            _ => continue,
        };
        let key = PropertyKey::from(name.as_str());
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    Ok(keys)
}

/// Number, String and Boolean wrapper objects serialize as their primitive.
fn unwrap_primitive(interp: &mut Interpreter, value: JsValue) -> Result<JsValue, JsError> {
    let JsValue::Object(id) = value else {
        return Ok(value);
    };
    Ok(match &interp.heap.object(id)?.kind {
        ObjectKind::NumberWrapper(_) => JsValue::Number(interp.to_number(&value)?),
        ObjectKind::StringWrapper(_) => JsValue::String(interp.to_js_string(&value)?),
        ObjectKind::BooleanWrapper(b) => JsValue::Boolean(*b),
        _ => value,
    })
}

fn enumerable_string_keys(interp: &Interpreter, obj: ObjectId) -> Result<Vec<PropertyKey>, JsError> {
    let mut keys = Vec::new();
    for key in interp.heap.own_keys(obj)? {
        if key.is_symbol() {
            continue;
        }
        if interp
            .heap
            .own_property(obj, &key)?
            .is_some_and(|p| p.enumerable())
        {
            keys.push(key);
        }
    }
    Ok(keys)
}

fn key_string(key: &PropertyKey) -> JsValue {
    JsValue::String(key.to_value().to_js_string())
}

fn quote(text: &str) -> Result<String, JsError> {
    serde_json::to_string(text).map_err(|e| JsError::internal_error(e.to_string()))
}

struct JsonWriter {
    replacer: Option<JsValue>,
    allow_list: Option<Vec<PropertyKey>>,
    gap: String,
    indent: String,
    /// Objects being serialized, for cycle detection
    stack: Vec<ObjectId>,
}

impl JsonWriter {
    /// SerializeJSONProperty. `None` means the value has no JSON form
    /// (undefined, functions, symbols) and the property is skipped.
    fn property(
        &mut self,
        interp: &mut Interpreter,
        holder: ObjectId,
        key: PropertyKey,
    ) -> Result<Option<String>, JsError> {
        interp.check_budget()?;
        let mut value = interp.get(&JsValue::Object(holder), &key)?;
        if matches!(value, JsValue::Object(_)) {
            let to_json = interp.get_named(&value, "toJSON")?;
            if interp.is_callable(&to_json) {
                value = interp.call_function(&to_json, value, &[key_string(&key)])?;
            }
        }
        if let Some(replacer) = &self.replacer {
            value = interp.call_function(replacer, JsValue::Object(holder), &[key_string(&key), value])?;
        }

        match unwrap_primitive(interp, value)? {
            JsValue::Null => Ok(Some("null".to_string())),
            JsValue::Boolean(b) => Ok(Some(b.to_string())),
            JsValue::String(s) => quote(s.as_str()).map(Some),
            JsValue::Number(n) if n.is_finite() => Ok(Some(number_to_string(n))),
            JsValue::Number(_) => Ok(Some("null".to_string())),
            JsValue::Object(id) if interp.is_callable(&JsValue::Object(id)) => Ok(None),
            JsValue::Object(id) => self.object(interp, id).map(Some),
            JsValue::Undefined | JsValue::Symbol(_) => Ok(None),
        }
    }

    fn object(&mut self, interp: &mut Interpreter, id: ObjectId) -> Result<String, JsError> {
        if self.stack.contains(&id) {
            return Err(JsError::type_error("Converting circular structure to JSON"));
        }
        if self.stack.len() >= MAX_JSON_DEPTH {
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }
        self.stack.push(id);
        let new_indent = format!("{}{}", self.indent, self.gap);
        let stepback = std::mem::replace(&mut self.indent, new_indent);

        let result = if interp.heap.is_array(id)? {
            self.array_parts(interp, id).map(|parts| self.wrap('[', parts, ']'))
        } else {
            self.object_parts(interp, id).map(|parts| self.wrap('{', parts, '}'))
        };

        self.indent = stepback;
        self.stack.pop();
        result
    }

    fn array_parts(&mut self, interp: &mut Interpreter, id: ObjectId) -> Result<Vec<String>, JsError> {
        let length = interp.get_named(&JsValue::Object(id), "length")?;
        let length = to_uint32(interp.to_number(&length)?);
        let mut parts = Vec::new();
        for index in 0..length {
            let part = self.property(interp, id, PropertyKey::Index(index))?;
            parts.push(part.unwrap_or_else(|| "null".to_string()));
        }
        Ok(parts)
    }

    fn object_parts(&mut self, interp: &mut Interpreter, id: ObjectId) -> Result<Vec<String>, JsError> {
        let keys = match &self.allow_list {
            Some(keys) => keys.clone(),
            None => enumerable_string_keys(interp, id)?,
        };
        let colon = if self.gap.is_empty() { ":" } else { ": " };
        let mut parts = Vec::new();
        for key in keys {
            let name = key.to_value().to_js_string();
            if let Some(text) = self.property(interp, id, key)? {
                parts.push(format!("{}{colon}{text}", quote(name.as_str())?));
            }
        }
        Ok(parts)
    }

    /// Join member texts, one per line when a gap is set. `self.indent` is
    /// still the members' indentation here.
    fn wrap(&self, open: char, parts: Vec<String>, close: char) -> String {
        if parts.is_empty() {
            return format!("{open}{close}");
        }
        if self.gap.is_empty() {
            return format!("{open}{}{close}", parts.join(","));
        }
        let stepback = self
            .indent
            .strip_suffix(self.gap.as_str())
            .unwrap_or_default();
        let separator = format!(",\n{}", self.indent);
        format!("{open}\n{}{}\n{stepback}{close}", self.indent, parts.join(&separator))
    }
}

//! Node-style value formatting for console output and fault messages
//!
//! Formatting only reads the heap: getters are shown as `[Getter]` rather
//! than invoked, so printing never runs script code.

use crate::interpreter::Interpreter;
use crate::object::{ObjectKind, PromiseStatus};
use crate::property::Property;
use crate::value::{JsString, JsValue, ObjectId, PropertyKey, number_to_string};

/// Nesting level past which objects collapse to `[Object]`/`[Array]`.
const MAX_DEPTH: usize = 2;

/// Array elements shown before "... N more items".
const MAX_ARRAY_ITEMS: usize = 100;

impl Interpreter {
    /// Format a value as `console.log` prints it: strings raw, everything
    /// else inspected.
    pub fn display(&self, value: &JsValue) -> String {
        match value {
            JsValue::String(s) => s.to_string(),
            other => self.inspect(other),
        }
    }

    /// Format a value as `util.inspect` would.
    pub fn inspect(&self, value: &JsValue) -> String {
        let mut seen = Vec::new();
        self.inspect_value(value, 0, &mut seen)
    }

    fn inspect_value(&self, value: &JsValue, depth: usize, seen: &mut Vec<ObjectId>) -> String {
        match value {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::Null => "null".to_string(),
            JsValue::Boolean(b) => b.to_string(),
            JsValue::Number(n) => format_number(*n),
            JsValue::String(s) => quote(s.as_str()),
            JsValue::Symbol(sym) => sym.to_string(),
            JsValue::Object(id) => self.inspect_object(*id, depth, seen),
        }
    }

    fn inspect_object(&self, id: ObjectId, depth: usize, seen: &mut Vec<ObjectId>) -> String {
        let Ok(record) = self.heap.object(id) else {
            return "[Object: collected]".to_string();
        };
        if seen.contains(&id) {
            return "[Circular]".to_string();
        }
        match &record.kind {
            ObjectKind::Function(_) => self.function_label(id),
            ObjectKind::Error(_) => {
                let summary = self.error_summary(id);
                if depth == 0 { summary } else { format!("[{summary}]") }
            }
            ObjectKind::RegExp { source, flags } => format!("/{source}/{flags}"),
            ObjectKind::BooleanWrapper(b) => format!("[Boolean: {b}]"),
            ObjectKind::NumberWrapper(n) => format!("[Number: {}]", format_number(*n)),
            ObjectKind::StringWrapper(s) => format!("[String: {}]", quote(s.as_str())),
            ObjectKind::ArrayIterator { .. } => "Object [Array Iterator] {}".to_string(),
            ObjectKind::Promise(state) => {
                seen.push(id);
                let inner = match state.status {
                    PromiseStatus::Pending => "<pending>".to_string(),
                    PromiseStatus::Fulfilled => self.inspect_value(&state.result, depth + 1, seen),
                    PromiseStatus::Rejected => format!(
                        "<rejected> {}",
                        self.inspect_value(&state.result, depth + 1, seen)
                    ),
                };
                seen.pop();
                format!("Promise {{ {inner} }}")
            }
            ObjectKind::Array { length } => {
                if depth > MAX_DEPTH {
                    return "[Array]".to_string();
                }
                seen.push(id);
                let text = self.inspect_array(id, *length, depth, seen);
                seen.pop();
                text
            }
            ObjectKind::Ordinary => {
                if depth > MAX_DEPTH {
                    return "[Object]".to_string();
                }
                seen.push(id);
                let entries = self.inspect_entries(id, false, depth, seen);
                seen.pop();
                let prefix = self.class_prefix(id);
                match (prefix, entries.is_empty()) {
                    (Some(prefix), true) => format!("{prefix} {{}}"),
                    (Some(prefix), false) => format!("{prefix} {{ {} }}", entries.join(", ")),
                    (None, true) => "{}".to_string(),
                    (None, false) => format!("{{ {} }}", entries.join(", ")),
                }
            }
        }
    }

    /// Elements in index order with runs of holes collapsed, followed by
    /// any named properties.
    fn inspect_array(&self, id: ObjectId, length: u32, depth: usize, seen: &mut Vec<ObjectId>) -> String {
        let Ok(record) = self.heap.object(id) else {
            return "[]".to_string();
        };
        let mut items = Vec::new();
        let mut expected: u32 = 0;
        let mut truncated = false;
        let indices = record.properties.keys().into_iter().filter_map(|k| k.as_index());
        for (shown, index) in indices.enumerate() {
            if shown >= MAX_ARRAY_ITEMS {
                truncated = true;
                break;
            }
            if index > expected {
                items.push(empty_items(index - expected));
            }
            if let Some(prop) = record.properties.get(&PropertyKey::Index(index)) {
                items.push(self.inspect_property(prop, depth, seen));
            }
            expected = index.saturating_add(1);
        }
        if truncated {
            let remaining = length.saturating_sub(expected);
            items.push(format!(
                "... {remaining} more item{}",
                if remaining == 1 { "" } else { "s" }
            ));
        } else if length > expected {
            items.push(empty_items(length - expected));
        }
        items.extend(self.inspect_entries(id, true, depth, seen));

        // Array.prototype is itself an array, printed the way Node does
        let prefix = if id == self.intrinsics.array_prototype {
            "Object(0) "
        } else {
            ""
        };
        if items.is_empty() {
            format!("{prefix}[]")
        } else {
            format!("{prefix}[ {} ]", items.join(", "))
        }
    }

    /// `key: value` for enumerable own properties. Array callers skip indices.
    fn inspect_entries(&self, id: ObjectId, skip_indices: bool, depth: usize, seen: &mut Vec<ObjectId>) -> Vec<String> {
        let Ok(record) = self.heap.object(id) else {
            return Vec::new();
        };
        record
            .properties
            .keys()
            .into_iter()
            .filter(|key| !(skip_indices && key.as_index().is_some()))
            .filter_map(|key| {
                let prop = record.properties.get(&key).filter(|p| p.enumerable())?;
                Some(format!("{}: {}", format_key(&key), self.inspect_property(prop, depth, seen)))
            })
            .collect()
    }

    fn inspect_property(&self, prop: &Property, depth: usize, seen: &mut Vec<ObjectId>) -> String {
        match prop {
            Property::Data { value, .. } => self.inspect_value(value, depth + 1, seen),
            Property::Accessor { getter, setter, .. } => match (getter, setter) {
                (Some(_), Some(_)) => "[Getter/Setter]".to_string(),
                (Some(_), None) => "[Getter]".to_string(),
                (None, _) => "[Setter]".to_string(),
            },
        }
    }

    /// Constructor name shown before objects not created by `{}`.
    fn class_prefix(&self, id: ObjectId) -> Option<String> {
        let record = self.heap.object(id).ok()?;
        let Some(proto) = record.prototype else {
            return Some("[Object: null prototype]".to_string());
        };
        if proto == self.intrinsics.object_prototype {
            return None;
        }
        let ctor = self
            .heap
            .lookup(proto, &PropertyKey::from("constructor"))
            .ok()
            .flatten()
            .and_then(|(_, prop)| prop.value().and_then(JsValue::as_object))?;
        let name = self.function_name(ctor)?;
        (!name.is_empty() && name.as_str() != "Object").then(|| name.to_string())
    }

    /// The `name` property of a function, if it is a plain string.
    pub fn function_name(&self, func: ObjectId) -> Option<JsString> {
        match self.heap.own_property(func, &PropertyKey::from("name")).ok()?? {
            Property::Data {
                value: JsValue::String(name),
                ..
            } => Some(name),
            _ => None,
        }
    }

    fn function_label(&self, func: ObjectId) -> String {
        match self.function_name(func) {
            Some(name) if !name.is_empty() => format!("[Function: {name}]"),
            _ => "[Function (anonymous)]".to_string(),
        }
    }

    /// `Name: message`, read from data properties only.
    pub fn error_summary(&self, error: ObjectId) -> String {
        let read = |name: &str| -> Option<String> {
            match self.heap.lookup(error, &PropertyKey::from(name)).ok()?? {
                (_, Property::Data { value, .. }) => Some(self.display(&value)),
                _ => None,
            }
        };
        let name = read("name").unwrap_or_else(|| "Error".to_string());
        match read("message") {
            Some(message) if !message.is_empty() => format!("{name}: {message}"),
            _ => name,
        }
    }
}

fn format_number(n: f64) -> String {
    if n == 0.0 && n.is_sign_negative() {
        "-0".to_string()
    } else {
        number_to_string(n)
    }
}

fn empty_items(count: u32) -> String {
    if count == 1 {
        "<1 empty item>".to_string()
    } else {
        format!("<{count} empty items>")
    }
}

/// Single-quoted unless the text itself contains single quotes.
fn quote(s: &str) -> String {
    if s.contains('\'') && !s.contains('"') {
        return format!("\"{}\"", s.replace('\n', "\\n"));
    }
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n"))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn format_key(key: &PropertyKey) -> String {
    match key {
        PropertyKey::Index(i) => i.to_string(),
        PropertyKey::Symbol(sym) => format!("[{sym}]"),
        PropertyKey::String(s) if is_identifier(s.as_str()) => s.to_string(),
        PropertyKey::String(s) => quote(s.as_str()),
    }
}

//! Property descriptors and the per-object property store
//!
//! The store is an insertion-ordered map; `keys()` reorders on the fly so that
//! array-index keys come first in ascending order, followed by every other key
//! in the order it was first defined. Prototype-chain walks live on the heap
//! (see [`crate::heap::Heap::lookup`]) because they have to hop between records.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::value::{JsValue, ObjectId, PropertyKey};

/// A stored property: exactly one of data or accessor at any time.
#[derive(Debug, Clone)]
pub enum Property {
    Data {
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        getter: Option<ObjectId>,
        setter: Option<ObjectId>,
        enumerable: bool,
        configurable: bool,
    },
}

impl Property {
    /// Ordinary assignment result: writable, enumerable, configurable.
    pub fn data(value: JsValue) -> Self {
        Property::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Built-in methods and constructor links: writable, configurable, not enumerable.
    pub fn hidden(value: JsValue) -> Self {
        Property::Data {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Read-only, non-enumerable, non-configurable.
    pub fn constant(value: JsValue) -> Self {
        Property::Data {
            value,
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    pub fn enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } | Property::Accessor { enumerable, .. } => {
                *enumerable
            }
        }
    }

    pub fn configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => {
                *configurable
            }
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor { .. })
    }

    /// The stored value of a data property.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Property::Data { value, .. } => Some(value),
            Property::Accessor { .. } => None,
        }
    }

    fn from_descriptor(desc: PropertyDescriptor) -> Self {
        let enumerable = desc.enumerable.unwrap_or(false);
        let configurable = desc.configurable.unwrap_or(false);
        if desc.is_accessor() {
            Property::Accessor {
                getter: desc.get.flatten(),
                setter: desc.set.flatten(),
                enumerable,
                configurable,
            }
        } else {
            Property::Data {
                value: desc.value.unwrap_or(JsValue::Undefined),
                writable: desc.writable.unwrap_or(false),
                enumerable,
                configurable,
            }
        }
    }

    /// Apply a descriptor to a configurable property. Fields the descriptor
    /// omits keep their current value; switching between data and accessor
    /// keeps only the shared attributes.
    fn merged(self, desc: PropertyDescriptor) -> Self {
        let enumerable = desc.enumerable.unwrap_or(self.enumerable());
        let configurable = desc.configurable.unwrap_or(self.configurable());
        if desc.is_accessor() {
            let (getter, setter) = match self {
                Property::Accessor { getter, setter, .. } => (getter, setter),
                Property::Data { .. } => (None, None),
            };
            Property::Accessor {
                getter: desc.get.unwrap_or(getter),
                setter: desc.set.unwrap_or(setter),
                enumerable,
                configurable,
            }
        } else if desc.is_data() {
            let (value, writable) = match self {
                Property::Data {
                    value, writable, ..
                } => (value, writable),
                Property::Accessor { .. } => (JsValue::Undefined, false),
            };
            Property::Data {
                value: desc.value.unwrap_or(value),
                writable: desc.writable.unwrap_or(writable),
                enumerable,
                configurable,
            }
        } else {
            match self {
                Property::Data {
                    value, writable, ..
                } => Property::Data {
                    value,
                    writable,
                    enumerable,
                    configurable,
                },
                Property::Accessor { getter, setter, .. } => Property::Accessor {
                    getter,
                    setter,
                    enumerable,
                    configurable,
                },
            }
        }
    }
}

/// A partial descriptor as handed to `define`: every field is optional.
///
/// `get`/`set` are doubly optional: `Some(None)` means "explicitly undefined".
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<Option<ObjectId>>,
    pub set: Option<Option<ObjectId>>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn value(value: JsValue) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// A complete descriptor mirroring a stored property.
    pub fn from_property(prop: &Property) -> Self {
        match prop {
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => Self {
                value: Some(value.clone()),
                writable: Some(*writable),
                get: None,
                set: None,
                enumerable: Some(*enumerable),
                configurable: Some(*configurable),
            },
            Property::Accessor {
                getter,
                setter,
                enumerable,
                configurable,
            } => Self {
                value: None,
                writable: None,
                get: Some(*getter),
                set: Some(*setter),
                enumerable: Some(*enumerable),
                configurable: Some(*configurable),
            },
        }
    }

    /// Every attribute the descriptor names already holds on `prop`.
    fn attributes_match(&self, prop: &Property) -> bool {
        let flag = |wanted: Option<bool>, current: bool| wanted.is_none_or(|w| w == current);
        if !flag(self.enumerable, prop.enumerable()) || !flag(self.configurable, prop.configurable())
        {
            return false;
        }
        match prop {
            Property::Data { writable, .. } => !self.is_accessor() && flag(self.writable, *writable),
            Property::Accessor { getter, setter, .. } => {
                !self.is_data()
                    && self.get.is_none_or(|g| g == *getter)
                    && self.set.is_none_or(|s| s == *setter)
            }
        }
    }
}

/// Ordered key → property map owned by one object record
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    map: IndexMap<PropertyKey, Property, FxBuildHasher>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Own lookup, no prototype walk.
    pub fn get(&self, key: &PropertyKey) -> Option<&Property> {
        self.map.get(key)
    }

    pub fn has(&self, key: &PropertyKey) -> bool {
        self.map.contains_key(key)
    }

    /// Unconditional insert used while building intrinsics.
    pub fn insert(&mut self, key: PropertyKey, prop: Property) {
        self.map.insert(key, prop);
    }

    /// Write the value of an own writable data property.
    ///
    /// Returns `false` when the key is absent, an accessor, or read-only; the
    /// caller decides between creating a property and ignoring the write.
    pub fn set_value(&mut self, key: &PropertyKey, new_value: JsValue) -> bool {
        match self.map.get_mut(key) {
            Some(Property::Data {
                value,
                writable: true,
                ..
            }) => {
                *value = new_value;
                true
            }
            _ => false,
        }
    }

    /// Define or redefine an own property.
    ///
    /// Returns whether the descriptor was accepted in full. Changes refused by
    /// a non-configurable property are dropped without touching the stored
    /// property; only a value update on a writable data property goes through.
    pub fn define(&mut self, key: PropertyKey, desc: PropertyDescriptor) -> bool {
        let Some(existing) = self.map.get_mut(&key) else {
            self.map.insert(key, Property::from_descriptor(desc));
            return true;
        };

        if existing.configurable() {
            let current = std::mem::replace(existing, Property::data(JsValue::Undefined));
            *existing = current.merged(desc);
            return true;
        }

        let attributes_ok = desc.attributes_match(existing);
        let value_ok = match (existing, desc.value) {
            (_, None) => true,
            (
                Property::Data {
                    value,
                    writable: true,
                    ..
                },
                Some(new_value),
            ) => {
                *value = new_value;
                true
            }
            (Property::Data { value, .. }, Some(new_value)) => same_value(value, &new_value),
            (Property::Accessor { .. }, Some(_)) => false,
        };
        attributes_ok && value_ok
    }

    /// Remove an own property. Absent keys count as deleted; non-configurable
    /// ones are kept and reported as `false`.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        match self.map.get(key) {
            None => true,
            Some(prop) if !prop.configurable() => false,
            Some(_) => {
                self.map.shift_remove(key);
                true
            }
        }
    }

    /// Own keys: indices ascending, then the rest in insertion order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        let mut indices: Vec<u32> = self.map.keys().filter_map(PropertyKey::as_index).collect();
        indices.sort_unstable();
        let mut keys: Vec<PropertyKey> = indices.into_iter().map(PropertyKey::Index).collect();
        keys.extend(
            self.map
                .keys()
                .filter(|k| k.as_index().is_none())
                .cloned(),
        );
        keys
    }

    /// Smallest index key `>= from`, used to jump over runs of holes.
    pub fn next_index(&self, from: u32) -> Option<u32> {
        self.map
            .keys()
            .filter_map(PropertyKey::as_index)
            .filter(|&index| index >= from)
            .min()
    }

    /// Drop every index key `>= from`, regardless of configurability.
    pub fn truncate_indices(&mut self, from: u32) {
        self.map
            .retain(|key, _| key.as_index().is_none_or(|idx| idx < from));
    }

    /// Properties in raw insertion order (GC tracing, inspection).
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &Property)> {
        self.map.iter()
    }
}

/// SameValue: like `===` but NaN equals NaN and 0 differs from -0.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => {
            (x.is_nan() && y.is_nan()) || (x == y && x.is_sign_negative() == y.is_sign_negative())
        }
        _ => a.strict_equals(b),
    }
}

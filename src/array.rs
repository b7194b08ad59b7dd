//! Exotic array behaviour
//!
//! Arrays are ordinary records whose `length` lives in the kind tag. Index
//! writes at or past the length grow it; shrinking the length drops every
//! index at or above the new value. Holes are simply absent index keys.

use crate::error::JsError;
use crate::heap::Heap;
use crate::object::{ObjectKind, ObjectRecord};
use crate::property::{Property, PropertyDescriptor};
use crate::value::{JsValue, ObjectId, PropertyKey};

/// Largest valid array length (2^32 - 1).
pub const MAX_ARRAY_LENGTH: u32 = u32::MAX;

/// Validate a numeric length value.
///
/// The value must already be a number (ToNumber happens on the interpreter,
/// where objects can be converted). Anything that is not an integer in
/// `0..=2^32-1` is a RangeError.
pub fn validate_length(n: f64) -> Result<u32, JsError> {
    if n.is_nan() || n < 0.0 || n.fract() != 0.0 || n > f64::from(MAX_ARRAY_LENGTH) {
        return Err(JsError::range_error("Invalid array length"));
    }
    Ok(n as u32)
}

impl Heap {
    /// Allocate a dense array holding `values`.
    pub fn alloc_array(&mut self, prototype: Option<ObjectId>, values: Vec<JsValue>) -> ObjectId {
        let length = values.len() as u32;
        let mut record = ObjectRecord::new(prototype, ObjectKind::Array { length });
        for (i, value) in values.into_iter().enumerate() {
            record
                .properties
                .insert(PropertyKey::Index(i as u32), Property::data(value));
        }
        self.alloc(record)
    }

    pub fn is_array(&self, id: ObjectId) -> Result<bool, JsError> {
        Ok(self.object(id)?.is_array())
    }

    pub fn array_length(&self, id: ObjectId) -> Result<u32, JsError> {
        match self.object(id)?.kind {
            ObjectKind::Array { length } => Ok(length),
            _ => Err(JsError::internal_error("array_length on a non-array")),
        }
    }

    /// Set the length of an array. Shrinking deletes every index key at or
    /// above the new length; growing only changes the length.
    pub fn set_array_length(&mut self, id: ObjectId, new_length: u32) -> Result<(), JsError> {
        let record = self.object_mut(id)?;
        let ObjectKind::Array { length } = &mut record.kind else {
            return Err(JsError::internal_error("set_array_length on a non-array"));
        };
        if new_length < *length {
            record.properties.truncate_indices(new_length);
        }
        *length = new_length;
        Ok(())
    }

    /// Define an own property, applying the array rules when `id` is an array:
    /// `length` redefinitions resize, index definitions at or past the
    /// length grow it. A `length` descriptor value must already be a number.
    pub fn define_own_property(
        &mut self,
        id: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, JsError> {
        let current_length = match self.object(id)?.kind {
            ObjectKind::Array { length } => Some(length),
            _ => None,
        };
        let record = self.object_mut(id)?;
        let Some(length) = current_length else {
            if !record.extensible && !record.properties.has(&key) {
                return Ok(false);
            }
            return Ok(record.properties.define(key, desc));
        };

        if key.eq_str("length") {
            if desc.is_accessor() {
                return Ok(false);
            }
            if let Some(value) = &desc.value {
                let new_length = validate_length(value.to_number())?;
                self.set_array_length(id, new_length)?;
            }
            return Ok(true);
        }

        let record = self.object_mut(id)?;
        if !record.extensible && !record.properties.has(&key) {
            return Ok(false);
        }
        let accepted = record.properties.define(key.clone(), desc);
        if let Some(index) = key.as_index()
            && accepted
            && index >= length
        {
            self.set_array_length(id, index + 1)?;
        }
        Ok(accepted)
    }

    /// Write `value` as an own data property, creating it when absent.
    /// Returns `false` when the write was refused.
    pub fn put_own_value(
        &mut self,
        id: ObjectId,
        key: PropertyKey,
        value: JsValue,
    ) -> Result<bool, JsError> {
        let record = self.object_mut(id)?;
        if record.properties.set_value(&key, value.clone()) {
            return Ok(true);
        }
        if record.properties.has(&key) {
            return Ok(false);
        }
        self.define_own_property(
            id,
            key,
            PropertyDescriptor {
                value: Some(value),
                writable: Some(true),
                enumerable: Some(true),
                configurable: Some(true),
                ..PropertyDescriptor::default()
            },
        )
    }

    /// Element at `index` for arrays: `None` for holes and accessors.
    pub fn array_element(&self, id: ObjectId, index: u32) -> Result<Option<JsValue>, JsError> {
        Ok(self
            .object(id)?
            .properties
            .get(&PropertyKey::Index(index))
            .and_then(|p| p.value().cloned()))
    }

    /// Remove an own property. Array `length` can never be deleted, nor
    /// can the characters of a string wrapper.
    pub fn delete_own_property(&mut self, id: ObjectId, key: &PropertyKey) -> Result<bool, JsError> {
        let record = self.object_mut(id)?;
        match &record.kind {
            ObjectKind::Array { .. } if key.eq_str("length") => return Ok(false),
            ObjectKind::StringWrapper(s) => {
                if key.eq_str("length") || key.as_index().is_some_and(|i| (i as usize) < s.js_len()) {
                    return Ok(false);
                }
            }
            _ => {}
        }
        Ok(record.properties.delete(key))
    }
}

//! Iteration protocol
//!
//! `for-of` and the built-ins that consume iterables go through an
//! [`IteratorRecord`]. Arrays and strings using their default iterator take
//! a direct path over the heap; anything else is driven through its
//! `next`/`return` methods.

use rustc_hash::FxHashSet;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::object::ObjectKind;
use crate::property::Property;
use crate::value::{CheapClone, JsString, JsValue, ObjectId, PropertyKey};

/// One step of an iterator.
#[derive(Debug, Clone, PartialEq)]
pub struct IterStep {
    pub done: bool,
    pub value: JsValue,
}

impl IterStep {
    pub fn yielded(value: JsValue) -> Self {
        Self { done: false, value }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            value: JsValue::Undefined,
        }
    }
}

/// Live iteration state.
#[derive(Debug)]
pub enum IteratorRecord {
    /// Array values in index order. Holes are skipped and the length is
    /// re-read on every step, so elements pushed during the loop are visited.
    ArrayValues { array: ObjectId, next_index: u32 },
    /// Code points of a string.
    StringChars { text: JsString, offset: usize },
    /// Snapshot of enumerable keys for `for-in`. Keys deleted from `object`
    /// before being reached are skipped.
    Keys {
        object: Option<ObjectId>,
        keys: std::vec::IntoIter<PropertyKey>,
    },
    /// A script-defined iterator object.
    Object { iterator: JsValue, next: JsValue },
}

impl Interpreter {
    /// GetIterator: look up `Symbol.iterator` on `iterable` and start iterating.
    pub fn get_iterator(&mut self, iterable: &JsValue) -> Result<IteratorRecord, JsError> {
        if iterable.is_null_or_undefined() {
            return Err(JsError::type_error(format!(
                "{} is not iterable",
                iterable.to_js_string()
            )));
        }
        let key = PropertyKey::Symbol(self.iterator_symbol());
        let method = self.get(iterable, &key)?;
        if !self.is_callable(&method) {
            return Err(JsError::type_error(format!(
                "{} is not iterable",
                self.inspect(iterable)
            )));
        }

        let default_values = method.as_object() == Some(self.intrinsics.array_values);
        match iterable {
            JsValue::Object(id) if default_values && self.heap.is_array(*id)? => {
                return Ok(IteratorRecord::ArrayValues {
                    array: *id,
                    next_index: 0,
                });
            }
            JsValue::String(text) if self.is_default_string_iterator(&method)? => {
                return Ok(IteratorRecord::StringChars {
                    text: text.cheap_clone(),
                    offset: 0,
                });
            }
            _ => {}
        }

        let iterator = self.call_function(&method, iterable.clone(), &[])?;
        if !matches!(iterator, JsValue::Object(_)) {
            return Err(JsError::type_error(
                "Result of the Symbol.iterator method is not an object",
            ));
        }
        let next = self.get_named(&iterator, "next")?;
        Ok(IteratorRecord::Object { iterator, next })
    }

    fn is_default_string_iterator(&self, method: &JsValue) -> Result<bool, JsError> {
        let key = PropertyKey::Symbol(self.iterator_symbol());
        Ok(self
            .heap
            .own_property(self.intrinsics.string_prototype, &key)?
            .and_then(|p| p.value().cloned())
            .is_some_and(|v| v.strict_equals(method)))
    }

    /// Advance `iter` by one step.
    pub fn iterator_next(&mut self, iter: &mut IteratorRecord) -> Result<IterStep, JsError> {
        match iter {
            IteratorRecord::ArrayValues { array, next_index } => {
                let array = *array;
                loop {
                    let length = self.heap.array_length(array)?;
                    if *next_index >= length {
                        return Ok(IterStep::done());
                    }
                    let index = *next_index;
                    let Some(prop) = self.heap.own_property(array, &PropertyKey::Index(index))? else {
                        // jump over the whole run of holes
                        *next_index = self
                            .heap
                            .object(array)?
                            .properties
                            .next_index(index)
                            .unwrap_or(length);
                        continue;
                    };
                    *next_index += 1;
                    match prop {
                        Property::Data { value, .. } => return Ok(IterStep::yielded(value)),
                        Property::Accessor { getter, .. } => {
                            let value = match getter {
                                Some(getter) => self.call_function(
                                    &JsValue::Object(getter),
                                    JsValue::Object(array),
                                    &[],
                                )?,
                                None => JsValue::Undefined,
                            };
                            return Ok(IterStep::yielded(value));
                        }
                    }
                }
            }
            IteratorRecord::StringChars { text, offset } => {
                let Some(ch) = text.as_str().get(*offset..).and_then(|rest| rest.chars().next())
                else {
                    return Ok(IterStep::done());
                };
                *offset += ch.len_utf8();
                Ok(IterStep::yielded(JsValue::from(ch.to_string())))
            }
            IteratorRecord::Keys { object, keys } => {
                for key in keys.by_ref() {
                    if let Some(obj) = *object
                        && !self.heap.has_property(obj, &key)?
                    {
                        continue;
                    }
                    return Ok(IterStep::yielded(key.to_value()));
                }
                Ok(IterStep::done())
            }
            IteratorRecord::Object { iterator, next } => {
                let result = self.call_function(next, iterator.clone(), &[])?;
                self.iter_result(&result)
            }
        }
    }

    /// Read `{ done, value }` from an iterator result object.
    pub fn iter_result(&mut self, result: &JsValue) -> Result<IterStep, JsError> {
        if !matches!(result, JsValue::Object(_)) {
            return Err(JsError::type_error(format!(
                "Iterator result {} is not an object",
                self.inspect(result)
            )));
        }
        let done = self.get_named(result, "done")?.to_boolean();
        let value = if done {
            JsValue::Undefined
        } else {
            self.get_named(result, "value")?
        };
        Ok(IterStep { done, value })
    }

    /// IteratorClose: give a script iterator the chance to clean up when a
    /// loop is left early. Built-in traversals have nothing to release.
    pub fn iterator_close(&mut self, iter: &IteratorRecord) -> Result<(), JsError> {
        let IteratorRecord::Object { iterator, .. } = iter else {
            return Ok(());
        };
        let method = self.get_named(iterator, "return")?;
        if method.is_null_or_undefined() {
            return Ok(());
        }
        let result = self.call_function(&method, iterator.clone(), &[])?;
        if !matches!(result, JsValue::Object(_)) {
            return Err(JsError::type_error(format!(
                "Iterator result {} is not an object",
                self.inspect(&result)
            )));
        }
        Ok(())
    }

    /// Keys visited by `for-in`: enumerable string keys of the object and
    /// its prototypes, each name once, own keys before inherited ones.
    pub fn enumerate_keys(&mut self, target: &JsValue) -> Result<IteratorRecord, JsError> {
        let (object, keys) = match target {
            JsValue::Undefined | JsValue::Null => (None, Vec::new()),
            JsValue::String(s) => (None, (0..s.js_len() as u32).map(PropertyKey::Index).collect()),
            JsValue::Object(id) => (Some(*id), self.for_in_keys(*id)?),
            _ => (None, Vec::new()),
        };
        Ok(IteratorRecord::Keys {
            object,
            keys: keys.into_iter(),
        })
    }

    fn for_in_keys(&self, id: ObjectId) -> Result<Vec<PropertyKey>, JsError> {
        let mut seen: FxHashSet<PropertyKey> = FxHashSet::default();
        let mut keys = Vec::new();
        let mut current = Some(id);
        while let Some(obj) = current {
            for key in self.heap.own_keys(obj)? {
                if key.is_symbol() || !seen.insert(key.clone()) {
                    continue;
                }
                let enumerable = self
                    .heap
                    .own_property(obj, &key)?
                    .is_some_and(|p| p.enumerable());
                if enumerable {
                    keys.push(key);
                }
            }
            current = self.heap.object(obj)?.prototype;
        }
        Ok(keys)
    }

    /// Drain an iterable into a vector (used by built-ins taking iterables).
    pub fn iterate_to_vec(&mut self, iterable: &JsValue) -> Result<Vec<JsValue>, JsError> {
        let mut iter = self.get_iterator(iterable)?;
        let mut values = Vec::new();
        loop {
            self.check_budget()?;
            let step = self.iterator_next(&mut iter)?;
            if step.done {
                return Ok(values);
            }
            values.push(step.value);
        }
    }
}

/// `ArrayIterator` objects created by `Array.prototype.values`.
pub(crate) fn array_iterator_step(
    interp: &mut Interpreter,
    iterator: ObjectId,
) -> Result<IterStep, JsError> {
    loop {
        let (array, index) = match &mut interp.heap.object_mut(iterator)?.kind {
            ObjectKind::ArrayIterator {
                done: true, ..
            } => return Ok(IterStep::done()),
            ObjectKind::ArrayIterator {
                array, next_index, ..
            } => {
                let index = *next_index;
                *next_index += 1;
                (*array, index)
            }
            _ => {
                return Err(JsError::type_error(
                    "next method called on incompatible receiver",
                ));
            }
        };
        let length = match &interp.heap.object(array)?.kind {
            ObjectKind::Array { length } => *length,
            ObjectKind::StringWrapper(s) => s.js_len() as u32,
            _ => {
                let len = interp.get_named(&JsValue::Object(array), "length")?;
                crate::value::to_uint32(interp.to_number(&len)?)
            }
        };
        if index >= length {
            if let ObjectKind::ArrayIterator { done, .. } = &mut interp.heap.object_mut(iterator)?.kind {
                *done = true;
            }
            return Ok(IterStep::done());
        }
        let key = PropertyKey::Index(index);
        if !interp.heap.has_property(array, &key)? {
            let resume = interp.heap.next_index_in_chain(array, index)?.unwrap_or(length);
            if let ObjectKind::ArrayIterator { next_index, .. } =
                &mut interp.heap.object_mut(iterator)?.kind
            {
                *next_index = resume;
            }
            continue;
        }
        let value = interp.get(&JsValue::Object(array), &key)?;
        return Ok(IterStep::yielded(value));
    }
}

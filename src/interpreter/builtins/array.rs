//! Array constructor, Array.prototype and the array iterator
//!
//! Methods are generic over array-likes: they read `length` and go through
//! ordinary property access, so holes stay holes (`forEach`, `map`,
//! `filter` and `reduce` skip them) and the exotic `length` rules of real
//! arrays apply on write.

use crate::array::validate_length;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::iterator::array_iterator_step;
use crate::object::{ObjectKind, ObjectRecord};
use crate::property::Property;
use crate::value::{JsString, JsValue, ObjectId, PropertyKey};

use super::arg;

/// Initialize Array.prototype, the Array constructor and the array
/// iterator prototype
pub fn init_array(interp: &mut Interpreter) {
    let proto = interp.intrinsics.array_prototype;

    // Mutators
    interp.register_method(proto, "push", array_push, 1);
    interp.register_method(proto, "pop", array_pop, 0);
    interp.register_method(proto, "shift", array_shift, 0);
    interp.register_method(proto, "reverse", array_reverse, 0);

    // Accessors
    interp.register_method(proto, "join", array_join, 1);
    interp.register_method(proto, "toString", array_to_string, 0);
    interp.register_method(proto, "indexOf", array_index_of, 1);
    interp.register_method(proto, "includes", array_includes, 1);
    interp.register_method(proto, "slice", array_slice, 2);
    interp.register_method(proto, "concat", array_concat, 1);

    // Iteration with callbacks
    interp.register_method(proto, "forEach", array_for_each, 1);
    interp.register_method(proto, "map", array_map, 1);
    interp.register_method(proto, "filter", array_filter, 1);
    interp.register_method(proto, "reduce", array_reduce, 1);
    interp.register_method(proto, "find", array_find, 1);
    interp.register_method(proto, "some", array_some, 1);
    interp.register_method(proto, "every", array_every, 1);

    // values() doubles as @@iterator; for-of recognises it by identity
    let values = interp.create_native_function("values", array_values, 0);
    interp.intrinsics.array_values = values;
    interp.define_builtin(proto, "values", Property::hidden(JsValue::Object(values)));
    let iterator_key = PropertyKey::Symbol(interp.iterator_symbol());
    if let Ok(record) = interp.heap.object_mut(proto) {
        record
            .properties
            .insert(iterator_key.clone(), Property::hidden(JsValue::Object(values)));
    }

    let iter_proto = interp.intrinsics.array_iterator_prototype;
    interp.register_method(iter_proto, "next", array_iterator_next, 0);
    let iter_self = interp.create_native_function("[Symbol.iterator]", return_this, 0);
    if let Ok(record) = interp.heap.object_mut(iter_proto) {
        record
            .properties
            .insert(iterator_key, Property::hidden(JsValue::Object(iter_self)));
    }

    let ctor = interp.create_constructor("Array", array_constructor, 1, proto);
    interp.register_method(ctor, "isArray", array_is_array, 1);
    interp.register_method(ctor, "of", array_of, 0);
    interp.define_global("Array", JsValue::Object(ctor));
}

/// `Array(n)` makes `n` holes; any other argument list becomes the elements.
pub fn array_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let array = match args {
        [JsValue::Number(n)] => {
            let length = validate_length(*n)
                .map_err(|_| JsError::range_error("Invalid array length"))?;
            let array = interp.create_array(Vec::new());
            interp.heap.set_array_length(array, length)?;
            array
        }
        _ => interp.create_array(args.to_vec()),
    };
    Ok(JsValue::Object(array))
}

pub fn array_is_array(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let is_array = match arg(args, 0) {
        JsValue::Object(id) => interp.heap.is_array(id)?,
        _ => false,
    };
    Ok(JsValue::Boolean(is_array))
}

pub fn array_of(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Object(interp.create_array(args.to_vec())))
}

fn this_object(interp: &mut Interpreter, this: &JsValue, method: &str) -> Result<ObjectId, JsError> {
    if this.is_null_or_undefined() {
        return Err(JsError::type_error(format!(
            "Array.prototype.{method} called on null or undefined"
        )));
    }
    interp.to_object(this)
}

/// LengthOfArrayLike, clamped to the array index range.
fn length_of(interp: &mut Interpreter, object: ObjectId) -> Result<u32, JsError> {
    if let ObjectKind::Array { length } = interp.heap.object(object)?.kind {
        return Ok(length);
    }
    let length = interp.get_named(&JsValue::Object(object), "length")?;
    let n = interp.to_number(&length)?;
    Ok(if n.is_nan() || n <= 0.0 {
        0
    } else {
        n.trunc().min(f64::from(u32::MAX)) as u32
    })
}

fn set_length(interp: &mut Interpreter, object: ObjectId, length: u32) -> Result<(), JsError> {
    interp.put(
        &JsValue::Object(object),
        PropertyKey::from("length"),
        JsValue::from(length),
    )
}

fn callback_arg(interp: &Interpreter, args: &[JsValue]) -> Result<JsValue, JsError> {
    let callback = arg(args, 0);
    if interp.is_callable(&callback) {
        Ok(callback)
    } else {
        Err(JsError::type_error(format!(
            "{} is not a function",
            interp.inspect(&callback)
        )))
    }
}

/// Relative start/end argument resolved against `length`.
fn relative_position(interp: &mut Interpreter, value: &JsValue, length: u32, default: u32) -> Result<u32, JsError> {
    if value.is_undefined() {
        return Ok(default);
    }
    let n = interp.to_number(value)?;
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let len = f64::from(length);
    let resolved = if n < 0.0 { (len + n).max(0.0) } else { n.min(len) };
    Ok(resolved as u32)
}

/// Element at `index`, or `None` for a hole.
fn element(interp: &mut Interpreter, object: ObjectId, index: u32) -> Result<Option<JsValue>, JsError> {
    let key = PropertyKey::Index(index);
    if !interp.heap.has_property(object, &key)? {
        return Ok(None);
    }
    interp.get(&JsValue::Object(object), &key).map(Some)
}

/// First present index in `from..to`. Runs of holes are skipped in one
/// step, so sparse arrays with a huge `length` stay cheap.
fn next_present(interp: &mut Interpreter, object: ObjectId, from: u32, to: u32) -> Result<Option<u32>, JsError> {
    interp.check_budget()?;
    if from >= to {
        return Ok(None);
    }
    if interp.heap.has_property(object, &PropertyKey::Index(from))? {
        return Ok(Some(from));
    }
    Ok(interp
        .heap
        .next_index_in_chain(object, from)?
        .filter(|&index| index < to))
}

pub fn array_push(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "push")?;
    let length = length_of(interp, object)?;
    let new_length = u32::try_from(args.len())
        .ok()
        .and_then(|n| length.checked_add(n))
        .ok_or_else(|| JsError::type_error("Pushing elements past the maximum array length"))?;
    for (index, value) in (length..).zip(args.iter().cloned()) {
        interp.put(&JsValue::Object(object), PropertyKey::Index(index), value)?;
    }
    set_length(interp, object, new_length)?;
    Ok(JsValue::from(new_length))
}

pub fn array_pop(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "pop")?;
    let length = length_of(interp, object)?;
    let Some(last) = length.checked_sub(1) else {
        set_length(interp, object, 0)?;
        return Ok(JsValue::Undefined);
    };
    let value = interp.get(&JsValue::Object(object), &PropertyKey::Index(last))?;
    interp.delete_property(object, &PropertyKey::Index(last))?;
    set_length(interp, object, last)?;
    Ok(value)
}

pub fn array_shift(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "shift")?;
    let length = length_of(interp, object)?;
    if length == 0 {
        set_length(interp, object, 0)?;
        return Ok(JsValue::Undefined);
    }
    let first = interp.get(&JsValue::Object(object), &PropertyKey::Index(0))?;
    for index in 1..length {
        interp.check_budget()?;
        let to = PropertyKey::Index(index - 1);
        match element(interp, object, index)? {
            Some(value) => interp.put(&JsValue::Object(object), to, value)?,
            None => {
                interp.delete_property(object, &to)?;
            }
        }
    }
    interp.delete_property(object, &PropertyKey::Index(length - 1))?;
    set_length(interp, object, length - 1)?;
    Ok(first)
}

pub fn array_reverse(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "reverse")?;
    let length = length_of(interp, object)?;
    let (mut lower, mut upper) = (0, length);
    while upper > lower + 1 {
        interp.check_budget()?;
        upper -= 1;
        let low = element(interp, object, lower)?;
        let high = element(interp, object, upper)?;
        for (index, value) in [(lower, high), (upper, low)] {
            match value {
                Some(value) => interp.put(&JsValue::Object(object), PropertyKey::Index(index), value)?,
                None => {
                    interp.delete_property(object, &PropertyKey::Index(index))?;
                }
            }
        }
        lower += 1;
    }
    Ok(JsValue::Object(object))
}

pub fn array_join(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "join")?;
    let separator = match arg(args, 0) {
        JsValue::Undefined => JsString::from(","),
        other => interp.to_js_string(&other)?,
    };
    let length = length_of(interp, object)?;
    let mut out = String::new();
    for index in 0..length {
        interp.check_budget()?;
        if index > 0 {
            out.push_str(separator.as_str());
        }
        match interp.get(&JsValue::Object(object), &PropertyKey::Index(index))? {
            JsValue::Undefined | JsValue::Null => {}
            value => out.push_str(interp.to_js_string(&value)?.as_str()),
        }
    }
    Ok(JsValue::from(out))
}

pub fn array_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    array_join(interp, this, &[])
}

pub fn array_index_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "indexOf")?;
    let target = arg(args, 0);
    let length = length_of(interp, object)?;
    let start = relative_position(interp, &arg(args, 1), length, 0)?;
    let mut index = start;
    while let Some(found) = next_present(interp, object, index, length)? {
        let value = interp.get(&JsValue::Object(object), &PropertyKey::Index(found))?;
        if value.strict_equals(&target) {
            return Ok(JsValue::from(found));
        }
        index = found + 1;
    }
    Ok(JsValue::Number(-1.0))
}

/// SameValueZero: like `===` but NaN finds NaN. Holes read as `undefined`.
pub fn array_includes(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "includes")?;
    let target = arg(args, 0);
    let length = length_of(interp, object)?;
    let start = relative_position(interp, &arg(args, 1), length, 0)?;
    for index in start..length {
        interp.check_budget()?;
        let value = interp.get(&JsValue::Object(object), &PropertyKey::Index(index))?;
        let same = match (&value, &target) {
            (JsValue::Number(a), JsValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => value.strict_equals(&target),
        };
        if same {
            return Ok(JsValue::Boolean(true));
        }
    }
    Ok(JsValue::Boolean(false))
}

pub fn array_slice(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "slice")?;
    let length = length_of(interp, object)?;
    let start = relative_position(interp, &arg(args, 0), length, 0)?;
    let end = relative_position(interp, &arg(args, 1), length, length)?;

    let result = interp.create_array(Vec::new());
    let mut from = start;
    while let Some(found) = next_present(interp, object, from, end)? {
        let value = interp.get(&JsValue::Object(object), &PropertyKey::Index(found))?;
        interp.put(&JsValue::Object(result), PropertyKey::Index(found - start), value)?;
        from = found + 1;
    }
    interp.heap.set_array_length(result, end.saturating_sub(start))?;
    Ok(JsValue::Object(result))
}

/// Arrays among the arguments are flattened one level, holes preserved.
pub fn array_concat(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "concat")?;
    let result = interp.create_array(Vec::new());
    let mut next: u32 = 0;

    let items = std::iter::once(JsValue::Object(object)).chain(args.iter().cloned());
    for item in items {
        let spread = match &item {
            JsValue::Object(id) if interp.heap.is_array(*id)? => Some(*id),
            _ => None,
        };
        match spread {
            Some(source) => {
                let length = length_of(interp, source)?;
                let mut index = 0;
                while let Some(found) = next_present(interp, source, index, length)? {
                    let value = interp.get(&JsValue::Object(source), &PropertyKey::Index(found))?;
                    interp.put(&JsValue::Object(result), PropertyKey::Index(next.saturating_add(found)), value)?;
                    index = found + 1;
                }
                next = next.saturating_add(length);
            }
            None => {
                interp.put(&JsValue::Object(result), PropertyKey::Index(next), item)?;
                next = next.saturating_add(1);
            }
        }
    }
    interp.heap.set_array_length(result, next)?;
    Ok(JsValue::Object(result))
}

/// Calls `callback(element, index, object)` for every present element.
fn each_present(
    interp: &mut Interpreter,
    object: ObjectId,
    args: &[JsValue],
    mut visit: impl FnMut(&mut Interpreter, u32, JsValue, JsValue) -> Result<bool, JsError>,
) -> Result<(), JsError> {
    let callback = callback_arg(interp, args)?;
    let this_arg = arg(args, 1);
    let length = length_of(interp, object)?;
    let mut index = 0;
    while let Some(found) = next_present(interp, object, index, length)? {
        let value = interp.get(&JsValue::Object(object), &PropertyKey::Index(found))?;
        let result = interp.call_function(
            &callback,
            this_arg.clone(),
            &[value.clone(), JsValue::from(found), JsValue::Object(object)],
        )?;
        if !visit(interp, found, value, result)? {
            break;
        }
        index = found + 1;
    }
    Ok(())
}

pub fn array_for_each(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "forEach")?;
    each_present(interp, object, args, |_, _, _, _| Ok(true))?;
    Ok(JsValue::Undefined)
}

pub fn array_map(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "map")?;
    let length = length_of(interp, object)?;
    let result = interp.create_array(Vec::new());
    interp.heap.set_array_length(result, length)?;
    each_present(interp, object, args, |interp, index, _, mapped| {
        interp.put(&JsValue::Object(result), PropertyKey::Index(index), mapped)?;
        Ok(true)
    })?;
    Ok(JsValue::Object(result))
}

pub fn array_filter(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "filter")?;
    let mut kept = Vec::new();
    each_present(interp, object, args, |_, _, value, keep| {
        if keep.to_boolean() {
            kept.push(value);
        }
        Ok(true)
    })?;
    Ok(JsValue::Object(interp.create_array(kept)))
}

pub fn array_find(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "find")?;
    let callback = callback_arg(interp, args)?;
    let this_arg = arg(args, 1);
    let length = length_of(interp, object)?;
    // unlike forEach, find visits holes as undefined
    for index in 0..length {
        interp.check_budget()?;
        let value = interp.get(&JsValue::Object(object), &PropertyKey::Index(index))?;
        let found = interp.call_function(
            &callback,
            this_arg.clone(),
            &[value.clone(), JsValue::from(index), JsValue::Object(object)],
        )?;
        if found.to_boolean() {
            return Ok(value);
        }
    }
    Ok(JsValue::Undefined)
}

pub fn array_some(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "some")?;
    let mut any = false;
    each_present(interp, object, args, |_, _, _, result| {
        any = result.to_boolean();
        Ok(!any)
    })?;
    Ok(JsValue::Boolean(any))
}

pub fn array_every(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "every")?;
    let mut all = true;
    each_present(interp, object, args, |_, _, _, result| {
        all = result.to_boolean();
        Ok(all)
    })?;
    Ok(JsValue::Boolean(all))
}

pub fn array_reduce(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let object = this_object(interp, &this, "reduce")?;
    let callback = callback_arg(interp, args)?;
    let length = length_of(interp, object)?;

    let mut index = 0;
    let mut accumulator = match args.get(1) {
        Some(initial) => initial.clone(),
        None => {
            let Some(first) = next_present(interp, object, 0, length)? else {
                return Err(JsError::type_error(
                    "Reduce of empty array with no initial value",
                ));
            };
            index = first + 1;
            interp.get(&JsValue::Object(object), &PropertyKey::Index(first))?
        }
    };
    while let Some(found) = next_present(interp, object, index, length)? {
        let value = interp.get(&JsValue::Object(object), &PropertyKey::Index(found))?;
        accumulator = interp.call_function(
            &callback,
            JsValue::Undefined,
            &[accumulator, value, JsValue::from(found), JsValue::Object(object)],
        )?;
        index = found + 1;
    }
    Ok(accumulator)
}

/// `Array.prototype.values()` and `[Symbol.iterator]()`
pub fn array_values(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let array = this_object(interp, &this, "values")?;
    let iterator = interp.heap.alloc(ObjectRecord::new(
        Some(interp.intrinsics.array_iterator_prototype),
        ObjectKind::ArrayIterator {
            array,
            next_index: 0,
            done: false,
        },
    ));
    Ok(JsValue::Object(iterator))
}

/// `%ArrayIteratorPrototype%.next()`
pub fn array_iterator_next(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(iterator) = this else {
        return Err(JsError::type_error(
            "next method called on incompatible receiver",
        ));
    };
    let step = array_iterator_step(interp, iterator)?;
    Ok(JsValue::Object(interp.create_iter_result(step.value, step.done)))
}

fn return_this(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(this)
}

//! Arena storage for objects and scope frames
//!
//! Records live in generational slot arenas and are addressed by
//! `ObjectId`/`FrameId` handles. Nothing is freed while script code runs:
//! the event loop calls [`Heap::collect_garbage`] at task boundaries with the
//! interpreter's roots, and everything not reachable from them is released.

use crate::error::JsError;
use crate::object::{FunctionKind, ObjectKind, ObjectRecord};
use crate::property::Property;
use crate::scope::ScopeFrame;
use crate::value::{FrameId, JsString, JsValue, ObjectId, PropertyKey};

/// Upper bound on prototype chain length before a lookup gives up.
const MAX_PROTOTYPE_DEPTH: usize = 10_000;

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena with a free list; freed slots bump their generation so old
/// handles stop resolving.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Arena<T> {
    fn alloc(&mut self, value: T) -> (u32, u32) {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.value = Some(value);
                return (index, slot.generation);
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        (index, 0)
    }

    fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_ref())
    }

    fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Free every occupied slot whose mark is unset. Returns the count freed.
    fn sweep(&mut self, marks: &[bool]) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let marked = marks.get(index).copied().unwrap_or(false);
            if slot.value.is_some() && !marked {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        freed
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

/// Outcome of one collection cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    pub objects_freed: usize,
    pub frames_freed: usize,
    pub objects_live: usize,
    pub frames_live: usize,
}

#[derive(Debug, Default)]
pub struct Heap {
    objects: Arena<ObjectRecord>,
    frames: Arena<ScopeFrame>,
    allocations_since_gc: usize,
    gc_runs: u64,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, record: ObjectRecord) -> ObjectId {
        self.allocations_since_gc += 1;
        let (index, generation) = self.objects.alloc(record);
        ObjectId { index, generation }
    }

    pub fn alloc_frame(&mut self, frame: ScopeFrame) -> FrameId {
        self.allocations_since_gc += 1;
        let (index, generation) = self.frames.alloc(frame);
        FrameId { index, generation }
    }

    pub fn object(&self, id: ObjectId) -> Result<&ObjectRecord, JsError> {
        self.objects
            .get(id.index, id.generation)
            .ok_or_else(|| JsError::internal_error(format!("stale object handle {:?}", id)))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut ObjectRecord, JsError> {
        self.objects
            .get_mut(id.index, id.generation)
            .ok_or_else(|| JsError::internal_error(format!("stale object handle {:?}", id)))
    }

    pub fn frame(&self, id: FrameId) -> Result<&ScopeFrame, JsError> {
        self.frames
            .get(id.index, id.generation)
            .ok_or_else(|| JsError::internal_error(format!("stale frame handle {:?}", id)))
    }

    pub fn frame_mut(&mut self, id: FrameId) -> Result<&mut ScopeFrame, JsError> {
        self.frames
            .get_mut(id.index, id.generation)
            .ok_or_else(|| JsError::internal_error(format!("stale frame handle {:?}", id)))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.get(id.index, id.generation).is_some()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn allocations_since_gc(&self) -> usize {
        self.allocations_since_gc
    }

    pub fn gc_runs(&self) -> u64 {
        self.gc_runs
    }

    /// Own property including the virtual ones exotic kinds expose
    /// (`length` of arrays, characters of string wrappers).
    pub fn own_property(&self, id: ObjectId, key: &PropertyKey) -> Result<Option<Property>, JsError> {
        let record = self.object(id)?;
        match &record.kind {
            ObjectKind::Array { length } if key.eq_str("length") => {
                return Ok(Some(Property::Data {
                    value: JsValue::from(*length),
                    writable: true,
                    enumerable: false,
                    configurable: false,
                }));
            }
            ObjectKind::StringWrapper(s) => {
                if key.eq_str("length") {
                    return Ok(Some(Property::constant(JsValue::Number(s.js_len() as f64))));
                }
                if let Some(ch) = key.as_index().and_then(|i| char_at(s, i)) {
                    return Ok(Some(Property::Data {
                        value: JsValue::String(ch),
                        writable: false,
                        enumerable: true,
                        configurable: false,
                    }));
                }
            }
            _ => {}
        }
        Ok(record.properties.get(key).cloned())
    }

    /// Walk the prototype chain from `id`; returns the holder and property.
    pub fn lookup(
        &self,
        id: ObjectId,
        key: &PropertyKey,
    ) -> Result<Option<(ObjectId, Property)>, JsError> {
        let mut current = Some(id);
        let mut depth = 0;
        while let Some(holder) = current {
            if let Some(prop) = self.own_property(holder, key)? {
                return Ok(Some((holder, prop)));
            }
            depth += 1;
            if depth > MAX_PROTOTYPE_DEPTH {
                return Err(JsError::internal_error("prototype chain too deep"));
            }
            current = self.object(holder)?.prototype;
        }
        Ok(None)
    }

    pub fn has_property(&self, id: ObjectId, key: &PropertyKey) -> Result<bool, JsError> {
        Ok(self.lookup(id, key)?.is_some())
    }

    pub fn has_own_property(&self, id: ObjectId, key: &PropertyKey) -> Result<bool, JsError> {
        Ok(self.own_property(id, key)?.is_some())
    }

    /// Smallest index `>= from` held by `id` or any of its prototypes.
    pub fn next_index_in_chain(&self, id: ObjectId, from: u32) -> Result<Option<u32>, JsError> {
        let mut found: Option<u32> = None;
        let mut current = Some(id);
        let mut depth = 0;
        while let Some(holder) = current {
            let record = self.object(holder)?;
            let virtual_index = match &record.kind {
                ObjectKind::StringWrapper(s) if u64::from(from) < s.js_len() as u64 => Some(from),
                _ => None,
            };
            for candidate in [record.properties.next_index(from), virtual_index]
                .into_iter()
                .flatten()
            {
                found = Some(found.map_or(candidate, |best| best.min(candidate)));
            }
            depth += 1;
            if depth > MAX_PROTOTYPE_DEPTH {
                return Err(JsError::internal_error("prototype chain too deep"));
            }
            current = record.prototype;
        }
        Ok(found)
    }

    /// Own keys in enumeration order, virtual keys included.
    pub fn own_keys(&self, id: ObjectId) -> Result<Vec<PropertyKey>, JsError> {
        let record = self.object(id)?;
        let mut keys = record.properties.keys();
        match &record.kind {
            ObjectKind::Array { .. } => {
                let split = keys.iter().take_while(|k| k.as_index().is_some()).count();
                keys.insert(split, PropertyKey::from("length"));
            }
            ObjectKind::StringWrapper(s) => {
                let count = s.js_len() as u32;
                let mut chars: Vec<PropertyKey> = (0..count).map(PropertyKey::Index).collect();
                chars.push(PropertyKey::from("length"));
                chars.extend(keys);
                keys = chars;
            }
            _ => {}
        }
        Ok(keys)
    }

    /// Whether `proto` appears on the prototype chain of `id` (excluding `id`).
    pub fn inherits_from(&self, id: ObjectId, proto: ObjectId) -> Result<bool, JsError> {
        let mut current = self.object(id)?.prototype;
        let mut depth = 0;
        while let Some(p) = current {
            if p == proto {
                return Ok(true);
            }
            depth += 1;
            if depth > MAX_PROTOTYPE_DEPTH {
                return Err(JsError::internal_error("prototype chain too deep"));
            }
            current = self.object(p)?.prototype;
        }
        Ok(false)
    }

    /// Mark everything reachable from the roots and free the rest.
    ///
    /// Must only run when no evaluation is in progress: handles held on the
    /// Rust stack are not roots.
    pub fn collect_garbage(
        &mut self,
        value_roots: impl IntoIterator<Item = JsValue>,
        frame_roots: impl IntoIterator<Item = FrameId>,
    ) -> GcStats {
        self.gc_runs += 1;
        self.allocations_since_gc = 0;

        let mut object_marks = vec![false; self.objects.slots.len()];
        let mut frame_marks = vec![false; self.frames.slots.len()];
        let mut work: Vec<Trace> = Vec::new();
        work.extend(value_roots.into_iter().filter_map(Trace::value));
        work.extend(frame_roots.into_iter().map(Trace::Frame));

        while let Some(item) = work.pop() {
            match item {
                Trace::Object(id) => {
                    let Some(record) = self.objects.get(id.index, id.generation) else {
                        continue;
                    };
                    let Some(mark) = object_marks.get_mut(id.index as usize) else {
                        continue;
                    };
                    if *mark {
                        continue;
                    }
                    *mark = true;
                    trace_record(record, &mut work);
                }
                Trace::Frame(id) => {
                    let Some(frame) = self.frames.get(id.index, id.generation) else {
                        continue;
                    };
                    let Some(mark) = frame_marks.get_mut(id.index as usize) else {
                        continue;
                    };
                    if *mark {
                        continue;
                    }
                    *mark = true;
                    work.extend(frame.outer.map(Trace::Frame));
                    work.extend(frame.this_value.as_ref().and_then(|v| Trace::value(v.clone())));
                    work.extend(
                        frame
                            .bindings
                            .values()
                            .filter_map(|b| Trace::value(b.value.clone())),
                    );
                }
            }
        }

        let objects_freed = self.objects.sweep(&object_marks);
        let frames_freed = self.frames.sweep(&frame_marks);
        let stats = GcStats {
            objects_freed,
            frames_freed,
            objects_live: self.objects.len(),
            frames_live: self.frames.len(),
        };
        tracing::debug!(
            run = self.gc_runs,
            objects_freed,
            frames_freed,
            objects_live = stats.objects_live,
            "gc cycle finished"
        );
        stats
    }
}

enum Trace {
    Object(ObjectId),
    Frame(FrameId),
}

impl Trace {
    fn value(value: JsValue) -> Option<Trace> {
        value.as_object().map(Trace::Object)
    }
}

fn trace_record(record: &ObjectRecord, work: &mut Vec<Trace>) {
    work.extend(record.prototype.map(Trace::Object));
    for (_, prop) in record.properties.iter() {
        match prop {
            Property::Data { value, .. } => work.extend(Trace::value(value.clone())),
            Property::Accessor { getter, setter, .. } => {
                work.extend(getter.map(Trace::Object));
                work.extend(setter.map(Trace::Object));
            }
        }
    }
    match &record.kind {
        ObjectKind::Function(FunctionKind::Script { closure, .. }) => {
            work.push(Trace::Frame(*closure));
        }
        ObjectKind::Function(FunctionKind::Capturing { captures, .. }) => {
            work.extend(captures.iter().filter_map(|v| Trace::value(v.clone())));
        }
        ObjectKind::Function(FunctionKind::PromiseResolver { promise, .. }) => {
            work.push(Trace::Object(*promise));
        }
        ObjectKind::Promise(state) => {
            work.extend(Trace::value(state.result.clone()));
            for reaction in state.fulfill_reactions.iter().chain(&state.reject_reactions) {
                work.extend(reaction.capability.map(Trace::Object));
                work.extend(reaction.handler.clone().and_then(Trace::value));
            }
        }
        ObjectKind::ArrayIterator { array, .. } => work.push(Trace::Object(*array)),
        ObjectKind::Ordinary
        | ObjectKind::Array { .. }
        | ObjectKind::Function(FunctionKind::Native { .. })
        | ObjectKind::Error(_)
        | ObjectKind::RegExp { .. }
        | ObjectKind::BooleanWrapper(_)
        | ObjectKind::NumberWrapper(_)
        | ObjectKind::StringWrapper(_) => {}
    }
}

/// Character at a UTF-16 index, for string indexing.
pub fn char_at(s: &JsString, index: u32) -> Option<JsString> {
    let unit = s.as_str().encode_utf16().nth(index as usize)?;
    Some(JsString::from(String::from_utf16_lossy(&[unit])))
}

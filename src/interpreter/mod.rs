//! Tree-walking interpreter
//!
//! `Interpreter` owns the heap, the scope chain cursor, the intrinsic
//! objects and the task scheduler. Statements are executed in
//! [`exec_stmt`], expressions in [`eval_expr`] and the task loop lives in
//! [`event_loop`]. This module holds the object-model operations the other
//! parts share: property reads and writes through accessors, calls,
//! construction and primitive conversion.

pub mod builtins;
mod eval_expr;
mod event_loop;
mod exec_stmt;

pub use builtins::Intrinsics;
pub use event_loop::{FaultKind, HostCallback, HostTimer, Job, MacroTask, TaskFault};

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::array;
use crate::ast::{FunctionBody, FunctionDef, Program, Statement};
use crate::completion::{Completion, ControlSignal};
use crate::config::RuntimeConfig;
use crate::error::{ErrorKind, JsError};
use crate::heap::{GcStats, Heap, char_at};
use crate::object::{CapturingFn, FunctionKind, NativeFn, ObjectKind, ObjectRecord, PromiseState};
use crate::platform::{ConsoleLevel, ConsoleProvider, PatternMatcher, StdConsoleProvider};
use crate::property::{Property, PropertyDescriptor};
use crate::scheduler::{Scheduler, TaskId};
use crate::scope::{BindingKind, ScopeFrame};
use crate::value::{CheapClone, FrameId, JsString, JsSymbol, JsValue, ObjectId, PropertyKey};

/// Id of the well-known `Symbol.iterator`.
const ITERATOR_SYMBOL_ID: u64 = 1;

/// Seed for `Math.random` from the wall clock.
fn random_seed() -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    // xorshift never leaves zero
    (nanos ^ 0x9E37_79B9_7F4A_7C15) | 1
}

/// Hint for ToPrimitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

/// The interpreter state
pub struct Interpreter {
    /// Arena owning every object and scope frame
    pub heap: Heap,
    /// Prototype objects created at startup (rooted)
    pub intrinsics: Intrinsics,
    /// Global object (rooted): built-ins live here
    pub global: ObjectId,
    /// Global frame (rooted): script-level declarations live here
    pub global_frame: FrameId,
    /// Current frame; changes on calls and block entry
    pub(crate) env: FrameId,
    pub(crate) scheduler: Scheduler<Job, MacroTask>,
    pub(crate) config: RuntimeConfig,
    console: Box<dyn ConsoleProvider>,
    pub(crate) matcher: Box<dyn PatternMatcher>,
    call_depth: usize,
    /// Object under construction while a native runs through `new`
    new_target: Option<ObjectId>,
    deadline: Option<Instant>,
    /// Task currently running, for fault attribution
    current_task: TaskId,
    pub(crate) faults: Vec<TaskFault>,
    /// Promises rejected without a handler during the current drain
    pub(crate) pending_rejections: Vec<(ObjectId, TaskId)>,
    /// Values the host asked to keep alive across collections
    retained: Vec<JsValue>,
    /// Value carried by the last program's completion, thrown values
    /// included, so the host can still read it after the queues drain
    last_value: JsValue,
    next_symbol_id: u64,
    /// xorshift state behind `Math.random`, never zero
    pub(crate) random_state: u64,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut heap = Heap::new();
        let intrinsics = Intrinsics::allocate(&mut heap);
        let global = heap.alloc(ObjectRecord::new(
            Some(intrinsics.object_prototype),
            ObjectKind::Ordinary,
        ));
        let global_frame = heap.alloc_frame(ScopeFrame::new(None, true));

        let mut interp = Self {
            heap,
            intrinsics,
            global,
            global_frame,
            env: global_frame,
            scheduler: Scheduler::new(),
            config,
            console: Box::new(StdConsoleProvider::new()),
            matcher: crate::platform::default_pattern_matcher(),
            call_depth: 0,
            new_target: None,
            deadline: None,
            current_task: TaskId::from_u64(0),
            faults: Vec::new(),
            pending_rejections: Vec::new(),
            retained: Vec::new(),
            last_value: JsValue::Undefined,
            next_symbol_id: ITERATOR_SYMBOL_ID + 1,
            random_state: random_seed(),
        };
        builtins::init(&mut interp);
        interp
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Replace the console sink. Returns the previous one.
    pub fn set_console(&mut self, console: Box<dyn ConsoleProvider>) -> Box<dyn ConsoleProvider> {
        std::mem::replace(&mut self.console, console)
    }

    pub fn set_pattern_matcher(&mut self, matcher: Box<dyn PatternMatcher>) {
        self.matcher = matcher;
    }

    pub fn set_gc_threshold(&mut self, threshold: usize) {
        self.config.gc_threshold = threshold;
    }

    // ═══════════════════════════════════════════════════════════════
    // Evaluator entry points
    // ═══════════════════════════════════════════════════════════════

    /// Evaluate a program in the global frame.
    ///
    /// Catchable faults come back as `ControlSignal::Throw` carrying a script
    /// value; only host-level failures (timeout, internal) are `Err`.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<ControlSignal, JsError> {
        self.run_in_frame(&program.body, self.global_frame)
    }

    /// Evaluate statements with `frame` as the current frame.
    pub fn run_in_frame(
        &mut self,
        body: &[Statement],
        frame: FrameId,
    ) -> Result<ControlSignal, JsError> {
        self.heap.frame(frame)?;
        let saved = std::mem::replace(&mut self.env, frame);
        let result = self.execute_body(body);
        self.env = saved;
        let signal = self.signal_from(result)?;
        match &signal {
            ControlSignal::Normal(value)
            | ControlSignal::Return(value)
            | ControlSignal::Throw(value) => self.last_value = value.clone(),
            ControlSignal::Break(_) | ControlSignal::Continue(_) => {}
        }
        Ok(signal)
    }

    fn signal_from(&mut self, result: Result<Completion, JsError>) -> Result<ControlSignal, JsError> {
        match result {
            Ok(completion) => Ok(completion.into()),
            Err(err) if err.is_catchable() => Ok(ControlSignal::Throw(self.error_to_value(err)?)),
            Err(err) => Err(err),
        }
    }

    /// Reset per-task limits before running a task.
    pub(crate) fn begin_task(&mut self, task: TaskId) {
        self.current_task = task;
        self.call_depth = 0;
        self.new_target = None;
        self.env = self.global_frame;
        self.deadline = (self.config.timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(self.config.timeout_ms));
    }

    pub(crate) fn current_task(&self) -> TaskId {
        self.current_task
    }

    /// Fail with `Timeout` once the task's wall-clock budget is spent.
    pub(crate) fn check_budget(&self) -> Result<(), JsError> {
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(JsError::Timeout {
                timeout_ms: self.config.timeout_ms,
            });
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════
    // Object creation
    // ═══════════════════════════════════════════════════════════════

    pub fn create_object(&mut self) -> ObjectId {
        self.heap.alloc(ObjectRecord::new(
            Some(self.intrinsics.object_prototype),
            ObjectKind::Ordinary,
        ))
    }

    pub fn create_array(&mut self, values: Vec<JsValue>) -> ObjectId {
        self.heap
            .alloc_array(Some(self.intrinsics.array_prototype), values)
    }

    pub fn create_promise(&mut self) -> ObjectId {
        self.heap.alloc(ObjectRecord::new(
            Some(self.intrinsics.promise_prototype),
            ObjectKind::Promise(PromiseState::new()),
        ))
    }

    /// `{ value, done }` as returned by iterator `next` methods.
    pub fn create_iter_result(&mut self, value: JsValue, done: bool) -> ObjectId {
        let obj = self.create_object();
        self.define_builtin(obj, "value", Property::data(value));
        self.define_builtin(obj, "done", Property::data(JsValue::Boolean(done)));
        obj
    }

    fn alloc_function(&mut self, kind: FunctionKind, name: JsString, arity: u32) -> ObjectId {
        let func = self.heap.alloc(ObjectRecord::new(
            Some(self.intrinsics.function_prototype),
            ObjectKind::Function(kind),
        ));
        self.define_builtin(
            func,
            "length",
            Property::Data {
                value: JsValue::from(arity),
                writable: false,
                enumerable: false,
                configurable: true,
            },
        );
        self.define_builtin(
            func,
            "name",
            Property::Data {
                value: JsValue::String(name),
                writable: false,
                enumerable: false,
                configurable: true,
            },
        );
        func
    }

    pub fn create_native_function(&mut self, name: &str, func: NativeFn, arity: u32) -> ObjectId {
        let name = JsString::from(name);
        self.alloc_function(
            FunctionKind::Native {
                name: name.cheap_clone(),
                func,
                arity,
                constructable: false,
            },
            name,
            arity,
        )
    }

    /// A native constructor wired to `prototype` in both directions.
    pub fn create_constructor(
        &mut self,
        name: &str,
        func: NativeFn,
        arity: u32,
        prototype: ObjectId,
    ) -> ObjectId {
        let js_name = JsString::from(name);
        let ctor = self.alloc_function(
            FunctionKind::Native {
                name: js_name.cheap_clone(),
                func,
                arity,
                constructable: true,
            },
            js_name,
            arity,
        );
        self.define_builtin(
            ctor,
            "prototype",
            Property::Data {
                value: JsValue::Object(prototype),
                writable: false,
                enumerable: false,
                configurable: false,
            },
        );
        self.define_builtin(prototype, "constructor", Property::hidden(JsValue::Object(ctor)));
        ctor
    }

    pub fn create_capturing_function(
        &mut self,
        name: &str,
        func: CapturingFn,
        captures: Vec<JsValue>,
    ) -> ObjectId {
        let name = JsString::from(name);
        self.alloc_function(
            FunctionKind::Capturing {
                name: name.cheap_clone(),
                func,
                captures,
            },
            name,
            1,
        )
    }

    /// A script function closing over `closure`. Non-arrow functions get a
    /// fresh `prototype` object for use with `new`.
    pub(crate) fn create_script_function(&mut self, def: Rc<FunctionDef>, closure: FrameId) -> ObjectId {
        let is_arrow = def.is_arrow;
        let name = def.name.clone().unwrap_or_else(|| JsString::from(""));
        let arity = def.params.len() as u32;
        let func = self.alloc_function(FunctionKind::Script { def, closure }, name, arity);
        if !is_arrow {
            let proto = self.create_object();
            self.define_builtin(proto, "constructor", Property::hidden(JsValue::Object(func)));
            self.define_builtin(
                func,
                "prototype",
                Property::Data {
                    value: JsValue::Object(proto),
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            );
        }
        func
    }

    /// Give an anonymous function the name of the binding it is assigned to.
    pub(crate) fn set_function_name(&mut self, func: ObjectId, name: &JsString) {
        let Ok(record) = self.heap.object_mut(func) else {
            return;
        };
        let key = PropertyKey::from("name");
        let anonymous = record
            .properties
            .get(&key)
            .and_then(Property::value)
            .is_some_and(|v| matches!(v, JsValue::String(s) if s.is_empty()));
        if anonymous {
            record.properties.insert(
                key,
                Property::Data {
                    value: JsValue::String(name.cheap_clone()),
                    writable: false,
                    enumerable: false,
                    configurable: true,
                },
            );
        }
    }

    /// Insert a property unconditionally (intrinsic setup).
    pub fn define_builtin(&mut self, target: ObjectId, name: &str, prop: Property) {
        if let Ok(record) = self.heap.object_mut(target) {
            record.properties.insert(PropertyKey::from(name), prop);
        }
    }

    pub fn register_method(&mut self, target: ObjectId, name: &str, func: NativeFn, arity: u32) {
        let f = self.create_native_function(name, func, arity);
        self.define_builtin(target, name, Property::hidden(JsValue::Object(f)));
    }

    pub fn register_getter(&mut self, target: ObjectId, name: &str, func: NativeFn) {
        let getter = self.create_native_function(&format!("get {name}"), func, 0);
        if let Ok(record) = self.heap.object_mut(target) {
            record.properties.insert(
                PropertyKey::from(name),
                Property::Accessor {
                    getter: Some(getter),
                    setter: None,
                    enumerable: false,
                    configurable: true,
                },
            );
        }
    }

    /// Expose a value on the global object.
    pub fn define_global(&mut self, name: &str, value: JsValue) {
        self.define_builtin(self.global, name, Property::hidden(value));
    }

    pub fn iterator_symbol(&self) -> JsSymbol {
        JsSymbol::new(ITERATOR_SYMBOL_ID, Some(JsString::from("Symbol.iterator")))
    }

    pub fn new_symbol(&mut self, description: Option<JsString>) -> JsSymbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        JsSymbol::new(id, description)
    }

    // ═══════════════════════════════════════════════════════════════
    // Errors
    // ═══════════════════════════════════════════════════════════════

    /// A script-visible error object of the given kind.
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> ObjectId {
        let error = self.heap.alloc(ObjectRecord::new(
            Some(self.intrinsics.error_prototype_for(kind)),
            ObjectKind::Error(kind),
        ));
        self.define_builtin(error, "message", Property::hidden(JsValue::from(message)));
        error
    }

    /// An error object wrapped as a thrown value.
    pub fn throw_error(&mut self, kind: ErrorKind, message: impl AsRef<str>) -> JsError {
        JsError::Thrown(JsValue::Object(self.create_error(kind, message.as_ref())))
    }

    /// The value a `catch` clause observes for `err`. Host-level errors are
    /// handed back unchanged.
    pub fn error_to_value(&mut self, err: JsError) -> Result<JsValue, JsError> {
        if let JsError::Thrown(value) = err {
            return Ok(value);
        }
        match err.error_parts() {
            Some((kind, message)) => Ok(JsValue::Object(self.create_error(kind, &message))),
            None => Err(err),
        }
    }

    /// One-line description of an uncaught error for fault reports.
    pub fn describe_error(&self, err: &JsError) -> String {
        match err {
            JsError::Thrown(value) => self.display(value),
            other => other.to_string(),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Property access
    // ═══════════════════════════════════════════════════════════════

    fn primitive_prototype(&self, value: &JsValue) -> Option<ObjectId> {
        match value {
            JsValue::Boolean(_) => Some(self.intrinsics.boolean_prototype),
            JsValue::Number(_) => Some(self.intrinsics.number_prototype),
            JsValue::String(_) => Some(self.intrinsics.string_prototype),
            JsValue::Symbol(_) => Some(self.intrinsics.symbol_prototype),
            JsValue::Undefined | JsValue::Null | JsValue::Object(_) => None,
        }
    }

    /// `base[key]`, invoking getters with `base` as the receiver.
    pub fn get(&mut self, base: &JsValue, key: &PropertyKey) -> Result<JsValue, JsError> {
        match base {
            JsValue::Object(id) => self.get_with_receiver(*id, key, base),
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                base.to_js_string(),
                key
            ))),
            JsValue::String(s) => {
                if key.eq_str("length") {
                    return Ok(JsValue::Number(s.js_len() as f64));
                }
                if let Some(ch) = key.as_index().and_then(|i| char_at(s, i)) {
                    return Ok(JsValue::String(ch));
                }
                self.get_from_prototype(base, key)
            }
            _ => self.get_from_prototype(base, key),
        }
    }

    pub fn get_named(&mut self, base: &JsValue, name: &str) -> Result<JsValue, JsError> {
        self.get(base, &PropertyKey::from(name))
    }

    fn get_from_prototype(&mut self, base: &JsValue, key: &PropertyKey) -> Result<JsValue, JsError> {
        match self.primitive_prototype(base) {
            Some(proto) => self.get_with_receiver(proto, key, base),
            None => Ok(JsValue::Undefined),
        }
    }

    fn get_with_receiver(
        &mut self,
        id: ObjectId,
        key: &PropertyKey,
        receiver: &JsValue,
    ) -> Result<JsValue, JsError> {
        match self.heap.lookup(id, key)? {
            None => Ok(JsValue::Undefined),
            Some((_, Property::Data { value, .. })) => Ok(value),
            Some((_, Property::Accessor { getter: Some(getter), .. })) => {
                self.call_function(&JsValue::Object(getter), receiver.clone(), &[])
            }
            Some((_, Property::Accessor { getter: None, .. })) => Ok(JsValue::Undefined),
        }
    }

    /// `base[key] = value`.
    ///
    /// Writes blocked by a read-only property or a setter-less accessor are
    /// silently dropped; array `length` writes coerce and may throw.
    pub fn put(&mut self, base: &JsValue, key: PropertyKey, value: JsValue) -> Result<(), JsError> {
        match base {
            JsValue::Object(id) => self.put_on_object(*id, key, value),
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                base.to_js_string(),
                key
            ))),
            // writes to primitives go nowhere
            _ => Ok(()),
        }
    }

    fn put_on_object(&mut self, target: ObjectId, key: PropertyKey, value: JsValue) -> Result<(), JsError> {
        if key.eq_str("length") && self.heap.is_array(target)? {
            let n = self.to_number(&value)?;
            let length = array::validate_length(n)?;
            return self.heap.set_array_length(target, length);
        }
        match self.heap.lookup(target, &key)? {
            Some((_, Property::Accessor { setter: Some(setter), .. })) => {
                self.call_function(&JsValue::Object(setter), JsValue::Object(target), &[value])?;
                Ok(())
            }
            Some((_, Property::Accessor { setter: None, .. }))
            | Some((_, Property::Data { writable: false, .. })) => Ok(()),
            Some((_, Property::Data { .. })) | None => {
                self.heap.put_own_value(target, key, value)?;
                Ok(())
            }
        }
    }

    /// Define an own property. Array `length` values are coerced to numbers
    /// first so the array rules can validate them.
    pub fn define_property(
        &mut self,
        target: ObjectId,
        key: PropertyKey,
        mut desc: PropertyDescriptor,
    ) -> Result<bool, JsError> {
        if key.eq_str("length") && self.heap.is_array(target)? {
            if let Some(value) = desc.value.take() {
                desc.value = Some(JsValue::Number(self.to_number(&value)?));
            }
        }
        self.heap.define_own_property(target, key, desc)
    }

    pub fn delete_property(&mut self, target: ObjectId, key: &PropertyKey) -> Result<bool, JsError> {
        self.heap.delete_own_property(target, key)
    }

    // ═══════════════════════════════════════════════════════════════
    // Calls
    // ═══════════════════════════════════════════════════════════════

    pub fn is_callable(&self, value: &JsValue) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap.object(id).ok())
            .is_some_and(ObjectRecord::is_callable)
    }

    pub fn is_constructor(&self, value: &JsValue) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap.object(id).ok())
            .is_some_and(|record| match &record.kind {
                ObjectKind::Function(f) => f.is_constructor(),
                _ => false,
            })
    }

    /// The object a native constructor should initialise, when called via `new`.
    pub fn new_target(&self) -> Option<ObjectId> {
        self.new_target
    }

    pub fn call_function(
        &mut self,
        callee: &JsValue,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        self.invoke(callee, this, args, None)
    }

    fn invoke(
        &mut self,
        callee: &JsValue,
        this: JsValue,
        args: &[JsValue],
        new_target: Option<ObjectId>,
    ) -> Result<JsValue, JsError> {
        let kind = match callee
            .as_object()
            .map(|id| self.heap.object(id))
            .transpose()?
            .map(|record| &record.kind)
        {
            Some(ObjectKind::Function(kind)) => kind.clone(),
            _ => {
                return Err(JsError::type_error(format!(
                    "{} is not a function",
                    self.inspect(callee)
                )));
            }
        };
        if self.call_depth >= self.config.max_call_depth {
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }
        self.check_budget()?;

        self.call_depth += 1;
        let saved_target = std::mem::replace(&mut self.new_target, new_target);
        let result = match kind {
            FunctionKind::Script { def, closure } => self.call_script(&def, closure, this, args),
            FunctionKind::Native { func, .. } => func(self, this, args),
            FunctionKind::Capturing { func, captures, .. } => func(self, &captures, this, args),
            FunctionKind::PromiseResolver {
                promise,
                already_resolved,
                reject,
            } => builtins::promise::run_resolver(self, promise, &already_resolved, reject, args),
        };
        self.new_target = saved_target;
        self.call_depth -= 1;
        result
    }

    fn call_script(
        &mut self,
        def: &Rc<FunctionDef>,
        closure: FrameId,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        let mut frame = ScopeFrame::new(Some(closure), true);
        if !def.is_arrow {
            frame.this_value = Some(this);
        }
        for (i, param) in def.params.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or_default();
            frame.declare(param.cheap_clone(), arg, BindingKind::Parameter)?;
        }
        let frame = self.heap.alloc_frame(frame);
        let saved = std::mem::replace(&mut self.env, frame);
        let result = match &def.body {
            FunctionBody::Expression(expr) => self.evaluate(expr),
            FunctionBody::Block(body) => self.execute_body(body).and_then(|c| match c {
                Completion::Normal(_) => Ok(JsValue::Undefined),
                Completion::Return(value) => Ok(value),
                Completion::Break(_) | Completion::Continue(_) => Err(JsError::internal_error(
                    "break or continue escaped a function body",
                )),
            }),
        };
        self.env = saved;
        result
    }

    /// `new callee(...args)`
    pub fn construct(&mut self, callee: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
        if !self.is_constructor(callee) {
            return Err(JsError::type_error(format!(
                "{} is not a constructor",
                self.inspect(callee)
            )));
        }
        let proto = match self.get_named(callee, "prototype")? {
            JsValue::Object(proto) => proto,
            _ => self.intrinsics.object_prototype,
        };
        let this = self
            .heap
            .alloc(ObjectRecord::new(Some(proto), ObjectKind::Ordinary));
        let result = self.invoke(callee, JsValue::Object(this), args, Some(this))?;
        Ok(match result {
            JsValue::Object(_) => result,
            _ => JsValue::Object(this),
        })
    }

    // ═══════════════════════════════════════════════════════════════
    // Conversions
    // ═══════════════════════════════════════════════════════════════

    /// ToPrimitive: `valueOf`/`toString` in hint order.
    pub fn to_primitive(&mut self, value: &JsValue, hint: PreferredType) -> Result<JsValue, JsError> {
        if !matches!(value, JsValue::Object(_)) {
            return Ok(value.clone());
        }
        let order = match hint {
            PreferredType::String => ["toString", "valueOf"],
            PreferredType::Number | PreferredType::Default => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get_named(value, name)?;
            if self.is_callable(&method) {
                let result = self.call_function(&method, value.clone(), &[])?;
                if !matches!(result, JsValue::Object(_)) {
                    return Ok(result);
                }
            }
        }
        Err(JsError::type_error("Cannot convert object to primitive value"))
    }

    pub fn to_number(&mut self, value: &JsValue) -> Result<f64, JsError> {
        match value {
            JsValue::Symbol(_) => Err(JsError::type_error(
                "Cannot convert a Symbol value to a number",
            )),
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::Number)?;
                self.to_number(&prim)
            }
            other => Ok(other.to_number()),
        }
    }

    pub fn to_js_string(&mut self, value: &JsValue) -> Result<JsString, JsError> {
        match value {
            JsValue::Symbol(_) => Err(JsError::type_error(
                "Cannot convert a Symbol value to a string",
            )),
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                self.to_js_string(&prim)
            }
            other => Ok(other.to_js_string()),
        }
    }

    pub fn to_property_key(&mut self, value: &JsValue) -> Result<PropertyKey, JsError> {
        match value {
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                Ok(PropertyKey::from_value(&prim))
            }
            other => Ok(PropertyKey::from_value(other)),
        }
    }

    /// ToObject: primitives are wrapped, `null`/`undefined` rejected.
    pub fn to_object(&mut self, value: &JsValue) -> Result<ObjectId, JsError> {
        let kind = match value {
            JsValue::Object(id) => return Ok(*id),
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(
                    "Cannot convert undefined or null to object",
                ));
            }
            JsValue::Boolean(b) => ObjectKind::BooleanWrapper(*b),
            JsValue::Number(n) => ObjectKind::NumberWrapper(*n),
            JsValue::String(s) => ObjectKind::StringWrapper(s.cheap_clone()),
            JsValue::Symbol(_) => ObjectKind::Ordinary,
        };
        let proto = self.primitive_prototype(value);
        Ok(self.heap.alloc(ObjectRecord::new(proto, kind)))
    }

    // ═══════════════════════════════════════════════════════════════
    // Host output and memory
    // ═══════════════════════════════════════════════════════════════

    /// Format `values` like `console.log` and hand them to the console sink.
    pub fn emit(&self, level: ConsoleLevel, values: &[JsValue]) {
        let line = values
            .iter()
            .map(|v| self.display(v))
            .collect::<Vec<_>>()
            .join(" ");
        self.console.write(level, &line);
    }

    pub(crate) fn write_console(&self, level: ConsoleLevel, message: &str) {
        self.console.write(level, message);
    }

    /// Keep `value` alive across collections until [`Self::release_values`].
    pub fn retain_value(&mut self, value: JsValue) {
        self.retained.push(value);
    }

    pub fn release_values(&mut self) {
        self.retained.clear();
    }

    /// Sweep everything unreachable from the roots.
    ///
    /// Only call between tasks: handles held on the Rust stack or captured
    /// by host closures are not roots.
    pub fn collect_garbage(&mut self) -> GcStats {
        let mut roots: Vec<JsValue> = vec![JsValue::Object(self.global), self.last_value.clone()];
        roots.extend(self.intrinsics.all().into_iter().map(JsValue::Object));
        roots.extend(self.retained.iter().cloned());
        roots.extend(
            self.pending_rejections
                .iter()
                .map(|(promise, _)| JsValue::Object(*promise)),
        );
        for job in self.scheduler.microtask_payloads() {
            job.trace_roots(&mut roots);
        }
        for task in self.scheduler.macrotask_payloads() {
            task.trace_roots(&mut roots);
        }
        self.heap
            .collect_garbage(roots, [self.global_frame, self.env])
    }

    pub(crate) fn maybe_collect_garbage(&mut self) {
        let threshold = self.config.gc_threshold;
        if threshold > 0 && self.heap.allocations_since_gc() >= threshold {
            self.collect_garbage();
        }
    }
}

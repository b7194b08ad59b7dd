//! Object records stored in the heap arena

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDef;
use crate::error::{ErrorKind, JsError};
use crate::interpreter::Interpreter;
use crate::property::PropertyStore;
use crate::value::{FrameId, JsString, JsValue, ObjectId};

/// Signature of a built-in function: interpreter, `this`, arguments.
pub type NativeFn = fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError>;

/// Built-in that also receives values captured when it was created.
pub type CapturingFn =
    fn(&mut Interpreter, &[JsValue], JsValue, &[JsValue]) -> Result<JsValue, JsError>;

/// One object: its own properties, a lookup-only prototype link and a kind tag.
#[derive(Debug)]
pub struct ObjectRecord {
    pub properties: PropertyStore,
    /// Lookup relation only. The arena owns every record; the link is
    /// followed during lookups and treated as a reachability edge by the sweep.
    pub prototype: Option<ObjectId>,
    pub kind: ObjectKind,
    pub extensible: bool,
}

impl ObjectRecord {
    pub fn new(prototype: Option<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            properties: PropertyStore::new(),
            prototype,
            kind,
            extensible: true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array { .. })
    }
}

#[derive(Debug)]
pub enum ObjectKind {
    Ordinary,
    /// Exotic array; `length` is stored here and surfaced as a virtual
    /// own property.
    Array { length: u32 },
    Function(FunctionKind),
    Promise(PromiseState),
    Error(ErrorKind),
    RegExp { source: JsString, flags: JsString },
    BooleanWrapper(bool),
    NumberWrapper(f64),
    StringWrapper(JsString),
    ArrayIterator { array: ObjectId, next_index: u32, done: bool },
}

#[derive(Clone)]
pub enum FunctionKind {
    /// A function defined by script code, closing over `closure`.
    Script {
        def: Rc<FunctionDef>,
        closure: FrameId,
    },
    Native {
        name: JsString,
        func: NativeFn,
        arity: u32,
        constructable: bool,
    },
    Capturing {
        name: JsString,
        func: CapturingFn,
        captures: Vec<JsValue>,
    },
    /// The resolve/reject pair handed to a promise executor. Both functions
    /// share `already_resolved` so only the first call has an effect.
    PromiseResolver {
        promise: ObjectId,
        already_resolved: Rc<Cell<bool>>,
        reject: bool,
    },
}

impl FunctionKind {
    pub fn name(&self) -> Option<JsString> {
        match self {
            FunctionKind::Script { def, .. } => def.name.clone(),
            FunctionKind::Native { name, .. } | FunctionKind::Capturing { name, .. } => {
                Some(name.clone())
            }
            FunctionKind::PromiseResolver { .. } => None,
        }
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            FunctionKind::Script { def, .. } => !def.is_arrow,
            FunctionKind::Native { constructable, .. } => *constructable,
            FunctionKind::Capturing { .. } | FunctionKind::PromiseResolver { .. } => false,
        }
    }
}

impl fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "[Function: {}]", name),
            None => write!(f, "[Function (anonymous)]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseStatus {
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Fulfill,
    Reject,
}

/// A dependent reaction registered through `then`.
#[derive(Debug, Clone)]
pub struct PromiseReaction {
    /// Derived promise settled with the handler's outcome, if any.
    pub capability: Option<ObjectId>,
    /// Callable handler; `None` passes the settlement through unchanged.
    pub handler: Option<JsValue>,
    pub kind: ReactionKind,
}

#[derive(Debug)]
pub struct PromiseState {
    pub status: PromiseStatus,
    pub result: JsValue,
    pub fulfill_reactions: Vec<PromiseReaction>,
    pub reject_reactions: Vec<PromiseReaction>,
    /// A rejection handler was attached at some point.
    pub handled: bool,
}

impl PromiseState {
    pub fn new() -> Self {
        Self {
            status: PromiseStatus::Pending,
            result: JsValue::Undefined,
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            handled: false,
        }
    }
}

impl Default for PromiseState {
    fn default() -> Self {
        Self::new()
    }
}

//! Built-in objects of the runtime's standard library

pub mod array;
#[cfg(feature = "console")]
pub mod console;
pub mod error;
pub mod function;
pub mod global;
pub mod inspect;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod promise;
pub mod regexp;
pub mod string;
pub mod symbol;
pub mod timers;

pub use array::*;
#[cfg(feature = "console")]
pub use console::*;
pub use error::*;
pub use function::*;
pub use global::*;
pub use json::*;
pub use math::*;
pub use number::*;
pub use object::*;
pub use promise::*;
pub use regexp::*;
pub use string::*;
pub use symbol::*;
pub use timers::*;

use crate::error::ErrorKind;
use crate::heap::Heap;
use crate::interpreter::Interpreter;
use crate::object::{FunctionKind, ObjectKind, ObjectRecord};
use crate::value::{JsString, JsValue, ObjectId};

/// Prototype objects shared by every instance of a built-in kind.
#[derive(Debug, Clone, Copy)]
pub struct Intrinsics {
    /// Object.prototype, root of every ordinary chain
    pub object_prototype: ObjectId,
    /// Function.prototype for all function objects
    pub function_prototype: ObjectId,
    /// Array.prototype for all array instances
    pub array_prototype: ObjectId,
    pub string_prototype: ObjectId,
    pub number_prototype: ObjectId,
    pub boolean_prototype: ObjectId,
    pub symbol_prototype: ObjectId,
    pub promise_prototype: ObjectId,
    pub regexp_prototype: ObjectId,
    /// Prototype of the objects returned by `Array.prototype.values`
    pub array_iterator_prototype: ObjectId,
    pub error_prototype: ObjectId,
    pub type_error_prototype: ObjectId,
    pub range_error_prototype: ObjectId,
    pub reference_error_prototype: ObjectId,
    pub syntax_error_prototype: ObjectId,
    /// `Array.prototype.values`, recognised by the for-of fast path
    pub array_values: ObjectId,
}

impl Intrinsics {
    /// Allocate the bare prototype objects. Methods are attached by [`init`].
    pub(crate) fn allocate(heap: &mut Heap) -> Self {
        let object_prototype = heap.alloc(ObjectRecord::new(None, ObjectKind::Ordinary));
        let mut derived = |kind: ObjectKind| heap.alloc(ObjectRecord::new(Some(object_prototype), kind));

        let function_prototype = derived(ObjectKind::Function(FunctionKind::Native {
            name: JsString::from(""),
            func: global::return_undefined,
            arity: 0,
            constructable: false,
        }));
        let array_prototype = derived(ObjectKind::Array { length: 0 });
        let string_prototype = derived(ObjectKind::StringWrapper(JsString::from("")));
        let number_prototype = derived(ObjectKind::NumberWrapper(0.0));
        let boolean_prototype = derived(ObjectKind::BooleanWrapper(false));
        let symbol_prototype = derived(ObjectKind::Ordinary);
        let promise_prototype = derived(ObjectKind::Ordinary);
        let regexp_prototype = derived(ObjectKind::Ordinary);
        let array_iterator_prototype = derived(ObjectKind::Ordinary);
        let error_prototype = derived(ObjectKind::Ordinary);

        let mut error_derived =
            || heap.alloc(ObjectRecord::new(Some(error_prototype), ObjectKind::Ordinary));
        let type_error_prototype = error_derived();
        let range_error_prototype = error_derived();
        let reference_error_prototype = error_derived();
        let syntax_error_prototype = error_derived();

        // replaced with the real function during init
        let array_values = function_prototype;

        Self {
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            symbol_prototype,
            promise_prototype,
            regexp_prototype,
            array_iterator_prototype,
            error_prototype,
            type_error_prototype,
            range_error_prototype,
            reference_error_prototype,
            syntax_error_prototype,
            array_values,
        }
    }

    pub fn error_prototype_for(&self, kind: ErrorKind) -> ObjectId {
        match kind {
            ErrorKind::Error => self.error_prototype,
            ErrorKind::TypeError => self.type_error_prototype,
            ErrorKind::RangeError => self.range_error_prototype,
            ErrorKind::ReferenceError => self.reference_error_prototype,
            ErrorKind::SyntaxError => self.syntax_error_prototype,
        }
    }

    /// Every intrinsic handle, for rooting.
    pub fn all(&self) -> [ObjectId; 16] {
        [
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
            self.string_prototype,
            self.number_prototype,
            self.boolean_prototype,
            self.symbol_prototype,
            self.promise_prototype,
            self.regexp_prototype,
            self.array_iterator_prototype,
            self.error_prototype,
            self.type_error_prototype,
            self.range_error_prototype,
            self.reference_error_prototype,
            self.syntax_error_prototype,
            self.array_values,
        ]
    }
}

/// Attach methods, constructors and global bindings.
pub(crate) fn init(interp: &mut Interpreter) {
    init_object(interp);
    init_function(interp);
    init_array(interp);
    init_string(interp);
    init_number(interp);
    init_boolean(interp);
    init_symbol(interp);
    init_error(interp);
    init_math(interp);
    init_json(interp);
    init_promise(interp);
    init_regexp(interp);
    init_timers(interp);
    init_globals(interp);
    #[cfg(feature = "console")]
    init_console(interp);
}

/// First argument or `undefined`.
pub(crate) fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or_default()
}

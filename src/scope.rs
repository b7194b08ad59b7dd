//! Scope frames and the closure environment
//!
//! Frames live in the heap arena and point at their enclosing frame by
//! handle. A function value stores the handle of the frame it was defined
//! in, so every closure created in the same frame reads and writes the same
//! bindings.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::error::{BindingError, JsError};
use crate::heap::Heap;
use crate::value::{FrameId, JsString, JsValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Function,
    Parameter,
}

impl BindingKind {
    /// Kinds that may be declared again in the same frame.
    fn is_var_like(self) -> bool {
        matches!(
            self,
            BindingKind::Var | BindingKind::Function | BindingKind::Parameter
        )
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: JsValue,
    pub kind: BindingKind,
}

impl Binding {
    pub fn mutable(&self) -> bool {
        self.kind != BindingKind::Const
    }
}

#[derive(Debug)]
pub struct ScopeFrame {
    pub bindings: IndexMap<JsString, Binding, FxBuildHasher>,
    pub outer: Option<FrameId>,
    /// Function bodies and the global frame; `var` declarations land here.
    pub function_boundary: bool,
    /// `this` for function-boundary frames of non-arrow functions.
    pub this_value: Option<JsValue>,
}

impl ScopeFrame {
    pub fn new(outer: Option<FrameId>, function_boundary: bool) -> Self {
        Self {
            bindings: IndexMap::default(),
            outer,
            function_boundary,
            this_value: None,
        }
    }

    /// Add a binding to this frame.
    ///
    /// Lexical declarations may not collide with anything already declared
    /// here; `var`-like declarations may repeat each other.
    pub fn declare(
        &mut self,
        name: JsString,
        value: JsValue,
        kind: BindingKind,
    ) -> Result<(), BindingError> {
        match self.bindings.get_mut(&name) {
            None => {
                self.bindings.insert(name, Binding { value, kind });
                Ok(())
            }
            Some(existing) if existing.kind.is_var_like() && kind.is_var_like() => {
                existing.value = value;
                if kind == BindingKind::Function {
                    existing.kind = kind;
                }
                Ok(())
            }
            Some(_) => Err(BindingError::Duplicate { name }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}

impl Heap {
    /// Find the frame declaring `name`, innermost first.
    pub fn resolve(&self, frame: FrameId, name: &JsString) -> Result<FrameId, JsError> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let scope = self.frame(id)?;
            if scope.bindings.contains_key(name.as_str()) {
                return Ok(id);
            }
            current = scope.outer;
        }
        Err(BindingError::Unresolved { name: name.clone() }.into())
    }

    /// Read a binding through the chain.
    pub fn read_binding(&self, frame: FrameId, name: &JsString) -> Result<JsValue, JsError> {
        let owner = self.resolve(frame, name)?;
        self.frame(owner)?
            .get(name.as_str())
            .map(|b| b.value.clone())
            .ok_or_else(|| BindingError::Unresolved { name: name.clone() }.into())
    }

    /// Declare in `frame` itself.
    pub fn declare(
        &mut self,
        frame: FrameId,
        name: JsString,
        value: JsValue,
        kind: BindingKind,
    ) -> Result<(), JsError> {
        Ok(self.frame_mut(frame)?.declare(name, value, kind)?)
    }

    /// Declare a `var` in the nearest function-boundary frame. Without an
    /// initializer an existing binding keeps its value.
    pub fn declare_var(
        &mut self,
        frame: FrameId,
        name: JsString,
        init: Option<JsValue>,
    ) -> Result<(), JsError> {
        let target = self.function_frame(frame)?;
        let scope = self.frame_mut(target)?;
        let keep_existing = init.is_none()
            && scope
                .get(name.as_str())
                .is_some_and(|b| b.kind.is_var_like());
        if keep_existing {
            return Ok(());
        }
        Ok(scope.declare(name, init.unwrap_or_default(), BindingKind::Var)?)
    }

    /// Resolve and overwrite. Never creates a binding.
    pub fn assign(&mut self, frame: FrameId, name: &JsString, value: JsValue) -> Result<(), JsError> {
        let owner = self.resolve(frame, name)?;
        let binding = self
            .frame_mut(owner)?
            .bindings
            .get_mut(name.as_str())
            .ok_or_else(|| BindingError::Unresolved { name: name.clone() })?;
        if !binding.mutable() {
            return Err(BindingError::ConstAssignment { name: name.clone() }.into());
        }
        binding.value = value;
        Ok(())
    }

    /// Nearest function-boundary frame (the frame itself if it is one).
    pub fn function_frame(&self, frame: FrameId) -> Result<FrameId, JsError> {
        let mut current = frame;
        loop {
            let scope = self.frame(current)?;
            if scope.function_boundary {
                return Ok(current);
            }
            match scope.outer {
                Some(outer) => current = outer,
                None => return Ok(current),
            }
        }
    }

    /// `this` as seen from `frame`: arrow function frames carry none and
    /// defer to their defining context.
    pub fn this_value(&self, frame: FrameId) -> Result<JsValue, JsError> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let scope = self.frame(id)?;
            if let Some(this) = &scope.this_value {
                return Ok(this.clone());
            }
            current = scope.outer;
        }
        Ok(JsValue::Undefined)
    }
}

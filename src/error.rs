//! Error types for the execution core

use crate::value::{JsString, JsValue};
use thiserror::Error;

/// Failures raised by the scope chain
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("ReferenceError: {name} is not defined")]
    Unresolved { name: JsString },

    #[error("SyntaxError: Identifier '{name}' has already been declared")]
    Duplicate { name: JsString },

    #[error("TypeError: Assignment to constant variable '{name}'")]
    ConstAssignment { name: JsString },
}

/// Main error type for the interpreter
///
/// Everything except `Timeout` and `Internal` is catchable by script code:
/// when a `catch` clause (or the evaluator entry point) observes one of the
/// catchable variants it is turned into a script-visible error object.
#[derive(Debug, Error)]
pub enum JsError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Invalid coercions on property writes, e.g. a non-integral array length.
    #[error("RangeError: {message}")]
    PropertyAccess { message: String },

    #[error("TypeError: {message}")]
    TypeCoercion { message: String },

    /// A value raised by an explicit `throw`.
    #[error("Uncaught {}", describe_thrown(.0))]
    Thrown(JsValue),

    #[error("Timeout: execution exceeded {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_thrown(value: &JsValue) -> String {
    match value {
        JsValue::String(s) => s.to_string(),
        JsValue::Object(id) => format!("<object #{}>", id.index()),
        other => other.to_js_string().to_string(),
    }
}

/// Intrinsic error constructor a catchable fault maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
        }
    }

    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
    ];
}

impl JsError {
    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeCoercion {
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::PropertyAccess {
            message: message.into(),
        }
    }

    pub fn reference_error(name: impl Into<JsString>) -> Self {
        JsError::Binding(BindingError::Unresolved { name: name.into() })
    }

    /// Create an internal error for unexpected interpreter states
    pub fn internal_error(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown(value)
    }

    /// Whether script-level `catch` may observe this error.
    pub fn is_catchable(&self) -> bool {
        !matches!(self, JsError::Timeout { .. } | JsError::Internal(_))
    }

    /// Kind and message of a runtime fault, `None` for user-thrown values
    /// and host-level failures.
    pub fn error_parts(&self) -> Option<(ErrorKind, String)> {
        match self {
            JsError::Binding(BindingError::Unresolved { name }) => {
                Some((ErrorKind::ReferenceError, format!("{name} is not defined")))
            }
            JsError::Binding(BindingError::Duplicate { name }) => Some((
                ErrorKind::SyntaxError,
                format!("Identifier '{name}' has already been declared"),
            )),
            JsError::Binding(BindingError::ConstAssignment { .. }) => Some((
                ErrorKind::TypeError,
                "Assignment to constant variable.".to_string(),
            )),
            JsError::PropertyAccess { message } => Some((ErrorKind::RangeError, message.clone())),
            JsError::TypeCoercion { message } => Some((ErrorKind::TypeError, message.clone())),
            JsError::Thrown(_) | JsError::Timeout { .. } | JsError::Internal(_) => None,
        }
    }
}

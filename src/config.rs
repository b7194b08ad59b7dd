//! Runtime configuration

use serde::{Deserialize, Serialize};

use crate::error::JsError;

/// Limits and tuning knobs for an [`Interpreter`](crate::Interpreter).
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use jsrun::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{ "max_call_depth": 64 }"#).unwrap();
/// assert_eq!(config.max_call_depth, 64);
/// assert_eq!(config.timeout_ms, 3000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Wall-clock budget for one task in milliseconds; 0 disables the check.
    pub timeout_ms: u64,
    /// Nested calls allowed before a RangeError is raised.
    pub max_call_depth: usize,
    /// Allocations between collections at task boundaries; 0 disables GC.
    pub gc_threshold: usize,
    /// Lower bound applied to every timer delay.
    pub min_timer_delay_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            max_call_depth: 128,
            gc_threshold: 1024,
            min_timer_delay_ms: 0,
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(source: &str) -> Result<Self, JsError> {
        serde_json::from_str(source)
            .map_err(|e| JsError::type_error(format!("invalid runtime config: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self)
            .map_err(|e| JsError::internal_error(format!("config serialization failed: {}", e)))
    }
}

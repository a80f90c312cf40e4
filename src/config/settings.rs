//! Script engine settings
//!
//! Safety limits applied to every Rhai engine that compiles pipeline
//! functions. All fields are optional in configuration files; missing ones
//! fall back to the defaults below.

use serde::{Deserialize, Serialize};

/// Rhai safety limits for scripted pipeline functions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Maximum number of operations a single function call may perform
    pub max_operations: u64,

    /// Maximum expression nesting depth at global level
    pub max_expr_depth: usize,

    /// Maximum expression nesting depth inside script-defined functions
    pub max_function_expr_depth: usize,

    /// Maximum call stack depth for script-defined functions
    pub max_call_levels: usize,

    /// Maximum length of any string value
    pub max_string_size: usize,

    /// Maximum number of elements in any array value
    pub max_array_size: usize,

    /// Maximum number of entries in any object map
    pub max_map_size: usize,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            max_operations: 10_000,
            max_expr_depth: 64,
            max_function_expr_depth: 64,
            max_call_levels: 32,
            max_string_size: 10_000,
            max_array_size: 1_000,
            max_map_size: 1_000,
        }
    }
}

impl ScriptSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with the operation budget raised for heavier functions.
    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }
}

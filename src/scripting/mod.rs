//! Rhai scripting for pipeline functions
//!
//! A scripted function is a Rhai expression (or statement block) evaluated
//! with each of its argument names bound as a variable. The value of the last
//! expression becomes the function's output.
//!
//! ## Helper Functions
//!
//! Besides Rhai's standard library, scripts can call:
//!
//! - `reverse(string)` - Characters of a string in reverse order
//! - `words(string)` - Whitespace-separated words as an array
//! - `clamp(x, lo, hi)` - Clamp a number into `[lo, hi]`
//!
//! ## Example Scripts
//!
//! Lowercasing a text input:
//! ```rhai
//! text.to_lower()
//! ```
//!
//! Reversing the result of another function:
//! ```rhai
//! reverse(lowercase)
//! ```
//!
//! Combining two numeric inputs:
//! ```rhai
//! clamp(foo + bar, 0, 100)
//! ```

mod engine;

pub use engine::{ScriptEngine, ScriptFn};

use crate::error::{DataPipeError, Result};
use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A compiled function script that can be evaluated repeatedly
#[derive(Clone)]
pub struct CompiledScript {
    ast: AST,
    source: String,
    name: String,
}

impl CompiledScript {
    pub fn ast(&self) -> &AST {
        &self.ast
    }

    /// Get the source code of this script
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Name of the function this script was first compiled for
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// Cache for compiled scripts, keyed by source text
#[derive(Default)]
pub struct ScriptCache {
    cache: HashMap<String, CompiledScript>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Get a cached script or compile and cache it
    pub fn get_or_compile(&mut self, engine: &Engine, name: &str, source: &str) -> Result<CompiledScript> {
        if let Some(script) = self.cache.get(source) {
            return Ok(script.clone());
        }

        let ast = engine
            .compile(source)
            .map_err(|e| DataPipeError::Script(format!("Compilation error in '{}': {}", name, e)))?;

        let script = CompiledScript {
            ast,
            source: source.to_string(),
            name: name.to_string(),
        };

        self.cache.insert(source.to_string(), script.clone());
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Thread-safe script cache wrapper
pub type SharedScriptCache = Arc<RwLock<ScriptCache>>;

/// Create a new shared script cache
pub fn create_shared_cache() -> SharedScriptCache {
    Arc::new(RwLock::new(ScriptCache::new()))
}

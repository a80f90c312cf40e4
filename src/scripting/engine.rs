//! Rhai Script Engine Implementation
//!
//! Owns the configured Rhai engine, compiles function scripts through the
//! shared cache, and wraps compiled scripts as pipeline callables.

use crate::config::settings::ScriptSettings;
use crate::error::{DataPipeError, Result};
use crate::pipeline::NodeFn;
use crate::scripting::{create_shared_cache, CompiledScript, SharedScriptCache};
use crate::types::Value;
use rhai::{Array, Dynamic, Engine, Scope};
use std::sync::Arc;

/// The script engine used to build scripted pipeline functions
pub struct ScriptEngine {
    /// The Rhai engine instance, shared with every `ScriptFn` it creates
    engine: Arc<Engine>,
    /// Cache of compiled scripts
    cache: SharedScriptCache,
    settings: ScriptSettings,
}

impl ScriptEngine {
    /// Create a new script engine with default limits
    pub fn new() -> Self {
        Self::with_settings(ScriptSettings::default())
    }

    /// Create a new script engine with the given limits
    pub fn with_settings(settings: ScriptSettings) -> Self {
        Self::with_cache(settings, create_shared_cache())
    }

    /// Create a new script engine with a shared cache
    pub fn with_cache(settings: ScriptSettings, cache: SharedScriptCache) -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, &settings);

        Self {
            engine: Arc::new(engine),
            cache,
            settings,
        }
    }

    /// Configure the Rhai engine with helper functions and safety limits
    fn configure_engine(engine: &mut Engine, settings: &ScriptSettings) {
        engine.set_max_expr_depths(settings.max_expr_depth, settings.max_function_expr_depth);
        engine.set_max_call_levels(settings.max_call_levels);
        engine.set_max_operations(settings.max_operations);
        engine.set_max_string_size(settings.max_string_size);
        engine.set_max_array_size(settings.max_array_size);
        engine.set_max_map_size(settings.max_map_size);

        engine.register_fn("reverse", |s: &str| -> String { s.chars().rev().collect() });
        engine.register_fn("words", |s: &str| -> Array {
            s.split_whitespace().map(|w| Dynamic::from(w.to_string())).collect()
        });
        engine.register_fn("clamp", |x: i64, lo: i64, hi: i64| -> i64 { x.max(lo).min(hi) });
        engine.register_fn("clamp", |x: f64, lo: f64, hi: f64| -> f64 { x.max(lo).min(hi) });
    }

    /// Compile a script and cache it
    pub fn compile(&self, name: &str, source: &str) -> Result<CompiledScript> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| DataPipeError::Script(format!("Failed to acquire cache lock: {}", e)))?;

        cache.get_or_compile(&self.engine, name, source)
    }

    /// Compile `source` into a pipeline callable producing `name` from `argnames`
    pub fn function<I, S>(&self, name: &str, argnames: I, source: &str) -> Result<ScriptFn>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = self.compile(name, source)?;
        Ok(ScriptFn {
            argnames: argnames.into_iter().map(Into::into).collect(),
            script,
            engine: Arc::clone(&self.engine),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn cache(&self) -> &SharedScriptCache {
        &self.cache
    }

    pub fn settings(&self) -> &ScriptSettings {
        &self.settings
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("cache_size", &self.cache.read().map(|c| c.len()).ok())
            .field("settings", &self.settings)
            .finish()
    }
}

/// A compiled script bound to argument names; callable from the pipeline.
///
/// Each argument is pushed into a fresh scope under its argname, so scripts
/// refer to their inputs by name.
#[derive(Clone)]
pub struct ScriptFn {
    argnames: Vec<String>,
    script: CompiledScript,
    engine: Arc<Engine>,
}

impl ScriptFn {
    pub fn argnames(&self) -> &[String] {
        &self.argnames
    }

    pub fn source(&self) -> &str {
        self.script.source()
    }
}

impl NodeFn<Value> for ScriptFn {
    fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        anyhow::ensure!(
            args.len() == self.argnames.len(),
            "expected {} argument(s), got {}",
            self.argnames.len(),
            args.len()
        );

        let mut scope = Scope::new();
        for (name, value) in self.argnames.iter().zip(args) {
            scope.push_dynamic(name.as_str(), value.clone().into_dynamic());
        }

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, self.script.ast())
            .map_err(|e| anyhow::anyhow!("script error: {}", e))?;

        Value::from_dynamic(result).map_err(anyhow::Error::msg)
    }

    fn describe(&self) -> &str {
        "rhai"
    }
}

impl std::fmt::Debug for ScriptFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptFn")
            .field("argnames", &self.argnames)
            .field("script", &self.script)
            .finish()
    }
}

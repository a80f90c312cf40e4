//! Declarative pipeline files
//!
//! A pipeline file lists the output selection and the scripted functions in
//! registration order. TOML and JSON are both accepted; the format is chosen
//! by file extension.
//!
//! # Example
//!
//! ```toml
//! output_names = ["reversed"]
//!
//! [script]
//! max_operations = 50000
//!
//! [[funcs]]
//! name = "lowercase"
//! argnames = ["text"]
//! script = "text.to_lower()"
//!
//! [[funcs]]
//! name = "reversed"
//! argnames = ["lowercase"]
//! script = "reverse(lowercase)"
//! ```
//!
//! ```ignore
//! use datapipe_rs::config::PipelineConfig;
//! use datapipe_rs::scripting::ScriptEngine;
//!
//! let config = PipelineConfig::load("pipeline.toml")?;
//! let engine = ScriptEngine::with_settings(config.script.clone());
//! let mut pipeline = config.build(&engine)?;
//! ```

pub mod settings;

pub use settings::ScriptSettings;

use crate::error::{DataPipeError, Result, ResultExt};
use crate::pipeline::{DataPipeline, FuncSpec};
use crate::scripting::ScriptEngine;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Supported pipeline file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(ConfigFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ConfigFormat::Json),
            _ => Err(DataPipeError::Config(format!(
                "Unsupported pipeline file extension: {:?}",
                path
            ))),
        }
    }
}

/// One scripted function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncConfig {
    /// Name of the value this function produces
    pub name: String,

    /// Names of the values it consumes, in argument order
    #[serde(default)]
    pub argnames: Vec<String>,

    /// Rhai source; each argname is bound as a variable
    pub script: String,
}

impl FuncConfig {
    pub fn new(name: impl Into<String>, argnames: &[&str], script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argnames: argnames.iter().map(|s| s.to_string()).collect(),
            script: script.into(),
        }
    }
}

/// Complete pipeline description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Initial output selection
    #[serde(default)]
    pub output_names: Vec<String>,

    /// Script engine limits
    #[serde(default)]
    pub script: ScriptSettings,

    /// Functions in registration order
    #[serde(default)]
    pub funcs: Vec<FuncConfig>,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DataPipeError::Config(format!("Failed to parse pipeline TOML: {}", e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| DataPipeError::Config(format!("Failed to parse pipeline JSON: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DataPipeError::Serialization(format!("Failed to serialize pipeline: {}", e)))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DataPipeError::Serialization(format!("Failed to serialize pipeline: {}", e)))
    }

    /// Load a pipeline file; `.toml` and `.json` are accepted
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            DataPipeError::Config(format!("Failed to read pipeline file {:?}: {}", path, e))
        })?;

        match format {
            ConfigFormat::Toml => Self::from_toml_str(&content),
            ConfigFormat::Json => Self::from_json_str(&content),
        }
        .with_context(|| format!("Loading {:?}", path))
    }

    /// Save a pipeline file in the format its extension names
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => self.to_toml_string()?,
            ConfigFormat::Json => self.to_json_string()?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DataPipeError::Config(format!("Failed to create pipeline directory: {}", e))
            })?;
        }

        std::fs::write(path, content).map_err(|e| {
            DataPipeError::Config(format!("Failed to write pipeline file {:?}: {}", path, e))
        })
    }

    /// Compile every script and register the functions in file order
    pub fn build(&self, engine: &ScriptEngine) -> Result<DataPipeline<Value>> {
        let mut funcs = Vec::with_capacity(self.funcs.len());
        for func in &self.funcs {
            let script = engine
                .function(&func.name, func.argnames.iter().cloned(), &func.script)
                .with_context(|| format!("Compiling function '{}'", func.name))?;
            funcs.push((
                func.name.clone(),
                FuncSpec::<Value>::from_node_fn(Arc::new(script), func.argnames.clone()),
            ));
        }

        let pipeline = DataPipeline::from_configuration(funcs, self.output_names.iter().cloned())?;
        tracing::debug!(
            "Built pipeline with {} function(s), selecting {:?}",
            self.funcs.len(),
            self.output_names
        );
        Ok(pipeline)
    }
}

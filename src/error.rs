//! Error handling for the datapipe-rs surfaces
//!
//! The pipeline core reports [`PipelineError`]; configuration loading,
//! script compilation and the runner binary wrap it in [`DataPipeError`].

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for datapipe-rs operations outside the pipeline core
#[derive(Error, Debug)]
pub enum DataPipeError {
    /// Errors raised by the pipeline itself
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Errors related to Rhai script compilation or execution
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DataPipeError>,
    },
}

impl DataPipeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DataPipeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The pipeline error at the bottom of any context chain, if there is one.
    pub fn pipeline_error(&self) -> Option<&PipelineError> {
        match self {
            DataPipeError::Pipeline(err) => Some(err),
            DataPipeError::WithContext { source, .. } => source.pipeline_error(),
            _ => None,
        }
    }
}

/// Result type alias for datapipe-rs operations
pub type Result<T> = std::result::Result<T, DataPipeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, PipelineError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DataPipeError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| DataPipeError::from(e).with_context(f()))
    }
}

//! # datapipe-rs: lazily evaluated named-function pipelines
//!
//! Register functions under the name of the value they produce, declare the
//! names they consume, pick the outputs you want, and evaluate. Only the
//! functions the selected outputs actually depend on run, each at most once
//! per evaluation, in a deterministic dependency order.
//!
//! ## Architecture
//!
//! - **Pipeline**: registry, dependency graph, plan compiler and evaluator
//! - **Scripting**: Rhai-backed functions for declarative pipelines
//! - **Config**: TOML/JSON pipeline files
//!
//! ## Example
//!
//! ```
//! use datapipe_rs::pipeline::DataPipeline;
//! use std::collections::HashMap;
//!
//! let mut pipeline: DataPipeline<i64> = DataPipeline::new();
//! pipeline.add_func("foobar", |args| Ok(args[0] + args[1]), ["foo", "bar"]).unwrap();
//! pipeline.add_func("truebar", |args| Ok(args[0] * 2), ["foobar"]).unwrap();
//! pipeline.set_output_names(["truebar"]);
//!
//! let inputs = HashMap::from([("foo".to_string(), 1), ("bar".to_string(), 2)]);
//! let outputs = pipeline.evaluate(&inputs).unwrap();
//! assert_eq!(outputs["truebar"], 6);
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod scripting;
pub mod types;

// Re-export commonly used types
pub use config::{FuncConfig, PipelineConfig, ScriptSettings};
pub use error::{DataPipeError, Result, ResultExt};
pub use pipeline::{DataPipeline, PipelineError, PipelineResult, PipelineSnapshot, SharedPipeline};
pub use scripting::{ScriptEngine, ScriptFn};
pub use types::Value;

//! Pipeline runner - Main Entry Point
//!
//! Loads a pipeline file, reads a JSON object of inputs and prints the
//! selected outputs as JSON.
//!
//! ```text
//! datapipe <pipeline.toml|pipeline.json> <inputs.json> [output ...]
//! ```
//!
//! Extra arguments replace the file's output selection for this run.

use datapipe_rs::{DataPipeError, PipelineConfig, Result, ResultExt, ScriptEngine, Value};
use std::collections::{BTreeMap, HashMap};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "usage: datapipe <pipeline.toml|pipeline.json> <inputs.json> [output ...]";

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,datapipe_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String> {
    let (pipeline_path, inputs_path, overrides) = match args {
        [pipeline, inputs, rest @ ..] => (pipeline, inputs, rest),
        _ => return Err(DataPipeError::Config(USAGE.to_string())),
    };

    let mut config = PipelineConfig::load(pipeline_path)?;
    if !overrides.is_empty() {
        config.output_names = overrides.to_vec();
    }
    tracing::info!(
        "Loaded {} function(s) from {}",
        config.funcs.len(),
        pipeline_path
    );

    let content = std::fs::read_to_string(inputs_path)
        .map_err(DataPipeError::from)
        .with_context(|| format!("Reading inputs {}", inputs_path))?;
    let inputs: HashMap<String, Value> = serde_json::from_str(&content)
        .map_err(|e| DataPipeError::Serialization(format!("Failed to parse inputs: {}", e)))?;

    let engine = ScriptEngine::with_settings(config.script.clone());
    let mut pipeline = config.build(&engine)?;
    let outputs = pipeline.evaluate(&inputs).context("Evaluating pipeline")?;

    let sorted: BTreeMap<String, Value> = outputs.into_iter().collect();
    serde_json::to_string_pretty(&sorted)
        .map_err(|e| DataPipeError::Serialization(format!("Failed to serialize outputs: {}", e)))
}

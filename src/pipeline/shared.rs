//! Thread-safe pipeline handle.
//!
//! One `RwLock` guards the registry and the output selection. Evaluations only
//! hold the lock long enough to take a [`PipelineSnapshot`]; the functions
//! themselves run unlocked, so a mutation never blocks on (or changes) an
//! in-flight evaluation.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::evaluator::PipelineSnapshot;
use crate::pipeline::executor::DataPipeline;
use crate::pipeline::id::NodeId;
use crate::types::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Cloneable, lock-guarded handle to a [`DataPipeline`].
pub struct SharedPipeline<V = Value> {
    inner: Arc<RwLock<DataPipeline<V>>>,
}

impl<V: Clone + Send + Sync + 'static> SharedPipeline<V> {
    pub fn new(pipeline: DataPipeline<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pipeline)),
        }
    }

    /// Run `f` with shared access to the pipeline.
    pub fn read<R>(&self, f: impl FnOnce(&DataPipeline<V>) -> R) -> PipelineResult<R> {
        let guard = self.inner.read().map_err(|_| PipelineError::LockPoisoned)?;
        Ok(f(&guard))
    }

    /// Run `f` with exclusive access to the pipeline.
    pub fn update<R>(&self, f: impl FnOnce(&mut DataPipeline<V>) -> R) -> PipelineResult<R> {
        let mut guard = self.inner.write().map_err(|_| PipelineError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    pub fn add_func<F, I, S>(&self, name: impl Into<String>, func: F, argnames: I) -> PipelineResult<NodeId>
    where
        F: Fn(&[V]) -> anyhow::Result<V> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update(|pipeline| pipeline.add_func(name, func, argnames))?
    }

    pub fn set_output_names<I, S>(&self, names: I) -> PipelineResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update(|pipeline| pipeline.set_output_names(names))
    }

    /// Take a consistent snapshot of the graph and selection.
    ///
    /// Uses the read lock when the cached plan is current and only falls back
    /// to the write lock when something has to be rebuilt.
    pub fn snapshot(&self) -> PipelineResult<PipelineSnapshot<V>> {
        if let Some(snapshot) = self.read(|pipeline| pipeline.cached_snapshot())? {
            return Ok(snapshot);
        }
        self.update(|pipeline| pipeline.snapshot())?
    }

    /// Evaluate the current selection without holding the lock during execution.
    pub fn evaluate(&self, inputs: &HashMap<String, V>) -> PipelineResult<HashMap<String, V>> {
        self.snapshot()?.evaluate(inputs)
    }
}

impl<V> Clone for SharedPipeline<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> From<DataPipeline<V>> for SharedPipeline<V> {
    fn from(pipeline: DataPipeline<V>) -> Self {
        Self::new(pipeline)
    }
}

//! Pipeline facade: registration, output selection, and lazy rebuilds.
//!
//! On every evaluation:
//! 1. Rebuild the dependency graph if the registry changed since the last build.
//! 2. Recompile the execution plan if the graph or the output selection changed.
//! 3. Run the plan against the caller's inputs.
//!
//! Mutations only mark state stale; nothing is rebuilt until it is needed.

use crate::pipeline::compiled_plan::ExecutionPlan;
use crate::pipeline::compiler::PlanCompiler;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::evaluator::PipelineSnapshot;
use crate::pipeline::graph::DependencyGraph;
use crate::pipeline::id::NodeId;
use crate::pipeline::node::{ClosureFn, FuncSpec, SharedNodeFn};
use crate::pipeline::registry::NodeRegistry;
use crate::pipeline::selection::OutputSelection;
use crate::types::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Named-function pipeline: a registry of functions plus the current output selection.
pub struct DataPipeline<V = Value> {
    registry: NodeRegistry<V>,
    outputs: OutputSelection,
    /// Cached graph; stale when its registry generation lags the registry's.
    graph: Option<Arc<DependencyGraph<V>>>,
    /// Cached plan; stale when the graph or the selection moved on.
    plan: Option<Arc<ExecutionPlan>>,
}

impl<V: 'static> DataPipeline<V> {
    pub fn new() -> Self {
        Self {
            registry: NodeRegistry::new(),
            outputs: OutputSelection::new(),
            graph: None,
            plan: None,
        }
    }

    /// Declarative construction: register every function, then select outputs.
    pub fn from_configuration<I, N, O, S>(funcs: I, output_names: O) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = (N, FuncSpec<V>)>,
        N: Into<String>,
        O: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pipeline = Self::new();
        pipeline.bulk_register(funcs)?;
        pipeline.set_output_names(output_names);
        Ok(pipeline)
    }

    // ── Registration ──

    /// Register a closure producing `name` from `argnames`.
    pub fn add_func<F, I, S>(
        &mut self,
        name: impl Into<String>,
        func: F,
        argnames: I,
    ) -> PipelineResult<NodeId>
    where
        F: Fn(&[V]) -> anyhow::Result<V> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(name, argnames, Arc::new(ClosureFn::new(func)))
    }

    /// Register any callable producing `name` from `argnames`, replacing a
    /// previous function of the same name.
    pub fn register<I, S>(
        &mut self,
        name: impl Into<String>,
        argnames: I,
        callable: SharedNodeFn<V>,
    ) -> PipelineResult<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argnames = argnames.into_iter().map(Into::into).collect();
        self.registry.register(name, argnames, callable)
    }

    pub fn bulk_register<I, N>(&mut self, specs: I) -> PipelineResult<()>
    where
        I: IntoIterator<Item = (N, FuncSpec<V>)>,
        N: Into<String>,
    {
        self.registry.bulk_register(specs)
    }

    /// Reserve `name` as an input that no function may produce.
    pub fn declare_input(&mut self, name: impl Into<String>) -> PipelineResult<()> {
        self.registry.declare_input(name)
    }

    // ── Output selection ──

    /// Replace the output selection. Takes effect on the next evaluation.
    pub fn set_output_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.set(names);
    }

    /// Widen the output selection by one name.
    pub fn add_output_name(&mut self, name: impl Into<String>) -> bool {
        self.outputs.push(name)
    }

    pub fn output_names(&self) -> &[String] {
        self.outputs.as_slice()
    }

    pub fn output_names_mut(&mut self) -> &mut OutputSelection {
        &mut self.outputs
    }

    // ── Introspection ──

    pub fn registry(&self) -> &NodeRegistry<V> {
        &self.registry
    }

    /// Registered function names, in registration order.
    pub fn func_names(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    pub fn contains_func(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    // ── Graph and plan ──

    /// Build (or rebuild) the dependency graph, validating it is acyclic.
    pub fn build(&mut self) -> PipelineResult<()> {
        self.rebuild_if_needed().map(|_| ())
    }

    /// The execution plan for the current selection.
    pub fn plan(&mut self) -> PipelineResult<Arc<ExecutionPlan>> {
        self.recompile_if_needed()
    }

    /// Input names the current selection needs from the caller.
    pub fn required_inputs(&mut self) -> PipelineResult<Vec<String>> {
        Ok(self.recompile_if_needed()?.required_inputs.clone())
    }

    /// Freeze the current graph and selection for evaluation elsewhere.
    pub fn snapshot(&mut self) -> PipelineResult<PipelineSnapshot<V>> {
        let graph = self.rebuild_if_needed()?;
        let plan = self.recompile_if_needed()?;
        Ok(PipelineSnapshot::new(graph, plan))
    }

    /// Snapshot from the cached graph and plan, if neither is stale.
    pub(crate) fn cached_snapshot(&self) -> Option<PipelineSnapshot<V>> {
        if !self.plan_is_fresh() {
            return None;
        }
        let graph = self.graph.as_ref()?;
        let plan = self.plan.as_ref()?;
        Some(PipelineSnapshot::new(Arc::clone(graph), Arc::clone(plan)))
    }

    fn graph_is_fresh(&self) -> bool {
        self.graph
            .as_ref()
            .is_some_and(|g| g.registry_generation() == self.registry.generation())
    }

    fn plan_is_fresh(&self) -> bool {
        self.graph_is_fresh()
            && self.plan.as_ref().is_some_and(|p| {
                p.registry_generation == self.registry.generation()
                    && p.matches_selection(self.outputs.as_slice())
            })
    }

    /// Rebuild the graph if the registry changed (lazy rebuild).
    fn rebuild_if_needed(&mut self) -> PipelineResult<Arc<DependencyGraph<V>>> {
        if self.graph_is_fresh() {
            if let Some(graph) = &self.graph {
                return Ok(Arc::clone(graph));
            }
        }

        self.plan = None;
        self.graph = None;
        let graph = Arc::new(DependencyGraph::build(&self.registry)?);
        self.graph = Some(Arc::clone(&graph));
        Ok(graph)
    }

    /// Recompile the plan if the graph or selection changed (lazy recompilation).
    fn recompile_if_needed(&mut self) -> PipelineResult<Arc<ExecutionPlan>> {
        if self.plan_is_fresh() {
            if let Some(plan) = &self.plan {
                return Ok(Arc::clone(plan));
            }
        }

        let graph = self.rebuild_if_needed()?;
        let plan = Arc::new(PlanCompiler::compile(&*graph, self.outputs.as_slice()));
        self.plan = Some(Arc::clone(&plan));
        Ok(plan)
    }
}

impl<V: Clone + 'static> DataPipeline<V> {
    /// Evaluate the current output selection against `inputs`.
    pub fn evaluate(&mut self, inputs: &HashMap<String, V>) -> PipelineResult<HashMap<String, V>> {
        self.snapshot()?.evaluate(inputs)
    }

    /// Evaluate an explicit list of outputs, leaving the stored selection untouched.
    pub fn evaluate_with<S: AsRef<str>>(
        &mut self,
        inputs: &HashMap<String, V>,
        output_names: &[S],
    ) -> PipelineResult<HashMap<String, V>> {
        self.snapshot()?.evaluate_with(inputs, output_names)
    }
}

impl<V: 'static> Default for DataPipeline<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for DataPipeline<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPipeline")
            .field("funcs", &self.registry.names().collect::<Vec<_>>())
            .field("output_names", &self.outputs.as_slice())
            .field("graph_cached", &self.graph.is_some())
            .field("plan_cached", &self.plan.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::PipelineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn inputs(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_graph_reused_until_registry_changes() {
        let mut pipeline: DataPipeline<i64> = DataPipeline::new();
        pipeline.add_func("a", |x| Ok(x[0] + 1), ["x"]).unwrap();
        pipeline.build().unwrap();
        let first = pipeline.graph.clone().unwrap();

        pipeline.set_output_names(["a"]);
        pipeline.build().unwrap();
        assert!(Arc::ptr_eq(&first, pipeline.graph.as_ref().unwrap()));

        pipeline.add_func("b", |x| Ok(x[0] * 2), ["a"]).unwrap();
        pipeline.build().unwrap();
        assert!(!Arc::ptr_eq(&first, pipeline.graph.as_ref().unwrap()));
    }

    #[test]
    fn test_plan_recompiled_after_retarget() {
        let mut pipeline: DataPipeline<i64> = DataPipeline::new();
        pipeline.add_func("a", |x| Ok(x[0] + 1), ["x"]).unwrap();
        pipeline.add_func("b", |x| Ok(x[0] * 2), ["a"]).unwrap();

        pipeline.set_output_names(["a"]);
        assert_eq!(pipeline.plan().unwrap().steps.len(), 1);

        pipeline.output_names_mut().push("b");
        assert_eq!(pipeline.plan().unwrap().steps.len(), 2);
    }

    #[test]
    fn test_plan_kept_while_selection_names_unchanged() {
        let mut pipeline: DataPipeline<i64> = DataPipeline::new();
        pipeline.add_func("a", |x| Ok(x[0] + 1), ["x"]).unwrap();
        pipeline.add_func("b", |x| Ok(x[0] * 2), ["a"]).unwrap();

        pipeline.set_output_names(["a", "b"]);
        let first = pipeline.plan().unwrap();

        pipeline.set_output_names(["a", "b", "a"]);
        assert!(!pipeline.add_output_name("b"));
        assert!(Arc::ptr_eq(&first, &pipeline.plan().unwrap()));

        pipeline.output_names_mut().remove("a");
        assert!(!Arc::ptr_eq(&first, &pipeline.plan().unwrap()));
    }

    #[test]
    fn test_replacing_function_takes_effect() {
        let mut pipeline: DataPipeline<i64> = DataPipeline::new();
        pipeline.add_func("f", |x| Ok(x[0] + 1), ["x"]).unwrap();
        pipeline.set_output_names(["f"]);
        assert_eq!(pipeline.evaluate(&inputs(&[("x", 1)])).unwrap()["f"], 2);

        pipeline.add_func("f", |x| Ok(x[0] * 100), ["x"]).unwrap();
        assert_eq!(pipeline.evaluate(&inputs(&[("x", 1)])).unwrap()["f"], 100);
        assert_eq!(pipeline.func_names().count(), 1);
    }

    #[test]
    fn test_cycle_reported_until_fixed() {
        let mut pipeline: DataPipeline<i64> = DataPipeline::new();
        pipeline.add_func("a", |x| Ok(x[0]), ["b"]).unwrap();
        pipeline.add_func("b", |x| Ok(x[0]), ["a"]).unwrap();

        assert!(matches!(
            pipeline.build(),
            Err(PipelineError::CyclicDependency { .. })
        ));
        assert!(pipeline.evaluate(&HashMap::new()).is_err());

        pipeline.add_func("b", |x| Ok(x[0]), ["seed"]).unwrap();
        pipeline.set_output_names(["a"]);
        let out = pipeline.evaluate(&inputs(&[("seed", 7)])).unwrap();
        assert_eq!(out["a"], 7);
    }

    #[test]
    fn test_required_inputs_follow_selection() {
        let mut pipeline: DataPipeline<i64> = DataPipeline::new();
        pipeline.add_func("foobar", |x| Ok(x[0] + x[1]), ["foo", "bar"]).unwrap();
        pipeline.add_func("truebar", |x| Ok(x[0]), ["foo"]).unwrap();

        pipeline.set_output_names(["truebar"]);
        assert_eq!(pipeline.required_inputs().unwrap(), vec!["foo".to_string()]);

        pipeline.set_output_names(["foobar"]);
        assert_eq!(
            pipeline.required_inputs().unwrap(),
            vec!["bar".to_string(), "foo".to_string()]
        );
    }

    #[test]
    fn test_snapshot_isolated_from_later_mutation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut pipeline: DataPipeline<i64> = DataPipeline::new();
        pipeline
            .add_func(
                "f",
                move |x| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(x[0])
                },
                ["x"],
            )
            .unwrap();
        pipeline.set_output_names(["f"]);
        let snap = pipeline.snapshot().unwrap();

        pipeline.set_output_names(["x"]);
        pipeline.add_func("f", |_| Ok(-1), ["x"]).unwrap();

        let out = snap.evaluate(&inputs(&[("x", 5)])).unwrap();
        assert_eq!(out["f"], 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_lists_funcs_and_selection() {
        let mut pipeline: DataPipeline<i64> = DataPipeline::new();
        pipeline.add_func("foobar", |x| Ok(x[0] + x[1]), ["foo", "bar"]).unwrap();
        pipeline.set_output_names(["foobar"]);

        let text = format!("{:?}", pipeline);
        assert!(text.starts_with("DataPipeline"));
        assert!(text.contains(r#"funcs: ["foobar"]"#));
        assert!(text.contains(r#"output_names: ["foobar"]"#));
        assert!(text.contains("plan_cached: false"));
    }
}

//! Evaluator: runs a compiled plan against one set of inputs.
//!
//! Each call walks these phases:
//!
//! ```text
//! Idle → ClosureComputed → Ordered → Executing(0) → … → Executing(n-1) → Done
//!              │                           └──────────────► Failed
//!              └──── missing inputs ─────────────────────────► Failed
//! ```
//!
//! The closure and its order are computed once when the plan is compiled, so
//! `ClosureComputed` and `Ordered` adopt them from the plan rather than
//! recomputing. Required inputs are checked against the caller's map on entry
//! to `ClosureComputed`, before any function runs.
//!
//! The invocation frame lives only for the duration of one call. Nothing is
//! cached between calls, and a failed call returns only the error.

use crate::pipeline::compiled_plan::{ExecutionPlan, OutputSource};
use crate::pipeline::compiler::PlanCompiler;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::graph::{Dependency, DependencyGraph};
use crate::pipeline::selection::OutputSelection;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Progress of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalPhase {
    Idle,
    /// Required inputs taken from the plan and checked against the caller's inputs.
    ClosureComputed,
    /// Execution order taken from the plan.
    Ordered,
    /// Running step `i` of the plan.
    Executing(usize),
    Done,
    Failed,
}

impl fmt::Display for EvalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalPhase::Idle => write!(f, "idle"),
            EvalPhase::ClosureComputed => write!(f, "closure-computed"),
            EvalPhase::Ordered => write!(f, "ordered"),
            EvalPhase::Executing(step) => write!(f, "executing({})", step),
            EvalPhase::Done => write!(f, "done"),
            EvalPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Values known during one evaluation: borrowed inputs plus computed outputs.
struct InvocationFrame<'a, V> {
    inputs: &'a HashMap<String, V>,
    derived: Vec<Option<V>>,
}

impl<'a, V> InvocationFrame<'a, V> {
    fn new(inputs: &'a HashMap<String, V>, slots: usize) -> Self {
        let mut derived = Vec::with_capacity(slots);
        derived.resize_with(slots, || None);
        Self { inputs, derived }
    }

    fn resolve(&self, graph: &DependencyGraph<V>, dep: Dependency) -> PipelineResult<&V> {
        let (value, name) = match dep {
            Dependency::Derived(id) => (
                self.derived[id.index()].as_ref(),
                graph.node(id).name(),
            ),
            Dependency::Input(slot) => {
                let name = graph.input_name(slot);
                (self.inputs.get(name), name)
            }
        };
        value.ok_or_else(|| PipelineError::MissingInput {
            names: vec![name.to_string()],
        })
    }
}

/// Drives one plan through the evaluation phases.
struct Evaluation<'a, V> {
    graph: &'a DependencyGraph<V>,
    plan: &'a ExecutionPlan,
    phase: EvalPhase,
    #[cfg(test)]
    trail: Vec<EvalPhase>,
}

impl<'a, V: Clone> Evaluation<'a, V> {
    fn new(graph: &'a DependencyGraph<V>, plan: &'a ExecutionPlan) -> Self {
        Self {
            graph,
            plan,
            phase: EvalPhase::Idle,
            #[cfg(test)]
            trail: Vec::new(),
        }
    }

    fn advance(&mut self, next: EvalPhase) {
        tracing::trace!("Evaluation {} -> {}", self.phase, next);
        self.phase = next;
        #[cfg(test)]
        self.trail.push(next);
    }

    fn run(&mut self, inputs: &HashMap<String, V>) -> PipelineResult<HashMap<String, V>> {
        let graph = self.graph;
        let plan = self.plan;

        self.advance(EvalPhase::ClosureComputed);
        let missing: Vec<String> = plan
            .required_inputs
            .iter()
            .filter(|name| !inputs.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            self.advance(EvalPhase::Failed);
            return Err(PipelineError::MissingInput { names: missing });
        }
        self.advance(EvalPhase::Ordered);

        let mut frame = InvocationFrame::new(inputs, graph.len());
        let mut args: Vec<V> = Vec::new();

        for (step, &id) in plan.steps.iter().enumerate() {
            self.advance(EvalPhase::Executing(step));
            let node = graph.node(id);

            args.clear();
            for &dep in graph.dependencies(id) {
                match frame.resolve(graph, dep) {
                    Ok(value) => args.push(value.clone()),
                    Err(err) => {
                        self.advance(EvalPhase::Failed);
                        return Err(err);
                    }
                }
            }

            tracing::trace!("Calling '{}' ({})", node.name(), node.callable().describe());
            match node.call(&args) {
                Ok(value) => frame.derived[id.index()] = Some(value),
                Err(err) => {
                    self.advance(EvalPhase::Failed);
                    return Err(err);
                }
            }
        }

        let mut result = HashMap::with_capacity(plan.outputs.len());
        for (name, source) in &plan.outputs {
            let value = match source {
                OutputSource::Derived(id) => frame.derived[id.index()].take(),
                OutputSource::Input => inputs.get(name).cloned(),
            };
            let value = value.ok_or_else(|| PipelineError::MissingInput {
                names: vec![name.clone()],
            })?;
            result.insert(name.clone(), value);
        }

        self.advance(EvalPhase::Done);
        Ok(result)
    }
}

/// Immutable view of a pipeline at one point in time.
///
/// Cheap to clone and `Send + Sync`; evaluations through a snapshot never see
/// registry or selection changes made after it was taken.
pub struct PipelineSnapshot<V> {
    graph: Arc<DependencyGraph<V>>,
    plan: Arc<ExecutionPlan>,
}

impl<V> PipelineSnapshot<V> {
    pub(crate) fn new(graph: Arc<DependencyGraph<V>>, plan: Arc<ExecutionPlan>) -> Self {
        Self { graph, plan }
    }

    pub fn graph(&self) -> &DependencyGraph<V> {
        &self.graph
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }
}

impl<V: Clone> PipelineSnapshot<V> {
    /// Evaluate the snapshot's output selection.
    ///
    /// Inputs whose names are produced by a registered function are ignored:
    /// the function's value always wins.
    pub fn evaluate(&self, inputs: &HashMap<String, V>) -> PipelineResult<HashMap<String, V>> {
        Evaluation::new(self.graph(), self.plan()).run(inputs)
    }

    /// Evaluate an explicit list of outputs instead of the snapshot's selection.
    pub fn evaluate_with<S: AsRef<str>>(
        &self,
        inputs: &HashMap<String, V>,
        output_names: &[S],
    ) -> PipelineResult<HashMap<String, V>> {
        let selection =
            OutputSelection::from_names(output_names.iter().map(|name| AsRef::<str>::as_ref(name)));
        if self.plan.matches_selection(selection.as_slice()) {
            return self.evaluate(inputs);
        }
        let plan = PlanCompiler::compile(self.graph(), selection.as_slice());
        Evaluation::new(self.graph(), &plan).run(inputs)
    }
}

impl<V> Clone for PipelineSnapshot<V> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            plan: Arc::clone(&self.plan),
        }
    }
}

use super::compiled_plan::{ExecutionPlan, OutputSource, PlanStats};
use super::graph::DependencyGraph;
use std::collections::HashSet;

/// Compiles an output selection against a dependency graph into an execution plan
pub struct PlanCompiler;

impl PlanCompiler {
    /// Compile the minimal execution plan for `output_names`.
    ///
    /// Computes the required closure of the selection (only functions some
    /// requested output transitively depends on) and orders it topologically.
    /// Outputs no function produces are passthrough inputs. Repeated names
    /// appear once, at their first position.
    ///
    /// # Arguments
    /// * `graph` - Dependency graph built from the current registry
    /// * `output_names` - Requested outputs, in selection order
    ///
    /// # Returns
    /// An `ExecutionPlan` whose `steps` run each needed function exactly once
    pub fn compile<V, S: AsRef<str>>(graph: &DependencyGraph<V>, output_names: &[S]) -> ExecutionPlan {
        let start_time = std::time::Instant::now();

        let closure = graph.required_closure(output_names);
        let steps = graph.topological_order(&closure);

        let mut seen: HashSet<&str> = HashSet::with_capacity(output_names.len());
        let mut outputs: Vec<(String, OutputSource)> = Vec::with_capacity(output_names.len());
        for name in output_names {
            let name: &str = name.as_ref();
            if !seen.insert(name) {
                continue;
            }
            let source = match graph.producer_of(name) {
                Some(id) => OutputSource::Derived(id),
                None => OutputSource::Input,
            };
            outputs.push((name.to_string(), source));
        }

        let passthrough_outputs = outputs
            .iter()
            .filter(|(_, source)| *source == OutputSource::Input)
            .count();

        let stats = PlanStats {
            total_functions: graph.len(),
            scheduled_functions: steps.len(),
            skipped_functions: graph.len().saturating_sub(steps.len()),
            required_inputs: closure.inputs().len(),
            passthrough_outputs,
            compile_time_us: start_time.elapsed().as_micros() as u64,
        };

        tracing::debug!(
            "Plan compiled: {} scheduled / {} registered, {} required inputs, {} passthrough",
            stats.scheduled_functions,
            stats.total_functions,
            stats.required_inputs,
            stats.passthrough_outputs,
        );

        ExecutionPlan {
            steps,
            required_inputs: closure.inputs().to_vec(),
            outputs,
            registry_generation: graph.registry_generation(),
            stats,
        }
    }
}

use crate::pipeline::id::NodeId;

/// Where an output value comes from at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSource {
    /// Computed by the function in this slot.
    Derived(NodeId),
    /// Copied straight from the caller's inputs (passthrough).
    Input,
}

/// Compiled execution plan for one output selection.
/// Contains only the functions the selection actually needs.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Functions to run, in topological order
    pub steps: Vec<NodeId>,

    /// Input leaves that must be present in the caller's inputs (sorted)
    pub required_inputs: Vec<String>,

    /// Requested outputs and how each one is satisfied, in selection order
    pub outputs: Vec<(String, OutputSource)>,

    /// Registry generation the plan was compiled against
    pub registry_generation: u64,

    /// Compilation statistics
    pub stats: PlanStats,
}

/// Statistics about the compiled plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Total number of registered functions
    pub total_functions: usize,

    /// Number of functions scheduled for execution
    pub scheduled_functions: usize,

    /// Number of registered functions the selection does not need
    pub skipped_functions: usize,

    /// Number of input leaves the caller must supply
    pub required_inputs: usize,

    /// Number of outputs satisfied directly by inputs
    pub passthrough_outputs: usize,

    /// Compilation time in microseconds
    pub compile_time_us: u64,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            required_inputs: Vec::new(),
            outputs: Vec::new(),
            registry_generation: 0,
            stats: PlanStats::default(),
        }
    }

    /// Check if the plan runs no functions at all
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Output names in selection order
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(name, _)| name.as_str())
    }

    /// Whether this plan was compiled for exactly `names`
    pub fn matches_selection(&self, names: &[String]) -> bool {
        self.outputs.len() == names.len()
            && self
                .outputs
                .iter()
                .zip(names)
                .all(|((planned, _), wanted)| planned == wanted)
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new()
    }
}

//! Dependency graph derived from the node registry.
//!
//! Edges run from each argname to the function that consumes it. Names with a
//! producing function are *derived*; every other referenced name is an *input
//! leaf*. A derived name always shadows a same-named input: if a function
//! produces `x`, the graph never treats `x` as something the caller supplies.
//!
//! All traversals are iterative (explicit stacks / heaps), so graph depth does
//! not translate into call-stack depth.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::NodeId;
use crate::pipeline::node::FunctionNode;
use crate::pipeline::registry::NodeRegistry;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

/// Where a single argname is resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// Produced by another registered function.
    Derived(NodeId),
    /// Supplied by the caller; index into [`DependencyGraph::input_names`].
    Input(usize),
}

/// Minimal set of names needed to produce a selection of outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredClosure {
    /// `derived[i]` is true when node `i` must run.
    derived: Vec<bool>,
    /// Input leaf names that must be present in the caller's inputs, sorted.
    inputs: Vec<String>,
}

impl RequiredClosure {
    pub fn contains(&self, id: NodeId) -> bool {
        self.derived.get(id.index()).copied().unwrap_or(false)
    }

    /// Required derived nodes, in registration order.
    pub fn derived(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.derived
            .iter()
            .enumerate()
            .filter(|(_, needed)| **needed)
            .map(|(idx, _)| NodeId::from_index(idx))
    }

    pub fn derived_count(&self) -> usize {
        self.derived.iter().filter(|&&needed| needed).count()
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }
}

/// Node visit state for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Immutable dependency graph over a snapshot of the registry.
pub struct DependencyGraph<V> {
    nodes: Vec<FunctionNode<V>>,
    producers: HashMap<String, NodeId>,
    /// Per node, one entry per argname.
    deps: Vec<Vec<Dependency>>,
    /// Forward edges between derived nodes (one entry per consuming argname).
    dependents: Vec<Vec<NodeId>>,
    /// Every referenced name without a producer, in first-seen order.
    input_names: Vec<String>,
    registry_generation: u64,
}

impl<V> DependencyGraph<V> {
    /// Build the graph from the registry's current contents.
    ///
    /// Fails with [`PipelineError::CyclicDependency`] if any derived name
    /// transitively depends on itself.
    pub fn build(registry: &NodeRegistry<V>) -> PipelineResult<Self> {
        let nodes: Vec<FunctionNode<V>> = registry.nodes().to_vec();
        let n = nodes.len();

        let producers: HashMap<String, NodeId> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.name().to_string(), NodeId::from_index(idx)))
            .collect();

        let mut input_index: HashMap<&str, usize> = HashMap::new();
        let mut input_names = Vec::new();
        let mut deps = Vec::with_capacity(n);
        let mut dependents = vec![Vec::new(); n];

        for (idx, node) in nodes.iter().enumerate() {
            let mut node_deps = Vec::with_capacity(node.arity());
            for arg in node.argnames() {
                let dep = match producers.get(arg) {
                    Some(&producer) => {
                        dependents[producer.index()].push(NodeId::from_index(idx));
                        Dependency::Derived(producer)
                    }
                    None => {
                        let slot = *input_index.entry(arg.as_str()).or_insert_with(|| {
                            input_names.push(arg.clone());
                            input_names.len() - 1
                        });
                        Dependency::Input(slot)
                    }
                };
                node_deps.push(dep);
            }
            deps.push(node_deps);
        }

        let graph = Self {
            nodes,
            producers,
            deps,
            dependents,
            input_names,
            registry_generation: registry.generation(),
        };
        graph.check_acyclic()?;

        tracing::debug!(
            "Dependency graph built: {} functions, {} input leaves (registry gen {})",
            graph.nodes.len(),
            graph.input_names.len(),
            graph.registry_generation,
        );

        Ok(graph)
    }

    /// Iterative DFS; a dependency that is still on the stack closes a cycle.
    fn check_acyclic(&self) -> PipelineResult<()> {
        let n = self.nodes.len();
        let mut marks = vec![Mark::Unvisited; n];
        // (node, index of the next dependency to visit)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for start in 0..n {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::OnStack;
            stack.push((start, 0));

            while let Some(top) = stack.last_mut() {
                let (node, next) = *top;
                if next >= self.deps[node].len() {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                }
                top.1 += 1;

                let Dependency::Derived(dep) = self.deps[node][next] else {
                    continue;
                };
                match marks[dep.index()] {
                    Mark::Unvisited => {
                        marks[dep.index()] = Mark::OnStack;
                        stack.push((dep.index(), 0));
                    }
                    Mark::OnStack => {
                        return Err(PipelineError::CyclicDependency {
                            cycle: self.cycle_path(&stack, dep.index()),
                        });
                    }
                    Mark::Done => {}
                }
            }
        }
        Ok(())
    }

    /// Render the cycle closed by `reentry` as producer-first names.
    ///
    /// The DFS stack runs consumer → dependency, so it is reversed to read as
    /// data flow (`a -> b` meaning `b` consumes `a`).
    fn cycle_path(&self, stack: &[(usize, usize)], reentry: usize) -> Vec<String> {
        let start = stack
            .iter()
            .position(|&(node, _)| node == reentry)
            .unwrap_or(0);
        let mut cycle: Vec<String> = stack[start..]
            .iter()
            .map(|&(node, _)| self.nodes[node].name().to_string())
            .collect();
        cycle.push(self.nodes[reentry].name().to_string());
        cycle.reverse();
        cycle
    }

    /// Names (derived and input) needed to produce every name in `output_names`.
    ///
    /// A requested name with no producer is a passthrough input leaf.
    pub fn required_closure<S: AsRef<str>>(&self, output_names: &[S]) -> RequiredClosure {
        let mut derived = vec![false; self.nodes.len()];
        let mut inputs: BTreeSet<&str> = BTreeSet::new();
        let mut worklist: Vec<NodeId> = Vec::new();

        for name in output_names {
            let name: &str = name.as_ref();
            match self.producers.get(name) {
                Some(&id) => {
                    if !derived[id.index()] {
                        derived[id.index()] = true;
                        worklist.push(id);
                    }
                }
                None => {
                    inputs.insert(name);
                }
            }
        }

        while let Some(id) = worklist.pop() {
            for dep in &self.deps[id.index()] {
                match *dep {
                    Dependency::Derived(producer) => {
                        if !derived[producer.index()] {
                            derived[producer.index()] = true;
                            worklist.push(producer);
                        }
                    }
                    Dependency::Input(slot) => {
                        inputs.insert(self.input_names[slot].as_str());
                    }
                }
            }
        }

        RequiredClosure {
            derived,
            inputs: inputs.into_iter().map(str::to_string).collect(),
        }
    }

    /// Order the closure's derived nodes so every dependency runs first.
    ///
    /// Kahn's algorithm over a min-heap of node ids: among ready nodes the one
    /// registered first always runs first, which makes the call order
    /// reproducible for a fixed registration order.
    pub fn topological_order(&self, closure: &RequiredClosure) -> Vec<NodeId> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];

        for id in closure.derived() {
            in_degree[id.index()] = self.deps[id.index()]
                .iter()
                .filter(|dep| matches!(dep, Dependency::Derived(_)))
                .count();
        }

        let mut ready: BinaryHeap<Reverse<NodeId>> = closure
            .derived()
            .filter(|id| in_degree[id.index()] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(closure.derived_count());

        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for &next in &self.dependents[id.index()] {
                if !closure.contains(next) {
                    continue;
                }
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        debug_assert_eq!(
            order.len(),
            closure.derived_count(),
            "acyclic graph must schedule the whole closure"
        );
        order
    }

    pub fn producer_of(&self, name: &str) -> Option<NodeId> {
        self.producers.get(name).copied()
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.producers.contains_key(name)
    }

    pub fn node(&self, id: NodeId) -> &FunctionNode<V> {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[FunctionNode<V>] {
        &self.nodes
    }

    pub fn dependencies(&self, id: NodeId) -> &[Dependency] {
        &self.deps[id.index()]
    }

    pub fn dependents(&self, id: NodeId) -> &[NodeId] {
        &self.dependents[id.index()]
    }

    /// Every referenced name that no function produces.
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn input_name(&self, slot: usize) -> &str {
        &self.input_names[slot]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn registry_generation(&self) -> u64 {
        self.registry_generation
    }
}

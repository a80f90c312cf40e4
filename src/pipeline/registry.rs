//! Node registry: the owner of every registered [`FunctionNode`].
//!
//! Nodes live in a flat `Vec` indexed by [`NodeId`]. Re-registering a name
//! overwrites its slot in place, so registration order (and therefore the
//! scheduler's tie-break order) is fixed by the first registration.

use crate::pipeline::error::{NameClaim, PipelineError, PipelineResult};
use crate::pipeline::id::NodeId;
use crate::pipeline::node::{FuncSpec, FunctionNode, SharedNodeFn};
use std::collections::{BTreeSet, HashMap};

pub struct NodeRegistry<V> {
    nodes: Vec<FunctionNode<V>>,
    index: HashMap<String, NodeId>,
    /// Names declared input-only; no function may claim them.
    reserved_inputs: BTreeSet<String>,
    /// Bumped on every mutation; consumers compare it to detect staleness.
    generation: u64,
}

impl<V> NodeRegistry<V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            reserved_inputs: BTreeSet::new(),
            generation: 0,
        }
    }

    /// Add or replace the function producing `name`.
    ///
    /// Fails only if `name` was reserved through [`declare_input`](Self::declare_input).
    pub fn register(
        &mut self,
        name: impl Into<String>,
        argnames: Vec<String>,
        callable: SharedNodeFn<V>,
    ) -> PipelineResult<NodeId> {
        let name = name.into();
        if self.reserved_inputs.contains(&name) {
            return Err(PipelineError::DuplicateOutput {
                name,
                claimed_by: NameClaim::Input,
            });
        }

        let node = FunctionNode::new(name.clone(), argnames, callable);
        let id = match self.index.get(&name) {
            Some(&id) => {
                tracing::debug!("Replacing function '{}' ({})", name, id);
                self.nodes[id.index()] = node;
                id
            }
            None => {
                let id = NodeId::from_index(self.nodes.len());
                self.nodes.push(node);
                self.index.insert(name, id);
                id
            }
        };

        self.generation += 1;
        Ok(id)
    }

    /// Register every spec, or none of them if any name clashes with a reserved input.
    pub fn bulk_register<I, S>(&mut self, specs: I) -> PipelineResult<()>
    where
        I: IntoIterator<Item = (S, FuncSpec<V>)>,
        S: Into<String>,
    {
        let specs: Vec<(String, FuncSpec<V>)> =
            specs.into_iter().map(|(name, spec)| (name.into(), spec)).collect();

        if let Some((name, _)) = specs
            .iter()
            .find(|(name, _)| self.reserved_inputs.contains(name))
        {
            return Err(PipelineError::DuplicateOutput {
                name: name.clone(),
                claimed_by: NameClaim::Input,
            });
        }

        for (name, spec) in specs {
            self.register(name, spec.argnames, spec.func)?;
        }
        Ok(())
    }

    /// Reserve `name` as an input-only name.
    pub fn declare_input(&mut self, name: impl Into<String>) -> PipelineResult<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(PipelineError::DuplicateOutput {
                name,
                claimed_by: NameClaim::Function,
            });
        }
        if self.reserved_inputs.insert(name) {
            self.generation += 1;
        }
        Ok(())
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&FunctionNode<V>> {
        self.id_of(name).map(|id| &self.nodes[id.index()])
    }

    pub fn node(&self, id: NodeId) -> Option<&FunctionNode<V>> {
        self.nodes.get(id.index())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn is_reserved_input(&self, name: &str) -> bool {
        self.reserved_inputs.contains(name)
    }

    pub fn reserved_inputs(&self) -> impl Iterator<Item = &str> {
        self.reserved_inputs.iter().map(String::as_str)
    }

    /// Nodes in registration order.
    pub fn nodes(&self) -> &[FunctionNode<V>] {
        &self.nodes
    }

    /// Function names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(FunctionNode::name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<V> Default for NodeRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

//! Function node abstraction for the pipeline.
//!
//! Every registered computation unit is a [`FunctionNode`]: a name, an ordered
//! list of argnames, and an opaque callable. Callables sit behind the
//! [`NodeFn`] trait so native closures and script-backed functions are stored
//! uniformly in the registry.

use crate::pipeline::error::{PipelineError, PipelineResult};
use std::fmt;
use std::sync::Arc;

/// Trait for anything that can back a pipeline function.
///
/// `args` holds one value per declared argname, in declaration order.
pub trait NodeFn<V>: Send + Sync {
    /// Compute the node's single output from its arguments.
    fn call(&self, args: &[V]) -> anyhow::Result<V>;

    /// Short human-readable description, used in logs.
    fn describe(&self) -> &str {
        "native"
    }
}

/// Adapter turning a plain closure into a [`NodeFn`].
pub struct ClosureFn<F> {
    f: F,
}

impl<F> ClosureFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<V, F> NodeFn<V> for ClosureFn<F>
where
    F: Fn(&[V]) -> anyhow::Result<V> + Send + Sync,
{
    #[inline]
    fn call(&self, args: &[V]) -> anyhow::Result<V> {
        (self.f)(args)
    }
}

/// Shared handle to a callable.
pub type SharedNodeFn<V> = Arc<dyn NodeFn<V>>;

/// A registered function: its output name, its argnames, and its callable.
pub struct FunctionNode<V> {
    name: String,
    argnames: Vec<String>,
    callable: SharedNodeFn<V>,
}

impl<V> FunctionNode<V> {
    pub fn new(name: impl Into<String>, argnames: Vec<String>, callable: SharedNodeFn<V>) -> Self {
        Self {
            name: name.into(),
            argnames,
            callable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argnames(&self) -> &[String] {
        &self.argnames
    }

    /// Number of positional arguments the callable receives.
    pub fn arity(&self) -> usize {
        self.argnames.len()
    }

    pub fn callable(&self) -> &SharedNodeFn<V> {
        &self.callable
    }

    /// Invoke the callable, tagging any failure with this node's name.
    pub fn call(&self, args: &[V]) -> PipelineResult<V> {
        debug_assert_eq!(args.len(), self.arity());
        self.callable
            .call(args)
            .map_err(|source| PipelineError::Callable {
                node: self.name.clone(),
                source,
            })
    }
}

impl<V> Clone for FunctionNode<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            argnames: self.argnames.clone(),
            callable: Arc::clone(&self.callable),
        }
    }
}

impl<V> fmt::Debug for FunctionNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionNode")
            .field("name", &self.name)
            .field("argnames", &self.argnames)
            .field("callable", &self.callable.describe())
            .finish()
    }
}

/// Declarative function spec used by bulk registration.
pub struct FuncSpec<V> {
    pub func: SharedNodeFn<V>,
    pub argnames: Vec<String>,
}

impl<V: 'static> FuncSpec<V> {
    /// Spec backed by a closure.
    pub fn new<F, I, S>(func: F, argnames: I) -> Self
    where
        F: Fn(&[V]) -> anyhow::Result<V> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_node_fn(Arc::new(ClosureFn::new(func)), argnames)
    }

    /// Spec backed by an existing callable (e.g. a compiled script).
    pub fn from_node_fn<I, S>(func: SharedNodeFn<V>, argnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            func,
            argnames: argnames.into_iter().map(Into::into).collect(),
        }
    }
}

impl<V> Clone for FuncSpec<V> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            argnames: self.argnames.clone(),
        }
    }
}

//! Lazily evaluated named-function pipeline.
//!
//! Every function is registered under the name of the value it produces and
//! declares the names of its arguments. A name no function produces is an
//! input leaf the caller supplies at evaluation time.
//!
//! # Architecture
//!
//! ```text
//! NodeRegistry ──build──► DependencyGraph ──compile(selection)──► ExecutionPlan
//!                                                                     │
//!                                       inputs ──► Evaluation ◄───────┘
//!                                                     │
//!                                                     ▼
//!                                              selected outputs
//! ```
//!
//! # Design
//!
//! - **Lazy**: only the required closure of the selected outputs runs.
//! - **Memoized per call**: each function runs at most once per evaluation.
//! - **Deterministic order**: ties in the topological order follow registration order.
//! - **Cached rebuilds**: graph and plan are rebuilt only when the registry or
//!   the selection changed.
//! - **Snapshots**: `PipelineSnapshot` is immutable and `Send + Sync`, so
//!   evaluations can run concurrently with registry edits.

pub mod compiled_plan;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod graph;
pub mod id;
pub mod node;
pub mod registry;
pub mod selection;
pub mod shared;

pub use compiled_plan::{ExecutionPlan, OutputSource, PlanStats};
pub use compiler::PlanCompiler;
pub use error::{NameClaim, PipelineError, PipelineResult};
pub use evaluator::{EvalPhase, PipelineSnapshot};
pub use executor::DataPipeline;
pub use graph::{Dependency, DependencyGraph, RequiredClosure};
pub use id::NodeId;
pub use node::{ClosureFn, FuncSpec, FunctionNode, NodeFn, SharedNodeFn};
pub use registry::NodeRegistry;
pub use selection::OutputSelection;
pub use shared::SharedPipeline;

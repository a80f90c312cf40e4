//! Pipeline-specific error types.

use thiserror::Error;

/// Errors that can occur while building or evaluating a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A derived name transitively depends on itself.
    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Required input leaves were not supplied to the evaluation.
    #[error("Missing input(s): {}", .names.join(", "))]
    MissingInput { names: Vec<String> },

    /// A name is claimed both as a reserved input and as a function output.
    #[error("Duplicate output '{name}': already reserved as {claimed_by}")]
    DuplicateOutput { name: String, claimed_by: NameClaim },

    /// A registered callable returned an error. The source is carried unmodified.
    #[error("Function '{node}' failed: {source}")]
    Callable {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Pipeline lock poisoned")]
    LockPoisoned,
}

/// What already owns a name when registration clashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClaim {
    /// The name was declared as an input-only name.
    Input,
    /// The name is produced by a registered function.
    Function,
}

impl std::fmt::Display for NameClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameClaim::Input => write!(f, "an input"),
            NameClaim::Function => write!(f, "a function output"),
        }
    }
}

impl PipelineError {
    /// Names of the missing inputs, if this is a [`PipelineError::MissingInput`].
    pub fn missing_inputs(&self) -> Option<&[String]> {
        match self {
            PipelineError::MissingInput { names } => Some(names),
            _ => None,
        }
    }

    /// Whether this error came from a registered callable rather than the graph.
    pub fn is_callable_failure(&self) -> bool {
        matches!(self, PipelineError::Callable { .. })
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display() {
        let err = PipelineError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency: a -> b -> a");
    }

    #[test]
    fn test_missing_input_accessor() {
        let err = PipelineError::MissingInput {
            names: vec!["text".into()],
        };
        assert_eq!(err.missing_inputs(), Some(&["text".to_string()][..]));
        assert!(!err.is_callable_failure());
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn test_callable_keeps_source() {
        use std::error::Error as _;

        let err = PipelineError::Callable {
            node: "foo".into(),
            source: anyhow::anyhow!("boom"),
        };
        assert!(err.is_callable_failure());
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".into()));
    }
}

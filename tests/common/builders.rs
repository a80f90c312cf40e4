//! Test data builders for creating test pipelines

use datapipe_rs::pipeline::DataPipeline;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Number of input leaves random DAGs draw from
pub const DAG_INPUTS: usize = 3;

/// Records every function invocation, in call order
#[derive(Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

/// Argument names for function `index` of a random DAG.
///
/// A raw pick below `index` refers to an earlier function `f{pick}`; anything
/// else becomes one of the input leaves `x0..x2`. Only backward edges, so the
/// result is always acyclic.
pub fn dag_argnames(index: usize, picks: &[usize]) -> Vec<String> {
    picks
        .iter()
        .map(|&pick| {
            if pick < index {
                format!("f{}", pick)
            } else {
                format!("x{}", pick % DAG_INPUTS)
            }
        })
        .collect()
}

/// Builder for random acyclic integer pipelines with recorded calls
pub struct DagBuilder {
    picks: Vec<Vec<usize>>,
    recorder: CallRecorder,
}

impl DagBuilder {
    pub fn new(picks: Vec<Vec<usize>>) -> Self {
        Self {
            picks,
            recorder: CallRecorder::new(),
        }
    }

    pub fn recorder(&self) -> &CallRecorder {
        &self.recorder
    }

    /// Argument names of every function, by index
    pub fn argnames(&self) -> Vec<Vec<String>> {
        self.picks
            .iter()
            .enumerate()
            .map(|(i, picks)| dag_argnames(i, picks))
            .collect()
    }

    /// Functions `selected` transitively depends on, itself included
    pub fn expected_closure(&self, selected: &[usize]) -> BTreeSet<String> {
        let argnames = self.argnames();
        let mut seen = BTreeSet::new();
        let mut stack: Vec<usize> = selected.to_vec();
        while let Some(i) = stack.pop() {
            if !seen.insert(format!("f{}", i)) {
                continue;
            }
            for arg in &argnames[i] {
                if let Some(dep) = arg.strip_prefix('f') {
                    stack.push(dep.parse().unwrap());
                }
            }
        }
        seen
    }

    /// Each function sums its arguments plus its own index
    pub fn build(&self) -> DataPipeline<i64> {
        let mut pipeline = DataPipeline::new();
        for (i, argnames) in self.argnames().into_iter().enumerate() {
            let name = format!("f{}", i);
            let recorder = self.recorder.clone();
            let label = name.clone();
            pipeline
                .add_func(
                    name,
                    move |args: &[i64]| {
                        recorder.record(&label);
                        Ok(args.iter().fold(i as i64, |acc, v| acc.wrapping_add(*v)))
                    },
                    argnames,
                )
                .unwrap();
        }
        pipeline
    }
}

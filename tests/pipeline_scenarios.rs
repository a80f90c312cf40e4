//! End-to-end behaviour of the pipeline: laziness, memoization, passthrough,
//! retargeting and cycle detection.

mod common;

use common::{add_values, inputs, sorted_keys};
use datapipe_rs::pipeline::{DataPipeline, FuncSpec, NodeFn, PipelineError};
use datapipe_rs::Value;
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;

mock! {
    pub Callable {}

    impl NodeFn<Value> for Callable {
        fn call(&self, args: &[Value]) -> anyhow::Result<Value>;
    }
}

fn lowercase(args: &[Value]) -> anyhow::Result<Value> {
    let text = args[0]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("expected a string"))?;
    Ok(Value::from(text.to_lowercase()))
}

fn reverse(args: &[Value]) -> anyhow::Result<Value> {
    let text = args[0]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("expected a string"))?;
    Ok(Value::from(text.chars().rev().collect::<String>()))
}

/// `foobar(foo, bar)` backed by a mock expecting `calls` invocations.
fn tracked_foobar(calls: usize) -> Arc<MockCallable> {
    let mut mock = MockCallable::new();
    mock.expect_call().times(calls).returning(add_values);
    Arc::new(mock)
}

#[test]
fn test_text_chain() {
    let mut pipeline: DataPipeline = DataPipeline::from_configuration(
        [
            ("foo", FuncSpec::new(lowercase, ["text"])),
            ("bar", FuncSpec::new(reverse, ["foo"])),
        ],
        ["bar"],
    )
    .unwrap();

    let out = pipeline
        .evaluate(&inputs(&[("text", Value::from("Test"))]))
        .unwrap();

    assert_eq!(out, HashMap::from([("bar".to_string(), Value::from("tset"))]));
}

#[test]
fn test_incremental_registration() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.add_func("foobar", add_values, ["foo", "bar"]).unwrap();
    pipeline.output_names_mut().push("foobar");

    let out = pipeline
        .evaluate(&inputs(&[("foo", Value::Int(1)), ("bar", Value::Int(2))]))
        .unwrap();

    assert_eq!(out, HashMap::from([("foobar".to_string(), Value::Int(3))]));
}

#[test]
fn test_unselected_function_never_called() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.register("foobar", ["foo", "bar"], tracked_foobar(0)).unwrap();
    let args = inputs(&[("foo", Value::Int(1)), ("bar", Value::Int(2))]);

    assert!(pipeline.evaluate(&args).unwrap().is_empty());

    pipeline.set_output_names(["foo", "bar"]);
    let out = pipeline.evaluate(&args).unwrap();
    assert_eq!(sorted_keys(&out), vec!["bar", "foo"]);
}

#[test]
fn test_dependency_of_selected_output_runs() {
    let mut mock = MockCallable::new();
    mock.expect_call().times(1).returning(|_| Ok(Value::Int(3)));

    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.register("foobar", ["foo", "bar"], Arc::new(mock)).unwrap();
    pipeline.add_func("truebar", |x| Ok(x[0].clone()), ["foobar"]).unwrap();
    pipeline.output_names_mut().push("truebar");

    let out = pipeline
        .evaluate(&inputs(&[("foo", Value::Int(1)), ("bar", Value::Int(2))]))
        .unwrap();
    assert_eq!(out["truebar"], Value::Int(3));
}

#[test]
fn test_sibling_of_selected_output_skipped() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.register("foobar", ["foo", "bar"], tracked_foobar(0)).unwrap();
    pipeline.add_func("truebar", |x| Ok(x[0].clone()), ["foo"]).unwrap();
    pipeline.output_names_mut().push("truebar");

    let out = pipeline
        .evaluate(&inputs(&[("foo", Value::Int(1)), ("bar", Value::Int(2))]))
        .unwrap();
    assert_eq!(out["truebar"], Value::Int(1));
}

#[test]
fn test_mixed_outputs_call_once() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.register("foobar", ["foo", "bar"], tracked_foobar(1)).unwrap();
    pipeline.set_output_names(["foobar", "foo"]);

    let out = pipeline
        .evaluate(&inputs(&[("foo", Value::Int(1)), ("bar", Value::Int(2))]))
        .unwrap();

    assert_eq!(sorted_keys(&out), vec!["foo", "foobar"]);
    assert_eq!(out["foobar"], Value::Int(3));
    assert_eq!(out["foo"], Value::Int(1));
}

#[test]
fn test_retarget_to_passthrough() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.register("foobar", ["foo", "bar"], tracked_foobar(1)).unwrap();
    let args = inputs(&[("foo", Value::Int(1)), ("bar", Value::Int(2))]);

    pipeline.set_output_names(["foobar", "foo"]);
    pipeline.evaluate(&args).unwrap();

    // The mock allows exactly one call, made above.
    pipeline.set_output_names(["bar"]);
    let out = pipeline.evaluate(&args).unwrap();
    assert_eq!(out, HashMap::from([("bar".to_string(), Value::Int(2))]));
}

#[test]
fn test_mutual_dependency_is_cyclic() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.add_func("a", add_values, ["b"]).unwrap();
    pipeline.add_func("b", add_values, ["a"]).unwrap();

    match pipeline.build() {
        Err(PipelineError::CyclicDependency { cycle }) => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&"a".to_string()));
            assert!(cycle.contains(&"b".to_string()));
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
}

#[test]
fn test_retargeting_leaves_registry_untouched() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.add_func("foobar", add_values, ["foo", "bar"]).unwrap();
    pipeline.add_func("truebar", add_values, ["foobar"]).unwrap();
    let before = pipeline.registry().generation();

    pipeline.set_output_names(["truebar"]);
    pipeline.output_names_mut().push("foo");
    pipeline.output_names_mut().remove("truebar");

    assert_eq!(pipeline.registry().generation(), before);
    assert_eq!(pipeline.func_names().collect::<Vec<_>>(), vec!["foobar", "truebar"]);
}

#[test]
fn test_missing_input_reports_names_and_no_outputs() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.register("foobar", ["foo", "bar"], tracked_foobar(0)).unwrap();
    pipeline.set_output_names(["foobar"]);

    let err = pipeline
        .evaluate(&inputs(&[("foo", Value::Int(1))]))
        .unwrap_err();
    assert_eq!(err.missing_inputs(), Some(&["bar".to_string()][..]));
}

#[test]
fn test_reserved_input_rejects_function() {
    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.declare_input("text").unwrap();

    let err = pipeline.add_func("text", lowercase, ["raw"]).unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateOutput { .. }));
    assert!(!pipeline.contains_func("text"));
}

#[test]
fn test_callable_error_keeps_source() {
    let mut mock = MockCallable::new();
    mock.expect_call()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("sensor offline")));

    let mut pipeline: DataPipeline = DataPipeline::new();
    pipeline.register("reading", ["port"], Arc::new(mock)).unwrap();
    pipeline.set_output_names(["reading"]);

    let err = pipeline
        .evaluate(&inputs(&[("port", Value::Int(3))]))
        .unwrap_err();
    assert!(err.is_callable_failure());
    let source = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("sensor offline"));
}

// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use topup_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new("ordered", &[("step1", false), ("step2", false), ("step3", false)]);

  pipeline.on_root("step1", create_simple_handler("step1", " S1"));
  pipeline.on_root("step2", create_simple_handler("step2", " S2"));
  pipeline.on_root("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new("stopping", &[("stepA", false), ("stopStep", false), ("stepC", false)]);

  pipeline.on_root("stepA", create_simple_handler("stepA", "A"));
  pipeline.on_root("stopStep", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push("stopStep".to_string());
      Ok::<PipelineControl, FlowError>(PipelineControl::Stop)
    })
  });
  pipeline.on_root("stepC", create_simple_handler("stepC", "C"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "failing",
    &[("good_step", false), ("bad_step", false), ("another_step", false)],
  );

  pipeline.on_root("good_step", create_simple_handler("good_step", "Good"));
  pipeline.on_root("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  pipeline.on_root("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("I am a bad step!".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new("optional", &[("first", false), ("maybe", true), ("last", false)]);

  pipeline.on_root("first", create_simple_handler("first", "1"));
  pipeline.on_root("last", create_simple_handler("last", "3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["first", "last"]);
}

#[tokio::test]
#[serial]
async fn test_after_handlers_run_after_on_handlers() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("after", &[("only", false)]);

  pipeline.after_root("only", create_simple_handler("after", "-after"));
  pipeline.on_root("only", create_simple_handler("on_1", "on1"));
  pipeline.on_root("only", create_simple_handler("on_2", "-on2"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().message, "on1-on2-after");
}

#[tokio::test]
#[serial]
async fn test_stop_in_on_phase_skips_after_handlers() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("stop_skips_after", &[("only", false)]);

  pipeline.on_root("only", create_simple_handler("only", "on"));
  pipeline.after_root("only", create_simple_handler("after", "-after"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("only".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Stopped);
  assert_eq!(ctx.read().message, "on");
}

#[test]
fn test_step_names_preserve_declaration_order() {
  let pipeline = Pipeline::<TestContext, TestError>::new("names", &[("b", false), ("a", true), ("c", false)]);
  assert_eq!(pipeline.step_names(), vec!["b", "a", "c"]);
  assert_eq!(pipeline.name(), "names");
  assert!(pipeline.has_step("a"));
  assert!(!pipeline.has_step("z"));
}

#[test]
#[should_panic(expected = "Step not found")]
fn test_registering_on_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new("typo", &[("known", false)]);
  pipeline.on_root("unknown", create_simple_handler("unknown", ""));
}

// tests/error_handling_tests.rs
mod common;

use common::*;
use serial_test::serial;
use topup_flow::{ContextData, FlowError, Pipeline, PipelineControl};

#[tokio::test]
#[serial]
async fn test_pipeline_run_catches_handler_missing() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::new("bare", &[("missing", false)]);
  let ctx = ContextData::new(TestContext::default());

  match pipeline.run(ctx).await.unwrap_err() {
    TestError::Flow(s) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("missing"));
    }
    other => panic!("Expected TestError::Flow(HandlerMissing), got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_pipeline_with_flow_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, FlowError>::new("flow_typed", &[("fail_task", false)]);
  pipeline.on_root("fail_task", |_ctx: ContextData<TestContext>| {
    Box::pin(async move { Err::<PipelineControl, _>(FlowError::missing_state("fail_task", "order_id")) })
  });

  let result = pipeline.run(ContextData::new(TestContext::default())).await;
  match result.unwrap_err() {
    FlowError::MissingState { step_name, detail } => {
      assert_eq!(step_name, "fail_task");
      assert_eq!(detail, "order_id");
    }
    other => panic!("Expected FlowError::MissingState, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_after_handler_error_is_returned() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new("after_fails", &[("work", false), ("never", false)]);
  pipeline.on_root("work", create_simple_handler("work", "w"));
  pipeline.after_root("work", create_failing_handler("work_after", "after broke"));
  pipeline.on_root("never", create_simple_handler("never", "n"));

  let ctx = ContextData::new(TestContext::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("after broke".to_string()));
  assert_eq!(ctx.read().steps_executed, vec!["work", "work_after"]);
}

mod common;

use common::*;
use mobileshop_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult, SkipCondition};
use serial_test::serial;
use std::sync::Arc;

fn draft_pipeline() -> Pipeline<DraftCtx, DraftError> {
  Pipeline::new(
    "draft",
    &[("load_lines", false, None), ("apply_discount", false, None), ("finalize", false, None)],
  )
}

#[tokio::test]
#[serial]
async fn steps_run_in_declared_order() {
  setup_tracing();
  let mut pipeline = draft_pipeline();
  pipeline.on_step("load_lines", recording_handler("load_lines", 1000));
  pipeline.on_step("apply_discount", recording_handler("apply_discount", -100));
  pipeline.on_step("finalize", recording_handler("finalize", 0));

  let ctx = ContextData::new(DraftCtx::default());
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.total_cents, 900);
  assert_eq!(guard.trail, vec!["load_lines", "apply_discount", "finalize"]);
}

#[tokio::test]
#[serial]
async fn stop_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline = draft_pipeline();
  pipeline.on_step("load_lines", recording_handler("load_lines", 1000));
  pipeline.on_step("apply_discount", recording_handler("apply_discount", -100));
  pipeline.on_step("finalize", recording_handler("finalize", 5));

  let ctx = ContextData::new(DraftCtx {
    stop_at: Some("apply_discount".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Stopped);
  assert_eq!(ctx.read().trail, vec!["load_lines", "apply_discount"]);
  assert_eq!(ctx.read().total_cents, 900);
}

#[tokio::test]
#[serial]
async fn handler_error_aborts_the_run() {
  setup_tracing();
  let mut pipeline = draft_pipeline();
  pipeline.on_step("load_lines", recording_handler("load_lines", 1000));
  pipeline.on_step("apply_discount", rejecting_handler("apply_discount", "coupon expired"));
  pipeline.on_step("finalize", recording_handler("finalize", 0));

  let ctx = ContextData::new(DraftCtx::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, DraftError::Rejected("coupon expired".to_string()));
  assert_eq!(ctx.read().trail, vec!["load_lines", "apply_discount"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_bypasses_step() {
  setup_tracing();
  let skip: SkipCondition<DraftCtx> = Arc::new(|ctx: ContextData<DraftCtx>| ctx.read().skip_discount);
  let mut pipeline = Pipeline::<DraftCtx, DraftError>::new(
    "draft",
    &[("load_lines", false, None), ("apply_discount", false, Some(skip)), ("finalize", false, None)],
  );
  pipeline.on_step("load_lines", recording_handler("load_lines", 1000));
  pipeline.on_step("apply_discount", recording_handler("apply_discount", -100));
  pipeline.on_step("finalize", recording_handler("finalize", 0));

  let ctx = ContextData::new(DraftCtx {
    skip_discount: true,
    ..Default::default()
  });
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().total_cents, 1000);
  assert_eq!(ctx.read().trail, vec!["load_lines", "finalize"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_sees_earlier_writes() {
  setup_tracing();
  let skip: SkipCondition<DraftCtx> = Arc::new(|ctx: ContextData<DraftCtx>| ctx.read().total_cents == 0);
  let mut pipeline = Pipeline::<DraftCtx, DraftError>::new(
    "draft",
    &[("load_lines", false, None), ("apply_discount", false, Some(skip))],
  );
  pipeline.on_step("load_lines", recording_handler("load_lines", 0));
  pipeline.on_step("apply_discount", recording_handler("apply_discount", -100));

  let ctx = ContextData::new(DraftCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().trail, vec!["load_lines"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<DraftCtx, DraftError>::new("draft", &[("finalize", false, None)]);
  pipeline.after_step("finalize", recording_handler("after", 0));
  pipeline.on_step("finalize", recording_handler("on", 0));
  pipeline.before_step("finalize", recording_handler("before", 0));

  let ctx = ContextData::new(DraftCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().trail, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_passed_over() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<DraftCtx, DraftError>::new("draft", &[("audit", true, None), ("finalize", false, None)]);
  pipeline.on_step("finalize", recording_handler("finalize", 0));

  let ctx = ContextData::new(DraftCtx::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["finalize"]);
}

#[tokio::test]
#[serial]
async fn steps_can_be_made_optional_after_construction() {
  setup_tracing();
  let mut pipeline = draft_pipeline();
  pipeline.on_step("load_lines", recording_handler("load_lines", 1000));
  pipeline.on_step("finalize", recording_handler("finalize", 0));

  match pipeline.run(ContextData::new(DraftCtx::default())).await {
    Err(DraftError::Flow(detail)) => assert!(detail.contains("HandlerMissing")),
    other => panic!("expected a missing handler, got {:?}", other),
  }

  pipeline.set_optional("apply_discount", true);
  let ctx = ContextData::new(DraftCtx::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["load_lines", "finalize"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_can_be_attached_and_cleared() {
  setup_tracing();
  let mut pipeline = draft_pipeline();
  pipeline.on_step("load_lines", recording_handler("load_lines", 1000));
  pipeline.on_step("apply_discount", recording_handler("apply_discount", -100));
  pipeline.on_step("finalize", recording_handler("finalize", 0));
  let skip: SkipCondition<DraftCtx> = Arc::new(|ctx: ContextData<DraftCtx>| ctx.read().skip_discount);
  pipeline.set_skip_condition("apply_discount", Some(skip));

  let skipped = ContextData::new(DraftCtx {
    skip_discount: true,
    ..Default::default()
  });
  pipeline.run(skipped.clone()).await.unwrap();
  assert_eq!(skipped.read().total_cents, 1000);

  pipeline.set_skip_condition("apply_discount", None);
  let charged = ContextData::new(DraftCtx {
    skip_discount: true,
    ..Default::default()
  });
  pipeline.run(charged.clone()).await.unwrap();
  assert_eq!(charged.read().total_cents, 900);
  assert_eq!(charged.read().trail, vec!["load_lines", "apply_discount", "finalize"]);
}

#[tokio::test]
#[serial]
async fn inserted_steps_take_their_position() {
  setup_tracing();
  let mut pipeline = draft_pipeline();
  pipeline.insert_after_step("load_lines", "check_stock", false, None);
  pipeline.insert_before_step("load_lines", "verify_address", false, None);
  pipeline.remove_step("apply_discount");

  assert_eq!(pipeline.step_names(), vec!["verify_address", "load_lines", "check_stock", "finalize"]);

  for name in ["verify_address", "load_lines", "check_stock", "finalize"] {
    pipeline.on_step(name, recording_handler(name, 0));
  }
  let ctx = ContextData::new(DraftCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().trail, vec!["verify_address", "load_lines", "check_stock", "finalize"]);
}

#[tokio::test]
#[serial]
async fn handlers_may_return_flow_errors_directly() {
  setup_tracing();
  let mut pipeline = Pipeline::<DraftCtx, DraftError>::new("draft", &[("finalize", false, None)]);
  pipeline.on_step("finalize", |ctx: ContextData<DraftCtx>| {
    Box::pin(async move {
      ctx.write().trail.push("finalize".to_string());
      Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
    })
  });

  let ctx = ContextData::new(DraftCtx::default());
  assert!(pipeline.run(ctx.clone()).await.is_ok());
}

#[test]
#[should_panic(expected = "not defined")]
fn registering_on_unknown_step_panics() {
  let mut pipeline = draft_pipeline();
  pipeline.on_step("ship", recording_handler("ship", 0));
}

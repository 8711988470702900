mod common;

use common::*;
use mobileshop_flow::{ContextData, FlowError, Pipeline, PipelineControl};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn later_steps_see_earlier_writes() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<DraftCtx, DraftError>::new("draft", &[("price", false, None), ("double", false, None)]);

  pipeline.on_step("price", |ctx: ContextData<DraftCtx>| {
    Box::pin(async move {
      ctx.write().total_cents = 250;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });
  pipeline.on_step("double", |ctx: ContextData<DraftCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      assert_eq!(guard.total_cents, 250);
      guard.total_cents *= 2;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });

  let ctx = ContextData::new(DraftCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().total_cents, 500);
}

#[test]
fn clones_share_the_same_data() {
  let original = ContextData::new(DraftCtx::default());
  let clone = original.clone();

  original.write().total_cents = 5;
  assert_eq!(clone.read().total_cents, 5);
  assert_eq!(original.handle_count(), 2);

  *clone.map_write(|c| &mut c.total_cents) = 7;
  assert_eq!(*original.map_read(|c| &c.total_cents), 7);
}

#[test]
fn try_write_fails_while_read_guard_is_alive() {
  let ctx = ContextData::new(DraftCtx::default());
  let guard = ctx.read();
  assert!(ctx.try_write().is_none());
  assert!(ctx.try_read().is_some());
  drop(guard);
  assert!(ctx.try_write().is_some());
}

#[test]
fn try_read_fails_while_write_guard_is_alive() {
  let ctx = ContextData::new(DraftCtx::default());
  let guard = ctx.write();
  assert!(ctx.try_read().is_none());
  drop(guard);
  assert_eq!(ctx.try_read().map(|c| c.total_cents), Some(0));
}

#[tokio::test]
#[serial]
async fn guards_are_released_across_awaits() {
  setup_tracing();
  let mut pipeline = Pipeline::<DraftCtx, DraftError>::new("draft", &[("slow", false, None)]);
  pipeline.on_step("slow", |ctx: ContextData<DraftCtx>| {
    Box::pin(async move {
      let before = ctx.read().total_cents;
      tokio::time::sleep(Duration::from_millis(1)).await;
      ctx.write().total_cents = before + 1;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });

  let ctx = ContextData::new(DraftCtx::default());
  let observer = ctx.clone();
  pipeline.run(ctx).await.unwrap();
  assert_eq!(observer.read().total_cents, 1);
}

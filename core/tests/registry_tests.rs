mod common;

use common::*;
use mobileshop_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult, Registry};

#[derive(Debug, Default)]
struct RegisterCtx {
  email: String,
}

#[derive(Debug, Default)]
struct RefreshCtx {
  rotations: u32,
}

fn register_pipeline() -> Pipeline<RegisterCtx, DraftError> {
  let mut p = Pipeline::new("register", &[("normalize_email", false, None)]);
  p.on_step("normalize_email", |ctx: ContextData<RegisterCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.email = guard.email.trim().to_lowercase();
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });
  p
}

fn refresh_pipeline() -> Pipeline<RefreshCtx, DraftError> {
  let mut p = Pipeline::new("refresh", &[("rotate", false, None)]);
  p.on_step("rotate", |ctx: ContextData<RefreshCtx>| {
    Box::pin(async move {
      ctx.write().rotations += 1;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });
  p
}

#[tokio::test]
async fn dispatches_by_context_type() {
  setup_tracing();
  let registry = Registry::<DraftError>::new();
  registry.register(register_pipeline());
  registry.register(refresh_pipeline());

  let register = ContextData::new(RegisterCtx {
    email: "  Jane@Example.COM ".to_string(),
  });
  assert_eq!(registry.run(register.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(register.read().email, "jane@example.com");

  let refresh = ContextData::new(RefreshCtx::default());
  registry.run(refresh.clone()).await.unwrap();
  assert_eq!(refresh.read().rotations, 1);

  assert!(registry.is_registered::<RegisterCtx>());
  assert_eq!(registry.pipeline_names(), vec!["refresh", "register"]);
}

#[tokio::test]
async fn unknown_context_type_is_reported() {
  setup_tracing();
  let registry = Registry::<DraftError>::new();
  registry.register(register_pipeline());

  let err = registry.run(ContextData::new(RefreshCtx::default())).await.unwrap_err();

  match err {
    DraftError::Flow(detail) => {
      assert!(detail.contains("NotRegistered"));
      assert!(detail.contains("RefreshCtx"));
    }
    other => panic!("expected a flow error, got {:?}", other),
  }
}

#[tokio::test]
async fn registering_again_replaces_the_pipeline() {
  setup_tracing();
  let registry = Registry::<DraftError>::new();
  registry.register(refresh_pipeline());

  let mut twice = Pipeline::<RefreshCtx, DraftError>::new("refresh_twice", &[("rotate", false, None)]);
  for _ in 0..2 {
    twice.on_step("rotate", |ctx: ContextData<RefreshCtx>| {
      Box::pin(async move {
        ctx.write().rotations += 1;
        Ok::<_, FlowError>(PipelineControl::Continue)
      })
    });
  }
  registry.register(twice);

  let ctx = ContextData::new(RefreshCtx::default());
  registry.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().rotations, 2);
  assert_eq!(registry.pipeline_names(), vec!["refresh_twice"]);
}

#[tokio::test]
async fn handler_errors_surface_through_the_registry() {
  setup_tracing();
  let registry = Registry::<DraftError>::new();
  let mut p = Pipeline::<DraftCtx, DraftError>::new("draft", &[("charge", false, None)]);
  p.on_step("charge", rejecting_handler("charge", "card declined"));
  registry.register(p);

  let err = registry.run(ContextData::new(DraftCtx::default())).await.unwrap_err();
  assert_eq!(err, DraftError::Rejected("card declined".to_string()));
}

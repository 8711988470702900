#![allow(dead_code)]

use mobileshop_flow::{ContextData, FlowError, Handler, PipelineControl};
use once_cell::sync::Lazy;
use tracing::Level;

/// An order-draft context: handlers record themselves and adjust a running total.
#[derive(Clone, Debug, Default)]
pub struct DraftCtx {
  pub total_cents: i64,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
  pub skip_discount: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DraftError {
  #[error("flow: {0}")]
  Flow(String),

  #[error("rejected: {0}")]
  Rejected(String),
}

impl From<FlowError> for DraftError {
  fn from(err: FlowError) -> Self {
    DraftError::Flow(format!("{:?}", err))
  }
}

/// Appends `label` to the trail and adds `cents` to the total.
pub fn recording_handler(label: &'static str, cents: i64) -> Handler<DraftCtx, DraftError> {
  Box::new(move |ctx: ContextData<DraftCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.total_cents += cents;
      guard.trail.push(label.to_string());
      if guard.stop_at.as_deref() == Some(label) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn rejecting_handler(label: &'static str, reason: &'static str) -> Handler<DraftCtx, DraftError> {
  Box::new(move |ctx: ContextData<DraftCtx>| {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      Err(DraftError::Rejected(reason.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

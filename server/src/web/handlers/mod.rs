use mobileshop_flow::{ContextData, PipelineResult};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

pub mod admin_handlers;
pub mod auth_handlers;
pub mod cart_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod taxonomy_handlers;
pub mod user_handlers;

/// Runs the pipeline registered for `T`. A pipeline that stops early without
/// an error is treated as a server fault, since every workflow here reports
/// business failures as `AppError`.
pub(crate) async fn run_workflow<T>(app_state: &AppState, ctx: ContextData<T>, workflow: &str) -> Result<(), AppError>
where
  T: 'static + Send + Sync,
{
  match app_state.flows.run(ctx).await {
    Ok(PipelineResult::Completed) => Ok(()),
    Ok(PipelineResult::Stopped) => {
      warn!(%workflow, "Pipeline was stopped by a handler.");
      Err(AppError::Internal(format!("{} was halted by an internal step.", workflow)))
    }
    Err(app_err) => {
      warn!(%workflow, error = %app_err, "Pipeline failed.");
      Err(app_err)
    }
  }
}

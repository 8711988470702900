//! Multi-step workflows, each a pipeline keyed by its context type.

use crate::errors::AppError;
use crate::state::AppState;
use mobileshop_flow::Registry;
use std::sync::Arc;

pub mod contexts;

pub mod cart_pipeline;
pub mod login_pipeline;
pub mod order_pipeline;
pub mod refresh_pipeline;
pub mod register_pipeline;

/// Registers every pipeline with `registry`. Called once while building the state.
pub fn register_all_pipelines(registry: &Arc<Registry<AppError>>, app_state: &AppState) {
  tracing::info!("Registering pipelines...");

  register_pipeline::register_register_pipeline(registry, app_state);
  login_pipeline::register_login_pipeline(registry, app_state);
  refresh_pipeline::register_refresh_pipeline(registry, app_state);
  cart_pipeline::register_add_to_cart_pipeline(registry, app_state);
  order_pipeline::register_place_order_pipeline(registry, app_state);

  tracing::info!(pipelines = ?registry.pipeline_names(), "All pipelines registered.");
}

use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderDetail, OrderStatus, Page, PageRequest};
use crate::state::AppState;

pub async fn list_own(app_state: &AppState, user_id: Uuid, page: PageRequest) -> Result<Page<OrderDetail>> {
  app_state.repos.orders.list_for_user(user_id, page).await
}

/// A foreign order reads as missing.
pub async fn get_own(app_state: &AppState, user_id: Uuid, order_id: Uuid) -> Result<OrderDetail> {
  app_state
    .repos
    .orders
    .find_detail(order_id)
    .await?
    .filter(|detail| detail.order.user_id == user_id)
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// Admin status change, gated by the configured transition policy.
#[instrument(name = "order_service::set_status", skip(app_state))]
pub async fn set_status(app_state: &AppState, order_id: Uuid, requested: &str) -> Result<Order> {
  let next: OrderStatus = requested.trim().parse().map_err(AppError::Validation)?;
  let current = app_state
    .repos
    .orders
    .find(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  app_state.config.order_transition_policy.check(current.status, next)?;

  let updated = app_state
    .repos
    .orders
    .set_status(order_id, next)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  info!(from = %current.status, to = %next, "Order status changed.");
  Ok(updated)
}

use actix_web::{web, HttpResponse};
use mobileshop_flow::ContextData;
use tracing::{info, instrument};
use uuid::Uuid;

use super::run_workflow;
use crate::errors::AppError;
use crate::models::requests::PlaceOrderPayload;
use crate::models::PageQuery;
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::services::order_service;
use crate::state::AppState;
use crate::web::envelope;
use crate::web::extractors::AuthenticatedUser;

const ORDER_PAGE_SIZE: u32 = 10;

#[instrument(
  name = "handler::place_order",
  skip(app_state, user, payload),
  fields(user_id = %user.id(), address_id = %payload.address_id)
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<PlaceOrderPayload>,
) -> Result<HttpResponse, AppError> {
  let PlaceOrderPayload {
    address_id,
    payment_method,
  } = payload.into_inner();
  let ctx = ContextData::new(PlaceOrderCtxData::new(
    app_state.get_ref().clone(),
    user.id(),
    address_id,
    payment_method,
  ));
  run_workflow(&app_state, ctx.clone(), "place_order").await?;

  let placed = { ctx.read().placed_order.clone() }
    .ok_or_else(|| AppError::Internal("Order placement completed without an order.".to_string()))?;
  info!(order_id = %placed.order.id, order_number = %placed.order.order_number, "Order created.");
  Ok(envelope::created("Order created successfully", placed))
}

#[instrument(name = "handler::list_orders", skip(app_state, user, query), fields(user_id = %user.id()))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let request = query.resolve(ORDER_PAGE_SIZE)?;
  let page = order_service::list_own(&app_state, user.id(), request).await?;
  envelope::paginated("orders", &page, request)
}

#[instrument(name = "handler::get_order", skip(app_state, user, path), fields(user_id = %user.id(), order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let detail = order_service::get_own(&app_state, user.id(), path.into_inner()).await?;
  Ok(envelope::ok(detail))
}

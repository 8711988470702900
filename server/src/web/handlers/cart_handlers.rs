use actix_web::{web, HttpResponse};
use mobileshop_flow::ContextData;
use tracing::{info, instrument};
use uuid::Uuid;

use super::run_workflow;
use crate::errors::AppError;
use crate::models::requests::{AddToCartPayload, UpdateCartItemPayload};
use crate::pipelines::contexts::AddToCartCtxData;
use crate::services::cart_service;
use crate::state::AppState;
use crate::web::envelope;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::view_cart", skip(app_state, user), fields(user_id = %user.id()))]
pub async fn view_cart_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let cart = cart_service::view_cart(&app_state, user.id()).await?;
  Ok(envelope::ok(cart))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, payload, user),
  fields(user_id = %user.id(), product_id = %payload.product_id, quantity = %payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<AddToCartPayload>,
) -> Result<HttpResponse, AppError> {
  let AddToCartPayload { product_id, quantity } = payload.into_inner();
  let ctx = ContextData::new(AddToCartCtxData::new(
    app_state.get_ref().clone(),
    user.id(),
    product_id,
    quantity,
  ));
  run_workflow(&app_state, ctx.clone(), "add_to_cart").await?;

  let (item, created) = {
    let guard = ctx.read();
    (guard.item.clone(), guard.created)
  };
  let item = item.ok_or_else(|| AppError::Internal("Add to cart completed without a cart line.".to_string()))?;
  info!(item_id = %item.id, created, "Cart updated.");

  if created {
    Ok(envelope::created("Item added to cart", item))
  } else {
    Ok(envelope::ok_with_message("Cart updated successfully", item))
  }
}

#[instrument(name = "handler::update_cart_item", skip(app_state, user, path, payload), fields(user_id = %user.id(), item_id = %path.as_ref()))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateCartItemPayload>,
) -> Result<HttpResponse, AppError> {
  let item = cart_service::update_item(&app_state, user.id(), path.into_inner(), payload.quantity).await?;
  Ok(envelope::ok_with_message("Cart item updated", item))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, user, path), fields(user_id = %user.id(), item_id = %path.as_ref()))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  cart_service::remove_item(&app_state, user.id(), path.into_inner()).await?;
  Ok(envelope::message("Item removed from cart"))
}

#[instrument(name = "handler::clear_cart", skip(app_state, user), fields(user_id = %user.id()))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let removed = cart_service::clear(&app_state, user.id()).await?;
  info!(removed, "Cart cleared.");
  Ok(envelope::message("Cart cleared"))
}

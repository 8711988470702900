//! Cart reads and the mutations that do not need the add-to-cart pipeline.

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{CartItem, CartView};
use crate::state::AppState;

pub async fn view_cart(app_state: &AppState, user_id: Uuid) -> Result<CartView> {
  Ok(CartView::from(app_state.repos.carts.lines(user_id).await?))
}

#[instrument(name = "cart_service::update_item", skip(app_state))]
pub async fn update_item(app_state: &AppState, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<CartItem> {
  if quantity < 1 {
    return Err(AppError::Validation("Quantity must be at least 1".to_string()));
  }
  let item = app_state
    .repos
    .carts
    .find_item(user_id, item_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Item not found in cart".to_string()))?;
  let product = app_state
    .repos
    .catalog
    .find_product(item.product_id)
    .await?
    .filter(|p| p.is_active)
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  if quantity > product.stock {
    warn!(product_id = %product.id, requested = quantity, stock = product.stock, "Cart update exceeds stock.");
    return Err(AppError::InsufficientStock { product: product.name });
  }
  app_state.repos.carts.set_quantity(item.id, quantity).await
}

pub async fn remove_item(app_state: &AppState, user_id: Uuid, item_id: Uuid) -> Result<()> {
  if app_state.repos.carts.remove(user_id, item_id).await? {
    Ok(())
  } else {
    Err(AppError::NotFound("Item not found in cart".to_string()))
  }
}

pub async fn clear(app_state: &AppState, user_id: Uuid) -> Result<u64> {
  app_state.repos.carts.clear(user_id).await
}

use std::sync::Arc;

use mobileshop_flow::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;

pub fn register_add_to_cart_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(
    "add_to_cart",
    &[
      ("validate_cart_input", false, None),
      ("fetch_product_for_cart", false, None),
      ("check_product_stock_for_cart", false, None),
      ("add_or_update_cart_item", false, None),
    ],
  );

  p.on_step("validate_cart_input", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let quantity = { ctx_data.read().quantity };
    if quantity < 1 {
      warn!(quantity, "Add to cart rejected: quantity must be positive.");
      return Err(AppError::Validation("Quantity must be at least 1".to_string()));
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("fetch_product_for_cart", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (app_state, product_id) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.product_id)
    };

    let product = app_state
      .repos
      .catalog
      .find_product(product_id)
      .await?
      .filter(|p| p.is_active)
      .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    {
      ctx_data.write().product = Some(product);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("check_product_stock_for_cart", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (app_state, user_id, product, requested) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.user_id, guard.product.clone(), guard.quantity)
    };
    let product = product.ok_or_else(|| AppError::Internal("Stock check reached without a product.".to_string()))?;

    let existing = app_state
      .repos
      .carts
      .find_by_product(user_id, product.id)
      .await?
      .map(|item| item.quantity)
      .unwrap_or(0);
    let total = existing.checked_add(requested);
    if total.map_or(true, |total| total > product.stock) {
      warn!(
        product_id = %product.id,
        existing,
        requested,
        stock = product.stock,
        "Add to cart exceeds available stock."
      );
      return Err(AppError::InsufficientStock { product: product.name });
    }
    {
      ctx_data.write().existing_quantity = existing;
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("add_or_update_cart_item", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (app_state, user_id, product_id, quantity, existing) = {
      let guard = ctx_data.read();
      (
        guard.app_state.clone(),
        guard.user_id,
        guard.product_id,
        guard.quantity,
        guard.existing_quantity,
      )
    };

    let item = app_state.repos.carts.add_quantity(user_id, product_id, quantity).await?;
    info!(item_id = %item.id, quantity = item.quantity, "Cart line saved.");
    {
      let mut guard = ctx_data.write();
      guard.created = existing == 0;
      guard.item = Some(item);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register(p);
}

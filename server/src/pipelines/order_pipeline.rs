//! Cart to order conversion. Every step before `commit_order` only reads;
//! `commit_order` performs all writes in one store transaction.

use std::sync::Arc;

use chrono::Utc;
use mobileshop_flow::{ContextData, Pipeline, PipelineControl, Registry};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{NewOrder, NewOrderLine, PaymentMethod};
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::services::order_number::generate_order_number;
use crate::state::AppState;

/// Attempts before an order-number collision is reported to the caller.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

fn parse_payment_method(requested: Option<&str>) -> Result<PaymentMethod, AppError> {
  match requested.map(str::trim) {
    None | Some("COD") => Ok(PaymentMethod::Cod),
    Some(other) => Err(AppError::Validation(format!("Invalid payment method '{}'", other))),
  }
}

pub fn register_place_order_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<PlaceOrderCtxData, AppError>::new(
    "place_order",
    &[
      ("verify_order_address", false, None),
      ("load_cart_for_order", false, None),
      ("check_cart_stock", false, None),
      ("price_order_lines", false, None),
      ("assign_order_number", false, None),
      ("commit_order", false, None),
      ("load_placed_order", false, None),
    ],
  );

  p.before_step("verify_order_address", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let requested = { ctx_data.read().requested_payment_method.clone() };
    let method = parse_payment_method(requested.as_deref())?;
    *ctx_data.map_write(|c| &mut c.payment_method) = method;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("verify_order_address", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let (app_state, user_id, address_id) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.user_id, guard.address_id)
    };

    let address = app_state.repos.addresses.find(user_id, address_id).await?;
    let Some(address) = address else {
      warn!(%address_id, "Order placement with an address the user does not own.");
      return Err(AppError::Validation("Invalid address".to_string()));
    };
    {
      ctx_data.write().address = Some(address);
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("load_cart_for_order", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let (app_state, user_id) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.user_id)
    };

    let lines = app_state.repos.carts.lines(user_id).await?;
    if lines.is_empty() {
      return Err(AppError::Validation("Cart is empty".to_string()));
    }
    {
      ctx_data.write().cart_lines = lines;
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("check_cart_stock", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let short = {
      let lines = ctx_data.map_read(|c| &c.cart_lines[..]);
      lines
        .iter()
        .find(|line| !line.product.is_active || line.item.quantity > line.product.stock)
        .map(|line| line.product.name.clone())
    };
    if let Some(product) = short {
      warn!(%product, "Order placement blocked by stock.");
      return Err(AppError::InsufficientStock { product });
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("price_order_lines", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let mut guard = ctx_data.write();
    let order_lines: Vec<NewOrderLine> = guard
      .cart_lines
      .iter()
      .map(|line| NewOrderLine {
        product_id: line.product.id,
        product_name: line.product.name.clone(),
        quantity: line.item.quantity,
        unit_price: line.product.effective_price(),
      })
      .collect();
    guard.total_amount = order_lines
      .iter()
      .map(|l| l.unit_price * Decimal::from(l.quantity))
      .sum();
    guard.order_lines = order_lines;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("assign_order_number", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    ctx_data.write().order_number = Some(generate_order_number(Utc::now()));
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("commit_order", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let (app_state, mut new_order) = {
      let guard = ctx_data.read();
      let new_order = NewOrder {
        user_id: guard.user_id,
        address_id: guard.address_id,
        order_number: guard.order_number.clone().unwrap_or_default(),
        payment_method: guard.payment_method,
        total_amount: guard.total_amount,
        lines: guard.order_lines.clone(),
      };
      (guard.app_state.clone(), new_order)
    };

    let mut attempt = 1;
    let order_id = loop {
      match app_state.repos.orders.place(new_order.clone()).await {
        Ok(order_id) => break order_id,
        Err(AppError::Conflict(_)) if attempt < ORDER_NUMBER_ATTEMPTS => {
          warn!(order_number = %new_order.order_number, "Order number collision; drawing a new one.");
          new_order.order_number = generate_order_number(Utc::now());
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    };
    {
      let mut guard = ctx_data.write();
      guard.order_id = Some(order_id);
      guard.order_number = Some(new_order.order_number);
    }
    Ok(PipelineControl::Continue)
  });

  p.after_step("commit_order", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    {
      let guard = ctx_data.read();
      info!(
        order_id = ?guard.order_id,
        order_number = ?guard.order_number,
        total = %guard.total_amount,
        lines = guard.order_lines.len(),
        "Order placed."
      );
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("load_placed_order", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let (app_state, order_id) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.order_id)
    };
    let order_id = order_id.ok_or_else(|| AppError::Internal("Order id missing after commit.".to_string()))?;

    let placed = app_state
      .repos
      .orders
      .find_detail(order_id)
      .await?
      .ok_or_else(|| AppError::Internal("Placed order could not be reloaded.".to_string()))?;
    {
      ctx_data.write().placed_order = Some(placed);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register(p);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_cash_on_delivery_is_accepted() {
    assert_eq!(parse_payment_method(None).unwrap(), PaymentMethod::Cod);
    assert_eq!(parse_payment_method(Some("COD")).unwrap(), PaymentMethod::Cod);
    assert!(matches!(parse_payment_method(Some("UPI")), Err(AppError::Validation(_))));
  }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::product::Product;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A cart item joined with its product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  #[serde(flatten)]
  pub item: CartItem,
  pub product: Product,
}

impl CartLine {
  pub fn line_total(&self) -> Decimal {
    self.product.effective_price() * Decimal::from(self.item.quantity)
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
  pub items: Vec<CartLine>,
  pub total_quantity: i64,
  pub subtotal: Decimal,
}

impl From<Vec<CartLine>> for CartView {
  fn from(items: Vec<CartLine>) -> Self {
    let total_quantity = items.iter().map(|l| i64::from(l.item.quantity)).sum();
    let subtotal = items.iter().map(CartLine::line_total).sum();
    Self {
      items,
      total_quantity,
      subtotal,
    }
  }
}

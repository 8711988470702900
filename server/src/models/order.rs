use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

use super::address::Address;
use super::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Confirmed => "CONFIRMED",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| format!("Invalid order status '{}'", s))
  }
}

/// Only cash-on-delivery is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
  #[default]
  Cod,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub order_number: String,
  pub status: OrderStatus,
  pub payment_method: PaymentMethod,
  pub total_amount: Decimal,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Immutable line of a placed order; `price` is the effective unit price at placement.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  #[serde(flatten)]
  pub item: OrderItem,
  pub product: Option<Product>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
  pub id: Uuid,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub address: Option<Address>,
  pub items: Vec<OrderLine>,
  pub customer: Option<CustomerRef>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
}

/// Everything the placement transaction writes.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub order_number: String,
  pub payment_method: PaymentMethod,
  pub total_amount: Decimal,
  pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub total_orders: i64,
  pub pending_orders: i64,
  pub total_revenue: Decimal,
  pub total_users: i64,
  pub recent_orders: Vec<OrderDetail>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_parses_only_known_names() {
    assert_eq!("SHIPPED".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
    assert!("RETURNED".parse::<OrderStatus>().is_err());
    assert!("shipped".parse::<OrderStatus>().is_err());
  }

  #[test]
  fn payment_method_serializes_as_cod() {
    assert_eq!(serde_json::to_string(&PaymentMethod::Cod).unwrap(), "\"COD\"");
  }
}

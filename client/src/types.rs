//! Wire types. Only the fields the client reads are declared; the server may
//! send more.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `{success, message?, data?, error?}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
  pub success: bool,
  pub message: Option<String>,
  pub data: Option<T>,
  pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: Uuid,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub role: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
  pub token: String,
  pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
  pub user: UserProfile,
  #[serde(flatten)]
  pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
  pub email: String,
  pub password: String,
  pub first_name: String,
  pub last_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub price: Decimal,
  pub discount_price: Option<Decimal>,
  pub stock: i32,
  #[serde(default)]
  pub images: Vec<String>,
}

impl Product {
  pub fn effective_price(&self) -> Decimal {
    self.discount_price.unwrap_or(self.price)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
  pub page: u32,
  pub limit: u32,
  pub total: i64,
  pub pages: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductPage {
  pub products: Vec<Product>,
  pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderPage {
  pub orders: Vec<Order>,
  pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
  #[serde(flatten)]
  pub item: CartItem,
  pub product: Product,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub items: Vec<CartLine>,
  pub total_quantity: i64,
  pub subtotal: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  pub id: Uuid,
  pub full_name: String,
  pub phone: String,
  pub address_line1: String,
  pub address_line2: Option<String>,
  pub city: String,
  pub state: String,
  pub postal_code: String,
  pub country: String,
  pub is_default: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
  pub full_name: String,
  pub phone: String,
  pub address_line1: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address_line2: Option<String>,
  pub city: String,
  pub state: String,
  pub postal_code: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
  pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub status: String,
  pub payment_method: String,
  pub total_amount: Decimal,
  #[serde(default)]
  pub items: Vec<OrderLine>,
  pub created_at: DateTime<Utc>,
}

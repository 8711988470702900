use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::product::Product;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
  #[serde(flatten)]
  pub item: WishlistItem,
  pub product: Product,
}

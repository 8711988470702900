use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::{PgStore, PRODUCT_COLUMNS};
use crate::db::CartStore;
use crate::errors::{AppError, Result};
use crate::models::{CartItem, CartLine, Product};

const CART_COLUMNS: &str = "id, user_id, product_id, quantity, created_at, updated_at";

#[async_trait]
impl CartStore for PgStore {
  async fn lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let sql = format!("SELECT {} FROM cart_items WHERE user_id = $1 ORDER BY created_at", CART_COLUMNS);
    let items = sqlx::query_as::<_, CartItem>(&sql).bind(user_id).fetch_all(&self.pool).await?;
    if items.is_empty() {
      return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let sql = format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS);
    let products: HashMap<Uuid, Product> = sqlx::query_as::<_, Product>(&sql)
      .bind(&product_ids)
      .fetch_all(&self.pool)
      .await?
      .into_iter()
      .map(|p| (p.id, p))
      .collect();

    Ok(
      items
        .into_iter()
        .filter_map(|item| {
          let product = products.get(&item.product_id).cloned()?;
          Some(CartLine { item, product })
        })
        .collect(),
    )
  }

  async fn find_item(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<CartItem>> {
    let sql = format!("SELECT {} FROM cart_items WHERE id = $1 AND user_id = $2", CART_COLUMNS);
    Ok(
      sqlx::query_as::<_, CartItem>(&sql)
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_by_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>> {
    let sql = format!("SELECT {} FROM cart_items WHERE user_id = $1 AND product_id = $2", CART_COLUMNS);
    Ok(
      sqlx::query_as::<_, CartItem>(&sql)
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn add_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let sql = format!(
      "INSERT INTO cart_items (id, user_id, product_id, quantity) VALUES ($1, $2, $3, $4) \
       ON CONFLICT (user_id, product_id) \
       DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW() \
       RETURNING {}",
      CART_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, CartItem>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> Result<CartItem> {
    let sql = format!(
      "UPDATE cart_items SET quantity = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
      CART_COLUMNS
    );
    sqlx::query_as::<_, CartItem>(&sql)
      .bind(quantity)
      .bind(item_id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))
  }

  async fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
      .bind(item_id)
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn clear(&self, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }
}

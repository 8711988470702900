use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::{conflict_on_unique, PgStore, PRODUCT_COLUMNS};
use crate::db::WishlistStore;
use crate::errors::Result;
use crate::models::{Product, WishlistEntry, WishlistItem};

#[async_trait]
impl WishlistStore for PgStore {
  async fn list(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>> {
    let items = sqlx::query_as::<_, WishlistItem>(
      "SELECT id, user_id, product_id, created_at FROM wishlist_items WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, Product> =
      sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS))
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
          Some(WishlistEntry { item, product })
        })
        .collect(),
    )
  }

  async fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem> {
    sqlx::query_as::<_, WishlistItem>(
      "INSERT INTO wishlist_items (id, user_id, product_id) VALUES ($1, $2, $3) \
       RETURNING id, user_id, product_id, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Product is already in the wishlist."))
  }

  async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

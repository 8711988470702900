use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{PgStore, ADDRESS_COLUMNS};
use crate::db::AddressStore;
use crate::errors::{AppError, Result};
use crate::models::{Address, AddressDraft};

/// Clears every default of `user_id` except `keep`, inside the caller's transaction.
async fn clear_defaults(tx: &mut Transaction<'_, Postgres>, user_id: Uuid, keep: Option<Uuid>) -> Result<()> {
  sqlx::query(
    "UPDATE addresses SET is_default = FALSE, updated_at = NOW() \
     WHERE user_id = $1 AND is_default AND ($2::uuid IS NULL OR id <> $2)",
  )
  .bind(user_id)
  .bind(keep)
  .execute(&mut **tx)
  .await?;
  Ok(())
}

#[async_trait]
impl AddressStore for PgStore {
  async fn list(&self, user_id: Uuid) -> Result<Vec<Address>> {
    let sql = format!(
      "SELECT {} FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
      ADDRESS_COLUMNS
    );
    Ok(sqlx::query_as::<_, Address>(&sql).bind(user_id).fetch_all(&self.pool).await?)
  }

  async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Address>> {
    let sql = format!("SELECT {} FROM addresses WHERE id = $1 AND user_id = $2", ADDRESS_COLUMNS);
    Ok(
      sqlx::query_as::<_, Address>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn create(&self, user_id: Uuid, draft: AddressDraft) -> Result<Address> {
    let mut tx = self.pool.begin().await?;
    if draft.is_default {
      clear_defaults(&mut tx, user_id, None).await?;
    }
    let sql = format!(
      "INSERT INTO addresses (id, user_id, full_name, phone, address_line1, address_line2, city, state, \
         postal_code, country, is_default) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
      ADDRESS_COLUMNS
    );
    let address = sqlx::query_as::<_, Address>(&sql)
      .bind(Uuid::new_v4())
      .bind(user_id)
      .bind(&draft.full_name)
      .bind(&draft.phone)
      .bind(&draft.address_line1)
      .bind(&draft.address_line2)
      .bind(&draft.city)
      .bind(&draft.state)
      .bind(&draft.postal_code)
      .bind(&draft.country)
      .bind(draft.is_default)
      .fetch_one(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok(address)
  }

  async fn update(&self, user_id: Uuid, id: Uuid, draft: AddressDraft) -> Result<Option<Address>> {
    let mut tx = self.pool.begin().await?;
    if draft.is_default {
      clear_defaults(&mut tx, user_id, Some(id)).await?;
    }
    let sql = format!(
      "UPDATE addresses SET full_name = $1, phone = $2, address_line1 = $3, address_line2 = $4, city = $5, \
         state = $6, postal_code = $7, country = $8, is_default = $9, updated_at = NOW() \
       WHERE id = $10 AND user_id = $11 RETURNING {}",
      ADDRESS_COLUMNS
    );
    let address = sqlx::query_as::<_, Address>(&sql)
      .bind(&draft.full_name)
      .bind(&draft.phone)
      .bind(&draft.address_line1)
      .bind(&draft.address_line2)
      .bind(&draft.city)
      .bind(&draft.state)
      .bind(&draft.postal_code)
      .bind(&draft.country)
      .bind(draft.is_default)
      .bind(id)
      .bind(user_id)
      .fetch_optional(&mut *tx)
      .await?;
    // A foreign id must not leave the caller's defaults cleared.
    if address.is_some() {
      tx.commit().await?;
    }
    Ok(address)
  }

  async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
    let in_use = sqlx::query_scalar::<_, bool>(
      "SELECT EXISTS(SELECT 1 FROM orders WHERE address_id = $1 AND user_id = $2)",
    )
    .bind(id)
    .bind(user_id)
    .fetch_one(&self.pool)
    .await?;
    if in_use {
      return Err(AppError::Conflict("Address is used by an order".to_string()));
    }
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
      .bind(id)
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

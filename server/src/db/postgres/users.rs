use async_trait::async_trait;
use uuid::Uuid;

use super::{conflict_on_unique, like_pattern, PgStore, USER_COLUMNS};
use crate::db::UserStore;
use crate::errors::{AppError, Result};
use crate::models::{CustomerSummary, NewUser, Page, PageRequest, User};

#[async_trait]
impl UserStore for PgStore {
  async fn create(&self, new_user: NewUser) -> Result<User> {
    let sql = format!(
      "INSERT INTO users (id, email, password_hash, first_name, last_name, phone, role) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
      .bind(Uuid::new_v4())
      .bind(&new_user.email)
      .bind(&new_user.password_hash)
      .bind(&new_user.first_name)
      .bind(&new_user.last_name)
      .bind(&new_user.phone)
      .bind(new_user.role)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| conflict_on_unique(e, "An account with this email already exists."))
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool).await?)
  }

  async fn email_exists(&self, email: &str) -> Result<bool> {
    Ok(
      sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn set_refresh_token_hash(&self, id: Uuid, digest: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE users SET refresh_token_hash = $1, updated_at = NOW() WHERE id = $2")
      .bind(digest)
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn update_profile(&self, user: &User) -> Result<User> {
    let sql = format!(
      "UPDATE users SET first_name = $1, last_name = $2, phone = $3, updated_at = NOW() WHERE id = $4 RETURNING {}",
      USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
      .bind(&user.first_name)
      .bind(&user.last_name)
      .bind(&user.phone)
      .bind(user.id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| AppError::NotFound("User not found".to_string()))
  }

  async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
    sqlx::query(
      "UPDATE users SET password_hash = $1, refresh_token_hash = NULL, updated_at = NOW() WHERE id = $2",
    )
    .bind(password_hash)
    .bind(id)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<User> {
    let sql = format!(
      "UPDATE users SET is_blocked = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
      USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
      .bind(blocked)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| AppError::NotFound("User not found".to_string()))
  }

  async fn list_customers(&self, search: Option<&str>, page: PageRequest) -> Result<Page<CustomerSummary>> {
    let pattern = search.map(like_pattern);
    let filter = "u.role = 'USER' AND ($1::text IS NULL OR u.email ILIKE $1 OR u.first_name ILIKE $1 \
                  OR u.last_name ILIKE $1)";

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users u WHERE {}", filter))
      .bind(&pattern)
      .fetch_one(&self.pool)
      .await?;

    let sql = format!(
      "SELECT u.id, u.email, u.first_name, u.last_name, u.phone, u.is_blocked, u.created_at, \
         COUNT(o.id) AS order_count \
       FROM users u LEFT JOIN orders o ON o.user_id = u.id \
       WHERE {} GROUP BY u.id ORDER BY u.created_at DESC LIMIT $2 OFFSET $3",
      filter
    );
    let items = sqlx::query_as::<_, CustomerSummary>(&sql)
      .bind(&pattern)
      .bind(page.limit_i64())
      .bind(page.offset())
      .fetch_all(&self.pool)
      .await?;
    Ok(Page { items, total })
  }

  async fn count_customers(&self) -> Result<i64> {
    Ok(
      sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'USER'")
        .fetch_one(&self.pool)
        .await?,
    )
  }
}

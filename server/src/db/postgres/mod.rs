//! sqlx adapter. Queries are built at runtime so the crate compiles without a
//! live database.

mod addresses;
mod carts;
mod catalog;
mod orders;
mod users;
mod wishlist;

use sqlx::PgPool;

use crate::errors::AppError;

pub(crate) const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, role, is_blocked, \
   refresh_token_hash, created_at, updated_at";

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, discount_price, stock, is_active, \
   category_id, brand_id, images, specifications, created_at, updated_at";

pub(crate) const ADDRESS_COLUMNS: &str = "id, user_id, full_name, phone, address_line1, address_line2, city, state, \
   postal_code, country, is_default, created_at, updated_at";

pub(crate) const ORDER_COLUMNS: &str =
  "id, user_id, address_id, order_number, status, payment_method, total_amount, created_at, updated_at";

pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

/// Maps a unique-index violation to `Conflict`, anything else to `Sqlx`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
  match &err {
    sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(message.to_string()),
    _ => AppError::Sqlx(err),
  }
}

/// `%term%` for ILIKE, with the pattern metacharacters escaped.
pub(crate) fn like_pattern(term: &str) -> String {
  let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  format!("%{}%", escaped)
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  pub id: Uuid,
  pub user_id: Uuid,
  pub full_name: String,
  pub phone: String,
  pub address_line1: String,
  pub address_line2: Option<String>,
  pub city: String,
  pub state: String,
  pub postal_code: String,
  pub country: String,
  pub is_default: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Full set of writable address fields.
#[derive(Debug, Clone)]
pub struct AddressDraft {
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

impl AddressDraft {
  pub fn from_address(address: &Address) -> Self {
    Self {
      full_name: address.full_name.clone(),
      phone: address.phone.clone(),
      address_line1: address.address_line1.clone(),
      address_line2: address.address_line2.clone(),
      city: address.city.clone(),
      state: address.state.clone(),
      postal_code: address.postal_code.clone(),
      country: address.country.clone(),
      is_default: address.is_default,
    }
  }
}

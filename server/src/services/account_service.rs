//! Profile, password, addresses and wishlist of the signed-in user.

use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::requests::{
  AddressPayload, AddressUpdatePayload, ChangePasswordPayload, UpdateProfilePayload,
};
use crate::models::{Address, AddressDraft, UserProfile, WishlistEntry, WishlistItem};
use crate::services::auth_service::load_user;
use crate::state::AppState;

const DEFAULT_COUNTRY: &str = "India";

fn trimmed(value: String) -> String {
  value.trim().to_string()
}

#[instrument(name = "account_service::update_profile", skip(app_state, payload))]
pub async fn update_profile(app_state: &AppState, user_id: Uuid, payload: UpdateProfilePayload) -> Result<UserProfile> {
  payload.validate()?;
  let mut user = load_user(app_state, user_id).await?;
  if let Some(first_name) = payload.first_name {
    user.first_name = trimmed(first_name);
  }
  if let Some(last_name) = payload.last_name {
    user.last_name = trimmed(last_name);
  }
  if let Some(phone) = payload.phone {
    let phone = trimmed(phone);
    user.phone = (!phone.is_empty()).then_some(phone);
  }
  let updated = app_state.repos.users.update_profile(&user).await?;
  Ok(UserProfile::from(&updated))
}

/// Also ends every session: the stored refresh digest is cleared.
#[instrument(name = "account_service::change_password", skip(app_state, payload))]
pub async fn change_password(app_state: &AppState, user_id: Uuid, payload: ChangePasswordPayload) -> Result<()> {
  payload.validate()?;
  let user = load_user(app_state, user_id).await?;
  if !app_state
    .passwords
    .verify(&user.password_hash, &payload.current_password)
    .await?
  {
    warn!("Password change rejected: current password mismatch.");
    return Err(AppError::Validation("Current password is incorrect".to_string()));
  }
  let new_hash = app_state.passwords.hash(&payload.new_password).await?;
  app_state.repos.users.update_password(user_id, &new_hash).await?;
  info!("Password changed; sessions revoked.");
  Ok(())
}

pub async fn list_addresses(app_state: &AppState, user_id: Uuid) -> Result<Vec<Address>> {
  app_state.repos.addresses.list(user_id).await
}

#[instrument(name = "account_service::create_address", skip(app_state, payload))]
pub async fn create_address(app_state: &AppState, user_id: Uuid, payload: AddressPayload) -> Result<Address> {
  payload.validate()?;
  let draft = AddressDraft {
    full_name: trimmed(payload.full_name),
    phone: trimmed(payload.phone),
    address_line1: trimmed(payload.address_line1),
    address_line2: payload.address_line2.map(trimmed).filter(|l| !l.is_empty()),
    city: trimmed(payload.city),
    state: trimmed(payload.state),
    postal_code: trimmed(payload.postal_code),
    country: payload.country.map(trimmed).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
    is_default: payload.is_default,
  };
  app_state.repos.addresses.create(user_id, draft).await
}

#[instrument(name = "account_service::update_address", skip(app_state, payload))]
pub async fn update_address(
  app_state: &AppState,
  user_id: Uuid,
  address_id: Uuid,
  payload: AddressUpdatePayload,
) -> Result<Address> {
  payload.validate()?;
  let not_found = || AppError::NotFound("Address not found".to_string());
  let current = app_state
    .repos
    .addresses
    .find(user_id, address_id)
    .await?
    .ok_or_else(not_found)?;

  let mut draft = AddressDraft::from_address(&current);
  if let Some(v) = payload.full_name {
    draft.full_name = trimmed(v);
  }
  if let Some(v) = payload.phone {
    draft.phone = trimmed(v);
  }
  if let Some(v) = payload.address_line1 {
    draft.address_line1 = trimmed(v);
  }
  if let Some(v) = payload.address_line2 {
    let v = trimmed(v);
    draft.address_line2 = (!v.is_empty()).then_some(v);
  }
  if let Some(v) = payload.city {
    draft.city = trimmed(v);
  }
  if let Some(v) = payload.state {
    draft.state = trimmed(v);
  }
  if let Some(v) = payload.postal_code {
    draft.postal_code = trimmed(v);
  }
  if let Some(v) = payload.country {
    draft.country = trimmed(v);
  }
  if let Some(v) = payload.is_default {
    draft.is_default = v;
  }

  app_state
    .repos
    .addresses
    .update(user_id, address_id, draft)
    .await?
    .ok_or_else(not_found)
}

pub async fn delete_address(app_state: &AppState, user_id: Uuid, address_id: Uuid) -> Result<()> {
  if app_state.repos.addresses.delete(user_id, address_id).await? {
    Ok(())
  } else {
    Err(AppError::NotFound("Address not found".to_string()))
  }
}

pub async fn wishlist(app_state: &AppState, user_id: Uuid) -> Result<Vec<WishlistEntry>> {
  app_state.repos.wishlist.list(user_id).await
}

#[instrument(name = "account_service::add_to_wishlist", skip(app_state))]
pub async fn add_to_wishlist(app_state: &AppState, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem> {
  let available = app_state
    .repos
    .catalog
    .find_product(product_id)
    .await?
    .is_some_and(|p| p.is_active);
  if !available {
    return Err(AppError::NotFound("Product not found".to_string()));
  }
  app_state.repos.wishlist.add(user_id, product_id).await
}

pub async fn remove_from_wishlist(app_state: &AppState, user_id: Uuid, product_id: Uuid) -> Result<()> {
  if app_state.repos.wishlist.remove(user_id, product_id).await? {
    Ok(())
  } else {
    Err(AppError::NotFound("Product is not in the wishlist".to_string()))
  }
}

//! Account self-service under `/users`: profile, password, addresses and wishlist.

use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::requests::{
  AddressPayload, AddressUpdatePayload, ChangePasswordPayload, UpdateProfilePayload, WishlistPayload,
};
use crate::services::account_service;
use crate::state::AppState;
use crate::web::envelope;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::update_profile", skip(app_state, user, payload), fields(user_id = %user.id()))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<UpdateProfilePayload>,
) -> Result<HttpResponse, AppError> {
  let profile = account_service::update_profile(&app_state, user.id(), payload.into_inner()).await?;
  Ok(envelope::ok_with_message("Profile updated successfully", profile))
}

#[instrument(name = "handler::change_password", skip(app_state, user, payload), fields(user_id = %user.id()))]
pub async fn change_password_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<ChangePasswordPayload>,
) -> Result<HttpResponse, AppError> {
  account_service::change_password(&app_state, user.id(), payload.into_inner()).await?;
  Ok(envelope::message("Password changed successfully"))
}

pub async fn list_addresses_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  Ok(envelope::ok(account_service::list_addresses(&app_state, user.id()).await?))
}

#[instrument(name = "handler::create_address", skip(app_state, user, payload), fields(user_id = %user.id()))]
pub async fn create_address_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<AddressPayload>,
) -> Result<HttpResponse, AppError> {
  let address = account_service::create_address(&app_state, user.id(), payload.into_inner()).await?;
  Ok(envelope::created("Address added successfully", address))
}

#[instrument(name = "handler::update_address", skip(app_state, user, path, payload), fields(user_id = %user.id(), address_id = %path.as_ref()))]
pub async fn update_address_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<AddressUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  let address =
    account_service::update_address(&app_state, user.id(), path.into_inner(), payload.into_inner()).await?;
  Ok(envelope::ok_with_message("Address updated successfully", address))
}

#[instrument(name = "handler::delete_address", skip(app_state, user, path), fields(user_id = %user.id(), address_id = %path.as_ref()))]
pub async fn delete_address_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  account_service::delete_address(&app_state, user.id(), path.into_inner()).await?;
  Ok(envelope::message("Address deleted successfully"))
}

pub async fn wishlist_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  Ok(envelope::ok(account_service::wishlist(&app_state, user.id()).await?))
}

#[instrument(name = "handler::add_to_wishlist", skip(app_state, user, payload), fields(user_id = %user.id(), product_id = %payload.product_id))]
pub async fn add_to_wishlist_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<WishlistPayload>,
) -> Result<HttpResponse, AppError> {
  let item = account_service::add_to_wishlist(&app_state, user.id(), payload.product_id).await?;
  Ok(envelope::created("Added to wishlist", item))
}

#[instrument(name = "handler::remove_from_wishlist", skip(app_state, user, path), fields(user_id = %user.id(), product_id = %path.as_ref()))]
pub async fn remove_from_wishlist_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  account_service::remove_from_wishlist(&app_state, user.id(), path.into_inner()).await?;
  Ok(envelope::message("Removed from wishlist"))
}

//! Categories and brands share one request body and one set of rules.

use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::requests::TaxonomyPayload;
use crate::models::Capability;
use crate::services::catalog_service;
use crate::state::AppState;
use crate::web::envelope;
use crate::web::extractors::AuthenticatedUser;

pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(envelope::ok(catalog_service::list_categories(&app_state).await?))
}

pub async fn get_category_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  Ok(envelope::ok(catalog_service::get_category(&app_state, path.into_inner()).await?))
}

#[instrument(name = "handler::create_category", skip(app_state, user, payload), fields(user_id = %user.id()))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<TaxonomyPayload>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  let category = catalog_service::create_category(&app_state, payload.into_inner()).await?;
  Ok(envelope::created("Category created successfully", category))
}

#[instrument(name = "handler::update_category", skip(app_state, user, path, payload), fields(category_id = %path.as_ref()))]
pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<TaxonomyPayload>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  let category = catalog_service::update_category(&app_state, path.into_inner(), payload.into_inner()).await?;
  Ok(envelope::ok_with_message("Category updated successfully", category))
}

#[instrument(name = "handler::delete_category", skip(app_state, user, path), fields(category_id = %path.as_ref()))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  catalog_service::delete_category(&app_state, path.into_inner()).await?;
  Ok(envelope::message("Category deleted successfully"))
}

pub async fn list_brands_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(envelope::ok(catalog_service::list_brands(&app_state).await?))
}

pub async fn get_brand_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  Ok(envelope::ok(catalog_service::get_brand(&app_state, path.into_inner()).await?))
}

#[instrument(name = "handler::create_brand", skip(app_state, user, payload), fields(user_id = %user.id()))]
pub async fn create_brand_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<TaxonomyPayload>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  let brand = catalog_service::create_brand(&app_state, payload.into_inner()).await?;
  Ok(envelope::created("Brand created successfully", brand))
}

#[instrument(name = "handler::update_brand", skip(app_state, user, path, payload), fields(brand_id = %path.as_ref()))]
pub async fn update_brand_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<TaxonomyPayload>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  let brand = catalog_service::update_brand(&app_state, path.into_inner(), payload.into_inner()).await?;
  Ok(envelope::ok_with_message("Brand updated successfully", brand))
}

#[instrument(name = "handler::delete_brand", skip(app_state, user, path), fields(brand_id = %path.as_ref()))]
pub async fn delete_brand_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  catalog_service::delete_brand(&app_state, path.into_inner()).await?;
  Ok(envelope::message("Brand deleted successfully"))
}

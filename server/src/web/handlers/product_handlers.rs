use actix_web::{web, HttpResponse};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::requests::{ProductListQuery, ProductPayload, ProductUpdatePayload};
use crate::models::Capability;
use crate::services::catalog_service;
use crate::state::AppState;
use crate::web::envelope;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_products", skip(app_state, query))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductListQuery>,
) -> Result<HttpResponse, AppError> {
  let (page, request) = catalog_service::list_products(&app_state, query.into_inner()).await?;
  info!(returned = page.items.len(), total = page.total, "Products listed.");
  envelope::paginated("products", &page, request)
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let detail = catalog_service::get_product(&app_state, path.into_inner()).await?;
  Ok(envelope::ok(detail))
}

#[instrument(name = "handler::get_product_by_slug", skip(app_state, path), fields(slug = %path.as_ref()))]
pub async fn get_product_by_slug_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let detail = catalog_service::get_product_by_slug(&app_state, &path.into_inner()).await?;
  Ok(envelope::ok(detail))
}

#[instrument(name = "handler::create_product", skip(app_state, user, payload), fields(user_id = %user.id()))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<ProductPayload>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  let product = catalog_service::create_product(&app_state, payload.into_inner()).await?;
  Ok(envelope::created("Product created successfully", product))
}

#[instrument(name = "handler::update_product", skip(app_state, user, path, payload), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ProductUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  let product = catalog_service::update_product(&app_state, path.into_inner(), payload.into_inner()).await?;
  Ok(envelope::ok_with_message("Product updated successfully", product))
}

#[instrument(name = "handler::delete_product", skip(app_state, user, path), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageCatalog)?;
  catalog_service::delete_product(&app_state, path.into_inner()).await?;
  Ok(envelope::message("Product deleted successfully"))
}

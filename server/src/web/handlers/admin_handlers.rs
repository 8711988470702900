use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::requests::{AdminOrdersQuery, AdminUsersQuery, UpdateOrderStatusPayload};
use crate::models::{Capability, PageQuery};
use crate::services::admin_service::{self, ADMIN_PAGE_SIZE};
use crate::services::order_service;
use crate::state::AppState;
use crate::web::envelope;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::admin_dashboard", skip(app_state, user), fields(admin_id = %user.id()))]
pub async fn dashboard_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  user.require(Capability::ViewDashboard)?;
  Ok(envelope::ok(admin_service::dashboard(&app_state).await?))
}

#[instrument(name = "handler::admin_list_orders", skip(app_state, user, query), fields(admin_id = %user.id()))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  query: web::Query<AdminOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageOrders)?;
  let query = query.into_inner();
  let request = PageQuery {
    page: query.page,
    limit: query.limit,
  }
  .resolve(ADMIN_PAGE_SIZE)?;
  let page = admin_service::list_orders(&app_state, query.status.as_deref(), request).await?;
  envelope::paginated("orders", &page, request)
}

#[instrument(
  name = "handler::admin_update_order_status",
  skip(app_state, user, path, payload),
  fields(admin_id = %user.id(), order_id = %path.as_ref(), status = %payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateOrderStatusPayload>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageOrders)?;
  let order = order_service::set_status(&app_state, path.into_inner(), &payload.status).await?;
  Ok(envelope::ok_with_message("Order status updated", order))
}

#[instrument(name = "handler::admin_list_users", skip(app_state, user, query), fields(admin_id = %user.id()))]
pub async fn list_users_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  query: web::Query<AdminUsersQuery>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageUsers)?;
  let query = query.into_inner();
  let request = PageQuery {
    page: query.page,
    limit: query.limit,
  }
  .resolve(ADMIN_PAGE_SIZE)?;
  let page = admin_service::list_users(&app_state, query.search.as_deref(), request).await?;
  envelope::paginated("users", &page, request)
}

#[instrument(name = "handler::admin_toggle_block", skip(app_state, user, path), fields(admin_id = %user.id(), user_id = %path.as_ref()))]
pub async fn toggle_block_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageUsers)?;
  let profile = admin_service::toggle_block(&app_state, path.into_inner()).await?;
  let message = if profile.is_blocked {
    "User blocked"
  } else {
    "User unblocked"
  };
  Ok(envelope::ok_with_message(message, profile))
}

#[instrument(name = "handler::admin_user_orders", skip(app_state, user, path, query), fields(admin_id = %user.id(), user_id = %path.as_ref()))]
pub async fn user_orders_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  user.require(Capability::ManageUsers)?;
  let request = query.resolve(ADMIN_PAGE_SIZE)?;
  let page = admin_service::user_orders(&app_state, path.into_inner(), request).await?;
  envelope::paginated("orders", &page, request)
}

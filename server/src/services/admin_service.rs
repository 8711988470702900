//! Admin console operations and the optional admin bootstrap.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{
  Capability, CustomerSummary, DashboardStats, NewUser, OrderDetail, OrderStatus, Page, PageRequest, Role, UserProfile,
};
use crate::state::AppState;

pub const ADMIN_PAGE_SIZE: u32 = 20;
const RECENT_ORDERS: u32 = 10;

#[instrument(name = "admin_service::dashboard", skip(app_state))]
pub async fn dashboard(app_state: &AppState) -> Result<DashboardStats> {
  let stats = app_state.repos.orders.stats().await?;
  let total_users = app_state.repos.users.count_customers().await?;
  let recent = app_state
    .repos
    .orders
    .list_all(
      None,
      PageRequest {
        page: 1,
        limit: RECENT_ORDERS,
      },
    )
    .await?;
  Ok(DashboardStats {
    total_orders: stats.total_orders,
    pending_orders: stats.pending_orders,
    total_revenue: stats.total_revenue,
    total_users,
    recent_orders: recent.items,
  })
}

/// Every user's orders, newest first, optionally narrowed to one status.
pub async fn list_orders(
  app_state: &AppState,
  status: Option<&str>,
  page: PageRequest,
) -> Result<Page<OrderDetail>> {
  let status = status
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| s.parse::<OrderStatus>().map_err(AppError::Validation))
    .transpose()?;
  app_state.repos.orders.list_all(status, page).await
}

pub async fn list_users(
  app_state: &AppState,
  search: Option<&str>,
  page: PageRequest,
) -> Result<Page<CustomerSummary>> {
  let search = search.map(str::trim).filter(|s| !s.is_empty());
  app_state.repos.users.list_customers(search, page).await
}

/// Flips the block flag of a customer account. Admin accounts cannot be blocked.
#[instrument(name = "admin_service::toggle_block", skip(app_state))]
pub async fn toggle_block(app_state: &AppState, user_id: Uuid) -> Result<UserProfile> {
  let user = app_state
    .repos
    .users
    .find_by_id(user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
  if user.role.grants(Capability::ManageUsers) {
    warn!("Attempt to block an account that manages users.");
    return Err(AppError::Forbidden("Admin accounts cannot be blocked".to_string()));
  }
  let updated = app_state.repos.users.set_blocked(user_id, !user.is_blocked).await?;
  info!(is_blocked = updated.is_blocked, "User block flag toggled.");
  Ok(UserProfile::from(&updated))
}

pub async fn user_orders(app_state: &AppState, user_id: Uuid, page: PageRequest) -> Result<Page<OrderDetail>> {
  if app_state.repos.users.find_by_id(user_id).await?.is_none() {
    return Err(AppError::NotFound("User not found".to_string()));
  }
  app_state.repos.orders.list_for_user(user_id, page).await
}

/// Creates the configured admin account unless the e-mail is already registered.
#[instrument(name = "admin_service::seed_admin", skip(app_state, password))]
pub async fn seed_admin(app_state: &AppState, email: &str, password: &str) -> Result<()> {
  let email = email.trim().to_lowercase();
  if app_state.repos.users.email_exists(&email).await? {
    info!(%email, "Admin account already present; skipping seed.");
    return Ok(());
  }
  let password_hash = app_state.passwords.hash(password).await?;
  let admin = app_state
    .repos
    .users
    .create(NewUser {
      email,
      password_hash,
      first_name: "Store".to_string(),
      last_name: "Admin".to_string(),
      phone: None,
      role: Role::Admin,
    })
    .await?;
  info!(user_id = %admin.id, "Admin account seeded.");
  Ok(())
}

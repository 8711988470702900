//! Session bookkeeping shared by the auth pipelines and the account routes.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{User, UserProfile};
use crate::services::token_service::{digest, TokenPair};
use crate::state::AppState;

/// Issues a fresh token pair and makes its refresh token the only one honoured.
#[instrument(name = "auth_service::start_session", skip(app_state, user), fields(user_id = %user.id))]
pub async fn start_session(app_state: &AppState, user: &User) -> Result<TokenPair> {
  let pair = app_state.tokens.issue_pair(user)?;
  app_state
    .repos
    .users
    .set_refresh_token_hash(user.id, Some(&digest(&pair.refresh_token)))
    .await?;
  Ok(pair)
}

#[instrument(name = "auth_service::logout", skip(app_state))]
pub async fn logout(app_state: &AppState, user_id: Uuid) -> Result<()> {
  app_state.repos.users.set_refresh_token_hash(user_id, None).await?;
  info!("Stored refresh token cleared.");
  Ok(())
}

pub async fn load_user(app_state: &AppState, user_id: Uuid) -> Result<User> {
  app_state
    .repos
    .users
    .find_by_id(user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[instrument(name = "auth_service::profile", skip(app_state))]
pub async fn profile(app_state: &AppState, user_id: Uuid) -> Result<UserProfile> {
  Ok(UserProfile::from(&load_user(app_state, user_id).await?))
}

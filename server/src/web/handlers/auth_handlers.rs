use actix_web::{web, HttpResponse};
use mobileshop_flow::ContextData;
use serde::Serialize;
use tracing::{info, instrument};

use super::run_workflow;
use crate::errors::AppError;
use crate::models::requests::{LoginPayload, RefreshPayload, RegisterPayload};
use crate::models::UserProfile;
use crate::pipelines::contexts::{LoginCtxData, RefreshCtxData, RegisterCtxData};
use crate::services::auth_service;
use crate::services::token_service::TokenPair;
use crate::state::AppState;
use crate::web::envelope;
use crate::web::extractors::AuthenticatedUser;

/// `{user, token, refreshToken}` returned by register and login.
#[derive(Serialize)]
struct SessionData {
  user: UserProfile,
  #[serde(flatten)]
  tokens: TokenPair,
}

fn missing(what: &str) -> AppError {
  AppError::Internal(format!("Pipeline completed without {}.", what))
}

#[instrument(name = "handler::register", skip(app_state, payload), fields(email = %payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(RegisterCtxData::new(app_state.get_ref().clone(), payload.into_inner()));
  run_workflow(&app_state, ctx.clone(), "register_user").await?;

  let data = {
    let guard = ctx.read();
    let user = guard.user.as_ref().ok_or_else(|| missing("a user"))?;
    SessionData {
      user: UserProfile::from(user),
      tokens: guard.tokens.clone().ok_or_else(|| missing("tokens"))?,
    }
  };
  info!(user_id = %data.user.id, "User registered.");
  Ok(envelope::created("User registered successfully", data))
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(LoginCtxData::new(app_state.get_ref().clone(), payload.into_inner()));
  run_workflow(&app_state, ctx.clone(), "login_user").await?;

  let data = {
    let guard = ctx.read();
    let user = guard.user.as_ref().ok_or_else(|| missing("a user"))?;
    SessionData {
      user: UserProfile::from(user),
      tokens: guard.tokens.clone().ok_or_else(|| missing("tokens"))?,
    }
  };
  info!(user_id = %data.user.id, "Login successful.");
  Ok(envelope::ok_with_message("Login successful", data))
}

#[instrument(name = "handler::refresh", skip(app_state, payload))]
pub async fn refresh_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RefreshPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(RefreshCtxData::new(
    app_state.get_ref().clone(),
    payload.into_inner().refresh_token,
  ));
  run_workflow(&app_state, ctx.clone(), "refresh_session").await?;

  let tokens = { ctx.read().tokens.clone() }.ok_or_else(|| missing("tokens"))?;
  Ok(envelope::ok(tokens))
}

#[instrument(name = "handler::logout", skip(app_state, user), fields(user_id = %user.id()))]
pub async fn logout_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  auth_service::logout(&app_state, user.id()).await?;
  Ok(envelope::message("Logged out successfully"))
}

#[instrument(name = "handler::profile", skip(app_state, user), fields(user_id = %user.id()))]
pub async fn profile_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let profile = auth_service::profile(&app_state, user.id()).await?;
  Ok(envelope::ok(profile))
}

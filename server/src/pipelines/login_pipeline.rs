use std::sync::Arc;

use mobileshop_flow::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{info, warn};
use validator::Validate;

use crate::errors::AppError;
use crate::pipelines::contexts::LoginCtxData;
use crate::services::auth_service;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn register_login_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<LoginCtxData, AppError>::new(
    "login_user",
    &[
      ("validate_login_input", false, None),
      ("fetch_user_by_email", false, None),
      ("verify_user_password", false, None),
      ("ensure_account_active", false, None),
      ("issue_session_tokens", false, None),
    ],
  );

  p.on_step("validate_login_input", |ctx_data: ContextData<LoginCtxData>| async move {
    let mut payload = { ctx_data.read().payload.clone() };
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;
    {
      ctx_data.write().payload = payload;
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("fetch_user_by_email", |ctx_data: ContextData<LoginCtxData>| async move {
    let (app_state, email, password) = {
      let guard = ctx_data.read();
      (
        guard.app_state.clone(),
        guard.payload.email.clone(),
        guard.payload.password.clone(),
      )
    };

    match app_state.repos.users.find_by_email(&email).await? {
      Some(user) => {
        ctx_data.write().user = Some(user);
        Ok(PipelineControl::Continue)
      }
      None => {
        // Same hashing cost as a real account, so response time does not reveal registration.
        app_state.passwords.verify_dummy(&password).await;
        warn!(%email, "Login attempt for unknown email.");
        Err(AppError::Auth(INVALID_CREDENTIALS.to_string()))
      }
    }
  });

  p.on_step("verify_user_password", |ctx_data: ContextData<LoginCtxData>| async move {
    let (app_state, user, password) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.user.clone(), guard.payload.password.clone())
    };
    let user = user.ok_or_else(|| AppError::Internal("Password check reached without a user.".to_string()))?;

    if !app_state.passwords.verify(&user.password_hash, &password).await? {
      warn!(user_id = %user.id, "Login attempt with wrong password.");
      return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("ensure_account_active", |ctx_data: ContextData<LoginCtxData>| async move {
    let blocked = { ctx_data.read().user.as_ref().is_some_and(|u| u.is_blocked) };
    if blocked {
      warn!("Blocked account attempted to log in.");
      return Err(AppError::Forbidden("Your account has been blocked".to_string()));
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("issue_session_tokens", |ctx_data: ContextData<LoginCtxData>| async move {
    let (app_state, user) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.user.clone())
    };
    let user = user.ok_or_else(|| AppError::Internal("Session requested without a user.".to_string()))?;

    let tokens = auth_service::start_session(&app_state, &user).await?;
    info!(user_id = %user.id, "User logged in.");
    {
      ctx_data.write().tokens = Some(tokens);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register(p);
}

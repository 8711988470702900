use std::sync::Arc;

use mobileshop_flow::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::RefreshCtxData;
use crate::services::auth_service;
use crate::services::token_service::digest;
use crate::state::AppState;

pub fn register_refresh_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<RefreshCtxData, AppError>::new(
    "refresh_session",
    &[
      ("validate_refresh_input", false, None),
      ("verify_refresh_signature", false, None),
      ("match_stored_refresh_token", false, None),
      ("rotate_session_tokens", false, None),
    ],
  );

  p.on_step("validate_refresh_input", |ctx_data: ContextData<RefreshCtxData>| async move {
    let present = { ctx_data.read().refresh_token.as_deref().is_some_and(|t| !t.trim().is_empty()) };
    if !present {
      return Err(AppError::Validation("Refresh token is required".to_string()));
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("verify_refresh_signature", |ctx_data: ContextData<RefreshCtxData>| async move {
    let claims = {
      let guard = ctx_data.read();
      let token = guard.refresh_token.as_deref().unwrap_or_default();
      guard.app_state.tokens.verify_refresh_token(token.trim())
    };
    let claims = claims.map_err(|e| {
      warn!(error = %e, "Refresh token failed verification.");
      AppError::Auth("Invalid refresh token".to_string())
    })?;
    {
      ctx_data.write().claims = Some(claims);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("match_stored_refresh_token", |ctx_data: ContextData<RefreshCtxData>| async move {
    let (app_state, user_id, presented) = {
      let guard = ctx_data.read();
      (
        guard.app_state.clone(),
        guard.claims.as_ref().map(|c| c.sub),
        guard.refresh_token.as_deref().map(|t| digest(t.trim())),
      )
    };
    let invalid = || AppError::Auth("Invalid refresh token".to_string());
    let user_id = user_id.ok_or_else(invalid)?;

    let user = app_state.repos.users.find_by_id(user_id).await?.ok_or_else(invalid)?;
    if user.refresh_token_hash.is_none() || user.refresh_token_hash != presented {
      warn!(%user_id, "Refresh token is superseded or was logged out.");
      return Err(invalid());
    }
    if user.is_blocked {
      warn!(%user_id, "Blocked account attempted a token refresh.");
      return Err(AppError::Forbidden("Your account has been blocked".to_string()));
    }
    {
      ctx_data.write().user = Some(user);
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("rotate_session_tokens", |ctx_data: ContextData<RefreshCtxData>| async move {
    let (app_state, user) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.user.clone())
    };
    let user = user.ok_or_else(|| AppError::Internal("Rotation reached without a user.".to_string()))?;

    let tokens = auth_service::start_session(&app_state, &user).await?;
    info!(user_id = %user.id, "Session tokens rotated.");
    {
      ctx_data.write().tokens = Some(tokens);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register(p);
}

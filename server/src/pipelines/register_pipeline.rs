use std::sync::Arc;

use mobileshop_flow::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{event, info, warn, Level};
use validator::Validate;

use crate::errors::AppError;
use crate::models::{NewUser, Role};
use crate::pipelines::contexts::RegisterCtxData;
use crate::services::auth_service;
use crate::state::AppState;

pub fn register_register_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<RegisterCtxData, AppError>::new(
    "register_user",
    &[
      ("validate_registration", false, None),
      ("check_existing_email", false, None),
      ("create_user_account", false, None),
      ("issue_session_tokens", false, None),
    ],
  );

  p.on_step("validate_registration", |ctx_data: ContextData<RegisterCtxData>| async move {
    let payload = { ctx_data.read().payload.clone() }.normalized();
    if let Err(errors) = payload.validate() {
      warn!("Registration input rejected.");
      return Err(AppError::from(errors));
    }
    {
      ctx_data.write().payload = payload;
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("check_existing_email", |ctx_data: ContextData<RegisterCtxData>| async move {
    let (app_state, email) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.payload.email.clone())
    };

    event!(Level::DEBUG, %email, "Checking if email is already registered.");
    if app_state.repos.users.email_exists(&email).await? {
      warn!(%email, "Registration attempted with an existing email.");
      return Err(AppError::Conflict("User with this email already exists".to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("create_user_account", |ctx_data: ContextData<RegisterCtxData>| async move {
    let (app_state, payload) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.payload.clone())
    };

    let password_hash = app_state.passwords.hash(&payload.password).await?;
    // A racing registration of the same e-mail surfaces as Conflict from the unique index.
    let user = app_state
      .repos
      .users
      .create(NewUser {
        email: payload.email,
        password_hash,
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        role: Role::User,
      })
      .await?;

    info!(user_id = %user.id, email = %user.email, "User account created.");
    {
      ctx_data.write().user = Some(user);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("issue_session_tokens", |ctx_data: ContextData<RegisterCtxData>| async move {
    let (app_state, user) = {
      let guard = ctx_data.read();
      (guard.app_state.clone(), guard.user.clone())
    };
    let user = user.ok_or_else(|| AppError::Internal("Session requested before the account exists.".to_string()))?;

    let tokens = auth_service::start_session(&app_state, &user).await?;
    {
      ctx_data.write().tokens = Some(tokens);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register(p);
}

mod common;

use common::*;
use mobileshop_api::errors::AppError;
use mobileshop_api::models::requests::{ChangePasswordPayload, LoginPayload};
use mobileshop_api::pipelines::contexts::{LoginCtxData, RefreshCtxData, RegisterCtxData};
use mobileshop_api::services::token_service::{digest, TokenPair};
use mobileshop_api::services::{account_service, admin_service, auth_service};
use mobileshop_api::state::AppState;
use mobileshop_flow::{ContextData, PipelineResult};

async fn login(state: &AppState, email: &str, password: &str) -> Result<TokenPair, AppError> {
  let ctx = ContextData::new(LoginCtxData::new(
    state.clone(),
    LoginPayload {
      email: email.to_string(),
      password: password.to_string(),
    },
  ));
  state.flows.run(ctx.clone()).await?;
  let tokens = ctx.read().tokens.clone();
  Ok(tokens.expect("login issues tokens"))
}

async fn refresh(state: &AppState, token: Option<&str>) -> Result<TokenPair, AppError> {
  let ctx = ContextData::new(RefreshCtxData::new(state.clone(), token.map(str::to_string)));
  state.flows.run(ctx.clone()).await?;
  let tokens = ctx.read().tokens.clone();
  Ok(tokens.expect("refresh issues tokens"))
}

#[tokio::test]
async fn registration_normalizes_email_and_stores_refresh_digest() {
  let state = memory_state();
  let (user, tokens) = register_customer(&state, "  Asha@Example.COM ").await;

  assert_eq!(user.email, "asha@example.com");
  assert_ne!(user.password_hash, PASSWORD);
  let stored = state.repos.users.find_by_id(user.id).await.unwrap().unwrap();
  assert_eq!(stored.refresh_token_hash, Some(digest(&tokens.refresh_token)));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
  let state = memory_state();
  register_customer(&state, "dup@example.com").await;

  let ctx = ContextData::new(RegisterCtxData::new(state.clone(), register_payload("DUP@example.com")));
  let err = state.flows.run(ctx).await.unwrap_err();
  assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn weak_password_is_rejected_with_one_message() {
  let state = memory_state();
  let mut payload = register_payload("weak@example.com");
  payload.password = "password".to_string();
  payload.first_name = String::new();

  let ctx = ContextData::new(RegisterCtxData::new(state.clone(), payload));
  match state.flows.run(ctx.clone()).await {
    Err(AppError::Validation(message)) => {
      assert!(message.contains("First name"), "{}", message);
      assert!(message.contains("; "), "{}", message);
    }
    other => panic!("expected a validation failure, got {:?}", other),
  }
  assert!(ctx.read().user.is_none());
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() {
  let state = memory_state();
  register_customer(&state, "who@example.com").await;

  let unknown = login(&state, "nobody@example.com", PASSWORD).await.unwrap_err();
  let wrong = login(&state, "who@example.com", "Wr0ng!pass").await.unwrap_err();
  assert_eq!(unknown.to_string(), wrong.to_string());
  assert!(matches!(unknown, AppError::Auth(_)));
}

#[tokio::test]
async fn blocked_account_cannot_log_in_with_correct_credentials() {
  let state = memory_state();
  let (user, _) = register_customer(&state, "blocked@example.com").await;
  admin_service::toggle_block(&state, user.id).await.unwrap();

  let err = login(&state, "blocked@example.com", PASSWORD).await.unwrap_err();
  assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn refresh_rotates_and_supersedes_the_previous_token() {
  let state = memory_state();
  let (_, first) = register_customer(&state, "rotate@example.com").await;

  let second = refresh(&state, Some(&first.refresh_token)).await.unwrap();
  assert_ne!(second.refresh_token, first.refresh_token);

  let err = refresh(&state, Some(&first.refresh_token)).await.unwrap_err();
  assert!(matches!(err, AppError::Auth(_)));
  assert!(refresh(&state, Some(&second.refresh_token)).await.is_ok());
}

#[tokio::test]
async fn login_supersedes_earlier_sessions() {
  let state = memory_state();
  let (_, registered) = register_customer(&state, "again@example.com").await;
  login(&state, "again@example.com", PASSWORD).await.unwrap();

  let err = refresh(&state, Some(&registered.refresh_token)).await.unwrap_err();
  assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn blank_refresh_token_is_a_bad_request() {
  let state = memory_state();
  assert!(matches!(refresh(&state, None).await, Err(AppError::Validation(_))));
  assert!(matches!(refresh(&state, Some("   ")).await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn access_token_is_not_accepted_as_refresh_token() {
  let state = memory_state();
  let (_, tokens) = register_customer(&state, "swap@example.com").await;

  let err = refresh(&state, Some(&tokens.token)).await.unwrap_err();
  assert!(matches!(err, AppError::Auth(_)));
  assert!(state.tokens.verify_access_token(&tokens.refresh_token).is_err());
}

#[tokio::test]
async fn logout_invalidates_the_outstanding_refresh_token() {
  let state = memory_state();
  let (user, tokens) = register_customer(&state, "bye@example.com").await;
  auth_service::logout(&state, user.id).await.unwrap();

  let err = refresh(&state, Some(&tokens.refresh_token)).await.unwrap_err();
  assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn refresh_of_blocked_account_is_forbidden() {
  let state = memory_state();
  let (user, tokens) = register_customer(&state, "later@example.com").await;
  admin_service::toggle_block(&state, user.id).await.unwrap();

  let err = refresh(&state, Some(&tokens.refresh_token)).await.unwrap_err();
  assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn password_change_requires_current_password_and_ends_sessions() {
  let state = memory_state();
  let (user, tokens) = register_customer(&state, "change@example.com").await;

  let wrong = account_service::change_password(
    &state,
    user.id,
    ChangePasswordPayload {
      current_password: "Not!the1".to_string(),
      new_password: "N3w!password".to_string(),
    },
  )
  .await;
  assert!(matches!(wrong, Err(AppError::Validation(_))));

  account_service::change_password(
    &state,
    user.id,
    ChangePasswordPayload {
      current_password: PASSWORD.to_string(),
      new_password: "N3w!password".to_string(),
    },
  )
  .await
  .unwrap();

  assert!(refresh(&state, Some(&tokens.refresh_token)).await.is_err());
  assert!(login(&state, "change@example.com", PASSWORD).await.is_err());
  assert!(login(&state, "change@example.com", "N3w!password").await.is_ok());
}

#[tokio::test]
async fn every_auth_pipeline_is_registered() {
  let state = memory_state();
  let names = state.flows.pipeline_names();
  for expected in ["add_to_cart", "login_user", "place_order", "refresh_session", "register_user"] {
    assert!(names.iter().any(|n| n == expected), "missing {}", expected);
  }
  let ctx = ContextData::new(RegisterCtxData::new(state.clone(), register_payload("ok@example.com")));
  assert_eq!(state.flows.run(ctx).await.unwrap(), PipelineResult::Completed);
}

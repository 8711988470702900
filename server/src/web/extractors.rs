//! Request-scoped identity. Handlers that take [`AuthenticatedUser`] never run
//! for a request without a valid access token; role-gated handlers then call
//! [`AuthenticatedUser::require`] with the capability they need.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Capability, Role};
use crate::services::token_service::Claims;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub claims: Claims,
}

impl AuthenticatedUser {
  pub fn id(&self) -> Uuid {
    self.claims.sub
  }

  pub fn role(&self) -> Role {
    self.claims.role
  }

  pub fn require(&self, capability: Capability) -> Result<(), AppError> {
    if self.claims.role.grants(capability) {
      Ok(())
    } else {
      tracing::warn!(user_id = %self.claims.sub, ?capability, "Capability denied.");
      Err(AppError::Forbidden("Insufficient permissions".to_string()))
    }
  }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
  req
    .headers()
    .get(AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
  let token = bearer_token(req).ok_or_else(|| AppError::Auth("Access token is required".to_string()))?;
  let claims = state.tokens.verify_access_token(token)?;
  Ok(AuthenticatedUser { claims })
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req))
  }
}

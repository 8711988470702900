//! Signed access and refresh tokens.
//!
//! Access and refresh tokens use distinct secrets and carry their kind in the
//! claims, so neither can stand in for the other. Refresh tokens are stored
//! server-side only as a SHA-256 digest.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  Access,
  Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub: Uuid,
  pub email: String,
  pub role: Role,
  pub kind: TokenKind,
  pub iat: i64,
  pub exp: i64,
  /// Random per token so two tokens minted in the same second still differ.
  pub jti: Uuid,
}

#[derive(Debug, Error)]
pub enum TokenError {
  #[error("token has expired")]
  Expired,

  #[error("invalid token: {0}")]
  Invalid(String),

  #[error("token generation failed: {0}")]
  Generation(String),
}

impl From<TokenError> for AppError {
  fn from(err: TokenError) -> Self {
    match err {
      TokenError::Expired => AppError::Auth("Token has expired".to_string()),
      TokenError::Invalid(_) => AppError::Auth("Invalid token".to_string()),
      TokenError::Generation(detail) => AppError::Internal(detail),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
  pub token: String,
  pub refresh_token: String,
}

struct KeyPair {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl: Duration,
}

impl KeyPair {
  fn new(secret: &str, ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl,
    }
  }
}

pub struct TokenService {
  access: KeyPair,
  refresh: KeyPair,
}

impl TokenService {
  pub fn new(config: &AppConfig) -> Self {
    Self {
      access: KeyPair::new(&config.jwt_secret, Duration::minutes(config.access_token_ttl_minutes)),
      refresh: KeyPair::new(&config.jwt_refresh_secret, Duration::days(config.refresh_token_ttl_days)),
    }
  }

  fn keys(&self, kind: TokenKind) -> &KeyPair {
    match kind {
      TokenKind::Access => &self.access,
      TokenKind::Refresh => &self.refresh,
    }
  }

  fn issue(&self, user: &User, kind: TokenKind) -> Result<String, TokenError> {
    let keys = self.keys(kind);
    let now = Utc::now();
    let claims = Claims {
      sub: user.id,
      email: user.email.clone(),
      role: user.role,
      kind,
      iat: now.timestamp(),
      exp: (now + keys.ttl).timestamp(),
      jti: Uuid::new_v4(),
    };
    encode(&Header::default(), &claims, &keys.encoding).map_err(|e| TokenError::Generation(e.to_string()))
  }

  pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
    self.issue(user, TokenKind::Access)
  }

  pub fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
    self.issue(user, TokenKind::Refresh)
  }

  pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
      token: self.issue_access_token(user)?,
      refresh_token: self.issue_refresh_token(user)?,
    })
  }

  fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<Claims>(token, &self.keys(kind).decoding, &validation).map_err(|e| match e.kind() {
      ErrorKind::ExpiredSignature => TokenError::Expired,
      _ => TokenError::Invalid(e.to_string()),
    })?;
    if data.claims.kind != kind {
      return Err(TokenError::Invalid("unexpected token kind".to_string()));
    }
    Ok(data.claims)
  }

  pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
    self.verify(token, TokenKind::Access)
  }

  pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
    self.verify(token, TokenKind::Refresh)
  }
}

/// Hex SHA-256 of a token, the form in which refresh tokens are persisted.
pub fn digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user() -> User {
    User {
      id: Uuid::new_v4(),
      email: "buyer@example.com".to_string(),
      password_hash: String::new(),
      first_name: "Asha".to_string(),
      last_name: "Rao".to_string(),
      phone: None,
      role: Role::User,
      is_blocked: false,
      refresh_token_hash: None,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn access_token_round_trips_claims() {
    let svc = TokenService::new(&AppConfig::for_memory_store());
    let u = user();
    let token = svc.issue_access_token(&u).unwrap();
    let claims = svc.verify_access_token(&token).unwrap();
    assert_eq!(claims.sub, u.id);
    assert_eq!(claims.role, Role::User);
    assert_eq!(claims.kind, TokenKind::Access);
  }

  #[test]
  fn tokens_are_not_interchangeable() {
    let svc = TokenService::new(&AppConfig::for_memory_store());
    let pair = svc.issue_pair(&user()).unwrap();
    assert!(matches!(svc.verify_refresh_token(&pair.token), Err(TokenError::Invalid(_))));
    assert!(matches!(svc.verify_access_token(&pair.refresh_token), Err(TokenError::Invalid(_))));
  }

  #[test]
  fn consecutive_tokens_differ() {
    let svc = TokenService::new(&AppConfig::for_memory_store());
    let u = user();
    assert_ne!(svc.issue_refresh_token(&u).unwrap(), svc.issue_refresh_token(&u).unwrap());
  }

  #[test]
  fn expired_token_is_reported_as_expired() {
    let mut cfg = AppConfig::for_memory_store();
    cfg.access_token_ttl_minutes = -1;
    let svc = TokenService::new(&cfg);
    let token = svc.issue_access_token(&user()).unwrap();
    assert!(matches!(svc.verify_access_token(&token), Err(TokenError::Expired)));
  }

  #[test]
  fn digest_is_stable_hex() {
    assert_eq!(digest("abc"), digest("abc"));
    assert_eq!(digest("abc").len(), 64);
    assert_ne!(digest("abc"), digest("abd"));
  }
}

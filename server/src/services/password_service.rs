//! One-way password hashing. Argon2 is CPU bound, so both operations run on
//! the blocking pool instead of the request's worker thread.

use crate::errors::{AppError, Result};
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Algorithm, Argon2, Params, Version,
};
use tracing::{debug, error, instrument};

#[derive(Clone)]
pub struct PasswordService {
  params: Params,
  /// Verified against when an e-mail is unknown so that path costs the same as a real check.
  dummy_hash: String,
}

impl PasswordService {
  pub fn new(memory_kib: u32, iterations: u32) -> Result<Self> {
    let params = Params::new(memory_kib, iterations, 1, None)
      .map_err(|e| AppError::Config(format!("Invalid Argon2 parameters: {}", e)))?;
    let dummy_hash = hash_with(&params, "timing-equalizer-password")?;
    Ok(Self { params, dummy_hash })
  }

  #[instrument(name = "password_service::hash", skip_all, err(Display))]
  pub async fn hash(&self, password: &str) -> Result<String> {
    if password.is_empty() {
      return Err(AppError::Validation("Password cannot be empty.".to_string()));
    }
    let params = self.params.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_with(&params, &password))
      .await
      .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
  }

  /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
  #[instrument(name = "password_service::verify", skip_all, err(Display))]
  pub async fn verify(&self, stored_hash: &str, candidate: &str) -> Result<bool> {
    let stored_hash = stored_hash.to_string();
    let candidate = candidate.to_string();
    tokio::task::spawn_blocking(move || verify_with(&stored_hash, &candidate))
      .await
      .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
  }

  /// Runs one verification whose outcome is discarded.
  pub async fn verify_dummy(&self, candidate: &str) {
    let _ = self.verify(&self.dummy_hash, candidate).await;
  }
}

fn hash_with(params: &Params, password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| {
      error!(error = %e, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing process failed: {}", e))
    })
}

fn verify_with(stored_hash: &str, candidate: &str) -> Result<bool> {
  let parsed = PasswordHash::new(stored_hash).map_err(|e| {
    error!(error = %e, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", e))
  })?;
  // Parameters come from the stored hash itself.
  match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: passwords do not match.");
      Ok(false)
    }
    Err(e) => Err(AppError::Internal(format!("Password verification process failed: {}", e))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cheap() -> PasswordService {
    PasswordService::new(256, 1).unwrap()
  }

  #[tokio::test]
  async fn hash_then_verify() {
    let svc = cheap();
    let hash = svc.hash("Sup3r$ecret").await.unwrap();
    assert_ne!(hash, "Sup3r$ecret");
    assert!(svc.verify(&hash, "Sup3r$ecret").await.unwrap());
    assert!(!svc.verify(&hash, "sup3r$ecret").await.unwrap());
  }

  #[tokio::test]
  async fn same_password_gets_distinct_salts() {
    let svc = cheap();
    let a = svc.hash("Sup3r$ecret").await.unwrap();
    let b = svc.hash("Sup3r$ecret").await.unwrap();
    assert_ne!(a, b);
  }

  #[tokio::test]
  async fn garbage_hash_is_an_internal_error() {
    let err = cheap().verify("not-a-phc-string", "x").await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
  }
}

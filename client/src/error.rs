//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Invalid response: {0}")]
  InvalidResponse(String),

  /// No session is held; log in first.
  #[error("Not logged in")]
  NotAuthenticated,

  /// The session could not be refreshed and has been cleared.
  #[error("Session expired; log in again")]
  SessionExpired,

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Permission denied: {0}")]
  Forbidden(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Validation error: {0}")]
  Validation(String),

  #[error("{0}")]
  InsufficientStock(String),

  #[error("Server error ({status}): {message}")]
  Server { status: u16, message: String },

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl ClientError {
  /// Maps a failed response to an error, preferring the envelope's `error` code
  /// over the status when both are present.
  pub fn from_failure(status: StatusCode, code: Option<&str>, message: String) -> Self {
    match (code, status) {
      (Some("INSUFFICIENT_STOCK"), _) => ClientError::InsufficientStock(message),
      (_, StatusCode::UNAUTHORIZED) => ClientError::Unauthorized(message),
      (_, StatusCode::FORBIDDEN) => ClientError::Forbidden(message),
      (_, StatusCode::NOT_FOUND) => ClientError::NotFound(message),
      (_, StatusCode::CONFLICT) => ClientError::Conflict(message),
      (_, StatusCode::BAD_REQUEST) => ClientError::Validation(message),
      (_, status) => ClientError::Server {
        status: status.as_u16(),
        message,
      },
    }
  }
}

pub type ClientResult<T> = Result<T, ClientError>;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::web::envelope::ApiResponse;
use mobileshop_flow::FlowError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Insufficient stock for {product}")]
  InsufficientStock { product: String },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl From<validator::ValidationErrors> for AppError {
  /// Folds every field failure into one message, sorted so it is stable.
  fn from(errors: validator::ValidationErrors) -> Self {
    let mut messages: Vec<String> = errors
      .field_errors()
      .into_iter()
      .flat_map(|(field, field_errors)| {
        field_errors.iter().map(move |e| match &e.message {
          Some(message) => message.to_string(),
          None => format!("{} is invalid", field),
        })
      })
      .collect();
    messages.sort();
    messages.dedup();
    AppError::Validation(messages.join("; "))
  }
}

impl AppError {
  /// Stable kind code placed in the envelope's `error` field.
  pub fn code(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "BAD_REQUEST",
      AppError::Auth(_) => "UNAUTHORIZED",
      AppError::Forbidden(_) => "FORBIDDEN",
      AppError::NotFound(_) => "NOT_FOUND",
      AppError::Conflict(_) => "CONFLICT",
      AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => "INTERNAL_ERROR",
    }
  }

  /// Message safe to show a client. Server-side failures never leak their detail.
  pub fn client_message(&self) -> String {
    match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m) => m.clone(),
      AppError::InsufficientStock { .. } => self.to_string(),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        "Internal server error".to_string()
      }
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::debug!(application_error = %self, "Responding with client error");
    }
    HttpResponse::build(status).json(ApiResponse::<()>::failure(self.client_message(), self.code()))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn server_errors_hide_their_detail() {
    let err = AppError::Internal("connection string postgres://secret".to_string());
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.client_message(), "Internal server error");
  }

  #[test]
  fn insufficient_stock_names_the_product() {
    let err = AppError::InsufficientStock {
      product: "Pixel 9".to_string(),
    };
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    assert_eq!(err.client_message(), "Insufficient stock for Pixel 9");
  }
}

//! The `{success, message?, data?, error?}` body every route answers with.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{AppError, Result};
use crate::models::{Page, PageRequest};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<&'static str>,
}

impl<T: Serialize> ApiResponse<T> {
  pub fn success(message: Option<String>, data: Option<T>) -> Self {
    Self {
      success: true,
      message,
      data,
      error: None,
    }
  }
}

impl ApiResponse<()> {
  pub fn failure(message: impl Into<String>, code: &'static str) -> Self {
    Self {
      success: false,
      message: Some(message.into()),
      data: None,
      error: Some(code),
    }
  }
}

fn respond<T: Serialize>(status: StatusCode, message: Option<&str>, data: Option<T>) -> HttpResponse {
  HttpResponse::build(status).json(ApiResponse::success(message.map(str::to_string), data))
}

/// 200 with `data` only.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
  respond(StatusCode::OK, None, Some(data))
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> HttpResponse {
  respond(StatusCode::OK, Some(message), Some(data))
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
  respond(StatusCode::CREATED, Some(message), Some(data))
}

/// 200 with a message and no `data`.
pub fn message(message: &str) -> HttpResponse {
  respond::<()>(StatusCode::OK, Some(message), None)
}

/// `data: {<items_key>: [...], pagination: {...}}`.
pub fn paginated<T: Serialize>(items_key: &str, page: &Page<T>, request: PageRequest) -> Result<HttpResponse> {
  let items = serde_json::to_value(&page.items)
    .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", items_key, e)))?;
  let pagination = serde_json::to_value(page.pagination(request))
    .map_err(|e| AppError::Internal(format!("Failed to serialize pagination: {}", e)))?;

  let mut data = Map::new();
  data.insert(items_key.to_string(), items);
  data.insert("pagination".to_string(), pagination);
  Ok(ok(Value::Object(data)))
}

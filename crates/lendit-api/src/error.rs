//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every [`lendit_core::ErrorKind`] maps to a stable status class:
//! NotFound → 404, InvalidInput → 400, Forbidden → 403, Conflict → 409,
//! Internal → 500. Bodies carry a single human-readable `error` field.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lendit_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] lendit_core::Error),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Core(e) => {
        let status = match e.kind() {
          ErrorKind::NotFound => StatusCode::NOT_FOUND,
          ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
          ErrorKind::Forbidden => StatusCode::FORBIDDEN,
          ErrorKind::Conflict => StatusCode::CONFLICT,
          ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
          tracing::error!(error = %e, "request failed on the store");
        }
        (status, e.to_string())
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The write would break a uniqueness rule.
  #[error("conflict: {0}")]
  Conflict(String),

  /// A collaborator (vision model, upload service) failed.
  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("export error: {0}")]
  Export(#[from] cardex_export::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<cardex_core::Error> for ApiError {
  fn from(e: cardex_core::Error) -> Self {
    use cardex_core::Error as E;
    match e {
      E::DuplicateMobile(_) | E::DuplicateId(_) => Self::Conflict(e.to_string()),
      E::NotFound(_) => Self::NotFound(e.to_string()),
      other => Self::Store(Box::new(other)),
    }
  }
}

impl From<cardex_extract::Error> for ApiError {
  fn from(e: cardex_extract::Error) -> Self {
    use cardex_extract::Error as E;
    match e {
      E::InvalidUrl(_) | E::InvalidImage(_) => Self::BadRequest(e.to_string()),
      E::ExtractionFailed(_) | E::UploadFailed(_) => {
        Self::Upstream(e.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Export(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    if status.is_server_error() {
      tracing::error!(%status, error = %message, "request failed");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}

//! Handlers for the scanning flow: `/upload` and `/ocr/extract`.
//!
//! | Method | Path           | Notes |
//! |--------|----------------|-------|
//! | `POST` | `/upload`      | Body: `{"base64Image": "..."}` |
//! | `POST` | `/ocr/extract` | Body: `{"imageUrl": "..."}` |

use std::sync::Arc;

use axum::{Json, extract::State};
use cardex_core::CardFields;
use cardex_extract::{Extractor, Uploader, decode_image_payload};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Largest accepted request body on the scan routes. Photographs arrive
/// base64-encoded, so this is well above the typical JPEG size.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Collaborators behind the scan routes.
pub struct ScanState<E, U> {
  pub extractor: Arc<E>,
  pub uploader:  Arc<U>,
}

// Derived `Clone` would demand `E: Clone, U: Clone`.
impl<E, U> Clone for ScanState<E, U> {
  fn clone(&self) -> Self {
    Self {
      extractor: Arc::clone(&self.extractor),
      uploader:  Arc::clone(&self.uploader),
    }
  }
}

// ─── Upload ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBody {
  pub base64_image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReply {
  pub image_url: String,
}

/// `POST /upload`
pub async fn upload<E: Extractor, U: Uploader>(
  State(state): State<ScanState<E, U>>,
  Json(body): Json<UploadBody>,
) -> Result<Json<UploadReply>, ApiError> {
  let payload = body
    .base64_image
    .filter(|p| !p.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("no image provided".into()))?;

  let image = decode_image_payload(&payload)?;
  let image_url = state.uploader.upload(image).await?;
  tracing::info!(%image_url, "uploaded card image");
  Ok(Json(UploadReply { image_url }))
}

// ─── Extract ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractBody {
  pub image_url: Option<String>,
}

/// Extraction outcome. A failed extraction is still a `200`: the client
/// falls back to manual entry and shows `error`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractReply {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:    Option<CardFields>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
}

/// `POST /ocr/extract`
pub async fn extract<E: Extractor, U: Uploader>(
  State(state): State<ScanState<E, U>>,
  Json(body): Json<ExtractBody>,
) -> Result<Json<ExtractReply>, ApiError> {
  let raw = body
    .image_url
    .ok_or_else(|| ApiError::BadRequest("no image URL provided".into()))?;
  let image_url = cardex_extract::validate_image_url(&raw)?;

  let reply = match state.extractor.extract(&image_url).await {
    Ok(fields) => ExtractReply { success: true, data: Some(fields), error: None },
    Err(e) => {
      tracing::warn!(error = %e, %image_url, "extraction failed");
      ExtractReply { success: false, data: None, error: Some(e.to_string()) }
    }
  };
  Ok(Json(reply))
}

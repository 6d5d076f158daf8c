//! Image uploaders.
//!
//! [`HttpUploader`] forwards the image to a remote upload service;
//! [`DiskUploader`] writes it under a local directory that the server exposes
//! publicly. Both refuse empty payloads and only ever return `http(s)` URLs.

use std::{path::PathBuf, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{Error, Result, Uploader, validate_image_url};

// ─── Payload decoding ────────────────────────────────────────────────────────

/// Decode a base64 image, with or without a `data:image/<type>;base64,`
/// prefix.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
  let payload = payload.trim();
  let data = match payload.strip_prefix("data:image/") {
    Some(rest) => rest
      .split_once(";base64,")
      .map(|(_, data)| data)
      .ok_or_else(|| Error::InvalidImage("malformed data URL".into()))?,
    None => payload,
  };

  let bytes = B64
    .decode(data)
    .map_err(|e| Error::InvalidImage(format!("bad base64: {e}")))?;
  if bytes.is_empty() {
    return Err(Error::InvalidImage("empty image".into()));
  }
  Ok(bytes)
}

// ─── Remote uploader ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
  image_url: Option<String>,
}

/// Parse an upload service reply of the form `{"imageUrl": "..."}`.
pub(crate) fn parse_upload_response(body: &str) -> Result<String> {
  let resp: UploadResponse = serde_json::from_str(body)
    .map_err(|e| Error::UploadFailed(format!("malformed response: {e}")))?;
  let url = resp
    .image_url
    .ok_or_else(|| Error::UploadFailed("response has no imageUrl".into()))?;
  validate_image_url(&url)
    .map_err(|_| Error::UploadFailed(format!("not a public URL: {url:?}")))
}

/// Uploads images to a remote service that accepts
/// `{"base64Image": "..."}` and answers `{"imageUrl": "..."}`.
#[derive(Clone)]
pub struct HttpUploader {
  client:   Client,
  endpoint: String,
}

impl HttpUploader {
  pub fn new(endpoint: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .map_err(|e| Error::UploadFailed(format!("building HTTP client: {e}")))?;
    Ok(Self { client, endpoint: endpoint.into() })
  }
}

impl Uploader for HttpUploader {
  async fn upload(&self, image: Vec<u8>) -> Result<String> {
    if image.is_empty() {
      return Err(Error::InvalidImage("empty image".into()));
    }

    let resp = self
      .client
      .post(&self.endpoint)
      .json(&json!({ "base64Image": B64.encode(&image) }))
      .send()
      .await
      .map_err(|e| {
        tracing::warn!(error = %e, "upload request failed");
        Error::UploadFailed(e.to_string())
      })?;

    let status = resp.status();
    if !status.is_success() {
      tracing::warn!(%status, "upload endpoint returned an error status");
      return Err(Error::UploadFailed(format!("endpoint returned {status}")));
    }

    let body = resp
      .text()
      .await
      .map_err(|e| Error::UploadFailed(e.to_string()))?;
    parse_upload_response(&body)
  }
}

// ─── Local uploader ──────────────────────────────────────────────────────────

/// Writes images to `dir` as `card-<uuid>.jpg` and returns
/// `<public_base>/<file name>`.
#[derive(Debug, Clone)]
pub struct DiskUploader {
  dir:         PathBuf,
  public_base: String,
}

impl DiskUploader {
  pub fn new(dir: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
    let public_base = public_base.into().trim_end_matches('/').to_owned();
    Self { dir: dir.into(), public_base }
  }

  pub fn dir(&self) -> &std::path::Path { &self.dir }
}

impl Uploader for DiskUploader {
  async fn upload(&self, image: Vec<u8>) -> Result<String> {
    if image.is_empty() {
      return Err(Error::InvalidImage("empty image".into()));
    }

    let name = format!("card-{}.jpg", Uuid::new_v4().simple());
    let path = self.dir.join(&name);

    tokio::fs::create_dir_all(&self.dir)
      .await
      .map_err(|e| Error::UploadFailed(format!("creating image dir: {e}")))?;
    tokio::fs::write(&path, &image)
      .await
      .map_err(|e| Error::UploadFailed(format!("writing {}: {e}", path.display())))?;

    tracing::debug!(path = %path.display(), bytes = image.len(), "stored image");
    validate_image_url(&format!("{}/{name}", self.public_base))
      .map_err(|e| Error::UploadFailed(e.to_string()))
  }
}

// ─── Either ──────────────────────────────────────────────────────────────────

/// Uploader chosen at runtime from configuration.
#[derive(Clone)]
pub enum AnyUploader {
  Http(HttpUploader),
  Disk(DiskUploader),
}

impl Uploader for AnyUploader {
  async fn upload(&self, image: Vec<u8>) -> Result<String> {
    match self {
      Self::Http(u) => u.upload(image).await,
      Self::Disk(u) => u.upload(image).await,
    }
  }
}

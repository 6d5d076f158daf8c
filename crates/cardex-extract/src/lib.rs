//! Extraction and upload collaborators for Cardex.
//!
//! A card photograph reaches the repository in two hops: the image bytes are
//! uploaded somewhere a vision model can fetch them ([`Uploader`]), then the
//! model turns the public URL into structured fields ([`Extractor`]). Both
//! are single-shot network calls with no retry; callers fall back to manual
//! entry on failure.

// Native `async fn` in traits, as in `cardex-core`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod upload;
pub mod vision;

use std::future::Future;

use cardex_core::CardFields;

pub use error::{Error, Result};
pub use upload::{AnyUploader, DiskUploader, HttpUploader, decode_image_payload};
pub use vision::{VisionConfig, VisionExtractor};

/// Turns a publicly reachable image URL into card fields.
///
/// Implementations must return sanitized fields (see
/// [`CardFields::sanitized`]); the output is still untrusted.
pub trait Extractor: Send + Sync {
  fn extract<'a>(
    &'a self,
    image_url: &'a str,
  ) -> impl Future<Output = Result<CardFields>> + Send + 'a;
}

/// Stores image bytes and returns a public URL for them.
///
/// There is no idempotency: uploading the same bytes twice yields two URLs.
pub trait Uploader: Send + Sync {
  fn upload(
    &self,
    image: Vec<u8>,
  ) -> impl Future<Output = Result<String>> + Send + '_;
}

/// Check that `raw` is an absolute `http`/`https` URL and return it
/// normalised.
pub fn validate_image_url(raw: &str) -> Result<String> {
  let parsed =
    url::Url::parse(raw.trim()).map_err(|_| Error::InvalidUrl(raw.to_owned()))?;
  match parsed.scheme() {
    "http" | "https" => Ok(parsed.to_string()),
    _ => Err(Error::InvalidUrl(raw.to_owned())),
  }
}

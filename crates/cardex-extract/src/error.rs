//! Error types for the extraction and upload collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The vision model could not be reached or replied with something other
  /// than the expected JSON object.
  #[error("failed to extract business card information: {0}")]
  ExtractionFailed(String),

  #[error("failed to upload image: {0}")]
  UploadFailed(String),

  /// Not an absolute `http` or `https` URL.
  #[error("invalid image URL: {0:?}")]
  InvalidUrl(String),

  /// Empty or undecodable image payload.
  #[error("invalid image payload: {0}")]
  InvalidImage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

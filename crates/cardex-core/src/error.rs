//! Error types for `cardex-core`.

use thiserror::Error;

use crate::card::CardId;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored card already uses this non-empty mobile number.
  #[error("a card with mobile number {0:?} already exists")]
  DuplicateMobile(String),

  #[error("a card with id {0} already exists")]
  DuplicateId(CardId),

  #[error("card not found: {0}")]
  NotFound(CardId),

  /// The blob store could not be read or written.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("unsupported card document version: {0}")]
  UnsupportedVersion(u32),
}

impl Error {
  /// Wrap a backend error from a [`BlobStore`](crate::store::BlobStore).
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StorageUnavailable(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Error types for the cardex-export serializers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The workbook could not be assembled or written.
  #[error("serialization failed: {0}")]
  SerializationFailed(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! The `BlobStore` trait — the storage seam under the card repository.
//!
//! The repository persists its whole card list as one named blob. Backends
//! only need to get, set and remove a string by key; the SQLite backend lives
//! in `cardex-store-sqlite` and an in-memory one in [`crate::memory`].

use std::future::Future;

/// Abstraction over a key-value blob backend.
///
/// `set` must be atomic per key: a concurrent or later `get` observes either
/// the previous value or the new one, never a partial write.
///
/// All methods return `Send` futures so repositories built on a store can be
/// shared across tokio tasks (e.g. by `axum` handlers).
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the blob stored under `key`. Returns `None` if absent.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Replace the blob stored under `key`.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove the blob under `key`. Removing an absent key is not an error.
  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

//! [`MemoryBlobStore`] — a process-local [`BlobStore`].
//!
//! Used as a test double and for ephemeral runs. It can be switched into an
//! unavailable mode to exercise the repository's failure paths.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use thiserror::Error;

use crate::store::BlobStore;

#[derive(Debug, Error)]
pub enum MemoryStoreError {
  #[error("memory store is unavailable")]
  Unavailable,

  #[error("memory store lock poisoned")]
  Poisoned,
}

/// In-memory blob store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
  blobs:       Arc<Mutex<HashMap<String, String>>>,
  unavailable: Arc<AtomicBool>,
}

impl MemoryBlobStore {
  pub fn new() -> Self { Self::default() }

  /// While `true`, every operation fails with
  /// [`MemoryStoreError::Unavailable`].
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  fn check(&self) -> Result<(), MemoryStoreError> {
    if self.unavailable.load(Ordering::SeqCst) {
      Err(MemoryStoreError::Unavailable)
    } else {
      Ok(())
    }
  }
}

impl BlobStore for MemoryBlobStore {
  type Error = MemoryStoreError;

  async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
    self.check()?;
    let blobs = self.blobs.lock().map_err(|_| MemoryStoreError::Poisoned)?;
    Ok(blobs.get(key).cloned())
  }

  async fn set(&self, key: &str, value: String) -> Result<(), Self::Error> {
    self.check()?;
    let mut blobs = self.blobs.lock().map_err(|_| MemoryStoreError::Poisoned)?;
    blobs.insert(key.to_owned(), value);
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), Self::Error> {
    self.check()?;
    let mut blobs = self.blobs.lock().map_err(|_| MemoryStoreError::Poisoned)?;
    blobs.remove(key);
    Ok(())
  }
}

//! In-memory blob storage backend.
//!
//! Thread-safe, intended for embedded usage and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::{BlobStore, StoreError};

fn lock_err(context: &'static str) -> StoreError {
    StoreError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory blob store.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let blobs = self.blobs.read().map_err(|_| lock_err("blob.get"))?;
        Ok(blobs.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().map_err(|_| lock_err("blob.put"))?;
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

//! File-backed blob storage backend.
//!
//! Stores one `<key>.json` file per blob key under a root directory,
//! mirroring the bucket layout of the external blob collaborator. Writes
//! go through a temporary file and rename so a crashed write never leaves
//! a truncated document behind.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::traits::{BlobStore, StoreError};

/// Blob store keeping each key in its own JSON file.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|err| StoreError::Backend(format!("create {}: {err}", root.display())))?;
        Ok(Self { root })
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(StoreError::Backend(format!("invalid blob key: {key:?}")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.blob_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Backend(format!(
                "read {}: {err}",
                path.display()
            ))),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.blob_path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .map_err(|err| StoreError::Backend(format!("write {}: {err}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|err| StoreError::Backend(format!("rename {}: {err}", path.display())))?;
        Ok(())
    }
}

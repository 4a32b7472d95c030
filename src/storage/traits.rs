//! Abstract blob storage trait.
//!
//! The engine treats durable storage as an external collaborator with
//! fetch-by-key / put-by-key semantics only. Backends own no graph logic.

use thiserror::Error;

/// Errors surfaced by blob storage backends and the store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or otherwise failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The backend call exceeded its bounded timeout.
    #[error("storage operation timed out after {duration_ms}ms")]
    Timeout {
        /// Elapsed time before the call was abandoned.
        duration_ms: u64,
    },

    /// The blob could not be encoded or decoded as a graph document.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The document changed between load and save (optimistic concurrency).
    #[error("document revision changed since load for key '{key}'")]
    RevisionMismatch {
        /// Blob key whose revision drifted.
        key: String,
    },
}

impl StoreError {
    /// Returns true if retrying the whole load-mutate-save cycle may
    /// succeed. A revision mismatch resolves by reloading, so it counts.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Timeout { .. } | Self::RevisionMismatch { .. }
        )
    }
}

/// Durable key-value blob storage.
///
/// `get` returns `None` for a missing key; it never treats absence as an
/// error. `put` overwrites completely. No partial-write semantics exist at
/// this layer; atomicity of a logical mutation is the caller's
/// responsibility.
pub trait BlobStore: Send + Sync {
    /// Fetches the blob stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `bytes` under `key`, overwriting any previous blob.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

//! Graph store adapter.
//!
//! Loads and persists whole graph documents for an owner key through the
//! blob collaborator. Owns serialization, bounded retry around transient
//! backend failures, and content-hash revision tokens for optimistic
//! concurrency. No graph logic lives here.

use std::sync::Arc;
use std::time::Duration;

use crate::error::GraphResult;
use crate::graph::GraphDocument;
use crate::storage::{BlobStore, StoreError};

/// Content-hash revision token for a stored document.
///
/// Computed as the blake3 hash of the serialized blob bytes. A missing
/// blob has the distinguished revision [`Revision::NONE`], so creating a
/// document races correctly with a concurrent creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision(Option<blake3::Hash>);

impl Revision {
    /// Revision of an absent document.
    pub const NONE: Self = Self(None);

    fn of(bytes: &[u8]) -> Self {
        Self(Some(blake3::hash(bytes)))
    }

    /// Returns true if this is the absent-document revision.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

/// Bounded retry policy for transient store failures.
///
/// The n-th retry sleeps `backoff * n` (linear backoff). `attempts`
/// counts total tries, including the first.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Base backoff between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Adapter between graph documents and the blob collaborator.
///
/// One blob per owner key; every save rewrites the whole document.
pub struct GraphStore {
    blob: Arc<dyn BlobStore>,
    retry: RetryPolicy,
}

impl GraphStore {
    /// Creates a store with the default retry policy.
    #[must_use]
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self::with_retry(blob, RetryPolicy::default())
    }

    /// Creates a store with an explicit retry policy.
    #[must_use]
    pub fn with_retry(blob: Arc<dyn BlobStore>, retry: RetryPolicy) -> Self {
        Self { blob, retry }
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub const fn retry(&self) -> RetryPolicy {
        self.retry
    }

    fn get_with_retry(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut last: Option<StoreError> = None;
        for attempt in 0..self.retry.attempts.max(1) {
            if attempt > 0 {
                std::thread::sleep(self.retry.backoff * attempt);
            }
            match self.blob.get(key) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => last = Some(err),
                Err(err) => return Err(err),
            }
        }
        Err(last.unwrap_or_else(|| StoreError::Backend("retries exhausted".to_string())))
    }

    fn put_with_retry(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut last: Option<StoreError> = None;
        for attempt in 0..self.retry.attempts.max(1) {
            if attempt > 0 {
                std::thread::sleep(self.retry.backoff * attempt);
            }
            match self.blob.put(key, bytes) {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() => last = Some(err),
                Err(err) => return Err(err),
            }
        }
        Err(last.unwrap_or_else(|| StoreError::Backend("retries exhausted".to_string())))
    }

    fn encode(document: &GraphDocument) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec_pretty(document).map_err(|err| StoreError::Serialization(err.to_string()))
    }

    /// Loads the document for `owner` along with its revision token.
    ///
    /// A missing blob yields an empty document and [`Revision::NONE`];
    /// absence is never an error.
    ///
    /// # Errors
    /// Transient backend failures after retries, or a blob that does not
    /// decode as a graph document.
    pub fn load(&self, owner: &str) -> GraphResult<(GraphDocument, Revision)> {
        match self.get_with_retry(owner)? {
            None => Ok((GraphDocument::new(), Revision::NONE)),
            Some(bytes) => {
                let document: GraphDocument = serde_json::from_slice(&bytes)
                    .map_err(|err| StoreError::Serialization(err.to_string()))?;
                Ok((document, Revision::of(&bytes)))
            }
        }
    }

    /// Overwrites the document for `owner` unconditionally.
    ///
    /// # Errors
    /// Transient backend failures after retries.
    pub fn save(&self, owner: &str, document: &GraphDocument) -> GraphResult<Revision> {
        let bytes = Self::encode(document)?;
        self.put_with_retry(owner, &bytes)?;
        Ok(Revision::of(&bytes))
    }

    /// Saves only if the stored revision still equals `expected`.
    ///
    /// # Errors
    /// `StoreError::RevisionMismatch` when another writer got there
    /// first; the caller should reload and retry the whole cycle.
    pub fn save_if(
        &self,
        owner: &str,
        document: &GraphDocument,
        expected: &Revision,
    ) -> GraphResult<Revision> {
        let current = match self.get_with_retry(owner)? {
            None => Revision::NONE,
            Some(bytes) => Revision::of(&bytes),
        };
        if current != *expected {
            return Err(StoreError::RevisionMismatch {
                key: owner.to_string(),
            }
            .into());
        }
        self.save(owner, document)
    }
}

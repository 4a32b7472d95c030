//! Error types for kbgraph.
//!
//! All errors are strongly typed using thiserror. Validation failures are
//! returned to the immediate caller and never retried; only storage-layer
//! transients are eligible for retry.

use thiserror::Error;

use crate::graph::EntityId;
use crate::storage::StoreError;

/// Top-level error type for graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A referenced entity is absent from the graph.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// No relationship matches the given (source, label, target) triple.
    #[error("relationship not found: {source_id} -[{label}]-> {target_id}")]
    RelationshipNotFound {
        /// Source endpoint of the missing triple.
        source_id: EntityId,
        /// Relationship label of the missing triple.
        label: String,
        /// Target endpoint of the missing triple.
        target_id: EntityId,
    },

    /// A name collides with an existing, distinct entity on an
    /// identity-creating operation.
    #[error("name '{name}' already belongs to entity {existing}")]
    DuplicateName {
        /// The colliding name.
        name: String,
        /// The entity that already owns the name.
        existing: EntityId,
    },

    /// The operation would violate a data-model invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Malformed input, such as an empty name list on creation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The blob store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GraphError {
    /// Returns true if retrying the whole load-mutate-save cycle may succeed.
    ///
    /// Logical precondition failures are never retryable; only transient
    /// storage errors are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Returns true if this is a validation error (a logical precondition
    /// failure rather than a storage fault).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

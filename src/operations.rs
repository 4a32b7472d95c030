//! Input and report shapes for the engine's mutation operations.
//!
//! Bulk operations use partial-success semantics: unresolvable elements
//! are skipped and reported, and the call still succeeds unless its input
//! was malformed. The reports say exactly what happened.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::EntityId;

/// One element of a bulk upsert batch.
///
/// With `entity_id` set this is an update: names merge, properties
/// overwrite key-wise, relationships append. Without it this is a create,
/// subject to the same exact-duplicate check as single-entity creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityUpsert {
    /// Existing identifier for the update path; `None` creates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<EntityId>,

    /// Primary name followed by synonyms. Must be non-empty.
    pub entity_names: Vec<String>,

    /// Properties to merge in; existing keys are overwritten.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    /// Relationships from this entity, targets given by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipDraft>,
}

/// A relationship whose target is still a name, not an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDraft {
    /// Free-text relationship label.
    pub relationship: String,

    /// Name of the target entity, resolved exactly against the graph
    /// plus the rest of the batch.
    pub target_entity: String,
}

/// What to do with a bulk-upsert relationship whose target name resolves
/// to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedTargetPolicy {
    /// Skip the relationship and record it in the report.
    #[default]
    Drop,
    /// Fail the whole batch with `EntityNotFound`.
    Fail,
}

/// Result of adding a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipOutcome {
    /// The triple was appended.
    Added,
    /// An identical triple already existed; nothing changed.
    AlreadyPresent,
}

/// Report for a bulk upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertReport {
    /// Identifiers of entities created by this batch, in batch order.
    pub created: Vec<EntityId>,

    /// Identifiers of entities updated by this batch, in batch order.
    pub updated: Vec<EntityId>,

    /// Relationship drafts dropped because their target did not resolve.
    pub dropped: Vec<RelationshipDraft>,
}

/// Exact-name identifier for a relationship in a bulk removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipIdentifier {
    /// Name of the source entity.
    pub source_entity: String,

    /// Free-text relationship label.
    pub relationship: String,

    /// Name of the target entity.
    pub target_entity: String,
}

impl fmt::Display for RelationshipIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}]-> {}",
            self.source_entity, self.relationship, self.target_entity
        )
    }
}

/// Report for a bulk removal of entities or relationships.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalReport {
    /// Entities removed, with cascade.
    pub removed_entities: Vec<EntityId>,

    /// Number of relationship records removed.
    pub removed_relationships: usize,

    /// Identifiers that resolved to nothing and were skipped.
    pub unmatched: Vec<String>,
}

impl RemovalReport {
    /// Returns true if nothing in the batch resolved, so the document was
    /// left untouched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed_entities.is_empty() && self.removed_relationships == 0
    }
}

//! Entity types and identity management.
//!
//! Stable entity identifiers are the anchor for everything else: the
//! resolver maps names onto them, relationships reference them, and
//! reconciliation re-issues them for freshly extracted facts.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{GraphError, GraphResult};

/// Globally unique, stable entity identifier.
///
/// Freshly generated identifiers are UUIDv4 strings, but the type wraps an
/// arbitrary string so documents written by other producers load unchanged.
/// Identifiers are immutable once assigned and never reused.
///
/// `Ord` is derived so collections of ids iterate in ascending string
/// order; the resolver relies on that for deterministic tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A named thing in the graph.
///
/// `entity_names` is a non-empty ordered list: index 0 is the primary
/// name, the rest are synonyms. The data model does not enforce name
/// uniqueness across entities; resolution policy at the operations layer
/// is what prevents accidental duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique identifier, assigned by the engine.
    pub entity_id: EntityId,

    /// Primary name followed by synonyms. Never empty.
    pub entity_names: Vec<String>,

    /// Arbitrary key-value properties. Unknown keys pass through unchanged.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl Entity {
    /// Creates a new entity with a freshly generated identifier.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `names` is empty or contains a blank name.
    pub fn new(names: Vec<String>) -> GraphResult<Self> {
        Self::with_id(EntityId::generate(), names)
    }

    /// Creates an entity with a specific identifier.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `names` is empty or contains a blank name.
    pub fn with_id(entity_id: EntityId, names: Vec<String>) -> GraphResult<Self> {
        validate_names(&names)?;
        Ok(Self {
            entity_id,
            entity_names: names,
            properties: Map::new(),
        })
    }

    /// Returns the primary name (index 0).
    #[must_use]
    pub fn primary_name(&self) -> &str {
        &self.entity_names[0]
    }

    /// Returns true if any of this entity's names equals `name`
    /// case-insensitively.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.entity_names.iter().any(|n| names_equal(n, name))
    }

    /// Appends a name unless a case-insensitive duplicate is already
    /// present. Returns true if the name was added.
    pub fn add_name(&mut self, name: &str) -> bool {
        if self.has_name(name) {
            return false;
        }
        self.entity_names.push(name.to_string());
        true
    }
}

/// Case-insensitive name comparison used everywhere names are matched.
pub(crate) fn names_equal(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Validates an entity name list: non-empty, no blank names.
pub(crate) fn validate_names(names: &[String]) -> GraphResult<()> {
    if names.is_empty() {
        return Err(GraphError::InvalidInput(
            "entity must have at least one name".to_string(),
        ));
    }
    if let Some(blank) = names.iter().find(|n| n.trim().is_empty()) {
        return Err(GraphError::InvalidInput(format!(
            "entity name cannot be blank (got {blank:?})"
        )));
    }
    Ok(())
}

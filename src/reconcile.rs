//! Local-graph reconciliation.
//!
//! A local graph holds freshly extracted facts whose entities carry no
//! assigned identities, only caller-chosen placeholder keys. Reconciling
//! merges it against a previously fetched neighborhood with a local-wins
//! conflict policy, re-identifies everything with fresh ids, and replaces
//! exactly the neighborhood's footprint in the persisted document.
//!
//! The unresolved and resolved record shapes are deliberately distinct
//! types; an entity either has an identity or it does not.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GraphError, GraphResult};
use crate::graph::{names_equal, Entity, EntityId, GraphDocument, Relationship};

/// An entity that has not yet been assigned an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEntity {
    /// Placeholder key, unique within the local graph. Never persisted.
    pub key: String,

    /// Primary name followed by synonyms. Must be non-empty.
    pub entity_names: Vec<String>,

    /// Properties carried by the new fact.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl LocalEntity {
    /// Creates a local entity keyed by its primary name.
    #[must_use]
    pub fn named(names: Vec<String>) -> Self {
        let key = names.first().cloned().unwrap_or_default();
        Self {
            key,
            entity_names: names,
            properties: Map::new(),
        }
    }
}

/// A relationship between local keys.
///
/// A key that matches no local entity passes through re-identification
/// verbatim, so a local edge may point at an entity that already exists
/// elsewhere in the persisted graph. A key that matches nothing in the
/// persisted graph either is dropped at insertion, never stored as a
/// dangling edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRelationship {
    /// Key of the source entity.
    pub source: String,

    /// Key of the target entity.
    pub target: String,

    /// Free-text relationship label.
    pub relationship: String,
}

/// A small graph of newly extracted, not-yet-identified facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalGraph {
    /// Entities without identities.
    #[serde(default)]
    pub entities: Vec<LocalEntity>,

    /// Relationships between local keys.
    #[serde(default)]
    pub relationships: Vec<LocalRelationship>,
}

impl LocalGraph {
    /// Returns true if the graph holds no entities and no relationships.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

/// Result of a reconciliation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The local graph was empty; nothing was written. Writing an empty
    /// update would silently delete the whole neighborhood.
    Skipped,

    /// The merged graph replaced the neighborhood footprint.
    Stored {
        /// Entities written.
        entities: usize,
        /// Relationships written.
        relationships: usize,
    },
}

/// Merges a neighborhood into a local graph with local-wins conflict
/// resolution.
///
/// Each local entity claims the first neighborhood entity (ascending id)
/// whose name set intersects its own case-insensitively. A claimed
/// entity keeps the local name order, with neighborhood-only names
/// appended, and neighborhood properties overridden key-wise by local
/// ones. Unclaimed neighborhood entities and their relationships carry
/// through unchanged, keyed by their old id.
#[must_use]
pub fn merge_local(neighborhood: &GraphDocument, local: &LocalGraph) -> LocalGraph {
    let mut merged = LocalGraph::default();
    // Old neighborhood id -> merged key, for rewriting carried-over edges.
    let mut alias: HashMap<String, String> = HashMap::new();
    let mut claimed: HashSet<&EntityId> = HashSet::new();

    for local_entity in &local.entities {
        let mut out = local_entity.clone();
        let claim = neighborhood.entities.iter().find(|(id, existing)| {
            !claimed.contains(id) && names_intersect(&out.entity_names, &existing.entity_names)
        });
        if let Some((id, existing)) = claim {
            claimed.insert(id);
            alias.insert(id.to_string(), out.key.clone());
            for name in &existing.entity_names {
                if !out.entity_names.iter().any(|n| names_equal(n, name)) {
                    out.entity_names.push(name.clone());
                }
            }
            let mut properties = existing.properties.clone();
            for (key, value) in &out.properties {
                properties.insert(key.clone(), value.clone());
            }
            out.properties = properties;
        }
        merged.entities.push(out);
    }

    for (id, existing) in &neighborhood.entities {
        if !claimed.contains(id) {
            merged.entities.push(LocalEntity {
                key: id.to_string(),
                entity_names: existing.entity_names.clone(),
                properties: existing.properties.clone(),
            });
        }
    }

    for rel in &neighborhood.relationships {
        let source = remap(&alias, rel.source_entity_id.as_str());
        let target = remap(&alias, rel.target_entity_id.as_str());
        push_unique(
            &mut merged.relationships,
            LocalRelationship {
                source,
                target,
                relationship: rel.relationship.clone(),
            },
        );
    }
    for rel in &local.relationships {
        push_unique(&mut merged.relationships, rel.clone());
    }

    merged
}

/// Assigns a fresh identifier to every local entity and rewrites every
/// relationship endpoint through the key-to-id table.
///
/// Keys absent from the table pass through as literal entity ids.
///
/// # Errors
/// Returns `InvalidInput` on duplicate local keys or an entity with no
/// names.
pub(crate) fn reidentify(graph: &LocalGraph) -> GraphResult<GraphDocument> {
    let mut ids: HashMap<&str, EntityId> = HashMap::new();
    let mut out = GraphDocument::new();

    for local_entity in &graph.entities {
        let id = EntityId::generate();
        if ids.insert(local_entity.key.as_str(), id.clone()).is_some() {
            return Err(GraphError::InvalidInput(format!(
                "duplicate local entity key '{}'",
                local_entity.key
            )));
        }
        let mut entity = Entity::with_id(id, local_entity.entity_names.clone())?;
        entity.properties = local_entity.properties.clone();
        out.insert_entity(entity);
    }

    for rel in &graph.relationships {
        let source = ids
            .get(rel.source.as_str())
            .cloned()
            .unwrap_or_else(|| EntityId::from(rel.source.as_str()));
        let target = ids
            .get(rel.target.as_str())
            .cloned()
            .unwrap_or_else(|| EntityId::from(rel.target.as_str()));
        out.relationships
            .push(Relationship::new(source, rel.relationship.clone(), target));
    }

    Ok(out)
}

/// Excises the snapshot's footprint from the full document and inserts
/// the replacement, returning the number of relationships inserted.
///
/// Entities are excised by snapshot id; relationships by snapshot
/// (source, target) endpoint pair, ignoring the label. Everything outside
/// the snapshot footprint is left untouched. Replacement relationships
/// whose endpoints exist neither in the replacement nor in the surviving
/// document are dropped, so a stray placeholder key never persists as a
/// dangling edge.
pub(crate) fn excise_and_insert(
    full: &mut GraphDocument,
    snapshot: &GraphDocument,
    replacement: GraphDocument,
) -> usize {
    full.entities
        .retain(|id, _| !snapshot.entities.contains_key(id));

    let snapshot_pairs: HashSet<(&EntityId, &EntityId)> = snapshot
        .relationships
        .iter()
        .map(|rel| (&rel.source_entity_id, &rel.target_entity_id))
        .collect();
    full.relationships
        .retain(|rel| !snapshot_pairs.contains(&(&rel.source_entity_id, &rel.target_entity_id)));

    full.entities.extend(replacement.entities);
    let mut inserted = 0;
    for rel in replacement.relationships {
        if full.entities.contains_key(&rel.source_entity_id)
            && full.entities.contains_key(&rel.target_entity_id)
        {
            full.relationships.push(rel);
            inserted += 1;
        }
    }
    inserted
}

fn names_intersect(a: &[String], b: &[String]) -> bool {
    a.iter().any(|name| b.iter().any(|other| names_equal(name, other)))
}

fn remap(alias: &HashMap<String, String>, id: &str) -> String {
    alias.get(id).cloned().unwrap_or_else(|| id.to_string())
}

fn push_unique(rels: &mut Vec<LocalRelationship>, rel: LocalRelationship) {
    let duplicate = rels.iter().any(|existing| {
        existing.source == rel.source
            && existing.target == rel.target
            && names_equal(&existing.relationship, &rel.relationship)
    });
    if !duplicate {
        rels.push(rel);
    }
}

//! Relationships and the graph-document envelope.
//!
//! A `GraphDocument` is the unit of persistence: the whole document is
//! read and rewritten on every mutating operation. The serialized shape
//! (`entities` keyed by id, `relationships` as an array) is the stable
//! interchange format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::{names_equal, Entity, EntityId};

/// A directed, labeled edge between two entities.
///
/// Multiple relationships may exist between the same ordered pair with
/// different labels. An edge is uniquely identified by the
/// (source, target, label) triple under case-insensitive label comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Identifier of the source entity.
    pub source_entity_id: EntityId,

    /// Identifier of the target entity.
    pub target_entity_id: EntityId,

    /// Free-text relationship label.
    pub relationship: String,
}

impl Relationship {
    /// Creates a relationship from source to target with the given label.
    #[must_use]
    pub fn new(source: EntityId, label: impl Into<String>, target: EntityId) -> Self {
        Self {
            source_entity_id: source,
            target_entity_id: target,
            relationship: label.into(),
        }
    }

    /// Returns true if this edge matches the given triple, comparing the
    /// label case-insensitively.
    #[must_use]
    pub fn is_triple(&self, source: &EntityId, label: &str, target: &EntityId) -> bool {
        self.source_entity_id == *source
            && self.target_entity_id == *target
            && names_equal(&self.relationship, label)
    }

    /// Returns true if either endpoint is the given entity.
    #[must_use]
    pub fn touches(&self, id: &EntityId) -> bool {
        self.source_entity_id == *id || self.target_entity_id == *id
    }
}

/// The persisted graph document: all entities and relationships for one
/// owner key.
///
/// Entities are kept in a `BTreeMap` so iteration is always in ascending
/// id order; the resolver's deterministic tie-break rule depends on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Entities keyed by their identifier.
    #[serde(default)]
    pub entities: BTreeMap<EntityId, Entity>,

    /// Directed labeled edges. Order carries no meaning.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl GraphDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the document holds no entities and no relationships.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Inserts an entity keyed by its own identifier, replacing any
    /// previous record under that id.
    pub fn insert_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.entity_id.clone(), entity);
    }

    /// Looks up an entity by id.
    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Looks up an entity by id for mutation.
    pub fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Returns true if an entity with the given id exists.
    #[must_use]
    pub fn contains_entity(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Removes an entity and every relationship touching it.
    ///
    /// Dangling-reference repair is an explicit rewrite of the
    /// relationship list, covering self-loops and multi-edges.
    pub fn remove_entity_cascade(&mut self, id: &EntityId) -> Option<Entity> {
        let removed = self.entities.remove(id)?;
        self.relationships.retain(|rel| !rel.touches(id));
        Some(removed)
    }

    /// Returns true if a relationship matching the triple exists
    /// (case-insensitive label).
    #[must_use]
    pub fn relationship_exists(&self, source: &EntityId, label: &str, target: &EntityId) -> bool {
        self.relationships
            .iter()
            .any(|rel| rel.is_triple(source, label, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> GraphDocument {
        let mut doc = GraphDocument::new();
        doc.insert_entity(
            Entity::with_id(
                EntityId::from("123"),
                vec!["Apple".to_string(), "AAPL".to_string()],
            )
            .unwrap(),
        );
        doc.insert_entity(
            Entity::with_id(
                EntityId::from("456"),
                vec!["Google".to_string(), "GOOG".to_string()],
            )
            .unwrap(),
        );
        doc.relationships.push(Relationship::new(
            EntityId::from("123"),
            "is a competitor of",
            EntityId::from("456"),
        ));
        doc
    }

    #[test]
    fn test_document_deserializes_interchange_shape() {
        let raw = r#"{
            "entities": {
                "123": {"entity_id": "123", "entity_names": ["Apple", "AAPL"]},
                "456": {"entity_id": "456", "entity_names": ["Google", "GOOG"]}
            },
            "relationships": [
                {"source_entity_id": "123", "target_entity_id": "456", "relationship": "is a competitor of"}
            ]
        }"#;
        let doc: GraphDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.entities.len(), 2);
        assert_eq!(doc.relationships.len(), 1);
        assert_eq!(
            doc.entity(&EntityId::from("123")).unwrap().primary_name(),
            "Apple"
        );
    }

    #[test]
    fn test_missing_relationships_field_defaults_to_empty() {
        let doc: GraphDocument = serde_json::from_str(r#"{"entities": {}}"#).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_triple_match_is_label_case_insensitive() {
        let doc = sample_document();
        assert!(doc.relationship_exists(
            &EntityId::from("123"),
            "IS A COMPETITOR OF",
            &EntityId::from("456"),
        ));
        assert!(!doc.relationship_exists(
            &EntityId::from("456"),
            "is a competitor of",
            &EntityId::from("123"),
        ));
    }

    #[test]
    fn test_cascade_removes_self_loops_and_multi_edges() {
        let mut doc = sample_document();
        let apple = EntityId::from("123");
        let google = EntityId::from("456");
        doc.relationships
            .push(Relationship::new(apple.clone(), "acquired", apple.clone()));
        doc.relationships.push(Relationship::new(
            google.clone(),
            "competes with",
            apple.clone(),
        ));

        doc.remove_entity_cascade(&apple).unwrap();

        assert!(!doc.contains_entity(&apple));
        assert!(doc.relationships.is_empty());
        assert!(doc.contains_entity(&google));
    }

    #[test]
    fn test_cascade_on_missing_entity_is_none() {
        let mut doc = sample_document();
        assert!(doc.remove_entity_cascade(&EntityId::from("999")).is_none());
        assert_eq!(doc.relationships.len(), 1);
    }

    #[test]
    fn test_entities_iterate_in_ascending_id_order() {
        let mut doc = GraphDocument::new();
        for id in ["c", "a", "b"] {
            doc.insert_entity(
                Entity::with_id(EntityId::from(id), vec![id.to_uppercase()]).unwrap(),
            );
        }
        let order: Vec<&str> = doc.entities.keys().map(EntityId::as_str).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}

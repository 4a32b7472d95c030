//! End-to-end scenarios against the public engine surface.
//!
//! These walk the same flows an external reasoning process would:
//! direct mutations when identities are known, and
//! fetch-neighborhood / reconcile when new facts arrive as text.

use std::sync::Arc;

use kbgraph::{
    EntityId, FsBlobStore, GraphEngine, GraphError, InMemoryBlobStore, LocalEntity, LocalGraph,
    LocalRelationship, ReconcileOutcome, RelationshipOutcome,
};

fn engine() -> GraphEngine {
    GraphEngine::new(Arc::new(InMemoryBlobStore::new()))
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[test]
fn bluebird_duplicate_creation() {
    let engine = engine();

    let id = engine
        .add_entity("alice", &names(&["Bluebird", "Project BB"]))
        .unwrap();
    assert!(!id.as_str().is_empty());

    let err = engine
        .add_entity("alice", &names(&["Project BB"]))
        .unwrap_err();
    match err {
        GraphError::DuplicateName { name, existing } => {
            assert_eq!(name, "Project BB");
            assert_eq!(existing, id);
        }
        other => panic!("expected DuplicateName, got {other:?}"),
    }
}

#[test]
fn competitor_relationship_lifecycle() {
    let engine = engine();
    let apple = engine.add_entity("alice", &names(&["Apple", "AAPL"])).unwrap();
    let google = engine
        .add_entity("alice", &names(&["Google", "GOOG"]))
        .unwrap();

    let outcome = engine
        .add_relationship("alice", &apple, "is a competitor of", &google)
        .unwrap();
    assert_eq!(outcome, RelationshipOutcome::Added);

    engine
        .remove_relationship("alice", &apple, "is a competitor of", &google)
        .unwrap();
    assert!(engine.graph("alice").unwrap().relationships.is_empty());

    let err = engine
        .remove_relationship("alice", &apple, "is a competitor of", &google)
        .unwrap_err();
    assert!(matches!(err, GraphError::RelationshipNotFound { .. }));
}

#[test]
fn neighborhood_includes_one_hop_neighbors() {
    let engine = engine();
    let apple = engine.add_entity("alice", &names(&["Apple", "AAPL"])).unwrap();
    let google = engine
        .add_entity("alice", &names(&["Google", "GOOG"]))
        .unwrap();
    engine
        .add_relationship("alice", &apple, "is a competitor of", &google)
        .unwrap();

    let neighborhood = engine
        .fetch_neighborhood("alice", &names(&["Apple"]))
        .unwrap();
    assert!(neighborhood.entities.contains_key(&apple));
    assert!(neighborhood.entities.contains_key(&google));
    assert_eq!(neighborhood.relationships.len(), 1);
}

#[test]
fn neighborhood_traversal_is_direction_symmetric() {
    let engine = engine();
    let apple = engine.add_entity("alice", &names(&["Apple"])).unwrap();
    let google = engine.add_entity("alice", &names(&["Google"])).unwrap();
    // Edge points from Google to Apple; seeding on Apple must still find it.
    engine
        .add_relationship("alice", &google, "competes with", &apple)
        .unwrap();

    let neighborhood = engine
        .fetch_neighborhood("alice", &names(&["Apple"]))
        .unwrap();
    assert!(neighborhood.entities.contains_key(&google));
}

#[test]
fn reconcile_empty_local_graph_is_a_no_op() {
    let engine = engine();
    let apple = engine.add_entity("alice", &names(&["Apple"])).unwrap();
    let google = engine.add_entity("alice", &names(&["Google"])).unwrap();
    engine
        .add_relationship("alice", &apple, "competes with", &google)
        .unwrap();

    let snapshot = engine
        .fetch_neighborhood("alice", &names(&["Apple"]))
        .unwrap();
    let before = engine.store().load("alice").unwrap();

    let outcome = engine
        .reconcile("alice", &snapshot, &LocalGraph::default())
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Skipped);

    // Byte-for-byte unchanged: same revision token.
    let after = engine.store().load("alice").unwrap();
    assert_eq!(before.1, after.1);
    assert_eq!(before.0, after.0);
}

#[test]
fn reconcile_replaces_neighborhood_footprint() {
    let engine = engine();
    let apple = engine.add_entity("alice", &names(&["Apple"])).unwrap();
    let google = engine.add_entity("alice", &names(&["Google"])).unwrap();
    engine
        .add_relationship("alice", &apple, "competes with", &google)
        .unwrap();

    let snapshot = engine
        .fetch_neighborhood("alice", &names(&["Apple"]))
        .unwrap();

    let mut new_apple = LocalEntity::named(names(&["Apple", "Apple Inc."]));
    new_apple
        .properties
        .insert("ticker".to_string(), serde_json::Value::from("AAPL"));
    let local = LocalGraph {
        entities: vec![new_apple, LocalEntity::named(names(&["Tim Cook"]))],
        relationships: vec![LocalRelationship {
            source: "Tim Cook".to_string(),
            target: "Apple".to_string(),
            relationship: "is CEO of".to_string(),
        }],
    };

    let outcome = engine.reconcile("alice", &snapshot, &local).unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Stored { entities: 3, .. }));

    let doc = engine.graph("alice").unwrap();
    // Old identities are gone; the merged records carry fresh ones.
    assert!(!doc.contains_entity(&apple));
    assert!(!doc.contains_entity(&google));
    assert_eq!(doc.entities.len(), 3);

    let new_apple_id = engine.entity_id("alice", "Apple Inc.").unwrap();
    let apple_entity = doc.entity(&new_apple_id).unwrap();
    assert!(apple_entity.has_name("Apple"));
    assert_eq!(apple_entity.properties["ticker"], "AAPL");

    let ceo = engine.entity_id("alice", "Tim Cook").unwrap();
    assert!(doc
        .relationships
        .iter()
        .any(|rel| rel.source_entity_id == ceo && rel.target_entity_id == new_apple_id));
    // The untouched Google record survived the merge under a fresh id.
    assert!(engine.entity_id("alice", "Google").is_ok());
}

#[test]
fn reconcile_never_excises_outside_the_snapshot() {
    let engine = engine();
    // Two disconnected Apple-ish entities; only one is in the snapshot.
    let orchard = engine
        .add_entity("alice", &names(&["Apple Orchard"]))
        .unwrap();
    let apple = engine.add_entity("alice", &names(&["Apple"])).unwrap();

    let snapshot = engine
        .entity_neighborhood("alice", "Apple")
        .unwrap();
    assert!(!snapshot.entities.contains_key(&orchard));

    let local = LocalGraph {
        entities: vec![LocalEntity::named(names(&["Apple", "Apple Computer"]))],
        relationships: vec![],
    };
    engine.reconcile("alice", &snapshot, &local).unwrap();

    let doc = engine.graph("alice").unwrap();
    // The fuzzy-similar entity outside the snapshot is untouched.
    assert!(doc.contains_entity(&orchard));
    assert!(!doc.contains_entity(&apple));
}

#[test]
fn reconcile_drops_edges_to_unknown_placeholders() {
    let engine = engine();
    engine.add_entity("alice", &names(&["Apple"])).unwrap();
    let snapshot = engine.entity_neighborhood("alice", "Apple").unwrap();

    let local = LocalGraph {
        entities: vec![LocalEntity::named(names(&["Apple"]))],
        relationships: vec![LocalRelationship {
            source: "Apple".to_string(),
            target: "Narnia".to_string(),
            relationship: "is located in".to_string(),
        }],
    };
    let outcome = engine.reconcile("alice", &snapshot, &local).unwrap();
    assert!(matches!(
        outcome,
        ReconcileOutcome::Stored {
            entities: 1,
            relationships: 0,
        }
    ));

    // No edge to a phantom endpoint was persisted.
    let doc = engine.graph("alice").unwrap();
    assert!(doc.relationships.is_empty());
}

#[test]
fn reconcile_keeps_edges_to_existing_outside_ids() {
    let engine = engine();
    let orchard = engine
        .add_entity("alice", &names(&["Apple Orchard"]))
        .unwrap();
    engine.add_entity("alice", &names(&["Apple"])).unwrap();
    let snapshot = engine.entity_neighborhood("alice", "Apple").unwrap();

    // The local edge names a real persisted id outside the snapshot.
    let local = LocalGraph {
        entities: vec![LocalEntity::named(names(&["Apple"]))],
        relationships: vec![LocalRelationship {
            source: "Apple".to_string(),
            target: orchard.to_string(),
            relationship: "buys from".to_string(),
        }],
    };
    let outcome = engine.reconcile("alice", &snapshot, &local).unwrap();
    assert!(matches!(
        outcome,
        ReconcileOutcome::Stored {
            entities: 1,
            relationships: 1,
        }
    ));

    let doc = engine.graph("alice").unwrap();
    assert!(doc
        .relationships
        .iter()
        .any(|rel| rel.target_entity_id == orchard));
}

#[test]
fn entity_neighborhood_requires_existing_entity() {
    let engine = engine();
    engine.add_entity("alice", &names(&["Apple"])).unwrap();
    let err = engine.entity_neighborhood("alice", "Microsoft").unwrap_err();
    assert!(matches!(err, GraphError::EntityNotFound(name) if name == "Microsoft"));
}

#[test]
fn deleting_by_resolved_id_cleans_up_edges() {
    let engine = engine();
    let apple = engine.add_entity("alice", &names(&["Apple", "AAPL"])).unwrap();
    let google = engine.add_entity("alice", &names(&["Google"])).unwrap();
    engine
        .add_relationship("alice", &apple, "competes with", &google)
        .unwrap();

    let resolved = engine.entity_id("alice", "AAPL").unwrap();
    engine.delete_entity("alice", &resolved).unwrap();

    let doc = engine.graph("alice").unwrap();
    assert!(!doc.contains_entity(&apple));
    assert!(doc.relationships.is_empty());

    let err = engine.delete_entity("alice", &apple).unwrap_err();
    assert!(matches!(err, GraphError::EntityNotFound(_)));
}

#[test]
fn file_backed_engine_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();

    let apple = {
        let engine = GraphEngine::new(Arc::new(FsBlobStore::new(dir.path()).unwrap()));
        engine.add_entity("alice", &names(&["Apple", "AAPL"])).unwrap()
    };

    let engine = GraphEngine::new(Arc::new(FsBlobStore::new(dir.path()).unwrap()));
    assert_eq!(engine.entity_id("alice", "Apple").unwrap(), apple);
    assert_eq!(engine.entity_id("alice", "aapl").unwrap(), apple);
}

#[test]
fn unknown_entity_ids_stay_unknown() {
    let engine = engine();
    engine.add_entity("alice", &names(&["Apple"])).unwrap();
    let err = engine
        .delete_entity("alice", &EntityId::from("no-such-id"))
        .unwrap_err();
    assert!(matches!(err, GraphError::EntityNotFound(_)));
}

//! # kbgraph - Knowledge Graph Store & Reconciliation Engine
//!
//! kbgraph maintains a persistent, per-owner knowledge graph of named
//! entities and labeled directed relationships, and provides the
//! operations an external reasoning process needs to keep that graph
//! current: resolving fuzzy or exact name references to entity
//! identities, retrieving a bounded neighborhood subgraph relevant to a
//! set of mentioned names, and reconciling a small locally extracted
//! graph of new facts into the larger persisted graph without losing
//! unrelated existing knowledge.
//!
//! ## Core Concepts
//!
//! - **Entity**: a named thing with a generated id, a primary name,
//!   synonyms, and arbitrary properties
//! - **Relationship**: a directed, labeled edge; multiple labels may
//!   connect the same pair
//! - **Neighborhood**: the induced subgraph within two undirected hops of
//!   a fuzzily matched seed set
//! - **Local graph**: newly extracted, not-yet-identified facts pending
//!   reconciliation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kbgraph::{GraphEngine, InMemoryBlobStore, LocalEntity, LocalGraph};
//!
//! let engine = GraphEngine::new(Arc::new(InMemoryBlobStore::new()));
//!
//! // Direct mutations when identities are known.
//! let apple = engine.add_entity("alice", &["Apple".into(), "AAPL".into()])?;
//! let google = engine.add_entity("alice", &["Google".into()])?;
//! engine.add_relationship("alice", &apple, "is a competitor of", &google)?;
//!
//! // Snapshot-then-reconcile when facts arrive as text.
//! let snapshot = engine.fetch_neighborhood("alice", &["Apple".into()])?;
//! let local = LocalGraph {
//!     entities: vec![LocalEntity::named(vec!["Apple".into(), "Apple Inc.".into()])],
//!     relationships: vec![],
//! };
//! engine.reconcile("alice", &snapshot, &local)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod error;
pub mod graph;
pub mod neighborhood;
pub mod operations;
pub mod reconcile;
pub mod resolve;
pub mod storage;
pub mod store;

// Re-export primary types at crate root for convenience
pub use engine::GraphEngine;
pub use error::{GraphError, GraphResult};
pub use graph::{Entity, EntityId, GraphDocument, Relationship};
pub use operations::{
    EntityUpsert, RelationshipDraft, RelationshipIdentifier, RelationshipOutcome, RemovalReport,
    UnresolvedTargetPolicy, UpsertReport,
};
pub use reconcile::{LocalEntity, LocalGraph, LocalRelationship, ReconcileOutcome};
pub use storage::{BlobStore, FsBlobStore, InMemoryBlobStore, StoreError};
pub use store::{GraphStore, RetryPolicy, Revision};

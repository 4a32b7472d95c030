//! The graph engine: every public operation, keyed by owner.
//!
//! Each mutating operation is one load-validate-mutate-save cycle. The
//! save is guarded by the revision token taken at load, and the whole
//! cycle retries on a revision mismatch, so concurrent writers against
//! the same owner cannot silently clobber each other. Operations against
//! different owners share no mutable state.

use std::sync::Arc;

use crate::error::{GraphError, GraphResult};
use crate::graph::{names_equal, validate_names, Entity, EntityId, GraphDocument, Relationship};
use crate::neighborhood;
use crate::operations::{
    EntityUpsert, RelationshipIdentifier, RelationshipOutcome, RemovalReport,
    UnresolvedTargetPolicy, UpsertReport,
};
use crate::reconcile::{self, LocalGraph, ReconcileOutcome};
use crate::resolve;
use crate::storage::{BlobStore, StoreError};
use crate::store::GraphStore;

/// Persistent, per-owner knowledge graph engine.
///
/// # Example
/// ```rust,ignore
/// use std::sync::Arc;
/// use kbgraph::{GraphEngine, InMemoryBlobStore};
///
/// let engine = GraphEngine::new(Arc::new(InMemoryBlobStore::new()));
/// let id = engine.add_entity("alice", &["Bluebird".into(), "Project BB".into()])?;
/// let neighborhood = engine.fetch_neighborhood("alice", &["Bluebird".into()])?;
/// ```
pub struct GraphEngine {
    store: GraphStore,
}

impl GraphEngine {
    /// Creates an engine over the given blob collaborator.
    #[must_use]
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self {
            store: GraphStore::new(blob),
        }
    }

    /// Creates an engine over a pre-configured store adapter.
    #[must_use]
    pub const fn with_store(store: GraphStore) -> Self {
        Self { store }
    }

    /// Returns the underlying store adapter.
    #[must_use]
    pub const fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Runs one optimistic load-mutate-save cycle for `owner`.
    ///
    /// The closure returns the operation result plus a dirty flag; a
    /// clean result skips the save entirely. Revision mismatches reload
    /// and rerun the closure, bounded by the store's retry policy.
    /// Validation errors abort without writing.
    fn mutate<T>(
        &self,
        owner: &str,
        mut op: impl FnMut(&mut GraphDocument) -> GraphResult<(T, bool)>,
    ) -> GraphResult<T> {
        let attempts = self.store.retry().attempts.max(1);
        let mut last: Option<GraphError> = None;
        for _ in 0..attempts {
            let (mut doc, revision) = self.store.load(owner)?;
            let (value, dirty) = op(&mut doc)?;
            if !dirty {
                return Ok(value);
            }
            match self.store.save_if(owner, &doc, &revision) {
                Ok(_) => return Ok(value),
                Err(err @ GraphError::Store(StoreError::RevisionMismatch { .. })) => {
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last.unwrap_or_else(|| {
            GraphError::Store(StoreError::Backend(
                "mutation retries exhausted".to_string(),
            ))
        }))
    }

    /// Loads the full graph document for `owner`.
    ///
    /// # Errors
    /// Storage failures only; a missing document loads as empty.
    pub fn graph(&self, owner: &str) -> GraphResult<GraphDocument> {
        Ok(self.store.load(owner)?.0)
    }

    /// Resolves a name to an entity id by exact (case-insensitive) match.
    ///
    /// # Errors
    /// `EntityNotFound` if no entity carries the name.
    pub fn entity_id(&self, owner: &str, name: &str) -> GraphResult<EntityId> {
        let (doc, _) = self.store.load(owner)?;
        resolve::find_exact_match(name, &doc)
            .ok_or_else(|| GraphError::EntityNotFound(name.to_string()))
    }

    /// Fetches the two-hop neighborhood for a set of mentioned names.
    ///
    /// The returned document doubles as the snapshot for a later
    /// [`GraphEngine::reconcile`] call.
    ///
    /// # Errors
    /// Storage failures only; unmatched names simply contribute nothing.
    pub fn fetch_neighborhood(&self, owner: &str, names: &[String]) -> GraphResult<GraphDocument> {
        let (doc, _) = self.store.load(owner)?;
        Ok(neighborhood::extract(&doc, names))
    }

    /// Fetches the two-hop neighborhood around one exactly-named entity.
    ///
    /// # Errors
    /// `EntityNotFound` if the name does not exact-match.
    pub fn entity_neighborhood(&self, owner: &str, name: &str) -> GraphResult<GraphDocument> {
        let (doc, _) = self.store.load(owner)?;
        neighborhood::extract_for_entity(&doc, name)
    }

    /// Creates a new entity with the given names.
    ///
    /// # Errors
    /// `InvalidInput` on an empty or blank name list; `DuplicateName` if
    /// any name exact-matches an existing entity.
    pub fn add_entity(&self, owner: &str, names: &[String]) -> GraphResult<EntityId> {
        self.mutate(owner, |doc| {
            validate_names(names)?;
            for name in names {
                if let Some(existing) = resolve::find_exact_match(name, doc) {
                    return Err(GraphError::DuplicateName {
                        name: name.clone(),
                        existing,
                    });
                }
            }
            let entity = Entity::new(names.to_vec())?;
            let id = entity.entity_id.clone();
            doc.insert_entity(entity);
            Ok((id, true))
        })
    }

    /// Appends synonyms to an existing entity, de-duplicated
    /// case-insensitively.
    ///
    /// # Errors
    /// `EntityNotFound` if `id` is absent; `DuplicateName` if a synonym
    /// exact-matches a different entity; `InvalidInput` on blank names.
    pub fn add_synonyms(&self, owner: &str, id: &EntityId, synonyms: &[String]) -> GraphResult<()> {
        self.mutate(owner, |doc| {
            if !doc.contains_entity(id) {
                return Err(GraphError::EntityNotFound(id.to_string()));
            }
            for synonym in synonyms {
                if synonym.trim().is_empty() {
                    return Err(GraphError::InvalidInput(
                        "synonym cannot be blank".to_string(),
                    ));
                }
                if let Some(existing) = resolve::find_exact_match(synonym, doc) {
                    if existing != *id {
                        return Err(GraphError::DuplicateName {
                            name: synonym.clone(),
                            existing,
                        });
                    }
                }
            }
            let mut changed = false;
            if let Some(entity) = doc.entity_mut(id) {
                for synonym in synonyms {
                    changed |= entity.add_name(synonym);
                }
            }
            Ok(((), changed))
        })
    }

    /// Removes names from an entity by case-insensitive match.
    ///
    /// # Errors
    /// `EntityNotFound` if `id` is absent; `InvariantViolation` if the
    /// removal would leave the entity with zero names (the document is
    /// left unchanged).
    pub fn remove_synonyms(&self, owner: &str, id: &EntityId, names: &[String]) -> GraphResult<()> {
        self.mutate(owner, |doc| {
            let Some(entity) = doc.entity_mut(id) else {
                return Err(GraphError::EntityNotFound(id.to_string()));
            };
            let remaining: Vec<String> = entity
                .entity_names
                .iter()
                .filter(|current| !names.iter().any(|name| names_equal(name, current)))
                .cloned()
                .collect();
            if remaining.is_empty() {
                return Err(GraphError::InvariantViolation(format!(
                    "removing these synonyms would leave entity {id} with no names"
                )));
            }
            let changed = remaining.len() != entity.entity_names.len();
            entity.entity_names = remaining;
            Ok(((), changed))
        })
    }

    /// Adds a directed labeled relationship between two existing entities.
    ///
    /// An identical (source, target, label) triple, compared
    /// case-insensitively on the label, makes this a no-op success.
    ///
    /// # Errors
    /// `EntityNotFound` if either endpoint is absent; `InvalidInput` on a
    /// blank label.
    pub fn add_relationship(
        &self,
        owner: &str,
        source: &EntityId,
        label: &str,
        target: &EntityId,
    ) -> GraphResult<RelationshipOutcome> {
        self.mutate(owner, |doc| {
            if label.trim().is_empty() {
                return Err(GraphError::InvalidInput(
                    "relationship label cannot be blank".to_string(),
                ));
            }
            for endpoint in [source, target] {
                if !doc.contains_entity(endpoint) {
                    return Err(GraphError::EntityNotFound(endpoint.to_string()));
                }
            }
            if doc.relationship_exists(source, label, target) {
                return Ok((RelationshipOutcome::AlreadyPresent, false));
            }
            doc.relationships
                .push(Relationship::new(source.clone(), label, target.clone()));
            Ok((RelationshipOutcome::Added, true))
        })
    }

    /// Removes every relationship matching the (source, label, target)
    /// triple.
    ///
    /// # Errors
    /// `EntityNotFound` if either endpoint is absent;
    /// `RelationshipNotFound` if no triple matches.
    pub fn remove_relationship(
        &self,
        owner: &str,
        source: &EntityId,
        label: &str,
        target: &EntityId,
    ) -> GraphResult<()> {
        self.mutate(owner, |doc| {
            for endpoint in [source, target] {
                if !doc.contains_entity(endpoint) {
                    return Err(GraphError::EntityNotFound(endpoint.to_string()));
                }
            }
            let before = doc.relationships.len();
            doc.relationships
                .retain(|rel| !rel.is_triple(source, label, target));
            if doc.relationships.len() == before {
                return Err(GraphError::RelationshipNotFound {
                    source_id: source.clone(),
                    label: label.to_string(),
                    target_id: target.clone(),
                });
            }
            Ok(((), true))
        })
    }

    /// Deletes an entity and every relationship touching it.
    ///
    /// # Errors
    /// `EntityNotFound` if `id` is absent.
    pub fn delete_entity(&self, owner: &str, id: &EntityId) -> GraphResult<()> {
        self.mutate(owner, |doc| {
            if doc.remove_entity_cascade(id).is_none() {
                return Err(GraphError::EntityNotFound(id.to_string()));
            }
            Ok(((), true))
        })
    }

    /// Applies a batch of entity upserts in one atomic cycle.
    ///
    /// Elements with an `entity_id` update that entity: names merge,
    /// properties overwrite key-wise, relationships append. Elements
    /// without create a new entity under the same duplicate checks as
    /// [`GraphEngine::add_entity`]. Relationship targets resolve exactly
    /// against the graph plus the rest of the batch; unresolved targets
    /// follow `policy`.
    ///
    /// # Errors
    /// `InvalidInput` on an empty batch or bad name lists;
    /// `EntityNotFound` for an unknown update id, or for an unresolved
    /// target under [`UnresolvedTargetPolicy::Fail`]; `DuplicateName` on
    /// name collisions.
    pub fn upsert_entities(
        &self,
        owner: &str,
        batch: &[EntityUpsert],
        policy: UnresolvedTargetPolicy,
    ) -> GraphResult<UpsertReport> {
        if batch.is_empty() {
            return Err(GraphError::InvalidInput(
                "upsert batch cannot be empty".to_string(),
            ));
        }
        self.mutate(owner, |doc| {
            let mut report = UpsertReport::default();
            let mut batch_ids: Vec<EntityId> = Vec::with_capacity(batch.len());

            for item in batch {
                validate_names(&item.entity_names)?;
                match &item.entity_id {
                    Some(id) => {
                        if !doc.contains_entity(id) {
                            return Err(GraphError::EntityNotFound(id.to_string()));
                        }
                        for name in &item.entity_names {
                            if let Some(existing) = resolve::find_exact_match(name, doc) {
                                if existing != *id {
                                    return Err(GraphError::DuplicateName {
                                        name: name.clone(),
                                        existing,
                                    });
                                }
                            }
                        }
                        if let Some(entity) = doc.entity_mut(id) {
                            for name in &item.entity_names {
                                entity.add_name(name);
                            }
                            for (key, value) in &item.properties {
                                entity.properties.insert(key.clone(), value.clone());
                            }
                        }
                        report.updated.push(id.clone());
                        batch_ids.push(id.clone());
                    }
                    None => {
                        for name in &item.entity_names {
                            if let Some(existing) = resolve::find_exact_match(name, doc) {
                                return Err(GraphError::DuplicateName {
                                    name: name.clone(),
                                    existing,
                                });
                            }
                        }
                        let mut entity = Entity::new(item.entity_names.clone())?;
                        entity.properties = item.properties.clone();
                        let id = entity.entity_id.clone();
                        doc.insert_entity(entity);
                        report.created.push(id.clone());
                        batch_ids.push(id);
                    }
                }
            }

            // Second pass: batch entities are all in the document now, so
            // targets resolve against graph plus batch.
            for (item, source_id) in batch.iter().zip(&batch_ids) {
                for draft in &item.relationships {
                    match resolve::find_exact_match(&draft.target_entity, doc) {
                        Some(target) => {
                            if !doc.relationship_exists(source_id, &draft.relationship, &target) {
                                doc.relationships.push(Relationship::new(
                                    source_id.clone(),
                                    draft.relationship.clone(),
                                    target,
                                ));
                            }
                        }
                        None => match policy {
                            UnresolvedTargetPolicy::Drop => report.dropped.push(draft.clone()),
                            UnresolvedTargetPolicy::Fail => {
                                return Err(GraphError::EntityNotFound(
                                    draft.target_entity.clone(),
                                ));
                            }
                        },
                    }
                }
            }

            Ok((report, true))
        })
    }

    /// Removes entities by exact name, cascading relationships.
    ///
    /// Names that resolve to nothing are skipped and reported; when
    /// nothing at all resolves the call succeeds with a no-op report and
    /// skips the write.
    ///
    /// # Errors
    /// `InvalidInput` on an empty batch; storage failures.
    pub fn remove_entities(&self, owner: &str, names: &[String]) -> GraphResult<RemovalReport> {
        if names.is_empty() {
            return Err(GraphError::InvalidInput(
                "removal batch cannot be empty".to_string(),
            ));
        }
        self.mutate(owner, |doc| {
            let mut report = RemovalReport::default();
            for name in names {
                match resolve::find_exact_match(name, doc) {
                    Some(id) => {
                        doc.remove_entity_cascade(&id);
                        report.removed_entities.push(id);
                    }
                    None => report.unmatched.push(name.clone()),
                }
            }
            let dirty = !report.is_noop();
            Ok((report, dirty))
        })
    }

    /// Removes relationships identified by exact endpoint names.
    ///
    /// Identifiers whose endpoints or triple resolve to nothing are
    /// skipped and reported; when nothing at all resolves the call
    /// succeeds with a no-op report and skips the write.
    ///
    /// # Errors
    /// `InvalidInput` on an empty batch; storage failures.
    pub fn remove_relationships(
        &self,
        owner: &str,
        identifiers: &[RelationshipIdentifier],
    ) -> GraphResult<RemovalReport> {
        if identifiers.is_empty() {
            return Err(GraphError::InvalidInput(
                "removal batch cannot be empty".to_string(),
            ));
        }
        self.mutate(owner, |doc| {
            let mut report = RemovalReport::default();
            for ident in identifiers {
                let source = resolve::find_exact_match(&ident.source_entity, doc);
                let target = resolve::find_exact_match(&ident.target_entity, doc);
                let (Some(source), Some(target)) = (source, target) else {
                    report.unmatched.push(ident.to_string());
                    continue;
                };
                let before = doc.relationships.len();
                doc.relationships
                    .retain(|rel| !rel.is_triple(&source, &ident.relationship, &target));
                let removed = before - doc.relationships.len();
                if removed == 0 {
                    report.unmatched.push(ident.to_string());
                } else {
                    report.removed_relationships += removed;
                }
            }
            let dirty = !report.is_noop();
            Ok((report, dirty))
        })
    }

    /// Reconciles a local graph of new facts against a previously fetched
    /// neighborhood snapshot.
    ///
    /// Merges with local-wins conflict resolution, re-identifies every
    /// merged entity, then excises exactly the snapshot's footprint from
    /// the persisted document and inserts the replacement. Replacement
    /// edges whose endpoints resolve to no stored entity are dropped
    /// rather than persisted dangling; the `Stored` counts reflect what
    /// was actually written. An empty local graph short-circuits without
    /// touching the store, since an empty update would otherwise delete
    /// the whole neighborhood.
    ///
    /// # Errors
    /// `InvalidInput` on malformed local entities; storage failures.
    pub fn reconcile(
        &self,
        owner: &str,
        snapshot: &GraphDocument,
        local: &LocalGraph,
    ) -> GraphResult<ReconcileOutcome> {
        if local.is_empty() {
            return Ok(ReconcileOutcome::Skipped);
        }
        let merged = reconcile::merge_local(snapshot, local);
        let replacement = reconcile::reidentify(&merged)?;
        let entities = replacement.entities.len();
        let relationships = self.mutate(owner, |doc| {
            let inserted = reconcile::excise_and_insert(doc, snapshot, replacement.clone());
            Ok((inserted, true))
        })?;
        Ok(ReconcileOutcome::Stored {
            entities,
            relationships,
        })
    }
}

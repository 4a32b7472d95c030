//! Neighborhood extraction.
//!
//! Given a set of seed names, resolves them fuzzily to entities and
//! returns the induced subgraph out to a fixed two-hop radius. Traversal
//! treats every relationship as bidirectional; direction and labels are
//! preserved in the output. The radius bounds result size while still
//! surfacing second-order context.

use std::collections::{BTreeSet, HashMap};

use crate::error::{GraphError, GraphResult};
use crate::graph::{EntityId, GraphDocument};
use crate::resolve::{self, DEFAULT_THRESHOLD};

/// Fixed traversal radius in undirected hops.
pub const HOP_RADIUS: usize = 2;

/// Extracts the neighborhood subgraph for a set of free-text names.
///
/// Seeds are every fuzzy match for every name; the node set is the seeds
/// plus their one- and two-hop undirected neighbors; the output contains
/// every relationship with both endpoints in that set. Identities are
/// preserved so a later reconciliation can target exact records.
#[must_use]
pub fn extract(doc: &GraphDocument, names: &[String]) -> GraphDocument {
    let seeds: BTreeSet<EntityId> = names
        .iter()
        .flat_map(|name| resolve::find_all_matches(name, doc, DEFAULT_THRESHOLD))
        .collect();
    extract_from_seeds(doc, seeds)
}

/// Extracts the neighborhood around a single exactly-named entity.
///
/// # Errors
/// Returns `EntityNotFound` if `name` does not exact-match any entity.
pub fn extract_for_entity(doc: &GraphDocument, name: &str) -> GraphResult<GraphDocument> {
    let id = resolve::find_exact_match(name, doc)
        .ok_or_else(|| GraphError::EntityNotFound(name.to_string()))?;
    Ok(extract_from_seeds(doc, BTreeSet::from([id])))
}

fn extract_from_seeds(doc: &GraphDocument, seeds: BTreeSet<EntityId>) -> GraphDocument {
    let adjacency = undirected_adjacency(doc);
    let mut nodes = seeds;
    let mut frontier = nodes.clone();
    for _ in 0..HOP_RADIUS {
        frontier = neighbors_of(&adjacency, &frontier);
        nodes.extend(frontier.iter().cloned());
    }
    induced_subgraph(doc, &nodes)
}

fn undirected_adjacency(doc: &GraphDocument) -> HashMap<EntityId, BTreeSet<EntityId>> {
    let mut adjacency: HashMap<EntityId, BTreeSet<EntityId>> = HashMap::new();
    for rel in &doc.relationships {
        adjacency
            .entry(rel.source_entity_id.clone())
            .or_default()
            .insert(rel.target_entity_id.clone());
        adjacency
            .entry(rel.target_entity_id.clone())
            .or_default()
            .insert(rel.source_entity_id.clone());
    }
    adjacency
}

fn neighbors_of(
    adjacency: &HashMap<EntityId, BTreeSet<EntityId>>,
    nodes: &BTreeSet<EntityId>,
) -> BTreeSet<EntityId> {
    nodes
        .iter()
        .filter_map(|id| adjacency.get(id))
        .flatten()
        .cloned()
        .collect()
}

fn induced_subgraph(doc: &GraphDocument, nodes: &BTreeSet<EntityId>) -> GraphDocument {
    let mut out = GraphDocument::new();
    for id in nodes {
        if let Some(entity) = doc.entities.get(id) {
            out.entities.insert(id.clone(), entity.clone());
        }
    }
    out.relationships = doc
        .relationships
        .iter()
        .filter(|rel| {
            out.entities.contains_key(&rel.source_entity_id)
                && out.entities.contains_key(&rel.target_entity_id)
        })
        .cloned()
        .collect();
    out
}

//! Fuzzy and exact name resolution.
//!
//! Two resolution strictness levels exist on purpose. Neighborhood
//! retrieval should be permissive (fuzzy, many-candidate) because missing
//! a relevant entity is worse than including an extra one. Mutations that
//! could silently create duplicates or misdirect an edge must use the
//! exact path. They are separate functions, not a mode flag, so call
//! sites cannot accidentally pick the permissive path where exactness is
//! required.

use std::collections::BTreeSet;

use crate::graph::{names_equal, EntityId, GraphDocument};

/// Default similarity threshold on the 0-100 ratio scale.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Normalized Levenshtein similarity between two names, scaled 0-100.
///
/// Comparison is case-insensitive and ignores surrounding whitespace.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    strsim::normalized_levenshtein(&a, &b) * 100.0
}

/// Returns the entity owning the single highest-scoring name, if that
/// score reaches `threshold`.
///
/// Ties break to the lowest entity id: iteration is in ascending id order
/// and only a strictly greater score displaces the current best.
#[must_use]
pub fn find_best_match(name: &str, doc: &GraphDocument, threshold: f64) -> Option<EntityId> {
    let mut best: Option<(f64, &EntityId)> = None;
    for (id, entity) in &doc.entities {
        for candidate in &entity.entity_names {
            let score = similarity(name, candidate);
            let improves = match best {
                Some((best_score, _)) => score > best_score,
                None => true,
            };
            if improves {
                best = Some((score, id));
            }
        }
    }
    match best {
        Some((score, id)) if score >= threshold => Some(id.clone()),
        _ => None,
    }
}

/// Returns every entity with at least one name scoring strictly above
/// `threshold`.
///
/// Deliberately permissive; used for neighborhood seeding.
#[must_use]
pub fn find_all_matches(name: &str, doc: &GraphDocument, threshold: f64) -> BTreeSet<EntityId> {
    doc.entities
        .iter()
        .filter(|(_, entity)| {
            entity
                .entity_names
                .iter()
                .any(|candidate| similarity(name, candidate) > threshold)
        })
        .map(|(id, _)| id.clone())
        .collect()
}

/// Returns the entity with a case-insensitive exact name match, if any.
///
/// Iteration is in ascending id order, so the lowest matching id wins
/// when the same name appears on several entities.
#[must_use]
pub fn find_exact_match(name: &str, doc: &GraphDocument) -> Option<EntityId> {
    doc.entities
        .iter()
        .find(|(_, entity)| entity.entity_names.iter().any(|n| names_equal(n, name)))
        .map(|(id, _)| id.clone())
}

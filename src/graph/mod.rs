//! Graph data model.
//!
//! This module groups the entity and document record shapes.

pub mod document;
pub mod entity;

pub use document::{GraphDocument, Relationship};
pub use entity::{Entity, EntityId};

pub(crate) use entity::{names_equal, validate_names};

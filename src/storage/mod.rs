//! Blob storage backends.
//!
//! The `BlobStore` trait is the boundary to the external durable
//! key-value collaborator; the in-memory and file backends implement it
//! for embedded use and tests.

mod fs;
mod memory;
mod traits;

pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::{BlobStore, StoreError};

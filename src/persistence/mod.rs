//! Persistence layer: the JSON snapshot document format and an in-memory
//! document store.
//!
//! [`SnapshotStorer`] writes ontologies as [`OntologySnapshot`] documents and
//! [`SnapshotOntologyFactory`] reads them back through the regular load
//! path, so imports inside a snapshot are resolved like any other import.
//! Both work against a shared [`MemoryDocumentStore`].

pub mod memory;
pub mod models;
pub mod snapshot;

pub use memory::MemoryDocumentStore;
pub use models::OntologySnapshot;
pub use snapshot::{SnapshotOntologyFactory, SnapshotStorer};

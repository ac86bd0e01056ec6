//! # ontology-manager
//!
//! Concurrent in-process manager for a working set of interlinked
//! ontologies.
//!
//! The crate keeps a registry of ontologies keyed by identifier, resolves
//! the import graph between them, applies batches of changes with
//! veto-capable notification, and loads ontologies (and, recursively, their
//! imports) through pluggable IRI mappers and factories. Every component is
//! safe to share between threads.
//!
//! ## Architecture
//!
//! ```text
//! Callers (any thread)
//!     │
//!     ├── OntologyManager (service/)
//!     │
//!     ├── LoadCoordinator ── IRI mappers, factories, LoadSession
//!     ├── ChangeEngine    ── impending / committed / progress broadcasts
//!     ├── ImportResolver  ── imports closure cache
//!     │
//!     ├── OntologyRegistry, ListenerHub (domain/)
//!     │
//!     └── Snapshot storer and factory (persistence/)
//! ```
//!
//! ## Example
//!
//! ```
//! use ontology_manager::domain::Axiom;
//! use ontology_manager::OntologyManager;
//!
//! let manager = OntologyManager::default();
//! let ontology = manager
//!     .create_ontology_with_axioms("http://example.org/pets", [Axiom::declare_class(
//!         "http://example.org/pets#Dog",
//!     )])
//!     .map_err(|err| err.to_string())?;
//! assert_eq!(ontology.axiom_count(), 1);
//! # Ok::<(), String>(())
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;

pub use config::ManagerConfig;
pub use error::OntologyError;
pub use service::OntologyManager;

//! Service layer: import resolution, change application, loading and the
//! manager façade.
//!
//! [`OntologyManager`] is the entry point. It owns one instance of each
//! component and hands them the shared registry, listener hub and
//! configuration; [`LoadContext`] travels down every load and change call.

pub mod builtin;
pub mod change_engine;
pub mod import_resolver;
pub mod load_context;
pub mod load_coordinator;
pub mod ontology_manager;

pub use builtin::{EmptyOntologyFactory, IdentityIriMapper, SimpleIriMapper};
pub use change_engine::ChangeEngine;
pub use import_resolver::{ImportResolver, ImportsClosure};
pub use load_context::LoadContext;
pub use load_coordinator::{LoadCoordinator, LoadSession};
pub use ontology_manager::OntologyManager;

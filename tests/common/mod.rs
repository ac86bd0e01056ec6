//! Shared helpers for the integration tests.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;

use ontology_manager::domain::{
    Axiom, DocumentIri, ImportDeclaration, OntologyChange, OntologyHandle,
};
use ontology_manager::persistence::{
    MemoryDocumentStore, OntologySnapshot, SnapshotOntologyFactory, SnapshotStorer,
};
use ontology_manager::{ManagerConfig, OntologyManager};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn manager() -> OntologyManager {
    init_tracing();
    OntologyManager::new(ManagerConfig::default())
}

/// Manager with snapshot persistence over a fresh store.
pub fn snapshot_manager() -> (OntologyManager, Arc<MemoryDocumentStore>) {
    let manager = manager();
    let store = Arc::new(MemoryDocumentStore::new());
    manager.add_ontology_factory(Arc::new(SnapshotOntologyFactory::new(Arc::clone(&store))));
    manager.add_ontology_storer(Arc::new(SnapshotStorer::new(Arc::clone(&store))));
    (manager, store)
}

pub fn put_snapshot(store: &MemoryDocumentStore, iri: &str, imports: &[&str], axioms: Vec<Axiom>) {
    let snapshot = OntologySnapshot {
        ontology_iri: iri.into(),
        version_iri: None,
        imports: imports.iter().map(|i| ImportDeclaration::new(*i)).collect(),
        axioms,
        saved_at: None,
    };
    let Ok(json) = serde_json::to_string(&snapshot) else {
        panic!("snapshot serialization failed");
    };
    let Ok(()) = store.write(DocumentIri::new(iri), json) else {
        panic!("store write failed");
    };
}

pub fn create(manager: &OntologyManager, iri: &str) -> OntologyHandle {
    let Ok(ontology) = manager.create_ontology(iri) else {
        panic!("create {iri} failed");
    };
    ontology
}

pub fn import(manager: &OntologyManager, from: &OntologyHandle, target: &str) {
    let change = OntologyChange::add_import(from, ImportDeclaration::new(target));
    let Ok(outcome) = manager.apply_change(change) else {
        panic!("import of {target} failed");
    };
    assert!(!outcome.is_vetoed());
}

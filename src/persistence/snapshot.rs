//! `json-snapshot` storer and factory.

use std::io;
use std::sync::Arc;

use super::memory::MemoryDocumentStore;
use super::models::OntologySnapshot;
use crate::domain::{
    DocumentIri, DocumentSource, InMemoryOntology, Ontology, OntologyChange,
    OntologyCreationHandler, OntologyFactory, OntologyFormat, OntologyHandle, OntologyId,
    OntologyStorer,
};
use crate::error::OntologyError;

/// Writes ontologies as pretty-printed [`OntologySnapshot`] documents.
#[derive(Debug, Clone)]
pub struct SnapshotStorer {
    store: Arc<MemoryDocumentStore>,
}

impl SnapshotStorer {
    /// Creates a storer writing into `store`.
    #[must_use]
    pub fn new(store: Arc<MemoryDocumentStore>) -> Self {
        Self { store }
    }
}

impl OntologyStorer for SnapshotStorer {
    fn can_store(&self, format: &OntologyFormat) -> bool {
        *format == OntologyFormat::json_snapshot()
    }

    fn store(
        &self,
        ontology: &dyn Ontology,
        target: &DocumentIri,
        _format: &OntologyFormat,
    ) -> io::Result<()> {
        let snapshot = OntologySnapshot::capture(ontology);
        let json = serde_json::to_string_pretty(&snapshot).map_err(io::Error::other)?;
        self.store.write(target.clone(), json)
    }
}

/// Loads [`OntologySnapshot`] documents from inline text or from a
/// [`MemoryDocumentStore`].
///
/// The ontology is registered before its content is applied, then each
/// import is requested through the handler so cycles resolve to the
/// already registered instance.
#[derive(Debug, Clone)]
pub struct SnapshotOntologyFactory {
    store: Arc<MemoryDocumentStore>,
}

impl SnapshotOntologyFactory {
    /// Creates a factory reading from `store`.
    #[must_use]
    pub fn new(store: Arc<MemoryDocumentStore>) -> Self {
        Self { store }
    }

    fn read(&self, source: &DocumentSource) -> Result<OntologySnapshot, OntologyError> {
        let content = match source.content() {
            Some(inline) => inline.to_string(),
            None => self.store.read(source.document_iri())?,
        };
        serde_json::from_str(&content).map_err(|err| OntologyError::InvalidDocument {
            document_iri: source.document_iri().clone(),
            reason: err.to_string(),
        })
    }
}

impl OntologyFactory for SnapshotOntologyFactory {
    fn can_create_from_document_iri(&self, _document_iri: &DocumentIri) -> bool {
        false
    }

    fn create_ontology(
        &self,
        id: OntologyId,
        _document_iri: &DocumentIri,
        handler: &dyn OntologyCreationHandler,
    ) -> Result<OntologyHandle, OntologyError> {
        let ontology = OntologyHandle::new(InMemoryOntology::new(id));
        handler.ontology_created(&ontology)?;
        Ok(ontology)
    }

    fn can_load(&self, source: &DocumentSource) -> bool {
        source.content().is_some() || self.store.contains(source.document_iri())
    }

    fn load_ontology(
        &self,
        source: &DocumentSource,
        handler: &dyn OntologyCreationHandler,
    ) -> Result<OntologyHandle, OntologyError> {
        let snapshot = self.read(source)?;
        let ontology = OntologyHandle::new(InMemoryOntology::new(snapshot.ontology_id()));
        handler.ontology_created(&ontology)?;
        handler.set_ontology_format(&ontology, OntologyFormat::json_snapshot());

        let changes: Vec<OntologyChange> = snapshot
            .imports
            .iter()
            .map(|declaration| OntologyChange::add_import(&ontology, declaration.clone()))
            .chain(
                snapshot
                    .axioms
                    .iter()
                    .map(|axiom| OntologyChange::add_axiom(&ontology, axiom.clone())),
            )
            .collect();
        let _ = handler.apply_changes(&changes)?;

        for declaration in &snapshot.imports {
            let _ = handler.load_import(declaration)?;
        }

        tracing::debug!(
            document_iri = %source.document_iri(),
            imports = snapshot.imports.len(),
            axioms = snapshot.axioms.len(),
            "snapshot parsed"
        );
        Ok(ontology)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Axiom, ImportDeclaration};
    use crate::service::OntologyManager;

    fn make_manager() -> (OntologyManager, Arc<MemoryDocumentStore>) {
        let store = Arc::new(MemoryDocumentStore::new());
        let manager = OntologyManager::default();
        manager.add_ontology_factory(Arc::new(SnapshotOntologyFactory::new(Arc::clone(&store))));
        manager.add_ontology_storer(Arc::new(SnapshotStorer::new(Arc::clone(&store))));
        (manager, store)
    }

    fn put(store: &MemoryDocumentStore, iri: &str, snapshot: &OntologySnapshot) {
        let Ok(json) = serde_json::to_string(snapshot) else {
            panic!("serialization failed");
        };
        let Ok(()) = store.write(DocumentIri::new(iri), json) else {
            panic!("write failed");
        };
    }

    fn snapshot(iri: &str, imports: &[&str], axioms: Vec<Axiom>) -> OntologySnapshot {
        OntologySnapshot {
            ontology_iri: iri.into(),
            version_iri: None,
            imports: imports.iter().map(|i| ImportDeclaration::new(*i)).collect(),
            axioms,
            saved_at: None,
        }
    }

    #[test]
    fn saved_ontology_loads_back() {
        let (manager, store) = make_manager();
        let axioms = [
            Axiom::declare_class("http://x#A"),
            Axiom::sub_class_of("http://x#A", "http://x#B"),
        ];
        let Ok(ontology) = manager.create_ontology_with_axioms("http://x/a", axioms.clone()) else {
            panic!("create failed");
        };
        let Ok(()) = manager.save_ontology(&ontology) else {
            panic!("save failed");
        };
        assert!(store.contains(&DocumentIri::new("http://x/a")));

        let _ = manager.remove_ontology(&ontology.ontology_id());
        let Ok(reloaded) = manager.load_ontology("http://x/a") else {
            panic!("reload failed");
        };
        assert!(!reloaded.ptr_eq(&ontology));
        assert_eq!(reloaded.axiom_count(), 2);
        assert_eq!(
            manager.ontology_format(&reloaded),
            Some(OntologyFormat::json_snapshot())
        );
    }

    #[test]
    fn imports_inside_snapshots_are_loaded() {
        let (manager, store) = make_manager();
        put(&store, "http://x/a", &snapshot("http://x/a", &["http://x/b"], vec![]));
        put(
            &store,
            "http://x/b",
            &snapshot("http://x/b", &[], vec![Axiom::declare_class("http://x#B")]),
        );

        let Ok(a) = manager.load_ontology("http://x/a") else {
            panic!("load failed");
        };
        let Some(b) = manager.ontology(&OntologyId::new("http://x/b")) else {
            panic!("import not registered");
        };
        let closure = manager.imports_closure(&a);
        assert!(closure.contains(&b));
        assert_eq!(closure.len(), 2);
    }

    #[test]
    fn inline_source_needs_no_store_entry() {
        let (manager, store) = make_manager();
        let source = DocumentSource::from_text(
            DocumentIri::new("mem:inline"),
            r#"{"ontology_iri":"http://x/inline"}"#,
        );
        let Ok(ontology) = manager.load_ontology_from_source(&source) else {
            panic!("inline load failed");
        };
        assert!(store.is_empty());
        let Ok(document) = manager.document_iri(&ontology) else {
            panic!("document IRI missing");
        };
        assert_eq!(document.as_str(), "mem:inline");
    }

    #[test]
    fn garbage_is_an_invalid_document() {
        let (manager, _store) = make_manager();
        let source = DocumentSource::from_text(DocumentIri::new("mem:bad"), "not json");
        let result = manager.load_ontology_from_source(&source);
        assert!(matches!(result, Err(OntologyError::InvalidDocument { .. })));
        assert!(manager.ontologies().is_empty());
    }

    #[test]
    fn read_only_store_surfaces_storage_failure() {
        let (manager, store) = make_manager();
        let Ok(ontology) = manager.create_ontology("http://x/a") else {
            panic!("create failed");
        };
        store.set_read_only(true);
        let result = manager.save_ontology(&ontology);
        assert!(matches!(result, Err(OntologyError::StorageFailure(_))));
    }
}

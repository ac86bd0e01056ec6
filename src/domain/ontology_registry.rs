//! Concurrent ontology storage keyed by identifier.
//!
//! [`OntologyRegistry`] holds four [`DashMap`]s: identifier → ontology,
//! identifier → document IRI, ontology → format, and import declaration →
//! identifier. Each map gives per-key concurrent semantics; there is no
//! atomicity across keys or across maps. Reads return owned snapshots so
//! callers never iterate over a live map.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::axiom::Axiom;
use super::document::OntologyFormat;
use super::import_declaration::ImportDeclaration;
use super::iri::{DocumentIri, Iri};
use super::ontology::OntologyHandle;
use super::ontology_id::OntologyId;
use crate::error::OntologyError;

/// Central store for all managed ontologies.
///
/// Pure storage: no listeners, no cache invalidation. Those are the
/// responsibility of the services wrapping it.
///
/// # Concurrency
///
/// - Any number of threads may read and write different identifiers
///   concurrently.
/// - [`OntologyRegistry::add`] is atomic per identifier: of two threads
///   adding the same identifier, exactly one succeeds.
/// - No lock is held while a caller-supplied closure or ontology method
///   runs, except inside the map shard being touched.
#[derive(Debug, Default)]
pub struct OntologyRegistry {
    ontologies: DashMap<OntologyId, OntologyHandle>,
    document_iris: DashMap<OntologyId, DocumentIri>,
    formats: DashMap<OntologyHandle, OntologyFormat>,
    import_bindings: DashMap<ImportDeclaration, OntologyId>,
}

impl OntologyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an ontology under its current identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::OntologyAlreadyExists`] if the identifier is
    /// already taken.
    pub fn add(&self, ontology: OntologyHandle) -> Result<OntologyId, OntologyError> {
        let id = ontology.ontology_id();
        match self.ontologies.entry(id.clone()) {
            Entry::Occupied(_) => Err(OntologyError::OntologyAlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(ontology);
                Ok(id)
            }
        }
    }

    /// Returns the ontology registered under `id`.
    #[must_use]
    pub fn get(&self, id: &OntologyId) -> Option<OntologyHandle> {
        self.ontologies.get(id).map(|entry| entry.value().clone())
    }

    /// Returns `true` if an ontology is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &OntologyId) -> bool {
        self.ontologies.contains_key(id)
    }

    /// Returns `true` if this exact instance is registered.
    #[must_use]
    pub fn contains_ontology(&self, ontology: &OntologyHandle) -> bool {
        self.ontologies
            .iter()
            .any(|entry| entry.value().ptr_eq(ontology))
    }

    /// Removes the ontology registered under `id`, together with its
    /// document IRI, its format and every import binding pointing at it.
    pub fn remove(&self, id: &OntologyId) -> Option<OntologyHandle> {
        let (_, ontology) = self.ontologies.remove(id)?;
        self.document_iris.remove(id);
        self.formats.remove(&ontology);
        self.import_bindings.retain(|_, bound| bound != id);
        Some(ontology)
    }

    /// Verifies that `ontology` could take `new_id` without clashing with a
    /// different registered ontology.
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::RenameConflict`] if another instance holds
    /// `new_id`.
    pub fn check_rename(
        &self,
        ontology: &OntologyHandle,
        new_id: &OntologyId,
    ) -> Result<(), OntologyError> {
        match self.get(new_id) {
            Some(existing) if !existing.ptr_eq(ontology) => Err(OntologyError::RenameConflict {
                new_id: new_id.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Moves the entry and document IRI registered under `old_id` to
    /// `new_id`. Does nothing if `old_id` is not registered.
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::RenameConflict`] if `new_id` is held by a
    /// different ontology.
    pub fn rename(&self, old_id: &OntologyId, new_id: &OntologyId) -> Result<(), OntologyError> {
        if old_id == new_id {
            return Ok(());
        }
        let Some(ontology) = self.get(old_id) else {
            return Ok(());
        };

        match self.ontologies.entry(new_id.clone()) {
            Entry::Occupied(existing) => {
                if !existing.get().ptr_eq(&ontology) {
                    return Err(OntologyError::RenameConflict {
                        new_id: new_id.clone(),
                    });
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(ontology.clone());
            }
        }

        self.ontologies
            .remove_if(old_id, |_, registered| registered.ptr_eq(&ontology));
        if let Some((_, document_iri)) = self.document_iris.remove(old_id) {
            self.document_iris.insert(new_id.clone(), document_iri);
        }
        Ok(())
    }

    /// Returns a snapshot of all registered ontologies.
    #[must_use]
    pub fn all(&self) -> Vec<OntologyHandle> {
        self.ontologies
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns a snapshot of all registered identifiers.
    #[must_use]
    pub fn ids(&self) -> Vec<OntologyId> {
        self.ontologies.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Returns every registered ontology holding `axiom`.
    #[must_use]
    pub fn ontologies_containing(&self, axiom: &Axiom) -> Vec<OntologyHandle> {
        self.all()
            .into_iter()
            .filter(|ontology| ontology.contains_axiom(axiom))
            .collect()
    }

    /// Returns every registered ontology whose ontology IRI is `iri`,
    /// regardless of version.
    #[must_use]
    pub fn versions(&self, iri: &Iri) -> Vec<OntologyHandle> {
        self.ontologies
            .iter()
            .filter(|entry| entry.key().ontology_iri() == iri)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns the number of registered ontologies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ontologies.len()
    }

    /// Returns `true` if no ontology is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ontologies.is_empty()
    }

    /// Returns the document IRI bound to `id`.
    #[must_use]
    pub fn document_iri(&self, id: &OntologyId) -> Option<DocumentIri> {
        self.document_iris.get(id).map(|entry| entry.value().clone())
    }

    /// Binds `id` to `document_iri`, replacing any previous binding.
    pub fn set_document_iri(&self, id: OntologyId, document_iri: DocumentIri) {
        self.document_iris.insert(id, document_iri);
    }

    /// Returns the identifier bound to `document_iri`.
    #[must_use]
    pub fn id_by_document_iri(&self, document_iri: &DocumentIri) -> Option<OntologyId> {
        self.document_iris
            .iter()
            .find(|entry| entry.value() == document_iri)
            .map(|entry| entry.key().clone())
    }

    /// Returns the registered ontology bound to `document_iri`.
    #[must_use]
    pub fn ontology_by_document_iri(&self, document_iri: &DocumentIri) -> Option<OntologyHandle> {
        let id = self.id_by_document_iri(document_iri)?;
        self.get(&id)
    }

    /// Returns `true` if some identifier is bound to `document_iri`.
    #[must_use]
    pub fn is_document_iri_bound(&self, document_iri: &DocumentIri) -> bool {
        self.document_iris
            .iter()
            .any(|entry| entry.value() == document_iri)
    }

    /// Returns the format recorded for `ontology`.
    #[must_use]
    pub fn format(&self, ontology: &OntologyHandle) -> Option<OntologyFormat> {
        self.formats.get(ontology).map(|entry| entry.value().clone())
    }

    /// Records the format `ontology` was read in or should be written in.
    pub fn set_format(&self, ontology: OntologyHandle, format: OntologyFormat) {
        self.formats.insert(ontology, format);
    }

    /// Binds an import declaration to the identifier it resolved to.
    pub fn bind_import(&self, declaration: ImportDeclaration, id: OntologyId) {
        self.import_bindings.insert(declaration, id);
    }

    /// Drops the binding of an import declaration.
    pub fn unbind_import(&self, declaration: &ImportDeclaration) -> Option<OntologyId> {
        self.import_bindings.remove(declaration).map(|(_, id)| id)
    }

    /// Returns the identifier an import declaration is bound to.
    #[must_use]
    pub fn bound_import(&self, declaration: &ImportDeclaration) -> Option<OntologyId> {
        self.import_bindings
            .get(declaration)
            .map(|entry| entry.value().clone())
    }

    /// Returns the registered ontology an import declaration resolves to.
    #[must_use]
    pub fn imported_ontology(&self, declaration: &ImportDeclaration) -> Option<OntologyHandle> {
        let id = self.bound_import(declaration)?;
        self.get(&id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::InMemoryOntology;

    fn make_ontology(iri: &str) -> OntologyHandle {
        OntologyHandle::new(InMemoryOntology::new(OntologyId::new(iri)))
    }

    #[test]
    fn add_and_get() {
        let registry = OntologyRegistry::new();
        let ont = make_ontology("http://x/a");

        let result = registry.add(ont.clone());
        assert!(result.is_ok());

        let fetched = registry.get(&OntologyId::new("http://x/a"));
        assert_eq!(fetched, Some(ont.clone()));
        assert!(registry.contains_ontology(&ont));
    }

    #[test]
    fn add_existing_id_is_rejected() {
        let registry = OntologyRegistry::new();
        let _ = registry.add(make_ontology("http://x/a"));
        let result = registry.add(make_ontology("http://x/a"));
        assert!(matches!(
            result,
            Err(OntologyError::OntologyAlreadyExists(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_purges_related_entries() {
        let registry = OntologyRegistry::new();
        let ont = make_ontology("http://x/b");
        let id = OntologyId::new("http://x/b");
        let declaration = ImportDeclaration::new("http://x/b");

        let _ = registry.add(ont.clone());
        registry.set_document_iri(id.clone(), DocumentIri::new("mem:b"));
        registry.set_format(ont.clone(), OntologyFormat::json_snapshot());
        registry.bind_import(declaration.clone(), id.clone());

        let removed = registry.remove(&id);
        assert_eq!(removed, Some(ont.clone()));
        assert!(registry.get(&id).is_none());
        assert!(registry.document_iri(&id).is_none());
        assert!(registry.format(&ont).is_none());
        assert!(registry.bound_import(&declaration).is_none());
    }

    #[test]
    fn remove_nonexistent_returns_none() {
        let registry = OntologyRegistry::new();
        assert!(registry.remove(&OntologyId::new("http://x/none")).is_none());
    }

    #[test]
    fn rename_moves_entry_and_document_iri() {
        let registry = OntologyRegistry::new();
        let ont = make_ontology("http://x/a");
        let old_id = OntologyId::new("http://x/a");
        let new_id = OntologyId::new("http://x/renamed");

        let _ = registry.add(ont.clone());
        registry.set_document_iri(old_id.clone(), DocumentIri::new("mem:a"));

        let result = registry.rename(&old_id, &new_id);
        assert!(result.is_ok());
        assert!(registry.get(&old_id).is_none());
        assert_eq!(registry.get(&new_id), Some(ont));
        assert_eq!(
            registry.document_iri(&new_id),
            Some(DocumentIri::new("mem:a"))
        );
    }

    #[test]
    fn rename_onto_other_ontology_conflicts() {
        let registry = OntologyRegistry::new();
        let _ = registry.add(make_ontology("http://x/a"));
        let _ = registry.add(make_ontology("http://x/b"));

        let result = registry.rename(&OntologyId::new("http://x/a"), &OntologyId::new("http://x/b"));
        assert!(matches!(result, Err(OntologyError::RenameConflict { .. })));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rename_of_absent_id_is_noop() {
        let registry = OntologyRegistry::new();
        let result = registry.rename(&OntologyId::new("http://x/a"), &OntologyId::new("http://x/b"));
        assert!(result.is_ok());
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_by_document_iri() {
        let registry = OntologyRegistry::new();
        let ont = make_ontology("http://x/a");
        let _ = registry.add(ont.clone());
        registry.set_document_iri(OntologyId::new("http://x/a"), DocumentIri::new("mem:a"));

        assert!(registry.is_document_iri_bound(&DocumentIri::new("mem:a")));
        assert_eq!(
            registry.ontology_by_document_iri(&DocumentIri::new("mem:a")),
            Some(ont)
        );
        assert!(registry.ontology_by_document_iri(&DocumentIri::new("mem:z")).is_none());
    }

    #[test]
    fn versions_share_ontology_iri() {
        let registry = OntologyRegistry::new();
        let v1 = OntologyHandle::new(InMemoryOntology::new(OntologyId::with_version(
            "http://x/a",
            "http://x/a/1",
        )));
        let v2 = OntologyHandle::new(InMemoryOntology::new(OntologyId::with_version(
            "http://x/a",
            "http://x/a/2",
        )));
        let _ = registry.add(v1);
        let _ = registry.add(v2);
        let _ = registry.add(make_ontology("http://x/b"));

        assert_eq!(registry.versions(&Iri::new("http://x/a")).len(), 2);
    }

    #[test]
    fn all_returns_independent_snapshot() {
        let registry = OntologyRegistry::new();
        let _ = registry.add(make_ontology("http://x/a"));
        let snapshot = registry.all();
        let _ = registry.add(make_ontology("http://x/b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.all().len(), 2);
    }
}

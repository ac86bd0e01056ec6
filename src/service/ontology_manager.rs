//! Ontology manager: the public entry point wiring every component together.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::builtin::{EmptyOntologyFactory, IdentityIriMapper};
use super::change_engine::ChangeEngine;
use super::import_resolver::{ImportResolver, ImportsClosure};
use super::load_context::LoadContext;
use super::load_coordinator::LoadCoordinator;
use crate::config::ManagerConfig;
use crate::domain::{
    Axiom, ChangeOutcome, DocumentIri, DocumentSource, ImportDeclaration, Iri, ListenerHub,
    OntologyChange, OntologyFactory, OntologyFormat, OntologyHandle, OntologyId,
    OntologyIriMapper, OntologyRegistry, OntologyStorer,
};
use crate::error::OntologyError;

const ANONYMOUS_IRI_PREFIX: &str = "urn:ontology:anonymous:ont";

/// Thread-safe manager of a working set of ontologies.
///
/// Stateless coordinator over shared components: the [`OntologyRegistry`]
/// for storage, the [`ImportResolver`] for import graphs, the
/// [`ChangeEngine`] for mutations, the [`LoadCoordinator`] for creation
/// and loading, and the [`ListenerHub`] for notifications. Every method
/// takes `&self`; share the manager across threads with an [`Arc`].
///
/// A fresh manager has an [`IdentityIriMapper`] and an
/// [`EmptyOntologyFactory`] installed and no storers.
#[derive(Debug)]
pub struct OntologyManager {
    registry: Arc<OntologyRegistry>,
    imports: Arc<ImportResolver>,
    listeners: Arc<ListenerHub>,
    engine: Arc<ChangeEngine>,
    loader: LoadCoordinator,
    storers: RwLock<Vec<Arc<dyn OntologyStorer>>>,
    config: Arc<RwLock<ManagerConfig>>,
    anonymous_counter: AtomicU64,
}

impl OntologyManager {
    /// Creates a manager with the given configuration.
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        let config = Arc::new(RwLock::new(config));
        let registry = Arc::new(OntologyRegistry::new());
        let imports = Arc::new(ImportResolver::new(Arc::clone(&registry)));
        let listeners = Arc::new(ListenerHub::new());
        let engine = Arc::new(ChangeEngine::new(
            Arc::clone(&registry),
            Arc::clone(&imports),
            Arc::clone(&listeners),
            Arc::clone(&config),
        ));
        let loader = LoadCoordinator::new(
            Arc::clone(&registry),
            Arc::clone(&imports),
            Arc::clone(&listeners),
            Arc::clone(&engine),
            Arc::clone(&config),
        );
        loader.add_iri_mapper(Arc::new(IdentityIriMapper));
        loader.add_ontology_factory(Arc::new(EmptyOntologyFactory));

        Self {
            registry,
            imports,
            listeners,
            engine,
            loader,
            storers: RwLock::new(Vec::new()),
            config,
            anonymous_counter: AtomicU64::new(0),
        }
    }

    /// Creates a manager configured from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ManagerConfig::from_env())
    }

    /// Returns the listener hub for registering and removing listeners.
    #[must_use]
    pub fn listeners(&self) -> &ListenerHub {
        &self.listeners
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<OntologyRegistry> {
        &self.registry
    }

    /// Returns the import resolver.
    #[must_use]
    pub fn import_resolver(&self) -> &Arc<ImportResolver> {
        &self.imports
    }

    // -- configuration ---------------------------------------------------

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> ManagerConfig {
        self.config.read().clone()
    }

    /// Switches the missing-imports policy.
    pub fn set_silent_missing_imports(&self, silent: bool) {
        self.config.write().silent_missing_imports = silent;
    }

    /// Returns `true` if missing imports are tolerated.
    #[must_use]
    pub fn is_silent_missing_imports(&self) -> bool {
        self.config.read().silent_missing_imports
    }

    /// Switches annotation-axiom loading.
    pub fn set_load_annotation_axioms(&self, load: bool) {
        self.config.write().load_annotation_axioms = load;
    }

    /// Returns `true` if annotation axioms are loaded.
    #[must_use]
    pub fn is_load_annotation_axioms(&self) -> bool {
        self.config.read().load_annotation_axioms
    }

    // -- registry queries ------------------------------------------------

    /// Returns the ontology registered under `id`.
    #[must_use]
    pub fn ontology(&self, id: &OntologyId) -> Option<OntologyHandle> {
        self.registry.get(id)
    }

    /// Returns `true` if an ontology is registered under `id`.
    #[must_use]
    pub fn contains_ontology(&self, id: &OntologyId) -> bool {
        self.registry.contains(id)
    }

    /// Returns `true` if this exact instance is managed here.
    #[must_use]
    pub fn contains_handle(&self, ontology: &OntologyHandle) -> bool {
        self.registry
            .get(&ontology.ontology_id())
            .is_some_and(|registered| registered.ptr_eq(ontology))
    }

    /// Returns a snapshot of every managed ontology.
    #[must_use]
    pub fn ontologies(&self) -> Vec<OntologyHandle> {
        self.registry.all()
    }

    /// Returns a snapshot of every registered identifier.
    #[must_use]
    pub fn ontology_ids(&self) -> Vec<OntologyId> {
        self.registry.ids()
    }

    /// Returns the managed ontologies holding `axiom`.
    #[must_use]
    pub fn ontologies_containing(&self, axiom: &Axiom) -> Vec<OntologyHandle> {
        self.registry.ontologies_containing(axiom)
    }

    /// Returns every managed version of the ontology named `ontology_iri`.
    #[must_use]
    pub fn versions(&self, ontology_iri: &Iri) -> Vec<OntologyHandle> {
        self.registry.versions(ontology_iri)
    }

    /// Returns the ontology an import declaration currently resolves to.
    #[must_use]
    pub fn imported_ontology(&self, declaration: &ImportDeclaration) -> Option<OntologyHandle> {
        self.registry.imported_ontology(declaration)
    }

    /// Returns the ontology bound to `document_iri`.
    #[must_use]
    pub fn ontology_by_document_iri(&self, document_iri: &DocumentIri) -> Option<OntologyHandle> {
        self.registry.ontology_by_document_iri(document_iri)
    }

    // -- imports -----------------------------------------------------------

    /// See [`ImportResolver::direct_imports`].
    ///
    /// # Errors
    ///
    /// [`OntologyError::UnknownOntology`] if `ontology` is not managed.
    pub fn direct_imports(
        &self,
        ontology: &OntologyHandle,
    ) -> Result<HashSet<OntologyHandle>, OntologyError> {
        self.imports.direct_imports(ontology)
    }

    /// See [`ImportResolver::imports`].
    ///
    /// # Errors
    ///
    /// [`OntologyError::UnknownOntology`] if `ontology` is not managed.
    pub fn imports(
        &self,
        ontology: &OntologyHandle,
    ) -> Result<HashSet<OntologyHandle>, OntologyError> {
        self.imports.imports(ontology)
    }

    /// See [`ImportResolver::imports_closure`].
    #[must_use]
    pub fn imports_closure(&self, ontology: &OntologyHandle) -> ImportsClosure {
        self.imports.imports_closure(ontology)
    }

    /// See [`ImportResolver::sorted_imports_closure`].
    #[must_use]
    pub fn sorted_imports_closure(&self, ontology: &OntologyHandle) -> Vec<OntologyHandle> {
        self.imports.sorted_imports_closure(ontology)
    }

    // -- creation --------------------------------------------------------

    /// Creates an empty ontology named `id`.
    ///
    /// # Errors
    ///
    /// See [`LoadCoordinator::create_ontology`].
    pub fn create_ontology(&self, id: impl Into<OntologyId>) -> Result<OntologyHandle, OntologyError> {
        self.loader.create_ontology(id.into(), LoadContext::root())
    }

    /// Creates an ontology named `id` holding `axioms`.
    ///
    /// # Errors
    ///
    /// As [`Self::create_ontology`], plus change failures. A vetoed axiom
    /// batch leaves the new ontology empty.
    pub fn create_ontology_with_axioms(
        &self,
        id: impl Into<OntologyId>,
        axioms: impl IntoIterator<Item = Axiom>,
    ) -> Result<OntologyHandle, OntologyError> {
        let ontology = self.create_ontology(id)?;
        let _ = self.add_axioms(&ontology, axioms)?;
        Ok(ontology)
    }

    /// Creates an ontology with a generated identifier holding `axioms`.
    ///
    /// # Errors
    ///
    /// As [`Self::create_ontology_with_axioms`].
    pub fn create_anonymous_ontology(
        &self,
        axioms: impl IntoIterator<Item = Axiom>,
    ) -> Result<OntologyHandle, OntologyError> {
        let id = loop {
            let n = self.anonymous_counter.fetch_add(1, Ordering::Relaxed);
            let candidate = OntologyId::new(format!("{ANONYMOUS_IRI_PREFIX}{n}"));
            if !self.registry.contains(&candidate) {
                break candidate;
            }
        };
        self.create_ontology_with_axioms(id, axioms)
    }

    /// Creates an ontology named `id` holding the axioms of every ontology
    /// in `sources`, or only their logical axioms when `logical_only` is
    /// set.
    ///
    /// # Errors
    ///
    /// As [`Self::create_ontology_with_axioms`].
    pub fn create_merged_ontology(
        &self,
        id: impl Into<OntologyId>,
        sources: &[OntologyHandle],
        logical_only: bool,
    ) -> Result<OntologyHandle, OntologyError> {
        let id = id.into();
        if self.registry.contains(&id) {
            return Err(OntologyError::OntologyAlreadyExists(id));
        }
        let axioms: Vec<Axiom> = sources
            .iter()
            .flat_map(|source| source.axioms())
            .filter(|axiom| !logical_only || axiom.is_logical_axiom())
            .collect();
        tracing::debug!(
            ontology_id = %id,
            sources = sources.len(),
            axioms = axioms.len(),
            "merging ontologies"
        );
        self.create_ontology_with_axioms(id, axioms)
    }

    // -- loading ---------------------------------------------------------

    /// Loads the ontology named `id` through the mapper and factory chains,
    /// or returns it if already managed.
    ///
    /// # Errors
    ///
    /// See [`LoadCoordinator::load_ontology`].
    pub fn load_ontology(&self, id: impl Into<OntologyId>) -> Result<OntologyHandle, OntologyError> {
        self.loader
            .load_ontology(&id.into(), false, LoadContext::root())
    }

    /// Loads whatever ontology lives at `document_iri`.
    ///
    /// # Errors
    ///
    /// See [`LoadCoordinator::load_from_document`].
    pub fn load_ontology_from_document(
        &self,
        document_iri: impl Into<DocumentIri>,
    ) -> Result<OntologyHandle, OntologyError> {
        self.loader
            .load_from_document(document_iri.into(), LoadContext::root())
    }

    /// Loads an ontology from `source`.
    ///
    /// # Errors
    ///
    /// See [`LoadCoordinator::load_from_source`].
    pub fn load_ontology_from_source(
        &self,
        source: &DocumentSource,
    ) -> Result<OntologyHandle, OntologyError> {
        self.loader.load_from_source(source, LoadContext::root())
    }

    // -- changes ---------------------------------------------------------

    /// Applies a batch of changes.
    ///
    /// # Errors
    ///
    /// See [`ChangeEngine::apply_changes`].
    pub fn apply_changes(&self, changes: &[OntologyChange]) -> Result<ChangeOutcome, OntologyError> {
        self.engine.apply_changes(changes, LoadContext::root())
    }

    /// Applies a single change.
    ///
    /// # Errors
    ///
    /// See [`ChangeEngine::apply_changes`].
    pub fn apply_change(&self, change: OntologyChange) -> Result<ChangeOutcome, OntologyError> {
        self.apply_changes(&[change])
    }

    /// Adds one axiom to `ontology`.
    ///
    /// # Errors
    ///
    /// See [`ChangeEngine::apply_changes`].
    pub fn add_axiom(
        &self,
        ontology: &OntologyHandle,
        axiom: Axiom,
    ) -> Result<ChangeOutcome, OntologyError> {
        self.apply_change(OntologyChange::add_axiom(ontology, axiom))
    }

    /// Adds `axioms` to `ontology` as one batch.
    ///
    /// # Errors
    ///
    /// See [`ChangeEngine::apply_changes`].
    pub fn add_axioms(
        &self,
        ontology: &OntologyHandle,
        axioms: impl IntoIterator<Item = Axiom>,
    ) -> Result<ChangeOutcome, OntologyError> {
        let changes: Vec<OntologyChange> = axioms
            .into_iter()
            .map(|axiom| OntologyChange::add_axiom(ontology, axiom))
            .collect();
        self.apply_changes(&changes)
    }

    /// Removes one axiom from `ontology`.
    ///
    /// # Errors
    ///
    /// See [`ChangeEngine::apply_changes`].
    pub fn remove_axiom(
        &self,
        ontology: &OntologyHandle,
        axiom: Axiom,
    ) -> Result<ChangeOutcome, OntologyError> {
        self.apply_change(OntologyChange::remove_axiom(ontology, axiom))
    }

    /// Removes `axioms` from `ontology` as one batch.
    ///
    /// # Errors
    ///
    /// See [`ChangeEngine::apply_changes`].
    pub fn remove_axioms(
        &self,
        ontology: &OntologyHandle,
        axioms: impl IntoIterator<Item = Axiom>,
    ) -> Result<ChangeOutcome, OntologyError> {
        let changes: Vec<OntologyChange> = axioms
            .into_iter()
            .map(|axiom| OntologyChange::remove_axiom(ontology, axiom))
            .collect();
        self.apply_changes(&changes)
    }

    // -- removal and locations -------------------------------------------

    /// Stops managing the ontology registered under `id`.
    ///
    /// Its document IRI, format and the import bindings pointing at it are
    /// dropped too. Returns the removed ontology.
    pub fn remove_ontology(&self, id: &OntologyId) -> Option<OntologyHandle> {
        let removed = self.registry.remove(id)?;
        self.imports.invalidate();
        tracing::info!(ontology_id = %id, "ontology removed");
        Some(removed)
    }

    /// Returns the document IRI of a managed ontology.
    ///
    /// # Errors
    ///
    /// [`OntologyError::UnknownOntology`] if `ontology` is not managed or
    /// has no document IRI.
    pub fn document_iri(&self, ontology: &OntologyHandle) -> Result<DocumentIri, OntologyError> {
        let id = self.managed_id(ontology)?;
        self.registry
            .document_iri(&id)
            .ok_or(OntologyError::UnknownOntology(id))
    }

    /// Rebinds a managed ontology to `document_iri`.
    ///
    /// # Errors
    ///
    /// [`OntologyError::UnknownOntology`] if `ontology` is not managed.
    pub fn set_document_iri(
        &self,
        ontology: &OntologyHandle,
        document_iri: DocumentIri,
    ) -> Result<(), OntologyError> {
        let id = self.managed_id(ontology)?;
        tracing::debug!(ontology_id = %id, %document_iri, "document IRI changed");
        self.registry.set_document_iri(id, document_iri);
        Ok(())
    }

    /// Returns the format recorded for `ontology`.
    #[must_use]
    pub fn ontology_format(&self, ontology: &OntologyHandle) -> Option<OntologyFormat> {
        self.registry.format(ontology)
    }

    /// Records the format `ontology` should be saved in.
    ///
    /// # Errors
    ///
    /// [`OntologyError::UnknownOntology`] if `ontology` is not managed.
    pub fn set_ontology_format(
        &self,
        ontology: &OntologyHandle,
        format: OntologyFormat,
    ) -> Result<(), OntologyError> {
        self.managed_id(ontology)?;
        self.registry.set_format(ontology.clone(), format);
        Ok(())
    }

    // -- collaborators ---------------------------------------------------

    /// Adds an IRI mapper ahead of all existing ones.
    pub fn add_iri_mapper(&self, mapper: Arc<dyn OntologyIriMapper>) {
        self.loader.add_iri_mapper(mapper);
    }

    /// Removes an IRI mapper. Returns `false` if absent.
    pub fn remove_iri_mapper(&self, mapper: &Arc<dyn OntologyIriMapper>) -> bool {
        self.loader.remove_iri_mapper(mapper)
    }

    /// Removes every IRI mapper, the default one included.
    pub fn clear_iri_mappers(&self) {
        self.loader.clear_iri_mappers();
    }

    /// Adds a factory ahead of all existing ones.
    pub fn add_ontology_factory(&self, factory: Arc<dyn OntologyFactory>) {
        self.loader.add_ontology_factory(factory);
    }

    /// Removes a factory. Returns `false` if absent.
    pub fn remove_ontology_factory(&self, factory: &Arc<dyn OntologyFactory>) -> bool {
        self.loader.remove_ontology_factory(factory)
    }

    /// Removes every factory, the default one included.
    pub fn clear_ontology_factories(&self) {
        self.loader.clear_ontology_factories();
    }

    /// Adds a storer ahead of all existing ones.
    pub fn add_ontology_storer(&self, storer: Arc<dyn OntologyStorer>) {
        self.storers.write().insert(0, storer);
    }

    /// Removes a storer. Returns `false` if absent.
    pub fn remove_ontology_storer(&self, storer: &Arc<dyn OntologyStorer>) -> bool {
        let mut storers = self.storers.write();
        let before = storers.len();
        storers.retain(|existing| !Arc::ptr_eq(existing, storer));
        storers.len() != before
    }

    /// Removes every storer.
    pub fn clear_ontology_storers(&self) {
        self.storers.write().clear();
    }

    // -- saving ----------------------------------------------------------

    /// Saves a managed ontology to its document IRI in its recorded format,
    /// falling back to the configured default format.
    ///
    /// # Errors
    ///
    /// - [`OntologyError::UnknownOntology`] if `ontology` is not managed.
    /// - See [`Self::save_ontology_as`].
    pub fn save_ontology(&self, ontology: &OntologyHandle) -> Result<(), OntologyError> {
        let target = self.document_iri(ontology)?;
        let format = self
            .registry
            .format(ontology)
            .unwrap_or_else(|| self.config.read().default_format.clone());
        self.save_ontology_as(ontology, &format, &target)
    }

    /// Writes `ontology` to `target` in `format` with the first storer that
    /// supports the format.
    ///
    /// # Errors
    ///
    /// - [`OntologyError::NoStorerFound`] if no storer supports `format`.
    /// - [`OntologyError::StorageFailure`] if the storer fails.
    pub fn save_ontology_as(
        &self,
        ontology: &OntologyHandle,
        format: &OntologyFormat,
        target: &DocumentIri,
    ) -> Result<(), OntologyError> {
        let storer = self
            .storers
            .read()
            .iter()
            .find(|storer| storer.can_store(format))
            .map(Arc::clone)
            .ok_or_else(|| OntologyError::NoStorerFound(format.clone()))?;

        storer.store(&**ontology, target, format)?;
        tracing::info!(
            ontology_id = %ontology.ontology_id(),
            %target,
            %format,
            "ontology saved"
        );
        Ok(())
    }

    fn managed_id(&self, ontology: &OntologyHandle) -> Result<OntologyId, OntologyError> {
        let id = ontology.ontology_id();
        if self.contains_handle(ontology) {
            Ok(id)
        } else {
            Err(OntologyError::UnknownOntology(id))
        }
    }
}

impl Default for OntologyManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

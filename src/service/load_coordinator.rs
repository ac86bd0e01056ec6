//! Document resolution, ontology creation and (re-entrant) loading.
//!
//! [`LoadCoordinator`] owns two ordered collaborator chains:
//!
//! - **IRI mappers** turn an ontology identifier into a document IRI.
//! - **Factories** create empty ontologies or parse documents.
//!
//! Both chains are consulted most-recently-added first, and the first
//! collaborator that answers wins.
//!
//! Factories register what they build through a [`LoadSession`], which
//! carries the [`LoadContext`] of the load. Imports requested during a load
//! recurse into the coordinator with a deeper context, so the change engine
//! can keep intermediate broadcasts quiet until the outermost call returns.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use super::change_engine::ChangeEngine;
use super::import_resolver::ImportResolver;
use super::load_context::LoadContext;
use crate::config::ManagerConfig;
use crate::domain::{
    ChangeOutcome, DocumentIri, DocumentSource, ImportDeclaration, Iri, ListenerHub, LoadEvent,
    MissingImportEvent, OntologyChange, OntologyCreationHandler, OntologyFactory, OntologyFormat,
    OntologyHandle, OntologyId, OntologyIriMapper, OntologyRegistry,
};
use crate::error::OntologyError;

/// Resolves, creates and loads ontologies through the collaborator chains.
#[derive(Debug)]
pub struct LoadCoordinator {
    registry: Arc<OntologyRegistry>,
    imports: Arc<ImportResolver>,
    listeners: Arc<ListenerHub>,
    engine: Arc<ChangeEngine>,
    config: Arc<RwLock<ManagerConfig>>,
    mappers: RwLock<Vec<Arc<dyn OntologyIriMapper>>>,
    factories: RwLock<Vec<Arc<dyn OntologyFactory>>>,
}

impl LoadCoordinator {
    /// Creates a coordinator with empty collaborator chains.
    #[must_use]
    pub fn new(
        registry: Arc<OntologyRegistry>,
        imports: Arc<ImportResolver>,
        listeners: Arc<ListenerHub>,
        engine: Arc<ChangeEngine>,
        config: Arc<RwLock<ManagerConfig>>,
    ) -> Self {
        Self {
            registry,
            imports,
            listeners,
            engine,
            config,
            mappers: RwLock::new(Vec::new()),
            factories: RwLock::new(Vec::new()),
        }
    }

    // -- collaborator chains ---------------------------------------------

    /// Adds a mapper ahead of all existing ones.
    pub fn add_iri_mapper(&self, mapper: Arc<dyn OntologyIriMapper>) {
        self.mappers.write().insert(0, mapper);
    }

    /// Removes a mapper previously added. Returns `false` if absent.
    pub fn remove_iri_mapper(&self, mapper: &Arc<dyn OntologyIriMapper>) -> bool {
        let mut mappers = self.mappers.write();
        let before = mappers.len();
        mappers.retain(|existing| !Arc::ptr_eq(existing, mapper));
        mappers.len() != before
    }

    /// Removes every mapper.
    pub fn clear_iri_mappers(&self) {
        self.mappers.write().clear();
    }

    /// Returns the mapper chain in consultation order.
    #[must_use]
    pub fn iri_mappers(&self) -> Vec<Arc<dyn OntologyIriMapper>> {
        self.mappers.read().clone()
    }

    /// Adds a factory ahead of all existing ones.
    pub fn add_ontology_factory(&self, factory: Arc<dyn OntologyFactory>) {
        self.factories.write().insert(0, factory);
    }

    /// Removes a factory previously added. Returns `false` if absent.
    pub fn remove_ontology_factory(&self, factory: &Arc<dyn OntologyFactory>) -> bool {
        let mut factories = self.factories.write();
        let before = factories.len();
        factories.retain(|existing| !Arc::ptr_eq(existing, factory));
        factories.len() != before
    }

    /// Removes every factory.
    pub fn clear_ontology_factories(&self) {
        self.factories.write().clear();
    }

    /// Returns the factory chain in consultation order.
    #[must_use]
    pub fn ontology_factories(&self) -> Vec<Arc<dyn OntologyFactory>> {
        self.factories.read().clone()
    }

    // -- resolution ------------------------------------------------------

    /// Asks the mapper chain where the document for `id` lives.
    ///
    /// Mappers receive the identifier's default document IRI (its version
    /// IRI if it has one).
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::NoDocumentLocationMapping`] when no mapper
    /// answers and `quiet` is `false`.
    pub fn resolve_document_iri(
        &self,
        id: &OntologyId,
        quiet: bool,
    ) -> Result<Option<DocumentIri>, OntologyError> {
        let default_document = id.default_document_iri();
        let found = self
            .iri_mappers()
            .iter()
            .find_map(|mapper| mapper.document_iri(default_document.as_iri()));

        match found {
            Some(document_iri) => {
                tracing::debug!(ontology_id = %id, %document_iri, "document IRI resolved");
                Ok(Some(document_iri))
            }
            None if quiet => Ok(None),
            None => Err(OntologyError::NoDocumentLocationMapping(id.clone())),
        }
    }

    // -- creation --------------------------------------------------------

    /// Creates an empty ontology named `id` through the factory chain.
    ///
    /// The document IRI comes from the mapper chain, or is generated when
    /// no mapper answers.
    ///
    /// # Errors
    ///
    /// - [`OntologyError::OntologyAlreadyExists`] if `id` is registered.
    /// - [`OntologyError::DocumentAlreadyExists`] if the document IRI is
    ///   already bound.
    /// - [`OntologyError::NoFactoryFound`] if no factory can create it.
    pub fn create_ontology(
        &self,
        id: OntologyId,
        ctx: LoadContext,
    ) -> Result<OntologyHandle, OntologyError> {
        if self.registry.contains(&id) {
            return Err(OntologyError::OntologyAlreadyExists(id));
        }
        let document_iri = self
            .resolve_document_iri(&id, true)?
            .unwrap_or_else(DocumentIri::generate);
        if self.registry.is_document_iri_bound(&document_iri) {
            // A concurrent create of the same id registers before binding its document.
            if self.registry.contains(&id) {
                return Err(OntologyError::OntologyAlreadyExists(id));
            }
            return Err(OntologyError::DocumentAlreadyExists(document_iri));
        }

        let factory = self
            .ontology_factories()
            .into_iter()
            .find(|factory| factory.can_create_from_document_iri(&document_iri))
            .ok_or_else(|| OntologyError::NoFactoryFound(document_iri.clone()))?;

        let session = LoadSession::new(self, ctx, document_iri.clone());
        let ontology = match factory.create_ontology(id, &document_iri, &session) {
            Ok(ontology) => ontology,
            Err(err) => {
                session.discard();
                return Err(err);
            }
        };
        self.registry
            .set_document_iri(ontology.ontology_id(), document_iri.clone());

        tracing::info!(
            ontology_id = %ontology.ontology_id(),
            %document_iri,
            "ontology created"
        );
        Ok(ontology)
    }

    // -- loading ---------------------------------------------------------

    /// Loads the ontology named `id`, or returns it if already registered.
    ///
    /// With `allow_exists`, a document IRI that is already bound yields the
    /// ontology bound to it instead of an error; import loads rely on this
    /// to stop at ontologies loaded earlier in the same chain.
    ///
    /// # Errors
    ///
    /// - [`OntologyError::NoDocumentLocationMapping`] if no mapper answers.
    /// - [`OntologyError::DocumentAlreadyExists`] if the resolved document is
    ///   bound and `allow_exists` is `false`.
    /// - Any failure of [`Self::load_from_source`].
    pub fn load_ontology(
        &self,
        id: &OntologyId,
        allow_exists: bool,
        ctx: LoadContext,
    ) -> Result<OntologyHandle, OntologyError> {
        if let Some(existing) = self.registry.get(id) {
            return Ok(existing);
        }
        let document_iri = self
            .resolve_document_iri(id, false)?
            .ok_or_else(|| OntologyError::NoDocumentLocationMapping(id.clone()))?;

        if let Some(bound) = self.bound_document(&document_iri, allow_exists)? {
            return Ok(bound);
        }

        self.load_source(
            Some(id.ontology_iri()),
            &DocumentSource::from_iri(document_iri),
            ctx,
        )
    }

    /// Loads whatever ontology lives at `document_iri`.
    ///
    /// # Errors
    ///
    /// [`OntologyError::DocumentAlreadyExists`] if the document is already
    /// loaded, otherwise as [`Self::load_from_source`].
    pub fn load_from_document(
        &self,
        document_iri: DocumentIri,
        ctx: LoadContext,
    ) -> Result<OntologyHandle, OntologyError> {
        self.load_from_source(&DocumentSource::from_iri(document_iri), ctx)
    }

    /// Loads an ontology from `source` through the first factory that
    /// accepts it.
    ///
    /// # Errors
    ///
    /// - [`OntologyError::DocumentAlreadyExists`] if the source's document
    ///   IRI is already bound.
    /// - [`OntologyError::NoFactoryFound`] if no factory accepts the source.
    /// - [`OntologyError::OntologyAlreadyExists`] if the parsed ontology's
    ///   identifier is already registered.
    /// - Parse, change and import failures raised while loading.
    pub fn load_from_source(
        &self,
        source: &DocumentSource,
        ctx: LoadContext,
    ) -> Result<OntologyHandle, OntologyError> {
        if self.bound_document(source.document_iri(), false)?.is_some() {
            return Err(OntologyError::DocumentAlreadyExists(
                source.document_iri().clone(),
            ));
        }
        self.load_source(None, source, ctx)
    }

    /// Loads the target of an import declaration and binds the declaration
    /// to it.
    ///
    /// Returns `Ok(None)` if the import failed and the silent
    /// missing-imports policy is on; a [`MissingImportEvent`] is fired in
    /// that case.
    ///
    /// # Errors
    ///
    /// [`OntologyError::UnloadableImport`] wrapping the load failure when
    /// the policy is off.
    pub fn load_import(
        &self,
        declaration: &ImportDeclaration,
        ctx: LoadContext,
    ) -> Result<Option<OntologyHandle>, OntologyError> {
        let id = OntologyId::new(declaration.iri().clone());
        match self.load_ontology(&id, true, ctx) {
            Ok(ontology) => {
                self.registry
                    .bind_import(declaration.clone(), ontology.ontology_id());
                self.imports.invalidate();
                Ok(Some(ontology))
            }
            Err(err) => {
                let silent = self.config.read().silent_missing_imports;
                if !silent {
                    return Err(OntologyError::UnloadableImport {
                        declaration: declaration.clone(),
                        source: Box::new(err),
                    });
                }
                tracing::warn!(%declaration, error = %err, "missing import tolerated");
                self.listeners
                    .fire_missing_import(&MissingImportEvent::new(declaration.clone(), &err));
                Ok(None)
            }
        }
    }

    fn bound_document(
        &self,
        document_iri: &DocumentIri,
        allow_exists: bool,
    ) -> Result<Option<OntologyHandle>, OntologyError> {
        if !self.registry.is_document_iri_bound(document_iri) {
            return Ok(None);
        }
        if !allow_exists {
            return Err(OntologyError::DocumentAlreadyExists(document_iri.clone()));
        }
        Ok(self.registry.ontology_by_document_iri(document_iri))
    }

    fn load_source(
        &self,
        ontology_iri: Option<&Iri>,
        source: &DocumentSource,
        ctx: LoadContext,
    ) -> Result<OntologyHandle, OntologyError> {
        let document_iri = source.document_iri().clone();
        let imported = ctx.is_loading();
        self.listeners.fire_load_event(&LoadEvent::LoadingStarted {
            ontology_iri: ontology_iri.cloned(),
            document_iri: document_iri.clone(),
            imported,
            timestamp: Utc::now(),
        });

        let session = LoadSession::new(self, ctx.enter_load(), document_iri.clone());
        let result = self
            .parse_with_factories(source, &session)
            .map_err(|err| {
                session.discard();
                match err {
                    OntologyError::RenameConflict { new_id } => {
                        OntologyError::OntologyAlreadyExists(new_id)
                    }
                    other => other,
                }
            });

        self.listeners.fire_load_event(&LoadEvent::LoadingFinished {
            ontology_id: result.as_ref().ok().map(|ontology| ontology.ontology_id()),
            document_iri: document_iri.clone(),
            imported,
            error: result.as_ref().err().map(ToString::to_string),
            timestamp: Utc::now(),
        });

        match &result {
            Ok(ontology) => tracing::info!(
                ontology_id = %ontology.ontology_id(),
                %document_iri,
                imported,
                "ontology loaded"
            ),
            Err(err) => tracing::debug!(%document_iri, error = %err, "ontology load failed"),
        }
        result
    }

    fn parse_with_factories(
        &self,
        source: &DocumentSource,
        session: &LoadSession<'_>,
    ) -> Result<OntologyHandle, OntologyError> {
        let factory = self
            .ontology_factories()
            .into_iter()
            .find(|factory| factory.can_load(source))
            .ok_or_else(|| OntologyError::NoFactoryFound(source.document_iri().clone()))?;

        let ontology = factory.load_ontology(source, session)?;
        self.registry
            .set_document_iri(ontology.ontology_id(), source.document_iri().clone());
        Ok(ontology)
    }
}

/// Creation callback handed to factories for one create or load call.
///
/// Registers what the factory builds, applies its content and loads its
/// imports, all inside the session's [`LoadContext`]. Ontologies registered
/// through a session are removed again if the call fails.
#[derive(Debug)]
pub struct LoadSession<'a> {
    coordinator: &'a LoadCoordinator,
    context: LoadContext,
    document_iri: DocumentIri,
    created: Mutex<Vec<OntologyHandle>>,
}

impl<'a> LoadSession<'a> {
    fn new(coordinator: &'a LoadCoordinator, context: LoadContext, document_iri: DocumentIri) -> Self {
        Self {
            coordinator,
            context,
            document_iri,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Load context this session runs in.
    #[must_use]
    pub const fn context(&self) -> LoadContext {
        self.context
    }

    /// Document being created or loaded.
    #[must_use]
    pub const fn document_iri(&self) -> &DocumentIri {
        &self.document_iri
    }

    fn discard(&self) {
        let registry = &self.coordinator.registry;
        for ontology in self.created.lock().drain(..) {
            let id = ontology.ontology_id();
            if registry.get(&id).is_some_and(|registered| registered == ontology) {
                registry.remove(&id);
                tracing::debug!(ontology_id = %id, "partially loaded ontology discarded");
            }
        }
        self.coordinator.imports.invalidate();
    }
}

impl OntologyCreationHandler for LoadSession<'_> {
    fn ontology_created(&self, ontology: &OntologyHandle) -> Result<(), OntologyError> {
        let coordinator = self.coordinator;
        let id = coordinator.registry.add(ontology.clone())?;
        self.created.lock().push(ontology.clone());
        if coordinator.registry.document_iri(&id).is_none() {
            coordinator
                .registry
                .set_document_iri(id.clone(), self.document_iri.clone());
        }
        coordinator.imports.bind_declarations_to(&id);
        Ok(())
    }

    fn set_ontology_format(&self, ontology: &OntologyHandle, format: OntologyFormat) {
        self.coordinator.registry.set_format(ontology.clone(), format);
    }

    fn apply_changes(&self, changes: &[OntologyChange]) -> Result<ChangeOutcome, OntologyError> {
        self.coordinator.engine.apply_changes(changes, self.context)
    }

    fn load_import(
        &self,
        declaration: &ImportDeclaration,
    ) -> Result<Option<OntologyHandle>, OntologyError> {
        self.coordinator.load_import(declaration, self.context)
    }
}

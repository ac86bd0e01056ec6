//! Narrow contracts for the pluggable collaborators: IRI mappers,
//! ontology factories and storers.
//!
//! The manager keeps one ordered chain per role. Newly added collaborators
//! are consulted first; the first one that answers wins.

use std::fmt;

use super::document::{DocumentSource, OntologyFormat};
use super::import_declaration::ImportDeclaration;
use super::iri::{DocumentIri, Iri};
use super::ontology::{Ontology, OntologyHandle};
use super::ontology_change::{ChangeOutcome, OntologyChange};
use super::ontology_id::OntologyId;
use crate::error::OntologyError;

/// Maps an ontology IRI to the document it lives in.
pub trait OntologyIriMapper: Send + Sync + fmt::Debug {
    /// Returns the document location for `ontology_iri`, or `None` if this
    /// mapper has no answer.
    fn document_iri(&self, ontology_iri: &Iri) -> Option<DocumentIri>;
}

/// Callback surface a factory uses while building an ontology.
///
/// Implemented by the load coordinator for the duration of a single create
/// or load call.
pub trait OntologyCreationHandler {
    /// Registers a freshly built (possibly still empty) ontology.
    ///
    /// Call this before applying content so imports loaded later can bind to
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::OntologyAlreadyExists`] if the identifier is
    /// taken.
    fn ontology_created(&self, ontology: &OntologyHandle) -> Result<(), OntologyError>;

    /// Records the format the ontology was parsed from.
    fn set_ontology_format(&self, ontology: &OntologyHandle, format: OntologyFormat);

    /// Applies content changes inside the load context.
    ///
    /// # Errors
    ///
    /// Propagates change-engine failures.
    fn apply_changes(&self, changes: &[OntologyChange]) -> Result<ChangeOutcome, OntologyError>;

    /// Loads the target of an import declaration inside the load context.
    ///
    /// Returns `Ok(None)` when the import is missing and the silent
    /// missing-imports policy tolerated it.
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::UnloadableImport`] otherwise.
    fn load_import(
        &self,
        declaration: &ImportDeclaration,
    ) -> Result<Option<OntologyHandle>, OntologyError>;
}

/// Creates empty ontologies and loads ontologies from documents.
pub trait OntologyFactory: Send + Sync + fmt::Debug {
    /// Returns `true` if this factory can create an empty ontology bound to
    /// `document_iri`.
    fn can_create_from_document_iri(&self, document_iri: &DocumentIri) -> bool;

    /// Creates an empty ontology with `id`, registering it through
    /// `handler`.
    ///
    /// # Errors
    ///
    /// Propagates registration failures from `handler`.
    fn create_ontology(
        &self,
        id: OntologyId,
        document_iri: &DocumentIri,
        handler: &dyn OntologyCreationHandler,
    ) -> Result<OntologyHandle, OntologyError>;

    /// Returns `true` if this factory understands `source`.
    fn can_load(&self, source: &DocumentSource) -> bool;

    /// Parses `source`, registering the ontology and its content through
    /// `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::InvalidDocument`] for unreadable input and
    /// propagates registration, change or import failures.
    fn load_ontology(
        &self,
        source: &DocumentSource,
        handler: &dyn OntologyCreationHandler,
    ) -> Result<OntologyHandle, OntologyError>;
}

/// Writes ontologies out in one or more formats.
pub trait OntologyStorer: Send + Sync + fmt::Debug {
    /// Returns `true` if this storer can write `format`.
    fn can_store(&self, format: &OntologyFormat) -> bool;

    /// Writes `ontology` to `target` in `format`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O failure.
    fn store(
        &self,
        ontology: &dyn Ontology,
        target: &DocumentIri,
        format: &OntologyFormat,
    ) -> std::io::Result<()>;
}

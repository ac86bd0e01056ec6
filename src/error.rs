//! Manager error types with stable numeric codes.
//!
//! [`OntologyError`] is the central error type of the crate. Each variant
//! maps to one failure condition and a numeric code. A veto is not an error:
//! it is reported through [`crate::domain::ChangeOutcome::Vetoed`].

use crate::domain::{ChangeKind, DocumentIri, ImportDeclaration, OntologyFormat, OntologyId};

/// Failure conditions reported by the manager and its collaborators.
///
/// # Error Code Ranges
///
/// | Range     | Category           |
/// |-----------|--------------------|
/// | 1000–1999 | Identity conflicts |
/// | 2000–2999 | Resolution         |
/// | 3000–3999 | Mutation safety    |
/// | 4000–4999 | Imports / parsing  |
/// | 5000–5999 | I/O                |
#[derive(Debug, thiserror::Error)]
pub enum OntologyError {
    /// An ontology with the given identifier is already registered.
    #[error("ontology already exists: {0}")]
    OntologyAlreadyExists(OntologyId),

    /// The document location is already bound to another ontology.
    #[error("ontology document already exists: {0}")]
    DocumentAlreadyExists(DocumentIri),

    /// A rename targeted an identifier held by a different ontology.
    #[error("cannot rename ontology to {new_id}: identifier held by another ontology")]
    RenameConflict {
        /// Identifier that was requested.
        new_id: OntologyId,
    },

    /// The ontology is not managed by this manager.
    #[error("unknown ontology: {0}")]
    UnknownOntology(OntologyId),

    /// No registered factory can create or load from the document.
    #[error("no ontology factory can handle {0}")]
    NoFactoryFound(DocumentIri),

    /// No registered storer supports the format.
    #[error("no ontology storer supports format {0}")]
    NoStorerFound(OntologyFormat),

    /// No mapper produced a document location for the identifier.
    #[error("no document mapping found for {0}")]
    NoDocumentLocationMapping(OntologyId),

    /// A change targeted an ontology that does not accept changes.
    #[error("cannot apply {kind} to immutable ontology {ontology}")]
    ImmutableTargetChange {
        /// Identifier of the target ontology.
        ontology: OntologyId,
        /// Kind of the refused change.
        kind: ChangeKind,
    },

    /// An imported ontology could not be loaded.
    #[error("could not load {declaration}: {source}")]
    UnloadableImport {
        /// The offending import declaration.
        declaration: ImportDeclaration,
        /// Why loading failed.
        #[source]
        source: Box<OntologyError>,
    },

    /// A document could not be understood by the factory reading it.
    #[error("invalid ontology document {document_iri}: {reason}")]
    InvalidDocument {
        /// Document that failed to parse.
        document_iri: DocumentIri,
        /// Parser message.
        reason: String,
    },

    /// Writing an ontology failed.
    #[error("storage failure: {0}")]
    StorageFailure(#[from] std::io::Error),
}

impl OntologyError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::OntologyAlreadyExists(_) => 1001,
            Self::DocumentAlreadyExists(_) => 1002,
            Self::RenameConflict { .. } => 1003,
            Self::UnknownOntology(_) => 1004,
            Self::NoFactoryFound(_) => 2001,
            Self::NoStorerFound(_) => 2002,
            Self::NoDocumentLocationMapping(_) => 2003,
            Self::ImmutableTargetChange { .. } => 3001,
            Self::UnloadableImport { .. } => 4001,
            Self::InvalidDocument { .. } => 4002,
            Self::StorageFailure(_) => 5001,
        }
    }

    /// Returns `true` for identity conflicts (1000–1999).
    #[must_use]
    pub const fn is_identity_conflict(&self) -> bool {
        matches!(
            self,
            Self::OntologyAlreadyExists(_)
                | Self::DocumentAlreadyExists(_)
                | Self::RenameConflict { .. }
        )
    }
}

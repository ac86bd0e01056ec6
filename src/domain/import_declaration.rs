//! Import declarations held inside an ontology.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::iri::{DocumentIri, Iri};

/// Reference from one ontology to another by IRI.
///
/// A declaration resolves to a loaded ontology only through the binding map
/// kept by [`super::OntologyRegistry`]; until the target is loaded the
/// declaration is simply unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportDeclaration {
    iri: Iri,
}

impl ImportDeclaration {
    /// Creates a declaration importing `iri`.
    #[must_use]
    pub fn new(iri: impl Into<Iri>) -> Self {
        Self { iri: iri.into() }
    }

    /// Returns the imported IRI.
    #[must_use]
    pub const fn iri(&self) -> &Iri {
        &self.iri
    }

    /// Returns `true` if this declaration targets the given document IRI.
    #[must_use]
    pub fn targets(&self, document_iri: &DocumentIri) -> bool {
        &self.iri == document_iri.as_iri()
    }
}

impl fmt::Display for ImportDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Import({})", self.iri)
    }
}

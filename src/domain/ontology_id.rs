//! Versioned ontology identifier.
//!
//! [`OntologyId`] pairs an ontology IRI with an optional version IRI. It is
//! the primary key of [`super::OntologyRegistry`]: at most one ontology is
//! registered per identifier at any instant.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::iri::{DocumentIri, Iri};

/// Identifier of an ontology: ontology IRI plus optional version IRI.
///
/// Equality and hashing consider both fields, so two versions of the same
/// ontology can be registered side by side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OntologyId {
    ontology_iri: Iri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_iri: Option<Iri>,
}

impl OntologyId {
    /// Creates an unversioned identifier.
    #[must_use]
    pub fn new(ontology_iri: impl Into<Iri>) -> Self {
        Self {
            ontology_iri: ontology_iri.into(),
            version_iri: None,
        }
    }

    /// Creates an identifier with a version IRI.
    #[must_use]
    pub fn with_version(ontology_iri: impl Into<Iri>, version_iri: impl Into<Iri>) -> Self {
        Self {
            ontology_iri: ontology_iri.into(),
            version_iri: Some(version_iri.into()),
        }
    }

    /// Returns the ontology IRI.
    #[must_use]
    pub const fn ontology_iri(&self) -> &Iri {
        &self.ontology_iri
    }

    /// Returns the version IRI, if any.
    #[must_use]
    pub const fn version_iri(&self) -> Option<&Iri> {
        self.version_iri.as_ref()
    }

    /// Returns the document IRI this ontology is expected to live at when no
    /// mapper says otherwise: the version IRI if present, otherwise the
    /// ontology IRI.
    #[must_use]
    pub fn default_document_iri(&self) -> DocumentIri {
        DocumentIri::from(self.version_iri.as_ref().unwrap_or(&self.ontology_iri).clone())
    }
}

impl fmt::Display for OntologyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_iri {
            Some(version) => write!(f, "{} {}", self.ontology_iri, version),
            None => write!(f, "{}", self.ontology_iri),
        }
    }
}

impl From<Iri> for OntologyId {
    fn from(iri: Iri) -> Self {
        Self::new(iri)
    }
}

impl From<&str> for OntologyId {
    fn from(iri: &str) -> Self {
        Self::new(iri)
    }
}

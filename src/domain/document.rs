//! Document formats and sources handed to factories and storers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::iri::DocumentIri;

/// Name of a serialization format (e.g. `"json-snapshot"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OntologyFormat(String);

impl OntologyFormat {
    /// Format name of the built-in JSON snapshot documents.
    pub const JSON_SNAPSHOT: &'static str = "json-snapshot";

    /// Creates a format from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The built-in JSON snapshot format.
    #[must_use]
    pub fn json_snapshot() -> Self {
        Self::new(Self::JSON_SNAPSHOT)
    }

    /// Returns the format name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OntologyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a factory reads an ontology document from.
///
/// Either just a location, which the factory resolves itself, or a
/// location plus the document text already in hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    document_iri: DocumentIri,
    content: Option<String>,
}

impl DocumentSource {
    /// A source identified only by its location.
    #[must_use]
    pub fn from_iri(document_iri: DocumentIri) -> Self {
        Self {
            document_iri,
            content: None,
        }
    }

    /// A source whose text is supplied directly.
    #[must_use]
    pub fn from_text(document_iri: DocumentIri, content: impl Into<String>) -> Self {
        Self {
            document_iri,
            content: Some(content.into()),
        }
    }

    /// Returns the document location.
    #[must_use]
    pub const fn document_iri(&self) -> &DocumentIri {
        &self.document_iri
    }

    /// Returns the inline document text, if supplied.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

//! IRI newtypes for ontology names and document locations.
//!
//! [`Iri`] names things inside an ontology (ontologies, classes, properties).
//! [`DocumentIri`] is the opaque external address an ontology is read from or
//! written to. Keeping them apart stops a document location from being used
//! where an ontology name is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An internationalized resource identifier.
///
/// No syntax validation is performed; the value is compared as an exact
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    /// Creates an IRI from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the IRI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// External address of an ontology document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentIri(Iri);

impl DocumentIri {
    /// Creates a document IRI from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(Iri::new(value))
    }

    /// Generates a fresh, unique document IRI for an ontology that has no
    /// mapped location.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(format!("urn:ontology-document:{}", uuid::Uuid::new_v4()))
    }

    /// Returns the underlying IRI.
    #[must_use]
    pub const fn as_iri(&self) -> &Iri {
        &self.0
    }

    /// Returns the document IRI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DocumentIri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Iri> for DocumentIri {
    fn from(iri: Iri) -> Self {
        Self(iri)
    }
}

impl From<&str> for DocumentIri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_wraps_in_angle_brackets() {
        let iri = Iri::new("http://x#A");
        assert_eq!(format!("{iri}"), "<http://x#A>");
    }

    #[test]
    fn generated_document_iris_are_unique() {
        let a = DocumentIri::generate();
        let b = DocumentIri::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("urn:ontology-document:"));
    }

    #[test]
    fn document_iri_serializes_as_plain_string() {
        let doc = DocumentIri::new("file:///tmp/a.json");
        let json = serde_json::to_string(&doc).unwrap_or_default();
        assert_eq!(json, "\"file:///tmp/a.json\"");
    }
}

//! Serialized document models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Axiom, ImportDeclaration, Iri, Ontology, OntologyId};

/// An ontology serialized as a `json-snapshot` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologySnapshot {
    /// Primary ontology IRI.
    pub ontology_iri: Iri,
    /// Version IRI, if the ontology is versioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_iri: Option<Iri>,
    /// Import declarations in declaration order.
    #[serde(default)]
    pub imports: Vec<ImportDeclaration>,
    /// Axioms held by the ontology.
    #[serde(default)]
    pub axioms: Vec<Axiom>,
    /// When the snapshot was taken. Absent in hand-written documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl OntologySnapshot {
    /// Captures the current content of `ontology`.
    #[must_use]
    pub fn capture(ontology: &dyn Ontology) -> Self {
        let id = ontology.ontology_id();
        Self {
            ontology_iri: id.ontology_iri().clone(),
            version_iri: id.version_iri().cloned(),
            imports: ontology.import_declarations(),
            axioms: ontology.axioms(),
            saved_at: Some(Utc::now()),
        }
    }

    /// Returns the identifier the snapshot declares.
    #[must_use]
    pub fn ontology_id(&self) -> OntologyId {
        match &self.version_iri {
            Some(version) => OntologyId::with_version(self.ontology_iri.clone(), version.clone()),
            None => OntologyId::new(self.ontology_iri.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{InMemoryOntology, OntologyChange, OntologyHandle};

    #[test]
    fn capture_keeps_identity_and_content() {
        let ontology = OntologyHandle::new(InMemoryOntology::new(OntologyId::with_version(
            "http://x/a",
            "http://x/a/1.0",
        )));
        let changes = [
            OntologyChange::add_import(&ontology, ImportDeclaration::new("http://x/b")),
            OntologyChange::add_axiom(&ontology, Axiom::declare_class("http://x#A")),
        ];
        for change in &changes {
            let Ok(_) = ontology.apply_change(change) else {
                panic!("change failed");
            };
        }

        let snapshot = OntologySnapshot::capture(&*ontology);
        assert_eq!(snapshot.ontology_id(), ontology.ontology_id());
        assert_eq!(snapshot.imports, vec![ImportDeclaration::new("http://x/b")]);
        assert_eq!(snapshot.axioms.len(), 1);
    }

    #[test]
    fn minimal_document_parses() {
        let json = r#"{"ontology_iri":"http://x/a"}"#;
        let Ok(snapshot) = serde_json::from_str::<OntologySnapshot>(json) else {
            panic!("minimal snapshot must parse");
        };
        assert_eq!(snapshot.ontology_id(), OntologyId::new("http://x/a"));
        assert!(snapshot.axioms.is_empty());
        assert!(snapshot.saved_at.is_none());
    }
}

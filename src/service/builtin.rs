//! Collaborators installed by default or commonly used in setups.

use crate::domain::{
    DocumentIri, DocumentSource, InMemoryOntology, Iri, OntologyCreationHandler, OntologyFactory,
    OntologyHandle, OntologyId, OntologyIriMapper,
};
use crate::error::OntologyError;

/// Mapper that treats every ontology IRI as its own document IRI.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityIriMapper;

impl OntologyIriMapper for IdentityIriMapper {
    fn document_iri(&self, ontology_iri: &Iri) -> Option<DocumentIri> {
        Some(DocumentIri::from(ontology_iri.clone()))
    }
}

/// Mapper answering for exactly one ontology IRI.
#[derive(Debug, Clone)]
pub struct SimpleIriMapper {
    ontology_iri: Iri,
    document_iri: DocumentIri,
}

impl SimpleIriMapper {
    /// Maps `ontology_iri` to `document_iri`.
    #[must_use]
    pub fn new(ontology_iri: impl Into<Iri>, document_iri: DocumentIri) -> Self {
        Self {
            ontology_iri: ontology_iri.into(),
            document_iri,
        }
    }
}

impl OntologyIriMapper for SimpleIriMapper {
    fn document_iri(&self, ontology_iri: &Iri) -> Option<DocumentIri> {
        (ontology_iri == &self.ontology_iri).then(|| self.document_iri.clone())
    }
}

/// Factory creating empty [`InMemoryOntology`] instances for any document.
///
/// It parses nothing: [`OntologyFactory::can_load`] is always `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyOntologyFactory;

impl OntologyFactory for EmptyOntologyFactory {
    fn can_create_from_document_iri(&self, _document_iri: &DocumentIri) -> bool {
        true
    }

    fn create_ontology(
        &self,
        id: OntologyId,
        _document_iri: &DocumentIri,
        handler: &dyn OntologyCreationHandler,
    ) -> Result<OntologyHandle, OntologyError> {
        let ontology = OntologyHandle::new(InMemoryOntology::new(id));
        handler.ontology_created(&ontology)?;
        Ok(ontology)
    }

    fn can_load(&self, _source: &DocumentSource) -> bool {
        false
    }

    fn load_ontology(
        &self,
        source: &DocumentSource,
        _handler: &dyn OntologyCreationHandler,
    ) -> Result<OntologyHandle, OntologyError> {
        Err(OntologyError::NoFactoryFound(source.document_iri().clone()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn identity_mapper_echoes_iri() {
        let iri = Iri::new("http://x/a");
        let Some(document) = IdentityIriMapper.document_iri(&iri) else {
            panic!("identity mapper must answer");
        };
        assert_eq!(document.as_iri(), &iri);
    }

    #[test]
    fn simple_mapper_answers_only_its_iri() {
        let mapper = SimpleIriMapper::new("http://x/a", DocumentIri::new("file:///a.json"));
        assert_eq!(
            mapper.document_iri(&Iri::new("http://x/a")),
            Some(DocumentIri::new("file:///a.json"))
        );
        assert_eq!(mapper.document_iri(&Iri::new("http://x/b")), None);
    }

    #[test]
    fn empty_factory_never_loads() {
        let source = DocumentSource::from_iri(DocumentIri::new("mem:a"));
        assert!(!EmptyOntologyFactory.can_load(&source));
        assert!(EmptyOntologyFactory.can_create_from_document_iri(source.document_iri()));
    }
}

//! Axiom value objects.
//!
//! Axioms are plain immutable values; the manager only needs to store,
//! compare and classify them.

use serde::{Deserialize, Serialize};

use super::iri::Iri;

/// A named entity that can be declared in an ontology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "iri", rename_all = "snake_case")]
pub enum Entity {
    /// A class.
    Class(Iri),
    /// An object property.
    ObjectProperty(Iri),
    /// A data property.
    DataProperty(Iri),
    /// An annotation property.
    AnnotationProperty(Iri),
    /// A named individual.
    NamedIndividual(Iri),
}

impl Entity {
    /// Returns the IRI naming this entity.
    #[must_use]
    pub const fn iri(&self) -> &Iri {
        match self {
            Self::Class(iri)
            | Self::ObjectProperty(iri)
            | Self::DataProperty(iri)
            | Self::AnnotationProperty(iri)
            | Self::NamedIndividual(iri) => iri,
        }
    }
}

/// A statement held by an ontology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "axiom_type", rename_all = "snake_case")]
pub enum Axiom {
    /// Declares that an entity exists.
    Declaration {
        /// Declared entity.
        entity: Entity,
    },
    /// `sub_class` is a subclass of `super_class`.
    SubClassOf {
        /// Subclass.
        sub_class: Iri,
        /// Superclass.
        super_class: Iri,
    },
    /// `individual` is an instance of `class`.
    ClassAssertion {
        /// Asserted class.
        class: Iri,
        /// Individual.
        individual: Iri,
    },
    /// `subject` is related to `object` through `property`.
    ObjectPropertyAssertion {
        /// Object property.
        property: Iri,
        /// Subject individual.
        subject: Iri,
        /// Object individual.
        object: Iri,
    },
    /// Annotates `subject` with a literal value.
    AnnotationAssertion {
        /// Annotation property (e.g. `rdfs:label`).
        property: Iri,
        /// Annotated IRI.
        subject: Iri,
        /// Literal value.
        value: String,
    },
}

impl Axiom {
    /// Shorthand for a class declaration.
    #[must_use]
    pub fn declare_class(iri: impl Into<Iri>) -> Self {
        Self::Declaration {
            entity: Entity::Class(iri.into()),
        }
    }

    /// Shorthand for a `SubClassOf` axiom.
    #[must_use]
    pub fn sub_class_of(sub_class: impl Into<Iri>, super_class: impl Into<Iri>) -> Self {
        Self::SubClassOf {
            sub_class: sub_class.into(),
            super_class: super_class.into(),
        }
    }

    /// Shorthand for an annotation assertion.
    #[must_use]
    pub fn annotation(
        property: impl Into<Iri>,
        subject: impl Into<Iri>,
        value: impl Into<String>,
    ) -> Self {
        Self::AnnotationAssertion {
            property: property.into(),
            subject: subject.into(),
            value: value.into(),
        }
    }

    /// Returns `true` for annotation axioms, which may be excluded from
    /// loading by configuration.
    #[must_use]
    pub const fn is_annotation_axiom(&self) -> bool {
        matches!(self, Self::AnnotationAssertion { .. })
    }

    /// Returns `true` for axioms that carry logical meaning (neither
    /// declarations nor annotations).
    #[must_use]
    pub const fn is_logical_axiom(&self) -> bool {
        !matches!(
            self,
            Self::Declaration { .. } | Self::AnnotationAssertion { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let decl = Axiom::declare_class("http://x#A");
        let sub = Axiom::sub_class_of("http://x#A", "http://x#B");
        let label = Axiom::annotation("rdfs:label", "http://x#A", "A");

        assert!(!decl.is_logical_axiom());
        assert!(!decl.is_annotation_axiom());
        assert!(sub.is_logical_axiom());
        assert!(label.is_annotation_axiom());
        assert!(!label.is_logical_axiom());
    }

    #[test]
    fn entity_iri_accessor() {
        let entity = Entity::ObjectProperty(Iri::new("http://x#p"));
        assert_eq!(entity.iri().as_str(), "http://x#p");
    }

    #[test]
    fn axiom_serializes_with_tag() {
        let json = serde_json::to_string(&Axiom::declare_class("http://x#A")).unwrap_or_default();
        assert!(json.contains("\"axiom_type\":\"declaration\""));
        assert!(json.contains("\"kind\":\"class\""));
    }
}

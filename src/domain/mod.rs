//! Domain layer: identifiers, ontologies, changes, the registry and the
//! listener system.
//!
//! This module contains the value types shared by every component, the
//! [`Ontology`] contract with its in-memory implementation, the
//! concurrent [`OntologyRegistry`], and the [`ListenerHub`] that delivers
//! change, veto, progress, load and missing-import notifications.

pub mod axiom;
pub mod collaborators;
pub mod document;
pub mod import_declaration;
pub mod iri;
pub mod listener_hub;
pub mod listener_id;
pub mod listeners;
pub mod ontology;
pub mod ontology_change;
pub mod ontology_event;
pub mod ontology_id;
pub mod ontology_registry;

pub use axiom::{Axiom, Entity};
pub use collaborators::{
    OntologyCreationHandler, OntologyFactory, OntologyIriMapper, OntologyStorer,
};
pub use document::{DocumentSource, OntologyFormat};
pub use import_declaration::ImportDeclaration;
pub use iri::{DocumentIri, Iri};
pub use listener_hub::ListenerHub;
pub use listener_id::ListenerId;
pub use listeners::{
    AcceptAll, ChangeBroadcastStrategy, ChangeProgressListener, ChangesVetoedListener,
    DefaultChangeBroadcastStrategy, DefaultImpendingChangeBroadcastStrategy, EventFilter,
    ImpendingChangeBroadcastStrategy, ImpendingChangeListener, MissingImportListener,
    OntologyChangeListener, OntologyLoaderListener, SilentChangeBroadcastStrategy,
    SpecificOntologyChangeBroadcastStrategy,
};
pub use ontology::{FrozenOntology, InMemoryOntology, Ontology, OntologyHandle};
pub use ontology_change::{ChangeKind, ChangeOutcome, ChangeVeto, OntologyChange};
pub use ontology_event::{LoadEvent, MissingImportEvent, ProgressEvent};
pub use ontology_id::OntologyId;
pub use ontology_registry::OntologyRegistry;

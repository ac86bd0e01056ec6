//! Notifications emitted by the manager.
//!
//! Load lifecycle and missing-import events are serializable so observers
//! can forward them to logs or external sinks. Progress events wrap live
//! changes and stay in-process.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::import_declaration::ImportDeclaration;
use super::iri::{DocumentIri, Iri};
use super::ontology_change::OntologyChange;
use super::ontology_id::OntologyId;
use crate::error::OntologyError;

/// Load lifecycle event.
///
/// `imported` is `true` when the load was triggered while another load was
/// already in progress on the same call chain (i.e. an import).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LoadEvent {
    /// Emitted before any factory is consulted.
    LoadingStarted {
        /// Requested ontology IRI, when known in advance.
        ontology_iri: Option<Iri>,
        /// Document being loaded.
        document_iri: DocumentIri,
        /// Whether this load is nested inside another load.
        imported: bool,
        /// Start timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after the load attempt finishes, successfully or not.
    LoadingFinished {
        /// Identifier of the loaded ontology, on success.
        ontology_id: Option<OntologyId>,
        /// Document that was loaded.
        document_iri: DocumentIri,
        /// Whether this load was nested inside another load.
        imported: bool,
        /// Failure message, if the load failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl LoadEvent {
    /// Returns the document IRI associated with this event.
    #[must_use]
    pub const fn document_iri(&self) -> &DocumentIri {
        match self {
            Self::LoadingStarted { document_iri, .. }
            | Self::LoadingFinished { document_iri, .. } => document_iri,
        }
    }

    /// Returns `true` if the event belongs to a nested (import) load.
    #[must_use]
    pub const fn is_imported(&self) -> bool {
        match self {
            Self::LoadingStarted { imported, .. } | Self::LoadingFinished { imported, .. } => {
                *imported
            }
        }
    }

    /// Returns `true` for a finished event without error.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self, Self::LoadingFinished { error: None, .. })
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::LoadingStarted { .. } => "loading_started",
            Self::LoadingFinished { .. } => "loading_finished",
        }
    }
}

/// An import that could not be loaded and was tolerated under the silent
/// missing-imports policy.
#[derive(Debug, Clone, Serialize)]
pub struct MissingImportEvent {
    /// The offending declaration.
    pub declaration: ImportDeclaration,
    /// Why the import could not be loaded.
    pub cause: String,
    /// Error code of the underlying failure.
    pub error_code: u32,
    /// When the import was given up on.
    pub timestamp: DateTime<Utc>,
}

impl MissingImportEvent {
    /// Creates an event for `declaration` failing with `cause`.
    #[must_use]
    pub fn new(declaration: ImportDeclaration, cause: &OntologyError) -> Self {
        Self {
            declaration,
            cause: cause.to_string(),
            error_code: cause.error_code(),
            timestamp: Utc::now(),
        }
    }
}

/// Progress notification fired while a batch is being enacted.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A batch of `size` changes is about to be processed.
    Begin {
        /// Number of changes in the batch.
        size: usize,
    },
    /// One change was enacted.
    Applied {
        /// The enacted change.
        change: OntologyChange,
    },
    /// The batch finished processing.
    End,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn loading_finished_serializes_without_error_field() {
        let event = LoadEvent::LoadingFinished {
            ontology_id: Some(OntologyId::new("http://x/a")),
            document_iri: DocumentIri::new("mem:a"),
            imported: false,
            error: None,
            timestamp: Utc::now(),
        };
        assert!(event.succeeded());
        assert_eq!(event.event_type_str(), "loading_finished");

        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"loading_finished\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn started_event_is_not_success() {
        let event = LoadEvent::LoadingStarted {
            ontology_iri: None,
            document_iri: DocumentIri::new("mem:a"),
            imported: true,
            timestamp: Utc::now(),
        };
        assert!(!event.succeeded());
        assert!(event.is_imported());
        assert_eq!(event.document_iri().as_str(), "mem:a");
    }

    #[test]
    fn missing_import_event_records_cause() {
        let err = OntologyError::NoFactoryFound(DocumentIri::new("http://x/gone"));
        let event = MissingImportEvent::new(ImportDeclaration::new("http://x/gone"), &err);
        assert_eq!(event.error_code, 2001);
        assert!(event.cause.contains("http://x/gone"));
    }
}

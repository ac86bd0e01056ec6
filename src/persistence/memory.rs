//! Concurrent in-memory document store.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::domain::DocumentIri;

/// Documents keyed by document IRI.
///
/// Stands in for file or network I/O. A read-only store rejects writes
/// with [`io::ErrorKind::PermissionDenied`].
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<DocumentIri, String>,
    read_only: AtomicBool,
}

impl MemoryDocumentStore {
    /// Creates an empty, writable store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the document at `document_iri`.
    ///
    /// # Errors
    ///
    /// [`io::ErrorKind::NotFound`] if nothing is stored there.
    pub fn read(&self, document_iri: &DocumentIri) -> io::Result<String> {
        self.documents
            .get(document_iri)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no document at {document_iri}"),
                )
            })
    }

    /// Stores `content` at `document_iri`, replacing any previous document.
    ///
    /// # Errors
    ///
    /// [`io::ErrorKind::PermissionDenied`] if the store is read-only.
    pub fn write(&self, document_iri: DocumentIri, content: String) -> io::Result<()> {
        if self.is_read_only() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("document store is read-only, cannot write {document_iri}"),
            ));
        }
        tracing::debug!(%document_iri, bytes = content.len(), "document written");
        self.documents.insert(document_iri, content);
        Ok(())
    }

    /// Removes and returns the document at `document_iri`.
    pub fn remove(&self, document_iri: &DocumentIri) -> Option<String> {
        self.documents.remove(document_iri).map(|(_, content)| content)
    }

    /// Returns `true` if a document is stored at `document_iri`.
    #[must_use]
    pub fn contains(&self, document_iri: &DocumentIri) -> bool {
        self.documents.contains_key(document_iri)
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Makes the store reject (or accept again) writes.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Release);
    }

    /// Returns `true` if writes are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }
}

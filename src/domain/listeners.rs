//! Listener roles, broadcast strategies and event filters.
//!
//! Each listener role is a small capability trait. Closures implement the
//! single-method roles directly, so `Arc::new(|changes: &[OntologyChange]|
//! Ok(()))` is a valid change listener.
//!
//! A registration pairs a listener with a policy deciding how each event
//! reaches it: a [`ChangeBroadcastStrategy`] or
//! [`ImpendingChangeBroadcastStrategy`] for the two change channels, an
//! [`EventFilter`] for the others.

use std::fmt;

use super::ontology::OntologyHandle;
use super::ontology_change::{ChangeVeto, OntologyChange};
use super::ontology_event::{LoadEvent, MissingImportEvent};

/// Receives committed change batches.
pub trait OntologyChangeListener: Send + Sync {
    /// Called once per committed batch.
    ///
    /// # Errors
    ///
    /// Any error is logged by the hub and otherwise ignored.
    fn ontologies_changed(&self, changes: &[OntologyChange]) -> anyhow::Result<()>;
}

impl<F> OntologyChangeListener for F
where
    F: Fn(&[OntologyChange]) -> anyhow::Result<()> + Send + Sync,
{
    fn ontologies_changed(&self, changes: &[OntologyChange]) -> anyhow::Result<()> {
        self(changes)
    }
}

/// Inspects a batch before it is enacted and may veto it.
pub trait ImpendingChangeListener: Send + Sync {
    /// Called once per proposed batch.
    ///
    /// # Errors
    ///
    /// Returning a [`ChangeVeto`] rejects the whole batch.
    fn handle_impending_changes(&self, changes: &[OntologyChange]) -> Result<(), ChangeVeto>;
}

impl<F> ImpendingChangeListener for F
where
    F: Fn(&[OntologyChange]) -> Result<(), ChangeVeto> + Send + Sync,
{
    fn handle_impending_changes(&self, changes: &[OntologyChange]) -> Result<(), ChangeVeto> {
        self(changes)
    }
}

/// Told about batches that an impending-change listener vetoed.
pub trait ChangesVetoedListener: Send + Sync {
    /// Called once per vetoed batch.
    ///
    /// # Errors
    ///
    /// Any error is logged by the hub and otherwise ignored.
    fn changes_vetoed(&self, changes: &[OntologyChange], veto: &ChangeVeto) -> anyhow::Result<()>;
}

impl<F> ChangesVetoedListener for F
where
    F: Fn(&[OntologyChange], &ChangeVeto) -> anyhow::Result<()> + Send + Sync,
{
    fn changes_vetoed(&self, changes: &[OntologyChange], veto: &ChangeVeto) -> anyhow::Result<()> {
        self(changes, veto)
    }
}

/// Follows a batch while it is being enacted.
///
/// All methods default to doing nothing.
pub trait ChangeProgressListener: Send + Sync {
    /// A batch of `size` changes is starting.
    ///
    /// # Errors
    ///
    /// Any error is logged by the hub and otherwise ignored.
    fn begin(&self, _size: usize) -> anyhow::Result<()> {
        Ok(())
    }

    /// One change was enacted.
    ///
    /// # Errors
    ///
    /// Any error is logged by the hub and otherwise ignored.
    fn applied_change(&self, _change: &OntologyChange) -> anyhow::Result<()> {
        Ok(())
    }

    /// The batch is finished.
    ///
    /// # Errors
    ///
    /// Any error is logged by the hub and otherwise ignored.
    fn end(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Told about loading started/finished events.
pub trait OntologyLoaderListener: Send + Sync {
    /// Called for every load lifecycle event.
    ///
    /// # Errors
    ///
    /// Any error is logged by the hub and otherwise ignored.
    fn load_event(&self, event: &LoadEvent) -> anyhow::Result<()>;
}

impl<F> OntologyLoaderListener for F
where
    F: Fn(&LoadEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn load_event(&self, event: &LoadEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Told about imports that were tolerated as missing.
pub trait MissingImportListener: Send + Sync {
    /// Called once per missing import.
    ///
    /// # Errors
    ///
    /// Any error is logged by the hub and otherwise ignored.
    fn import_missing(&self, event: &MissingImportEvent) -> anyhow::Result<()>;
}

impl<F> MissingImportListener for F
where
    F: Fn(&MissingImportEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn import_missing(&self, event: &MissingImportEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Decides how a committed batch reaches one change listener.
pub trait ChangeBroadcastStrategy: Send + Sync + fmt::Debug {
    /// Delivers (some of) `changes` to `listener`.
    ///
    /// # Errors
    ///
    /// Propagates the listener's error to the hub, which logs it.
    fn broadcast_changes(
        &self,
        listener: &dyn OntologyChangeListener,
        changes: &[OntologyChange],
    ) -> anyhow::Result<()>;
}

/// Forwards every batch unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultChangeBroadcastStrategy;

impl ChangeBroadcastStrategy for DefaultChangeBroadcastStrategy {
    fn broadcast_changes(
        &self,
        listener: &dyn OntologyChangeListener,
        changes: &[OntologyChange],
    ) -> anyhow::Result<()> {
        listener.ontologies_changed(changes)
    }
}

/// Never forwards anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentChangeBroadcastStrategy;

impl ChangeBroadcastStrategy for SilentChangeBroadcastStrategy {
    fn broadcast_changes(
        &self,
        _listener: &dyn OntologyChangeListener,
        _changes: &[OntologyChange],
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Forwards only the changes targeting one ontology, and nothing when a
/// batch holds none.
#[derive(Debug, Clone)]
pub struct SpecificOntologyChangeBroadcastStrategy {
    ontology: OntologyHandle,
}

impl SpecificOntologyChangeBroadcastStrategy {
    /// Restricts delivery to changes against `ontology`.
    #[must_use]
    pub const fn new(ontology: OntologyHandle) -> Self {
        Self { ontology }
    }
}

impl ChangeBroadcastStrategy for SpecificOntologyChangeBroadcastStrategy {
    fn broadcast_changes(
        &self,
        listener: &dyn OntologyChangeListener,
        changes: &[OntologyChange],
    ) -> anyhow::Result<()> {
        let relevant: Vec<OntologyChange> = changes
            .iter()
            .filter(|change| change.ontology() == &self.ontology)
            .cloned()
            .collect();
        if relevant.is_empty() {
            return Ok(());
        }
        listener.ontologies_changed(&relevant)
    }
}

/// Decides how a proposed batch reaches one impending-change listener.
pub trait ImpendingChangeBroadcastStrategy: Send + Sync + fmt::Debug {
    /// Delivers `changes` to `listener`.
    ///
    /// # Errors
    ///
    /// Returns the listener's veto.
    fn broadcast_changes(
        &self,
        listener: &dyn ImpendingChangeListener,
        changes: &[OntologyChange],
    ) -> Result<(), ChangeVeto>;
}

/// Forwards every proposed batch unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImpendingChangeBroadcastStrategy;

impl ImpendingChangeBroadcastStrategy for DefaultImpendingChangeBroadcastStrategy {
    fn broadcast_changes(
        &self,
        listener: &dyn ImpendingChangeListener,
        changes: &[OntologyChange],
    ) -> Result<(), ChangeVeto> {
        listener.handle_impending_changes(changes)
    }
}

/// Per-registration predicate for the progress, loader, missing-import and
/// vetoed channels.
pub trait EventFilter<E: ?Sized>: Send + Sync {
    /// Returns `true` if `event` should reach the listener.
    fn accepts(&self, event: &E) -> bool;
}

impl<E: ?Sized, F> EventFilter<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn accepts(&self, event: &E) -> bool {
        self(event)
    }
}

/// Filter that lets every event through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<E: ?Sized> EventFilter<E> for AcceptAll {
    fn accepts(&self, _event: &E) -> bool {
        true
    }
}

//! Listener registrations and event delivery.
//!
//! [`ListenerHub`] keeps one registration list per listener role. Every
//! broadcast snapshots the relevant list under a short lock and then invokes
//! the listeners with no lock held, so a listener may register or remove
//! listeners (or apply further changes) without deadlocking, and such
//! edits only affect later broadcasts.
//!
//! Listener failures never reach the caller that triggered the event: errors
//! and panics are logged at `warn` level and delivery moves on to the next
//! registration. The one exception is an impending-change veto, which stops
//! the impending broadcast and rejects the batch.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::listener_id::ListenerId;
use super::listeners::{
    AcceptAll, ChangeBroadcastStrategy, ChangeProgressListener, ChangesVetoedListener,
    DefaultChangeBroadcastStrategy, DefaultImpendingChangeBroadcastStrategy, EventFilter,
    ImpendingChangeBroadcastStrategy, ImpendingChangeListener, MissingImportListener,
    OntologyChangeListener, OntologyLoaderListener,
};
use super::ontology_change::{ChangeVeto, OntologyChange};
use super::ontology_event::{LoadEvent, MissingImportEvent, ProgressEvent};

struct Registration<L: ?Sized, S: ?Sized> {
    id: ListenerId,
    listener: Arc<L>,
    policy: Arc<S>,
}

impl<L: ?Sized, S: ?Sized> Clone for Registration<L, S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
            policy: Arc::clone(&self.policy),
        }
    }
}

struct Channel<L: ?Sized, S: ?Sized> {
    registrations: Mutex<Vec<Registration<L, S>>>,
}

impl<L: ?Sized, S: ?Sized> Channel<L, S> {
    fn new() -> Self {
        Self {
            registrations: Mutex::new(Vec::new()),
        }
    }

    fn register(&self, listener: Arc<L>, policy: Arc<S>) -> ListenerId {
        let id = ListenerId::new();
        self.registrations.lock().push(Registration {
            id,
            listener,
            policy,
        });
        id
    }

    fn unregister(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.lock();
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        registrations.len() != before
    }

    fn snapshot(&self) -> Vec<Registration<L, S>> {
        self.registrations.lock().clone()
    }

    fn len(&self) -> usize {
        self.registrations.lock().len()
    }
}

/// Runs one listener callback, logging errors and panics instead of
/// propagating them.
fn deliver(channel: &'static str, id: ListenerId, callback: impl FnOnce() -> anyhow::Result<()>) {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(channel, listener = %id, error = %err, "listener failed");
        }
        Err(_) => {
            tracing::warn!(channel, listener = %id, "listener panicked");
        }
    }
}

type ChangeChannel = Channel<dyn OntologyChangeListener, dyn ChangeBroadcastStrategy>;
type ImpendingChannel =
    Channel<dyn ImpendingChangeListener, dyn ImpendingChangeBroadcastStrategy>;
type FilteredChannel<L, E> = Channel<L, dyn EventFilter<E>>;

/// Registry of all listeners and the broadcast entry points.
pub struct ListenerHub {
    change: ChangeChannel,
    impending: ImpendingChannel,
    vetoed: FilteredChannel<dyn ChangesVetoedListener, ChangeVeto>,
    progress: FilteredChannel<dyn ChangeProgressListener, ProgressEvent>,
    loader: FilteredChannel<dyn OntologyLoaderListener, LoadEvent>,
    missing_import: FilteredChannel<dyn MissingImportListener, MissingImportEvent>,
    default_change_strategy: RwLock<Arc<dyn ChangeBroadcastStrategy>>,
    default_impending_strategy: RwLock<Arc<dyn ImpendingChangeBroadcastStrategy>>,
}

impl ListenerHub {
    /// Creates a hub with no listeners and the default strategies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            change: Channel::new(),
            impending: Channel::new(),
            vetoed: Channel::new(),
            progress: Channel::new(),
            loader: Channel::new(),
            missing_import: Channel::new(),
            default_change_strategy: RwLock::new(Arc::new(DefaultChangeBroadcastStrategy)),
            default_impending_strategy: RwLock::new(Arc::new(
                DefaultImpendingChangeBroadcastStrategy,
            )),
        }
    }

    // -- change listeners -------------------------------------------------

    /// Registers a change listener under the current default strategy.
    pub fn add_change_listener(&self, listener: Arc<dyn OntologyChangeListener>) -> ListenerId {
        let strategy = Arc::clone(&*self.default_change_strategy.read());
        self.change.register(listener, strategy)
    }

    /// Registers a change listener with its own strategy.
    pub fn add_change_listener_with_strategy(
        &self,
        listener: Arc<dyn OntologyChangeListener>,
        strategy: Arc<dyn ChangeBroadcastStrategy>,
    ) -> ListenerId {
        self.change.register(listener, strategy)
    }

    /// Removes a change listener registration.
    ///
    /// Returns `false` if `id` was not registered.
    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        self.change.unregister(id)
    }

    /// Replaces the strategy used by later [`Self::add_change_listener`]
    /// calls. Existing registrations keep theirs.
    pub fn set_default_change_broadcast_strategy(
        &self,
        strategy: Arc<dyn ChangeBroadcastStrategy>,
    ) {
        tracing::debug!(?strategy, "default change broadcast strategy replaced");
        *self.default_change_strategy.write() = strategy;
    }

    // -- impending change listeners ---------------------------------------

    /// Registers an impending-change listener under the default strategy.
    pub fn add_impending_change_listener(
        &self,
        listener: Arc<dyn ImpendingChangeListener>,
    ) -> ListenerId {
        let strategy = Arc::clone(&*self.default_impending_strategy.read());
        self.impending.register(listener, strategy)
    }

    /// Registers an impending-change listener with its own strategy.
    pub fn add_impending_change_listener_with_strategy(
        &self,
        listener: Arc<dyn ImpendingChangeListener>,
        strategy: Arc<dyn ImpendingChangeBroadcastStrategy>,
    ) -> ListenerId {
        self.impending.register(listener, strategy)
    }

    /// Removes an impending-change listener registration.
    pub fn remove_impending_change_listener(&self, id: ListenerId) -> bool {
        self.impending.unregister(id)
    }

    /// Replaces the strategy used by later
    /// [`Self::add_impending_change_listener`] calls.
    pub fn set_default_impending_change_broadcast_strategy(
        &self,
        strategy: Arc<dyn ImpendingChangeBroadcastStrategy>,
    ) {
        *self.default_impending_strategy.write() = strategy;
    }

    // -- filtered channels ------------------------------------------------

    /// Registers a listener for vetoed batches.
    pub fn add_changes_vetoed_listener(
        &self,
        listener: Arc<dyn ChangesVetoedListener>,
    ) -> ListenerId {
        self.vetoed.register(listener, Arc::new(AcceptAll))
    }

    /// Registers a listener for vetoed batches, filtered on the veto.
    pub fn add_changes_vetoed_listener_with_filter(
        &self,
        listener: Arc<dyn ChangesVetoedListener>,
        filter: Arc<dyn EventFilter<ChangeVeto>>,
    ) -> ListenerId {
        self.vetoed.register(listener, filter)
    }

    /// Removes a vetoed-batch listener registration.
    pub fn remove_changes_vetoed_listener(&self, id: ListenerId) -> bool {
        self.vetoed.unregister(id)
    }

    /// Registers a progress listener.
    pub fn add_progress_listener(&self, listener: Arc<dyn ChangeProgressListener>) -> ListenerId {
        self.progress.register(listener, Arc::new(AcceptAll))
    }

    /// Registers a progress listener that only sees events `filter` accepts.
    pub fn add_progress_listener_with_filter(
        &self,
        listener: Arc<dyn ChangeProgressListener>,
        filter: Arc<dyn EventFilter<ProgressEvent>>,
    ) -> ListenerId {
        self.progress.register(listener, filter)
    }

    /// Removes a progress listener registration.
    pub fn remove_progress_listener(&self, id: ListenerId) -> bool {
        self.progress.unregister(id)
    }

    /// Registers a loader listener.
    pub fn add_loader_listener(&self, listener: Arc<dyn OntologyLoaderListener>) -> ListenerId {
        self.loader.register(listener, Arc::new(AcceptAll))
    }

    /// Registers a loader listener that only sees events `filter` accepts.
    pub fn add_loader_listener_with_filter(
        &self,
        listener: Arc<dyn OntologyLoaderListener>,
        filter: Arc<dyn EventFilter<LoadEvent>>,
    ) -> ListenerId {
        self.loader.register(listener, filter)
    }

    /// Removes a loader listener registration.
    pub fn remove_loader_listener(&self, id: ListenerId) -> bool {
        self.loader.unregister(id)
    }

    /// Registers a missing-import listener.
    pub fn add_missing_import_listener(
        &self,
        listener: Arc<dyn MissingImportListener>,
    ) -> ListenerId {
        self.missing_import.register(listener, Arc::new(AcceptAll))
    }

    /// Registers a missing-import listener that only sees events `filter`
    /// accepts.
    pub fn add_missing_import_listener_with_filter(
        &self,
        listener: Arc<dyn MissingImportListener>,
        filter: Arc<dyn EventFilter<MissingImportEvent>>,
    ) -> ListenerId {
        self.missing_import.register(listener, filter)
    }

    /// Removes a missing-import listener registration.
    pub fn remove_missing_import_listener(&self, id: ListenerId) -> bool {
        self.missing_import.unregister(id)
    }

    // -- broadcasts -------------------------------------------------------

    /// Delivers a committed batch to every change listener through its
    /// strategy. Empty batches are not delivered.
    pub fn broadcast_changes(&self, changes: &[OntologyChange]) {
        if changes.is_empty() {
            return;
        }
        for registration in self.change.snapshot() {
            deliver("change", registration.id, || {
                registration
                    .policy
                    .broadcast_changes(&*registration.listener, changes)
            });
        }
    }

    /// Offers a proposed batch to every impending-change listener.
    ///
    /// # Errors
    ///
    /// Returns the first veto raised; listeners after the vetoing one are not
    /// consulted. A panicking listener is logged and does not veto.
    pub fn broadcast_impending_changes(&self, changes: &[OntologyChange]) -> Result<(), ChangeVeto> {
        for registration in self.impending.snapshot() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                registration
                    .policy
                    .broadcast_changes(&*registration.listener, changes)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(veto)) => {
                    tracing::debug!(listener = %registration.id, %veto, "batch vetoed");
                    return Err(veto);
                }
                Err(_) => {
                    tracing::warn!(
                        channel = "impending",
                        listener = %registration.id,
                        "listener panicked"
                    );
                }
            }
        }
        Ok(())
    }

    /// Tells vetoed-batch listeners that `changes` were rejected.
    pub fn broadcast_changes_vetoed(&self, changes: &[OntologyChange], veto: &ChangeVeto) {
        for registration in self.vetoed.snapshot() {
            if registration.policy.accepts(veto) {
                deliver("vetoed", registration.id, || {
                    registration.listener.changes_vetoed(changes, veto)
                });
            }
        }
    }

    /// Fires the batch-begin progress event.
    pub fn fire_begin_changes(&self, size: usize) {
        let registrations = self.progress.snapshot();
        if registrations.is_empty() {
            return;
        }
        let event = ProgressEvent::Begin { size };
        for registration in registrations {
            if registration.policy.accepts(&event) {
                deliver("progress", registration.id, || {
                    registration.listener.begin(size)
                });
            }
        }
    }

    /// Fires the per-change progress event.
    pub fn fire_change_applied(&self, change: &OntologyChange) {
        let registrations = self.progress.snapshot();
        if registrations.is_empty() {
            return;
        }
        let event = ProgressEvent::Applied {
            change: change.clone(),
        };
        for registration in registrations {
            if registration.policy.accepts(&event) {
                deliver("progress", registration.id, || {
                    registration.listener.applied_change(change)
                });
            }
        }
    }

    /// Fires the batch-end progress event.
    pub fn fire_end_changes(&self) {
        for registration in self.progress.snapshot() {
            if registration.policy.accepts(&ProgressEvent::End) {
                deliver("progress", registration.id, || registration.listener.end());
            }
        }
    }

    /// Delivers a load lifecycle event to loader listeners.
    pub fn fire_load_event(&self, event: &LoadEvent) {
        for registration in self.loader.snapshot() {
            if registration.policy.accepts(event) {
                deliver("loader", registration.id, || {
                    registration.listener.load_event(event)
                });
            }
        }
    }

    /// Delivers a missing-import event to missing-import listeners.
    pub fn fire_missing_import(&self, event: &MissingImportEvent) {
        for registration in self.missing_import.snapshot() {
            if registration.policy.accepts(event) {
                deliver("missing_import", registration.id, || {
                    registration.listener.import_missing(event)
                });
            }
        }
    }

    /// Total number of registrations across all channels.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.change.len()
            + self.impending.len()
            + self.vetoed.len()
            + self.progress.len()
            + self.loader.len()
            + self.missing_import.len()
    }
}

impl Default for ListenerHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHub")
            .field("change", &self.change.len())
            .field("impending", &self.impending.len())
            .field("vetoed", &self.vetoed.len())
            .field("progress", &self.progress.len())
            .field("loader", &self.loader.len())
            .field("missing_import", &self.missing_import.len())
            .finish_non_exhaustive()
    }
}

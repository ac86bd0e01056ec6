//! Batch change application.
//!
//! [`ChangeEngine::apply_changes`] runs one batch through four stages:
//!
//! 1. **Gate**: impending-change listeners see the whole batch and may veto
//!    it. A veto is reported to vetoed-batch listeners and returned as
//!    [`ChangeOutcome::Vetoed`]; nothing is enacted.
//! 2. **Enact**: changes are enacted in order. Annotation axiom additions are
//!    skipped when annotation loading is disabled. A change against an
//!    immutable ontology fails the batch; earlier changes stay enacted.
//! 3. **Bookkeeping**: identifier changes rename the registry entry, import
//!    changes update declaration bindings, and both invalidate the
//!    imports-closure cache.
//! 4. **Announce**: progress events and the committed broadcast, unless the
//!    call chain is inside a load.

use std::sync::Arc;

use parking_lot::RwLock;

use super::import_resolver::ImportResolver;
use super::load_context::LoadContext;
use crate::config::ManagerConfig;
use crate::domain::{
    Axiom, ChangeKind, ChangeOutcome, ListenerHub, OntologyChange, OntologyHandle, OntologyId,
    OntologyRegistry,
};
use crate::error::OntologyError;

/// Applies change batches and keeps registry bookkeeping in step.
#[derive(Debug)]
pub struct ChangeEngine {
    registry: Arc<OntologyRegistry>,
    imports: Arc<ImportResolver>,
    listeners: Arc<ListenerHub>,
    config: Arc<RwLock<ManagerConfig>>,
}

impl ChangeEngine {
    /// Creates an engine over the shared components.
    #[must_use]
    pub fn new(
        registry: Arc<OntologyRegistry>,
        imports: Arc<ImportResolver>,
        listeners: Arc<ListenerHub>,
        config: Arc<RwLock<ManagerConfig>>,
    ) -> Self {
        Self {
            registry,
            imports,
            listeners,
            config,
        }
    }

    /// Applies `changes` in order on behalf of the call chain `ctx`.
    ///
    /// Returns the changes actually enacted, or the veto that stopped the
    /// batch.
    ///
    /// # Errors
    ///
    /// - [`OntologyError::ImmutableTargetChange`] if a change targets an
    ///   ontology that refuses changes. Changes enacted before it stay
    ///   enacted and are still announced.
    /// - [`OntologyError::RenameConflict`] if an identifier change collides
    ///   with another registered ontology. Nothing is enacted for that
    ///   change.
    pub fn apply_changes(
        &self,
        changes: &[OntologyChange],
        ctx: LoadContext,
    ) -> Result<ChangeOutcome, OntologyError> {
        if changes.is_empty() {
            return Ok(ChangeOutcome::Applied(Vec::new()));
        }

        let announce = !ctx.is_loading();

        if announce {
            if let Err(veto) = self.listeners.broadcast_impending_changes(changes) {
                tracing::info!(size = changes.len(), %veto, "change batch vetoed");
                self.listeners.broadcast_changes_vetoed(changes, &veto);
                return Ok(ChangeOutcome::Vetoed(veto));
            }
            self.listeners.fire_begin_changes(changes.len());
        } else {
            tracing::trace!(
                size = changes.len(),
                load_depth = ctx.load_depth(),
                "broadcasts suppressed inside load"
            );
        }

        let load_annotations = self.config.read().load_annotation_axioms;
        let mut applied = Vec::with_capacity(changes.len());
        let mut failure = None;

        for change in changes {
            if !load_annotations && is_annotation_addition(change) {
                continue;
            }
            match self.enact(change) {
                Ok(enacted) => {
                    applied.extend(enacted);
                    if announce {
                        self.listeners.fire_change_applied(change);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        kind = %change.kind(),
                        ontology_id = %change.ontology().ontology_id(),
                        error = %err,
                        "change batch aborted"
                    );
                    failure = Some(err);
                    break;
                }
            }
        }

        if announce {
            self.listeners.fire_end_changes();
            self.listeners.broadcast_changes(&applied);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(ChangeOutcome::Applied(applied)),
        }
    }

    fn enact(&self, change: &OntologyChange) -> Result<Vec<OntologyChange>, OntologyError> {
        let target = change.ontology();
        if !target.is_mutable() {
            return Err(OntologyError::ImmutableTargetChange {
                ontology: target.ontology_id(),
                kind: change.kind(),
            });
        }

        if let OntologyChange::SetOntologyId { new_id, .. } = change {
            self.registry.check_rename(target, new_id)?;
        }

        let old_id = target.ontology_id();
        let enacted = target.apply_change(change)?;
        if enacted.is_empty() {
            return Ok(enacted);
        }

        match change {
            OntologyChange::SetOntologyId { new_id, .. } => {
                self.after_rename(target, &old_id, new_id)?;
            }
            OntologyChange::AddImport { declaration, .. } => {
                let matching = self.registry.ids().into_iter().find(|id| {
                    declaration.targets(&id.default_document_iri())
                        || self
                            .registry
                            .document_iri(id)
                            .is_some_and(|document| declaration.targets(&document))
                });
                if let Some(id) = matching {
                    self.registry.bind_import(declaration.clone(), id);
                }
                self.imports.invalidate();
            }
            OntologyChange::RemoveImport { declaration, .. } => {
                // Bindings are shared by every ontology declaring the same import.
                let still_declared = self
                    .registry
                    .all()
                    .iter()
                    .any(|ontology| ontology.import_declarations().contains(declaration));
                if !still_declared {
                    self.registry.unbind_import(declaration);
                }
                self.imports.invalidate();
            }
            OntologyChange::AddAxiom { .. } | OntologyChange::RemoveAxiom { .. } => {}
        }
        Ok(enacted)
    }

    fn after_rename(
        &self,
        target: &OntologyHandle,
        old_id: &OntologyId,
        new_id: &OntologyId,
    ) -> Result<(), OntologyError> {
        if !self.registry.contains(old_id) {
            // Unmanaged ontology: nothing to move.
            return Ok(());
        }
        if let Err(err) = self.registry.rename(old_id, new_id) {
            // Lost a race for new_id after the pre-check; put the old id back.
            let revert = OntologyChange::set_ontology_id(target, old_id.clone());
            if let Err(revert_err) = target.apply_change(&revert) {
                tracing::warn!(
                    %old_id,
                    %new_id,
                    error = %revert_err,
                    "rename revert failed, ontology id out of sync with registry"
                );
            }
            return Err(err);
        }
        tracing::info!(%old_id, %new_id, "ontology renamed");
        self.imports.invalidate();
        self.imports.bind_declarations_to(new_id);
        Ok(())
    }
}

fn is_annotation_addition(change: &OntologyChange) -> bool {
    change.kind() == ChangeKind::AddAxiom
        && change.axiom().is_some_and(Axiom::is_annotation_axiom)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{
        ChangeVeto, FrozenOntology, ImportDeclaration, InMemoryOntology, Ontology,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        registry: Arc<OntologyRegistry>,
        imports: Arc<ImportResolver>,
        listeners: Arc<ListenerHub>,
        config: Arc<RwLock<ManagerConfig>>,
        engine: ChangeEngine,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(OntologyRegistry::new());
            let imports = Arc::new(ImportResolver::new(Arc::clone(&registry)));
            let listeners = Arc::new(ListenerHub::new());
            let config = Arc::new(RwLock::new(ManagerConfig::default()));
            let engine = ChangeEngine::new(
                Arc::clone(&registry),
                Arc::clone(&imports),
                Arc::clone(&listeners),
                Arc::clone(&config),
            );
            Self {
                registry,
                imports,
                listeners,
                config,
                engine,
            }
        }

        fn ontology(&self, iri: &str) -> OntologyHandle {
            let handle = OntologyHandle::new(InMemoryOntology::new(OntologyId::new(iri)));
            let Ok(_) = self.registry.add(handle.clone()) else {
                panic!("registration failed");
            };
            handle
        }

        fn apply(&self, changes: &[OntologyChange]) -> ChangeOutcome {
            let Ok(outcome) = self.engine.apply_changes(changes, LoadContext::root()) else {
                panic!("apply_changes failed");
            };
            outcome
        }

        fn count_committed(&self) -> Arc<AtomicUsize> {
            let committed = Arc::new(AtomicUsize::new(0));
            let seen = Arc::clone(&committed);
            self.listeners.add_change_listener(Arc::new(
                move |_: &[OntologyChange]| -> anyhow::Result<()> {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            ));
            committed
        }
    }

    /// Registers a competitor under the new id while its own rename is in
    /// flight, so the registry move loses the race.
    #[derive(Debug)]
    struct RacingOntology {
        inner: InMemoryOntology,
        registry: Arc<OntologyRegistry>,
        renames: AtomicUsize,
        refuse_revert: bool,
    }

    impl Ontology for RacingOntology {
        fn ontology_id(&self) -> OntologyId {
            self.inner.ontology_id()
        }

        fn import_declarations(&self) -> Vec<ImportDeclaration> {
            self.inner.import_declarations()
        }

        fn contains_axiom(&self, axiom: &Axiom) -> bool {
            self.inner.contains_axiom(axiom)
        }

        fn axioms(&self) -> Vec<Axiom> {
            self.inner.axioms()
        }

        fn apply_change(
            &self,
            change: &OntologyChange,
        ) -> Result<Vec<OntologyChange>, OntologyError> {
            if let OntologyChange::SetOntologyId { new_id, .. } = change {
                if self.renames.fetch_add(1, Ordering::SeqCst) == 0 {
                    let rival = OntologyHandle::new(InMemoryOntology::new(new_id.clone()));
                    let _ = self.registry.add(rival);
                } else if self.refuse_revert {
                    return Err(OntologyError::ImmutableTargetChange {
                        ontology: self.inner.ontology_id(),
                        kind: change.kind(),
                    });
                }
            }
            self.inner.apply_change(change)
        }
    }

    impl Fixture {
        fn racing(&self, iri: &str, refuse_revert: bool) -> OntologyHandle {
            let handle = OntologyHandle::new(RacingOntology {
                inner: InMemoryOntology::new(OntologyId::new(iri)),
                registry: Arc::clone(&self.registry),
                renames: AtomicUsize::new(0),
                refuse_revert,
            });
            let Ok(_) = self.registry.add(handle.clone()) else {
                panic!("registration failed");
            };
            handle
        }
    }

    #[test]
    fn applies_and_broadcasts() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        let committed = f.count_committed();
        let axiom = Axiom::declare_class("http://x#A");

        let outcome = f.apply(&[
            OntologyChange::add_axiom(&a, axiom.clone()),
            OntologyChange::add_axiom(&a, axiom.clone()),
        ]);

        assert_eq!(outcome.applied().len(), 1);
        assert!(a.contains_axiom(&axiom));
        assert_eq!(committed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn veto_leaves_ontologies_untouched() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        let committed = f.count_committed();
        let vetoed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&vetoed);
        f.listeners.add_impending_change_listener(Arc::new(
            |_: &[OntologyChange]| -> Result<(), ChangeVeto> { Err(ChangeVeto::new("frozen")) },
        ));
        f.listeners.add_changes_vetoed_listener(Arc::new(
            move |_: &[OntologyChange], _: &ChangeVeto| -> anyhow::Result<()> {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        ));

        let change = OntologyChange::add_axiom(&a, Axiom::declare_class("http://x#A"));
        let outcome = f.apply(&[change]);

        assert!(outcome.is_vetoed());
        assert_eq!(a.axiom_count(), 0);
        assert_eq!(vetoed.load(Ordering::SeqCst), 1);
        assert_eq!(committed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn annotation_additions_filtered_when_disabled() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        f.config.write().load_annotation_axioms = false;

        let outcome = f.apply(&[
            OntologyChange::add_axiom(&a, Axiom::annotation("http://x#label", "http://x#A", "A")),
            OntologyChange::add_axiom(&a, Axiom::declare_class("http://x#A")),
        ]);

        assert_eq!(outcome.applied().len(), 1);
        assert_eq!(a.axiom_count(), 1);
    }

    #[test]
    fn immutable_target_keeps_prefix_and_fails() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        let frozen = OntologyHandle::new(FrozenOntology::new(
            OntologyId::new("http://x/frozen"),
            Vec::new(),
            Vec::new(),
        ));
        let committed = f.count_committed();

        let result = f.engine.apply_changes(
            &[
                OntologyChange::add_axiom(&a, Axiom::declare_class("http://x#A")),
                OntologyChange::add_axiom(&frozen, Axiom::declare_class("http://x#B")),
                OntologyChange::add_axiom(&a, Axiom::declare_class("http://x#C")),
            ],
            LoadContext::root(),
        );

        let Err(OntologyError::ImmutableTargetChange { kind, .. }) = result else {
            panic!("expected ImmutableTargetChange");
        };
        assert_eq!(kind, ChangeKind::AddAxiom);
        assert_eq!(a.axiom_count(), 1);
        assert_eq!(committed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rename_moves_registry_entry_and_invalidates() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        let _ = f.imports.imports_closure(&a);
        assert!(f.imports.is_cached(&a));

        let new_id = OntologyId::new("http://x/renamed");
        let outcome = f.apply(&[OntologyChange::set_ontology_id(&a, new_id.clone())]);

        assert_eq!(outcome.applied().len(), 1);
        assert_eq!(f.registry.get(&new_id), Some(a.clone()));
        assert!(!f.registry.contains(&OntologyId::new("http://x/a")));
        assert!(!f.imports.is_cached(&a));
    }

    #[test]
    fn rename_conflict_changes_nothing() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        let b = f.ontology("http://x/b");

        let rename = OntologyChange::set_ontology_id(&a, b.ontology_id());
        let result = f.engine.apply_changes(&[rename], LoadContext::root());

        assert!(matches!(result, Err(OntologyError::RenameConflict { .. })));
        assert_eq!(a.ontology_id(), OntologyId::new("http://x/a"));
        assert_eq!(f.registry.get(&b.ontology_id()), Some(b));
    }

    #[test]
    fn lost_rename_race_restores_old_id() {
        let f = Fixture::new();
        let a = f.racing("http://x/a", false);

        let rename = OntologyChange::set_ontology_id(&a, OntologyId::new("http://x/b"));
        let result = f.engine.apply_changes(&[rename], LoadContext::root());

        assert!(matches!(result, Err(OntologyError::RenameConflict { .. })));
        assert_eq!(a.ontology_id(), OntologyId::new("http://x/a"));
        assert_eq!(f.registry.get(&OntologyId::new("http://x/a")), Some(a));
    }

    #[test]
    fn failed_rename_revert_still_reports_conflict() {
        let f = Fixture::new();
        let a = f.racing("http://x/a", true);
        let new_id = OntologyId::new("http://x/b");

        let rename = OntologyChange::set_ontology_id(&a, new_id.clone());
        let result = f.engine.apply_changes(&[rename], LoadContext::root());

        assert!(matches!(result, Err(OntologyError::RenameConflict { .. })));
        // The revert was refused, so the instance keeps the id it could not claim.
        assert_eq!(a.ontology_id(), new_id);
        let Some(rival) = f.registry.get(&new_id) else {
            panic!("rival missing");
        };
        assert!(!rival.ptr_eq(&a));
    }

    #[test]
    fn import_changes_maintain_bindings() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        let b = f.ontology("http://x/b");
        let declaration = ImportDeclaration::new("http://x/b");

        let _ = f.apply(&[OntologyChange::add_import(&a, declaration.clone())]);
        assert_eq!(f.registry.bound_import(&declaration), Some(b.ontology_id()));

        let _ = f.apply(&[OntologyChange::remove_import(&a, declaration.clone())]);
        assert_eq!(f.registry.bound_import(&declaration), None);
    }

    #[test]
    fn shared_import_binding_survives_one_removal() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        let b = f.ontology("http://x/b");
        let c = f.ontology("http://x/c");
        let declaration = ImportDeclaration::new("http://x/b");

        let _ = f.apply(&[
            OntologyChange::add_import(&a, declaration.clone()),
            OntologyChange::add_import(&c, declaration.clone()),
        ]);
        let _ = f.apply(&[OntologyChange::remove_import(&c, declaration.clone())]);

        assert_eq!(f.registry.bound_import(&declaration), Some(b.ontology_id()));
        let Ok(direct) = f.imports.direct_imports(&a) else {
            panic!("direct imports failed");
        };
        assert!(direct.contains(&b));
        assert_eq!(f.imports.imports_closure(&a).len(), 2);

        let _ = f.apply(&[OntologyChange::remove_import(&a, declaration.clone())]);
        assert_eq!(f.registry.bound_import(&declaration), None);
    }

    #[test]
    fn broadcasts_suppressed_inside_load() {
        let f = Fixture::new();
        let a = f.ontology("http://x/a");
        let committed = f.count_committed();
        f.listeners.add_impending_change_listener(Arc::new(
            |_: &[OntologyChange]| -> Result<(), ChangeVeto> { Err(ChangeVeto::new("no")) },
        ));

        let result = f.engine.apply_changes(
            &[OntologyChange::add_axiom(&a, Axiom::declare_class("http://x#A"))],
            LoadContext::root().enter_load(),
        );

        let Ok(outcome) = result else {
            panic!("apply_changes failed");
        };
        assert_eq!(outcome.applied().len(), 1);
        assert_eq!(committed.load(Ordering::SeqCst), 0);
    }
}

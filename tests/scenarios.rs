//! End-to-end scenarios: creation, pending import binding and tolerated
//! missing imports.

#![allow(clippy::panic)]

mod common;

use std::sync::{Arc, Mutex};

use ontology_manager::domain::{
    Axiom, ImportDeclaration, MissingImportEvent, MissingImportListener, OntologyChange, OntologyId,
};
use ontology_manager::OntologyError;

#[test]
fn created_ontology_holds_added_declaration() {
    let manager = common::manager();
    let ontology = common::create(&manager, "http://x#A");
    let axiom = Axiom::declare_class("http://x#A");

    let Ok(outcome) = manager.apply_change(OntologyChange::add_axiom(&ontology, axiom.clone()))
    else {
        panic!("add axiom failed");
    };
    assert_eq!(outcome.applied().len(), 1);

    let all = manager.ontologies();
    assert_eq!(all.len(), 1);
    let Some(only) = all.first() else {
        panic!("registry empty");
    };
    assert_eq!(only.ontology_id(), OntologyId::new("http://x#A"));
    assert!(only.contains_axiom(&axiom));
}

#[test]
fn pending_import_binds_when_target_is_created() {
    let manager = common::manager();
    let a = common::create(&manager, "http://x#A");
    common::import(&manager, &a, "http://x#B");

    let Ok(before) = manager.direct_imports(&a) else {
        panic!("direct imports failed");
    };
    assert!(before.is_empty());

    let b = common::create(&manager, "http://x#B");
    let Ok(after) = manager.direct_imports(&a) else {
        panic!("direct imports failed");
    };
    assert_eq!(after.len(), 1);
    assert!(after.contains(&b));
    assert_eq!(
        manager.imported_ontology(&ImportDeclaration::new("http://x#B")),
        Some(b)
    );
}

#[test]
fn silent_policy_tolerates_unresolvable_import() {
    let (manager, store) = common::snapshot_manager();
    manager.set_silent_missing_imports(true);
    common::put_snapshot(&store, "http://x/a", &["http://x/nowhere"], vec![]);

    let seen: Arc<Mutex<Vec<MissingImportEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener: Arc<dyn MissingImportListener> =
        Arc::new(move |event: &MissingImportEvent| -> anyhow::Result<()> {
            if let Ok(mut events) = sink.lock() {
                events.push(event.clone());
            }
            Ok(())
        });
    manager.listeners().add_missing_import_listener(listener);

    let Ok(a) = manager.load_ontology("http://x/a") else {
        panic!("load must succeed under the silent policy");
    };
    assert_eq!(a.import_declarations().len(), 1);

    let Ok(events) = seen.lock() else {
        panic!("listener lock poisoned");
    };
    assert_eq!(events.len(), 1);
    let Some(event) = events.first() else {
        panic!("no missing import event");
    };
    assert_eq!(event.declaration, ImportDeclaration::new("http://x/nowhere"));
}

#[test]
fn strict_policy_fails_the_whole_load() {
    let (manager, store) = common::snapshot_manager();
    common::put_snapshot(&store, "http://x/a", &["http://x/nowhere"], vec![]);

    let result = manager.load_ontology("http://x/a");
    assert!(matches!(result, Err(OntologyError::UnloadableImport { .. })));
    assert!(manager.ontologies().is_empty());
}

#[test]
fn snapshot_round_trip_through_the_manager() {
    let (manager, _store) = common::snapshot_manager();
    let Ok(ontology) = manager.create_ontology_with_axioms(
        "http://x/pets",
        [
            Axiom::declare_class("http://x/pets#Dog"),
            Axiom::sub_class_of("http://x/pets#Dog", "http://x/pets#Animal"),
        ],
    ) else {
        panic!("create failed");
    };
    let Ok(()) = manager.save_ontology(&ontology) else {
        panic!("save failed");
    };

    let id = ontology.ontology_id();
    let _ = manager.remove_ontology(&id);
    let Ok(reloaded) = manager.load_ontology(id.clone()) else {
        panic!("reload failed");
    };
    assert_eq!(reloaded.ontology_id(), id);
    assert_eq!(reloaded.axioms(), ontology.axioms());
}

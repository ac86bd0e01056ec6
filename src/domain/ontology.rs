//! The mutable ontology contract and its default in-memory implementation.
//!
//! Ontologies are shared between the registry, the import resolver, change
//! batches and callers through [`OntologyHandle`], which compares by
//! identity: two handles are equal only if they point at the same instance,
//! regardless of the identifier the instance currently carries.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

use super::axiom::Axiom;
use super::import_declaration::ImportDeclaration;
use super::ontology_change::OntologyChange;
use super::ontology_id::OntologyId;
use crate::error::OntologyError;

/// Contract every managed ontology implements.
///
/// Implementations use interior mutability: changes arrive through
/// [`Ontology::apply_change`] on a shared reference, possibly from several
/// threads at once.
pub trait Ontology: Send + Sync + fmt::Debug {
    /// Returns the identifier the ontology currently carries.
    fn ontology_id(&self) -> OntologyId;

    /// Returns the import declarations in declaration order.
    fn import_declarations(&self) -> Vec<ImportDeclaration>;

    /// Returns `true` if the ontology holds `axiom`.
    fn contains_axiom(&self, axiom: &Axiom) -> bool;

    /// Returns a snapshot of all axioms.
    fn axioms(&self) -> Vec<Axiom>;

    /// Returns the number of axioms.
    fn axiom_count(&self) -> usize {
        self.axioms().len()
    }

    /// Returns `false` for read-only ontologies; the change engine refuses
    /// to enact changes against them.
    fn is_mutable(&self) -> bool {
        true
    }

    /// Enacts a single change and returns the changes that actually altered
    /// the ontology (empty if the change was a no-op).
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::ImmutableTargetChange`] if the ontology does
    /// not accept changes.
    fn apply_change(&self, change: &OntologyChange) -> Result<Vec<OntologyChange>, OntologyError>;
}

/// Shared, identity-compared reference to a managed ontology.
#[derive(Clone)]
pub struct OntologyHandle(Arc<dyn Ontology>);

impl OntologyHandle {
    /// Wraps a concrete ontology.
    #[must_use]
    pub fn new<O: Ontology + 'static>(ontology: O) -> Self {
        Self(Arc::new(ontology))
    }

    /// Returns `true` if both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl Deref for OntologyHandle {
    type Target = dyn Ontology;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for OntologyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for OntologyHandle {}

impl Hash for OntologyHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).cast::<()>().hash(state);
    }
}

impl fmt::Debug for OntologyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OntologyHandle")
            .field(&self.0.ontology_id())
            .finish()
    }
}

/// Mutable in-memory ontology used by the default factories.
#[derive(Debug)]
pub struct InMemoryOntology {
    state: RwLock<OntologyState>,
}

#[derive(Debug)]
struct OntologyState {
    id: OntologyId,
    axioms: BTreeSet<Axiom>,
    imports: Vec<ImportDeclaration>,
}

impl InMemoryOntology {
    /// Creates an empty ontology with the given identifier.
    #[must_use]
    pub fn new(id: OntologyId) -> Self {
        Self {
            state: RwLock::new(OntologyState {
                id,
                axioms: BTreeSet::new(),
                imports: Vec::new(),
            }),
        }
    }
}

impl Ontology for InMemoryOntology {
    fn ontology_id(&self) -> OntologyId {
        self.state.read().id.clone()
    }

    fn import_declarations(&self) -> Vec<ImportDeclaration> {
        self.state.read().imports.clone()
    }

    fn contains_axiom(&self, axiom: &Axiom) -> bool {
        self.state.read().axioms.contains(axiom)
    }

    fn axioms(&self) -> Vec<Axiom> {
        self.state.read().axioms.iter().cloned().collect()
    }

    fn axiom_count(&self) -> usize {
        self.state.read().axioms.len()
    }

    fn apply_change(&self, change: &OntologyChange) -> Result<Vec<OntologyChange>, OntologyError> {
        let mut state = self.state.write();
        let changed = match change {
            OntologyChange::AddAxiom { axiom, .. } => state.axioms.insert(axiom.clone()),
            OntologyChange::RemoveAxiom { axiom, .. } => state.axioms.remove(axiom),
            OntologyChange::AddImport { declaration, .. } => {
                if state.imports.contains(declaration) {
                    false
                } else {
                    state.imports.push(declaration.clone());
                    true
                }
            }
            OntologyChange::RemoveImport { declaration, .. } => {
                let before = state.imports.len();
                state.imports.retain(|d| d != declaration);
                state.imports.len() != before
            }
            OntologyChange::SetOntologyId { new_id, .. } => {
                if state.id == *new_id {
                    false
                } else {
                    state.id = new_id.clone();
                    true
                }
            }
        };
        drop(state);

        if changed {
            tracing::trace!(kind = %change.kind(), "change enacted");
            Ok(vec![change.clone()])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Read-only view used where an ontology must never change.
///
/// Every change is refused with [`OntologyError::ImmutableTargetChange`].
#[derive(Debug)]
pub struct FrozenOntology {
    id: OntologyId,
    axioms: BTreeSet<Axiom>,
    imports: Vec<ImportDeclaration>,
}

impl FrozenOntology {
    /// Freezes a copy of the given ontology's current content.
    #[must_use]
    pub fn snapshot_of(ontology: &dyn Ontology) -> Self {
        Self {
            id: ontology.ontology_id(),
            axioms: ontology.axioms().into_iter().collect(),
            imports: ontology.import_declarations(),
        }
    }

    /// Creates a frozen ontology from raw parts.
    #[must_use]
    pub fn new(
        id: OntologyId,
        axioms: impl IntoIterator<Item = Axiom>,
        imports: Vec<ImportDeclaration>,
    ) -> Self {
        Self {
            id,
            axioms: axioms.into_iter().collect(),
            imports,
        }
    }
}

impl Ontology for FrozenOntology {
    fn ontology_id(&self) -> OntologyId {
        self.id.clone()
    }

    fn import_declarations(&self) -> Vec<ImportDeclaration> {
        self.imports.clone()
    }

    fn contains_axiom(&self, axiom: &Axiom) -> bool {
        self.axioms.contains(axiom)
    }

    fn axioms(&self) -> Vec<Axiom> {
        self.axioms.iter().cloned().collect()
    }

    fn is_mutable(&self) -> bool {
        false
    }

    fn apply_change(&self, change: &OntologyChange) -> Result<Vec<OntologyChange>, OntologyError> {
        Err(OntologyError::ImmutableTargetChange {
            ontology: self.id.clone(),
            kind: change.kind(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn handle(iri: &str) -> OntologyHandle {
        OntologyHandle::new(InMemoryOntology::new(OntologyId::new(iri)))
    }

    #[test]
    fn handles_compare_by_identity() {
        let a = handle("http://x/a");
        let a2 = a.clone();
        let other = handle("http://x/a");

        assert_eq!(a, a2);
        assert_ne!(a, other);

        let set: HashSet<_> = [a, a2, other].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn add_axiom_twice_applies_once() {
        let ont = handle("http://x/a");
        let change = OntologyChange::add_axiom(&ont, Axiom::declare_class("http://x#A"));

        let Ok(first) = ont.apply_change(&change) else {
            panic!("apply failed");
        };
        let Ok(second) = ont.apply_change(&change) else {
            panic!("apply failed");
        };
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(ont.axiom_count(), 1);
    }

    #[test]
    fn imports_keep_declaration_order() {
        let ont = handle("http://x/a");
        for target in ["http://x/c", "http://x/b", "http://x/c"] {
            let change = OntologyChange::add_import(&ont, ImportDeclaration::new(target));
            let _ = ont.apply_change(&change);
        }
        let iris: Vec<_> = ont
            .import_declarations()
            .iter()
            .map(|d| d.iri().as_str().to_string())
            .collect();
        assert_eq!(iris, vec!["http://x/c", "http://x/b"]);
    }

    #[test]
    fn set_ontology_id_keeps_instance() {
        let ont = handle("http://x/a");
        let change = OntologyChange::set_ontology_id(&ont, OntologyId::new("http://x/b"));
        let _ = ont.apply_change(&change);
        assert_eq!(ont.ontology_id(), OntologyId::new("http://x/b"));
    }

    #[test]
    fn frozen_ontology_refuses_changes() {
        let ont = OntologyHandle::new(FrozenOntology::new(
            OntologyId::new("http://x/frozen"),
            [Axiom::declare_class("http://x#A")],
            Vec::new(),
        ));
        let change = OntologyChange::remove_axiom(&ont, Axiom::declare_class("http://x#A"));
        let result = ont.apply_change(&change);
        assert!(matches!(
            result,
            Err(OntologyError::ImmutableTargetChange { .. })
        ));
        assert!(!ont.is_mutable());
        assert!(ont.contains_axiom(&Axiom::declare_class("http://x#A")));
    }

    #[test]
    fn frozen_snapshot_is_detached_from_source() {
        let live = handle("http://x/live");
        let declared = Axiom::declare_class("http://x#A");
        let import = ImportDeclaration::new("http://x/b");
        for change in [
            OntologyChange::add_axiom(&live, declared.clone()),
            OntologyChange::add_import(&live, import.clone()),
        ] {
            let _ = live.apply_change(&change);
        }

        let frozen = FrozenOntology::snapshot_of(&*live);
        let _ = live.apply_change(&OntologyChange::remove_axiom(&live, declared.clone()));

        assert_eq!(frozen.ontology_id(), live.ontology_id());
        assert!(frozen.contains_axiom(&declared));
        assert_eq!(frozen.import_declarations(), vec![import]);
        assert!(!live.contains_axiom(&declared));
    }
}

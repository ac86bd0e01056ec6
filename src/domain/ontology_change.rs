//! Change requests and batch outcomes.
//!
//! An [`OntologyChange`] is a request against one ontology. Applying a batch
//! yields a [`ChangeOutcome`]: either the changes that were actually enacted
//! or the veto that stopped the batch before anything was touched.

use std::fmt;

use serde::Serialize;

use super::axiom::Axiom;
use super::import_declaration::ImportDeclaration;
use super::ontology::OntologyHandle;
use super::ontology_id::OntologyId;

/// Discriminator for [`OntologyChange`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Adds an axiom.
    AddAxiom,
    /// Removes an axiom.
    RemoveAxiom,
    /// Adds an import declaration.
    AddImport,
    /// Removes an import declaration.
    RemoveImport,
    /// Renames the ontology.
    SetOntologyId,
}

impl ChangeKind {
    /// Returns the kind as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddAxiom => "add_axiom",
            Self::RemoveAxiom => "remove_axiom",
            Self::AddImport => "add_import",
            Self::RemoveImport => "remove_import",
            Self::SetOntologyId => "set_ontology_id",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural edit targeting one ontology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OntologyChange {
    /// Adds `axiom` to `ontology`.
    AddAxiom {
        /// Target ontology.
        ontology: OntologyHandle,
        /// Axiom to add.
        axiom: Axiom,
    },
    /// Removes `axiom` from `ontology`.
    RemoveAxiom {
        /// Target ontology.
        ontology: OntologyHandle,
        /// Axiom to remove.
        axiom: Axiom,
    },
    /// Adds an import declaration to `ontology`.
    AddImport {
        /// Target ontology.
        ontology: OntologyHandle,
        /// Declaration to add.
        declaration: ImportDeclaration,
    },
    /// Removes an import declaration from `ontology`.
    RemoveImport {
        /// Target ontology.
        ontology: OntologyHandle,
        /// Declaration to remove.
        declaration: ImportDeclaration,
    },
    /// Gives `ontology` a new identifier. The instance stays the same.
    SetOntologyId {
        /// Target ontology.
        ontology: OntologyHandle,
        /// Identifier the ontology carried when the change was created.
        original_id: OntologyId,
        /// Identifier to switch to.
        new_id: OntologyId,
    },
}

impl OntologyChange {
    /// Builds an `AddAxiom` change.
    #[must_use]
    pub fn add_axiom(ontology: &OntologyHandle, axiom: Axiom) -> Self {
        Self::AddAxiom {
            ontology: ontology.clone(),
            axiom,
        }
    }

    /// Builds a `RemoveAxiom` change.
    #[must_use]
    pub fn remove_axiom(ontology: &OntologyHandle, axiom: Axiom) -> Self {
        Self::RemoveAxiom {
            ontology: ontology.clone(),
            axiom,
        }
    }

    /// Builds an `AddImport` change.
    #[must_use]
    pub fn add_import(ontology: &OntologyHandle, declaration: ImportDeclaration) -> Self {
        Self::AddImport {
            ontology: ontology.clone(),
            declaration,
        }
    }

    /// Builds a `RemoveImport` change.
    #[must_use]
    pub fn remove_import(ontology: &OntologyHandle, declaration: ImportDeclaration) -> Self {
        Self::RemoveImport {
            ontology: ontology.clone(),
            declaration,
        }
    }

    /// Builds a `SetOntologyId` change, capturing the ontology's current
    /// identifier as the original.
    #[must_use]
    pub fn set_ontology_id(ontology: &OntologyHandle, new_id: OntologyId) -> Self {
        Self::SetOntologyId {
            ontology: ontology.clone(),
            original_id: ontology.ontology_id(),
            new_id,
        }
    }

    /// Returns the target ontology.
    #[must_use]
    pub const fn ontology(&self) -> &OntologyHandle {
        match self {
            Self::AddAxiom { ontology, .. }
            | Self::RemoveAxiom { ontology, .. }
            | Self::AddImport { ontology, .. }
            | Self::RemoveImport { ontology, .. }
            | Self::SetOntologyId { ontology, .. } => ontology,
        }
    }

    /// Returns the change kind.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::AddAxiom { .. } => ChangeKind::AddAxiom,
            Self::RemoveAxiom { .. } => ChangeKind::RemoveAxiom,
            Self::AddImport { .. } => ChangeKind::AddImport,
            Self::RemoveImport { .. } => ChangeKind::RemoveImport,
            Self::SetOntologyId { .. } => ChangeKind::SetOntologyId,
        }
    }

    /// Returns the axiom carried by axiom changes.
    #[must_use]
    pub const fn axiom(&self) -> Option<&Axiom> {
        match self {
            Self::AddAxiom { axiom, .. } | Self::RemoveAxiom { axiom, .. } => Some(axiom),
            _ => None,
        }
    }

    /// Returns the declaration carried by import changes.
    #[must_use]
    pub const fn import_declaration(&self) -> Option<&ImportDeclaration> {
        match self {
            Self::AddImport { declaration, .. } | Self::RemoveImport { declaration, .. } => {
                Some(declaration)
            }
            _ => None,
        }
    }

    /// Returns `true` for `AddImport` and `RemoveImport`.
    #[must_use]
    pub const fn is_import_change(&self) -> bool {
        matches!(self, Self::AddImport { .. } | Self::RemoveImport { .. })
    }

    /// Returns `true` for `AddAxiom` and `RemoveAxiom`.
    #[must_use]
    pub const fn is_axiom_change(&self) -> bool {
        matches!(self, Self::AddAxiom { .. } | Self::RemoveAxiom { .. })
    }
}

/// Rejection of a proposed batch by an impending-change listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeVeto {
    reason: String,
}

impl ChangeVeto {
    /// Creates a veto with a human-readable reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the veto reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ChangeVeto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "changes vetoed: {}", self.reason)
    }
}

/// Result of submitting a change batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ChangeOutcome {
    /// The batch passed the veto gate; holds the changes actually enacted,
    /// in order.
    Applied(Vec<OntologyChange>),
    /// An impending-change listener rejected the batch; nothing was enacted.
    Vetoed(ChangeVeto),
}

impl ChangeOutcome {
    /// Returns the enacted changes (empty when vetoed).
    #[must_use]
    pub fn applied(&self) -> &[OntologyChange] {
        match self {
            Self::Applied(changes) => changes,
            Self::Vetoed(_) => &[],
        }
    }

    /// Consumes the outcome, returning the enacted changes (empty when
    /// vetoed).
    #[must_use]
    pub fn into_applied(self) -> Vec<OntologyChange> {
        match self {
            Self::Applied(changes) => changes,
            Self::Vetoed(_) => Vec::new(),
        }
    }

    /// Returns the veto, if the batch was rejected.
    #[must_use]
    pub const fn veto(&self) -> Option<&ChangeVeto> {
        match self {
            Self::Applied(_) => None,
            Self::Vetoed(veto) => Some(veto),
        }
    }

    /// Returns `true` if the batch was rejected.
    #[must_use]
    pub const fn is_vetoed(&self) -> bool {
        matches!(self, Self::Vetoed(_))
    }
}

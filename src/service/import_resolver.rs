//! Import graph resolution and the imports-closure cache.
//!
//! Declarations resolve to ontologies through the registry's
//! declaration → identifier bindings. All traversals use an explicit stack
//! and one visited set per call, so cycles terminate and deep import
//! chains cannot overflow the call stack.
//!
//! The closure cache is invalidated as a whole. Every invalidation bumps a
//! generation counter; a closure computed across an invalidation is
//! returned to its caller but not cached.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::{ImportDeclaration, OntologyHandle, OntologyId, OntologyRegistry};
use crate::error::OntologyError;

/// Immutable imports-closure snapshot.
pub type ImportsClosure = Arc<HashSet<OntologyHandle>>;

#[derive(Debug, Default)]
struct ClosureCache {
    generation: u64,
    entries: HashMap<OntologyHandle, ImportsClosure>,
}

/// Computes direct, transitive and sorted imports over registered
/// ontologies.
#[derive(Debug)]
pub struct ImportResolver {
    registry: Arc<OntologyRegistry>,
    cache: RwLock<ClosureCache>,
}

impl ImportResolver {
    /// Creates a resolver over `registry` with an empty cache.
    #[must_use]
    pub fn new(registry: Arc<OntologyRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(ClosureCache::default()),
        }
    }

    /// Returns the ontologies `ontology` directly imports.
    ///
    /// Declarations not bound to a registered ontology are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::UnknownOntology`] if `ontology` is not
    /// registered.
    pub fn direct_imports(
        &self,
        ontology: &OntologyHandle,
    ) -> Result<HashSet<OntologyHandle>, OntologyError> {
        self.ensure_registered(ontology)?;
        Ok(self.resolved_imports(ontology).into_iter().collect())
    }

    /// Returns every ontology reachable from `ontology` through one or more
    /// imports. `ontology` itself is included only if it sits on a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`OntologyError::UnknownOntology`] if `ontology` is not
    /// registered.
    pub fn imports(
        &self,
        ontology: &OntologyHandle,
    ) -> Result<HashSet<OntologyHandle>, OntologyError> {
        self.ensure_registered(ontology)?;
        let mut reached = HashSet::new();
        let mut stack = self.resolved_imports(ontology);
        while let Some(current) = stack.pop() {
            if reached.insert(current.clone()) {
                stack.extend(self.resolved_imports(&current));
            }
        }
        Ok(reached)
    }

    /// Returns `ontology` plus everything it imports, directly or not.
    ///
    /// Served from the cache when possible.
    #[must_use]
    pub fn imports_closure(&self, ontology: &OntologyHandle) -> ImportsClosure {
        let generation = {
            let cache = self.cache.read();
            if let Some(hit) = cache.entries.get(ontology) {
                return Arc::clone(hit);
            }
            cache.generation
        };

        let closure: ImportsClosure = Arc::new(self.compute_closure(ontology));

        let mut cache = self.cache.write();
        if cache.generation == generation {
            cache
                .entries
                .insert(ontology.clone(), Arc::clone(&closure));
        } else {
            tracing::debug!(
                ontology_id = %ontology.ontology_id(),
                "closure raced an invalidation, not cached"
            );
        }
        closure
    }

    /// Returns the imports closure in preorder: `ontology` first, then each
    /// direct import's closure in declaration order. Every ontology appears
    /// once, at its first visit.
    #[must_use]
    pub fn sorted_imports_closure(&self, ontology: &OntologyHandle) -> Vec<OntologyHandle> {
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![ontology.clone()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let children = self.resolved_imports(&current);
            ordered.push(current);
            stack.extend(
                children
                    .into_iter()
                    .rev()
                    .filter(|child| !visited.contains(child)),
            );
        }
        ordered
    }

    /// Drops every cached closure.
    pub fn invalidate(&self) {
        let mut cache = self.cache.write();
        cache.generation = cache.generation.wrapping_add(1);
        let dropped = cache.entries.len();
        cache.entries.clear();
        drop(cache);
        tracing::debug!(dropped, "imports closure cache invalidated");
    }

    /// Number of invalidations so far.
    #[must_use]
    pub fn cache_generation(&self) -> u64 {
        self.cache.read().generation
    }

    /// Returns `true` if a closure for `ontology` is cached.
    #[must_use]
    pub fn is_cached(&self, ontology: &OntologyHandle) -> bool {
        self.cache.read().entries.contains_key(ontology)
    }

    /// Binds every unresolved declaration that targets `id` to it.
    ///
    /// A declaration targets `id` when its IRI equals the identifier's
    /// default document IRI or the document IRI recorded for it. Returns the
    /// number of declarations bound; the cache is invalidated if any were.
    pub fn bind_declarations_to(&self, id: &OntologyId) -> usize {
        let default_document = id.default_document_iri();
        let recorded_document = self.registry.document_iri(id);

        let mut bound = 0;
        for ontology in self.registry.all() {
            for declaration in ontology.import_declarations() {
                let targets = declaration.targets(&default_document)
                    || recorded_document
                        .as_ref()
                        .is_some_and(|document| declaration.targets(document));
                if targets && !self.is_resolved(&declaration) {
                    self.registry.bind_import(declaration, id.clone());
                    bound += 1;
                }
            }
        }

        if bound > 0 {
            tracing::debug!(ontology_id = %id, bound, "pending import declarations bound");
            self.invalidate();
        }
        bound
    }

    fn is_resolved(&self, declaration: &ImportDeclaration) -> bool {
        self.registry
            .bound_import(declaration)
            .is_some_and(|id| self.registry.contains(&id))
    }

    fn ensure_registered(&self, ontology: &OntologyHandle) -> Result<(), OntologyError> {
        let id = ontology.ontology_id();
        match self.registry.get(&id) {
            Some(registered) if registered == *ontology => Ok(()),
            _ => Err(OntologyError::UnknownOntology(id)),
        }
    }

    /// Direct imports in declaration order, without duplicates.
    fn resolved_imports(&self, ontology: &OntologyHandle) -> Vec<OntologyHandle> {
        let mut resolved: Vec<OntologyHandle> = Vec::new();
        for declaration in ontology.import_declarations() {
            if let Some(target) = self.registry.imported_ontology(&declaration) {
                if !resolved.contains(&target) {
                    resolved.push(target);
                }
            }
        }
        resolved
    }

    fn compute_closure(&self, ontology: &OntologyHandle) -> HashSet<OntologyHandle> {
        let mut visited = HashSet::new();
        let mut stack = vec![ontology.clone()];
        while let Some(current) = stack.pop() {
            if visited.insert(current.clone()) {
                stack.extend(
                    self.resolved_imports(&current)
                        .into_iter()
                        .filter(|child| !visited.contains(child)),
                );
            }
        }
        visited
    }
}

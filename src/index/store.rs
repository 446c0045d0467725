//! The maps behind an index.
//!
//! [`SymbolStore`] is a plain data structure: it owns every stored
//! [`Definition`] plus the secondary maps needed to answer namespace, global
//! and per-file queries, and the reference sets. It has no locking, events or
//! completeness policy; [`IndexEngine`](super::IndexEngine) adds those.
//!
//! # Key maps
//!
//! - `definitions` - fqn → Definition, in insertion order
//! - `by_namespace` - namespace → fqns listed in it
//! - `globals` - unqualified name → fqns of global definitions
//! - `by_file` - file → fqns declared in it
//! - `references` - fqn → referencing locations
//! - `referenced_from` - file → fqns it references

use std::iter::FusedIterator;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::definition::Definition;
use crate::base::{FileId, Fqn, FqnSyntax, Location};

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;
type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

// ============================================================================
// DEFINITION SNAPSHOTS
// ============================================================================

/// A finite sequence of `(fqn, definition)` pairs returned by bulk queries.
///
/// Each bulk query copies the matching `Arc<Definition>` handles while it holds
/// the read lock and iterates that copy afterwards. The sequence is therefore a
/// consistent snapshot: it never observes a torn store, does not see writes made
/// after it was produced, and survives the index being reset or discarded.
/// Calling the query again yields a fresh, independent sequence.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    entries: std::vec::IntoIter<(Fqn, Arc<Definition>)>,
}

impl Definitions {
    pub(crate) fn new(entries: Vec<(Fqn, Arc<Definition>)>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }

    /// Just the definitions, without their keys.
    pub fn values(self) -> impl Iterator<Item = Arc<Definition>> {
        self.map(|(_, def)| def)
    }

    /// Just the keys.
    pub fn fqns(self) -> impl Iterator<Item = Fqn> {
        self.map(|(fqn, _)| fqn)
    }
}

impl Iterator for Definitions {
    type Item = (Fqn, Arc<Definition>);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Definitions {}

impl FusedIterator for Definitions {}

impl FromIterator<(Fqn, Arc<Definition>)> for Definitions {
    fn from_iter<I: IntoIterator<Item = (Fqn, Arc<Definition>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ============================================================================
// SYMBOL STORE
// ============================================================================

/// Definitions and references of one index.
#[derive(Clone, Debug, Default)]
pub struct SymbolStore {
    syntax: FqnSyntax,
    /// The single source of truth for definitions.
    definitions: FxIndexMap<Fqn, Arc<Definition>>,
    /// Namespace -> fqns whose namespace component is exactly that namespace.
    by_namespace: FxHashMap<SmolStr, FxIndexSet<Fqn>>,
    /// Unqualified name -> global fqns, most recently put last.
    globals: FxHashMap<SmolStr, FxIndexSet<Fqn>>,
    /// File -> fqns declared in it.
    by_file: FxHashMap<FileId, FxHashSet<Fqn>>,
    /// Fqn -> distinct referencing locations. May exist without a definition.
    references: FxHashMap<Fqn, FxIndexSet<Location>>,
    /// File -> fqns referenced from it.
    referenced_from: FxHashMap<FileId, FxHashSet<Fqn>>,
}

impl SymbolStore {
    /// Create an empty store splitting names with `syntax`.
    pub fn new(syntax: FqnSyntax) -> Self {
        Self {
            syntax,
            ..Self::default()
        }
    }

    pub fn syntax(&self) -> &FqnSyntax {
        &self.syntax
    }

    /// Insert a definition, replacing any previous one under the same fqn.
    ///
    /// Returns the replaced definition. A replaced fqn keeps its position in
    /// iteration order.
    pub fn put(&mut self, definition: Arc<Definition>) -> Option<Arc<Definition>> {
        let fqn = definition.fqn.clone();
        let previous = self.definitions.insert(fqn.clone(), definition.clone());

        if let Some(prev) = &previous {
            self.unlink_global(prev);
            self.unlink_file(prev);
        } else {
            let namespace = SmolStr::new(self.syntax.namespace(&fqn));
            self.by_namespace.entry(namespace).or_default().insert(fqn.clone());
        }

        if definition.is_global {
            let name = SmolStr::new(self.syntax.unqualified(&fqn));
            self.globals.entry(name).or_default().insert(fqn.clone());
        }
        if let Some(file) = definition.file() {
            self.by_file.entry(file).or_default().insert(fqn);
        }

        previous
    }

    /// Remove the definition for `fqn`. Its reference set is kept.
    pub fn remove(&mut self, fqn: &str) -> Option<Arc<Definition>> {
        let removed = self.definitions.swap_remove(fqn)?;

        let namespace = self.syntax.namespace(fqn);
        if let Some(set) = self.by_namespace.get_mut(namespace) {
            set.shift_remove(fqn);
            if set.is_empty() {
                self.by_namespace.remove(namespace);
            }
        }
        self.unlink_global(&removed);
        self.unlink_file(&removed);

        Some(removed)
    }

    /// Drop every definition declared in `file` and every reference inside it.
    ///
    /// Returns the number of definitions removed.
    pub fn remove_file(&mut self, file: FileId) -> usize {
        let mut removed = 0;
        if let Some(fqns) = self.by_file.remove(&file) {
            for fqn in fqns {
                if self.remove(&fqn).is_some() {
                    removed += 1;
                }
            }
        }

        if let Some(fqns) = self.referenced_from.remove(&file) {
            for fqn in fqns {
                if let Some(locations) = self.references.get_mut(&fqn) {
                    locations.retain(|loc| loc.file != file);
                    if locations.is_empty() {
                        self.references.remove(&fqn);
                    }
                }
            }
        }

        removed
    }

    fn unlink_global(&mut self, definition: &Definition) {
        if !definition.is_global {
            return;
        }
        let name = self.syntax.unqualified(&definition.fqn);
        if let Some(set) = self.globals.get_mut(name) {
            set.shift_remove(&definition.fqn);
            if set.is_empty() {
                self.globals.remove(name);
            }
        }
    }

    fn unlink_file(&mut self, definition: &Definition) {
        let Some(file) = definition.file() else {
            return;
        };
        if let Some(set) = self.by_file.get_mut(&file) {
            set.remove(&definition.fqn);
            if set.is_empty() {
                self.by_file.remove(&file);
            }
        }
    }

    /// Look up a definition by fqn.
    ///
    /// With `global_fallback`, a miss is retried against the global partition
    /// using the unqualified name. An existing namespaced definition always
    /// wins over the fallback.
    pub fn definition(&self, fqn: &str, global_fallback: bool) -> Option<&Arc<Definition>> {
        if let Some(def) = self.definitions.get(fqn) {
            return Some(def);
        }
        if !global_fallback {
            return None;
        }
        let name = self.syntax.unqualified(fqn);
        self.globals
            .get(name)
            .and_then(|fqns| fqns.last())
            .and_then(|global| self.definitions.get(global))
    }

    /// All definitions, in insertion order.
    pub fn definitions(&self) -> impl Iterator<Item = (&Fqn, &Arc<Definition>)> {
        self.definitions.iter()
    }

    /// All definitions marked global.
    pub fn global_definitions(&self) -> impl Iterator<Item = (&Fqn, &Arc<Definition>)> {
        self.definitions.iter().filter(|(_, def)| def.is_global)
    }

    /// Definitions whose namespace is exactly `namespace`.
    pub fn definitions_for_namespace<'a>(
        &'a self,
        namespace: &str,
    ) -> impl Iterator<Item = (&'a Fqn, &'a Arc<Definition>)> + 'a {
        self.by_namespace
            .get(namespace)
            .into_iter()
            .flatten()
            .filter_map(|fqn| self.definitions.get_key_value(fqn))
    }

    /// Definitions declared in `file`.
    pub fn definitions_in_file(&self, file: FileId) -> impl Iterator<Item = &Arc<Definition>> {
        self.by_file
            .get(&file)
            .into_iter()
            .flatten()
            .filter_map(|fqn| self.definitions.get(fqn))
    }

    /// Record that `location` references `fqn`.
    ///
    /// Returns `false` if that exact location was already recorded.
    pub fn add_reference(&mut self, fqn: impl Into<Fqn>, location: Location) -> bool {
        let fqn = fqn.into();
        let added = self
            .references
            .entry(fqn.clone())
            .or_default()
            .insert(location);
        if added {
            self.referenced_from
                .entry(location.file)
                .or_default()
                .insert(fqn);
        }
        added
    }

    /// All recorded locations referencing `fqn`.
    pub fn references(&self, fqn: &str) -> impl Iterator<Item = Location> + '_ {
        self.references.get(fqn).into_iter().flatten().copied()
    }

    /// The distinct files that reference `fqn`.
    pub fn reference_files(&self, fqn: &str) -> FxHashSet<FileId> {
        self.references(fqn).map(|loc| loc.file).collect()
    }

    /// Drop all definitions and references.
    pub fn clear(&mut self) {
        self.definitions.clear();
        self.by_namespace.clear();
        self.globals.clear();
        self.by_file.clear();
        self.references.clear();
        self.referenced_from.clear();
    }

    /// Number of stored definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Number of fqns with at least one recorded reference.
    pub fn referenced_symbol_count(&self) -> usize {
        self.references.len()
    }
}

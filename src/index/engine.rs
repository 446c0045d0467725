//! One incrementally populated index.
//!
//! [`IndexEngine`] composes a [`SymbolStore`] behind a read/write lock, a
//! [`Completeness`] tracker and a [`Notifier`]. The scanning pipeline is the
//! single writer; any number of readers may query at the same time.
//!
//! # Concurrency & ordering
//!
//! * Writes take the store lock, apply the change and release the lock before
//!   any event is emitted, so listeners may query (or write to) the index.
//! * A reader that observes a write also observes every earlier write by the
//!   same producer; definitions are swapped as whole `Arc`s, never torn.
//! * Bulk queries return snapshots (see [`Definitions`]).
//!
//! # Lifecycle
//!
//! 1. `new` starts in [`Stage::Building`] with an empty store.
//! 2. The pipeline calls `put` / `add_reference` and the `mark_*` milestones.
//! 3. `reset` clears everything and starts over; listeners stay registered.
//! 4. `discard` clears everything for good. Later writes fail with
//!    [`IndexError::Discarded`], reads come back empty and no event fires.
//!    Snapshots taken before the discard still iterate to their end.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::completeness::{Completeness, Stage};
use super::config::IndexConfig;
use super::definition::Definition;
use super::error::{IndexError, Result};
use super::notify::{EventFilter, IndexEvent, Listener, Notifier, SubscriptionId};
use super::readable::ReadableIndex;
use super::store::{Definitions, SymbolStore};
use crate::base::{FileId, Fqn, Location};

/// A single symbol index with completeness milestones and events.
#[derive(Debug)]
pub struct IndexEngine {
    name: SmolStr,
    store: RwLock<SymbolStore>,
    completeness: Completeness,
    notifier: Notifier,
    discarded: AtomicBool,
}

impl Default for IndexEngine {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

impl IndexEngine {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            name: SmolStr::new(config.name()),
            store: RwLock::new(SymbolStore::new(config.syntax().clone())),
            completeness: Completeness::new(),
            notifier: Notifier::new(),
            discarded: AtomicBool::new(false),
        }
    }

    /// Current population stage.
    pub fn stage(&self) -> Stage {
        self.completeness.stage()
    }

    pub fn is_definitions_seeded(&self) -> bool {
        self.completeness.is_definitions_seeded()
    }

    /// Number of registered event listeners.
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded.load(Ordering::Acquire)
    }

    /// Number of stored definitions.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Definitions declared in `file`.
    pub fn definitions_in_file(&self, file: FileId) -> Vec<Arc<Definition>> {
        self.store.read().definitions_in_file(file).cloned().collect()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_discarded() {
            return Err(IndexError::Discarded {
                index: self.name.clone(),
            });
        }
        Ok(())
    }

    fn emit(&self, event: IndexEvent) {
        if self.is_discarded() {
            return;
        }
        self.notifier.emit(&event);
    }

    // ========================================================================
    // WRITES (scanning pipeline only)
    // ========================================================================

    /// Insert or replace the definition for its fqn.
    ///
    /// Emits `definition-added` with the fqn once the new value is visible.
    /// Returns the replaced definition, if any.
    pub fn put(&self, definition: Definition) -> Result<Option<Arc<Definition>>> {
        let fqn = definition.fqn.clone();
        let previous = {
            let mut store = self.store.write();
            self.ensure_live()?;
            store.put(Arc::new(definition))
        };
        tracing::trace!(index = %self.name, %fqn, replaced = previous.is_some(), "put definition");
        self.emit(IndexEvent::DefinitionAdded(fqn));
        Ok(previous)
    }

    /// Bulk-load definitions (for example from a cache) and mark the
    /// definitions-seeded milestone.
    ///
    /// Emits one `definition-added` per definition, in iteration order.
    /// Returns the number of definitions loaded.
    pub fn seed_definitions(&self, definitions: impl IntoIterator<Item = Definition>) -> Result<usize> {
        let added: Vec<Fqn> = {
            let mut store = self.store.write();
            self.ensure_live()?;
            definitions
                .into_iter()
                .map(|def| {
                    let fqn = def.fqn.clone();
                    store.put(Arc::new(def));
                    fqn
                })
                .collect()
        };
        self.completeness.seed_definitions();
        tracing::debug!(index = %self.name, count = added.len(), "seeded definitions");

        let count = added.len();
        for fqn in added {
            self.emit(IndexEvent::DefinitionAdded(fqn));
        }
        Ok(count)
    }

    /// Remove the definition for `fqn`. Its references are kept.
    pub fn remove(&self, fqn: &str) -> Result<Option<Arc<Definition>>> {
        let mut store = self.store.write();
        self.ensure_live()?;
        let removed = store.remove(fqn);
        tracing::trace!(index = %self.name, %fqn, found = removed.is_some(), "remove definition");
        Ok(removed)
    }

    /// Drop every definition declared in `file` and every reference inside it,
    /// ahead of re-scanning that file.
    pub fn remove_file(&self, file: FileId) -> Result<usize> {
        let mut store = self.store.write();
        self.ensure_live()?;
        let removed = store.remove_file(file);
        tracing::debug!(index = %self.name, %file, removed, "invalidated file");
        Ok(removed)
    }

    /// Record that `location` references `fqn`. The fqn need not be defined.
    ///
    /// Returns `false` if the same location was already recorded.
    pub fn add_reference(&self, fqn: impl Into<Fqn>, location: Location) -> Result<bool> {
        let fqn = fqn.into();
        let mut store = self.store.write();
        self.ensure_live()?;
        let added = store.add_reference(fqn.clone(), location);
        tracing::trace!(index = %self.name, %fqn, %location, added, "add reference");
        Ok(added)
    }

    /// Mark every static-surface definition as recorded.
    ///
    /// Emits `static-complete` on the first call only.
    pub fn mark_static_complete(&self) -> Result<()> {
        self.advance(Stage::StaticComplete)
    }

    /// Mark every definition and reference as recorded.
    ///
    /// Implies static completeness: if that milestone was not reached yet,
    /// `static-complete` is emitted before `complete`.
    pub fn mark_complete(&self) -> Result<()> {
        self.advance(Stage::Complete)
    }

    fn advance(&self, target: Stage) -> Result<()> {
        // Serialized with `discard`, which resets completeness under the store lock.
        let reached = {
            let _store = self.store.write();
            self.ensure_live()?;
            self.completeness.advance(target)
        };
        for stage in reached {
            tracing::debug!(index = %self.name, ?stage, "milestone reached");
            match stage {
                Stage::StaticComplete => self.emit(IndexEvent::StaticComplete),
                Stage::Complete => self.emit(IndexEvent::Complete),
                Stage::Building | Stage::DefinitionsSeeded => {}
            }
        }
        Ok(())
    }

    /// Clear all data and return to [`Stage::Building`]. Emits `reset`.
    pub fn reset(&self) -> Result<()> {
        {
            let mut store = self.store.write();
            self.ensure_live()?;
            store.clear();
            self.completeness.reset();
        }
        tracing::debug!(index = %self.name, "index reset");
        self.emit(IndexEvent::Reset);
        Ok(())
    }

    /// Release all data and listeners. The index can no longer be written.
    ///
    /// Discarding twice is a no-op.
    pub fn discard(&self) {
        {
            let mut store = self.store.write();
            if self.discarded.swap(true, Ordering::AcqRel) {
                return;
            }
            store.clear();
            self.completeness.reset();
        }
        self.notifier.clear();
        tracing::info!(index = %self.name, "index discarded");
    }
}

impl ReadableIndex for IndexEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_complete(&self) -> bool {
        self.completeness.is_complete()
    }

    fn is_static_complete(&self) -> bool {
        self.completeness.is_static_complete()
    }

    fn definitions(&self) -> Definitions {
        self.store
            .read()
            .definitions()
            .map(|(fqn, def)| (fqn.clone(), def.clone()))
            .collect()
    }

    fn global_definitions(&self) -> Definitions {
        self.store
            .read()
            .global_definitions()
            .map(|(fqn, def)| (fqn.clone(), def.clone()))
            .collect()
    }

    fn definitions_for_namespace(&self, namespace: &str) -> Definitions {
        self.store
            .read()
            .definitions_for_namespace(namespace)
            .map(|(fqn, def)| (fqn.clone(), def.clone()))
            .collect()
    }

    fn definition(&self, fqn: &str, global_fallback: bool) -> Option<Arc<Definition>> {
        self.store.read().definition(fqn, global_fallback).cloned()
    }

    fn references(&self, fqn: &str) -> Vec<Location> {
        self.store.read().references(fqn).collect()
    }

    fn reference_files(&self, fqn: &str) -> FxHashSet<FileId> {
        self.store.read().reference_files(fqn)
    }

    fn subscribe(&self, filter: EventFilter, listener: Listener) -> SubscriptionId {
        self.notifier.subscribe(filter, listener)
    }

    fn subscribe_once(&self, filter: EventFilter, listener: Listener) -> SubscriptionId {
        self.notifier.subscribe_once(filter, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DefinitionKind, EventKind, Milestone};
    use parking_lot::Mutex;

    fn class(fqn: &str) -> Definition {
        Definition::new(fqn, DefinitionKind::Class)
            .with_location(Location::from_offsets(FileId::new(0), 0, 10))
            .static_surface(true)
    }

    fn record(index: &IndexEngine, filter: EventFilter) -> Arc<Mutex<Vec<IndexEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        index.subscribe(filter, Arc::new(move |event: &IndexEvent| sink.lock().push(event.clone())));
        seen
    }

    #[test]
    fn test_put_is_immediately_visible() {
        let index = IndexEngine::default();
        index.put(class("\\App\\A")).unwrap();

        let def = index.definition("\\App\\A", false).unwrap();
        assert_eq!(def.fqn, "\\App\\A");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_put_replaces_latest() {
        let index = IndexEngine::default();
        index.put(class("\\App\\A")).unwrap();
        let previous = index
            .put(Definition::new("\\App\\A", DefinitionKind::Interface))
            .unwrap();

        assert_eq!(previous.map(|d| d.kind), Some(DefinitionKind::Class));
        assert_eq!(
            index.definition("\\App\\A", false).map(|d| d.kind),
            Some(DefinitionKind::Interface)
        );
    }

    #[test]
    fn test_definition_added_events_in_order() {
        let index = IndexEngine::default();
        let seen = record(&index, EventKind::DefinitionAdded.into());

        for fqn in ["\\A", "\\B", "\\C"] {
            index.put(class(fqn)).unwrap();
        }

        assert_eq!(
            *seen.lock(),
            vec![
                IndexEvent::DefinitionAdded(Fqn::from("\\A")),
                IndexEvent::DefinitionAdded(Fqn::from("\\B")),
                IndexEvent::DefinitionAdded(Fqn::from("\\C")),
            ]
        );
    }

    #[test]
    fn test_milestone_events_fire_once() {
        let index = IndexEngine::default();
        let seen = record(&index, EventFilter::All);

        index.mark_static_complete().unwrap();
        index.mark_static_complete().unwrap();
        index.mark_complete().unwrap();
        index.mark_complete().unwrap();

        assert_eq!(*seen.lock(), vec![IndexEvent::StaticComplete, IndexEvent::Complete]);
    }

    #[test]
    fn test_mark_complete_implies_static() {
        let index = IndexEngine::default();
        let seen = record(&index, EventFilter::All);

        index.mark_complete().unwrap();

        assert!(index.is_complete());
        assert!(index.is_static_complete());
        assert!(index.is_definitions_seeded());
        assert_eq!(*seen.lock(), vec![IndexEvent::StaticComplete, IndexEvent::Complete]);
    }

    #[test]
    fn test_seed_definitions() {
        let index = IndexEngine::default();
        let seen = record(&index, EventKind::DefinitionAdded.into());

        let count = index
            .seed_definitions(vec![class("\\A\\X"), class("\\A\\Y")])
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(index.stage(), Stage::DefinitionsSeeded);
        assert!(!index.is_static_complete());
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(index.definitions_for_namespace("\\A").len(), 2);
    }

    #[test]
    fn test_queries_on_incomplete_index() {
        let index = IndexEngine::default();

        assert!(index.definition("\\Nope", true).is_none());
        assert_eq!(index.definitions().len(), 0);
        assert!(index.reference_files("\\Nope").is_empty());
        assert!(index.reference_files("\\Nope").is_empty());
        assert!(index.references("\\Nope").is_empty());
    }

    #[test]
    fn test_snapshot_ignores_later_writes() {
        let index = IndexEngine::default();
        index.put(class("\\A")).unwrap();

        let snapshot = index.definitions();
        index.put(class("\\B")).unwrap();

        assert_eq!(snapshot.count(), 1);
        assert_eq!(index.definitions().count(), 2);
    }

    #[test]
    fn test_remove_file() {
        let index = IndexEngine::default();
        index.put(class("\\A")).unwrap();
        index.put(
            Definition::new("\\B", DefinitionKind::Function)
                .with_location(Location::from_offsets(FileId::new(1), 0, 3)),
        )
        .unwrap();

        assert_eq!(index.remove_file(FileId::new(0)).unwrap(), 1);
        assert!(index.definition("\\A", false).is_none());
        assert_eq!(index.definitions_in_file(FileId::new(1)).len(), 1);
    }

    #[test]
    fn test_reset() {
        let index = IndexEngine::default();
        let seen = record(&index, EventKind::Reset.into());
        index.put(class("\\A")).unwrap();
        index.mark_complete().unwrap();

        index.reset().unwrap();

        assert!(index.is_empty());
        assert!(!index.is_complete());
        assert_eq!(*seen.lock(), vec![IndexEvent::Reset]);
        // the index is still usable
        index.mark_complete().unwrap();
        assert!(index.is_complete());
    }

    #[test]
    fn test_discard_rejects_writes() {
        let index = IndexEngine::new(IndexConfig::new("project"));
        let seen = record(&index, EventFilter::All);
        index.put(class("\\A")).unwrap();
        let snapshot = index.definitions();

        index.discard();
        index.discard();

        assert_eq!(
            index.mark_complete(),
            Err(IndexError::Discarded {
                index: SmolStr::new("project")
            })
        );
        assert!(index.put(class("\\B")).is_err());
        assert!(index.add_reference("\\A", Location::from_offsets(FileId::new(0), 0, 1)).is_err());
        assert!(index.reset().is_err());
        assert!(index.definition("\\A", false).is_none());
        assert!(!index.is_complete());
        assert_eq!(index.listener_count(), 0);
        // only the event before the discard was delivered
        assert_eq!(seen.lock().len(), 1);
        // iteration started before discard finishes against its snapshot
        assert_eq!(snapshot.count(), 1);
    }

    #[test]
    fn test_when_reached_runs_immediately_if_reached() {
        let index = IndexEngine::default();
        index.mark_complete().unwrap();

        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let id = index.when_reached(
            Milestone::Complete,
            Arc::new(move |_: &IndexEvent| *counter.lock() += 1),
        );

        assert!(id.is_none());
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_when_reached_waits_and_fires_once() {
        let index = IndexEngine::default();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let id = index.when_reached(
            Milestone::StaticComplete,
            Arc::new(move |_: &IndexEvent| *counter.lock() += 1),
        );

        assert!(id.is_some());
        assert_eq!(*hits.lock(), 0);

        index.mark_static_complete().unwrap();
        index.reset().unwrap();
        index.mark_static_complete().unwrap();

        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_add_reference_reports_duplicates() {
        let index = IndexEngine::default();
        let at = Location::from_offsets(FileId::new(4), 2, 9);

        assert!(index.add_reference("\\App\\A", at).unwrap());
        assert!(!index.add_reference(Fqn::from("\\App\\A"), at).unwrap());
        assert_eq!(index.references("\\App\\A"), vec![at]);
    }

    #[test]
    fn test_fired_waiters_are_unregistered() {
        let index = IndexEngine::default();
        let hits = Arc::new(Mutex::new(0));
        for _ in 0..100 {
            let counter = hits.clone();
            index.when_reached(
                Milestone::StaticComplete,
                Arc::new(move |_: &IndexEvent| *counter.lock() += 1),
            );
        }
        assert_eq!(index.listener_count(), 100);

        index.mark_complete().unwrap();

        assert_eq!(*hits.lock(), 100);
        assert_eq!(index.listener_count(), 0);
    }

    #[test]
    fn test_cancelled_waiter_never_fires() {
        let index = IndexEngine::default();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let id = index
            .when_reached(
                Milestone::Complete,
                Arc::new(move |_: &IndexEvent| *counter.lock() += 1),
            )
            .unwrap();

        assert!(index.unsubscribe(id));
        index.mark_complete().unwrap();

        assert_eq!(*hits.lock(), 0);
    }

    #[test]
    fn test_discard_racing_mark_complete_leaves_index_incomplete() {
        for _ in 0..200 {
            let index = Arc::new(IndexEngine::default());
            let marker = {
                let index = index.clone();
                std::thread::spawn(move || {
                    let _ = index.mark_complete();
                })
            };
            index.discard();
            marker.join().unwrap();

            assert!(index.is_discarded());
            assert!(!index.is_complete());
            assert!(!index.is_static_complete());
        }
    }

    #[test]
    fn test_listener_may_query_during_event() {
        let index = Arc::new(IndexEngine::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (sink, handle) = (seen.clone(), Arc::downgrade(&index));
        index.subscribe(
            EventKind::DefinitionAdded.into(),
            Arc::new(move |event: &IndexEvent| {
                let (IndexEvent::DefinitionAdded(fqn), Some(index)) = (event, handle.upgrade()) else {
                    return;
                };
                sink.lock().push(index.definition(fqn, false).is_some());
            }),
        );

        index.put(class("\\A")).unwrap();

        assert_eq!(*seen.lock(), vec![true]);
    }
}

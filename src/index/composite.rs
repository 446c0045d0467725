//! Several indexes presented as one.
//!
//! A [`CompositeIndex`] holds an ordered list of member indexes. Earlier
//! members take precedence: a project's own source index is usually pushed
//! before the index of its dependencies, so project definitions shadow
//! dependency definitions with the same fqn.
//!
//! # Lookup policy
//!
//! * `definition` asks members in precedence order for an exact hit first;
//!   only when no member has one does it retry with the global fallback.
//!   Exactness outranks precedence: a lower member's exact hit wins over a
//!   higher member's global fallback.
//! * Bulk queries merge all members. An fqn defined by several members is
//!   yielded once, with the highest-precedence definition.
//! * References are cumulative: the union over all members.
//! * Completeness is the AND over members, recomputed on every call. A
//!   composite without members is complete.
//!
//! # Events
//!
//! `definition-added` from any member is forwarded unchanged. `static-complete`
//! and `complete` are emitted once, when a member milestone brings the whole
//! composite to that milestone. A member `reset` re-arms both and is forwarded.

use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use rustc_hash::{FxBuildHasher, FxHashSet};
use smol_str::SmolStr;

use super::definition::Definition;
use super::notify::{EventFilter, IndexEvent, Listener, Notifier, SubscriptionId};
use super::readable::{Milestone, ReadableIndex};
use super::store::Definitions;
use crate::base::{FileId, Fqn, Location};

struct Member {
    index: Arc<dyn ReadableIndex>,
    subscription: SubscriptionId,
}

#[derive(Default)]
struct Announced {
    static_complete: bool,
    complete: bool,
}

struct CompositeInner {
    name: SmolStr,
    members: RwLock<Vec<Member>>,
    notifier: Notifier,
    announced: Mutex<Announced>,
    /// Held while milestone events are computed and delivered, so threads
    /// announce them in stage order. Reentrant for listeners that write to a
    /// member from inside a delivery.
    milestone_emit: ReentrantMutex<()>,
}

impl CompositeInner {
    fn member_indexes(&self) -> Vec<Arc<dyn ReadableIndex>> {
        self.members.read().iter().map(|m| m.index.clone()).collect()
    }

    fn all_reached(&self, milestone: Milestone) -> bool {
        self.member_indexes()
            .iter()
            .all(|index| index.is_reached(milestone))
    }

    fn on_member_event(&self, event: &IndexEvent) {
        match event {
            IndexEvent::DefinitionAdded(_) => {
                self.notifier.emit(event);
            }
            IndexEvent::StaticComplete | IndexEvent::Complete => self.refresh_milestones(),
            IndexEvent::Reset => {
                self.refresh_milestones();
                self.notifier.emit(event);
            }
        }
    }

    /// Re-evaluate aggregate milestones and announce the newly reached ones.
    fn refresh_milestones(&self) {
        let _emitting = self.milestone_emit.lock();
        let pending = {
            let mut announced = self.announced.lock();
            let mut pending = Vec::new();

            let static_complete = self.all_reached(Milestone::StaticComplete);
            if static_complete && !announced.static_complete {
                pending.push(IndexEvent::StaticComplete);
            }
            announced.static_complete = static_complete;

            let complete = self.all_reached(Milestone::Complete);
            if complete && !announced.complete {
                pending.push(IndexEvent::Complete);
            }
            announced.complete = complete;

            pending
        };

        for event in pending {
            tracing::debug!(index = %self.name, event = event.name(), "composite milestone reached");
            self.notifier.emit(&event);
        }
    }
}

impl Drop for CompositeInner {
    fn drop(&mut self) {
        for member in self.members.get_mut().drain(..) {
            member.index.unsubscribe(member.subscription);
        }
    }
}

/// Several indexes queried as one, with precedence by position.
///
/// Cloning yields another handle to the same composite.
#[derive(Clone)]
pub struct CompositeIndex {
    inner: Arc<CompositeInner>,
}

impl CompositeIndex {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            inner: Arc::new(CompositeInner {
                name: SmolStr::new(name),
                members: RwLock::new(Vec::new()),
                notifier: Notifier::new(),
                announced: Mutex::new(Announced::default()),
                milestone_emit: ReentrantMutex::new(()),
            }),
        }
    }

    /// Build a composite from members listed highest precedence first.
    pub fn with_members(
        name: impl AsRef<str>,
        members: impl IntoIterator<Item = Arc<dyn ReadableIndex>>,
    ) -> Self {
        let composite = Self::new(name);
        for member in members {
            composite.push(member);
        }
        composite
    }

    fn attach(&self, index: &Arc<dyn ReadableIndex>) -> SubscriptionId {
        let weak: Weak<CompositeInner> = Arc::downgrade(&self.inner);
        index.subscribe(
            EventFilter::All,
            Arc::new(move |event: &IndexEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_member_event(event);
                }
            }),
        )
    }

    /// Add a member with the lowest precedence.
    pub fn push(&self, index: Arc<dyn ReadableIndex>) {
        let len = self.len();
        self.insert(len, index);
    }

    /// Add a member at `position` (0 is the highest precedence). Positions past
    /// the end append.
    pub fn insert(&self, position: usize, index: Arc<dyn ReadableIndex>) {
        let subscription = self.attach(&index);
        tracing::debug!(index = %self.inner.name, member = index.name(), position, "member added");
        {
            let mut members = self.inner.members.write();
            let position = position.min(members.len());
            members.insert(
                position,
                Member {
                    index,
                    subscription,
                },
            );
        }
        self.inner.refresh_milestones();
    }

    /// Detach the first member called `name`.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn ReadableIndex>> {
        let member = {
            let mut members = self.inner.members.write();
            let position = members.iter().position(|m| m.index.name() == name)?;
            members.remove(position)
        };
        member.index.unsubscribe(member.subscription);
        tracing::debug!(index = %self.inner.name, member = name, "member removed");
        self.inner.refresh_milestones();
        Some(member.index)
    }

    /// Members in precedence order.
    pub fn members(&self) -> Vec<Arc<dyn ReadableIndex>> {
        self.inner.member_indexes()
    }

    /// The first member called `name`.
    pub fn member(&self, name: &str) -> Option<Arc<dyn ReadableIndex>> {
        self.inner
            .members
            .read()
            .iter()
            .find(|m| m.index.name() == name)
            .map(|m| m.index.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge per-member sequences, keeping the first definition of each fqn.
    fn merge(&self, query: impl Fn(&dyn ReadableIndex) -> Definitions) -> Definitions {
        let mut seen: FxHashSet<Fqn> = FxHashSet::default();
        let mut merged = Vec::new();
        for index in self.inner.member_indexes() {
            for (fqn, def) in query(index.as_ref()) {
                if seen.insert(fqn.clone()) {
                    merged.push((fqn, def));
                }
            }
        }
        Definitions::new(merged)
    }
}

impl std::fmt::Debug for CompositeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .members()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        f.debug_struct("CompositeIndex")
            .field("name", &self.inner.name)
            .field("members", &names)
            .finish()
    }
}

impl ReadableIndex for CompositeIndex {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn is_complete(&self) -> bool {
        self.inner.all_reached(Milestone::Complete)
    }

    fn is_static_complete(&self) -> bool {
        self.inner.all_reached(Milestone::StaticComplete)
    }

    fn definitions(&self) -> Definitions {
        self.merge(|index| index.definitions())
    }

    fn global_definitions(&self) -> Definitions {
        self.merge(|index| index.global_definitions())
    }

    fn definitions_for_namespace(&self, namespace: &str) -> Definitions {
        self.merge(|index| index.definitions_for_namespace(namespace))
    }

    fn definition(&self, fqn: &str, global_fallback: bool) -> Option<Arc<Definition>> {
        let members = self.inner.member_indexes();
        let exact = members.iter().find_map(|index| index.definition(fqn, false));
        if exact.is_some() || !global_fallback {
            return exact;
        }
        members.iter().find_map(|index| index.definition(fqn, true))
    }

    fn references(&self, fqn: &str) -> Vec<Location> {
        let mut locations: IndexSet<Location, FxBuildHasher> = IndexSet::default();
        for index in self.inner.member_indexes() {
            locations.extend(index.references(fqn));
        }
        locations.into_iter().collect()
    }

    fn reference_files(&self, fqn: &str) -> FxHashSet<FileId> {
        self.inner
            .member_indexes()
            .iter()
            .flat_map(|index| index.reference_files(fqn))
            .collect()
    }

    fn subscribe(&self, filter: EventFilter, listener: Listener) -> SubscriptionId {
        self.inner.notifier.subscribe(filter, listener)
    }

    fn subscribe_once(&self, filter: EventFilter, listener: Listener) -> SubscriptionId {
        self.inner.notifier.subscribe_once(filter, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.unsubscribe(id)
    }
}

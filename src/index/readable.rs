//! The read-only query contract shared by single and composite indexes.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::definition::Definition;
use super::notify::{EventFilter, EventKind, IndexEvent, Listener, SubscriptionId};
use super::store::Definitions;
use crate::base::{FileId, Location};

/// A completeness milestone callers can wait for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Milestone {
    /// Static-surface definitions are recorded; inheritance can be resolved.
    StaticComplete,
    /// Everything is recorded.
    Complete,
}

impl Milestone {
    pub fn kind(&self) -> EventKind {
        match self {
            Milestone::StaticComplete => EventKind::StaticComplete,
            Milestone::Complete => EventKind::Complete,
        }
    }

    pub fn event(&self) -> IndexEvent {
        match self {
            Milestone::StaticComplete => IndexEvent::StaticComplete,
            Milestone::Complete => IndexEvent::Complete,
        }
    }
}

/// Lookups over definitions and references.
///
/// Every method may be called at any point of population and returns whatever
/// has been recorded so far. A partial result is normal, never an error, and
/// an unknown symbol is `None` or an empty collection.
///
/// Implemented by [`IndexEngine`](super::IndexEngine) and
/// [`CompositeIndex`](super::CompositeIndex), so query callers need not care
/// which one they hold.
pub trait ReadableIndex: Send + Sync {
    /// Label of this index, used for logging and to address composite members.
    fn name(&self) -> &str;

    /// True once every definition and reference has been recorded.
    fn is_complete(&self) -> bool;

    /// True once every static-surface definition has been recorded.
    fn is_static_complete(&self) -> bool;

    /// All definitions, global or not.
    fn definitions(&self) -> Definitions;

    /// Definitions resolvable without their namespace qualifier.
    fn global_definitions(&self) -> Definitions;

    /// Definitions whose namespace is exactly `namespace`.
    fn definitions_for_namespace(&self, namespace: &str) -> Definitions;

    /// The definition of `fqn`.
    ///
    /// With `global_fallback`, a miss is retried with the namespace qualifier
    /// stripped against global definitions. A namespaced hit always wins.
    fn definition(&self, fqn: &str, global_fallback: bool) -> Option<Arc<Definition>>;

    /// Every recorded location referencing `fqn`.
    fn references(&self, fqn: &str) -> Vec<Location>;

    /// The distinct files referencing `fqn`.
    fn reference_files(&self, fqn: &str) -> FxHashSet<FileId>;

    /// Register for events of this index.
    fn subscribe(&self, filter: EventFilter, listener: Listener) -> SubscriptionId;

    /// Register for the next matching event only. The registration is
    /// dropped by the emit that delivers it.
    fn subscribe_once(&self, filter: EventFilter, listener: Listener) -> SubscriptionId;

    /// Remove a listener registered with [`subscribe`](Self::subscribe) or
    /// [`subscribe_once`](Self::subscribe_once).
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn is_reached(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::StaticComplete => self.is_static_complete(),
            Milestone::Complete => self.is_complete(),
        }
    }

    /// Run `callback` once `milestone` is reached.
    ///
    /// If the milestone has already been reached, `callback` runs immediately
    /// on the calling thread and `None` is returned. Otherwise the returned
    /// subscription delivers the callback once and is then removed; unsubscribe
    /// it to cancel. The subscription is registered before the check, so an
    /// event fired concurrently with this call is not missed.
    fn when_reached(&self, milestone: Milestone, callback: Listener) -> Option<SubscriptionId> {
        let id = self.subscribe_once(milestone.kind().into(), callback.clone());

        if !self.is_reached(milestone) {
            return Some(id);
        }
        // A concurrent emit that already took the registration delivers it.
        if self.unsubscribe(id) {
            callback(&milestone.event());
        }
        None
    }
}

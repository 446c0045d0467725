//! Event fan-out for index milestones and additions.
//!
//! A [`Notifier`] keeps an ordered list of listeners. `emit` copies the
//! matching listeners out of the lock and calls them synchronously, in
//! registration order, before returning. Because the lock is not held during
//! delivery, a listener may subscribe or unsubscribe (even itself) without
//! corrupting the list or deadlocking the producer. Changes made during a
//! delivery take effect from the next `emit`.
//!
//! A listener that panics is logged and skipped; the remaining listeners still
//! receive the event and the producer's write is unaffected.
//!
//! There is no replay: a listener registered after an event fired never sees
//! it. Use [`ReadableIndex::when_reached`](super::ReadableIndex::when_reached)
//! to wait for a milestone that may already have been reached.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::base::Fqn;

/// Something that happened to an index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexEvent {
    /// A definition was added or replaced.
    DefinitionAdded(Fqn),
    /// Every static-surface definition has been recorded.
    StaticComplete,
    /// Every definition and reference has been recorded.
    Complete,
    /// The index was cleared and is being rebuilt.
    Reset,
}

impl IndexEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            IndexEvent::DefinitionAdded(_) => EventKind::DefinitionAdded,
            IndexEvent::StaticComplete => EventKind::StaticComplete,
            IndexEvent::Complete => EventKind::Complete,
            IndexEvent::Reset => EventKind::Reset,
        }
    }

    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// The kind of an [`IndexEvent`], without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    DefinitionAdded,
    StaticComplete,
    Complete,
    Reset,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::DefinitionAdded => "definition-added",
            EventKind::StaticComplete => "static-complete",
            EventKind::Complete => "complete",
            EventKind::Reset => "reset",
        }
    }

    /// Parse a wire name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "definition-added" => Some(EventKind::DefinitionAdded),
            "static-complete" => Some(EventKind::StaticComplete),
            "complete" => Some(EventKind::Complete),
            "reset" => Some(EventKind::Reset),
            _ => None,
        }
    }
}

/// Which events a listener wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFilter {
    Only(EventKind),
    All,
}

impl EventFilter {
    fn matches(&self, kind: EventKind) -> bool {
        match self {
            EventFilter::Only(wanted) => *wanted == kind,
            EventFilter::All => true,
        }
    }
}

impl From<EventKind> for EventFilter {
    fn from(kind: EventKind) -> Self {
        EventFilter::Only(kind)
    }
}

/// A callback invoked for each delivered event.
pub type Listener = Arc<dyn Fn(&IndexEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration {
    id: SubscriptionId,
    filter: EventFilter,
    listener: Listener,
    once: bool,
}

/// Ordered, synchronous event fan-out.
#[derive(Default)]
pub struct Notifier {
    listeners: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It is called after all listeners registered before it.
    pub fn subscribe(&self, filter: EventFilter, listener: Listener) -> SubscriptionId {
        self.register(filter, listener, false)
    }

    /// Register a listener for the next matching event only.
    ///
    /// The registration is removed by the `emit` that delivers to it, so it
    /// runs at most once even when events are emitted from several threads.
    /// `unsubscribe` returns `true` only if it won that race.
    pub fn subscribe_once(&self, filter: EventFilter, listener: Listener) -> SubscriptionId {
        self.register(filter, listener, true)
    }

    fn register(&self, filter: EventFilter, listener: Listener, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Registration {
            id,
            filter,
            listener,
            once,
        });
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|reg| reg.id != id);
        listeners.len() != before
    }

    /// Deliver `event` to every matching listener, in registration order.
    ///
    /// Returns the number of listeners that handled the event without panicking.
    pub fn emit(&self, event: &IndexEvent) -> usize {
        let kind = event.kind();
        let targets: Vec<Listener> = {
            let mut listeners = self.listeners.lock();
            let targets = listeners
                .iter()
                .filter(|reg| reg.filter.matches(kind))
                .map(|reg| reg.listener.clone())
                .collect();
            listeners.retain(|reg| !(reg.once && reg.filter.matches(kind)));
            targets
        };

        let mut delivered = 0;
        for listener in targets {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::warn!(event = event.name(), %reason, "index listener panicked");
                }
            }
        }
        delivered
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

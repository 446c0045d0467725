//! Symbol index: definitions, references and completeness milestones.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! composite   → several indexes merged with precedence
//!   ↓
//! engine      → one index: store + completeness + notifier
//!   ↓
//! readable    → query contract shared by both
//!   ↓
//! store, completeness, notify, definition
//! ```

mod completeness;
mod composite;
mod config;
mod definition;
mod engine;
mod error;
mod notify;
mod readable;
mod store;

pub use completeness::{Completeness, Stage};
pub use composite::CompositeIndex;
pub use config::IndexConfig;
pub use definition::{Definition, DefinitionKind};
pub use engine::IndexEngine;
pub use error::{IndexError, Result};
pub use notify::{EventFilter, EventKind, IndexEvent, Listener, Notifier, SubscriptionId};
pub use readable::{Milestone, ReadableIndex};
pub use store::{Definitions, SymbolStore};

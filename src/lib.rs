//! # symdex
//!
//! Symbol index for language servers: resolve a fully-qualified name to its
//! declaration, find the files referencing a symbol, and learn when the index
//! is complete enough to rely on.
//!
//! The index is queryable while it is still being populated. A scanning
//! pipeline pushes definitions and references as it analyzes files and marks
//! two milestones: *static complete* (every signature recorded) and
//! *complete* (everything recorded). Query callers read at any time and may
//! subscribe to `definition-added`, `static-complete` and `complete` events.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! index   → Store, completeness, events, engine, composite
//!   ↓
//! base    → Primitives (FileId, Location, Fqn)
//! ```
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use symdex::{CompositeIndex, Definition, DefinitionKind, IndexConfig, IndexEngine, ReadableIndex};
//!
//! let source = Arc::new(IndexEngine::new(IndexConfig::new("source")));
//! let vendor = Arc::new(IndexEngine::new(IndexConfig::new("vendor")));
//! source.put(Definition::new("\\App\\User", DefinitionKind::Class)).unwrap();
//! vendor.put(Definition::new("\\strlen", DefinitionKind::Function).global(true)).unwrap();
//!
//! let project = CompositeIndex::with_members(
//!     "project",
//!     [source.clone() as Arc<dyn ReadableIndex>, vendor.clone()],
//! );
//! assert!(project.definition("\\App\\strlen", true).is_some());
//! assert!(!project.is_complete());
//! ```

/// Foundation types: FileId, Location, Fqn
pub mod base;

/// The index itself: store, completeness tracking, events, engine, composite
pub mod index;

// Re-export commonly needed items
pub use base::{FileId, FileSet, Fqn, FqnSyntax, Location, TextRange, TextSize};
pub use index::{
    CompositeIndex, Definition, DefinitionKind, Definitions, EventFilter, EventKind, IndexConfig,
    IndexEngine, IndexError, IndexEvent, Listener, Milestone, ReadableIndex, Stage,
    SubscriptionId,
};

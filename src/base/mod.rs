//! Foundation types for the symbol index.
//!
//! This module provides the small value types shared by every index:
//! - [`FileId`], [`FileSet`] - Source file handles and their URIs
//! - [`Location`], [`TextRange`], [`TextSize`] - Source positions
//! - [`Fqn`], [`FqnSyntax`] - Fully-qualified names and how to split them
//!
//! This module has NO dependencies on other symdex modules.

mod file_id;
mod file_set;
mod fqn;
mod location;

pub use file_id::FileId;
pub use file_set::FileSet;
pub use fqn::{Fqn, FqnSyntax};
pub use location::{Location, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;

//! Errors raised by index write operations.
//!
//! Lookups never fail: a missing symbol is `None`, an unknown fqn has an empty
//! reference set and an incomplete index simply returns what it has. The only
//! failure is structural misuse of an index after it has been discarded.

use smol_str::SmolStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("index '{index}' was discarded and can no longer be written to")]
    Discarded { index: SmolStr },
}

pub type Result<T> = std::result::Result<T, IndexError>;

//! Source positions recorded by the index.

use std::fmt;

// Re-export from text-size for compatibility
pub use text_size::TextRange;
pub use text_size::TextSize;

use super::FileId;

/// A range inside one source file.
///
/// The index treats this as an opaque handle: it is produced by the analysis
/// pipeline and only ever compared, hashed and handed back. Two locations are
/// the same reference when both file and range match.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// The file containing the range
    pub file: FileId,
    /// Byte range within the file
    pub range: TextRange,
}

impl Location {
    /// Create a new location.
    #[inline]
    pub const fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }

    /// Create a location from raw byte offsets.
    pub fn from_offsets(file: FileId, start: u32, end: u32) -> Self {
        Self {
            file,
            range: TextRange::new(TextSize::from(start), TextSize::from(end)),
        }
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.file, self.range)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}..{}",
            self.file,
            u32::from(self.range.start()),
            u32::from(self.range.end())
        )
    }
}

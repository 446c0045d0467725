//! URI interning for source files.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

use super::FileId;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Assigns stable [`FileId`]s to file URIs.
///
/// The scanning pipeline interns every URI it indexes here, and query callers
/// use it to turn the ids returned by `reference_files` back into URIs.
/// One `FileSet` is meant to be shared by all indexes of a workspace.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<FileSetInner>,
}

#[derive(Debug, Default)]
struct FileSetInner {
    /// URI → FileId mapping
    by_uri: FxIndexMap<Arc<str>, FileId>,
    /// FileId → URI mapping (reverse lookup)
    by_id: FxIndexMap<FileId, Arc<str>>,
    /// Next FileId to assign
    next_id: u32,
}

impl FileSet {
    /// Create a new empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the FileId for a URI.
    pub fn file_id(&self, uri: &str) -> FileId {
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.by_uri.get(uri) {
                return id;
            }
        }

        let mut inner = self.inner.write();

        // Another writer may have interned it between the two locks.
        if let Some(&id) = inner.by_uri.get(uri) {
            return id;
        }

        let id = FileId::new(inner.next_id);
        inner.next_id += 1;
        let uri: Arc<str> = Arc::from(uri);
        inner.by_uri.insert(uri.clone(), id);
        inner.by_id.insert(id, uri);
        id
    }

    /// Look up the FileId of a URI without assigning one.
    pub fn get(&self, uri: &str) -> Option<FileId> {
        self.inner.read().by_uri.get(uri).copied()
    }

    /// Get the URI for a FileId.
    pub fn uri(&self, file: FileId) -> Option<Arc<str>> {
        self.inner.read().by_id.get(&file).cloned()
    }

    /// Forget a file. Its id is never handed out again.
    pub fn remove(&self, file: FileId) -> Option<Arc<str>> {
        let mut inner = self.inner.write();
        let uri = inner.by_id.swap_remove(&file)?;
        inner.by_uri.swap_remove(&uri);
        Some(uri)
    }

    /// Get the number of files.
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    /// Check if the file set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All file ids currently known.
    pub fn files(&self) -> Vec<FileId> {
        self.inner.read().by_id.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_stable_ids() {
        let files = FileSet::new();

        let a = files.file_id("file:///src/A.php");
        let b = files.file_id("file:///src/B.php");
        let again = files.file_id("file:///src/A.php");

        assert_ne!(a, b);
        assert_eq!(a, again);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_file_set_uri_lookup() {
        let files = FileSet::new();
        let id = files.file_id("file:///src/A.php");

        assert_eq!(files.uri(id).as_deref(), Some("file:///src/A.php"));
        assert_eq!(files.get("file:///src/A.php"), Some(id));
        assert_eq!(files.get("file:///missing.php"), None);
    }

    #[test]
    fn test_file_set_remove_does_not_reuse_ids() {
        let files = FileSet::new();
        let a = files.file_id("file:///a.php");

        assert_eq!(files.remove(a).as_deref(), Some("file:///a.php"));
        assert!(files.uri(a).is_none());
        assert!(files.remove(a).is_none());

        let b = files.file_id("file:///a.php");
        assert_ne!(a, b);
    }
}

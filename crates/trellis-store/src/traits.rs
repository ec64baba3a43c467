use std::collections::BTreeMap;

use trellis_types::ObjectId;

use crate::error::StoreResult;
use crate::object::{Blob, CommitObject, StoredObject, Tree, TreeEntry};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same data always produces the
///   same ID.
/// - Reads of a missing object return `Ok(None)`; `Err` is reserved for I/O
///   failure or data corruption.
///
/// The typed helpers (`read_tree`, `read_commit`, `lookup_path`, ...) are
/// provided on top of the three primitive operations.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// All stored ids whose hex form starts with `prefix`.
    fn find_by_prefix(&self, prefix: &str) -> StoreResult<Vec<ObjectId>>;

    // ---------------------------------------------------------------
    // Typed helpers
    // ---------------------------------------------------------------

    fn read_blob(&self, id: &ObjectId) -> StoreResult<Option<Blob>> {
        self.read(id)?
            .map(|obj| Blob::from_stored_object(&obj))
            .transpose()
    }

    fn read_tree(&self, id: &ObjectId) -> StoreResult<Option<Tree>> {
        self.read(id)?
            .map(|obj| Tree::from_stored_object(&obj))
            .transpose()
    }

    fn read_commit(&self, id: &ObjectId) -> StoreResult<Option<CommitObject>> {
        self.read(id)?
            .map(|obj| CommitObject::from_stored_object(&obj))
            .transpose()
    }

    fn write_blob(&self, content: &[u8]) -> StoreResult<ObjectId> {
        self.write(&Blob::new(content.to_vec()).to_stored_object())
    }

    fn write_tree(&self, tree: &Tree) -> StoreResult<ObjectId> {
        self.write(&tree.to_stored_object()?)
    }

    fn write_commit(&self, commit: &CommitObject) -> StoreResult<ObjectId> {
        self.write(&commit.to_stored_object()?)
    }

    /// Find the entry at a slash-separated `path` below the root `tree`.
    ///
    /// Returns `Ok(None)` when any component is missing or a non-final
    /// component is not a directory.
    fn lookup_path(&self, tree: &ObjectId, path: &str) -> StoreResult<Option<TreeEntry>> {
        let mut current = *tree;
        let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
        while let Some(name) = components.next() {
            let Some(tree) = self.read_tree(&current)? else {
                return Ok(None);
            };
            let Some(entry) = tree.get(name) else {
                return Ok(None);
            };
            if components.peek().is_none() {
                return Ok(Some(entry.clone()));
            }
            if !entry.is_tree() {
                return Ok(None);
            }
            current = entry.object_id;
        }
        Ok(None)
    }

    /// Every non-directory entry reachable from `tree`, keyed by full path.
    fn flatten_tree(&self, tree: &ObjectId) -> StoreResult<BTreeMap<String, TreeEntry>> {
        let mut out = BTreeMap::new();
        let mut pending = vec![(String::new(), *tree)];
        while let Some((prefix, id)) = pending.pop() {
            let Some(tree) = self.read_tree(&id)? else {
                continue;
            };
            for entry in tree.entries {
                let path = if prefix.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{prefix}/{}", entry.name)
                };
                if entry.is_tree() {
                    pending.push((path, entry.object_id));
                } else {
                    out.insert(path, entry);
                }
            }
        }
        Ok(out)
    }
}

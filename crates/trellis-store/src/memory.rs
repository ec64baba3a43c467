use std::collections::HashMap;
use std::sync::RwLock;

use trellis_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock`. Objects are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }

    fn find_by_prefix(&self, prefix: &str) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map
            .keys()
            .filter(|id| id.matches_prefix(prefix))
            .copied()
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::*;

    fn make_blob(content: &[u8]) -> StoredObject {
        Blob::new(content.to_vec()).to_stored_object()
    }

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello world");
        let id = store.write(&obj).unwrap();
        assert!(!id.is_null());
        assert_eq!(store.read(&id).unwrap(), Some(obj));
        assert_eq!(store.read_blob(&id).unwrap().unwrap().data, b"hello world");
    }

    #[test]
    fn same_content_is_deduplicated() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"identical")).unwrap();
        let id2 = store.write(&make_blob(b"identical")).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn read_missing_object_returns_none() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"missing");
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
        assert!(store.read_tree(&id).unwrap().is_none());
    }

    #[test]
    fn typed_read_rejects_wrong_kind() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&make_blob(b"blob")).unwrap();
        assert!(matches!(
            store.read_tree(&id),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn lookup_and_flatten_nested_tree() {
        let store = InMemoryObjectStore::new();
        let readme = store.write_blob(b"readme").unwrap();
        let main = store.write_blob(b"fn main() {}").unwrap();
        let src = store
            .write_tree(&Tree::new(vec![TreeEntry::new(EntryMode::Regular, "main.rs", main)]))
            .unwrap();
        let root = store
            .write_tree(&Tree::new(vec![
                TreeEntry::new(EntryMode::Regular, "README", readme),
                TreeEntry::new(EntryMode::Directory, "src", src),
            ]))
            .unwrap();

        let entry = store.lookup_path(&root, "src/main.rs").unwrap().unwrap();
        assert_eq!(entry.object_id, main);
        assert!(store.lookup_path(&root, "src").unwrap().unwrap().is_tree());
        assert!(store.lookup_path(&root, "README/nested").unwrap().is_none());
        assert!(store.lookup_path(&root, "missing.txt").unwrap().is_none());

        let flat = store.flatten_tree(&root).unwrap();
        let paths: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["README", "src/main.rs"]);
    }

    #[test]
    fn prefix_lookup() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&make_blob(b"a")).unwrap();
        store.write(&make_blob(b"b")).unwrap();
        let found = store.find_by_prefix(&id.to_hex()[..10]).unwrap();
        assert_eq!(found, vec![id]);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        store.write(&make_blob(b"x")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("object_count"));
    }
}

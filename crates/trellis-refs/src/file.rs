//! File-backed reference store.
//!
//! All refs and HEAD live in one JSON document (`refs.json`). Every mutation
//! re-reads the document, applies the change and atomically replaces the
//! file, so the store never caches state across calls.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;
use trellis_types::ObjectId;

use crate::error::{RefError, Result};
use crate::memory::RefTable;
use crate::traits::RefStore;
use crate::types::{Head, Ref};

/// A [`RefStore`] persisted as a single JSON file.
#[derive(Debug)]
pub struct FileRefStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileRefStore {
    /// Open the store at `path`. A missing file is treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RefTable> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| RefError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RefTable::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, table: &RefTable) -> Result<()> {
        let json = serde_json::to_vec_pretty(table)
            .map_err(|e| RefError::Serialization(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path).map_err(|e| RefError::Io(e.error))?;
        Ok(())
    }

    fn update<T>(&self, f: impl FnOnce(&mut RefTable) -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock().expect("lock poisoned");
        let mut table = self.load()?;
        let out = f(&mut table)?;
        self.save(&table)?;
        Ok(out)
    }
}

impl RefStore for FileRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        Ok(self.load()?.refs.remove(name))
    }

    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()> {
        self.update(|table| table.write_ref(name, reference))?;
        debug!(name, target = %reference.target().short_hex(), "updated ref");
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        self.update(|table| table.delete_ref(name))
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        Ok(self.load()?.list_refs(prefix))
    }

    fn head(&self) -> Result<Option<Head>> {
        Ok(self.load()?.head)
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        self.update(|table| table.set_head(branch))
    }

    fn set_head_detached(&self, target: ObjectId) -> Result<()> {
        self.update(|table| {
            table.head = Some(Head::Detached(target));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRefStore::open(dir.path().join("refs.json"));
        assert!(store.head().unwrap().is_none());
        assert!(store.list_refs("").unwrap().is_empty());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.json");
        let target = ObjectId::from_bytes(b"tip");
        {
            let store = FileRefStore::open(&path);
            store.set_head("main").unwrap();
            store.write_ref("refs/heads/main", &Ref::branch("main", target)).unwrap();
            store.write_ref("refs/tags/v1", &Ref::tag("v1", target, "first")).unwrap();
        }

        let store = FileRefStore::open(&path);
        assert_eq!(store.head().unwrap(), Some(Head::Symbolic("main".into())));
        assert_eq!(store.resolve_head().unwrap(), Some(target));
        assert_eq!(store.tags().unwrap().len(), 1);
    }

    #[test]
    fn failed_update_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRefStore::open(dir.path().join("refs.json"));
        let target = ObjectId::from_bytes(b"t");
        store.write_ref("refs/tags/v1", &Ref::tag("v1", target, "")).unwrap();
        let before = fs::read(store.path()).unwrap();

        assert!(store.write_ref("refs/tags/v1", &Ref::tag("v1", target, "again")).is_err());
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.json");
        fs::write(&path, b"{not json").unwrap();
        let store = FileRefStore::open(&path);
        assert!(matches!(store.head(), Err(RefError::Serialization(_))));
    }
}

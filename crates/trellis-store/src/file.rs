//! Loose-object store on the local filesystem.
//!
//! Each object lives in `<root>/<first two hex chars>/<remaining hex>` as a
//! bincode-encoded [`StoredObject`]. Writes go through a temporary file in
//! the same directory and are persisted with a rename, so a reader never
//! observes a partially written object.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use trellis_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Object store backed by one file per object.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    /// Open (creating if necessary) an object directory.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    fn scan_dir(&self, fanout: &str, prefix: &str, out: &mut Vec<ObjectId>) -> StoreResult<()> {
        let dir = self.root.join(fanout);
        if !dir.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(rest) = name.to_str() else { continue };
            if let Ok(id) = ObjectId::from_hex(&format!("{fanout}{rest}")) {
                if id.matches_prefix(prefix) {
                    out.push(id);
                }
            }
        }
        Ok(())
    }
}

impl ObjectStore for FileObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let path = self.object_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object: StoredObject =
            bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let bytes =
            bincode::serialize(object).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "wrote object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn find_by_prefix(&self, prefix: &str) -> StoreResult<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let mut out = Vec::new();
        if !prefix.is_ascii() {
            return Ok(out);
        }
        if prefix.len() >= 2 {
            self.scan_dir(&prefix[..2], &prefix, &mut out)?;
        } else if !prefix.is_empty() {
            for entry in fs::read_dir(&self.root)? {
                let entry = entry?;
                if let Some(fanout) = entry.file_name().to_str() {
                    if fanout.starts_with(prefix.as_str()) {
                        self.scan_dir(fanout, &prefix, &mut out)?;
                    }
                }
            }
        }
        out.sort();
        Ok(out)
    }
}

//! The [`Index`] staging area and its on-disk form.
//!
//! Entries are kept in a `BTreeMap` keyed by slash-separated path, which is
//! also the order [`Index::write_tree`] needs. When the index was opened with
//! [`Index::load`] it remembers its file and the file's modification time, so
//! [`Index::reread_if_stale`] can pick up changes written by another process.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;
use trellis_store::{EntryMode, ObjectStore, Tree, TreeEntry};
use trellis_types::ObjectId;

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};

const INDEX_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    entries: Vec<IndexEntry>,
}

/// The staging index: the content the next commit will record, per path.
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
    store: Arc<dyn ObjectStore>,
    file: Option<PathBuf>,
    file_mtime: Option<SystemTime>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entries", &self.entries.len())
            .field("file", &self.file)
            .finish()
    }
}

impl Index {
    /// Create a new empty, unpersisted index backed by the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            entries: BTreeMap::new(),
            store,
            file: None,
            file_mtime: None,
        }
    }

    /// Open the index stored at `path`. A missing file yields an empty index
    /// that will be created on the first [`write`](Self::write).
    pub fn load(store: Arc<dyn ObjectStore>, path: impl Into<PathBuf>) -> IndexResult<Self> {
        let mut index = Self::new(store);
        index.file = Some(path.into());
        index.reload()?;
        Ok(index)
    }

    fn reload(&mut self) -> IndexResult<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        let (entries, mtime) = match fs::read(path) {
            Ok(bytes) => {
                let decoded: IndexFile = bincode::deserialize(&bytes)
                    .map_err(|e| IndexError::Serialization(e.to_string()))?;
                if decoded.version != INDEX_VERSION {
                    return Err(IndexError::Serialization(format!(
                        "unsupported index version {}",
                        decoded.version
                    )));
                }
                (decoded.entries, modified_time(path))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Vec::new(), None),
            Err(e) => return Err(e.into()),
        };
        self.entries = entries.into_iter().map(|e| (e.path.clone(), e)).collect();
        self.file_mtime = mtime;
        debug!(path = %path.display(), entries = self.entries.len(), "loaded index");
        Ok(())
    }

    /// Persist the index to the file it was loaded from. Unpersisted
    /// indexes ignore the call.
    pub fn write(&mut self) -> IndexResult<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        let file = IndexFile {
            version: INDEX_VERSION,
            entries: self.entries.values().cloned().collect(),
        };
        let bytes =
            bincode::serialize(&file).map_err(|e| IndexError::Serialization(e.to_string()))?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(path).map_err(|e| IndexError::Io(e.error))?;
        self.file_mtime = modified_time(path);
        Ok(())
    }

    /// Reload from disk if the index file changed since it was last read or
    /// written. Returns whether a reload happened.
    pub fn reread_if_stale(&mut self) -> IndexResult<bool> {
        let Some(path) = &self.file else {
            return Ok(false);
        };
        if modified_time(path) == self.file_mtime {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn has_conflicts(&self) -> bool {
        self.entries.values().any(IndexEntry::is_conflicted)
    }

    /// Stage `content` at `path`: store the blob and record it.
    pub fn add(
        &mut self,
        path: &str,
        content: &[u8],
        mode: EntryMode,
        mtime: SystemTime,
    ) -> IndexResult<ObjectId> {
        validate_path(path)?;
        let object_id = self.store.write_blob(content)?;
        let entry = IndexEntry::new(path, object_id, mode, content.len() as u64, mtime);
        self.entries.insert(path.to_string(), entry);
        debug!(path, id = %object_id.short_hex(), "staged");
        Ok(object_id)
    }

    /// Insert a prepared entry, replacing any entry at the same path.
    pub fn add_entry(&mut self, entry: IndexEntry) -> IndexResult<()> {
        validate_path(&entry.path)?;
        self.entries.insert(entry.path.clone(), entry);
        Ok(())
    }

    /// Reset `path` to its state in `tree`.
    ///
    /// Returns `false` (and leaves the index untouched) when the tree has no
    /// file at that path.
    pub fn add_entry_from_tree(&mut self, path: &str, tree: &ObjectId) -> IndexResult<bool> {
        let Some(found) = self.store.lookup_path(tree, path)? else {
            return Ok(false);
        };
        if found.is_tree() {
            return Ok(false);
        }
        let entry = self.entry_for(path, &found)?;
        self.entries.insert(path.to_string(), entry);
        Ok(true)
    }

    pub fn remove(&mut self, path: &str) -> Option<IndexEntry> {
        self.entries.remove(path)
    }

    /// Build nested trees from the index and write them to the store.
    /// Returns the root tree id.
    pub fn write_tree(&self) -> IndexResult<ObjectId> {
        if let Some(conflicted) = self.entries.values().find(|e| e.is_conflicted()) {
            return Err(IndexError::UnresolvedConflict(conflicted.path.clone()));
        }

        let mut root = DirNode::default();
        for entry in self.entries.values() {
            root.insert(&entry.path, entry)?;
        }
        root.write(self.store.as_ref())
    }

    /// Replace the whole index with the files of `tree`.
    pub fn read_tree(&mut self, tree: &ObjectId) -> IndexResult<()> {
        if !self.store.exists(tree)? {
            return Err(IndexError::ObjectNotFound(*tree));
        }
        let mut entries = BTreeMap::new();
        for (path, found) in self.store.flatten_tree(tree)? {
            let entry = self.entry_for(&path, &found)?;
            entries.insert(path, entry);
        }
        self.entries = entries;
        Ok(())
    }

    fn entry_for(&self, path: &str, found: &TreeEntry) -> IndexResult<IndexEntry> {
        let blob = self
            .store
            .read_blob(&found.object_id)?
            .ok_or(IndexError::ObjectNotFound(found.object_id))?;
        Ok(IndexEntry::new(
            path,
            found.object_id,
            found.mode,
            blob.data.len() as u64,
            SystemTime::UNIX_EPOCH,
        ))
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn validate_path(path: &str) -> IndexResult<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path
            .split('/')
            .any(|c| c.is_empty() || c == "." || c == "..");
    if bad {
        return Err(IndexError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[derive(Default)]
struct DirNode<'a> {
    files: BTreeMap<&'a str, &'a IndexEntry>,
    dirs: BTreeMap<&'a str, DirNode<'a>>,
}

impl<'a> DirNode<'a> {
    fn insert(&mut self, rel: &'a str, entry: &'a IndexEntry) -> IndexResult<()> {
        match rel.split_once('/') {
            None => {
                if self.dirs.contains_key(rel) {
                    return Err(IndexError::InvalidPath(entry.path.clone()));
                }
                self.files.insert(rel, entry);
            }
            Some((dir, rest)) => {
                if self.files.contains_key(dir) {
                    return Err(IndexError::InvalidPath(entry.path.clone()));
                }
                self.dirs.entry(dir).or_default().insert(rest, entry)?;
            }
        }
        Ok(())
    }

    fn write(&self, store: &dyn ObjectStore) -> IndexResult<ObjectId> {
        let mut entries = Vec::with_capacity(self.files.len() + self.dirs.len());
        for (name, entry) in &self.files {
            entries.push(TreeEntry::new(entry.mode, *name, entry.object_id));
        }
        for (name, dir) in &self.dirs {
            entries.push(TreeEntry::new(EntryMode::Directory, *name, dir.write(store)?));
        }
        Ok(store.write_tree(&Tree::new(entries))?)
    }
}

//! Memoized statuses for one session.
//!
//! The cache is keyed by absolute path. Entries are filled either one at a
//! time by [`StatusCache::get`] or all at once by [`StatusCache::fill_all`],
//! which walks the last commit's tree, the index and the working directory
//! together. The cache never notices changes on its own: callers
//! [`invalidate`](StatusCache::invalidate) it on refresh and
//! [`update`](StatusCache::update) the paths they mutate.

use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use trellis_index::Index;
use trellis_store::{ObjectStore, TreeEntry};
use trellis_types::ObjectId;

use crate::classifier::{classify, LiveProbe};
use crate::error::StatusResult;
use crate::ignore::IgnoreMatcher;
use crate::status::{ChangedFile, FileStatus};
use crate::workdir::Workdir;

/// The three sides a status is computed from.
pub struct Snapshot<'a> {
    pub store: &'a dyn ObjectStore,
    /// Root tree of the last commit, `None` before the first commit.
    pub head_tree: Option<ObjectId>,
    pub index: &'a Index,
    pub workdir: &'a dyn Workdir,
    pub ignore: &'a dyn IgnoreMatcher,
}

impl Snapshot<'_> {
    /// Repository-relative, slash-separated form of `path`, which may be
    /// absolute or already relative to the root. `None` for paths outside
    /// the working tree and for the root itself.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = if path.is_absolute() {
            path.strip_prefix(self.workdir.root()).ok()?
        } else {
            path
        };
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }

    pub fn absolute(&self, rel: &str) -> PathBuf {
        self.workdir.root().join(rel)
    }

    fn tree_entry(&self, rel: &str) -> StatusResult<Option<TreeEntry>> {
        match &self.head_tree {
            Some(tree) => Ok(self.store.lookup_path(tree, rel)?),
            None => Ok(None),
        }
    }

    /// Classify one path from fresh state.
    pub fn classify_path(&self, rel: &str) -> StatusResult<FileStatus> {
        let tree = self.tree_entry(rel)?;
        Ok(self.classify_with(rel, tree))
    }

    fn classify_with(&self, rel: &str, tree: Option<TreeEntry>) -> FileStatus {
        let probe = LiveProbe::new(rel, tree, self.index.get(rel), self.workdir, self.ignore);
        classify(&probe)
    }
}

/// Memoized absolute path to status map plus the changed-files projection.
#[derive(Debug, Default)]
pub struct StatusCache {
    statuses: HashMap<PathBuf, FileStatus>,
    changed: Option<Vec<ChangedFile>>,
    filled: bool,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached status of `path`, if any.
    pub fn cached(&self, path: &Path) -> Option<FileStatus> {
        self.statuses.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Status of `path`, computing and storing it on a miss.
    pub fn get(&mut self, snap: &Snapshot<'_>, path: &Path) -> StatusResult<FileStatus> {
        let Some(rel) = snap.relative(path) else {
            return Ok(FileStatus::NotControlled);
        };
        let abs = snap.absolute(&rel);
        if let Some(status) = self.statuses.get(&abs) {
            return Ok(*status);
        }
        let status = snap.classify_path(&rel)?;
        self.statuses.insert(abs, status);
        Ok(status)
    }

    /// Recompute `path` after a mutation and drop the changed-files
    /// projection.
    pub fn update(&mut self, snap: &Snapshot<'_>, path: &Path) -> StatusResult<FileStatus> {
        let Some(rel) = snap.relative(path) else {
            return Ok(FileStatus::NotControlled);
        };
        let status = snap.classify_path(&rel)?;
        self.statuses.insert(snap.absolute(&rel), status);
        self.changed = None;
        Ok(status)
    }

    /// Classify every path present in the last commit, the index or the
    /// working directory. Existing entries for other paths are kept.
    pub fn fill_all(&mut self, snap: &Snapshot<'_>) -> StatusResult<()> {
        let tree_files = match &snap.head_tree {
            Some(tree) => snap.store.flatten_tree(tree)?,
            None => Default::default(),
        };
        let disk_files = snap.workdir.files(snap.ignore).unwrap_or_else(|e| {
            warn!(error = %e, "cannot list working directory");
            Vec::new()
        });

        let mut paths: BTreeSet<&str> = tree_files.keys().map(String::as_str).collect();
        paths.extend(snap.index.entries().map(|e| e.path.as_str()));
        paths.extend(disk_files.iter().map(String::as_str));

        for rel in &paths {
            let status = snap.classify_with(rel, tree_files.get(*rel).cloned());
            self.statuses.insert(snap.absolute(rel), status);
        }
        self.filled = true;
        self.changed = None;
        debug!(paths = paths.len(), "filled status cache");
        Ok(())
    }

    /// Drop every cached status and the changed-files projection.
    pub fn invalidate(&mut self) {
        self.statuses.clear();
        self.changed = None;
        self.filled = false;
    }

    /// Every path whose status is a change, in path order.
    ///
    /// Runs [`fill_all`](Self::fill_all) first if no sweep happened since
    /// the last invalidation.
    pub fn changed_files(&mut self, snap: &Snapshot<'_>) -> StatusResult<&[ChangedFile]> {
        if !self.filled {
            self.fill_all(snap)?;
        }
        if self.changed.is_none() {
            let mut changed: Vec<ChangedFile> = self
                .statuses
                .iter()
                .filter(|(_, status)| status.is_change())
                .filter_map(|(abs, status)| Some(ChangedFile::new(snap.relative(abs)?, *status)))
                .collect();
            changed.sort_by(|a, b| a.path.cmp(&b.path));
            self.changed = Some(changed);
        }
        Ok(self.changed.as_deref().unwrap_or_default())
    }
}

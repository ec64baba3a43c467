//! Access to the working directory.
//!
//! Paths handed to a [`Workdir`] are repository-relative and slash-separated.
//! Only regular files and symlinks count as files; a directory at a path is
//! reported as absent by [`Workdir::metadata`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use tracing::warn;
use trellis_index::FileMeta;
use trellis_store::EntryMode;
use walkdir::WalkDir;

use crate::ignore::IgnoreMatcher;

/// Name of the repository metadata directory.
pub const REPO_DIR: &str = ".trellis";

/// Whether `dir` is the root of another repository (a submodule boundary).
pub fn is_nested_repository(dir: &Path) -> bool {
    dir.join(REPO_DIR).is_dir() || dir.join(".git").exists()
}

/// The live file tree a status is computed against.
pub trait Workdir {
    /// Absolute root of the working tree.
    fn root(&self) -> &Path;

    /// Size, mtime and mode of the file at `path`; `None` if there is no
    /// file there.
    fn metadata(&self, path: &str) -> io::Result<Option<FileMeta>>;

    fn is_dir(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Every file below the root in path order, skipping the repository
    /// directory, nested repositories and directories `prune` ignores.
    ///
    /// Only a failure to read the root itself is an error; entries below it
    /// that cannot be read are left out.
    fn files(&self, prune: &dyn IgnoreMatcher) -> io::Result<Vec<String>>;

    fn exists(&self, path: &str) -> bool {
        matches!(self.metadata(path), Ok(Some(_)))
    }
}

/// The real filesystem below a root directory.
#[derive(Clone, Debug)]
pub struct FsWorkdir {
    root: PathBuf,
}

impl FsWorkdir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
        Some(parts?.join("/"))
    }
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> EntryMode {
    use std::os::unix::fs::PermissionsExt;
    if meta.file_type().is_symlink() {
        EntryMode::Symlink
    } else if meta.permissions().mode() & 0o111 != 0 {
        EntryMode::Executable
    } else {
        EntryMode::Regular
    }
}

#[cfg(not(unix))]
fn file_mode(meta: &fs::Metadata) -> EntryMode {
    if meta.file_type().is_symlink() {
        EntryMode::Symlink
    } else {
        EntryMode::Regular
    }
}

impl Workdir for FsWorkdir {
    fn root(&self) -> &Path {
        &self.root
    }

    fn metadata(&self, path: &str) -> io::Result<Option<FileMeta>> {
        let meta = match fs::symlink_metadata(self.abs(path)) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            return Ok(None);
        }
        let mode = file_mode(&meta);
        let size = if mode == EntryMode::Symlink {
            fs::read_link(self.abs(path))?.as_os_str().len() as u64
        } else {
            meta.len()
        };
        Ok(Some(FileMeta {
            size,
            mtime: meta.modified().ok(),
            mode,
        }))
    }

    fn is_dir(&self, path: &str) -> bool {
        fs::symlink_metadata(self.abs(path)).is_ok_and(|m| m.is_dir())
    }

    /// Symlinks read as their target path.
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let abs = self.abs(path);
        if fs::symlink_metadata(&abs)?.file_type().is_symlink() {
            let target = fs::read_link(&abs)?;
            return Ok(target.to_string_lossy().into_owned().into_bytes());
        }
        fs::read(abs)
    }

    fn files(&self, prune: &dyn IgnoreMatcher) -> io::Result<Vec<String>> {
        let mut out = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                if e.file_name() == REPO_DIR || is_nested_repository(e.path()) {
                    return false;
                }
                match self.relative(e.path()) {
                    Some(rel) => !prune.is_ignored(&rel, true),
                    None => false,
                }
            });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!(path = ?e.path(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            if let Some(rel) = self.relative(entry.path()) {
                out.push(rel);
            }
        }
        out.sort();
        Ok(out)
    }
}

#[derive(Clone, Debug)]
struct MemFile {
    content: Vec<u8>,
    mtime: SystemTime,
    mode: EntryMode,
}

/// An in-memory working directory for tests.
///
/// Every write advances a logical clock, so each write gets a distinct
/// mtime.
#[derive(Debug)]
pub struct MemoryWorkdir {
    root: PathBuf,
    files: RwLock<BTreeMap<String, MemFile>>,
    clock: RwLock<u64>,
}

impl MemoryWorkdir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: RwLock::new(BTreeMap::new()),
            clock: RwLock::new(0),
        }
    }

    fn tick(&self) -> SystemTime {
        let mut clock = self.clock.write().expect("lock poisoned");
        *clock += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + *clock)
    }

    pub fn write(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.write_with_mode(path, content, EntryMode::Regular);
    }

    pub fn write_with_mode(&self, path: &str, content: impl Into<Vec<u8>>, mode: EntryMode) {
        let mtime = self.tick();
        self.files.write().expect("lock poisoned").insert(
            path.to_string(),
            MemFile {
                content: content.into(),
                mtime,
                mode,
            },
        );
    }

    pub fn remove(&self, path: &str) -> bool {
        self.files.write().expect("lock poisoned").remove(path).is_some()
    }
}

impl Workdir for MemoryWorkdir {
    fn root(&self) -> &Path {
        &self.root
    }

    fn metadata(&self, path: &str) -> io::Result<Option<FileMeta>> {
        let files = self.files.read().expect("lock poisoned");
        Ok(files.get(path).map(|f| FileMeta {
            size: f.content.len() as u64,
            mtime: Some(f.mtime),
            mode: f.mode,
        }))
    }

    fn is_dir(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        let files = self.files.read().expect("lock poisoned");
        files.keys().any(|k| k.starts_with(&prefix))
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let files = self.files.read().expect("lock poisoned");
        files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn files(&self, prune: &dyn IgnoreMatcher) -> io::Result<Vec<String>> {
        let files = self.files.read().expect("lock poisoned");
        Ok(files
            .keys()
            .filter(|path| {
                let mut dir = String::new();
                let components: Vec<&str> = path.split('/').collect();
                for component in &components[..components.len() - 1] {
                    if !dir.is_empty() {
                        dir.push('/');
                    }
                    dir.push_str(component);
                    if prune.is_ignored(&dir, true) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect())
    }
}

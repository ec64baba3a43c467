//! Ignore rules.
//!
//! [`GitignoreMatcher`] loads every ignore file in the working tree (by
//! default `.gitignore`) with the `ignore` crate. Each file applies to its
//! own directory and below; a deeper file can re-include (`!pattern`) what a
//! shallower one excluded.

use std::path::{Path, PathBuf};

use ::ignore::gitignore::Gitignore;
use ::ignore::Match;
use tracing::warn;
use walkdir::WalkDir;

use crate::workdir::{is_nested_repository, REPO_DIR};

/// Decides whether an untracked path is ignored.
pub trait IgnoreMatcher {
    /// `path` is repository-relative and slash-separated.
    fn is_ignored(&self, path: &str, is_dir: bool) -> bool;
}

/// Ignores nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIgnore;

impl IgnoreMatcher for NoIgnore {
    fn is_ignored(&self, _path: &str, _is_dir: bool) -> bool {
        false
    }
}

/// Gitignore-syntax rules gathered from a working tree.
#[derive(Debug)]
pub struct GitignoreMatcher {
    root: PathBuf,
    /// Shallowest first.
    layers: Vec<Gitignore>,
}

impl GitignoreMatcher {
    /// Load every file named `file_name` below `root`.
    ///
    /// A directory's ignore file is loaded before its contents are visited,
    /// and directories already ignored are not searched. Malformed patterns
    /// are logged and skipped.
    pub fn load(root: impl Into<PathBuf>, file_name: &str) -> Self {
        let root = root.into();
        let mut matcher = Self {
            root: root.clone(),
            layers: Vec::new(),
        };
        let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = ?e.path(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if entry.depth() > 0
                && (entry.file_name() == REPO_DIR
                    || is_nested_repository(entry.path())
                    || matcher.matches(entry.path(), true))
            {
                walker.skip_current_dir();
                continue;
            }
            let path = entry.path().join(file_name);
            if path.is_file() {
                matcher.add_layer(&path);
            }
        }
        matcher
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn add_layer(&mut self, path: &Path) {
        let (layer, err) = Gitignore::new(path);
        if let Some(err) = err {
            warn!(path = %path.display(), error = %err, "error in ignore file");
        }
        self.layers.push(layer);
    }

    /// Layers are applied shallowest first, so the deepest matching rule
    /// decides.
    fn matches(&self, abs: &Path, is_dir: bool) -> bool {
        let mut ignored = false;
        for layer in &self.layers {
            if !abs.starts_with(layer.path()) {
                continue;
            }
            match layer.matched_path_or_any_parents(abs, is_dir) {
                Match::None => {}
                Match::Ignore(_) => ignored = true,
                Match::Whitelist(_) => ignored = false,
            }
        }
        ignored
    }
}

impl IgnoreMatcher for GitignoreMatcher {
    fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        self.matches(&self.root.join(path), is_dir)
    }
}

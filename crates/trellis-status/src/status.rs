//! Status values.

use serde::Serialize;

/// Where a path stands relative to the last commit, the index and the disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FileStatus {
    /// Outside the repository, or nowhere at all.
    NotControlled,
    /// On disk only, not ignored.
    New,
    /// In the index, not in the last commit.
    Added,
    /// In the index with content different from the last commit.
    Staged,
    /// In the index, changed on disk since staging.
    Modified,
    /// In the index, missing from disk.
    Deleted,
    /// In the last commit, removed from the index.
    Removed,
    /// Unchanged everywhere.
    Tracked,
    /// Unresolved merge conflict in the index.
    MergeConflict,
    /// On disk only, matched by an ignore rule.
    Ignored,
}

impl FileStatus {
    /// Whether the status describes a change already recorded in the index.
    pub fn is_staged(self) -> bool {
        matches!(self, Self::Added | Self::Staged | Self::Removed)
    }

    /// Whether the path belongs in a list of changed files.
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Tracked | Self::NotControlled | Self::Ignored)
    }

    /// Short two-letter code for compact listings.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotControlled => "  ",
            Self::New => "??",
            Self::Added => "A ",
            Self::Staged => "M ",
            Self::Modified => " M",
            Self::Deleted => " D",
            Self::Removed => "D ",
            Self::Tracked => "  ",
            Self::MergeConflict => "UU",
            Self::Ignored => "!!",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotControlled => "not controlled",
            Self::New => "new",
            Self::Added => "added",
            Self::Staged => "staged",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Removed => "removed",
            Self::Tracked => "tracked",
            Self::MergeConflict => "merge conflict",
            Self::Ignored => "ignored",
        };
        f.write_str(s)
    }
}

/// A path with a status worth reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    /// Repository-relative, slash-separated path.
    pub path: String,
    pub status: FileStatus,
    pub is_staged: bool,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            is_staged: status.is_staged(),
        }
    }
}

//! Index entry types.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::warn;
use trellis_store::{Blob, EntryMode};
use trellis_types::ObjectId;

/// An entry in the staging index, representing a tracked file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Slash-separated path relative to the workdir root.
    pub path: String,
    /// Blob id of the staged content.
    pub object_id: ObjectId,
    pub mode: EntryMode,
    /// Size in bytes of the file when it was staged.
    pub size: u64,
    /// Modification time of the file when it was staged. `UNIX_EPOCH`
    /// when unknown, which forces a content comparison.
    pub mtime: SystemTime,
    /// Merge stage; non-zero marks an unresolved conflict.
    pub stage: u8,
}

impl IndexEntry {
    pub fn new(
        path: impl Into<String>,
        object_id: ObjectId,
        mode: EntryMode,
        size: u64,
        mtime: SystemTime,
    ) -> Self {
        Self {
            path: path.into(),
            object_id,
            mode,
            size,
            mtime,
            stage: 0,
        }
    }

    pub fn is_conflicted(&self) -> bool {
        self.stage != 0
    }

    /// Whether the file on disk differs from what was staged.
    ///
    /// A size or mode change is decisive. Equal size and equal mtime is
    /// taken as unchanged. Anything else falls back to hashing the
    /// content produced by `read`; a read failure counts as modified.
    pub fn is_modified<F>(&self, meta: &FileMeta, read: F) -> bool
    where
        F: FnOnce() -> std::io::Result<Vec<u8>>,
    {
        if meta.size != self.size || meta.mode != self.mode {
            return true;
        }
        if meta.mtime == Some(self.mtime) {
            return false;
        }
        match read() {
            Ok(content) => Blob::id_of(&content) != self.object_id,
            Err(e) => {
                warn!(path = %self.path, error = %e, "unreadable file treated as modified");
                true
            }
        }
    }
}

/// File metadata as reported by a working directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    pub mtime: Option<SystemTime>,
    /// `Regular`, `Executable` or `Symlink`.
    pub mode: EntryMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn staged(content: &[u8], mtime: SystemTime) -> IndexEntry {
        IndexEntry::new(
            "file.txt",
            Blob::id_of(content),
            EntryMode::Regular,
            content.len() as u64,
            mtime,
        )
    }

    fn meta(size: u64, mtime: SystemTime) -> FileMeta {
        FileMeta {
            size,
            mtime: Some(mtime),
            mode: EntryMode::Regular,
        }
    }

    #[test]
    fn same_size_and_mtime_skips_hashing() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1000);
        let entry = staged(b"hello", t);
        let unchanged = entry.is_modified(&meta(5, t), || panic!("should not read"));
        assert!(!unchanged);
    }

    #[test]
    fn size_change_is_modified_without_reading() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1000);
        let entry = staged(b"hello", t);
        assert!(entry.is_modified(&meta(6, t), || panic!("should not read")));
    }

    #[test]
    fn touched_file_falls_back_to_hash() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1000);
        let later = t + Duration::from_secs(5);
        let entry = staged(b"hello", t);
        assert!(!entry.is_modified(&meta(5, later), || Ok(b"hello".to_vec())));
        assert!(entry.is_modified(&meta(5, later), || Ok(b"jello".to_vec())));
    }

    #[test]
    fn unreadable_file_is_modified() {
        let entry = staged(b"hello", SystemTime::UNIX_EPOCH);
        let later = SystemTime::UNIX_EPOCH + Duration::from_secs(1);
        assert!(entry.is_modified(&meta(5, later), || {
            Err(std::io::Error::other("denied"))
        }));
    }

    #[test]
    fn mode_change_is_modified() {
        let t = SystemTime::UNIX_EPOCH;
        let entry = staged(b"#!/bin/sh", t);
        let exec = FileMeta {
            size: 9,
            mtime: Some(t),
            mode: EntryMode::Executable,
        };
        assert!(entry.is_modified(&exec, || panic!("should not read")));
        assert!(!entry.is_conflicted());
    }
}

//! The status decision table.
//!
//! A path's status is the result of the first rule in [`RULES`] whose
//! condition holds. Rules read their inputs through [`StatusProbe`], so the
//! table can be evaluated against fixed inputs in tests, and a live probe
//! only touches the disk (stat, hash, ignore rules) when a rule asks.

use std::cell::OnceCell;

use tracing::warn;
use trellis_index::{FileMeta, IndexEntry};
use trellis_store::TreeEntry;

use crate::ignore::IgnoreMatcher;
use crate::status::FileStatus;
use crate::workdir::Workdir;

/// Inputs to the decision table for one path.
pub trait StatusProbe {
    /// Entry in the last commit's tree, possibly a directory.
    fn tree_entry(&self) -> Option<&TreeEntry>;

    fn index_entry(&self) -> Option<&IndexEntry>;

    /// A file (not a directory) exists on disk at the path.
    fn exists_on_disk(&self) -> bool;

    /// The file on disk differs from the index entry.
    fn differs_from_index(&self) -> bool;

    fn is_ignored(&self) -> bool;
}

/// One row of the decision table.
pub struct Rule {
    pub name: &'static str,
    pub status: FileStatus,
    pub applies: fn(&dyn StatusProbe) -> bool,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("status", &self.status)
            .finish()
    }
}

fn tree_file(p: &dyn StatusProbe) -> Option<&TreeEntry> {
    p.tree_entry().filter(|e| !e.is_tree())
}

fn untracked_on_disk(p: &dyn StatusProbe) -> bool {
    p.index_entry().is_none() && tree_file(p).is_none() && p.exists_on_disk()
}

/// The decision table, in evaluation order.
pub static RULES: [Rule; 10] = [
    Rule {
        name: "index-only",
        status: FileStatus::Added,
        applies: |p| p.index_entry().is_some() && tree_file(p).is_none(),
    },
    Rule {
        name: "index-differs-from-tree",
        status: FileStatus::Staged,
        applies: |p| match (p.index_entry(), tree_file(p)) {
            (Some(index), Some(tree)) => index.object_id != tree.object_id,
            _ => false,
        },
    },
    Rule {
        name: "missing-from-disk",
        status: FileStatus::Deleted,
        applies: |p| p.index_entry().is_some() && !p.exists_on_disk(),
    },
    Rule {
        name: "disk-differs-from-index",
        status: FileStatus::Modified,
        applies: |p| p.index_entry().is_some() && p.exists_on_disk() && p.differs_from_index(),
    },
    Rule {
        name: "merge-stage",
        status: FileStatus::MergeConflict,
        applies: |p| p.index_entry().is_some_and(IndexEntry::is_conflicted),
    },
    Rule {
        name: "unchanged",
        status: FileStatus::Tracked,
        applies: |p| match (p.index_entry(), tree_file(p)) {
            (Some(index), Some(tree)) => index.object_id == tree.object_id,
            _ => false,
        },
    },
    Rule {
        name: "tree-only",
        status: FileStatus::Removed,
        applies: |p| p.index_entry().is_none() && tree_file(p).is_some(),
    },
    Rule {
        name: "untracked-ignored",
        status: FileStatus::Ignored,
        applies: |p| untracked_on_disk(p) && p.is_ignored(),
    },
    Rule {
        name: "untracked",
        status: FileStatus::New,
        applies: |p| untracked_on_disk(p) && !p.is_ignored(),
    },
    Rule {
        name: "fallback",
        status: FileStatus::NotControlled,
        applies: |_| true,
    },
];

/// The first rule that applies. The last rule always applies.
pub fn matched_rule(probe: &dyn StatusProbe) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(probe))
        .unwrap_or(&RULES[RULES.len() - 1])
}

pub fn classify(probe: &dyn StatusProbe) -> FileStatus {
    matched_rule(probe).status
}

/// A probe over the live working directory, memoizing each disk input the
/// first time a rule reads it.
pub struct LiveProbe<'a> {
    path: &'a str,
    tree: Option<TreeEntry>,
    index: Option<&'a IndexEntry>,
    workdir: &'a dyn Workdir,
    ignore: &'a dyn IgnoreMatcher,
    meta: OnceCell<Option<FileMeta>>,
    differs: OnceCell<bool>,
    ignored: OnceCell<bool>,
}

impl<'a> LiveProbe<'a> {
    pub fn new(
        path: &'a str,
        tree: Option<TreeEntry>,
        index: Option<&'a IndexEntry>,
        workdir: &'a dyn Workdir,
        ignore: &'a dyn IgnoreMatcher,
    ) -> Self {
        Self {
            path,
            tree,
            index,
            workdir,
            ignore,
            meta: OnceCell::new(),
            differs: OnceCell::new(),
            ignored: OnceCell::new(),
        }
    }

    fn meta(&self) -> Option<&FileMeta> {
        self.meta
            .get_or_init(|| match self.workdir.metadata(self.path) {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = self.path, error = %e, "cannot stat file, treating as absent");
                    None
                }
            })
            .as_ref()
    }
}

impl StatusProbe for LiveProbe<'_> {
    fn tree_entry(&self) -> Option<&TreeEntry> {
        self.tree.as_ref()
    }

    fn index_entry(&self) -> Option<&IndexEntry> {
        self.index
    }

    fn exists_on_disk(&self) -> bool {
        self.meta().is_some()
    }

    fn differs_from_index(&self) -> bool {
        *self.differs.get_or_init(|| match (self.index, self.meta()) {
            (Some(entry), Some(meta)) => entry.is_modified(meta, || self.workdir.read(self.path)),
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    fn is_ignored(&self) -> bool {
        *self.ignored.get_or_init(|| self.ignore.is_ignored(self.path, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::SystemTime;
    use trellis_store::{Blob, EntryMode};
    use trellis_types::ObjectId;

    use crate::ignore::NoIgnore;
    use crate::workdir::MemoryWorkdir;

    /// Fixed inputs that record which of the lazy inputs were read.
    #[derive(Default)]
    struct Fixed {
        tree: Option<TreeEntry>,
        index: Option<IndexEntry>,
        on_disk: bool,
        differs: bool,
        ignored: bool,
        disk_reads: Cell<u32>,
        ignore_reads: Cell<u32>,
    }

    impl StatusProbe for Fixed {
        fn tree_entry(&self) -> Option<&TreeEntry> {
            self.tree.as_ref()
        }
        fn index_entry(&self) -> Option<&IndexEntry> {
            self.index.as_ref()
        }
        fn exists_on_disk(&self) -> bool {
            self.disk_reads.set(self.disk_reads.get() + 1);
            self.on_disk
        }
        fn differs_from_index(&self) -> bool {
            self.disk_reads.set(self.disk_reads.get() + 1);
            self.differs
        }
        fn is_ignored(&self) -> bool {
            self.ignore_reads.set(self.ignore_reads.get() + 1);
            self.ignored
        }
    }

    fn id(s: &str) -> ObjectId {
        Blob::id_of(s.as_bytes())
    }

    fn tree(content: &str) -> Option<TreeEntry> {
        Some(TreeEntry::new(EntryMode::Regular, "f", id(content)))
    }

    fn index(content: &str) -> Option<IndexEntry> {
        Some(IndexEntry::new(
            "f",
            id(content),
            EntryMode::Regular,
            content.len() as u64,
            SystemTime::UNIX_EPOCH,
        ))
    }

    #[test]
    fn added_when_only_in_index() {
        let p = Fixed {
            index: index("h1"),
            on_disk: true,
            ..Default::default()
        };
        assert_eq!(classify(&p), FileStatus::Added);
        assert_eq!(matched_rule(&p).name, "index-only");
        assert_eq!(p.disk_reads.get(), 0);
    }

    #[test]
    fn staged_beats_modified_without_touching_disk() {
        let p = Fixed {
            tree: tree("h2"),
            index: index("h1"),
            on_disk: true,
            differs: true,
            ..Default::default()
        };
        assert_eq!(classify(&p), FileStatus::Staged);
        assert_eq!(p.disk_reads.get(), 0);
    }

    #[test]
    fn index_entries_checked_against_disk() {
        let deleted = Fixed {
            tree: tree("h"),
            index: index("h"),
            on_disk: false,
            ..Default::default()
        };
        assert_eq!(classify(&deleted), FileStatus::Deleted);

        let modified = Fixed {
            tree: tree("h"),
            index: index("h"),
            on_disk: true,
            differs: true,
            ..Default::default()
        };
        assert_eq!(classify(&modified), FileStatus::Modified);

        let tracked = Fixed {
            tree: tree("h"),
            index: index("h"),
            on_disk: true,
            ..Default::default()
        };
        assert_eq!(classify(&tracked), FileStatus::Tracked);
        assert_eq!(matched_rule(&tracked).name, "unchanged");
    }

    #[test]
    fn conflict_stage() {
        let mut entry = index("ours").unwrap();
        entry.stage = 2;
        let p = Fixed {
            tree: tree("ours"),
            index: Some(entry),
            on_disk: true,
            ..Default::default()
        };
        assert_eq!(classify(&p), FileStatus::MergeConflict);
    }

    #[test]
    fn removed_when_only_in_tree() {
        let p = Fixed {
            tree: tree("h"),
            on_disk: false,
            ..Default::default()
        };
        assert_eq!(classify(&p), FileStatus::Removed);

        // Still Removed when the file is back on disk but not re-staged.
        let p = Fixed {
            tree: tree("h"),
            on_disk: true,
            ..Default::default()
        };
        assert_eq!(classify(&p), FileStatus::Removed);
    }

    #[test]
    fn untracked_files() {
        let new = Fixed {
            on_disk: true,
            ..Default::default()
        };
        assert_eq!(classify(&new), FileStatus::New);

        let ignored = Fixed {
            on_disk: true,
            ignored: true,
            ..Default::default()
        };
        assert_eq!(classify(&ignored), FileStatus::Ignored);

        let nothing = Fixed::default();
        assert_eq!(classify(&nothing), FileStatus::NotControlled);
        assert_eq!(nothing.ignore_reads.get(), 0);
    }

    #[test]
    fn directory_in_tree_counts_as_absent() {
        let dir = Some(TreeEntry::new(EntryMode::Directory, "f", id("tree")));
        let p = Fixed {
            tree: dir.clone(),
            on_disk: true,
            ..Default::default()
        };
        assert_eq!(classify(&p), FileStatus::New);

        let p = Fixed {
            tree: dir,
            index: index("h"),
            on_disk: true,
            ..Default::default()
        };
        assert_eq!(classify(&p), FileStatus::Added);
    }

    #[test]
    fn rule_order_is_stable() {
        let names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.first(), Some(&"index-only"));
        assert_eq!(names.last(), Some(&"fallback"));
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn live_probe_reads_workdir_lazily() {
        let workdir = MemoryWorkdir::new("/work");
        workdir.write("f", "h1");
        let entry = IndexEntry::new("f", id("h1"), EntryMode::Regular, 2, SystemTime::UNIX_EPOCH);

        let probe = LiveProbe::new("f", tree("h1"), Some(&entry), &workdir, &NoIgnore);
        assert_eq!(classify(&probe), FileStatus::Tracked);

        workdir.write("f", "h2");
        let probe = LiveProbe::new("f", tree("h1"), Some(&entry), &workdir, &NoIgnore);
        assert_eq!(classify(&probe), FileStatus::Modified);

        workdir.remove("f");
        let probe = LiveProbe::new("f", tree("h1"), Some(&entry), &workdir, &NoIgnore);
        assert_eq!(classify(&probe), FileStatus::Deleted);
    }
}

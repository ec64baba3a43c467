//! Tree comparison: a synchronized walk over two or more trees.
//!
//! All sides are descended together in path order (a directory `a` sorts as
//! `a/`). Subtrees whose ids agree on every side are skipped without being
//! read. When a name is a file on some sides and a directory on others, the
//! file is compared with the directory sides counted as absent, and the
//! directory is then descended with the file sides counted as absent.
//!
//! A side given as `None` is an empty tree.

use std::collections::BTreeMap;

use serde::Serialize;
use trellis_store::{EntryMode, ObjectStore, Tree, TreeEntry};
use trellis_types::ObjectId;

use crate::error::{DiffError, DiffResult};

/// How a path differs between the compared trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    /// Same content, different mode (e.g. a file became a symlink).
    TypeChanged,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
            Self::TypeChanged => "type changed",
        };
        f.write_str(s)
    }
}

/// A path-level change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
}

impl Change {
    fn new(path: String, kind: ChangeKind) -> Self {
        Self { path, kind }
    }
}

/// One side's entry at a path: `None` means absent.
type Slot = Option<(EntryMode, ObjectId)>;

/// Compare `target` against `against`.
///
/// A path only in `target` is `Added`, a path only in `against` is
/// `Deleted`. Changes come back in path order.
pub fn compare_trees(
    store: &dyn ObjectStore,
    target: Option<ObjectId>,
    against: Option<ObjectId>,
) -> DiffResult<Vec<Change>> {
    let mut out = Vec::new();
    walk(store, "", &[target, against], &classify_pair, &mut out)?;
    Ok(out)
}

/// Compare `trees[0]` (the base) against every other tree at once.
///
/// Per path, the first matching rule wins and a path matching none is
/// omitted:
///
/// - base present, every other side absent: `Added`
/// - base absent, some other side present: `Deleted`
/// - base content differs from every other side: `Modified`
/// - some other side has the same content under a different mode:
///   `TypeChanged`
///
/// With a merge commit as base and its parents as the other sides, this
/// reports only the paths the merge itself changed.
pub fn compare_many(store: &dyn ObjectStore, trees: &[Option<ObjectId>]) -> DiffResult<Vec<Change>> {
    let mut out = Vec::new();
    if trees.len() < 2 {
        return Ok(out);
    }
    walk(store, "", trees, &classify_many, &mut out)?;
    Ok(out)
}

fn classify_pair(slots: &[Slot]) -> Option<ChangeKind> {
    match (slots[0], slots[1]) {
        (Some(_), None) => Some(ChangeKind::Added),
        (None, Some(_)) => Some(ChangeKind::Deleted),
        (Some((mode_a, id_a)), Some((mode_b, id_b))) if mode_a != mode_b && id_a == id_b => {
            Some(ChangeKind::TypeChanged)
        }
        _ => Some(ChangeKind::Modified),
    }
}

fn classify_many(slots: &[Slot]) -> Option<ChangeKind> {
    let (base, others) = slots.split_first()?;
    match base {
        Some(_) if others.iter().all(Option::is_none) => Some(ChangeKind::Added),
        None if others.iter().any(Option::is_some) => Some(ChangeKind::Deleted),
        None => None,
        Some((base_mode, base_id)) => {
            if others.iter().all(|o| o.map(|(_, id)| id) != Some(*base_id)) {
                Some(ChangeKind::Modified)
            } else if others
                .iter()
                .flatten()
                .any(|(mode, id)| mode != base_mode && id == base_id)
            {
                Some(ChangeKind::TypeChanged)
            } else {
                None
            }
        }
    }
}

/// Entries of every side under one name, split by kind.
#[derive(Default)]
struct NameSlots {
    files: Option<Vec<Slot>>,
    dirs: Option<Vec<Option<ObjectId>>>,
}

fn walk(
    store: &dyn ObjectStore,
    prefix: &str,
    trees: &[Option<ObjectId>],
    classify: &dyn Fn(&[Slot]) -> Option<ChangeKind>,
    out: &mut Vec<Change>,
) -> DiffResult<()> {
    if trees.windows(2).all(|w| w[0] == w[1]) {
        return Ok(());
    }

    let sides = trees.len();
    // Keyed by name, with a trailing '/' for directories, so iteration
    // follows path order.
    let mut names: BTreeMap<String, NameSlots> = BTreeMap::new();
    for (side, tree) in trees.iter().enumerate() {
        for entry in load(store, tree)?.entries {
            record(&mut names, sides, side, entry);
        }
    }

    for (key, slots) in names {
        if let Some(files) = slots.files {
            if files.windows(2).any(|w| w[0] != w[1]) {
                if let Some(kind) = classify(&files) {
                    out.push(Change::new(join(prefix, &key), kind));
                }
            }
        }
        if let Some(dirs) = slots.dirs {
            let name = key.trim_end_matches('/');
            walk(store, &join(prefix, name), &dirs, classify, out)?;
        }
    }
    Ok(())
}

fn record(names: &mut BTreeMap<String, NameSlots>, sides: usize, side: usize, entry: TreeEntry) {
    if entry.is_tree() {
        let slots = names.entry(format!("{}/", entry.name)).or_default();
        slots.dirs.get_or_insert_with(|| vec![None; sides])[side] = Some(entry.object_id);
    } else {
        let slots = names.entry(entry.name).or_default();
        slots.files.get_or_insert_with(|| vec![None; sides])[side] =
            Some((entry.mode, entry.object_id));
    }
}

fn load(store: &dyn ObjectStore, tree: &Option<ObjectId>) -> DiffResult<Tree> {
    match tree {
        None => Ok(Tree::empty()),
        Some(id) => store.read_tree(id)?.ok_or(DiffError::ObjectNotFound(*id)),
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_store::InMemoryObjectStore;

    /// Write a tree from `(path, content)` pairs; paths may be nested.
    fn tree(store: &InMemoryObjectStore, files: &[(&str, &str)]) -> ObjectId {
        tree_with_modes(
            store,
            &files.iter().map(|(p, c)| (*p, *c, EntryMode::Regular)).collect::<Vec<_>>(),
        )
    }

    fn tree_with_modes(store: &InMemoryObjectStore, files: &[(&str, &str, EntryMode)]) -> ObjectId {
        let mut direct = Vec::new();
        let mut nested: BTreeMap<&str, Vec<(&str, &str, EntryMode)>> = BTreeMap::new();
        for (path, content, mode) in files {
            match path.split_once('/') {
                Some((dir, rest)) => nested.entry(dir).or_default().push((rest, *content, *mode)),
                None => {
                    let id = store.write_blob(content.as_bytes()).unwrap();
                    direct.push(TreeEntry::new(*mode, *path, id));
                }
            }
        }
        for (dir, children) in nested {
            let id = tree_with_modes(store, &children);
            direct.push(TreeEntry::new(EntryMode::Directory, dir, id));
        }
        store.write_tree(&Tree::new(direct)).unwrap()
    }

    fn summary(changes: &[Change]) -> Vec<(String, ChangeKind)> {
        changes.iter().map(|c| (c.path.clone(), c.kind)).collect()
    }

    #[test]
    fn self_comparison_is_empty() {
        let store = InMemoryObjectStore::new();
        let t = tree(&store, &[("a.txt", "a"), ("dir/b.txt", "b")]);
        assert!(compare_trees(&store, Some(t), Some(t)).unwrap().is_empty());
        assert!(compare_many(&store, &[Some(t), Some(t), Some(t)]).unwrap().is_empty());
    }

    #[test]
    fn two_way_kinds_in_path_order() {
        let store = InMemoryObjectStore::new();
        let old = tree(&store, &[("keep", "k"), ("gone", "g"), ("src/lib.rs", "v1")]);
        let new = tree(&store, &[("keep", "k"), ("fresh", "f"), ("src/lib.rs", "v2")]);

        let changes = compare_trees(&store, Some(new), Some(old)).unwrap();
        assert_eq!(
            summary(&changes),
            vec![
                ("fresh".into(), ChangeKind::Added),
                ("gone".into(), ChangeKind::Deleted),
                ("src/lib.rs".into(), ChangeKind::Modified),
            ]
        );
    }

    #[test]
    fn mode_change_with_same_content_is_type_changed() {
        let store = InMemoryObjectStore::new();
        let a = tree_with_modes(&store, &[("run.sh", "echo", EntryMode::Executable)]);
        let b = tree_with_modes(&store, &[("run.sh", "echo", EntryMode::Regular)]);
        let changes = compare_trees(&store, Some(a), Some(b)).unwrap();
        assert_eq!(summary(&changes), vec![("run.sh".into(), ChangeKind::TypeChanged)]);
    }

    #[test]
    fn empty_side_reports_everything() {
        let store = InMemoryObjectStore::new();
        let t = tree(&store, &[("a", "1"), ("d/e", "2")]);
        let changes = compare_trees(&store, Some(t), None).unwrap();
        assert_eq!(
            summary(&changes),
            vec![("a".into(), ChangeKind::Added), ("d/e".into(), ChangeKind::Added)]
        );
    }

    #[test]
    fn file_replaced_by_directory() {
        let store = InMemoryObjectStore::new();
        let old = tree(&store, &[("a", "file"), ("a.txt", "x")]);
        let new = tree(&store, &[("a/inner", "nested"), ("a.txt", "x")]);

        let changes = compare_trees(&store, Some(new), Some(old)).unwrap();
        assert_eq!(
            summary(&changes),
            vec![
                ("a".into(), ChangeKind::Deleted),
                ("a/inner".into(), ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn identical_subtrees_are_not_read() {
        let store = InMemoryObjectStore::new();
        let shared_sub = tree(&store, &[("x", "1")]);
        // A root that points at a subtree id that does not exist in the store
        // on both sides: comparing must not try to read it.
        let missing = ObjectId::from_bytes(b"missing subtree");
        let mk = |extra: &str| {
            let blob = store.write_blob(extra.as_bytes()).unwrap();
            store
                .write_tree(&Tree::new(vec![
                    TreeEntry::new(EntryMode::Directory, "ghost", missing),
                    TreeEntry::new(EntryMode::Directory, "sub", shared_sub),
                    TreeEntry::new(EntryMode::Regular, "f", blob),
                ]))
                .unwrap()
        };
        let a = mk("a");
        let b = mk("b");
        let changes = compare_trees(&store, Some(a), Some(b)).unwrap();
        assert_eq!(summary(&changes), vec![("f".into(), ChangeKind::Modified)]);
    }

    #[test]
    fn missing_tree_is_an_error() {
        let store = InMemoryObjectStore::new();
        let t = tree(&store, &[("a", "1")]);
        let ghost = ObjectId::from_bytes(b"ghost");
        assert!(matches!(
            compare_trees(&store, Some(t), Some(ghost)),
            Err(DiffError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn two_sided_many_matches_pairwise() {
        let store = InMemoryObjectStore::new();
        let old = tree(&store, &[("a", "1"), ("b", "2"), ("d/x", "3")]);
        let new = tree(&store, &[("a", "1*"), ("c", "4"), ("d/x", "3"), ("d/y", "5")]);
        assert_eq!(
            compare_many(&store, &[Some(new), Some(old)]).unwrap(),
            compare_trees(&store, Some(new), Some(old)).unwrap()
        );
    }

    #[test]
    fn merge_reports_only_paths_differing_from_every_parent() {
        let store = InMemoryObjectStore::new();
        let p1 = tree(&store, &[("ours", "o2"), ("theirs", "t1"), ("both", "b1")]);
        let p2 = tree(&store, &[("ours", "o1"), ("theirs", "t2"), ("both", "b2")]);
        // The merge takes "ours" from p1, "theirs" from p2 and rewrites "both".
        let merge = tree(
            &store,
            &[("ours", "o2"), ("theirs", "t2"), ("both", "b3"), ("new", "n")],
        );

        let changes = compare_many(&store, &[Some(merge), Some(p1), Some(p2)]).unwrap();
        assert_eq!(
            summary(&changes),
            vec![("both".into(), ChangeKind::Modified), ("new".into(), ChangeKind::Added)]
        );
    }

    #[test]
    fn n_way_deleted_when_any_parent_has_path() {
        let store = InMemoryObjectStore::new();
        let p1 = tree(&store, &[("old", "x")]);
        let p2 = tree(&store, &[]);
        let merge = tree(&store, &[]);
        let changes = compare_many(&store, &[Some(merge), Some(p1), Some(p2)]).unwrap();
        assert_eq!(summary(&changes), vec![("old".into(), ChangeKind::Deleted)]);
    }

    #[test]
    fn n_way_type_change() {
        let store = InMemoryObjectStore::new();
        let merge = tree_with_modes(&store, &[("s", "t", EntryMode::Executable)]);
        let p1 = tree_with_modes(&store, &[("s", "t", EntryMode::Regular)]);
        let p2 = tree_with_modes(&store, &[("s", "other", EntryMode::Regular)]);
        let changes = compare_many(&store, &[Some(merge), Some(p1), Some(p2)]).unwrap();
        assert_eq!(summary(&changes), vec![("s".into(), ChangeKind::TypeChanged)]);
    }

    #[test]
    fn change_serializes_to_json() {
        let change = Change::new("a".into(), ChangeKind::TypeChanged);
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"path":"a","kind":"TypeChanged"}"#);
        assert_eq!(ChangeKind::TypeChanged.to_string(), "type changed");
    }
}

//! Bounded history walk.
//!
//! Every commit reachable from the tips is loaded, then emitted in
//! topological order (a commit always precedes its parents), choosing the
//! most recent commit among those whose children have all been emitted.
//! Ties on commit time break on id so the order is deterministic.

use std::collections::{BinaryHeap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use trellis_store::{CommitObject, ObjectStore};
use trellis_types::ObjectId;

use crate::error::GraphResult;
use crate::model::{Commit, CommitList};

/// Walk history from `tips`, newest first, keeping at most `max_commits`.
pub fn walk(
    store: &dyn ObjectStore,
    tips: &[ObjectId],
    max_commits: usize,
) -> GraphResult<CommitList> {
    walk_at(store, tips, max_commits, Utc::now())
}

/// Like [`walk`], rendering relative dates against `now`.
pub fn walk_at(
    store: &dyn ObjectStore,
    tips: &[ObjectId],
    max_commits: usize,
    now: DateTime<Utc>,
) -> GraphResult<CommitList> {
    let objects = reachable(store, tips)?;

    let mut pending_children: HashMap<ObjectId, usize> =
        objects.keys().map(|id| (*id, 0)).collect();
    for object in objects.values() {
        for parent in unique_parents(object) {
            if let Some(count) = pending_children.get_mut(&parent) {
                *count += 1;
            }
        }
    }

    let mut ready: BinaryHeap<(DateTime<Utc>, ObjectId)> = pending_children
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| (objects[id].committer.when, *id))
        .collect();

    let mut out = Vec::new();
    while let Some((_, id)) = ready.pop() {
        if out.len() == max_commits {
            break;
        }
        let object = &objects[&id];
        for parent in unique_parents(object) {
            let Some(count) = pending_children.get_mut(&parent) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                ready.push((objects[&parent].committer.when, parent));
            }
        }
        out.push(Commit::from_object(id, object, now));
    }

    debug!(
        reachable = objects.len(),
        kept = out.len(),
        "walked commit history"
    );
    Ok(CommitList::new(out))
}

fn unique_parents(object: &CommitObject) -> Vec<ObjectId> {
    let mut parents = object.parents.clone();
    let mut seen = Vec::with_capacity(parents.len());
    parents.retain(|p| {
        if seen.contains(p) {
            false
        } else {
            seen.push(*p);
            true
        }
    });
    parents
}

/// Load every commit reachable from `tips`. Missing commits are skipped.
fn reachable(
    store: &dyn ObjectStore,
    tips: &[ObjectId],
) -> GraphResult<HashMap<ObjectId, CommitObject>> {
    let mut objects = HashMap::new();
    let mut queue: VecDeque<ObjectId> = tips.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if objects.contains_key(&id) {
            continue;
        }
        let Some(object) = store.read_commit(&id)? else {
            warn!(commit = %id.short_hex(), "commit missing from store, skipping");
            continue;
        };
        queue.extend(
            object
                .parents
                .iter()
                .filter(|p| !objects.contains_key(*p))
                .copied(),
        );
        objects.insert(id, object);
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use trellis_store::{InMemoryObjectStore, Tree};
    use trellis_types::Signature;

    struct History {
        store: InMemoryObjectStore,
        tree: ObjectId,
        epoch: DateTime<Utc>,
    }

    impl History {
        fn new() -> Self {
            let store = InMemoryObjectStore::new();
            let tree = store.write_tree(&Tree::empty()).unwrap();
            Self {
                store,
                tree,
                epoch: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            }
        }

        fn commit(&self, message: &str, minute: i64, parents: &[ObjectId]) -> ObjectId {
            let sig = Signature::new("Ada", "ada@example.com", self.epoch + Duration::minutes(minute));
            self.store
                .write_commit(&CommitObject {
                    tree: self.tree,
                    parents: parents.to_vec(),
                    author: sig.clone(),
                    committer: sig,
                    message: format!("{message}\n\nbody"),
                })
                .unwrap()
        }

        fn messages(&self, tips: &[ObjectId], max: usize) -> Vec<String> {
            walk_at(&self.store, tips, max, self.epoch + Duration::days(1))
                .unwrap()
                .iter()
                .map(|c| c.message.clone())
                .collect()
        }
    }

    #[test]
    fn linear_history_newest_first() {
        let h = History::new();
        let c1 = h.commit("one", 1, &[]);
        let c2 = h.commit("two", 2, &[c1]);
        let c3 = h.commit("three", 3, &[c2]);
        assert_eq!(h.messages(&[c3], 200), vec!["three", "two", "one"]);

        let list = walk_at(&h.store, &[c3], 200, h.epoch + Duration::days(1)).unwrap();
        let first = &list.as_slice()[0];
        assert_eq!(first.parent_ids, vec![c2]);
        assert_eq!(first.commit_date_relative, "24 hours ago");
        assert_eq!(list.get(&c1).unwrap().child_ids, vec![c2]);
    }

    #[test]
    fn bounded_by_max_commits() {
        let h = History::new();
        let mut tip = h.commit("c0", 0, &[]);
        for i in 1..10 {
            tip = h.commit(&format!("c{i}"), i, &[tip]);
        }
        assert_eq!(h.messages(&[tip], 3), vec!["c9", "c8", "c7"]);
        assert!(h.messages(&[tip], 0).is_empty());
    }

    #[test]
    fn parents_follow_all_children_even_with_skewed_clocks() {
        let h = History::new();
        let base = h.commit("base", 10, &[]);
        // A child stamped earlier than its parent still comes first.
        let old_child = h.commit("old child", 5, &[base]);
        let other = h.commit("other", 20, &[base]);
        let merge = h.commit("merge", 30, &[other, old_child]);
        assert_eq!(
            h.messages(&[merge], 200),
            vec!["merge", "other", "old child", "base"]
        );
    }

    #[test]
    fn multiple_tips_interleave_by_time() {
        let h = History::new();
        let root = h.commit("root", 0, &[]);
        let a1 = h.commit("a1", 1, &[root]);
        let b1 = h.commit("b1", 2, &[root]);
        let a2 = h.commit("a2", 3, &[a1]);
        assert_eq!(h.messages(&[a2, b1, a2], 200), vec!["a2", "b1", "a1", "root"]);
    }

    #[test]
    fn missing_commits_are_skipped() {
        let h = History::new();
        let ghost = ObjectId::from_bytes(b"never written");
        let c1 = h.commit("one", 1, &[ghost]);
        assert_eq!(h.messages(&[c1, ghost], 200), vec!["one"]);
    }
}

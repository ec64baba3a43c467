//! Collapsing linear chains.
//!
//! A commit is elided when it has exactly one parent, exactly one child and
//! no ref pointing at it. Elision splices it out: the parent's pointer to the
//! commit is overwritten with the commit's child and the child's pointer to
//! the commit is overwritten with the commit's parent. Pointers are replaced
//! in place, so a branch that folds back onto its fork point leaves the merge
//! listing that commit twice.
//!
//! One pass walks the list in order, reading each commit's links as earlier
//! splices left them, so a run of elidable commits collapses completely. A
//! splice never changes how many parents or children a commit has, so a
//! second pass finds nothing to elide.

use std::collections::HashSet;

use tracing::debug;
use trellis_types::ObjectId;

use crate::model::{Commit, CommitList, GraphRef};

/// Return a simplified copy of `commits`, keeping list order.
pub fn simplify(commits: &CommitList, refs: &[GraphRef]) -> CommitList {
    let referenced: HashSet<ObjectId> = refs.iter().map(|r| r.id).collect();
    let mut list: Vec<Commit> = commits.as_slice().to_vec();
    let mut deleted = vec![false; list.len()];

    for i in 0..list.len() {
        let commit = &list[i];
        if commit.parent_ids.len() != 1
            || commit.child_ids.len() != 1
            || referenced.contains(&commit.id)
        {
            continue;
        }
        let id = commit.id;
        let parent_id = commit.parent_ids[0];
        let child_id = commit.child_ids[0];
        let (Some(parent), Some(child)) = (commits.position(&parent_id), commits.position(&child_id))
        else {
            continue;
        };

        replace(&mut list[parent].child_ids, id, child_id);
        replace(&mut list[child].parent_ids, id, parent_id);

        let commit = &mut list[i];
        commit.parent_ids.clear();
        commit.child_ids.clear();
        deleted[i] = true;
    }

    let elided = deleted.iter().filter(|d| **d).count();
    debug!(elided, remaining = list.len() - elided, "simplified history");
    let kept = list
        .into_iter()
        .zip(deleted)
        .filter_map(|(commit, deleted)| (!deleted).then_some(commit))
        .collect();
    CommitList::from_linked(kept)
}

fn replace(ids: &mut [ObjectId], old: ObjectId, new: ObjectId) {
    if let Some(pos) = ids.iter().position(|id| *id == old) {
        ids[pos] = new;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{id, list};

    fn shape(commits: &CommitList) -> Vec<(String, Vec<String>)> {
        commits
            .iter()
            .map(|c| {
                let parents = c
                    .parent_ids
                    .iter()
                    .map(|p| commits.get(p).map_or("?".to_string(), |p| p.message.clone()))
                    .collect();
                (c.message.clone(), parents)
            })
            .collect()
    }

    fn s(items: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        items
            .iter()
            .map(|(c, ps)| (c.to_string(), ps.iter().map(|p| p.to_string()).collect()))
            .collect()
    }

    #[test]
    fn middle_of_chain_is_elided() {
        let commits = list(&[(3, &[2]), (2, &[1]), (1, &[])]);
        let simplified = simplify(&commits, &[]);
        assert_eq!(shape(&simplified), s(&[("C3", &["C1"]), ("C1", &[])]));
        assert_eq!(simplified.get(&id(1)).unwrap().child_ids, vec![id(3)]);
    }

    #[test]
    fn long_chain_collapses_in_one_pass() {
        let commits = list(&[(5, &[4]), (4, &[3]), (3, &[2]), (2, &[1]), (1, &[])]);
        let simplified = simplify(&commits, &[]);
        assert_eq!(shape(&simplified), s(&[("C5", &["C1"]), ("C1", &[])]));
    }

    #[test]
    fn referenced_commits_are_kept() {
        let commits = list(&[(3, &[2]), (2, &[1]), (1, &[])]);
        let refs = [GraphRef::new("refs/tags/v1", id(2))];
        assert_eq!(simplify(&commits, &refs), commits);
    }

    #[test]
    fn fork_points_and_merges_are_kept() {
        // 5 merges 3 and 4, both branching from 2.
        let commits = list(&[(5, &[3, 4]), (4, &[2]), (3, &[2]), (2, &[1]), (1, &[])]);
        let refs = [
            GraphRef::new("refs/heads/a", id(3)),
            GraphRef::new("refs/heads/b", id(4)),
        ];
        let simplified = simplify(&commits, &refs);
        assert_eq!(
            shape(&simplified),
            s(&[
                ("C5", &["C3", "C4"]),
                ("C4", &["C2"]),
                ("C3", &["C2"]),
                ("C2", &["C1"]),
                ("C1", &[]),
            ])
        );
    }

    #[test]
    fn unreferenced_side_branches_fold_into_the_merge() {
        let commits = list(&[(5, &[3, 4]), (4, &[2]), (3, &[2]), (2, &[1]), (1, &[])]);
        let simplified = simplify(&commits, &[]);
        // Both branches collapse onto the fork point, which keeps two child
        // pointers and so stays.
        assert_eq!(
            shape(&simplified),
            s(&[("C5", &["C2", "C2"]), ("C2", &["C1"]), ("C1", &[])])
        );
        assert_eq!(simplified.get(&id(2)).unwrap().child_ids, vec![id(5), id(5)]);
        assert_eq!(simplify(&simplified, &[]), simplified);
    }

    #[test]
    fn commit_whose_parent_is_outside_the_list_is_kept() {
        let commits = list(&[(3, &[2]), (2, &[1])]);
        assert_eq!(simplify(&commits, &[]), commits);
    }

    #[test]
    fn closing_diamond_keeps_both_edges() {
        // 4 merges 2 and 3, where 3 sits on top of 2.
        let commits = list(&[(4, &[2, 3]), (3, &[2]), (2, &[1]), (1, &[])]);
        let refs = [GraphRef::new("HEAD", id(4)), GraphRef::new("refs/tags/root", id(1))];
        let simplified = simplify(&commits, &refs);
        assert_eq!(
            shape(&simplified),
            s(&[("C4", &["C2", "C2"]), ("C2", &["C1"]), ("C1", &[])])
        );
        assert_eq!(simplify(&simplified, &refs), simplified);
    }
}

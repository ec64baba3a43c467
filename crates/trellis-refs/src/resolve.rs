//! Revision resolution: turning a user-supplied string into a commit id.
//!
//! Accepted forms, tried in order:
//!
//! 1. `HEAD`
//! 2. a canonical ref name (`refs/heads/main`)
//! 3. a short ref name, looked up under `refs/heads/`, `refs/tags/` and
//!    `refs/remotes/` in that order
//! 4. a full 64-character hex id of an existing commit
//! 5. a unique hex prefix (at least four characters) of a stored commit

use trellis_store::ObjectStore;
use trellis_types::ObjectId;

use crate::error::{RefError, Result};
use crate::traits::RefStore;

const MIN_PREFIX_LEN: usize = 4;

/// Resolve `spec` to a commit id.
///
/// Returns `Ok(None)` when nothing matches and
/// [`RefError::Ambiguous`] when a hex prefix matches several commits.
pub fn resolve(
    refs: &dyn RefStore,
    store: &dyn ObjectStore,
    spec: &str,
) -> Result<Option<ObjectId>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(None);
    }
    if spec == "HEAD" {
        return refs.resolve_head();
    }
    if spec.starts_with("refs/") {
        return Ok(refs.read_ref(spec)?.map(|r| r.target()));
    }
    for namespace in ["refs/heads/", "refs/tags/", "refs/remotes/"] {
        if let Some(r) = refs.read_ref(&format!("{namespace}{spec}"))? {
            return Ok(Some(r.target()));
        }
    }

    if spec.len() < MIN_PREFIX_LEN || !spec.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(None);
    }
    if spec.len() == ObjectId::HEX_LEN {
        let Ok(id) = ObjectId::from_hex(spec) else {
            return Ok(None);
        };
        return Ok(store.read_commit(&id)?.map(|_| id));
    }

    let mut commits = Vec::new();
    for id in store.find_by_prefix(spec)? {
        if let Ok(Some(_)) = store.read_commit(&id) {
            commits.push(id);
        }
    }
    match commits.len() {
        0 => Ok(None),
        1 => Ok(commits.pop()),
        count => Err(RefError::Ambiguous {
            spec: spec.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRefStore;
    use crate::types::Ref;
    use trellis_store::{CommitObject, InMemoryObjectStore, Tree};
    use trellis_types::Signature;

    fn commit(store: &InMemoryObjectStore, message: &str) -> ObjectId {
        let tree = store.write_tree(&Tree::empty()).unwrap();
        let sig = Signature::now("Ada", "ada@example.com");
        store
            .write_commit(&CommitObject {
                tree,
                parents: vec![],
                author: sig.clone(),
                committer: sig,
                message: message.into(),
            })
            .unwrap()
    }

    #[test]
    fn resolves_head_and_ref_names() {
        let store = InMemoryObjectStore::new();
        let refs = InMemoryRefStore::new();
        let c1 = commit(&store, "one");
        let c2 = commit(&store, "two");
        refs.write_ref("refs/heads/main", &Ref::branch("main", c1)).unwrap();
        refs.write_ref("refs/tags/v1", &Ref::tag("v1", c2, "")).unwrap();
        refs.set_head("main").unwrap();

        assert_eq!(resolve(&refs, &store, "HEAD").unwrap(), Some(c1));
        assert_eq!(resolve(&refs, &store, "main").unwrap(), Some(c1));
        assert_eq!(resolve(&refs, &store, "refs/heads/main").unwrap(), Some(c1));
        assert_eq!(resolve(&refs, &store, "v1").unwrap(), Some(c2));
        assert_eq!(resolve(&refs, &store, "nope").unwrap(), None);
        assert_eq!(resolve(&refs, &store, "").unwrap(), None);
    }

    #[test]
    fn resolves_hex_ids_and_prefixes() {
        let store = InMemoryObjectStore::new();
        let refs = InMemoryRefStore::new();
        let c1 = commit(&store, "one");
        let blob = store.write_blob(b"not a commit").unwrap();

        assert_eq!(resolve(&refs, &store, &c1.to_hex()).unwrap(), Some(c1));
        assert_eq!(resolve(&refs, &store, &c1.to_hex()[..12]).unwrap(), Some(c1));
        // Blobs never resolve as revisions.
        assert_eq!(resolve(&refs, &store, &blob.to_hex()).unwrap(), None);
        // Too short to be a prefix.
        assert_eq!(resolve(&refs, &store, &c1.to_hex()[..3]).unwrap(), None);
    }
}

//! In-memory reference store for tests and ephemeral sessions.

use std::collections::BTreeMap;
use std::sync::RwLock;

use trellis_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::{validate_branch_name, validate_remote_name, validate_tag_name};
use crate::traits::RefStore;
use crate::types::{Head, Ref};

/// Refs and HEAD as they are kept in memory and on disk.
///
/// Shared by [`InMemoryRefStore`] and [`crate::FileRefStore`], which differ
/// only in where the table lives.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub(crate) struct RefTable {
    pub head: Option<Head>,
    pub refs: BTreeMap<String, Ref>,
}

impl RefTable {
    pub fn write_ref(&mut self, name: &str, reference: &Ref) -> Result<()> {
        validate_ref(reference)?;
        if reference.is_tag() && self.refs.get(name).is_some_and(Ref::is_tag) {
            return Err(RefError::TagImmutable {
                name: name.to_string(),
            });
        }
        self.refs.insert(name.to_string(), reference.clone());
        Ok(())
    }

    pub fn delete_ref(&mut self, name: &str) -> Result<bool> {
        if let Some(Head::Symbolic(current)) = &self.head {
            if name == format!("refs/heads/{current}") {
                return Err(RefError::DeleteCurrentBranch {
                    name: current.clone(),
                });
            }
        }
        Ok(self.refs.remove(name).is_some())
    }

    pub fn list_refs(&self, prefix: &str) -> Vec<(String, Ref)> {
        self.refs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn set_head(&mut self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        self.head = Some(Head::Symbolic(branch.to_string()));
        Ok(())
    }
}

fn validate_ref(reference: &Ref) -> Result<()> {
    match reference {
        Ref::Branch { name, .. } => validate_branch_name(name),
        Ref::Tag { name, .. } => validate_tag_name(name),
        Ref::Remote { remote, branch, .. } => {
            validate_remote_name(remote)?;
            validate_branch_name(branch)
        }
    }
}

/// An in-memory implementation of [`RefStore`]. Data is lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    table: RwLock<RefTable>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        Ok(self.table.read().expect("lock poisoned").refs.get(name).cloned())
    }

    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()> {
        self.table.write().expect("lock poisoned").write_ref(name, reference)
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        self.table.write().expect("lock poisoned").delete_ref(name)
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        Ok(self.table.read().expect("lock poisoned").list_refs(prefix))
    }

    fn head(&self) -> Result<Option<Head>> {
        Ok(self.table.read().expect("lock poisoned").head.clone())
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        self.table.write().expect("lock poisoned").set_head(branch)
    }

    fn set_head_detached(&self, target: ObjectId) -> Result<()> {
        self.table.write().expect("lock poisoned").head = Some(Head::Detached(target));
        Ok(())
    }
}

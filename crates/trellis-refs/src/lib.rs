//! Reference management for Trellis.
//!
//! Named references (branches, tags, remote tracking refs and HEAD) pointing
//! at commit ids, analogous to git refs.
//!
//! - **Branches** are mutable pointers to commit chain tips.
//! - **Tags** are immutable once written; delete and recreate to move one.
//! - **Remote refs** mirror branches on another repository.
//! - **HEAD** names the current branch, or is detached at a commit.
//!
//! # Modules
//!
//! - [`types`]: [`Ref`] and [`Head`]
//! - [`traits`]: the [`RefStore`] storage interface
//! - [`names`]: ref name validation
//! - [`memory`]: [`InMemoryRefStore`]
//! - [`file`]: [`FileRefStore`], a single JSON document on disk
//! - [`resolve`]: turning a user-supplied revision string into a commit id

pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod resolve;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use file::FileRefStore;
pub use memory::InMemoryRefStore;
pub use names::{validate_branch_name, validate_remote_name, validate_tag_name};
pub use resolve::resolve;
pub use traits::RefStore;
pub use types::{Head, Ref};

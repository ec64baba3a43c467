//! Staging index for Trellis.
//!
//! The index sits between the working directory and the next commit: it
//! records, per path, the blob that will be committed plus the size and
//! modification time observed when the file was staged, so later change
//! detection can usually skip hashing.
//!
//! # Key Types
//!
//! - [`Index`] -- the staging area (BTreeMap-backed), optionally persisted
//! - [`IndexEntry`] -- one tracked path
//! - [`FileMeta`] -- what the working directory reports about a file

pub mod entry;
pub mod error;
pub mod index;

pub use entry::{FileMeta, IndexEntry};
pub use error::{IndexError, IndexResult};
pub use index::Index;

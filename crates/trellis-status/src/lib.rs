//! File status for Trellis.
//!
//! Every path is classified by reconciling three snapshots: the tree of the
//! last commit, the staging index and the working directory.
//!
//! # Modules
//!
//! - [`status`] -- [`FileStatus`] and the [`ChangedFile`] projection
//! - [`classifier`] -- the ordered rule table deciding a path's status
//! - [`workdir`] -- [`Workdir`] access to the live filesystem
//! - [`ignore`] -- [`IgnoreMatcher`] implementations
//! - [`cache`] -- [`StatusCache`], memoized per-path statuses

pub mod cache;
pub mod classifier;
pub mod error;
pub mod ignore;
pub mod status;
pub mod workdir;

pub use cache::{Snapshot, StatusCache};
pub use classifier::{classify, matched_rule, LiveProbe, Rule, StatusProbe, RULES};
pub use error::{StatusError, StatusResult};
pub use self::ignore::{GitignoreMatcher, IgnoreMatcher, NoIgnore};
pub use status::{ChangedFile, FileStatus};
pub use workdir::{FsWorkdir, MemoryWorkdir, Workdir};

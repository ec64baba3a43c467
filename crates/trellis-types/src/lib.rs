//! Foundation types for Trellis.
//!
//! Every other Trellis crate depends on `trellis-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash)
//! - [`Signature`]: Author/committer identity with a timestamp
//! - [`relative_date`]: Human-relative rendering of a timestamp ("3 hours ago")

pub mod error;
pub mod identity;
pub mod object;
pub mod temporal;

pub use error::TypeError;
pub use identity::Signature;
pub use object::ObjectId;
pub use temporal::relative_date;

//! Core data model for the beads filesystem issue tracker.
//!
//! This crate has no knowledge of disk layout or locking; it defines the
//! shapes (`Issue`, `Comment`, dependency edges, enums) that `beads-storage`
//! persists and that `beads-graph`/`beads-workflow` operate over.

pub mod comment;
pub mod dependency;
pub mod enums;
pub mod filter;
pub mod identity;
pub mod idformat;
pub mod issue;
pub mod validation;

pub use comment::Comment;
pub use dependency::DependencyEdge;
pub use enums::{DependencyType, IssueType, Priority, Status};
pub use filter::IssueFilter;
pub use issue::Issue;

//! Filesystem-backed storage for the beads issue tracker (§4.1).
//!
//! [`FsStore`] persists one JSON file per issue under `open/` or `closed/`,
//! using [`beads_lockfile`] for per-issue advisory locking and a
//! write-temp-rename pattern for crash-safe writes. `beads-graph` and
//! `beads-workflow` depend on the [`IssueStore`] trait rather than this
//! concrete type.

pub mod atomic;
pub mod doctor;
pub mod error;
pub mod paths;
pub mod store;

pub use doctor::Problem;
pub use error::StoreError;
pub use store::{FsStore, IssueStore};

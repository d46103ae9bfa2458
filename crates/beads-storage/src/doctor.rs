//! `Problem` -- what `Doctor` finds and, optionally, repairs (§4.1.9).

use std::path::PathBuf;

/// A single inconsistency `Doctor` found. `fixed` reflects whether a repair
/// was actually applied (always `false` when `Doctor` was run with
/// `fix=false`, and `false` for kinds that are report-only regardless, like
/// malformed JSON).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    OrphanedTempFile { path: PathBuf, fixed: bool },
    OrphanedLockFile { path: PathBuf, fixed: bool },
    MalformedJson { path: PathBuf },
    DuplicateId { id: String, kept: PathBuf, removed: Option<PathBuf>, fixed: bool },
    LocationMismatch { id: String, from: PathBuf, to: PathBuf, fixed: bool },
    BrokenReference { id: String, missing_id: String, fixed: bool },
    AsymmetricDependency { id: String, other_id: String, fixed: bool },
    BrokenParent { id: String, missing_parent: String, fixed: bool },
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Problem::OrphanedTempFile { path, fixed } => {
                write!(f, "orphaned temp file {} (fixed: {fixed})", path.display())
            }
            Problem::OrphanedLockFile { path, fixed } => {
                write!(f, "orphaned lock file {} (fixed: {fixed})", path.display())
            }
            Problem::MalformedJson { path } => {
                write!(f, "malformed JSON at {}", path.display())
            }
            Problem::DuplicateId { id, kept, removed, fixed } => {
                write!(
                    f,
                    "duplicate id {id}: kept {}, removed {:?} (fixed: {fixed})",
                    kept.display(),
                    removed.as_ref().map(|p| p.display().to_string())
                )
            }
            Problem::LocationMismatch { id, from, to, fixed } => {
                write!(
                    f,
                    "{id} at {} belongs in {} (fixed: {fixed})",
                    from.display(),
                    to.display()
                )
            }
            Problem::BrokenReference { id, missing_id, fixed } => {
                write!(f, "{id} references missing issue {missing_id} (fixed: {fixed})")
            }
            Problem::AsymmetricDependency { id, other_id, fixed } => {
                write!(f, "{id} <-> {other_id} dependency edge is asymmetric (fixed: {fixed})")
            }
            Problem::BrokenParent { id, missing_parent, fixed } => {
                write!(f, "{id} has missing parent {missing_parent} (fixed: {fixed})")
            }
        }
    }
}

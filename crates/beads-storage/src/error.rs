//! Storage error types (§4.1.1, §7).

use std::path::PathBuf;

/// Errors the store can report. Variant names track the `| Error kinds |`
/// column of the contract table, not the underlying cause, so callers can
/// match on the *meaning* of a failure rather than its plumbing.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested issue does not exist.
    #[error("issue not found: {id}")]
    NotFound { id: String },

    /// `Create`/`Update`/`AddDependency` chose or was given an ID that
    /// already exists, and retries were exhausted.
    #[error("id collision generating id for prefix {prefix:?} after {attempts} attempts")]
    IdCollision { prefix: String, attempts: u32 },

    /// An explicit or generated ID would exceed the maximum hierarchy depth.
    #[error("id {id} exceeds max depth {max_depth}")]
    MaxDepthExceeded { id: String, max_depth: usize },

    /// `AddDependency` would introduce a cycle in `blocks` or in the parent
    /// chain.
    #[error("adding dependency {from} -> {to} would create a cycle")]
    Cycle { from: String, to: String },

    /// `Update` attempted a status transition §4.1.5 does not allow (most
    /// commonly, a direct assignment of `tombstone`).
    #[error("cannot transition {id} from {from} to {to} via update")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    /// The issue's own fields failed validation independent of store state.
    #[error("validation failed for {id}: {source}")]
    Validation {
        id: String,
        #[source]
        source: beads_core::validation::ValidationError,
    },

    #[error("lock error on {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: beads_lockfile::LockError,
    },

    #[error("malformed issue record at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn lock(path: impl Into<PathBuf>, source: beads_lockfile::LockError) -> Self {
        Self::Lock {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

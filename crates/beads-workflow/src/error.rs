//! Workflow-engine errors (§7 propagation policy): store/graph/formula
//! errors propagate unchanged; the workflow engine wraps them with the
//! operation that was in flight, without discarding the source.

use beads_formula::types::FormulaError;
use beads_graph::GraphError;
use beads_storage::error::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("formula {formula}: {source}")]
    Formula { formula: String, #[source] source: FormulaError },

    #[error("burn {root}: {source}")]
    Burn { root: String, #[source] source: StoreError },

    #[error("squash {root}: {source}")]
    Squash { root: String, #[source] source: StoreError },

    #[error("unknown step name {name:?} referenced by depends_on")]
    UnknownStep { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

//! The "meow" workflow engine: turns a formula into a molecule of issues
//! and drives it through to completion (§4.3).
//!
//! Built on [`beads_storage::store::IssueStore`] for persistence,
//! [`beads_graph`] for traversal, and [`beads_formula`] for formula
//! resolution -- this crate adds no storage format of its own.

pub mod cook;
pub mod current;
pub mod error;
pub mod pour;
pub mod burn;

pub use cook::{cook, CookResult};
pub use current::{current, find_stale_steps, infer_molecule, progress, CurrentView, ProgressCounts, StepView};
pub use error::{Result, WorkflowError};
pub use pour::{pour, wisp, PourResult};
pub use burn::{burn, gc, squash, SquashResult};

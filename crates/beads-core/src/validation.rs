//! Issue-level validation rules, shared by `beads-storage`'s `Create` and
//! `Update` paths.

use crate::enums::Status;
use crate::issue::Issue;

/// Field-level validation failures. These are distinct from the store's
/// `InvalidTransition`/`Cycle`/... error kinds (§7): a `ValidationError`
/// means the issue's own fields are inconsistent, independent of any
/// concurrent state.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("title is required")]
    TitleRequired,

    #[error("title must be 500 characters or less (got {0})")]
    TitleTooLong(usize),

    #[error("closed or tombstoned issues must have a closed_at timestamp")]
    ClosedWithoutTimestamp,

    #[error("issues that are not closed or tombstoned cannot have a closed_at timestamp")]
    NotClosedWithTimestamp,
}

/// Validates an issue's own fields, independent of store state.
pub fn validate(issue: &Issue) -> Result<(), ValidationError> {
    if issue.title.is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if issue.title.len() > 500 {
        return Err(ValidationError::TitleTooLong(issue.title.len()));
    }
    if issue.status.is_closed_location() && issue.closed_at.is_none() {
        return Err(ValidationError::ClosedWithoutTimestamp);
    }
    if !issue.status.is_closed_location() && issue.closed_at.is_some() {
        return Err(ValidationError::NotClosedWithTimestamp);
    }
    Ok(())
}

//! `IssueFilter` — the constraint set accepted by `IssueStore::list`.

use crate::enums::{IssueType, Priority, Status};

/// Constrains a `List` call. All set fields must match (conjunction); unset
/// fields impose no constraint. The default filter excludes `closed` and
/// `tombstone` issues (§4.1.1): callers that want those must ask for them
/// explicitly via `status`.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub issue_type: Option<IssueType>,
    pub assignee: Option<String>,
    /// `Some(Some(id))` — must be a child of `id`. `Some(None)` — must have
    /// no parent. `None` — no constraint on parent.
    pub parent: Option<Option<String>>,
    /// All of these labels must be present on the issue.
    pub labels: Vec<String>,
}

impl IssueFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(Some(parent.into()));
        self
    }

    pub fn with_no_parent(mut self) -> Self {
        self.parent = Some(None);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chains() {
        let f = IssueFilter::new()
            .with_status(Status::Open)
            .with_label("urgent");
        assert_eq!(f.status, Some(Status::Open));
        assert_eq!(f.labels, vec!["urgent".to_string()]);
        assert_eq!(f.parent, None);
    }

    #[test]
    fn no_parent_is_distinct_from_unset() {
        let f = IssueFilter::new().with_no_parent();
        assert_eq!(f.parent, Some(None));
    }
}

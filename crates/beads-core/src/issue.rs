//! `Issue` -- the central domain model for the beads store.
//!
//! Field order here is the canonical JSON field order (§4.1.2): the store
//! serializes issues with `serde_json`'s struct field order, so reordering
//! these fields changes the on-disk format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::comment::Comment;
use crate::dependency::DependencyEdge;
use crate::enums::{IssueType, Priority, Status};

fn is_false(b: &bool) -> bool {
    !b
}

fn is_empty_vec<T>(v: &[T]) -> bool {
    v.is_empty()
}

/// A trackable work item, the unit the store persists as one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Status::is_default_like")]
    pub status: Status,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, rename = "type", skip_serializing_if = "IssueType::is_default")]
    pub issue_type: IssueType,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assignee: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub dependencies: Vec<DependencyEdge>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub dependents: Vec<DependencyEdge>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub comments: Vec<Comment>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub ephemeral: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub close_reason: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,

    /// Fields not recognized by this struct, preserved verbatim across
    /// read-modify-write so a newer writer's data survives an older
    /// reader's rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Status {
    /// Used only for the `skip_serializing_if` on `Issue::status`: `open` is
    /// the common case and is worth eliding from the JSON, matching the
    /// teacher's `is_default`-style skip helpers on enum fields.
    fn is_default_like(&self) -> bool {
        matches!(self, Status::Open)
    }
}

impl Issue {
    /// Depth of this issue's ID in the hierarchy (0 for a root ID).
    pub fn depth(&self) -> usize {
        crate::idformat::depth(&self.id)
    }
}

/// Fluent constructor for `Issue`, mirroring the teacher's `IssueBuilder`.
/// Timestamps default to "now"; `id` is left empty unless set explicitly
/// (the store fills it in on `Create`).
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            issue: Issue {
                id: String::new(),
                title: title.into(),
                description: String::new(),
                status: Status::Open,
                priority: Priority::Medium,
                issue_type: IssueType::Task,
                labels: Vec::new(),
                assignee: String::new(),
                parent: None,
                dependencies: Vec::new(),
                dependents: Vec::new(),
                comments: Vec::new(),
                ephemeral: false,
                created_at: now,
                updated_at: now,
                closed_at: None,
                close_reason: String::new(),
                created_by: String::new(),
                extra: serde_json::Map::new(),
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.issue.id = id.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.issue.description = description.into();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.issue.status = status;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.issue.priority = priority;
        self
    }

    pub fn issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue.issue_type = issue_type;
        self
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.issue.labels = labels;
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.issue.assignee = assignee.into();
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.issue.parent = Some(parent.into());
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.issue.ephemeral = ephemeral;
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.issue.created_by = created_by.into();
        self
    }

    pub fn closed_at(mut self, closed_at: DateTime<Utc>) -> Self {
        self.issue.closed_at = Some(closed_at);
        self
    }

    pub fn build(self) -> Issue {
        self.issue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_issue() {
        let issue = IssueBuilder::new("Test").build();
        assert_eq!(issue.title, "Test");
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.priority, Priority::Medium);
        assert!(!issue.ephemeral);
        assert!(issue.parent.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let issue = IssueBuilder::new("Test")
            .id("bd-1")
            .priority(Priority::High)
            .parent("bd-0")
            .ephemeral(true)
            .build();
        assert_eq!(issue.id, "bd-1");
        assert_eq!(issue.priority, Priority::High);
        assert_eq!(issue.parent.as_deref(), Some("bd-0"));
        assert!(issue.ephemeral);
    }

    #[test]
    fn serde_roundtrip_preserves_fields() {
        let issue = IssueBuilder::new("Round trip")
            .id("bd-a1b2")
            .description("desc")
            .labels(vec!["x".into(), "y".into()])
            .build();
        let json = serde_json::to_string_pretty(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, issue.id);
        assert_eq!(back.title, issue.title);
        assert_eq!(back.labels, issue.labels);
    }

    #[test]
    fn open_status_and_medium_priority_are_elided_from_json() {
        let issue = IssueBuilder::new("Minimal").id("bd-1").build();
        let json = serde_json::to_value(&issue).unwrap();
        assert!(json.get("status").is_none());
        assert!(json.get("parent").is_none());
        assert!(json.get("dependencies").is_none());
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let mut json = serde_json::to_value(IssueBuilder::new("Test").id("bd-1").build()).unwrap();
        json.as_object_mut()
            .unwrap()
            .insert("future_field".into(), serde_json::json!("from a newer writer"));
        let issue: Issue = serde_json::from_value(json).unwrap();
        assert_eq!(issue.extra.get("future_field").and_then(|v| v.as_str()), Some("from a newer writer"));

        let rewritten = serde_json::to_value(&issue).unwrap();
        assert_eq!(rewritten.get("future_field").and_then(|v| v.as_str()), Some("from a newer writer"));
    }

    #[test]
    fn depth_reflects_hierarchical_suffix() {
        let root = IssueBuilder::new("root").id("bd-a1b2").build();
        let child = IssueBuilder::new("child").id("bd-a1b2.1").build();
        let grandchild = IssueBuilder::new("grandchild").id("bd-a1b2.1.2").build();
        assert_eq!(root.depth(), 0);
        assert_eq!(child.depth(), 1);
        assert_eq!(grandchild.depth(), 2);
    }
}

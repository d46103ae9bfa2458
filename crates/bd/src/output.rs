//! Output formatting helpers for the `bd` CLI.
//!
//! Provides JSON output and human-readable issue display in both compact
//! (one-liner) and detailed (multi-line) formats.

use beads_core::enums::Status;
use beads_core::issue::Issue;
use serde::Serialize;
use serde_json::Value;

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => println!("{{\"error\": {:?}}}", e.to_string()),
    }
}

pub fn print_json_error(message: &str) {
    let value: Value = serde_json::json!({ "error": message });
    println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| message.to_string()));
}

fn status_symbol(status: Status) -> &'static str {
    match status {
        Status::Open => "○",
        Status::InProgress => "◐",
        Status::Hooked => "◔",
        Status::Closed => "●",
        Status::Tombstone => "✗",
    }
}

pub fn format_issue_row(issue: &Issue) -> String {
    let assignee = if issue.assignee.is_empty() { "-".to_string() } else { issue.assignee.clone() };
    format!(
        "{} {:<12} [{:<8}] {:<8} {:<16} {}",
        status_symbol(issue.status),
        issue.id,
        issue.priority,
        issue.issue_type,
        assignee,
        issue.title,
    )
}

pub fn format_issue_compact(issue: &Issue) -> String {
    format!("{} {} {}", status_symbol(issue.status), issue.id, issue.title)
}

pub fn format_issue_detail(issue: &Issue) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", issue.title, issue.id));
    out.push_str(&format!("  status:   {}\n", issue.status));
    out.push_str(&format!("  priority: {}\n", issue.priority));
    out.push_str(&format!("  type:     {}\n", issue.issue_type));
    if !issue.assignee.is_empty() {
        out.push_str(&format!("  assignee: {}\n", issue.assignee));
    }
    if let Some(parent) = &issue.parent {
        out.push_str(&format!("  parent:   {parent}\n"));
    }
    if !issue.labels.is_empty() {
        out.push_str(&format!("  labels:   {}\n", issue.labels.join(", ")));
    }
    if issue.ephemeral {
        out.push_str("  ephemeral: true\n");
    }
    if !issue.description.is_empty() {
        out.push_str(&format!("\n{}\n", issue.description));
    }
    if !issue.dependencies.is_empty() {
        out.push_str("\ndependencies:\n");
        for dep in &issue.dependencies {
            out.push_str(&format!("  {} -> {} ({})\n", issue.id, dep.id, dep.dep_type));
        }
    }
    if !issue.dependents.is_empty() {
        out.push_str("\ndependents:\n");
        for dep in &issue.dependents {
            out.push_str(&format!("  {} <- {} ({})\n", issue.id, dep.id, dep.dep_type));
        }
    }
    if !issue.comments.is_empty() {
        out.push_str("\ncomments:\n");
        for comment in &issue.comments {
            out.push_str(&format!("  [{}] {}: {}\n", comment.created_at, comment.author, comment.text));
        }
    }
    if let Some(closed_at) = issue.closed_at {
        out.push_str(&format!("\nclosed at {closed_at}"));
        if !issue.close_reason.is_empty() {
            out.push_str(&format!(" ({})", issue.close_reason));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::issue::IssueBuilder;

    #[test]
    fn compact_includes_id_and_title() {
        let issue = IssueBuilder::new("Fix the bug").id("bd-1".into()).build();
        let line = format_issue_compact(&issue);
        assert!(line.contains("bd-1"));
        assert!(line.contains("Fix the bug"));
    }

    #[test]
    fn detail_includes_status_and_priority() {
        let issue = IssueBuilder::new("Fix the bug").id("bd-1".into()).build();
        let detail = format_issue_detail(&issue);
        assert!(detail.contains("status:"));
        assert!(detail.contains("priority:"));
    }
}

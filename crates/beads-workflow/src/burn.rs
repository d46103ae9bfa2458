//! `Burn` / `Squash` / `GC` (§4.3.4-4.3.6): cascade-terminate a molecule,
//! collapse its ephemeral steps into a digest, or sweep stale wisps.

use std::collections::HashSet;

use beads_core::enums::{DependencyType, IssueType};
use beads_core::filter::IssueFilter;
use beads_core::identity;
use beads_core::issue::IssueBuilder;
use beads_storage::store::IssueStore;
use chrono::{DateTime, Duration, Utc};

use crate::error::{Result, WorkflowError};

/// Cascade-terminates the molecule rooted at `root`. Descendants are
/// collected, reversed to a leaves-first order, and the root is appended
/// last (§4.3.4). For each issue: external dependency edges are cleaned in
/// both directions first, then ephemeral issues are hard-deleted and
/// persistent ones closed. Idempotent: a second `Burn` on the same root
/// finds already-closed/already-absent issues and leaves them alone.
pub fn burn(store: &dyn IssueStore, root: &str, actor_override: Option<&str>) -> Result<()> {
    let actor = identity::resolve_actor(actor_override);
    let children = beads_graph::collect_molecule_children(store, root)
        .map_err(|source| WorkflowError::Burn { root: root.to_string(), source: store_err_or_panic(source) })?;

    let burn_set: HashSet<String> = children
        .iter()
        .map(|i| i.id.clone())
        .chain(std::iter::once(root.to_string()))
        .collect();

    let mut order: Vec<String> = children.iter().rev().map(|i| i.id.clone()).collect();
    order.push(root.to_string());

    for id in &order {
        let Ok(issue) = store.get(id) else { continue };

        let external_deps: Vec<String> = issue
            .dependencies
            .iter()
            .filter(|d| !burn_set.contains(&d.id))
            .map(|d| d.id.clone())
            .collect();
        for other in &external_deps {
            store.remove_dependency(id, other, &actor).map_err(WorkflowError::from)?;
        }
        let external_dependents: Vec<String> = issue
            .dependents
            .iter()
            .filter(|d| !burn_set.contains(&d.id))
            .map(|d| d.id.clone())
            .collect();
        for other in &external_dependents {
            store.remove_dependency(other, id, &actor).map_err(WorkflowError::from)?;
        }

        if issue.ephemeral {
            store.delete(id, true, &actor).map_err(WorkflowError::from)?;
        } else if !matches!(issue.status, beads_core::enums::Status::Closed | beads_core::enums::Status::Tombstone) {
            store.close(id, "burned", &actor).map_err(WorkflowError::from)?;
        }
    }

    Ok(())
}

fn store_err_or_panic(e: beads_graph::GraphError) -> beads_storage::error::StoreError {
    match e {
        beads_graph::GraphError::Store(s) => s,
        beads_graph::GraphError::Cycle { start } => {
            beads_storage::error::StoreError::NotFound { id: start }
        }
    }
}

/// Result of a `Squash` (§4.3.5): the new digest issue's id, the ephemeral
/// ids that were squashed, and whether they were kept (promoted to
/// persistent) or hard-deleted.
#[derive(Debug, Clone)]
pub struct SquashResult {
    pub digest_id: Option<String>,
    pub squashed: Vec<String>,
    pub keep_children: bool,
}

/// Collapses the ephemeral children of `root` into one new permanent
/// closed digest issue. A no-op (returns `digest_id: None`) if `root` has
/// no ephemeral children.
pub fn squash(
    store: &dyn IssueStore,
    root: &str,
    summary: Option<&str>,
    keep_children: bool,
    actor_override: Option<&str>,
) -> Result<SquashResult> {
    let actor = identity::resolve_actor(actor_override);
    let children = beads_graph::collect_molecule_children(store, root)
        .map_err(|source| WorkflowError::Squash { root: root.to_string(), source: store_err_or_panic(source) })?;

    let ephemeral: Vec<_> = children.into_iter().filter(|i| i.ephemeral).collect();
    if ephemeral.is_empty() {
        return Ok(SquashResult { digest_id: None, squashed: Vec::new(), keep_children });
    }

    let root_issue = store.get(root)?;
    let summary_text = summary.map(str::to_string).unwrap_or_else(|| {
        ephemeral
            .iter()
            .map(|i| format!("- {}", i.title))
            .collect::<Vec<_>>()
            .join("\n")
    });

    let digest_id = store.get_next_child_id(root)?;
    let digest = IssueBuilder::new(format!("Digest: {}", root_issue.title))
        .id(digest_id.clone())
        .description(summary_text)
        .issue_type(IssueType::Task)
        .created_by(actor.clone())
        .build();
    store.create(digest, &actor)?;
    store.add_dependency(&digest_id, root, DependencyType::ParentChild, &actor)?;

    let reason = format!("Squashed from {} wisps", ephemeral.len());
    store.close(&digest_id, &reason, &actor)?;

    let mut squashed = Vec::new();
    for child in &ephemeral {
        squashed.push(child.id.clone());
        if keep_children {
            let mut promoted = store.get(&child.id)?;
            promoted.ephemeral = false;
            store.update(promoted, &actor)?;
        } else {
            store.delete(&child.id, true, &actor)?;
        }
    }

    Ok(SquashResult { digest_id: Some(digest_id), squashed, keep_children })
}

/// Hard-deletes every ephemeral issue in the store created at or before
/// `now - older_than`. Never touches persistent issues. Returns the ids
/// removed.
pub fn gc(store: &dyn IssueStore, older_than: Duration, now: DateTime<Utc>) -> Result<Vec<String>> {
    let cutoff = now - older_than;
    let issues = store.list(&IssueFilter::new())?;
    let mut removed = Vec::new();
    for issue in issues {
        if issue.ephemeral && issue.created_at <= cutoff {
            store.delete(&issue.id, true, "gc")?;
            removed.push(issue.id);
        }
    }
    Ok(removed)
}

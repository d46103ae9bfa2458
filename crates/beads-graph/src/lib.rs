//! Stateless graph traversal over an [`IssueStore`] handle (§4.2).
//!
//! Every function here takes a store reference and does no caching between
//! calls; mutations always go back through the store. Reads only.

use std::collections::{HashMap, HashSet, VecDeque};

use beads_core::enums::{DependencyType, Status};
use beads_core::issue::Issue;
use beads_storage::error::StoreError;
use beads_storage::store::IssueStore;
use tracing::debug;

/// Errors surfaced by graph traversal. `StoreError` is wrapped rather than
/// re-exported: callers of this crate should not need to match on storage
/// internals to notice a broken hierarchy.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("store error during graph traversal: {0}")]
    Store(#[from] StoreError),

    /// A `parent` chain (or, for `TopologicalOrder`, a `blocks` subgraph)
    /// loops back on itself. The store's own cycle detection is supposed
    /// to prevent this from ever being created; seeing it here indicates
    /// corruption that `Doctor` should be run against.
    #[error("cycle detected walking the hierarchy/dependency graph starting at {start}")]
    Cycle { start: String },
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// How a child issue relates to the rest of its molecule at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepClass {
    /// Status is `closed` (or `tombstone`).
    Done,
    /// Status is `in_progress`.
    Current,
    /// Open, and every intra-molecule `blocks` dependency is closed.
    Ready,
    /// Open, but at least one intra-molecule `blocks` dependency is not
    /// closed.
    Blocked,
    /// Open, not ready, not blocked by anything in this molecule (no
    /// intra-molecule blocking deps at all, but also not `Ready`'s
    /// specific empty-deps case -- this is only reached if the caller's
    /// closed set disagrees with deps, which should not happen in
    /// practice; kept so `ClassifySteps` is a total function).
    Pending,
}

/// Walks `issue.parent` upward from `id`, returning the first ancestor with
/// no parent (the molecule root). If `id` itself has no parent, `id` is its
/// own root.
pub fn find_molecule_root(store: &dyn IssueStore, id: &str) -> Result<String> {
    let mut current = id.to_string();
    let mut seen = HashSet::new();
    seen.insert(current.clone());
    loop {
        let issue = store.get(&current)?;
        match issue.parent {
            None => return Ok(current),
            Some(parent) => {
                if !seen.insert(parent.clone()) {
                    return Err(GraphError::Cycle { start: id.to_string() });
                }
                current = parent;
            }
        }
    }
}

/// BFS from `root` along the denormalized parent-child edges (i.e. the
/// reverse of `parent_child` dependencies -- a parent's `dependents` of
/// type `ParentChild`). Returns every descendant, excluding `root` itself,
/// in BFS order. A visited set makes this cycle-safe even over a corrupted
/// hierarchy.
pub fn collect_molecule_children(store: &dyn IssueStore, root: &str) -> Result<Vec<Issue>> {
    let mut out = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(root.to_string());
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(root.to_string());

    while let Some(current) = queue.pop_front() {
        let issue = store.get(&current)?;
        for edge in &issue.dependents {
            if edge.dep_type != DependencyType::ParentChild {
                continue;
            }
            if visited.insert(edge.id.clone()) {
                let child = store.get(&edge.id)?;
                out.push(child);
                queue.push_back(edge.id.clone());
            }
        }
    }
    Ok(out)
}

/// Kahn's algorithm over the `blocks` edges *restricted to `issues`*:
/// dependencies on ids outside the input set do not contribute to
/// in-degree. Ties break by the input's original order. Fails
/// [`GraphError::Cycle`] if fewer than `issues.len()` nodes are emitted
/// (a cycle among `issues`, which should be unreachable given the store's
/// own cycle rejection, but is checked defensively per §4.2).
pub fn topological_order(issues: &[Issue]) -> Result<Vec<Issue>> {
    let waves = topological_waves(issues)?;
    Ok(waves.into_iter().flatten().collect())
}

/// Like [`topological_order`] but grouped into waves: each wave holds every
/// node whose remaining in-degree reached zero in the same Kahn step, so
/// consumers can identify which steps are parallelizable.
pub fn topological_waves(issues: &[Issue]) -> Result<Vec<Vec<Issue>>> {
    let ids: HashSet<&str> = issues.iter().map(|i| i.id.as_str()).collect();
    let order_index: HashMap<&str, usize> =
        issues.iter().enumerate().map(|(i, issue)| (issue.id.as_str(), i)).collect();

    let mut in_degree: HashMap<&str, usize> = issues.iter().map(|i| (i.id.as_str(), 0)).collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

    for issue in issues {
        for dep in &issue.dependencies {
            if dep.dep_type == DependencyType::Blocks && ids.contains(dep.id.as_str()) {
                *in_degree.get_mut(issue.id.as_str()).unwrap() += 1;
                successors.entry(dep.id.as_str()).or_default().push(issue.id.as_str());
            }
        }
    }

    let by_id: HashMap<&str, &Issue> = issues.iter().map(|i| (i.id.as_str(), i)).collect();

    let mut waves: Vec<Vec<Issue>> = Vec::new();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut frontier: Vec<&str> = issues
        .iter()
        .filter(|i| in_degree[i.id.as_str()] == 0)
        .map(|i| i.id.as_str())
        .collect();
    frontier.sort_by_key(|id| order_index[id]);

    while !frontier.is_empty() {
        let mut wave: Vec<&str> = frontier.clone();
        wave.sort_by_key(|id| order_index[id]);
        let mut next_frontier: Vec<&str> = Vec::new();

        for &id in &wave {
            emitted.insert(id);
            if let Some(succs) = successors.get(id) {
                for &succ in succs {
                    let deg = in_degree.get_mut(succ).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        next_frontier.push(succ);
                    }
                }
            }
        }

        waves.push(wave.iter().map(|id| (*by_id[id]).clone()).collect());
        frontier = next_frontier;
    }

    if emitted.len() != issues.len() {
        let start = issues
            .iter()
            .find(|i| !emitted.contains(i.id.as_str()))
            .map(|i| i.id.clone())
            .unwrap_or_default();
        return Err(GraphError::Cycle { start });
    }

    Ok(waves)
}

/// The open children all of whose intra-molecule `blocks` dependencies are
/// in `closed_set`. External dependencies never block readiness.
pub fn find_ready_steps<'a>(children: &'a [Issue], closed_set: &HashSet<String>) -> Vec<&'a Issue> {
    let ids: HashSet<&str> = children.iter().map(|c| c.id.as_str()).collect();
    children
        .iter()
        .filter(|issue| is_open(issue.status))
        .filter(|issue| {
            issue
                .dependencies
                .iter()
                .filter(|d| d.dep_type == DependencyType::Blocks && ids.contains(d.id.as_str()))
                .all(|d| closed_set.contains(&d.id))
        })
        .collect()
}

/// Scans `ordered` past `current_id` and returns the first open, unblocked
/// (per `closed_set`) item after it. `None` if `current_id` is not found or
/// nothing past it qualifies.
pub fn find_next_step<'a>(
    ordered: &'a [Issue],
    current_id: &str,
    closed_set: &HashSet<String>,
) -> Option<&'a Issue> {
    let ids: HashSet<&str> = ordered.iter().map(|i| i.id.as_str()).collect();
    let pos = ordered.iter().position(|i| i.id == current_id)?;
    ordered[pos + 1..].iter().find(|issue| {
        is_open(issue.status)
            && issue
                .dependencies
                .iter()
                .filter(|d| d.dep_type == DependencyType::Blocks && ids.contains(d.id.as_str()))
                .all(|d| closed_set.contains(&d.id))
    })
}

/// Labels each child `Done`/`Current`/`Ready`/`Blocked`/`Pending`.
pub fn classify_steps(children: &[Issue], closed_set: &HashSet<String>) -> Vec<(String, StepClass)> {
    let ids: HashSet<&str> = children.iter().map(|c| c.id.as_str()).collect();
    children
        .iter()
        .map(|issue| {
            let class = if issue.status == Status::Closed || issue.status == Status::Tombstone {
                StepClass::Done
            } else if issue.status == Status::InProgress {
                StepClass::Current
            } else {
                let intra_blocks: Vec<&str> = issue
                    .dependencies
                    .iter()
                    .filter(|d| d.dep_type == DependencyType::Blocks && ids.contains(d.id.as_str()))
                    .map(|d| d.id.as_str())
                    .collect();
                if intra_blocks.is_empty() || intra_blocks.iter().all(|id| closed_set.contains(*id)) {
                    StepClass::Ready
                } else if intra_blocks.iter().all(|id| !closed_set.contains(*id)) {
                    StepClass::Blocked
                } else {
                    // Mixed: some closed, some not -- still blocked.
                    StepClass::Blocked
                }
            };
            (issue.id.clone(), class)
        })
        .collect()
}

/// Every issue in the store whose status is `closed` (tombstones excluded --
/// a tombstone is not a satisfied `blocks` dependency; burning a blocker
/// soft-deletes the *blocked* side's edge instead of counting as closed).
pub fn build_closed_set(store: &dyn IssueStore) -> Result<HashSet<String>> {
    use beads_core::filter::IssueFilter;
    let closed = store.list(&IssueFilter::new().with_status(Status::Closed))?;
    debug!(count = closed.len(), "built closed set");
    Ok(closed.into_iter().map(|i| i.id).collect())
}

fn is_open(status: Status) -> bool {
    matches!(status, Status::Open | Status::InProgress | Status::Hooked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::dependency::DependencyEdge;
    use beads_core::issue::IssueBuilder;
    use beads_storage::store::FsStore;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, FsStore) {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn find_molecule_root_walks_up_to_parentless_ancestor() {
        let (_dir, store) = store();
        store.create(IssueBuilder::new("root").id("bd-1").build(), "a").unwrap();
        store
            .create(IssueBuilder::new("child").id("bd-1.1").parent("bd-1").build(), "a")
            .unwrap();
        store
            .add_dependency("bd-1.1", "bd-1", DependencyType::ParentChild, "a")
            .unwrap();
        assert_eq!(find_molecule_root(&store, "bd-1.1").unwrap(), "bd-1");
        assert_eq!(find_molecule_root(&store, "bd-1").unwrap(), "bd-1");
    }

    #[test]
    fn collect_molecule_children_bfs_excludes_root() {
        let (_dir, store) = store();
        store.create(IssueBuilder::new("root").id("bd-1").build(), "a").unwrap();
        store.create(IssueBuilder::new("c1").id("bd-1.1").build(), "a").unwrap();
        store.create(IssueBuilder::new("c2").id("bd-1.2").build(), "a").unwrap();
        store
            .add_dependency("bd-1.1", "bd-1", DependencyType::ParentChild, "a")
            .unwrap();
        store
            .add_dependency("bd-1.2", "bd-1", DependencyType::ParentChild, "a")
            .unwrap();
        let children = collect_molecule_children(&store, "bd-1").unwrap();
        let mut ids: Vec<&str> = children.iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["bd-1.1", "bd-1.2"]);
    }

    fn issue_with_deps(id: &str, blocks: &[&str]) -> Issue {
        let mut i = IssueBuilder::new(id).id(id).build();
        i.dependencies = blocks.iter().map(|b| DependencyEdge::blocks(*b)).collect();
        i
    }

    #[test]
    fn topological_order_respects_blocks_edges() {
        let a = issue_with_deps("a", &[]);
        let b = issue_with_deps("b", &["a"]);
        let c = issue_with_deps("c", &["b"]);
        let ordered = topological_order(&[c.clone(), a.clone(), b.clone()]).unwrap();
        let pos = |id: &str| ordered.iter().position(|i| i.id == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
        assert_eq!(ordered.len(), 3);
    }

    #[test]
    fn topological_order_ignores_external_deps() {
        let a = issue_with_deps("a", &["outside"]);
        let ordered = topological_order(&[a]).unwrap();
        assert_eq!(ordered.len(), 1);
    }

    #[test]
    fn topological_order_fails_on_cycle() {
        let a = issue_with_deps("a", &["b"]);
        let b = issue_with_deps("b", &["a"]);
        let err = topological_order(&[a, b]).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
    }

    #[test]
    fn topological_waves_groups_parallel_steps() {
        let a = issue_with_deps("a", &[]);
        let b = issue_with_deps("b", &[]);
        let c = issue_with_deps("c", &["a", "b"]);
        let waves = topological_waves(&[a, b, c]).unwrap();
        assert_eq!(waves.len(), 2);
        assert_eq!(waves[0].len(), 2);
        assert_eq!(waves[1].len(), 1);
        assert_eq!(waves[1][0].id, "c");
    }

    #[test]
    fn find_ready_steps_requires_all_intra_deps_closed() {
        let mut build = issue_with_deps("build", &[]);
        build.status = Status::Closed;
        let test = issue_with_deps("test", &["build"]);
        let ship = issue_with_deps("ship", &["test"]);
        let closed: HashSet<String> = ["build".to_string()].into_iter().collect();
        let children = vec![build, test, ship];
        let ready = find_ready_steps(&children, &closed);
        let ids: Vec<&str> = ready.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["test"]);
    }

    #[test]
    fn classify_steps_covers_all_states() {
        let mut done = issue_with_deps("done", &[]);
        done.status = Status::Closed;
        let mut current = issue_with_deps("current", &[]);
        current.status = Status::InProgress;
        let ready = issue_with_deps("ready", &[]);
        let blocked = issue_with_deps("blocked", &["ready"]);
        let closed: HashSet<String> = HashSet::new();
        let children = vec![done, current, ready, blocked];
        let classes = classify_steps(&children, &closed);
        assert_eq!(classes[0], ("done".to_string(), StepClass::Done));
        assert_eq!(classes[1], ("current".to_string(), StepClass::Current));
        assert_eq!(classes[2], ("ready".to_string(), StepClass::Ready));
        assert_eq!(classes[3], ("blocked".to_string(), StepClass::Blocked));
    }

    #[test]
    fn find_next_step_scans_past_current() {
        let a = issue_with_deps("a", &[]);
        let b = issue_with_deps("b", &[]);
        let c = issue_with_deps("c", &[]);
        let ordered = vec![a, b, c];
        let closed = HashSet::new();
        let next = find_next_step(&ordered, "a", &closed).unwrap();
        assert_eq!(next.id, "b");
    }

    #[test]
    fn build_closed_set_lists_closed_ids() {
        let (_dir, store) = store();
        store.create(IssueBuilder::new("a").id("bd-1").build(), "x").unwrap();
        store.create(IssueBuilder::new("b").id("bd-2").build(), "x").unwrap();
        store.close("bd-2", "done", "x").unwrap();
        let set = build_closed_set(&store).unwrap();
        assert_eq!(set, ["bd-2".to_string()].into_iter().collect());
    }
}

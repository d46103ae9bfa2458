//! `Current` / `Progress` / `FindStaleSteps` / `InferMolecule` (§4.3.7): the
//! read-only views over an in-flight molecule.

use beads_core::enums::Status;
use beads_core::filter::IssueFilter;
use beads_core::issue::Issue;
use beads_storage::store::IssueStore;

use crate::error::Result;

/// One step's view as reported by `Current`.
#[derive(Debug, Clone)]
pub struct StepView {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub assignee: Option<String>,
    pub class: beads_graph::StepClass,
}

/// Aggregate counts shared by `Current` and `Progress`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounts {
    pub total: usize,
    pub done: usize,
    pub in_progress: usize,
    pub ready: usize,
    pub blocked: usize,
}

impl ProgressCounts {
    /// `completed / total * 100`, rounded down; `0` when `total` is `0`.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            (self.done * 100 / self.total) as u32
        }
    }
}

/// The full `Current` view: the molecule root, every child's step view
/// (optionally filtered to one actor's assignments), and the aggregate
/// counts over the *unfiltered* molecule.
#[derive(Debug, Clone, Default)]
pub struct CurrentView {
    pub root_id: Option<String>,
    pub steps: Vec<StepView>,
    pub progress: ProgressCounts,
}

/// §4.3.7: if `molecule_id` is `None`, infer one via [`infer_molecule`]. If
/// still none, returns an empty view. Otherwise collects the molecule's
/// children, classifies them, topologically orders them, and -- if `actor`
/// is given -- filters the reported steps down to that actor's assignments
/// (the aggregate `progress` counts always cover the whole molecule).
pub fn current(store: &dyn IssueStore, molecule_id: Option<&str>, actor: Option<&str>) -> Result<CurrentView> {
    let root_id = match molecule_id {
        Some(id) => Some(id.to_string()),
        None => infer_molecule(store, actor.unwrap_or_default())?,
    };
    let Some(root_id) = root_id else {
        return Ok(CurrentView::default());
    };

    let children = beads_graph::collect_molecule_children(store, &root_id)?;
    let closed_set = beads_graph::build_closed_set(store)?;
    let ordered = beads_graph::topological_order(&children)?;
    let classes = beads_graph::classify_steps(&ordered, &closed_set);
    let class_by_id: std::collections::HashMap<&str, beads_graph::StepClass> =
        classes.iter().map(|(id, class)| (id.as_str(), *class)).collect();

    let progress = summarize(&classes);

    let steps = ordered
        .iter()
        .filter(|issue| actor.is_none_or(|a| issue.assignee == a))
        .map(|issue| StepView {
            id: issue.id.clone(),
            title: issue.title.clone(),
            status: issue.status,
            assignee: if issue.assignee.is_empty() { None } else { Some(issue.assignee.clone()) },
            class: class_by_id[issue.id.as_str()],
        })
        .collect();

    Ok(CurrentView { root_id: Some(root_id), steps, progress })
}

/// §4.3.7: same classification as `Current` but returns only the aggregate
/// counts. A no-op molecule (no children) reports all-zero counts.
pub fn progress(store: &dyn IssueStore, molecule_id: &str) -> Result<ProgressCounts> {
    let children = beads_graph::collect_molecule_children(store, molecule_id)?;
    let closed_set = beads_graph::build_closed_set(store)?;
    let classes = beads_graph::classify_steps(&children, &closed_set);
    Ok(summarize(&classes))
}

/// §4.3.7: ready steps (unblocked, open) that are still `open` rather than
/// `in_progress` -- "ready but not started".
pub fn find_stale_steps(store: &dyn IssueStore, molecule_id: &str) -> Result<Vec<Issue>> {
    let children = beads_graph::collect_molecule_children(store, molecule_id)?;
    let closed_set = beads_graph::build_closed_set(store)?;
    let ready = beads_graph::find_ready_steps(&children, &closed_set);
    Ok(ready.into_iter().filter(|issue| issue.status == Status::Open).cloned().collect())
}

/// §4.3.7: first tries any `in_progress` issue assigned to `actor` and
/// walks up to its molecule root. Failing that, tries any `hooked` issue
/// assigned to `actor` and does the same. Returns `None` rather than an
/// error if neither search turns anything up (§9 Open Question: absence of
/// an inferrable molecule is not exceptional).
pub fn infer_molecule(store: &dyn IssueStore, actor: &str) -> Result<Option<String>> {
    if actor.is_empty() {
        return Ok(None);
    }

    for status in [Status::InProgress, Status::Hooked] {
        let mut filter = IssueFilter::new().with_status(status);
        filter.assignee = Some(actor.to_string());
        let candidates = store.list(&filter)?;
        if let Some(issue) = candidates.into_iter().next() {
            return Ok(Some(beads_graph::find_molecule_root(store, &issue.id)?));
        }
    }

    Ok(None)
}

fn summarize(classes: &[(String, beads_graph::StepClass)]) -> ProgressCounts {
    let mut counts = ProgressCounts { total: classes.len(), ..Default::default() };
    for (_, class) in classes {
        match class {
            beads_graph::StepClass::Done => counts.done += 1,
            beads_graph::StepClass::Current => counts.in_progress += 1,
            beads_graph::StepClass::Ready => counts.ready += 1,
            beads_graph::StepClass::Blocked | beads_graph::StepClass::Pending => counts.blocked += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::enums::DependencyType as Dt;
    use beads_core::issue::IssueBuilder;
    use beads_storage::store::FsStore;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, FsStore) {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.init().unwrap();
        (dir, store)
    }

    fn molecule(store: &FsStore) {
        store.create(IssueBuilder::new("root").id("bd-1").build(), "a").unwrap();
        store
            .create(IssueBuilder::new("build").id("bd-1.1").assignee("alice").build(), "a")
            .unwrap();
        store
            .create(IssueBuilder::new("test").id("bd-1.2").assignee("bob").build(), "a")
            .unwrap();
        store.add_dependency("bd-1.1", "bd-1", Dt::ParentChild, "a").unwrap();
        store.add_dependency("bd-1.2", "bd-1", Dt::ParentChild, "a").unwrap();
        store.add_dependency("bd-1.2", "bd-1.1", Dt::Blocks, "a").unwrap();
    }

    #[test]
    fn current_reports_progress_and_filters_by_actor() {
        let (_dir, store) = store();
        molecule(&store);
        store.close("bd-1.1", "done", "a").unwrap();

        let view = current(&store, Some("bd-1"), None).unwrap();
        assert_eq!(view.root_id.as_deref(), Some("bd-1"));
        assert_eq!(view.progress.total, 2);
        assert_eq!(view.progress.done, 1);
        assert_eq!(view.progress.ready, 1);

        let filtered = current(&store, Some("bd-1"), Some("bob")).unwrap();
        assert_eq!(filtered.steps.len(), 1);
        assert_eq!(filtered.steps[0].id, "bd-1.2");
    }

    #[test]
    fn current_with_no_molecule_and_no_hit_is_empty() {
        let (_dir, store) = store();
        let view = current(&store, None, Some("nobody")).unwrap();
        assert!(view.root_id.is_none());
        assert!(view.steps.is_empty());
    }

    #[test]
    fn progress_percent_rounds_down() {
        let (_dir, store) = store();
        molecule(&store);
        store.close("bd-1.1", "done", "a").unwrap();
        let counts = progress(&store, "bd-1").unwrap();
        assert_eq!(counts.percent(), 50);
    }

    #[test]
    fn find_stale_steps_excludes_in_progress() {
        let (_dir, store) = store();
        molecule(&store);
        store.close("bd-1.1", "done", "a").unwrap();
        let mut test_issue = store.get("bd-1.2").unwrap();
        test_issue.status = Status::InProgress;
        store.update(test_issue, "a").unwrap();

        let stale = find_stale_steps(&store, "bd-1").unwrap();
        assert!(stale.is_empty());
    }

    #[test]
    fn infer_molecule_walks_up_from_in_progress_assignment() {
        let (_dir, store) = store();
        molecule(&store);
        let mut build = store.get("bd-1.1").unwrap();
        build.status = Status::InProgress;
        store.update(build, "a").unwrap();

        assert_eq!(infer_molecule(&store, "alice").unwrap(), Some("bd-1".to_string()));
        assert_eq!(infer_molecule(&store, "nobody").unwrap(), None);
    }

    #[test]
    fn pour_then_walk_steps_through_ready_current_done() {
        use std::collections::HashMap;
        use std::io::Write;

        let (_dir, store) = store();
        let formula_dir = tempdir().unwrap();
        let mut f = std::fs::File::create(formula_dir.path().join("deploy.formula.json")).unwrap();
        f.write_all(
            br#"{
                "formula": "deploy",
                "version": 1,
                "steps": [
                    {"id": "build", "title": "Build"},
                    {"id": "test", "title": "Test", "needs": ["build"]},
                    {"id": "ship", "title": "Ship", "needs": ["test"]}
                ]
            }"#,
        )
        .unwrap();

        let result = crate::pour::pour(&store, "deploy", &HashMap::new(), false, Some("alice"), formula_dir.path())
            .unwrap();
        let build_id = result.ids["deploy.build"].clone();
        let test_id = result.ids["deploy.test"].clone();
        let ship_id = result.ids["deploy.ship"].clone();

        let view = current(&store, Some(&result.root_id), None).unwrap();
        let class_of = |view: &CurrentView, id: &str| {
            view.steps.iter().find(|s| s.id == id).unwrap().class
        };
        assert_eq!(class_of(&view, &build_id), beads_graph::StepClass::Ready);
        assert_eq!(class_of(&view, &test_id), beads_graph::StepClass::Blocked);
        assert_eq!(class_of(&view, &ship_id), beads_graph::StepClass::Blocked);

        let mut build = store.get(&build_id).unwrap();
        build.status = Status::InProgress;
        store.update(build, "alice").unwrap();
        let view = current(&store, Some(&result.root_id), None).unwrap();
        assert_eq!(class_of(&view, &build_id), beads_graph::StepClass::Current);

        store.close(&build_id, "done", "alice").unwrap();
        let view = current(&store, Some(&result.root_id), None).unwrap();
        assert_eq!(class_of(&view, &build_id), beads_graph::StepClass::Done);
        assert_eq!(class_of(&view, &test_id), beads_graph::StepClass::Ready);

        store.close(&test_id, "done", "alice").unwrap();
        let view = current(&store, Some(&result.root_id), None).unwrap();
        assert_eq!(class_of(&view, &ship_id), beads_graph::StepClass::Ready);

        store.close(&ship_id, "done", "alice").unwrap();
        let counts = progress(&store, &result.root_id).unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.done, 3);
        assert_eq!(counts.percent(), 100);
    }
}

//! `Pour` / `Wisp` (§4.3.3): materialize a formula into a molecule.

use std::collections::HashMap;
use std::path::Path;

use beads_core::enums::{DependencyType, IssueType, Priority};
use beads_core::identity;
use beads_core::issue::IssueBuilder;
use beads_formula::types::CookedStep;
use beads_storage::store::IssueStore;
use tracing::warn;

use crate::cook::load_and_resolve;
use crate::error::{Result, WorkflowError};

/// Result of a successful `Pour`/`Wisp`: the new root's ID, an id map
/// keyed `"<formula>"` (root) and `"<formula>.<step>"` (each child), the
/// number of issues created, and the resolved phase.
#[derive(Debug, Clone)]
pub struct PourResult {
    pub root_id: String,
    pub ids: HashMap<String, String>,
    pub created_count: usize,
    pub phase: &'static str,
}

/// Materializes `formula_name` as a new molecule. `ephemeral` marks the
/// root and every step issue as a wisp (`Wisp` is `Pour` with
/// `ephemeral = true`). `actor_override` is the highest-priority identity
/// source (e.g. a config value); pass `None` to fall through to the
/// environment/git/OS chain (§4.4).
pub fn pour(
    store: &dyn IssueStore,
    formula_name: &str,
    provided: &HashMap<String, String>,
    ephemeral: bool,
    actor_override: Option<&str>,
    cwd: &Path,
) -> Result<PourResult> {
    let formula = load_and_resolve(formula_name, cwd)?;

    beads_formula::resolve::validate_vars(&formula, provided).map_err(|source| WorkflowError::Formula {
        formula: formula_name.to_string(),
        source,
    })?;

    if formula.phase.as_deref() == Some("vapor") && !ephemeral {
        warn!(formula = formula_name, "vapor formula poured as persistent; consider using wisp");
    }

    // Reject step names that reference a step id that does not exist in
    // this formula at all. Checked against the full (pre-condition-filter)
    // step list, since `engine::cook` silently drops a `needs` entry that
    // points at a step condition-filtered *out* -- that's a legitimate
    // formula-authoring pattern, distinct from a typo'd step id.
    let known_step_ids: std::collections::HashSet<&str> =
        formula.steps.iter().map(|s| s.id.as_str()).collect();
    for step in &formula.steps {
        for needed in &step.needs {
            if !known_step_ids.contains(needed.as_str()) {
                return Err(WorkflowError::UnknownStep { name: needed.clone() });
            }
        }
    }

    let vars = beads_formula::resolve::resolve_vars(&formula, provided);
    let cooked = beads_formula::engine::cook(&formula, provided).map_err(|source| WorkflowError::Formula {
        formula: formula_name.to_string(),
        source,
    })?;

    let actor = identity::resolve_actor(actor_override);

    let root_description = beads_formula::engine::substitute_vars(&formula.description, &vars);
    let root = IssueBuilder::new(formula.formula.clone())
        .description(root_description)
        .issue_type(IssueType::Epic)
        .ephemeral(ephemeral)
        .created_by(actor.clone())
        .build();
    let root_id = store.create(root, &actor)?;

    let mut ids = HashMap::new();
    ids.insert(formula.formula.clone(), root_id.clone());

    // Pass 1: create every step issue and link it to the root, recording
    // its issue id under its formula-local step name. Dependency edges
    // between steps are added only in pass 2 (§9: "Pour's two-pass
    // structure ... is mandatory").
    let mut step_ids: HashMap<String, String> = HashMap::new();
    for step in &cooked {
        let child_id = store.get_next_child_id(&root_id)?;
        let issue = build_step_issue(step, &child_id, ephemeral, &actor);
        store.create(issue, &actor)?;
        store.add_dependency(&child_id, &root_id, DependencyType::ParentChild, &actor)?;
        step_ids.insert(step.id.clone(), child_id.clone());
        ids.insert(format!("{}.{}", formula.formula, step.id), child_id);
    }

    // Pass 2: resolve each step's `needs` (already merged from `depends_on`)
    // to issue ids and add the `blocks` edge.
    for step in &cooked {
        let from = &step_ids[&step.id];
        for needed in &step.needs {
            let to = step_ids.get(needed).ok_or_else(|| WorkflowError::UnknownStep {
                name: needed.clone(),
            })?;
            store.add_dependency(from, to, DependencyType::Blocks, &actor)?;
        }
    }

    let created_count = 1 + cooked.len();
    let phase = if ephemeral { "vapor" } else { "liquid" };

    Ok(PourResult { root_id, ids, created_count, phase })
}

/// `Wisp` is `Pour` with `ephemeral = true`.
pub fn wisp(
    store: &dyn IssueStore,
    formula_name: &str,
    provided: &HashMap<String, String>,
    actor_override: Option<&str>,
    cwd: &Path,
) -> Result<PourResult> {
    pour(store, formula_name, provided, true, actor_override, cwd)
}

fn build_step_issue(
    step: &CookedStep,
    id: &str,
    ephemeral: bool,
    actor: &str,
) -> beads_core::issue::Issue {
    let mut builder = IssueBuilder::new(step.title.clone())
        .id(id)
        .description(step.description.clone())
        .issue_type(IssueType::from(step.issue_type.as_str()))
        .priority(priority_from_i32(step.priority))
        .labels(step.labels.clone())
        .ephemeral(ephemeral)
        .created_by(actor);
    if let Some(assignee) = &step.assignee {
        builder = builder.assignee(assignee.clone());
    }
    builder.build()
}

fn priority_from_i32(p: i32) -> Priority {
    match p {
        0 => Priority::Critical,
        1 => Priority::High,
        2 => Priority::Medium,
        3 => Priority::Low,
        _ => Priority::Backlog,
    }
}

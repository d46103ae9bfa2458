//! `Cook` -- the formula dry-run preview (§4.3.2). Resolves, validates, and
//! substitutes exactly as `Pour` does, but touches no storage.

use std::collections::HashMap;
use std::path::Path;

use beads_formula::engine;
use beads_formula::parser;
use beads_formula::resolve;
use beads_formula::types::{CookedStep, Formula};

use crate::error::{Result, WorkflowError};

/// A fully resolved, never-persisted preview of what `Pour`/`Wisp` would
/// create.
#[derive(Debug, Clone)]
pub struct CookResult {
    pub formula_name: String,
    pub root_title: String,
    pub root_description: String,
    /// `"liquid"` (persistent) or `"vapor"` (ephemeral-by-default).
    pub phase: String,
    pub steps: Vec<CookedStep>,
}

/// Loads `formula_name` (searching from `cwd`), resolves its `extends`
/// chain, validates `provided` against the merged variable set, evaluates
/// step conditions, and substitutes `{{var}}` placeholders.
pub fn cook(formula_name: &str, provided: &HashMap<String, String>, cwd: &Path) -> Result<CookResult> {
    let formula = load_and_resolve(formula_name, cwd)?;

    resolve::validate_vars(&formula, provided).map_err(|source| WorkflowError::Formula {
        formula: formula_name.to_string(),
        source,
    })?;

    let vars = resolve::resolve_vars(&formula, provided);
    let steps = engine::cook(&formula, provided).map_err(|source| WorkflowError::Formula {
        formula: formula_name.to_string(),
        source,
    })?;

    Ok(CookResult {
        formula_name: formula.formula.clone(),
        root_title: formula.formula.clone(),
        root_description: engine::substitute_vars(&formula.description, &vars),
        phase: formula.phase.clone().unwrap_or_else(|| "liquid".to_string()),
        steps,
    })
}

/// Loads a formula by name and resolves its `extends` chain (§4.3.1 steps
/// 1-5). Shared by `Cook` and `Pour`.
pub(crate) fn load_and_resolve(formula_name: &str, cwd: &Path) -> Result<Formula> {
    let path = parser::find_formula(formula_name, cwd).map_err(|source| WorkflowError::Formula {
        formula: formula_name.to_string(),
        source,
    })?;
    let formula = parser::load_formula(&path).map_err(|source| WorkflowError::Formula {
        formula: formula_name.to_string(),
        source,
    })?;
    resolve::resolve_formula(formula, cwd).map_err(|source| WorkflowError::Formula {
        formula: formula_name.to_string(),
        source,
    })
}

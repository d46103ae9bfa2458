//! `ResolveFormula` / `ValidateVars` / `SubstituteVars` (§4.3.1).
//!
//! `engine::cook` (the teacher's original formula compiler) stays focused
//! on condition evaluation and variable substitution for a single,
//! already-resolved formula. This module adds the piece the teacher never
//! had: merging an `extends` chain, and the full `enum`/`pattern` variable
//! validation the workflow engine's `Pour`/`Wisp`/`Cook` need.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::engine::substitute_vars;
use crate::parser;
use crate::types::{Formula, FormulaError, Step, VarDef, VarViolation};

/// Recursively loads and merges a formula's `extends` chain (§4.3.1 steps
/// 1-4), then normalizes `needs`/`depends_on` (step 5). `cwd` is the
/// search root `parser::find_formula` uses for parent-formula lookups.
pub fn resolve_formula(formula: Formula, cwd: &std::path::Path) -> Result<Formula, FormulaError> {
    let mut visited = HashSet::new();
    visited.insert(formula.formula.clone());
    let resolved = resolve_inner(formula, cwd, &mut visited)?;
    Ok(normalize_steps(resolved))
}

fn resolve_inner(
    mut formula: Formula,
    cwd: &std::path::Path,
    visited: &mut HashSet<String>,
) -> Result<Formula, FormulaError> {
    let parent_names = std::mem::take(&mut formula.extends);

    for parent_name in parent_names {
        if !visited.insert(parent_name.clone()) {
            return Err(FormulaError::ExtendsCycle(parent_name));
        }
        let parent_path = parser::find_formula(&parent_name, cwd)?;
        let parent = parser::load_formula(&parent_path)?;
        let parent = resolve_inner(parent, cwd, visited)?;
        formula = merge(parent, formula);
    }

    Ok(formula)
}

/// Merges `parent` into `child` (§4.3.1 step 3): parent steps are
/// prepended, parent vars fill in keys the child doesn't define, and
/// description/phase default to the parent's when the child leaves them
/// empty.
fn merge(parent: Formula, mut child: Formula) -> Formula {
    let mut steps = parent.steps;
    steps.extend(child.steps);
    child.steps = steps;

    for (name, def) in parent.vars {
        child.vars.entry(name).or_insert(def);
    }

    if child.description.is_empty() {
        child.description = parent.description;
    }
    if child.phase.is_none() {
        child.phase = parent.phase;
    }

    child
}

/// Folds a step's `needs` (which also accepts the file spelling
/// `depends_on` via serde alias, see `types::Step`) into itself -- a no-op
/// given the current representation, kept as an explicit pass so the
/// merge step from §4.3.1 step 5 has a visible home and so a future
/// two-field representation only has to change this function.
fn normalize_steps(mut formula: Formula) -> Formula {
    for step in &mut formula.steps {
        step.needs.dedup();
    }
    formula
}

/// Full `ValidateVars` (§4.3.1): collects every violation instead of
/// stopping at the first one.
pub fn validate_vars(formula: &Formula, provided: &HashMap<String, String>) -> Result<(), FormulaError> {
    let mut violations = Vec::new();

    for (name, def) in &formula.vars {
        let value = provided.get(name).cloned().or_else(|| def.default.clone());

        let Some(value) = value else {
            if def.required {
                violations.push(VarViolation::Missing { name: name.clone() });
            }
            continue;
        };

        if let Some(allowed) = &def.r#enum {
            if !allowed.contains(&value) {
                violations.push(VarViolation::NotInEnum {
                    name: name.clone(),
                    value: value.clone(),
                    allowed: allowed.clone(),
                });
            }
        }

        if let Some(pattern) = &def.pattern {
            match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(re) => {
                    if !re.is_match(&value) {
                        violations.push(VarViolation::PatternMismatch {
                            name: name.clone(),
                            value: value.clone(),
                            pattern: pattern.clone(),
                        });
                    }
                }
                Err(e) => violations.push(VarViolation::InvalidPattern {
                    name: name.clone(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }),
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(FormulaError::Validation(violations))
    }
}

/// Builds the full variable map (provided overrides defaults), as
/// `engine::resolve_vars` does, exposed here so `resolve`'s callers don't
/// need to reach into `engine` directly.
pub fn resolve_vars(formula: &Formula, provided: &HashMap<String, String>) -> HashMap<String, String> {
    crate::engine::resolve_vars(formula, provided)
}

/// Substitutes `{{name}}` in a step's title/description/assignee/labels.
/// Unknown placeholders are left unmodified. Never mutates `step`.
pub fn substitute_step_vars(step: &Step, vars: &HashMap<String, String>) -> Step {
    Step {
        id: step.id.clone(),
        title: substitute_vars(&step.title, vars),
        description: substitute_vars(&step.description, vars),
        r#type: step.r#type.clone(),
        priority: step.priority,
        needs: step.needs.clone(),
        condition: step.condition.clone(),
        gate: step.gate.clone(),
        assignee: step.assignee.as_ref().map(|a| substitute_vars(a, vars)),
        labels: step.labels.clone(),
    }
}

/// Substitutes vars across every step of a formula (root title/description
/// is the caller's responsibility since it isn't a `Step`). Never mutates
/// the input.
pub fn substitute_formula_vars(formula: &Formula, vars: &HashMap<String, String>) -> Formula {
    let mut out = formula.clone();
    out.steps = formula.steps.iter().map(|s| substitute_step_vars(s, vars)).collect();
    out
}

//! Formula data model (§3.1 `FormulaDocument`, §4.3.1).
//!
//! Covers: steps, variables (defaults, required, enum, pattern),
//! conditions, dependencies between steps, gate definitions, and the
//! `extends` inheritance chain resolved by [`crate::resolve`].

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Default formula type.
fn default_type() -> String {
    "workflow".to_string()
}

/// Default step type.
fn default_step_type() -> String {
    "task".to_string()
}

/// Default priority.
fn default_priority() -> i32 {
    2
}

/// Root structure for `.formula.json` / `.formula.toml` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Unique identifier / name for this formula.
    pub formula: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Formula type: "workflow", "expansion", "aspect".
    #[serde(default = "default_type")]
    pub r#type: String,

    /// Schema version (currently 1).
    #[serde(default)]
    pub version: i32,

    /// Template variables with optional defaults and validation.
    #[serde(default)]
    pub vars: HashMap<String, VarDef>,

    /// Steps that become issues when the formula is cooked.
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Parent formula names this one inherits from (§4.3.1 `ResolveFormula`
    /// step 2). Cleared to empty once `resolve` has merged them in.
    #[serde(default)]
    pub extends: Vec<String>,

    /// `liquid` (persistent, the default) or `vapor` (ephemeral-by-default;
    /// `Pour` warns if materialized as persistent anyway, §4.3.3 step 2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Where this formula was loaded from (set by the parser).
    #[serde(skip)]
    pub source: String,
}

/// Variable definition: default/required, plus optional `enum`/`pattern`
/// constraints (§4.3.1 `ValidateVars`).
///
/// A TOML/JSON var may be written as a plain string -- shorthand for
/// `{ default: <string> }` (§6) -- or as the full table below.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VarDef {
    /// What this variable is for.
    #[serde(default)]
    pub description: String,

    /// Whether the variable must be provided (no default).
    #[serde(default)]
    pub required: bool,

    /// Default value (None = no default).
    #[serde(default)]
    pub default: Option<String>,

    /// If set, a provided value must be one of these.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<String>>,

    /// If set, a provided value must fully match this regex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl<'de> Deserialize<'de> for VarDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shorthand {
            Default(String),
            Full {
                #[serde(default)]
                description: String,
                #[serde(default)]
                required: bool,
                #[serde(default)]
                default: Option<String>,
                #[serde(default, rename = "enum")]
                r#enum: Option<Vec<String>>,
                #[serde(default)]
                pattern: Option<String>,
            },
        }

        Ok(match Shorthand::deserialize(deserializer)? {
            Shorthand::Default(default) => VarDef {
                description: String::new(),
                required: false,
                default: Some(default),
                r#enum: None,
                pattern: None,
            },
            Shorthand::Full { description, required, default, r#enum, pattern } => VarDef {
                description,
                required,
                default,
                r#enum,
                pattern,
            },
        })
    }
}

/// A work-item step that becomes an issue when cooked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier within this formula.
    pub id: String,

    /// Issue title (supports `{{variable}}` substitution).
    pub title: String,

    /// Issue description (supports substitution).
    #[serde(default)]
    pub description: String,

    /// Issue type: "task", "bug", "feature", "epic", "chore".
    #[serde(default = "default_step_type")]
    pub r#type: String,

    /// Issue priority (0-4).
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Step IDs this step depends on. The file format also accepts this
    /// field spelled `depends_on` (§3.1); `resolve::resolve_formula`'s step
    /// 5 folds either spelling into this one field.
    #[serde(default, alias = "depends_on")]
    pub needs: Vec<String>,

    /// Condition for including this step, e.g. `"{{type}} == feature"`.
    #[serde(default)]
    pub condition: Option<String>,

    /// Gate configuration (async wait condition).
    #[serde(default)]
    pub gate: Option<StepGate>,

    /// Default assignee (supports substitution).
    #[serde(default)]
    pub assignee: Option<String>,

    /// Labels applied to the created issue.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Gate defines an async wait condition for a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepGate {
    /// Condition type: "human", "timer", "gh:run", "gh:pr".
    pub r#type: String,

    /// Condition identifier (e.g. workflow name for gh:run).
    #[serde(default)]
    pub id: String,

    /// How long to wait before escalation (e.g. "30m", "1h").
    #[serde(default)]
    pub timeout: String,
}

/// A fully-resolved step ready for issue creation.
#[derive(Debug, Clone, Serialize)]
pub struct CookedStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub issue_type: String,
    pub priority: i32,
    pub needs: Vec<String>,
    pub gate: Option<StepGate>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
}

/// Errors that can occur during formula parsing and cooking.
#[derive(Debug, thiserror::Error)]
pub enum FormulaError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing required variable: {0}")]
    MissingVariable(String),

    #[error("unknown variable in condition: {0}")]
    UnknownVariable(String),

    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    #[error("step not found: {0}")]
    StepNotFound(String),

    #[error("cycle detected in step dependencies")]
    CycleDetected,

    /// `extends` forms a cycle among formula names.
    #[error("cycle detected in formula inheritance: {0}")]
    ExtendsCycle(String),

    /// One or more `ValidateVars` violations, collected together rather
    /// than reported one at a time (§4.3.1).
    #[error("formula validation failed:\n{}", .0.iter().map(|v| format!("  - {v}")).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<VarViolation>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One `ValidateVars` violation, with the `--var NAME=<value>` hint the
/// spec requires for missing-required-variable reports.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VarViolation {
    #[error("missing required variable {name} (hint: --var {name}=<value>)")]
    Missing { name: String },

    #[error("variable {name}={value:?} is not one of {allowed:?}")]
    NotInEnum { name: String, value: String, allowed: Vec<String> },

    #[error("variable {name}={value:?} does not match pattern {pattern:?}")]
    PatternMismatch { name: String, value: String, pattern: String },

    #[error("variable {name} has an invalid regex pattern {pattern:?}: {reason}")]
    InvalidPattern { name: String, pattern: String, reason: String },
}

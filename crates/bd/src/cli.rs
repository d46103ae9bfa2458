//! Clap CLI definitions for the `bd` driver.
//!
//! The full command grammar of a production issue tracker is out of scope
//! here; this surfaces just enough subcommands to exercise every operation
//! `beads-storage`/`beads-graph`/`beads-workflow`/`beads-formula` expose.

use clap::{Args, Parser, Subcommand};

/// bd -- dependency-aware issue tracker driver.
#[derive(Parser, Debug)]
#[command(name = "bd", about = "Dependency-aware issue tracker driver", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Global flags available to every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the `.beads` store directory (default: auto-discover upward from cwd).
    #[arg(long, global = true)]
    pub beads_dir: Option<String>,

    /// Actor name override, ahead of the config/env/git resolution chain.
    #[arg(long, global = true, env = "BD_ACTOR")]
    pub actor: Option<String>,

    /// Output JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a `.beads` store in the current directory.
    Init(InitArgs),
    /// Create a new issue.
    #[command(alias = "new")]
    Create(CreateArgs),
    /// Show one issue's full detail.
    Show(ShowArgs),
    /// List issues (open+in_progress+hooked by default).
    List(ListArgs),
    /// Update fields on an existing issue.
    Update(UpdateArgs),
    /// Close an issue.
    Close(CloseArgs),
    /// Reopen a closed issue.
    Reopen(ReopenArgs),
    /// Delete an issue (soft by default, tombstoning it).
    Delete(DeleteArgs),
    /// Manage dependency edges between issues.
    Dep(DepArgs),
    /// List open issues with no unresolved blocking dependency.
    Ready,
    /// Check (and optionally repair) store integrity.
    Doctor(DoctorArgs),
    /// Preview a formula's resolved steps without persisting anything.
    Cook(FormulaArgs),
    /// Materialize a formula into a persistent molecule.
    Pour(FormulaArgs),
    /// Materialize a formula into an ephemeral molecule.
    Wisp(FormulaArgs),
    /// Cascade-terminate a molecule.
    Burn(MoleculeArgs),
    /// Collapse a molecule's ephemeral children into one digest issue.
    Squash(SquashArgs),
    /// Sweep ephemeral issues older than a threshold.
    Gc(GcArgs),
    /// Show the current view of an in-flight molecule.
    Current(CurrentArgs),
    /// Show aggregate progress for a molecule.
    Progress(MoleculeArgs),
    /// Get or set `.beads/config.yaml` values.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Issue ID prefix (default: "bd-").
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Issue title.
    pub title: String,

    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Issue type (task|bug|feature|epic|chore|<custom>).
    #[arg(short = 't', long = "type", default_value = "task")]
    pub issue_type: String,

    /// Priority (critical|high|medium|low|backlog, or P0-P4).
    #[arg(short = 'p', long, default_value = "medium")]
    pub priority: String,

    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Parent issue ID, for a hierarchical child.
    #[arg(long)]
    pub parent: Option<String>,

    /// Mark this issue ephemeral (a wisp step).
    #[arg(long)]
    pub ephemeral: bool,
}

// ---------------------------------------------------------------------------
// Show / List
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (open|in_progress|hooked|closed|tombstone).
    #[arg(short = 's', long)]
    pub status: Option<String>,

    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Only children of this parent id.
    #[arg(long)]
    pub parent: Option<String>,
}

// ---------------------------------------------------------------------------
// Update / Close / Reopen / Delete
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(short = 'd', long)]
    pub description: Option<String>,
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,
    #[arg(short = 'p', long)]
    pub priority: Option<String>,
    #[arg(short = 's', long)]
    pub status: Option<String>,
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    pub id: String,
    #[arg(short = 'r', long, default_value = "")]
    pub reason: String,
}

#[derive(Args, Debug)]
pub struct ReopenArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: String,
    /// Hard-delete (remove the file) instead of tombstoning.
    #[arg(long)]
    pub hard: bool,
}

// ---------------------------------------------------------------------------
// Dep
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommands,
}

#[derive(Subcommand, Debug)]
pub enum DepCommands {
    /// Add a dependency edge `from -> to`.
    Add(DepEdgeArgs),
    /// Remove a dependency edge `from -> to`.
    Remove(DepEdgeArgs),
}

#[derive(Args, Debug)]
pub struct DepEdgeArgs {
    pub from: String,
    pub to: String,
    /// Dependency type (blocks|parent_child).
    #[arg(short = 't', long = "type", default_value = "blocks")]
    pub dep_type: String,
}

// ---------------------------------------------------------------------------
// Doctor
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Attempt to repair detected problems instead of only reporting them.
    #[arg(long)]
    pub fix: bool,
}

// ---------------------------------------------------------------------------
// Formula (Cook/Pour/Wisp)
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct FormulaArgs {
    /// Formula name (searched per beads-formula's lookup order).
    pub formula: String,

    /// Variable substitution `key=value`, repeatable.
    #[arg(long = "var", num_args = 1..)]
    pub vars: Vec<String>,
}

// ---------------------------------------------------------------------------
// Molecule operations (Burn/Squash/GC/Current/Progress)
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct MoleculeArgs {
    /// Molecule root issue id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SquashArgs {
    pub id: String,
    #[arg(long)]
    pub summary: Option<String>,
    /// Keep the squashed children (promote to persistent) instead of deleting them.
    #[arg(long)]
    pub keep_children: bool,
}

#[derive(Args, Debug)]
pub struct GcArgs {
    /// Remove ephemeral issues created at least this many hours ago.
    #[arg(long, default_value = "24")]
    pub older_than_hours: i64,
}

#[derive(Args, Debug)]
pub struct CurrentArgs {
    /// Molecule root id (if omitted, inferred from the actor's in-flight work).
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the resolved config.
    Get,
    /// Set `prefix` or `actor` and persist to `.beads/config.yaml`.
    Set(ConfigSetArgs),
}

#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// `prefix` or `actor`.
    pub key: String,
    pub value: String,
}

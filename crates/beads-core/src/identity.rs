//! Actor identity resolution (§4.4).
//!
//! Priority: an explicit override (e.g. from `.beads/config.yaml`) > the
//! `BD_ACTOR` env var > `BEADS_ACTOR` env var > `git config user.name` >
//! the OS user env var > the constant placeholder `"unknown"`. Pure except
//! for the two environment reads and the one subprocess invocation.

use std::env;
use std::process::Command;

/// Fallback identity when nothing else resolves.
pub const UNKNOWN_ACTOR: &str = "unknown";

/// Resolves the actor name using the priority chain described above.
///
/// `override_value` is the highest-priority source (e.g. a config file
/// setting); pass `None` to fall through to the environment/git/OS chain.
pub fn resolve_actor(override_value: Option<&str>) -> String {
    if let Some(actor) = override_value {
        if !actor.is_empty() {
            return actor.to_string();
        }
    }

    if let Ok(actor) = env::var("BD_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    if let Ok(actor) = env::var("BEADS_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    if let Some(name) = git_user_name() {
        return name;
    }

    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        if !user.is_empty() {
            return user;
        }
    }

    UNKNOWN_ACTOR.to_string()
}

/// Shells out to `git config user.name`; returns `None` on any failure
/// (missing binary, not a repo, unset config, empty value).
fn git_user_name() -> Option<String> {
    let output = Command::new("git")
        .args(["config", "user.name"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if name.is_empty() { None } else { Some(name) }
}

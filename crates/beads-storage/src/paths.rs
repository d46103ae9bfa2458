//! On-disk layout helpers (§4.1.2).

use std::path::{Path, PathBuf};

pub const OPEN_DIR: &str = "open";
pub const CLOSED_DIR: &str = "closed";
pub const CHILD_COUNTERS_FILE: &str = "child_counters.json";
pub const CHILD_COUNTERS_LOCK: &str = "child_counters.lock";

pub fn open_dir(root: &Path) -> PathBuf {
    root.join(OPEN_DIR)
}

pub fn closed_dir(root: &Path) -> PathBuf {
    root.join(CLOSED_DIR)
}

pub fn issue_path(root: &Path, id: &str, in_closed_dir: bool) -> PathBuf {
    let dir = if in_closed_dir {
        closed_dir(root)
    } else {
        open_dir(root)
    };
    dir.join(format!("{id}.json"))
}

pub fn open_issue_path(root: &Path, id: &str) -> PathBuf {
    open_dir(root).join(format!("{id}.json"))
}

pub fn closed_issue_path(root: &Path, id: &str) -> PathBuf {
    closed_dir(root).join(format!("{id}.json"))
}

pub fn lock_path(root: &Path, id: &str) -> PathBuf {
    open_dir(root).join(format!("{id}.lock"))
}

pub fn child_counters_path(root: &Path) -> PathBuf {
    root.join(CHILD_COUNTERS_FILE)
}

pub fn child_counters_lock_path(root: &Path) -> PathBuf {
    root.join(CHILD_COUNTERS_LOCK)
}

//! `FsStore` -- the filesystem-backed `IssueStore` (§4.1).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use beads_core::comment::Comment;
use beads_core::dependency::DependencyEdge;
use beads_core::enums::{DependencyType, Status};
use beads_core::filter::IssueFilter;
use beads_core::idformat::{self, MAX_DEPTH};
use beads_core::issue::Issue;
use beads_core::validation;

use crate::atomic::write_atomic;
use crate::doctor::Problem;
use crate::error::{Result, StoreError};
use crate::paths;

/// The operations an on-disk issue database exposes. Implemented by
/// [`FsStore`]; kept as a trait so `beads-graph`/`beads-workflow` depend on
/// the contract rather than the filesystem encoding.
pub trait IssueStore {
    fn init(&self) -> Result<()>;
    fn create(&self, issue: Issue, actor: &str) -> Result<String>;
    fn get(&self, id: &str) -> Result<Issue>;
    fn update(&self, issue: Issue, actor: &str) -> Result<()>;
    fn delete(&self, id: &str, hard: bool, actor: &str) -> Result<()>;
    fn close(&self, id: &str, reason: &str, actor: &str) -> Result<()>;
    fn reopen(&self, id: &str, actor: &str) -> Result<()>;
    fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;
    fn add_dependency(&self, from: &str, to: &str, dep_type: DependencyType, actor: &str) -> Result<()>;
    fn remove_dependency(&self, from: &str, to: &str, actor: &str) -> Result<()>;
    fn add_comment(&self, id: &str, author: &str, text: &str) -> Result<Comment>;
    fn get_next_child_id(&self, parent: &str) -> Result<String>;
    fn doctor(&self, fix: bool) -> Result<Vec<Problem>>;
}

/// A beads issue database rooted at a directory on disk.
pub struct FsStore {
    root: PathBuf,
    prefix: String,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), prefix: idformat::DEFAULT_PREFIX.to_string() }
    }

    /// Overrides the root-ID prefix `create()` uses when no explicit ID is
    /// given (default: [`idformat::DEFAULT_PREFIX`]). Set from
    /// `.beads/config.yaml`'s `issue-prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock_path(&self, id: &str) -> PathBuf {
        paths::lock_path(&self.root, id)
    }

    /// Acquires the per-issue lock, runs `f`, then releases and removes the
    /// lock file regardless of outcome (§4.1.4).
    fn with_issue_lock<T>(&self, id: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let path = self.lock_path(id);
        let guard = beads_lockfile::acquire_exclusive(&path)
            .map_err(|e| StoreError::lock(path.clone(), e))?;
        let result = f();
        guard
            .release_and_remove()
            .map_err(|e| StoreError::lock(path.clone(), e))?;
        result
    }

    /// Acquires locks on every id in `ids`, in lexicographic order, runs `f`,
    /// then releases (without deleting -- callers that finish a mutation
    /// remove each issue's lock file themselves once they know the id is
    /// settled) every lock (§4.1.4).
    fn with_ordered_locks<T>(
        &self,
        ids: &[&str],
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let mut paths: Vec<PathBuf> = ids.iter().map(|id| self.lock_path(id)).collect();
        let guards = beads_lockfile::acquire_ordered(&mut paths)
            .map_err(|e| StoreError::lock(self.root.clone(), e))?;
        let result = f();
        for guard in guards {
            let path = guard.path().to_path_buf();
            if let Err(e) = guard.release_and_remove() {
                warn!(?path, error = %e, "failed to remove lock file after ordered mutation");
            }
        }
        result
    }

    fn locate(&self, id: &str) -> Option<(PathBuf, bool)> {
        let open = paths::open_issue_path(&self.root, id);
        if open.exists() {
            return Some((open, false));
        }
        let closed = paths::closed_issue_path(&self.root, id);
        if closed.exists() {
            return Some((closed, true));
        }
        None
    }

    fn read_issue(&self, path: &Path) -> Result<Issue> {
        let data = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_slice(&data).map_err(|e| StoreError::json(path, e))
    }

    fn write_issue(&self, issue: &Issue) -> Result<()> {
        let in_closed = issue.status.is_closed_location();
        let path = paths::issue_path(&self.root, &issue.id, in_closed);
        let json = serde_json::to_vec_pretty(issue).map_err(|e| StoreError::json(&path, e))?;
        write_atomic(&path, &json).map_err(|e| StoreError::io(&path, e))
    }

    fn remove_issue_file(&self, id: &str, in_closed: bool) -> Result<()> {
        let path = paths::issue_path(&self.root, id, in_closed);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn move_issue_file(&self, from: &Path, to: &Path) -> Result<()> {
        let issue = self.read_issue(from)?;
        let json = serde_json::to_vec_pretty(&issue).map_err(|e| StoreError::json(to, e))?;
        write_atomic(to, &json).map_err(|e| StoreError::io(to, e))?;
        std::fs::remove_file(from).map_err(|e| StoreError::io(from, e))
    }

    fn require(&self, id: &str) -> Result<(Issue, PathBuf, bool)> {
        let (path, in_closed) = self
            .locate(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        let issue = self.read_issue(&path)?;
        Ok((issue, path, in_closed))
    }

    fn read_child_counters(&self) -> Result<HashMap<String, u64>> {
        let path = paths::child_counters_path(&self.root);
        match std::fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data).map_err(|e| StoreError::json(&path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    fn write_child_counters(&self, counters: &HashMap<String, u64>) -> Result<()> {
        let path = paths::child_counters_path(&self.root);
        let json = serde_json::to_vec_pretty(counters).map_err(|e| StoreError::json(&path, e))?;
        write_atomic(&path, &json).map_err(|e| StoreError::io(&path, e))
    }

    /// Bumps `child_counters[parent]` to at least `at_least`, never
    /// decreasing it (§4.1.6, I7).
    fn bump_child_counter(&self, parent: &str, at_least: u64) -> Result<()> {
        let lock_path = paths::child_counters_lock_path(&self.root);
        let guard = beads_lockfile::acquire_exclusive(&lock_path)
            .map_err(|e| StoreError::lock(&lock_path, e))?;
        let mut counters = self.read_child_counters()?;
        let entry = counters.entry(parent.to_string()).or_insert(0);
        if *entry < at_least {
            *entry = at_least;
        }
        self.write_child_counters(&counters)?;
        guard.release();
        Ok(())
    }

    /// BFS over `dependencies` edges of kind `Blocks` starting at `start`,
    /// returning whether `target` is reachable (§4.1.8).
    fn blocks_reachable(&self, start: &str, target: &str) -> Result<bool> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue = vec![start.to_string()];
        seen.insert(start.to_string());
        while let Some(current) = queue.pop() {
            if current == target {
                return Ok(true);
            }
            if let Some((path, _)) = self.locate(&current) {
                let issue = self.read_issue(&path)?;
                for edge in &issue.dependencies {
                    if edge.dep_type == DependencyType::Blocks && seen.insert(edge.id.clone()) {
                        queue.push(edge.id.clone());
                    }
                }
            }
        }
        Ok(false)
    }

    /// Walks the `parent` chain starting at `start`; returns whether
    /// `ancestor` appears in it (§4.1.8).
    fn is_ancestor(&self, start: &str, ancestor: &str) -> Result<bool> {
        let mut current = start.to_string();
        loop {
            if current == ancestor {
                return Ok(true);
            }
            let Some((path, _)) = self.locate(&current) else {
                return Ok(false);
            };
            let issue = self.read_issue(&path)?;
            match issue.parent {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }
}

fn transition_allowed(from: Status, to: Status) -> bool {
    if from == to {
        return true;
    }
    let active = |s: Status| matches!(s, Status::Open | Status::InProgress | Status::Hooked);
    active(from) && active(to)
}

impl IssueStore for FsStore {
    fn init(&self) -> Result<()> {
        for dir in [paths::open_dir(&self.root), paths::closed_dir(&self.root)] {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        let reaped = beads_lockfile::reap_stale_locks(&paths::open_dir(&self.root))
            .map_err(|e| StoreError::lock(&self.root, e))?;
        if reaped > 0 {
            info!(reaped, "reaped stale lock files on init");
        }
        Ok(())
    }

    fn create(&self, mut issue: Issue, actor: &str) -> Result<String> {
        let now = Utc::now();
        issue.created_at = now;
        issue.updated_at = now;
        if issue.created_by.is_empty() {
            issue.created_by = actor.to_string();
        }

        let explicit = !issue.id.is_empty();
        let id = if explicit {
            let id = issue.id.clone();
            if idformat::depth(&id) > MAX_DEPTH {
                return Err(StoreError::MaxDepthExceeded {
                    id: id.clone(),
                    max_depth: MAX_DEPTH,
                });
            }
            if self.locate(&id).is_some() {
                return Err(StoreError::IdCollision {
                    prefix: id.clone(),
                    attempts: 1,
                });
            }
            id
        } else {
            const ATTEMPTS: u32 = 3;
            let mut chosen = None;
            for _ in 0..ATTEMPTS {
                let candidate = idformat::random_root_id(&self.prefix, 4);
                if self.locate(&candidate).is_none() {
                    chosen = Some(candidate);
                    break;
                }
            }
            chosen.ok_or_else(|| StoreError::IdCollision {
                prefix: self.prefix.clone(),
                attempts: ATTEMPTS,
            })?
        };
        issue.id = id.clone();

        validation::validate(&issue).map_err(|source| StoreError::Validation {
            id: id.clone(),
            source,
        })?;

        if let Some(parent) = idformat::parent_of(&id) {
            let n: u64 = id
                .rsplit('.')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            self.bump_child_counter(parent, n)?;
        }

        self.with_issue_lock(&id, || {
            debug!(id = %id, "creating issue");
            self.write_issue(&issue)
        })?;

        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Issue> {
        let (path, _) = self
            .locate(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        self.read_issue(&path)
    }

    fn update(&self, mut issue: Issue, actor: &str) -> Result<()> {
        let id = issue.id.clone();
        self.with_issue_lock(&id, || {
            let (existing, old_path, old_in_closed) = self.require(&id)?;
            if !transition_allowed(existing.status, issue.status) {
                return Err(StoreError::InvalidTransition {
                    id: id.clone(),
                    from: existing.status.as_str(),
                    to: issue.status.as_str(),
                });
            }
            issue.created_at = existing.created_at;
            issue.updated_at = Utc::now();
            validation::validate(&issue).map_err(|source| StoreError::Validation {
                id: id.clone(),
                source,
            })?;

            let new_in_closed = issue.status.is_closed_location();
            self.write_issue(&issue)?;
            if old_in_closed != new_in_closed {
                std::fs::remove_file(&old_path).map_err(|e| StoreError::io(&old_path, e))?;
            }
            let _ = actor;
            Ok(())
        })
    }

    fn delete(&self, id: &str, hard: bool, actor: &str) -> Result<()> {
        self.with_issue_lock(id, || {
            let (mut issue, path, in_closed) = self.require(id)?;
            if hard {
                std::fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
            } else {
                issue.status = Status::Tombstone;
                issue.closed_at = Some(Utc::now());
                issue.updated_at = Utc::now();
                self.write_issue(&issue)?;
                if !in_closed {
                    self.remove_issue_file(id, false)?;
                }
            }
            let _ = actor;
            Ok(())
        })
    }

    fn close(&self, id: &str, reason: &str, actor: &str) -> Result<()> {
        self.with_issue_lock(id, || {
            let (mut issue, _path, in_closed) = self.require(id)?;
            if in_closed {
                return Err(StoreError::InvalidTransition {
                    id: id.to_string(),
                    from: issue.status.as_str(),
                    to: Status::Closed.as_str(),
                });
            }
            issue.status = Status::Closed;
            issue.closed_at = Some(Utc::now());
            issue.updated_at = Utc::now();
            issue.close_reason = reason.to_string();
            self.write_issue(&issue)?;
            self.remove_issue_file(id, false)?;
            let _ = actor;
            Ok(())
        })
    }

    fn reopen(&self, id: &str, actor: &str) -> Result<()> {
        self.with_issue_lock(id, || {
            let (mut issue, _path, in_closed) = self.require(id)?;
            if issue.status != Status::Closed {
                return Err(StoreError::InvalidTransition {
                    id: id.to_string(),
                    from: issue.status.as_str(),
                    to: Status::Open.as_str(),
                });
            }
            issue.status = Status::Open;
            issue.closed_at = None;
            issue.close_reason.clear();
            issue.updated_at = Utc::now();
            self.write_issue(&issue)?;
            if in_closed {
                self.remove_issue_file(id, true)?;
            }
            let _ = actor;
            Ok(())
        })
    }

    fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let search_closed = filter
            .status
            .map(|s| s.is_closed_location())
            .unwrap_or(false);
        let dir = if search_closed {
            paths::closed_dir(&self.root)
        } else {
            paths::open_dir(&self.root)
        };

        let mut issues = Vec::new();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(issues),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let issue = match self.read_issue(&path) {
                Ok(issue) => issue,
                Err(StoreError::Json { .. }) => continue,
                Err(e) => return Err(e),
            };
            if matches(&issue, filter) {
                issues.push(issue);
            }
        }

        issues.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(issues)
    }

    fn add_dependency(
        &self,
        from: &str,
        to: &str,
        dep_type: DependencyType,
        actor: &str,
    ) -> Result<()> {
        if from == to {
            return Err(StoreError::Cycle {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let cycle_precheck = match dep_type {
            DependencyType::Blocks => self.blocks_reachable(to, from)?,
            DependencyType::ParentChild => self.is_ancestor(to, from)?,
        };
        if cycle_precheck {
            return Err(StoreError::Cycle {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let mut lock_ids = vec![from, to];
        let old_parent = if dep_type == DependencyType::ParentChild {
            let (child, _, _) = self.require(from)?;
            child.parent.filter(|p| p != to)
        } else {
            None
        };
        if let Some(old) = &old_parent {
            lock_ids.push(old.as_str());
        }

        self.with_ordered_locks(&lock_ids, || {
            let recheck = match dep_type {
                DependencyType::Blocks => self.blocks_reachable(to, from)?,
                DependencyType::ParentChild => self.is_ancestor(to, from)?,
            };
            if recheck {
                return Err(StoreError::Cycle {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }

            let (mut from_issue, _, _) = self.require(from)?;
            let (mut to_issue, _, _) = self.require(to)?;

            if dep_type == DependencyType::ParentChild {
                if let Some(old_parent_id) = old_parent.clone() {
                    let (mut old_parent_issue, _, _) = self.require(&old_parent_id)?;
                    old_parent_issue.dependents.retain(|e| e.id != from);
                    old_parent_issue.updated_at = Utc::now();
                    self.write_issue(&old_parent_issue)?;
                    from_issue
                        .dependencies
                        .retain(|e| !(e.dep_type == DependencyType::ParentChild && e.id == old_parent_id));
                }
                from_issue.parent = Some(to.to_string());
            }

            if !from_issue.dependencies.iter().any(|e| e.id == to && e.dep_type == dep_type) {
                from_issue.dependencies.push(DependencyEdge::new(to, dep_type));
            }
            if !to_issue.dependents.iter().any(|e| e.id == from && e.dep_type == dep_type) {
                to_issue.dependents.push(DependencyEdge::new(from, dep_type));
            }
            from_issue.updated_at = Utc::now();
            to_issue.updated_at = Utc::now();
            self.write_issue(&from_issue)?;
            self.write_issue(&to_issue)?;
            let _ = actor;
            Ok(())
        })
    }

    fn remove_dependency(&self, from: &str, to: &str, actor: &str) -> Result<()> {
        self.with_ordered_locks(&[from, to], || {
            let (mut from_issue, _, _) = self.require(from)?;
            let (mut to_issue, _, _) = self.require(to)?;
            let removed = from_issue.dependencies.iter().find(|e| e.id == to).cloned();
            from_issue.dependencies.retain(|e| e.id != to);
            to_issue.dependents.retain(|e| e.id != from);
            if let Some(edge) = removed {
                if edge.dep_type == DependencyType::ParentChild && from_issue.parent.as_deref() == Some(to) {
                    from_issue.parent = None;
                }
            }
            from_issue.updated_at = Utc::now();
            to_issue.updated_at = Utc::now();
            self.write_issue(&from_issue)?;
            self.write_issue(&to_issue)?;
            let _ = actor;
            Ok(())
        })
    }

    fn add_comment(&self, id: &str, author: &str, text: &str) -> Result<Comment> {
        self.with_issue_lock(id, || {
            let (mut issue, _, _) = self.require(id)?;
            let comment = Comment {
                id: Comment::format_id(issue.comments.len() as u64 + 1),
                author: author.to_string(),
                text: text.to_string(),
                created_at: Utc::now(),
            };
            issue.comments.push(comment.clone());
            issue.updated_at = Utc::now();
            self.write_issue(&issue)?;
            Ok(comment)
        })
    }

    fn get_next_child_id(&self, parent: &str) -> Result<String> {
        if idformat::depth(parent) + 1 > MAX_DEPTH {
            return Err(StoreError::MaxDepthExceeded {
                id: parent.to_string(),
                max_depth: MAX_DEPTH,
            });
        }
        if self.locate(parent).is_none() {
            return Err(StoreError::NotFound {
                id: parent.to_string(),
            });
        }

        let lock_path = paths::child_counters_lock_path(&self.root);
        let guard = beads_lockfile::acquire_exclusive(&lock_path)
            .map_err(|e| StoreError::lock(&lock_path, e))?;
        let mut counters = self.read_child_counters()?;
        let entry = counters.entry(parent.to_string()).or_insert(0);
        *entry += 1;
        let n = *entry;
        self.write_child_counters(&counters)?;
        guard.release();

        Ok(idformat::child_id(parent, n))
    }

    fn doctor(&self, fix: bool) -> Result<Vec<Problem>> {
        let mut problems = Vec::new();
        let open_dir = paths::open_dir(&self.root);
        let closed_dir = paths::closed_dir(&self.root);

        let mut open_map: HashMap<String, (PathBuf, Option<Issue>)> = HashMap::new();
        let mut closed_map: HashMap<String, (PathBuf, Option<Issue>)> = HashMap::new();

        for (dir, map) in [(&open_dir, &mut open_map), (&closed_dir, &mut closed_map)] {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io(dir, e)),
            };
            for entry in entries {
                let entry = entry.map_err(|e| StoreError::io(dir, e))?;
                let path = entry.path();
                let name = path.file_name().unwrap_or_default().to_string_lossy().to_string();

                if name.contains(".tmp.") {
                    let fixed = fix && std::fs::remove_file(&path).is_ok();
                    problems.push(Problem::OrphanedTempFile { path, fixed });
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                match self.read_issue(&path) {
                    Ok(issue) => {
                        let id = issue.id.clone();
                        map.insert(id, (path, Some(issue)));
                    }
                    Err(_) => problems.push(Problem::MalformedJson { path }),
                }
            }
        }

        // Orphaned lock files: a `.lock` file under `open/` with no matching
        // issue in either directory.
        if let Ok(entries) = std::fs::read_dir(&open_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("lock") {
                    continue;
                }
                let id = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
                if !open_map.contains_key(&id) && !closed_map.contains_key(&id) {
                    let fixed = fix && std::fs::remove_file(&path).is_ok();
                    problems.push(Problem::OrphanedLockFile { path, fixed });
                }
            }
        }

        // Duplicate IDs across open/ and closed/: keep whichever copy's
        // status matches its directory.
        let dup_ids: Vec<String> = open_map
            .keys()
            .filter(|id| closed_map.contains_key(*id))
            .cloned()
            .collect();
        for id in dup_ids {
            let (open_path, open_issue) = open_map.get(&id).cloned().unwrap();
            let (closed_path, closed_issue) = closed_map.get(&id).cloned().unwrap();
            let open_matches = open_issue
                .as_ref()
                .is_some_and(|i| !i.status.is_closed_location());
            let closed_matches = closed_issue
                .as_ref()
                .is_some_and(|i| i.status.is_closed_location());

            let (kept, removed) = if closed_matches && !open_matches {
                (closed_path.clone(), open_path.clone())
            } else {
                (open_path.clone(), closed_path.clone())
            };

            let fixed = fix && std::fs::remove_file(&removed).is_ok();
            if fix && fixed {
                if removed == open_path {
                    open_map.remove(&id);
                } else {
                    closed_map.remove(&id);
                }
            }
            problems.push(Problem::DuplicateId {
                id,
                kept,
                removed: Some(removed),
                fixed,
            });
        }

        // Location mismatches: status says closed/tombstone but the record
        // lives in `open/`, or vice versa.
        let open_entries: Vec<(String, PathBuf, Issue)> = open_map
            .iter()
            .filter_map(|(id, (path, issue))| issue.clone().map(|i| (id.clone(), path.clone(), i)))
            .collect();
        for (id, path, issue) in &open_entries {
            if issue.status.is_closed_location() {
                let to = paths::closed_issue_path(&self.root, id);
                let fixed = fix && self.move_issue_file(path, &to).is_ok();
                problems.push(Problem::LocationMismatch {
                    id: id.clone(),
                    from: path.clone(),
                    to,
                    fixed,
                });
            }
        }
        let closed_entries: Vec<(String, PathBuf, Issue)> = closed_map
            .iter()
            .filter_map(|(id, (path, issue))| issue.clone().map(|i| (id.clone(), path.clone(), i)))
            .collect();
        for (id, path, issue) in &closed_entries {
            if !issue.status.is_closed_location() {
                let to = paths::open_issue_path(&self.root, id);
                let fixed = fix && self.move_issue_file(path, &to).is_ok();
                problems.push(Problem::LocationMismatch {
                    id: id.clone(),
                    from: path.clone(),
                    to,
                    fixed,
                });
            }
        }

        // Reference-level checks run over the deduplicated view of every
        // known issue, regardless of which directory it lives in.
        let mut all: HashMap<String, Issue> = HashMap::new();
        for (id, (_, issue)) in open_map.iter().chain(closed_map.iter()) {
            if let Some(issue) = issue {
                all.insert(id.clone(), issue.clone());
            }
        }

        let mut dirty: HashSet<String> = HashSet::new();

        let ids: Vec<String> = all.keys().cloned().collect();
        for id in &ids {
            let missing: Vec<String> = all[id]
                .dependencies
                .iter()
                .filter(|e| !all.contains_key(&e.id))
                .map(|e| e.id.clone())
                .collect();
            for missing_id in missing {
                if fix {
                    all.get_mut(id).unwrap().dependencies.retain(|e| e.id != missing_id);
                    dirty.insert(id.clone());
                }
                problems.push(Problem::BrokenReference {
                    id: id.clone(),
                    missing_id,
                    fixed: fix,
                });
            }

            if let Some(parent) = all[id].parent.clone() {
                if !all.contains_key(&parent) {
                    if fix {
                        let issue = all.get_mut(id).unwrap();
                        issue.parent = None;
                        issue.dependencies.retain(|e| {
                            !(e.id == parent && e.dep_type == DependencyType::ParentChild)
                        });
                        dirty.insert(id.clone());
                    }
                    problems.push(Problem::BrokenParent {
                        id: id.clone(),
                        missing_parent: parent,
                        fixed: fix,
                    });
                }
            }
        }

        for id in &ids {
            let edges: Vec<DependencyEdge> = all[id].dependencies.clone();
            for edge in edges {
                if !all.contains_key(&edge.id) {
                    continue;
                }
                let has_back = all[&edge.id]
                    .dependents
                    .iter()
                    .any(|e| e.id == *id && e.dep_type == edge.dep_type);
                if !has_back {
                    if fix {
                        all.get_mut(&edge.id)
                            .unwrap()
                            .dependents
                            .push(DependencyEdge::new(id.clone(), edge.dep_type));
                        dirty.insert(edge.id.clone());
                    }
                    problems.push(Problem::AsymmetricDependency {
                        id: id.clone(),
                        other_id: edge.id.clone(),
                        fixed: fix,
                    });
                }
            }
        }

        if fix {
            for id in dirty {
                if let Some(issue) = all.get(&id) {
                    let _ = self.with_issue_lock(&id, || self.write_issue(issue));
                }
            }
        }

        Ok(problems)
    }
}

fn matches(issue: &Issue, filter: &IssueFilter) -> bool {
    if let Some(status) = filter.status {
        if issue.status != status {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if issue.priority != priority {
            return false;
        }
    }
    if let Some(issue_type) = &filter.issue_type {
        if &issue.issue_type != issue_type {
            return false;
        }
    }
    if let Some(assignee) = &filter.assignee {
        if &issue.assignee != assignee {
            return false;
        }
    }
    if let Some(parent) = &filter.parent {
        if &issue.parent != parent {
            return false;
        }
    }
    if !filter.labels.iter().all(|l| issue.labels.contains(l)) {
        return false;
    }
    true
}

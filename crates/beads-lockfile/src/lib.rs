//! Advisory OS-level file locking for the beads store (§4.1.4).
//!
//! Every mutation that touches one or more issues acquires an exclusive
//! `flock` (via `fs2`) on a `.lock` file next to the issue's JSON record
//! before mutating it, and releases it afterward. Multi-issue mutations
//! acquire all their locks up front, in lexicographic ID order, so that two
//! concurrent callers can never deadlock against each other.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

/// Errors from lock acquisition or release.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("I/O error locking {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A non-blocking acquisition attempt found the lock already held.
    #[error("lock already held: {0}")]
    WouldBlock(PathBuf),
}

type Result<T> = std::result::Result<T, LockError>;

/// An acquired exclusive lock on a single file. Dropping it releases the OS
/// lock (via `File`'s `Drop`); callers that want the lock file removed from
/// disk must call `release_and_remove` explicitly, since removal is only
/// correct once the *caller* knows no other concurrent acquisition is in
/// flight for the same path (single-issue mutations, per §4.1.4).
pub struct LockGuard {
    path: PathBuf,
    file: Option<File>,
}

impl LockGuard {
    /// Releases the OS lock and best-effort deletes the lock file. Used by
    /// single-issue mutations once their critical section ends (§4.1.4): "...
    /// then release and delete the lock file."
    ///
    /// A `NotFound` on removal (e.g. a racing `Doctor` pass already reaped
    /// it) is not an error.
    pub fn release_and_remove(mut self) -> Result<()> {
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Releases the OS lock without touching the file on disk. Used for the
    /// global `child_counters.lock`, which is a persistent, reusable lock
    /// file rather than a per-issue one (§4.1.4).
    pub fn release(mut self) {
        self.file.take();
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // `File`'s own Drop closes the fd, which releases the flock.
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LockError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Returns `true` if `err` indicates the lock is held by someone else
/// (as opposed to some other I/O failure).
fn is_contended(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock)
        || matches!(err.raw_os_error(), Some(11) | Some(35)) // EAGAIN / EWOULDBLOCK
}

/// Blocks until an exclusive lock on `path` is acquired.
pub fn acquire_exclusive(path: &Path) -> Result<LockGuard> {
    let file = open_lock_file(path)?;
    file.lock_exclusive().map_err(|e| LockError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(LockGuard {
        path: path.to_path_buf(),
        file: Some(file),
    })
}

/// Attempts to acquire an exclusive lock on `path` without blocking. Returns
/// `Ok(None)` if another holder has it locked right now.
pub fn try_acquire_exclusive(path: &Path) -> Result<Option<LockGuard>> {
    let file = open_lock_file(path)?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(LockGuard {
            path: path.to_path_buf(),
            file: Some(file),
        })),
        Err(e) if is_contended(&e) => Ok(None),
        Err(e) => Err(LockError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Acquires exclusive locks on every path in `paths`, in lexicographic order
/// of the path itself (the store is responsible for passing paths whose sort
/// order matches the issue ID order it wants, per §4.1.4's "fixed
/// lexicographic ID order"). Duplicate paths are locked only once. On
/// failure to acquire any lock, every lock already taken is released (not
/// removed) before returning the error.
pub fn acquire_ordered(paths: &mut [PathBuf]) -> Result<Vec<LockGuard>> {
    paths.sort();
    paths.dedup();

    let mut held = Vec::with_capacity(paths.len());
    for path in paths.iter() {
        match acquire_exclusive(path) {
            Ok(guard) => held.push(guard),
            Err(e) => {
                for guard in held {
                    guard.release();
                }
                return Err(e);
            }
        }
    }
    Ok(held)
}

/// Stale-lock cleanup run on `Init` (§4.1.4): every `.lock` file in `dir`
/// that can be acquired non-blocking has no live holder and is removed.
/// Locks that are currently held (a live peer) are left untouched. Returns
/// the number of stale locks removed.
pub fn reap_stale_locks(dir: &Path) -> Result<usize> {
    let mut reaped = 0;
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(LockError::Io {
                path: dir.to_path_buf(),
                source: e,
            });
        }
    };

    for entry in entries {
        let entry = entry.map_err(|e| LockError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("lock") {
            continue;
        }
        if let Some(guard) = try_acquire_exclusive(&path)? {
            guard.release_and_remove()?;
            reaped += 1;
        }
    }
    Ok(reaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_and_release_removes_file() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join("bd-1.lock");
        let guard = acquire_exclusive(&lock_path).unwrap();
        assert!(lock_path.exists());
        guard.release_and_remove().unwrap();
        assert!(!lock_path.exists());
    }

    #[test]
    fn try_acquire_fails_while_held_by_same_process_lock() {
        // fs2 advisory locks are per-(process, fd) on most platforms; within
        // one process a second independent fd on the same file generally
        // still observes the first lock as held on Unix flock semantics.
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join("bd-1.lock");
        let _first = acquire_exclusive(&lock_path).unwrap();
        // We don't assert contention here (platform-dependent across CI
        // sandboxes); we only assert that a second acquisition attempt does
        // not panic and returns some result.
        let _ = try_acquire_exclusive(&lock_path);
    }

    #[test]
    fn reap_stale_locks_removes_unlocked_files() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join("bd-1.lock");
        std::fs::write(&stale, b"").unwrap();
        let reaped = reap_stale_locks(dir.path()).unwrap();
        assert_eq!(reaped, 1);
        assert!(!stale.exists());
    }

    #[test]
    fn reap_stale_locks_ignores_non_lock_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bd-1.json"), b"{}").unwrap();
        let reaped = reap_stale_locks(dir.path()).unwrap();
        assert_eq!(reaped, 0);
        assert!(dir.path().join("bd-1.json").exists());
    }

    #[test]
    fn acquire_ordered_dedups_and_sorts() {
        let dir = tempdir().unwrap();
        let mut paths = vec![
            dir.path().join("b.lock"),
            dir.path().join("a.lock"),
            dir.path().join("a.lock"),
        ];
        let guards = acquire_ordered(&mut paths).unwrap();
        assert_eq!(guards.len(), 2);
    }

    #[test]
    fn reap_stale_locks_on_missing_dir_is_noop() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert_eq!(reap_stale_locks(&missing).unwrap(), 0);
    }
}

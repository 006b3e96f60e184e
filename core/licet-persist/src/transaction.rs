//! All-or-nothing file replacement.
//!
//! The existing file is renamed to a backup, the new document is written to a
//! fresh file at the target path, and the backup is dropped only once the
//! write succeeded. On failure the partial target is removed and the backup
//! renamed back. Writers to the same path are serialized process-wide by
//! [`PATH_LOCKS`].

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::{PersistError, PersistResult};

/// Marker appended to the target name until a free backup name is found.
const BACKUP_MARKER: &str = "~";

/// Per-path write locks shared by every codec in the process.
pub(crate) static PATH_LOCKS: LazyLock<PathLocks> = LazyLock::new(PathLocks::default);

/// Returns the first free name formed by appending `~` to `path`, repeatedly.
pub(crate) fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    loop {
        name.push(BACKUP_MARKER);
        let candidate = PathBuf::from(&name);
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
    }
}

/// Replaces the file at `path` with whatever `write` produces.
pub(crate) fn replace(
    path: &Path,
    write: impl FnOnce(File) -> PersistResult<()>,
) -> PersistResult<()> {
    let backup = if fs::symlink_metadata(path).is_ok() {
        let backup = backup_path(path);
        fs::rename(path, &backup).map_err(|source| PersistError::Transaction {
            path: path.to_path_buf(),
            source,
            original: None,
        })?;
        debug!(path = %path.display(), backup = %backup.display(), "moved existing file aside");
        Some(backup)
    } else {
        None
    };

    let result = File::create(path)
        .map_err(|e| PersistError::Encode(Box::new(e)))
        .and_then(write);

    match result {
        Ok(()) => {
            if let Some(backup) = backup {
                if let Err(e) = fs::remove_file(&backup) {
                    warn!(backup = %backup.display(), error = %e, "failed to remove backup");
                }
            }
            Ok(())
        }
        Err(original) => {
            warn!(path = %path.display(), error = %original, "write failed, rolling back");
            Err(rollback(path, backup.as_deref(), original))
        }
    }
}

/// Removes the partial target and restores the backup. A failure here
/// supersedes `original` because the on-disk state is no longer known.
fn rollback(path: &Path, backup: Option<&Path>, original: PersistError) -> PersistError {
    if let Err(source) = fs::remove_file(path) {
        if source.kind() != io::ErrorKind::NotFound {
            return PersistError::Transaction {
                path: path.to_path_buf(),
                source,
                original: Some(Box::new(original)),
            };
        }
    }
    if let Some(backup) = backup {
        if let Err(source) = fs::rename(backup, path) {
            return PersistError::Transaction {
                path: path.to_path_buf(),
                source,
                original: Some(Box::new(original)),
            };
        }
    }
    original
}

/// One mutex per target path.
#[derive(Debug, Default)]
pub(crate) struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Runs `f` while holding the lock for `path`.
    pub(crate) fn with_lock<R>(&self, path: &Path, f: impl FnOnce() -> R) -> R {
        let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.clone()).or_default())
        };

        let result = {
            let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        drop(lock);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&key);
        }
        result
    }
}

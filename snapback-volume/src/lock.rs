//! Target-scoped advisory locking.
//!
//! Exactly one lifecycle-mutating operation may run per backup target at a
//! time. The lock is a capability object passed into the lifecycle
//! operations: acquisition is non-blocking and fails fast with `Busy` when
//! another process holds it. Distinct targets lock independently.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Name of the lockfile inside a backup root.
pub const LOCK_FILE: &str = ".lock";

/// Errors from lock acquisition.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("target busy: `{lockfile}` already exists")]
    Busy { lockfile: PathBuf },

    #[error("cannot create lock `{lockfile}`: {source}")]
    Io {
        lockfile: PathBuf,
        source: io::Error,
    },
}

/// Capability for acquiring the per-target exclusive lock.
pub trait Locker {
    type Guard;

    /// Acquire the lock for the target rooted at `dir`. Immediate-or-fail;
    /// never blocks or queues.
    fn acquire(&self, dir: &Path) -> Result<Self::Guard, LockError>;
}

/// Held lock; removing the lockfile on drop releases it.
#[derive(Debug)]
pub struct LockGuard {
    lockfile: PathBuf,
}

impl LockGuard {
    pub fn lockfile(&self) -> &Path {
        &self.lockfile
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lockfile);
    }
}

/// Lockfile-based locker. Creation with `create_new` is atomic, so two
/// concurrent acquisitions cannot both succeed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LockFile;

impl Locker for LockFile {
    type Guard = LockGuard;

    fn acquire(&self, dir: &Path) -> Result<LockGuard, LockError> {
        let lockfile = dir.join(LOCK_FILE);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lockfile)
        {
            Ok(_) => Ok(LockGuard { lockfile }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(LockError::Busy { lockfile })
            }
            Err(e) => Err(LockError::Io {
                lockfile,
                source: e,
            }),
        }
    }
}

/// Mock locker for orchestration tests.
/// Cloning creates a new handle to the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MockLocker {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    busy: bool,
    acquired: usize,
}

impl MockLocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every acquisition fail with `Busy`.
    pub fn set_busy(&self) {
        self.state.lock().unwrap().busy = true;
    }

    /// Number of successful acquisitions.
    pub fn acquired(&self) -> usize {
        self.state.lock().unwrap().acquired
    }
}

impl Locker for MockLocker {
    type Guard = ();

    fn acquire(&self, dir: &Path) -> Result<(), LockError> {
        let mut state = self.state.lock().unwrap();
        if state.busy {
            return Err(LockError::Busy {
                lockfile: dir.join(LOCK_FILE),
            });
        }
        state.acquired += 1;
        Ok(())
    }
}

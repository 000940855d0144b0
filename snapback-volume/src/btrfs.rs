//! Copy-on-write subvolume operations.
//!
//! The contract mirrors `btrfs(8)`: subvolume creation, (read-only)
//! snapshots and subvolume deletion. Snapshot creation is atomic from the
//! caller's point of view: either the named directory fully exists, or it
//! does not exist at all.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Errors from subvolume operations.
#[derive(Debug, Error)]
pub enum BtrfsError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for the copy-on-write snapshot primitive.
pub trait Btrfs: Send + Sync {
    /// Whether `path` lives on a btrfs filesystem.
    fn is_btrfs(&self, path: &Path) -> bool;

    /// Create an empty subvolume at `path`.
    fn create_subvolume(&self, path: &Path) -> Result<(), BtrfsError>;

    /// Snapshot subvolume `source` at `dest`.
    fn snapshot(&self, source: &Path, dest: &Path, readonly: bool) -> Result<(), BtrfsError>;

    /// Delete the subvolume at `path`.
    fn delete_subvolume(&self, path: &Path) -> Result<(), BtrfsError>;

    /// Flush filesystem state at `path`, a btrfs-aware `sync`.
    fn filesystem_sync(&self, path: &Path) -> Result<(), BtrfsError>;
}

/// Real implementation shelling out to `btrfs(8)`.
///
/// Mutating operations are followed by `btrfs filesystem sync` so a
/// subsequent crash cannot roll back a reported success.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealBtrfs;

impl RealBtrfs {
    fn run(args: &[&str]) -> Result<(), BtrfsError> {
        let output = Command::new("btrfs").args(args).output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                BtrfsError::CommandNotFound("btrfs".to_string())
            } else {
                BtrfsError::Io(e)
            }
        })?;
        if !output.status.success() {
            return Err(BtrfsError::CommandFailed {
                command: format!("btrfs {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Btrfs for RealBtrfs {
    fn is_btrfs(&self, path: &Path) -> bool {
        Self::run(&["filesystem", "df", &path.to_string_lossy()]).is_ok()
    }

    fn create_subvolume(&self, path: &Path) -> Result<(), BtrfsError> {
        Self::run(&["subvolume", "create", &path.to_string_lossy()])?;
        self.filesystem_sync(path)
    }

    fn snapshot(&self, source: &Path, dest: &Path, readonly: bool) -> Result<(), BtrfsError> {
        let source = source.to_string_lossy();
        let dest = dest.to_string_lossy();
        let mut args = vec!["subvolume", "snapshot"];
        if readonly {
            args.push("-r");
        }
        args.push(&source);
        args.push(&dest);
        Self::run(&args)?;
        self.filesystem_sync(Path::new(dest.as_ref()))
    }

    fn delete_subvolume(&self, path: &Path) -> Result<(), BtrfsError> {
        Self::run(&["subvolume", "delete", &path.to_string_lossy()])?;
        if let Some(parent) = path.parent() {
            self.filesystem_sync(parent)?;
        }
        Ok(())
    }

    fn filesystem_sync(&self, path: &Path) -> Result<(), BtrfsError> {
        Self::run(&["filesystem", "sync", &path.to_string_lossy()])
    }
}

/// Mock implementation emulating subvolumes as plain directories.
///
/// Operates on the real filesystem (point it at a `tempfile` tree) so the
/// enumeration and staging logic under test runs unmodified. Records every
/// operation and supports failure injection per operation kind.
/// Cloning creates a new handle to the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MockBtrfs {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    ops: Vec<String>,
    not_btrfs: bool,
    fail_create: bool,
    fail_writable_snapshot: bool,
    fail_readonly_snapshot: bool,
    fail_delete_of: HashSet<PathBuf>,
}

impl MockBtrfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// All operations performed, in order, as `"op path"` strings.
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Make `is_btrfs` report false.
    pub fn set_not_btrfs(&self) {
        self.state.lock().unwrap().not_btrfs = true;
    }

    /// Make `create_subvolume` fail.
    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    /// Make writable snapshots (staging creation) fail.
    pub fn fail_writable_snapshot(&self) {
        self.state.lock().unwrap().fail_writable_snapshot = true;
    }

    /// Make read-only snapshots (the commit step) fail.
    pub fn fail_readonly_snapshot(&self) {
        self.state.lock().unwrap().fail_readonly_snapshot = true;
    }

    /// Make deletion of one specific path fail.
    pub fn fail_delete_of(&self, path: &Path) {
        self.state
            .lock()
            .unwrap()
            .fail_delete_of
            .insert(path.to_path_buf());
    }

    fn log(&self, op: &str, path: &Path) {
        self.state
            .lock()
            .unwrap()
            .ops
            .push(format!("{} {}", op, path.display()));
    }

    fn copy_tree(source: &Path, dest: &Path) -> io::Result<()> {
        fs::create_dir(dest)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            let target = dest.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                Self::copy_tree(&entry.path(), &target)?;
            } else {
                fs::copy(entry.path(), &target)?;
            }
        }
        Ok(())
    }
}

impl Btrfs for MockBtrfs {
    fn is_btrfs(&self, _path: &Path) -> bool {
        !self.state.lock().unwrap().not_btrfs
    }

    fn create_subvolume(&self, path: &Path) -> Result<(), BtrfsError> {
        if self.state.lock().unwrap().fail_create {
            return Err(BtrfsError::CommandFailed {
                command: format!("btrfs subvolume create {}", path.display()),
                stderr: "injected failure".to_string(),
            });
        }
        fs::create_dir(path)?;
        self.log("create", path);
        Ok(())
    }

    fn snapshot(&self, source: &Path, dest: &Path, readonly: bool) -> Result<(), BtrfsError> {
        let fail = {
            let state = self.state.lock().unwrap();
            if readonly {
                state.fail_readonly_snapshot
            } else {
                state.fail_writable_snapshot
            }
        };
        if fail {
            return Err(BtrfsError::CommandFailed {
                command: format!(
                    "btrfs subvolume snapshot{} {} {}",
                    if readonly { " -r" } else { "" },
                    source.display(),
                    dest.display()
                ),
                stderr: "injected failure".to_string(),
            });
        }
        Self::copy_tree(source, dest)?;
        self.log(if readonly { "snapshot-r" } else { "snapshot" }, dest);
        Ok(())
    }

    fn delete_subvolume(&self, path: &Path) -> Result<(), BtrfsError> {
        if self.state.lock().unwrap().fail_delete_of.contains(path) {
            return Err(BtrfsError::CommandFailed {
                command: format!("btrfs subvolume delete {}", path.display()),
                stderr: "injected failure".to_string(),
            });
        }
        fs::remove_dir_all(path)?;
        self.log("delete", path);
        Ok(())
    }

    fn filesystem_sync(&self, _path: &Path) -> Result<(), BtrfsError> {
        Ok(())
    }
}

//! Exit codes for the snapback CLI.
//!
//! Following Unix conventions: zero on success, a distinct code per error
//! class so cron wrappers can tell a busy target from real trouble.

use snapback_volume::{LockError, SyncError};

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Configuration error (missing file, unknown target, bad duration).
    pub const CONFIG_ERROR: i32 = 1;
    /// Backup dir missing, not a directory or not on btrfs.
    pub const BACKUP_DIR_ERROR: i32 = 2;
    /// Another process holds the target lock; retry later.
    pub const TARGET_BUSY: i32 = 3;
    /// Source path or host not reachable.
    pub const SOURCE_UNREACHABLE: i32 = 4;
    /// The sync tool reported failure; staging was discarded.
    pub const SYNC_FAILED: i32 = 5;
    /// External binary (btrfs, rsync, ssh) not found.
    pub const COMMAND_NOT_FOUND: i32 = 6;
    /// Subvolume operation failed.
    pub const BTRFS_ERROR: i32 = 7;
    /// Snapshot commit failed after a successful transfer.
    pub const COMMIT_FAILED: i32 = 8;
    /// One or more snapshot deletions failed; safe to retry.
    pub const DELETE_FAILED: i32 = 9;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::Volume(_) => codes::BACKUP_DIR_ERROR,
        CommandError::Lock(LockError::Busy { .. }) => codes::TARGET_BUSY,
        CommandError::Lock(LockError::Io { .. }) => codes::BACKUP_DIR_ERROR,
        CommandError::Sync(SyncError::SourceNotReachable(_)) => codes::SOURCE_UNREACHABLE,
        CommandError::Sync(SyncError::CommandNotFound(_)) => codes::COMMAND_NOT_FOUND,
        CommandError::Sync(_) => codes::SYNC_FAILED,
        CommandError::Btrfs(snapback_volume::BtrfsError::CommandNotFound(_)) => {
            codes::COMMAND_NOT_FOUND
        }
        CommandError::Btrfs(_) => codes::BTRFS_ERROR,
        CommandError::Commit { .. } => codes::COMMIT_FAILED,
        CommandError::CreateRoot { .. } | CommandError::RemoveRoot { .. } => {
            codes::BACKUP_DIR_ERROR
        }
    }
}

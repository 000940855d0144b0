//! Lifecycle command orchestration.
//!
//! One `execute_*` function per action (setup, backup, list, prune,
//! decay, destroy, clean), each generic over the external collaborators
//! (clock, btrfs, sync tool, lock, prompt, logger) so orchestration is
//! testable against mocks. Every invocation starts and ends idle; all
//! state lives on the filesystem and is re-derived per call.

pub mod backup;
pub mod clean;
pub mod decay;
pub mod destroy;
pub mod list;
pub mod prune;
pub mod setup;

pub use backup::{execute_backup, BackupOptions, BackupOutcome};
pub use clean::execute_clean;
pub use decay::{execute_decay, DecayOutcome};
pub use destroy::{execute_destroy, DestroyOutcome};
pub use list::{execute_list, humanize_age, ListEntry};
pub use prune::{execute_prune, PruneOutcome};
pub use setup::execute_setup;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use snapback_snapshot::SnapshotName;
use snapback_volume::{Btrfs, BtrfsError, LockError, SyncError, Volume, VolumeError};

use crate::logger::Logger;
use crate::prompt::Prompt;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("backup dir error: {0}")]
    Volume(#[from] VolumeError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("btrfs error: {0}")]
    Btrfs(#[from] BtrfsError),

    #[error("commit failed for `{path}`: {source}")]
    Commit { path: PathBuf, source: BtrfsError },

    #[error("cannot create backup dir `{path}`: {source}")]
    CreateRoot { path: PathBuf, source: io::Error },

    #[error("cannot remove backup dir `{path}`: {source}")]
    RemoveRoot { path: PathBuf, source: io::Error },
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;

/// Result of applying a batch of snapshot deletions.
///
/// Deletions are independent: one failure is recorded and the rest of the
/// batch proceeds, so the operation reports partial success and can simply
/// be re-run.
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// Snapshots deleted (or already absent, which counts as deleted).
    pub deleted: Vec<SnapshotName>,
    /// Snapshots kept because the prompt declined.
    pub skipped: Vec<SnapshotName>,
    /// Snapshots whose deletion failed.
    pub failed: Vec<(SnapshotName, BtrfsError)>,
}

impl DeletionReport {
    /// Whether every attempted deletion succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete `names` from `volume`, oldest first, confirming each via `prompt`.
pub(crate) fn apply_deletions<B, P, L>(
    volume: &Volume,
    names: &[SnapshotName],
    btrfs: &B,
    prompt: &P,
    logger: &L,
) -> DeletionReport
where
    B: Btrfs,
    P: Prompt,
    L: Logger,
{
    let mut report = DeletionReport::default();
    for name in names {
        let path = volume.snapshot_path(name);
        if !path.exists() {
            // Gone already, e.g. a retried pass after partial failure.
            logger.verbose(&format!("snapshot {name} already absent"));
            report.deleted.push(*name);
            continue;
        }
        if !prompt.confirm(&format!("delete snapshot {name}")) {
            report.skipped.push(*name);
            continue;
        }
        match btrfs.delete_subvolume(&path) {
            Ok(()) => {
                logger.verbose(&format!("deleted snapshot {name}"));
                report.deleted.push(*name);
            }
            Err(e) => {
                logger.info(&format!("failed to delete snapshot {name}: {e}"));
                report.failed.push((*name, e));
            }
        }
    }
    report
}

/// Discard the staging directory of `volume` if one exists.
pub(crate) fn discard_staging<B, L>(
    volume: &Volume,
    btrfs: &B,
    logger: &L,
) -> Result<bool, BtrfsError>
where
    B: Btrfs,
    L: Logger,
{
    if !volume.has_staging() {
        return Ok(false);
    }
    let staging = volume.staging_path();
    btrfs.delete_subvolume(&staging)?;
    logger.verbose(&format!("discarded staging dir {}", staging.display()));
    Ok(true)
}

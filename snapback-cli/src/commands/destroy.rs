//! Destroy command: delete every snapshot and the backup root itself.

use std::fs;

use snapback_volume::{Btrfs, Locker, Volume};

use crate::config::TargetConfig;
use crate::logger::Logger;
use crate::prompt::Prompt;

use super::{apply_deletions, discard_staging, CommandError, CommandResult, DeletionReport};

/// Result of a destroy pass.
#[derive(Debug, Default)]
pub struct DestroyOutcome {
    pub report: DeletionReport,
    /// Whether the backup root itself was removed. Only done after every
    /// snapshot was deleted; a partial pass leaves the root in place.
    pub root_removed: bool,
}

/// Execute the destroy command. Irreversible.
pub fn execute_destroy<B, K, P, L>(
    target: &TargetConfig,
    btrfs: &B,
    locker: &K,
    prompt: &P,
    logger: &L,
) -> CommandResult<DestroyOutcome>
where
    B: Btrfs,
    K: Locker,
    P: Prompt,
    L: Logger,
{
    let volume = Volume::open_btrfs(&target.backups, btrfs)?;
    let report = {
        let _guard = locker.acquire(volume.path())?;
        discard_staging(&volume, btrfs, logger)?;
        let set = volume.snapshots()?;
        let names: Vec<_> = set.iter().copied().collect();
        apply_deletions(&volume, &names, btrfs, prompt, logger)
    };

    // The lockfile lives inside the root, so the guard must be gone before
    // the root can be removed.
    let complete = report.is_clean() && report.skipped.is_empty();
    if !complete {
        logger.info("backup dir not removed, deletions incomplete");
        return Ok(DestroyOutcome {
            report,
            root_removed: false,
        });
    }

    fs::remove_dir(volume.path()).map_err(|source| CommandError::RemoveRoot {
        path: volume.path().to_path_buf(),
        source,
    })?;
    logger.info(&format!("backup dir {} removed", volume.path().display()));
    Ok(DestroyOutcome {
        report,
        root_removed: true,
    })
}

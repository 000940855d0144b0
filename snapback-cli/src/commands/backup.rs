//! Backup command: incremental copy into staging, then atomic commit.
//!
//! The staging directory is per-invocation: it is created as a writable
//! snapshot of the latest committed snapshot (so unchanged files share
//! extents and rsync only transfers deltas), populated by the sync tool,
//! and either committed as a new read-only snapshot or discarded. Staging
//! never survives past the lock: any failure, and any stale staging left
//! by a crashed run, is cleaned up before other work happens.

use snapback_clock::Clock;
use snapback_snapshot::SnapshotName;
use snapback_volume::{Btrfs, Locker, SyncOptions, Syncer, Volume};

use crate::config::TargetConfig;
use crate::logger::Logger;
use crate::prompt::AlwaysYes;

use super::decay::execute_decay;
use super::prune::execute_prune;
use super::{discard_staging, CommandError, CommandResult, DeletionReport};

/// Options for one backup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupOptions {
    /// Verify transfer by checksum instead of size and modification time.
    pub checksum: bool,
    /// Run the sync tool in dry-run mode; nothing is committed.
    pub dry_run: bool,
    /// Stream sync tool output to the terminal.
    pub progress: bool,
}

/// Result of a backup run.
#[derive(Debug, Default)]
pub struct BackupOutcome {
    /// The committed snapshot, or `None` on a dry run.
    pub snapshot: Option<SnapshotName>,
    /// Deletions performed by autodecay, when configured.
    pub decayed: Option<DeletionReport>,
    /// Deletions performed by autoprune, when configured.
    pub pruned: Option<DeletionReport>,
}

/// Execute the backup command.
pub fn execute_backup<B, S, C, K, L>(
    target: &TargetConfig,
    options: &BackupOptions,
    btrfs: &B,
    syncer: &S,
    clock: &C,
    locker: &K,
    logger: &L,
) -> CommandResult<BackupOutcome>
where
    B: Btrfs,
    S: Syncer,
    C: Clock,
    K: Locker,
    L: Logger,
{
    syncer.check_source(&target.source)?;
    let volume = Volume::open_btrfs(&target.backups, btrfs)?;

    let committed = {
        let _guard = locker.acquire(volume.path())?;

        // A staging dir present before we created one is debris from a
        // crashed run; the lock guarantees no live owner.
        discard_staging(&volume, btrfs, logger)?;

        let set = volume.snapshots()?;
        let staging = volume.staging_path();
        match set.latest() {
            Some(base) => {
                logger.verbose(&format!("staging from base snapshot {base}"));
                btrfs.snapshot(&volume.snapshot_path(base), &staging, false)?;
            }
            None => {
                logger.verbose("no snapshots yet, creating empty staging subvolume");
                btrfs.create_subvolume(&staging)?;
            }
        }

        let sync_options = SyncOptions {
            ignore: target.ignore.clone(),
            checksum: options.checksum,
            dry_run: options.dry_run,
            progress: options.progress,
        };
        if let Err(e) = syncer.sync(&target.source, &staging, &sync_options) {
            cleanup_staging(&volume, btrfs, logger);
            return Err(e.into());
        }

        if options.dry_run {
            discard_staging(&volume, btrfs, logger)?;
            logger.info("dry run, nothing committed");
            None
        } else {
            let name = SnapshotName::unique_after(SnapshotName::now(clock), set.latest());
            let dest = volume.snapshot_path(&name);
            if let Err(e) = btrfs.snapshot(&staging, &dest, true) {
                cleanup_staging(&volume, btrfs, logger);
                return Err(CommandError::Commit {
                    path: dest,
                    source: e,
                });
            }
            // The snapshot is committed; a staging dir that refuses to go
            // away must not fail the backup.
            cleanup_staging(&volume, btrfs, logger);
            logger.info(&format!("snapshot {name} committed"));
            Some(name)
        }
    };

    let mut outcome = BackupOutcome {
        snapshot: committed,
        ..Default::default()
    };
    if committed.is_some() {
        if target.autodecay {
            match execute_decay(target, btrfs, clock, locker, &AlwaysYes, logger) {
                Ok(o) => outcome.decayed = Some(o.report),
                Err(e) => logger.info(&format!("autodecay failed: {e}")),
            }
        }
        if target.autoprune {
            match execute_prune(target, btrfs, clock, locker, &AlwaysYes, logger) {
                Ok(o) => outcome.pruned = Some(o.report),
                Err(e) => logger.info(&format!("autoprune failed: {e}")),
            }
        }
    }
    Ok(outcome)
}

fn cleanup_staging<B: Btrfs, L: Logger>(volume: &Volume, btrfs: &B, logger: &L) {
    if let Err(e) = discard_staging(volume, btrfs, logger) {
        logger.info(&format!("could not discard staging dir: {e}"));
    }
}

//! Clean command: remove a leftover staging directory.

use snapback_volume::{Btrfs, Locker, Volume};

use crate::config::TargetConfig;
use crate::logger::Logger;

use super::{discard_staging, CommandResult};

/// Execute the clean command.
///
/// Returns whether a staging directory was actually removed. Snapshots
/// are never touched.
pub fn execute_clean<B, K, L>(
    target: &TargetConfig,
    btrfs: &B,
    locker: &K,
    logger: &L,
) -> CommandResult<bool>
where
    B: Btrfs,
    K: Locker,
    L: Logger,
{
    let volume = Volume::open_btrfs(&target.backups, btrfs)?;
    let _guard = locker.acquire(volume.path())?;
    let removed = discard_staging(&volume, btrfs, logger)?;
    if !removed {
        logger.info("no staging dir to clean");
    }
    Ok(removed)
}

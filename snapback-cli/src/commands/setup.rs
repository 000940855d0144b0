//! Setup command: create the backup root for a target.

use std::fs;

use snapback_volume::{Btrfs, Locker, VolumeError};

use crate::config::TargetConfig;
use crate::logger::Logger;

use super::{CommandError, CommandResult};

/// Create the backup root if needed and verify it lives on btrfs.
///
/// Idempotent: safe to call on an already-initialized target. The first
/// `backup` call establishes the snapshot baseline; there is nothing else
/// to do here.
pub fn execute_setup<B, K, L>(
    target: &TargetConfig,
    btrfs: &B,
    locker: &K,
    logger: &L,
) -> CommandResult<()>
where
    B: Btrfs,
    K: Locker,
    L: Logger,
{
    fs::create_dir_all(&target.backups).map_err(|source| CommandError::CreateRoot {
        path: target.backups.clone(),
        source,
    })?;
    let _guard = locker.acquire(&target.backups)?;
    if !btrfs.is_btrfs(&target.backups) {
        return Err(VolumeError::NotBtrfs(target.backups.clone()).into());
    }
    logger.info(&format!("backup dir {} ready", target.backups.display()));
    Ok(())
}

//! Prune command: apply the tiered retention policy.

use snapback_clock::Clock;
use snapback_retention::prune_decision;
use snapback_volume::{Btrfs, Locker, Volume};

use crate::config::TargetConfig;
use crate::logger::Logger;
use crate::prompt::Prompt;

use super::{apply_deletions, CommandResult, DeletionReport};

/// Result of a prune pass.
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Snapshots held by the retention policy.
    pub kept: usize,
    pub report: DeletionReport,
}

/// Execute the prune command.
///
/// The keep-set is computed under the lock from a fresh listing, then
/// applied as a batch of independent deletions; a single failed deletion
/// is reported and skipped, not fatal.
pub fn execute_prune<B, C, K, P, L>(
    target: &TargetConfig,
    btrfs: &B,
    clock: &C,
    locker: &K,
    prompt: &P,
    logger: &L,
) -> CommandResult<PruneOutcome>
where
    B: Btrfs,
    C: Clock,
    K: Locker,
    P: Prompt,
    L: Logger,
{
    let volume = Volume::open_btrfs(&target.backups, btrfs)?;
    let _guard = locker.acquire(volume.path())?;

    let set = volume.snapshots()?;
    let decision = prune_decision(&set, clock.now(), &target.retention());
    let to_delete: Vec<_> = decision.to_delete().copied().collect();
    logger.verbose(&format!(
        "prune: keeping {} of {} snapshots",
        decision.keep_count(),
        set.len()
    ));

    let report = apply_deletions(&volume, &to_delete, btrfs, prompt, logger);
    Ok(PruneOutcome {
        kept: decision.keep_count(),
        report,
    })
}

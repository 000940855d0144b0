//! Decay command: hard age cutoff for the long weekly tail.

use snapback_clock::Clock;
use snapback_retention::decay_decision;
use snapback_volume::{Btrfs, Locker, Volume};

use crate::config::TargetConfig;
use crate::logger::Logger;
use crate::prompt::Prompt;

use super::{apply_deletions, CommandResult, DeletionReport};

/// Result of a decay pass.
#[derive(Debug, Default)]
pub struct DecayOutcome {
    /// Snapshots within the decay window (or all, when decay is unset).
    pub kept: usize,
    pub report: DeletionReport,
}

/// Execute the decay command.
///
/// A no-op when the target has no `decay` duration configured.
pub fn execute_decay<B, C, K, P, L>(
    target: &TargetConfig,
    btrfs: &B,
    clock: &C,
    locker: &K,
    prompt: &P,
    logger: &L,
) -> CommandResult<DecayOutcome>
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
    if target.decay.is_none() {
        logger.info("decay not configured for this target, keeping everything");
        return Ok(DecayOutcome {
            kept: set.len(),
            report: DeletionReport::default(),
        });
    }

    let decision = decay_decision(&set, clock.now(), target.decay);
    let to_delete: Vec<_> = decision.to_delete().copied().collect();
    logger.verbose(&format!(
        "decay: keeping {} of {} snapshots",
        decision.keep_count(),
        set.len()
    ));

    let report = apply_deletions(&volume, &to_delete, btrfs, prompt, logger);
    Ok(DecayOutcome {
        kept: decision.keep_count(),
        report,
    })
}

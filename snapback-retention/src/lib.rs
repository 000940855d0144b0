//! Retention policy engine for snapback.
//!
//! Two pure algorithms over a [`SnapshotSet`] and a reference instant:
//!
//! - `prune`: tiered keep-set: the latest snapshot always, everything
//!   inside the `retain_all` window, one snapshot per calendar day inside
//!   the `retain_daily` window, one snapshot per ISO week beyond it.
//! - `decay`: hard age cutoff that eventually removes the weekly tail.
//!
//! Both produce a [`RetentionDecision`], a batch of per-snapshot keep or
//! delete verdicts. Decisions are derived from snapshot names alone, so
//! re-running against the same filesystem state always yields the same
//! result.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use snapback_snapshot::{SnapshotName, SnapshotSet};

/// Per-target retention windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionParams {
    /// Every snapshot younger than this is kept.
    pub retain_all: TimeDelta,
    /// One snapshot per calendar day is kept for days younger than this.
    pub retain_daily: TimeDelta,
}

/// Why a snapshot survives a pruning pass.
///
/// When several rules apply, the highest-priority one is reported:
/// `Latest` > `Recent` > `Daily` > `Weekly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    /// The single most recent snapshot, kept unconditionally.
    Latest,
    /// Inside the all-retention (or decay) window.
    Recent,
    /// Latest snapshot of its calendar day inside the daily window.
    Daily,
    /// Latest snapshot of its ISO week beyond the daily window.
    Weekly,
}

impl fmt::Display for KeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeepReason::Latest => "latest",
            KeepReason::Recent => "recent",
            KeepReason::Daily => "daily",
            KeepReason::Weekly => "weekly",
        };
        f.write_str(s)
    }
}

/// Keep/delete verdict for every snapshot of one target, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionDecision {
    entries: Vec<(SnapshotName, Option<KeepReason>)>,
}

impl RetentionDecision {
    /// All verdicts, oldest snapshot first. `None` means delete.
    pub fn entries(&self) -> &[(SnapshotName, Option<KeepReason>)] {
        &self.entries
    }

    /// Snapshots marked for deletion, oldest first.
    pub fn to_delete(&self) -> impl Iterator<Item = &SnapshotName> {
        self.entries
            .iter()
            .filter(|(_, reason)| reason.is_none())
            .map(|(name, _)| name)
    }

    /// Snapshots that survive, oldest first.
    pub fn kept(&self) -> impl Iterator<Item = &SnapshotName> {
        self.entries
            .iter()
            .filter(|(_, reason)| reason.is_some())
            .map(|(name, _)| name)
    }

    pub fn is_kept(&self, name: &SnapshotName) -> bool {
        self.reason(name).is_some()
    }

    /// Why `name` is kept, or `None` if it is marked for deletion.
    pub fn reason(&self, name: &SnapshotName) -> Option<KeepReason> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, reason)| *reason)
    }

    pub fn keep_count(&self) -> usize {
        self.kept().count()
    }

    pub fn delete_count(&self) -> usize {
        self.to_delete().count()
    }
}

/// Compute the `prune` keep-set.
///
/// The keep-set is the union of four independently evaluated groups; a
/// snapshot kept by any rule is kept:
///
/// 1. the single most recent snapshot, unconditionally;
/// 2. every snapshot whose age is at most `retain_all`;
/// 3. per calendar day inside the `retain_daily` window, the latest
///    snapshot of that day;
/// 4. per ISO week beyond the `retain_daily` window, the latest snapshot
///    of that week, with no upper bound on age.
pub fn prune_decision(
    set: &SnapshotSet,
    now: DateTime<Utc>,
    params: &RetentionParams,
) -> RetentionDecision {
    let latest = set.latest().copied();

    // Latest snapshot per calendar day, daily window only.
    let mut daily_keepers: BTreeMap<_, SnapshotName> = BTreeMap::new();
    for name in set {
        if name.age(now) <= params.retain_daily {
            daily_keepers
                .entry(name.day_key())
                .and_modify(|keeper| *keeper = (*keeper).max(*name))
                .or_insert(*name);
        }
    }

    // Latest snapshot per ISO week, beyond the daily window only.
    let mut weekly_keepers: BTreeMap<_, SnapshotName> = BTreeMap::new();
    for name in set {
        if name.age(now) > params.retain_daily {
            weekly_keepers
                .entry(name.week_key())
                .and_modify(|keeper| *keeper = (*keeper).max(*name))
                .or_insert(*name);
        }
    }

    let entries = set
        .iter()
        .map(|name| {
            let reason = if Some(*name) == latest {
                Some(KeepReason::Latest)
            } else if name.age(now) <= params.retain_all {
                Some(KeepReason::Recent)
            } else if daily_keepers.get(&name.day_key()) == Some(name) {
                Some(KeepReason::Daily)
            } else if weekly_keepers.get(&name.week_key()) == Some(name) {
                Some(KeepReason::Weekly)
            } else {
                None
            };
            (*name, reason)
        })
        .collect();

    RetentionDecision { entries }
}

/// Compute the `decay` keep-set: everything with age at most `decay`.
///
/// If no snapshot qualifies and the set is non-empty, the latest snapshot
/// is exempted; an automated policy must never leave a target with zero
/// snapshots. `decay = None` means decay is not configured for this
/// target and everything is kept.
pub fn decay_decision(
    set: &SnapshotSet,
    now: DateTime<Utc>,
    decay: Option<TimeDelta>,
) -> RetentionDecision {
    let Some(decay) = decay else {
        return RetentionDecision {
            entries: set
                .iter()
                .map(|name| (*name, Some(KeepReason::Recent)))
                .collect(),
        };
    };

    let mut entries: Vec<(SnapshotName, Option<KeepReason>)> = set
        .iter()
        .map(|name| {
            let reason = (name.age(now) <= decay).then_some(KeepReason::Recent);
            (*name, reason)
        })
        .collect();

    if entries.iter().all(|(_, reason)| reason.is_none()) {
        if let Some((_, reason)) = entries.last_mut() {
            *reason = Some(KeepReason::Latest);
        }
    }

    RetentionDecision { entries }
}

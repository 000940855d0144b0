//! List command: ordered, annotated view of a target's snapshots.

use chrono::TimeDelta;
use std::time::Duration;

use snapback_clock::Clock;
use snapback_retention::{decay_decision, prune_decision, KeepReason};
use snapback_snapshot::SnapshotName;
use snapback_volume::Volume;

use crate::config::TargetConfig;

use super::CommandResult;

/// One row of `list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: SnapshotName,
    pub age: TimeDelta,
    /// Why prune would keep this snapshot; `None` marks a prune candidate.
    pub reason: Option<KeepReason>,
    /// Whether decay would delete this snapshot.
    pub decay_candidate: bool,
}

/// Execute the list command.
///
/// Runs without the lock: listing is read-only and a slightly stale view
/// under concurrent mutation is acceptable.
pub fn execute_list<C: Clock>(target: &TargetConfig, clock: &C) -> CommandResult<Vec<ListEntry>> {
    let volume = Volume::open(&target.backups)?;
    let set = volume.snapshots()?;
    let now = clock.now();
    let prune = prune_decision(&set, now, &target.retention());
    let decay = decay_decision(&set, now, target.decay);

    Ok(set
        .iter()
        .map(|name| ListEntry {
            name: *name,
            age: name.age(now),
            reason: prune.reason(name),
            decay_candidate: !decay.is_kept(name),
        })
        .collect())
}

/// Coarse human-readable age, e.g. `"3days 4h"`.
pub fn humanize_age(age: TimeDelta) -> String {
    let secs = age.num_seconds().max(0) as u64;
    let rounded = if secs >= 86400 {
        secs - secs % 3600
    } else if secs >= 3600 {
        secs - secs % 60
    } else {
        secs
    };
    humantime::format_duration(Duration::from_secs(rounded)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::target_at;
    use crate::commands::CommandError;
    use snapback_clock::MockClock;
    use std::fs;
    use tempfile::tempdir;

    // 2024-03-01 00:00:00 UTC
    const NOW: i64 = 1709251200;

    #[test]
    fn test_list_empty_target() {
        let dir = tempdir().expect("tempdir");
        let target = target_at("/data", dir.path());

        let entries = execute_list(&target, &MockClock::at_unix(NOW)).expect("list");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_list_missing_backup_dir() {
        let dir = tempdir().expect("tempdir");
        let target = target_at("/data", &dir.path().join("nope"));

        let result = execute_list(&target, &MockClock::at_unix(NOW));
        assert!(matches!(result, Err(CommandError::Volume(_))));
    }

    #[test]
    fn test_list_ordered_and_annotated() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir(root.join("20240225T060000.000")).expect("mkdir");
        fs::create_dir(root.join("20240225T180000.000")).expect("mkdir");
        fs::create_dir(root.join("20240301T000000.000")).expect("mkdir");

        let target = target_at("/data", root);
        let entries = execute_list(&target, &MockClock::at_unix(NOW)).expect("list");

        assert_eq!(entries.len(), 3);
        // Oldest first.
        assert_eq!(entries[0].name.to_string(), "20240225T060000.000");
        // Superseded within its day: prune candidate.
        assert_eq!(entries[0].reason, None);
        // Day keeper.
        assert_eq!(entries[1].reason, Some(KeepReason::Daily));
        // Latest.
        assert_eq!(entries[2].reason, Some(KeepReason::Latest));
        assert_eq!(entries[2].age, TimeDelta::zero());
        // No decay configured: nothing is a decay candidate.
        assert!(entries.iter().all(|e| !e.decay_candidate));
    }

    #[test]
    fn test_list_marks_decay_candidates() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir(root.join("20200101T000000.000")).expect("mkdir");
        fs::create_dir(root.join("20240229T000000.000")).expect("mkdir");

        let mut target = target_at("/data", root);
        target.decay = Some(TimeDelta::days(365));

        let entries = execute_list(&target, &MockClock::at_unix(NOW)).expect("list");
        assert!(entries[0].decay_candidate);
        assert!(!entries[1].decay_candidate);
    }

    #[test]
    fn test_humanize_age() {
        assert_eq!(humanize_age(TimeDelta::seconds(42)), "42s");
        assert_eq!(humanize_age(TimeDelta::minutes(90) + TimeDelta::seconds(5)), "1h 30m");
        assert_eq!(humanize_age(TimeDelta::days(3) + TimeDelta::hours(4)), "3days 4h");
        assert_eq!(humanize_age(TimeDelta::zero()), "0s");
        // Future timestamps clamp to zero.
        assert_eq!(humanize_age(TimeDelta::seconds(-5)), "0s");
    }
}

//! Timestamp-based snapshot names.
//!
//! A snapshot directory is named after the UTC instant it was committed,
//! in a fixed-width format chosen so that lexicographic order equals
//! chronological order: a plain directory listing is already sorted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;

use snapback_clock::Clock;

/// Fixed name format: `YYYYMMDD` `T` `HHMMSS` `.` `mmm`, always UTC.
const NAME_FORMAT: &str = "%Y%m%dT%H%M%S%.3f";

/// Fixed serialized width of a snapshot name.
const NAME_WIDTH: usize = 19;

/// Errors from parsing snapshot names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("not a snapshot name: `{0}`")]
    InvalidFormat(String),
}

/// The timestamp-based identifier of one snapshot.
///
/// Millisecond precision, UTC. Total order is chronological order, which
/// coincides with lexicographic order of the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotName {
    instant: DateTime<Utc>,
}

impl SnapshotName {
    /// Capture the current time from `clock`, truncated to milliseconds.
    pub fn now<C: Clock>(clock: &C) -> Self {
        Self::from_instant(clock.now())
    }

    /// Build a name from an instant, truncating to millisecond precision.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        let millis = instant.timestamp_millis();
        Self {
            instant: DateTime::from_timestamp_millis(millis)
                .expect("millisecond truncation stays in range"),
        }
    }

    /// Make `candidate` strictly newer than `latest`.
    ///
    /// Two rapid invocations (or a coarse clock) can produce a name equal
    /// to or older than the newest existing snapshot; the name is bumped
    /// millisecond by millisecond until it sorts after it.
    pub fn unique_after(candidate: Self, latest: Option<&Self>) -> Self {
        match latest {
            Some(latest) if candidate <= *latest => Self {
                instant: latest.instant + TimeDelta::milliseconds(1),
            },
            _ => candidate,
        }
    }

    /// Strictly parse a directory-entry name.
    ///
    /// Anything that is not exactly the fixed-width format is rejected, so
    /// callers can skip foreign files living next to snapshots.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        if s.len() != NAME_WIDTH {
            return Err(NameError::InvalidFormat(s.to_string()));
        }
        let naive = NaiveDateTime::parse_from_str(s, NAME_FORMAT)
            .map_err(|_| NameError::InvalidFormat(s.to_string()))?;
        Ok(Self {
            instant: naive.and_utc(),
        })
    }

    /// The committed instant this name encodes.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Age relative to `now`. A timestamp in the future yields zero.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.instant).max(TimeDelta::zero())
    }

    /// Calendar day this snapshot belongs to (UTC).
    pub fn day_key(&self) -> NaiveDate {
        self.instant.date_naive()
    }

    /// ISO calendar week this snapshot belongs to, as `(year, week)`.
    pub fn week_key(&self) -> (i32, u32) {
        let week = self.instant.iso_week();
        (week.year(), week.week())
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instant.format(NAME_FORMAT))
    }
}

impl FromStr for SnapshotName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

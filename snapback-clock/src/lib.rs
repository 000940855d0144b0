//! Clock abstraction for snapback.
//!
//! Provides a trait for getting the current time, with both real and mock
//! implementations to enable deterministic testing of retention decisions.

use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};

/// Trait for getting the current time.
pub trait Clock: Send + Sync {
    /// Returns the current UTC instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for testing with a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    instant: DateTime<Utc>,
}

impl MockClock {
    /// Create a mock clock with a fixed instant.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Create a mock clock from unix seconds.
    pub fn at_unix(secs: i64) -> Self {
        Self {
            instant: DateTime::from_timestamp(secs, 0).expect("valid unix timestamp"),
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Mock clock that advances by a fixed step on each call.
///
/// Useful when a single operation reads the clock more than once and the
/// test needs distinct instants.
#[derive(Debug)]
pub struct AdvancingClock {
    instant: Mutex<DateTime<Utc>>,
    step: TimeDelta,
}

impl AdvancingClock {
    /// Create an advancing clock starting at `instant` and stepping by `step` each call.
    pub fn new(instant: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            instant: Mutex::new(instant),
            step,
        }
    }
}

impl Clock for AdvancingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut instant = self.instant.lock().expect("clock mutex poisoned");
        let current = *instant;
        *instant = current + self.step;
        current
    }
}

//! Wall-clock time source.
//!
//! The clock state never reads the system clock itself; callers pass a
//! [`WallTime`] obtained from a [`WallClock`]. Readings are local time.

use chrono::{Local, Timelike};
use clock_common::snapshot::{DAY_HOURS, MINUTES_PER_HOUR, SECONDS_PER_MINUTE};
use serde::{Deserialize, Serialize};

/// Time of day on a 24-hour wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WallTime {
    /// Hour (0..23).
    pub hour: u32,
    /// Minute (0..59).
    pub minute: u32,
    /// Second (0..59).
    pub second: u32,
}

impl WallTime {
    /// Build a wall time, or `None` if any field is out of range.
    #[must_use]
    pub fn new(hour: u32, minute: u32, second: u32) -> Option<Self> {
        (hour < DAY_HOURS && minute < MINUTES_PER_HOUR && second < SECONDS_PER_MINUTE).then_some(
            Self {
                hour,
                minute,
                second,
            },
        )
    }

    /// Time of day of any chrono time value. Leap seconds read as 59.
    #[must_use]
    pub fn from_timelike(t: &impl Timelike) -> Self {
        Self {
            hour: t.hour(),
            minute: t.minute(),
            second: t.second(),
        }
    }
}

impl std::fmt::Display for WallTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Source of the current wall-clock time.
pub trait WallClock: Send + Sync {
    /// Current time of day.
    fn now(&self) -> WallTime;
}

/// System clock in the host's local timezone, wrapping chrono.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> WallTime {
        WallTime::from_timelike(&Local::now())
    }
}

/// Clock frozen at a fixed time, for tests and replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWallClock(pub WallTime);

impl WallClock for FixedWallClock {
    fn now(&self) -> WallTime {
        self.0
    }
}

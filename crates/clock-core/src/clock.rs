//! Clock state: three cyclic counters, the tick cascade, hand angles, and the alarm.
//!
//! Setters follow an ignore-invalid-input policy: an out-of-range argument
//! leaves the state exactly as it was. Each setter also returns a result so
//! callers that care can tell "applied" from "rejected".

use crate::counter::CyclicCounter;
use crate::time::WallTime;
use clock_common::error::{ClockError, ClockResult};
use clock_common::snapshot::{
    ClockSnapshot, Command, DAY_HOURS, DIAL_HOURS, MINUTES_PER_HOUR, SECONDS_PER_MINUTE,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use tracing::{debug, trace};

const fn nonzero(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(m) => m,
        None => panic!("modulus must be non-zero"),
    }
}

const HOUR_MODULUS: NonZeroU32 = nonzero(DIAL_HOURS);
const MINUTE_MODULUS: NonZeroU32 = nonzero(MINUTES_PER_HOUR);
const SECOND_MODULUS: NonZeroU32 = nonzero(SECONDS_PER_MINUTE);

/// Hand angles in degrees, clockwise from 12, each in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandAngles {
    /// Hour hand.
    pub hour: f64,
    /// Minute hand.
    pub minute: f64,
    /// Second hand.
    pub second: f64,
}

/// Alarm time on a 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmTime {
    /// Hour (0..23).
    pub hour: u32,
    /// Minute (0..59).
    pub minute: u32,
}

/// Simulated analog clock.
///
/// # Example
///
/// ```
/// use clock_core::clock::ClockState;
///
/// let mut clock = ClockState::new();
/// clock.set_time(11, 59, 59).unwrap();
/// clock.tick();
/// assert_eq!(clock.time(), (0, 0, 0));
///
/// clock.set_time(6, 0, 0).unwrap();
/// assert_eq!(clock.derive_angles().hour, 180.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClockState {
    hours: CyclicCounter,
    minutes: CyclicCounter,
    seconds: CyclicCounter,
    alarm: Option<AlarmTime>,
    alarm_active: bool,
}

impl Default for ClockState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockState {
    /// Create a clock at 12:00:00 with no alarm.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hours: CyclicCounter::with_modulus(HOUR_MODULUS),
            minutes: CyclicCounter::with_modulus(MINUTE_MODULUS),
            seconds: CyclicCounter::with_modulus(SECOND_MODULUS),
            alarm: None,
            alarm_active: false,
        }
    }

    /// Current `(hour, minute, second)` with the hour on the dial (0..11).
    #[must_use]
    pub fn time(&self) -> (u32, u32, u32) {
        (
            self.hours.value(),
            self.minutes.value(),
            self.seconds.value(),
        )
    }

    /// Configured alarm time, if one was ever set.
    #[must_use]
    pub fn alarm(&self) -> Option<AlarmTime> {
        self.alarm
    }

    /// Whether the alarm is armed.
    #[must_use]
    pub fn is_alarm_active(&self) -> bool {
        self.alarm_active
    }

    /// Assign the counters from a wall-clock reading, folding the hour onto the dial.
    pub fn set_current_time(&mut self, now: WallTime) {
        // WallTime fields are already in range, so none of these can be rejected.
        let _ = self.hours.set_value(now.hour % DIAL_HOURS);
        let _ = self.minutes.set_value(now.minute % MINUTES_PER_HOUR);
        let _ = self.seconds.set_value(now.second % SECONDS_PER_MINUTE);
    }

    /// Set the displayed time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] if any field is out of range, in
    /// which case none of the counters change.
    pub fn set_time(&mut self, hour12: u32, minute: u32, second: u32) -> ClockResult<()> {
        check("hour", hour12, DIAL_HOURS)?;
        check("minute", minute, MINUTES_PER_HOUR)?;
        check("second", second, SECONDS_PER_MINUTE)?;
        self.hours.set_value(hour12)?;
        self.minutes.set_value(minute)?;
        self.seconds.set_value(second)?;
        Ok(())
    }

    /// Store and arm the alarm.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] if either field is out of range; the
    /// previous alarm configuration is kept.
    pub fn set_alarm(&mut self, hour24: u32, minute: u32) -> ClockResult<()> {
        check("hour", hour24, DAY_HOURS)?;
        check("minute", minute, MINUTES_PER_HOUR)?;
        self.alarm = Some(AlarmTime {
            hour: hour24,
            minute,
        });
        self.alarm_active = true;
        Ok(())
    }

    /// Disarm the alarm. The stored time is kept.
    pub fn deactivate_alarm(&mut self) {
        self.alarm_active = false;
    }

    /// True iff the alarm is armed and set for `now_hour24:now_minute`.
    #[must_use]
    pub fn check_alarm(&self, now_hour24: u32, now_minute: u32) -> bool {
        self.alarm_active
            && self
                .alarm
                .is_some_and(|a| a.hour == now_hour24 && a.minute == now_minute)
    }

    /// Advance one second.
    ///
    /// Minutes move only when seconds wrap; hours move only when seconds and
    /// minutes wrap on the same tick.
    pub fn tick(&mut self) {
        self.seconds.advance(1);
        if self.seconds.is_at_origin() {
            self.minutes.advance(1);
            if self.minutes.is_at_origin() {
                self.hours.advance(1);
            }
        }
        trace!(time = ?self.time(), "Tick");
    }

    /// Hand angles with continuous sub-unit motion.
    #[must_use]
    pub fn derive_angles(&self) -> HandAngles {
        let (h, m, s) = self.time();
        let (h, m, s) = (f64::from(h), f64::from(m), f64::from(s));

        let second = 360.0 / 60.0 * s;
        let minute = 360.0 / 60.0 * m + 360.0 / 60.0 * (s / 60.0);
        let hour = 360.0 / 12.0 * h + 360.0 / 12.0 * (m / 60.0);

        HandAngles {
            hour: hour.rem_euclid(360.0),
            minute: minute.rem_euclid(360.0),
            second: second.rem_euclid(360.0),
        }
    }

    /// Apply an external command.
    ///
    /// `now` is used by `Resync`. A `SetTime` hour is reduced mod 12 first,
    /// so AM/PM is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] for a command that fails
    /// [`Command::validate`]; the state is left unchanged.
    pub fn apply_command(&mut self, command: &Command, now: WallTime) -> ClockResult<()> {
        command.validate()?;
        debug!(%command, "Applying command");
        match *command {
            Command::SetAlarm { hour, minute } => self.set_alarm(hour, minute),
            Command::SetTime {
                hour,
                minute,
                second,
            } => self.set_time(hour % DIAL_HOURS, minute, second),
            Command::Resync => {
                self.set_current_time(now);
                Ok(())
            }
            Command::ClearAlarm => {
                self.deactivate_alarm();
                Ok(())
            }
        }
    }

    /// Build the published snapshot. `alarm_active` reports whether the alarm
    /// matches the wall-clock minute `now`.
    #[must_use]
    pub fn snapshot(&self, now: WallTime) -> ClockSnapshot {
        let angles = self.derive_angles();
        let (current_hour, current_minute, current_second) = self.time();
        ClockSnapshot {
            hour_angle: angles.hour,
            minute_angle: angles.minute,
            second_angle: angles.second,
            alarm_active: self.check_alarm(now.hour, now.minute),
            current_hour,
            current_minute,
            current_second,
        }
    }
}

fn check(field: &'static str, value: u32, limit: u32) -> ClockResult<()> {
    if value < limit {
        Ok(())
    } else {
        Err(ClockError::out_of_range(field, value, limit))
    }
}

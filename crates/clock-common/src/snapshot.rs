//! Wire types exchanged between the tick loop and its collaborators.
//!
//! [`ClockSnapshot`] is published once per tick and served to renderers.
//! [`Command`] is the validated form of an external update request.

use crate::error::{ClockError, ClockResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Positions on the hour dial.
pub const DIAL_HOURS: u32 = 12;
/// Hours in a wall-clock day.
pub const DAY_HOURS: u32 = 24;
/// Minutes per hour.
pub const MINUTES_PER_HOUR: u32 = 60;
/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Published view of the clock: hand angles, alarm status, and current time fields.
///
/// The `Default` value is the all-zero, inactive snapshot served before the
/// first publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// Hour hand angle in degrees, clockwise from 12.
    pub hour_angle: f64,
    /// Minute hand angle in degrees.
    pub minute_angle: f64,
    /// Second hand angle in degrees.
    pub second_angle: f64,
    /// True while the alarm matches the current wall-clock minute.
    pub alarm_active: bool,
    /// Hour on the dial (0..11).
    pub current_hour: u32,
    /// Minute (0..59).
    pub current_minute: u32,
    /// Second (0..59).
    pub current_second: u32,
}

impl ClockSnapshot {
    /// Serialize to the flat JSON object served to renderers.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ClockResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a snapshot.
    pub fn from_json(json: &str) -> ClockResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Discriminant of a [`Command`], used to key mailbox slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    /// Configure and arm the alarm.
    SetAlarm,
    /// Set the displayed time.
    SetTime,
    /// Resynchronize with the wall clock.
    Resync,
    /// Disarm the alarm.
    ClearAlarm,
}

impl CommandKind {
    /// Number of command kinds.
    pub const COUNT: usize = 4;

    /// All kinds in the order the tick loop applies them.
    pub const ALL: [CommandKind; Self::COUNT] = [
        CommandKind::SetAlarm,
        CommandKind::SetTime,
        CommandKind::Resync,
        CommandKind::ClearAlarm,
    ];

    /// Stable snake_case name, used for logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetAlarm => "set_alarm",
            Self::SetTime => "set_time",
            Self::Resync => "resync",
            Self::ClearAlarm => "clear_alarm",
        }
    }

    /// Slot index into a per-kind table.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::SetAlarm => 0,
            Self::SetTime => 1,
            Self::Resync => 2,
            Self::ClearAlarm => 3,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External update request delivered to the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Arm the alarm at a 24-hour wall-clock time.
    SetAlarm {
        /// Hour (0..23).
        #[serde(alias = "hora")]
        hour: u32,
        /// Minute (0..59).
        #[serde(alias = "minuto")]
        minute: u32,
    },
    /// Set the clock. The hour is reduced mod 12 when applied.
    SetTime {
        /// Hour (0..23).
        #[serde(alias = "hora")]
        hour: u32,
        /// Minute (0..59).
        #[serde(alias = "minuto")]
        minute: u32,
        /// Second (0..59).
        #[serde(alias = "segundo")]
        second: u32,
    },
    /// Resynchronize with the wall clock.
    Resync,
    /// Disarm the alarm.
    ClearAlarm,
}

impl Command {
    /// Build a validated `SetAlarm` from raw integers.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] if either field is out of range.
    pub fn set_alarm(hour: i64, minute: i64) -> ClockResult<Self> {
        let hour = check_range("hour", hour, DAY_HOURS)?;
        let minute = check_range("minute", minute, MINUTES_PER_HOUR)?;
        Ok(Self::SetAlarm { hour, minute })
    }

    /// Build a validated `SetTime` from raw integers.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] if any field is out of range.
    pub fn set_time(hour: i64, minute: i64, second: i64) -> ClockResult<Self> {
        let hour = check_range("hour", hour, DAY_HOURS)?;
        let minute = check_range("minute", minute, MINUTES_PER_HOUR)?;
        let second = check_range("second", second, SECONDS_PER_MINUTE)?;
        Ok(Self::SetTime {
            hour,
            minute,
            second,
        })
    }

    /// The kind of this command.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::SetAlarm { .. } => CommandKind::SetAlarm,
            Self::SetTime { .. } => CommandKind::SetTime,
            Self::Resync => CommandKind::Resync,
            Self::ClearAlarm => CommandKind::ClearAlarm,
        }
    }

    /// Check field ranges of a deserialized command.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] naming the first offending field.
    pub fn validate(&self) -> ClockResult<()> {
        match *self {
            Self::SetAlarm { hour, minute } => {
                Self::set_alarm(i64::from(hour), i64::from(minute)).map(|_| ())
            }
            Self::SetTime {
                hour,
                minute,
                second,
            } => Self::set_time(i64::from(hour), i64::from(minute), i64::from(second)).map(|_| ()),
            Self::Resync | Self::ClearAlarm => Ok(()),
        }
    }

    /// Parse and validate a tagged command from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidCommand`] for malformed JSON and
    /// [`ClockError::OutOfRange`] for out-of-range fields.
    pub fn from_json(json: &str) -> ClockResult<Self> {
        let command: Self =
            serde_json::from_str(json).map_err(|e| ClockError::InvalidCommand(e.to_string()))?;
        command.validate()?;
        Ok(command)
    }
}

impl Command {
    /// Build a validated command of `kind` from an untagged JSON object, as
    /// posted to the command endpoints or dropped in a mailbox file.
    ///
    /// Fields may use the English names or the renderer's Spanish aliases
    /// (`hora`, `minuto`, `segundo`). `Resync` and `ClearAlarm` ignore the body.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidCommand`] for a missing or non-integer
    /// field and [`ClockError::OutOfRange`] for an out-of-range one.
    pub fn from_payload(kind: CommandKind, body: &Value) -> ClockResult<Self> {
        match kind {
            CommandKind::SetAlarm => Self::set_alarm(
                int_field(body, "hour", "hora")?,
                int_field(body, "minute", "minuto")?,
            ),
            CommandKind::SetTime => Self::set_time(
                int_field(body, "hour", "hora")?,
                int_field(body, "minute", "minuto")?,
                int_field(body, "second", "segundo")?,
            ),
            CommandKind::Resync => Ok(Self::Resync),
            CommandKind::ClearAlarm => Ok(Self::ClearAlarm),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetAlarm { hour, minute } => write!(f, "set_alarm {hour:02}:{minute:02}"),
            Self::SetTime {
                hour,
                minute,
                second,
            } => write!(f, "set_time {hour:02}:{minute:02}:{second:02}"),
            Self::Resync => f.write_str("resync"),
            Self::ClearAlarm => f.write_str("clear_alarm"),
        }
    }
}

fn int_field(body: &Value, name: &str, alias: &str) -> ClockResult<i64> {
    body.get(name)
        .or_else(|| body.get(alias))
        .and_then(Value::as_i64)
        .ok_or_else(|| ClockError::InvalidCommand(format!("missing or non-integer field `{name}`")))
}

fn check_range(field: &'static str, value: i64, limit: u32) -> ClockResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v < limit)
        .ok_or_else(|| ClockError::out_of_range(field, value, limit))
}

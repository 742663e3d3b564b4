use thiserror::Error;

/// Clock error types covering rejected input, configuration, and gateway failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClockError {
    /// A cyclic counter was constructed with a modulus of zero.
    #[error("cyclic counter modulus must be at least 1")]
    ZeroModulus,

    /// A value fell outside the accepted range for a clock field.
    #[error("{field} out of range: {value} (expected 0..{limit})")]
    OutOfRange {
        /// Name of the rejected field.
        field: &'static str,
        /// Rejected value.
        value: i64,
        /// Exclusive upper bound for the field.
        limit: u32,
    },

    /// A command payload failed boundary validation.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O operation error.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Snapshot or command (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClockError {
    /// Build a [`ClockError::OutOfRange`] for `field`.
    pub fn out_of_range(field: &'static str, value: impl Into<i64>, limit: u32) -> Self {
        Self::OutOfRange {
            field,
            value: value.into(),
            limit,
        }
    }
}

impl From<std::io::Error> for ClockError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ClockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience type alias for clock operations.
pub type ClockResult<T> = Result<T, ClockError>;

//! Error types for Setu

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Setu error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command parameter outside the range the device accepts
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        /// Parameter name
        field: &'static str,
        /// Rejected value
        value: i32,
        /// Smallest accepted value
        min: i32,
        /// Largest accepted value
        max: i32,
    },

    /// Malformed song definition
    #[error("Invalid song: {0}")]
    InvalidSong(String),

    /// Sensor request without any packet ids
    #[error("Sensor request must name at least one packet id")]
    EmptyRequest,

    /// Packet id missing from the sensor table
    #[error("Unknown sensor packet id: {0}")]
    UnknownSensor(u8),

    /// Raw sensor frame does not match the requested widths
    #[error("Sensor frame length mismatch: expected {expected} bytes, got {actual}")]
    FrameLengthMismatch {
        /// Sum of the requested packet widths
        expected: usize,
        /// Bytes actually received
        actual: usize,
    },

    /// Bus command with no dispatch entry
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    /// Device stayed silent through the whole wake budget
    #[error("Device unresponsive after {attempts} wake attempts")]
    DeviceUnresponsive {
        /// Consecutive failed wake attempts
        attempts: u32,
    },

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Message bus error
    #[error("Bus error: {0}")]
    Bus(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for the transient "device did not answer" condition that
    /// triggers the wake-and-retry policy.
    pub fn is_no_response(&self) -> bool {
        matches!(self, Error::FrameLengthMismatch { .. })
    }

    /// True for encoder-side errors caused by bad parameters. These are
    /// rejected immediately and never retried.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::OutOfRange { .. }
                | Error::InvalidSong(_)
                | Error::EmptyRequest
                | Error::UnknownSensor(_)
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<rumqttc::ClientError> for Error {
    fn from(e: rumqttc::ClientError) -> Self {
        Error::Bus(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let mismatch = Error::FrameLengthMismatch {
            expected: 11,
            actual: 0,
        };
        assert!(mismatch.is_no_response());
        assert!(!mismatch.is_caller_error());

        assert!(Error::EmptyRequest.is_caller_error());
        assert!(Error::InvalidSong("empty".to_string()).is_caller_error());
        assert!(!Error::UnknownCommand("dance".to_string()).is_no_response());
    }

    #[test]
    fn test_out_of_range_message() {
        let err = Error::OutOfRange {
            field: "velocity",
            value: 501,
            min: -500,
            max: 500,
        };
        assert_eq!(
            err.to_string(),
            "velocity out of range: 501 (expected -500..=500)"
        );
    }
}

//! Error types for the WR3223 client
//!
//! Errors fall into two groups. Communication failures (I/O, timeouts, broken
//! frames) tear the connection down and are retried on the next cycle. Everything
//! else is scoped to a single value or command and never touches the link.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Wr3223Result<T> = Result<T, Wr3223Error>;

/// Errors produced by the WR3223 client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Wr3223Error {
    /// Neither host nor serial port configured, bad address, unusable serial port.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Connect, read or write failed on the transport.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// The controller did not answer within the receive timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    /// A frame arrived but could not be understood (checksum, command echo, framing).
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// A wire value that is not an integer after truncating the fraction.
    #[error("Malformed value {value:?}: {message}")]
    MalformedValue { value: String, message: String },

    /// The channel id does not name a catalog point.
    #[error("Unknown point: {channel}")]
    UnknownPoint { channel: String },

    /// The point exists but cannot be written.
    #[error("Point {channel} is not writable")]
    NotWritable { channel: String },

    /// The command value is outside the accepted range.
    #[error("Value {value} out of range for {channel}")]
    OutOfRange { channel: String, value: i64 },

    /// The command value has the wrong shape for the point.
    #[error("Point {channel} expects {expected}")]
    WrongShape {
        channel: String,
        expected: &'static str,
    },
}

impl Wr3223Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a malformed value error
    pub fn malformed<V: Into<String>, S: Into<String>>(value: V, message: S) -> Self {
        Self::MalformedValue {
            value: value.into(),
            message: message.into(),
        }
    }

    /// True for failures that require dropping the connection and the capability cache.
    pub fn is_communication_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::Protocol { .. }
        )
    }

    /// True for rejections raised by the command dispatcher.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPoint { .. }
                | Self::NotWritable { .. }
                | Self::OutOfRange { .. }
                | Self::WrongShape { .. }
        )
    }
}

impl From<std::io::Error> for Wr3223Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Self::timeout(err.to_string(), 0),
            _ => Self::connection(err.to_string()),
        }
    }
}

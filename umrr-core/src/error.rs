//! Error types for umrr-core

use crate::protocol::DataFormat;

/// Result type alias for umrr-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Frame group has the wrong number of frames, or a frame is not 8 bytes
    #[error("Malformed frame group: {0}")]
    MalformedGroup(String),

    /// Header version byte disagrees with the codec
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        expected: u16,
        actual: u16,
    },

    /// Frame index out of order
    #[error("Sequence error at frame {position}: expected index {expected}, got {actual}")]
    SequenceError {
        position: usize,
        expected: u16,
        actual: u16,
    },

    /// Frames of one group carry different channel identifiers
    #[error("Channel id mismatch: expected {expected}, got {actual}")]
    ChannelIdMismatch {
        expected: u16,
        actual: u16,
    },

    /// CRC verification failed
    #[error("CRC mismatch: calculated 0x{calculated:04X}, received 0x{received:04X}")]
    CrcError {
        calculated: u16,
        received: u16,
    },

    /// Response footer is not a copy of its header
    #[error("Response footer does not match header")]
    FooterMismatch,

    /// Frames of one response carry different message counters
    #[error("Counter mismatch: expected {expected}, got {actual}")]
    CounterMismatch {
        expected: u8,
        actual: u8,
    },

    /// Value does not match the declared data format
    #[error("Type mismatch: declared {declared}, value is {actual}")]
    TypeMismatch {
        declared: DataFormat,
        actual: DataFormat,
    },

    /// Protocol version this crate cannot encode or decode
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u16),

    /// Wire value does not map to a known enumeration member
    #[error("Unknown {field} value: {value}")]
    UnknownEnumValue {
        field: &'static str,
        value: u8,
    },

    /// Field value does not fit its wire representation
    #[error("{field} out of range: {value} (max: {max})")]
    FieldOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// Request cannot be built for the chosen configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Sensor answered with a non-zero result code
    #[error("Sensor rejected instruction with result code {code}")]
    Rejected {
        code: u8,
    },
}

impl Error {
    /// Check if error means a received group failed validation
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedGroup(_)
                | Self::VersionMismatch { .. }
                | Self::SequenceError { .. }
                | Self::ChannelIdMismatch { .. }
                | Self::CrcError { .. }
                | Self::FooterMismatch
                | Self::CounterMismatch { .. }
                | Self::UnsupportedVersion(_)
                | Self::UnknownEnumValue { .. }
        )
    }

    /// Check if error was caused by caller input rather than received data
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. } | Self::FieldOutOfRange { .. } | Self::ConfigurationError(_)
        )
    }
}

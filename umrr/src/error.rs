//! High-level error types

use std::time::Duration;

use crate::routing::LogicalChannel;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] umrr_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] umrr_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] umrr_types::Error),

    #[error("Timeout waiting for {channel} after {timeout:?}")]
    Timeout {
        channel: LogicalChannel,
        timeout: Duration,
    },

    #[error("Channel closed: {0}")]
    ChannelClosed(LogicalChannel),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl Error {
    /// Check if error means a received group failed validation
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_integrity_error())
    }

    /// Check if error is recoverable (retry might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. }) || self.is_integrity_error()
    }
}

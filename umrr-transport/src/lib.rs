//! Transport layer for UMRR sensors
//!
//! Moves tagged 8-byte CAN frames between the host and a sensor. The
//! dispatch task and every sender share one transport, so all methods take
//! `&self`.

pub mod error;
pub mod loopback;

pub use error::{Error, Result};
pub use loopback::LoopbackTransport;

use async_trait::async_trait;
use umrr_core::{CanMessage, Frame};

/// Frame-level link to a sensor
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Send one frame
    async fn send(&self, message: &CanMessage) -> Result<()>;

    /// Wait for the next inbound frame
    ///
    /// Returns [`Error::ConnectionClosed`] once the link is gone.
    async fn receive(&self) -> Result<CanMessage>;

    /// Interface name, for logging
    fn interface(&self) -> String;

    /// Send a raw payload of at most 8 bytes, zero-padding the tail
    async fn send_raw(&self, id: u32, data: &[u8]) -> Result<()> {
        if data.len() > Frame::SIZE {
            return Err(Error::PayloadTooLong { len: data.len() });
        }
        let mut raw = [0u8; Frame::SIZE];
        raw[..data.len()].copy_from_slice(data);
        self.send(&CanMessage::new(id, Frame::new(raw))).await
    }
}

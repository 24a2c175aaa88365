//! In-process transport pair
//!
//! Two connected endpoints: frames sent on one are received on the other.
//! Used by tests, demos and the sensor simulator in place of a CAN
//! interface.

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::trace;
use umrr_core::CanMessage;

use crate::{FrameTransport, error::*};

/// One end of an in-process CAN link
pub struct LoopbackTransport {
    name: String,
    tx: mpsc::UnboundedSender<CanMessage>,
    rx: Mutex<mpsc::UnboundedReceiver<CanMessage>>,
}

impl LoopbackTransport {
    /// Create two connected endpoints
    ///
    /// # Examples
    ///
    /// ```
    /// use umrr_transport::{FrameTransport, LoopbackTransport};
    ///
    /// let (host, sensor) = LoopbackTransport::pair();
    /// assert_eq!(host.interface(), "loopback/host");
    /// # let _ = sensor;
    /// ```
    pub fn pair() -> (Self, Self) {
        let (host_tx, sensor_rx) = mpsc::unbounded_channel();
        let (sensor_tx, host_rx) = mpsc::unbounded_channel();

        (
            Self {
                name: "loopback/host".into(),
                tx: host_tx,
                rx: Mutex::new(host_rx),
            },
            Self {
                name: "loopback/sensor".into(),
                tx: sensor_tx,
                rx: Mutex::new(sensor_rx),
            },
        )
    }

    /// Take every frame already delivered to this endpoint without waiting
    pub async fn drain(&self) -> Vec<CanMessage> {
        let mut rx = self.rx.lock().await;
        let mut frames = Vec::new();
        while let Ok(message) = rx.try_recv() {
            frames.push(message);
        }
        frames
    }
}

#[async_trait]
impl FrameTransport for LoopbackTransport {
    async fn send(&self, message: &CanMessage) -> Result<()> {
        trace!("{} sending {}", self.name, message);
        self.tx.send(*message).map_err(|_| Error::ConnectionClosed)?;

        // a real bus lets other writers in between two frames
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn receive(&self) -> Result<CanMessage> {
        let message = self
            .rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(Error::ConnectionClosed)?;
        trace!("{} received {}", self.name, message);
        Ok(message)
    }

    fn interface(&self) -> String {
        self.name.clone()
    }
}

//! Background dispatch task
//!
//! Drains the transport and hands every routed frame to its channel's
//! queue. Queues are bounded and the dispatcher never waits on a consumer:
//! a frame arriving at a full queue is dropped and counted.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, trace, warn};
use umrr_core::CanMessage;
use umrr_transport::FrameTransport;

use crate::routing::{LogicalChannel, RoutingTable};

/// Frame counters kept by the dispatcher
#[derive(Debug, Default)]
pub struct DispatchStats {
    routed: AtomicU64,
    unrouted: AtomicU64,
    overflowed: AtomicU64,
}

impl DispatchStats {
    /// Frames handed to a channel queue
    pub fn routed(&self) -> u64 {
        self.routed.load(Ordering::Relaxed)
    }

    /// Frames dropped for lack of a route
    pub fn unrouted(&self) -> u64 {
        self.unrouted.load(Ordering::Relaxed)
    }

    /// Frames dropped because their channel queue was full
    pub fn overflowed(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }
}

pub(crate) struct Dispatcher {
    transport: Arc<dyn FrameTransport>,
    routes: RoutingTable,
    outlets: HashMap<LogicalChannel, mpsc::Sender<CanMessage>>,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    /// Create a dispatcher and one receiving queue of `capacity` frames per
    /// routed channel; `capacity` must be non-zero
    pub(crate) fn new(
        transport: Arc<dyn FrameTransport>,
        routes: RoutingTable,
        capacity: usize,
    ) -> (Self, HashMap<LogicalChannel, mpsc::Receiver<CanMessage>>) {
        let mut outlets = HashMap::new();
        let mut queues = HashMap::new();
        for channel in routes.channels() {
            let (tx, rx) = mpsc::channel(capacity);
            outlets.insert(channel, tx);
            queues.insert(channel, rx);
        }

        let dispatcher = Self {
            transport,
            routes,
            outlets,
            stats: Arc::new(DispatchStats::default()),
        };
        (dispatcher, queues)
    }

    pub(crate) fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Run until the transport fails or closes; dropping the queues then
    /// wakes every consumer with a closed channel
    pub(crate) async fn run(self) {
        info!("Dispatching frames from {}", self.transport.interface());

        loop {
            match self.transport.receive().await {
                Ok(message) => self.dispatch(message),
                Err(e) if e.is_closed() => {
                    info!("{} closed, dispatcher stopping", self.transport.interface());
                    break;
                }
                Err(e) => {
                    warn!("Receive failed on {}: {}", self.transport.interface(), e);
                    break;
                }
            }
        }
    }

    fn dispatch(&self, message: CanMessage) {
        let Some(channel) = self.routes.route(message.id) else {
            self.stats.unrouted.fetch_add(1, Ordering::Relaxed);
            trace!("Dropping unrouted frame {}", message);
            return;
        };

        let Some(outlet) = self.outlets.get(&channel) else {
            return;
        };

        match outlet.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                self.stats.overflowed.fetch_add(1, Ordering::Relaxed);
                warn!("{} queue full, dropping {}", channel, message);
                return;
            }
            Err(TrySendError::Closed(message)) => {
                debug!("No consumer left for {}, dropping {}", channel, message);
                return;
            }
        }
        self.stats.routed.fetch_add(1, Ordering::Relaxed);
        trace!("Routed {} to {}", message, channel);
    }
}

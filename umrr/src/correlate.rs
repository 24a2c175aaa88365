//! Frame group correlation
//!
//! A [`Correlator`] turns the frame stream of one logical channel into
//! complete groups: it waits for a header, learns the group size from it and
//! collects that many frames in arrival order. A header arriving where a
//! body frame belongs restarts the group from that header, so the tail of a
//! group abandoned by an earlier call cannot shift later groups. Each call to
//! [`Correlator::next_group`] has its own deadline; frames buffered by a call
//! that times out are discarded.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace, warn};
use umrr_core::{CanMessage, Response};
use umrr_types::ObjectListLayout;

use crate::error::{Error, Result};
use crate::routing::LogicalChannel;

/// Knows which frames open a group and how long that group is
pub trait GroupAssembler: Send {
    /// Total frames (header included) of the group `header` opens, or `None`
    /// when the frame is not a header
    fn group_len(&self, header: &CanMessage) -> Result<Option<usize>>;

    /// Whether `message` belongs at `position` of the group `header` opened
    fn fits(&self, _header: &CanMessage, _position: usize, _message: &CanMessage) -> bool {
        true
    }
}

/// Groups UDT type 17000 instruction responses
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseAssembler;

impl GroupAssembler for ResponseAssembler {
    fn group_len(&self, header: &CanMessage) -> Result<Option<usize>> {
        Ok(Response::expected_frames(&header.frame)?)
    }

    fn fits(&self, header: &CanMessage, position: usize, message: &CanMessage) -> bool {
        Response::expected_index(&header.frame, position)
            .is_none_or(|index| message.frame.channel_id() == index)
    }
}

/// Groups target lists: a header frame and the object frames it announces
#[derive(Debug, Clone)]
pub struct TargetListAssembler {
    layout: ObjectListLayout,
}

impl TargetListAssembler {
    pub fn new(layout: ObjectListLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ObjectListLayout {
        &self.layout
    }
}

impl GroupAssembler for TargetListAssembler {
    fn group_len(&self, header: &CanMessage) -> Result<Option<usize>> {
        if header.id != self.layout.header_id {
            return Ok(None);
        }
        let count = self.layout.object_count(header.frame.as_bytes())?;
        Ok(Some(1 + count))
    }

    fn fits(&self, _header: &CanMessage, _position: usize, message: &CanMessage) -> bool {
        message.id != self.layout.header_id
    }
}

/// Where a correlator stands in the current call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationState {
    Idle,
    AwaitingHeader,
    Accumulating { expected: usize, received: usize },
}

/// Collects complete frame groups from one channel's queue
pub struct Correlator<A> {
    channel: LogicalChannel,
    rx: mpsc::Receiver<CanMessage>,
    assembler: A,
    state: CorrelationState,
}

impl<A: GroupAssembler> Correlator<A> {
    pub fn new(channel: LogicalChannel, rx: mpsc::Receiver<CanMessage>, assembler: A) -> Self {
        Self {
            channel,
            rx,
            assembler,
            state: CorrelationState::Idle,
        }
    }

    pub fn channel(&self) -> LogicalChannel {
        self.channel
    }

    pub fn state(&self) -> CorrelationState {
        self.state
    }

    pub fn assembler(&self) -> &A {
        &self.assembler
    }

    /// Wait up to `timeout` for the next complete group
    ///
    /// Frames arriving before a header are skipped. A header the assembler
    /// rejects fails the call and is discarded.
    pub async fn next_group(&mut self, timeout: Duration) -> Result<Vec<CanMessage>> {
        let deadline = Instant::now() + timeout;
        self.state = CorrelationState::AwaitingHeader;
        let result = self.collect(deadline, timeout).await;
        self.state = CorrelationState::Idle;

        if let Err(e) = &result {
            debug!("No {} group: {}", self.channel, e);
        }
        result
    }

    async fn collect(&mut self, deadline: Instant, timeout: Duration) -> Result<Vec<CanMessage>> {
        let (header, mut expected) = loop {
            let message = self.recv_before(deadline, timeout).await?;
            match self.assembler.group_len(&message) {
                Ok(Some(expected)) => break (message, expected),
                Ok(None) => trace!("Skipping {} while awaiting {} header", message, self.channel),
                Err(e) => {
                    warn!("Discarding {} header {}: {}", self.channel, message, e);
                    return Err(e);
                }
            }
        };

        let mut group = Vec::with_capacity(expected);
        group.push(header);
        while group.len() < expected {
            self.state = CorrelationState::Accumulating {
                expected,
                received: group.len(),
            };
            let message = self.recv_before(deadline, timeout).await?;

            if !self.assembler.fits(&group[0], group.len(), &message) {
                if let Ok(Some(len)) = self.assembler.group_len(&message) {
                    debug!(
                        "Restarting {} group at {}, dropping {} frames",
                        self.channel,
                        message,
                        group.len()
                    );
                    group.clear();
                    group.push(message);
                    expected = len;
                    continue;
                }
            }
            group.push(message);
        }

        trace!("Completed {} group of {} frames", self.channel, group.len());
        Ok(group)
    }

    async fn recv_before(&mut self, deadline: Instant, timeout: Duration) -> Result<CanMessage> {
        match timeout_at(deadline, self.rx.recv()).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(Error::ChannelClosed(self.channel)),
            Err(_) => Err(Error::Timeout {
                channel: self.channel,
                timeout,
            }),
        }
    }

    /// Drop every frame queued so far, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("Cleared {} queued {} frames", dropped, self.channel);
        }
        dropped
    }
}

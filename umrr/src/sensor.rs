//! High-level sensor interface

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use umrr_core::{Access, CanMessage, DataFormat, Instruction, RequestBuilder, Response, Value};
use umrr_transport::FrameTransport;
use umrr_types::{RawFrame, TargetList};

use crate::config::SensorConfig;
use crate::correlate::{Correlator, ResponseAssembler, TargetListAssembler};
use crate::dispatch::{DispatchStats, Dispatcher};
use crate::error::{Error, Result};
use crate::routing::{LogicalChannel, RoutingTable};

/// UMRR sensor on a CAN link
///
/// Creating a sensor spawns the dispatch task on the current Tokio runtime.
/// The task stops when the sensor is dropped or the transport closes.
///
/// # Examples
///
/// ```no_run
/// use umrr::{DataFormat, LoopbackTransport, Sensor, SensorConfig};
///
/// #[tokio::main]
/// async fn main() -> umrr::Result<()> {
///     let (host, _radar) = LoopbackTransport::pair();
///     let sensor = Sensor::new(host, SensorConfig::default())?;
///
///     let response = sensor.request_status(0x3FB, 3042, 0, DataFormat::Integer).await?;
///     println!("{:?}", response.value());
///     Ok(())
/// }
/// ```
pub struct Sensor {
    transport: Arc<dyn FrameTransport>,
    config: SensorConfig,
    builder: RequestBuilder,
    send_lock: Mutex<()>,
    responses: Mutex<Correlator<ResponseAssembler>>,
    targets: Option<Mutex<Correlator<TargetListAssembler>>>,
    stats: Arc<DispatchStats>,
    dispatch: JoinHandle<()>,
}

impl Sensor {
    /// Validate `config`, then start dispatching frames from `transport`
    pub fn new(transport: impl FrameTransport + 'static, config: SensorConfig) -> Result<Self> {
        Self::with_shared(Arc::new(transport), config)
    }

    /// Like [`Sensor::new`] for a transport the caller keeps a handle to
    pub fn with_shared(transport: Arc<dyn FrameTransport>, config: SensorConfig) -> Result<Self> {
        config.validate()?;
        let builder = RequestBuilder::new(config.uat_version)?;
        let routes = RoutingTable::from_config(&config)?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            Error::ConfigurationError("a sensor must be created inside a Tokio runtime".into())
        })?;

        let (dispatcher, mut queues) = Dispatcher::new(Arc::clone(&transport), routes, config.queue_capacity);
        let stats = dispatcher.stats();

        let responses = Self::take_queue(&mut queues, LogicalChannel::UatResponse)?;
        let responses = Mutex::new(Correlator::new(
            LogicalChannel::UatResponse,
            responses,
            ResponseAssembler,
        ));

        let targets = match &config.object_layout {
            Some(layout) => {
                let queue = Self::take_queue(&mut queues, LogicalChannel::TargetList)?;
                Some(Mutex::new(Correlator::new(
                    LogicalChannel::TargetList,
                    queue,
                    TargetListAssembler::new(layout.clone()),
                )))
            }
            None => None,
        };

        info!(
            "Starting sensor on {} (UAT {}, requests 0x{:03X}, responses 0x{:03X})",
            transport.interface(),
            config.uat_version,
            config.request_can_id,
            config.response_can_id
        );
        let dispatch = runtime.spawn(dispatcher.run());

        Ok(Self {
            transport,
            config,
            builder,
            send_lock: Mutex::new(()),
            responses,
            targets,
            stats,
            dispatch,
        })
    }

    fn take_queue<T>(
        queues: &mut HashMap<LogicalChannel, T>,
        channel: LogicalChannel,
    ) -> Result<T> {
        queues
            .remove(&channel)
            .ok_or_else(|| Error::ConfigurationError(format!("no route for {}", channel)))
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Dispatcher frame counters
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Whether the dispatch task is still draining the transport
    pub fn is_running(&self) -> bool {
        !self.dispatch.is_finished()
    }

    /// Encode and send one instruction
    ///
    /// All frames of the instruction go out back to back; concurrent senders
    /// wait for the whole group.
    pub async fn send_instruction(&self, instruction: &Instruction) -> Result<()> {
        let frames = instruction.encode()?;
        let messages = CanMessage::group(self.config.request_can_id, &frames);

        let _guard = self.send_lock.lock().await;
        debug!(
            "Sending {} instruction for UAT-ID {} ({} frames)",
            instruction.version(),
            instruction.uat_id(),
            messages.len()
        );
        for message in &messages {
            trace!("TX {}", message);
            self.transport.send(message).await?;
        }
        Ok(())
    }

    /// Send a parameter read, write or read-write
    pub async fn send_parameter(
        &self,
        section: u16,
        parameter_number: u16,
        value: Value,
        device_id: u8,
        format: DataFormat,
        access: Access,
    ) -> Result<()> {
        let instruction =
            self.builder
                .parameter(section, parameter_number, value, device_id, format, access)?;
        self.send_instruction(&instruction).await
    }

    /// Send a status query
    pub async fn send_status_query(
        &self,
        section: u16,
        status_number: u16,
        device_id: u8,
        format: DataFormat,
    ) -> Result<()> {
        let instruction = self
            .builder
            .status(section, status_number, device_id, format)?;
        self.send_instruction(&instruction).await
    }

    /// Send a command (UAT v4 only)
    pub async fn send_command(
        &self,
        section: u16,
        command_number: u16,
        argument: i32,
        device_id: u8,
    ) -> Result<()> {
        let instruction = self
            .builder
            .command(section, command_number, argument, device_id)?;
        self.send_instruction(&instruction).await
    }

    /// Wait up to `timeout` for the next decoded instruction response
    pub async fn next_response(&self, timeout: Duration) -> Result<Response> {
        let mut responses = self.responses.lock().await;
        Self::receive_response(&mut responses, timeout).await
    }

    async fn receive_response(
        responses: &mut Correlator<ResponseAssembler>,
        timeout: Duration,
    ) -> Result<Response> {
        let group = responses.next_group(timeout).await?;
        let frames: Vec<_> = group.iter().map(|m| m.frame).collect();

        Response::decode(&frames).map_err(|e| {
            warn!("Discarding invalid response group: {}", e);
            Error::from(e)
        })
    }

    /// Send `instruction` and wait for the response that echoes it
    ///
    /// The response channel stays locked from send to answer. Responses
    /// naming another UAT-ID or parameter are skipped.
    pub async fn request(&self, instruction: &Instruction) -> Result<Response> {
        let timeout = self.config.response_timeout;
        let mut responses = self.responses.lock().await;
        self.send_instruction(instruction).await?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let response = Self::receive_response(&mut responses, remaining)
                .await
                .map_err(|e| match e {
                    Error::Timeout { channel, .. } => Error::Timeout { channel, timeout },
                    other => other,
                })?;

            if response.is_answer_to(instruction) {
                return Ok(response);
            }
            warn!(
                "Skipping UDT v{} response not answering UAT-ID {}",
                response.udt_version(),
                instruction.uat_id()
            );
        }
    }

    /// Wait for the next complete target list within the configured target timeout
    pub async fn receive_target_list(&self) -> Result<TargetList> {
        self.next_target_list(self.config.target_timeout).await
    }

    /// Wait up to `timeout` for the next complete target list
    pub async fn next_target_list(&self, timeout: Duration) -> Result<TargetList> {
        let targets = self.targets.as_ref().ok_or_else(|| {
            Error::ConfigurationError("no object list layout configured".into())
        })?;

        let mut correlator = targets.lock().await;
        let group = correlator.next_group(timeout).await?;
        let raw: Vec<RawFrame> = group
            .iter()
            .map(|m| RawFrame {
                id: m.id,
                data: *m.frame.as_bytes(),
            })
            .collect();

        let list = correlator.assembler().layout().decode(&raw[0], &raw[1..])?;
        debug!("Received {}", list);
        Ok(list)
    }

    /// Drop every frame queued for `channel`, returning how many were dropped
    pub async fn clear_channel(&self, channel: LogicalChannel) -> Result<usize> {
        match channel {
            LogicalChannel::UatResponse => Ok(self.responses.lock().await.clear()),
            LogicalChannel::TargetList => match &self.targets {
                Some(targets) => Ok(targets.lock().await.clear()),
                None => Err(Error::ConfigurationError(
                    "no object list layout configured".into(),
                )),
            },
        }
    }

    /// Send a parameter request and wait for its response
    pub async fn request_parameter(
        &self,
        section: u16,
        parameter_number: u16,
        value: Value,
        device_id: u8,
        format: DataFormat,
        access: Access,
    ) -> Result<Response> {
        let instruction =
            self.builder
                .parameter(section, parameter_number, value, device_id, format, access)?;
        self.request(&instruction).await
    }

    /// Send a status query and wait for its response
    pub async fn request_status(
        &self,
        section: u16,
        status_number: u16,
        device_id: u8,
        format: DataFormat,
    ) -> Result<Response> {
        let instruction = self
            .builder
            .status(section, status_number, device_id, format)?;
        self.request(&instruction).await
    }
}

impl Drop for Sensor {
    fn drop(&mut self) {
        if !self.dispatch.is_finished() {
            debug!("Stopping dispatcher for {}", self.transport.interface());
            self.dispatch.abort();
        }
    }
}

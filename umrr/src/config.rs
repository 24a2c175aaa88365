//! Sensor configuration

use std::ops::RangeInclusive;
use std::time::Duration;

use umrr_core::ProtocolVersion;
use umrr_core::constants::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_RESPONSE_TIMEOUT_MS, DEFAULT_TARGET_TIMEOUT_MS, TARGET_LIST_CAN_ID,
    TARGET_LIST_CAN_ID_RANGE, UAT_REQUEST_CAN_ID, UDT_RESPONSE_CAN_ID,
};
use umrr_types::ObjectListLayout;

use crate::error::{Error, Result};

/// Settings of one sensor connection
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use umrr::{ProtocolVersion, SensorConfig};
///
/// let config = SensorConfig::default()
///     .with_uat_version(ProtocolVersion::V4)
///     .with_response_timeout(Duration::from_millis(500));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// UAT format used for outgoing requests (1 or 4)
    pub uat_version: ProtocolVersion,

    /// CAN identifier instructions are sent on
    pub request_can_id: u32,

    /// CAN identifier instruction responses arrive on
    pub response_can_id: u32,

    /// CAN identifiers of the target list block
    pub target_can_ids: RangeInclusive<u32>,

    /// Wait used by the request helpers
    pub response_timeout: Duration,

    /// Wait used by [`Sensor::receive_target_list`](crate::Sensor::receive_target_list)
    pub target_timeout: Duration,

    /// Frames buffered per channel before the dispatcher drops new ones
    pub queue_capacity: usize,

    /// Target list layout; target frames are only routed when set
    pub object_layout: Option<ObjectListLayout>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            uat_version: ProtocolVersion::V1,
            request_can_id: UAT_REQUEST_CAN_ID,
            response_can_id: UDT_RESPONSE_CAN_ID,
            target_can_ids: TARGET_LIST_CAN_ID..=TARGET_LIST_CAN_ID + TARGET_LIST_CAN_ID_RANGE,
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            target_timeout: Duration::from_millis(DEFAULT_TARGET_TIMEOUT_MS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            object_layout: None,
        }
    }
}

impl SensorConfig {
    pub fn with_uat_version(mut self, version: ProtocolVersion) -> Self {
        self.uat_version = version;
        self
    }

    pub fn with_request_can_id(mut self, id: u32) -> Self {
        self.request_can_id = id;
        self
    }

    pub fn with_response_can_id(mut self, id: u32) -> Self {
        self.response_can_id = id;
        self
    }

    pub fn with_target_can_ids(mut self, ids: RangeInclusive<u32>) -> Self {
        self.target_can_ids = ids;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_target_timeout(mut self, timeout: Duration) -> Self {
        self.target_timeout = timeout;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_object_layout(mut self, layout: ObjectListLayout) -> Self {
        self.object_layout = Some(layout);
        self
    }

    /// Check the settings before a sensor is started
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.uat_version, ProtocolVersion::V1 | ProtocolVersion::V4) {
            return Err(Error::ConfigurationError(format!(
                "UAT version must be 1 or 4, got {}",
                u8::from(self.uat_version)
            )));
        }

        if self.queue_capacity == 0 {
            return Err(Error::ConfigurationError(
                "queue capacity must be at least one frame".into(),
            ));
        }

        if let Some(layout) = &self.object_layout {
            if self.target_can_ids.contains(&self.response_can_id) {
                return Err(Error::ConfigurationError(format!(
                    "response id 0x{:03X} lies inside the target list block",
                    self.response_can_id
                )));
            }
            if !self.target_can_ids.contains(&layout.header_id) {
                return Err(Error::ConfigurationError(format!(
                    "target list header 0x{:03X} lies outside the target list block",
                    layout.header_id
                )));
            }
        }
        Ok(())
    }
}

//! CAN identifier routing
//!
//! Maps inbound CAN identifiers to the logical channel that consumes them.
//! Frames matching no route are dropped by the dispatcher.

use std::fmt;
use std::ops::RangeInclusive;

use crate::config::SensorConfig;
use crate::error::{Error, Result};

/// A consumer-facing stream of correlated frame groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalChannel {
    /// Periodic target lists
    TargetList,
    /// Answers to UAT instructions
    UatResponse,
}

impl fmt::Display for LogicalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetList => f.write_str("target list"),
            Self::UatResponse => f.write_str("UAT response"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
    ids: RangeInclusive<u32>,
    channel: LogicalChannel,
}

/// Non-overlapping identifier ranges and their channels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ids` for `channel`
    pub fn with_route(mut self, ids: RangeInclusive<u32>, channel: LogicalChannel) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::ConfigurationError(format!(
                "empty id range for {}",
                channel
            )));
        }

        if let Some(clash) = self
            .routes
            .iter()
            .find(|r| r.ids.start() <= ids.end() && ids.start() <= r.ids.end())
        {
            return Err(Error::ConfigurationError(format!(
                "ids 0x{:03X}..=0x{:03X} for {} overlap {}",
                ids.start(),
                ids.end(),
                channel,
                clash.channel
            )));
        }

        self.routes.push(Route { ids, channel });
        Ok(self)
    }

    /// Routes for a sensor: responses always, target lists when a layout is set
    pub fn from_config(config: &SensorConfig) -> Result<Self> {
        let table = Self::new().with_route(
            config.response_can_id..=config.response_can_id,
            LogicalChannel::UatResponse,
        )?;

        match config.object_layout {
            Some(_) => table.with_route(config.target_can_ids.clone(), LogicalChannel::TargetList),
            None => Ok(table),
        }
    }

    pub fn route(&self, id: u32) -> Option<LogicalChannel> {
        self.routes
            .iter()
            .find(|r| r.ids.contains(&id))
            .map(|r| r.channel)
    }

    /// Every channel with at least one route
    pub fn channels(&self) -> Vec<LogicalChannel> {
        let mut channels: Vec<LogicalChannel> = Vec::new();
        for route in &self.routes {
            if !channels.contains(&route.channel) {
                channels.push(route.channel);
            }
        }
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use umrr_types::{ObjectListLayout, Signal};

    #[test]
    fn test_default_routes() {
        let layout = ObjectListLayout::new(0x400, Signal::new(0, 8).unwrap());
        let table = RoutingTable::from_config(&SensorConfig::default().with_object_layout(layout)).unwrap();

        assert_eq!(table.route(0x700), Some(LogicalChannel::UatResponse));
        assert_eq!(table.route(0x400), Some(LogicalChannel::TargetList));
        assert_eq!(table.route(0x47F), Some(LogicalChannel::TargetList));
        assert_eq!(table.route(0x480), None);
        assert_eq!(table.route(0x3FB), None);
        assert_eq!(
            table.channels(),
            vec![LogicalChannel::UatResponse, LogicalChannel::TargetList]
        );
    }

    #[test]
    fn test_targets_unrouted_without_layout() {
        let table = RoutingTable::from_config(&SensorConfig::default()).unwrap();
        assert_eq!(table.route(0x400), None);
        assert_eq!(table.channels(), vec![LogicalChannel::UatResponse]);
    }

    #[test]
    fn test_rejects_overlap() {
        let result = RoutingTable::new()
            .with_route(0x400..=0x47F, LogicalChannel::TargetList)
            .and_then(|t| t.with_route(0x47F..=0x47F, LogicalChannel::UatResponse));
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }
}

//! Target list structures

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::signal::Signal;

/// Decoded signal values keyed by signal name
pub type Signals = BTreeMap<String, f64>;

/// A raw frame as received on the target list block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    pub id: u32,
    pub data: [u8; 8],
}

/// Where the object count and per-object signals live in a target list
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectListLayout {
    /// CAN identifier of the list header frame
    pub header_id: u32,

    /// Header signal holding the number of object frames that follow
    pub count_signal: Signal,

    /// Largest count accepted from a header
    pub max_objects: usize,

    header_signals: Vec<(String, Signal)>,
    object_signals: Vec<(String, Signal)>,
}

impl ObjectListLayout {
    pub fn new(header_id: u32, count_signal: Signal) -> Self {
        Self {
            header_id,
            count_signal,
            max_objects: 255,
            header_signals: Vec::new(),
            object_signals: Vec::new(),
        }
    }

    pub fn with_max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

    /// Decode an extra signal from the header frame
    pub fn with_header_signal(mut self, name: impl Into<String>, signal: Signal) -> Self {
        self.header_signals.push((name.into(), signal));
        self
    }

    /// Decode a signal from every object frame
    pub fn with_object_signal(mut self, name: impl Into<String>, signal: Signal) -> Self {
        self.object_signals.push((name.into(), signal));
        self
    }

    /// Number of object frames announced by a header payload
    pub fn object_count(&self, header: &[u8; 8]) -> Result<usize> {
        let raw = self.count_signal.extract(header);
        if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 {
            return Err(Error::Decode(format!("invalid object count {}", raw)));
        }

        let count = raw as usize;
        if count > self.max_objects {
            return Err(Error::Decode(format!(
                "object count {} exceeds maximum {}",
                count, self.max_objects
            )));
        }
        Ok(count)
    }

    fn decode_signals(signals: &[(String, Signal)], data: &[u8; 8]) -> Signals {
        signals
            .iter()
            .map(|(name, signal)| (name.clone(), signal.extract(data)))
            .collect()
    }

    /// Decode a complete list: the header frame followed by its object frames
    pub fn decode(&self, header: &RawFrame, objects: &[RawFrame]) -> Result<TargetList> {
        if header.id != self.header_id {
            return Err(Error::Decode(format!(
                "expected header id 0x{:03X}, got 0x{:03X}",
                self.header_id, header.id
            )));
        }

        let count = self.object_count(&header.data)?;
        if objects.len() != count {
            return Err(Error::Decode(format!(
                "header announces {} objects, got {}",
                count,
                objects.len()
            )));
        }

        let header = Self::decode_signals(&self.header_signals, &header.data);
        let objects = objects
            .iter()
            .map(|frame| {
                let mut signals = header.clone();
                signals.extend(Self::decode_signals(&self.object_signals, &frame.data));
                TargetObject {
                    id: frame.id,
                    raw: frame.data,
                    signals,
                }
            })
            .collect();

        Ok(TargetList {
            header,
            objects,
            received_at: Utc::now(),
        })
    }
}

/// One object frame of a target list
#[derive(Debug, Clone, PartialEq)]
pub struct TargetObject {
    /// CAN identifier the object arrived on
    pub id: u32,

    pub raw: [u8; 8],

    /// Header signals followed by this object's own; object values win
    pub signals: Signals,
}

impl TargetObject {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.signals.get(name).copied()
    }
}

/// A complete target list
#[derive(Debug, Clone, PartialEq)]
pub struct TargetList {
    /// Decoded header signals
    pub header: Signals,

    pub objects: Vec<TargetObject>,

    /// Host time the list was completed
    pub received_at: DateTime<Utc>,
}

impl TargetList {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl fmt::Display for TargetList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TargetList[{} objects at {}]",
            self.objects.len(),
            self.received_at.format("%H:%M:%S%.3f")
        )
    }
}

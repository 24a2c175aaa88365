//! UAT instruction codecs (host to sensor)
//!
//! Every version starts with a header frame whose byte 3 carries the format
//! version, so a received group can be decoded without knowing its version
//! in advance.

pub mod single;
pub mod v1;
pub mod v2;
pub mod v3;
pub mod v4;

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::protocol::ProtocolVersion;

pub use single::SingleInstruction;
pub use v4::{BatchInstruction, SubInstruction};

/// An instruction in one of the four UAT formats
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    V1(SingleInstruction),
    V2 {
        instruction: SingleInstruction,
        dims: [u8; 4],
    },
    V3 {
        instruction: SingleInstruction,
        dims: [u8; 8],
    },
    V4(BatchInstruction),
}

impl Instruction {
    pub fn version(&self) -> ProtocolVersion {
        match self {
            Self::V1(_) => ProtocolVersion::V1,
            Self::V2 { .. } => ProtocolVersion::V2,
            Self::V3 { .. } => ProtocolVersion::V3,
            Self::V4(_) => ProtocolVersion::V4,
        }
    }

    pub fn uat_id(&self) -> u16 {
        match self {
            Self::V1(instruction)
            | Self::V2 { instruction, .. }
            | Self::V3 { instruction, .. } => instruction.uat_id,
            Self::V4(batch) => batch.uat_id,
        }
    }

    pub fn device_id(&self) -> u8 {
        match self {
            Self::V1(instruction)
            | Self::V2 { instruction, .. }
            | Self::V3 { instruction, .. } => instruction.device_id,
            Self::V4(batch) => batch.device_id,
        }
    }

    /// Check every field without encoding
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::V1(instruction)
            | Self::V2 { instruction, .. }
            | Self::V3 { instruction, .. } => instruction.validate(),
            Self::V4(batch) => batch.validate(),
        }
    }

    /// Encode into the frame group sent to the sensor, header first
    pub fn encode(&self) -> Result<Vec<Frame>> {
        match self {
            Self::V1(instruction) => v1::encode(instruction),
            Self::V2 { instruction, dims } => v2::encode(instruction, dims),
            Self::V3 { instruction, dims } => v3::encode(instruction, dims),
            Self::V4(batch) => v4::encode(batch),
        }
    }

    /// Decode a frame group of any supported version
    ///
    /// A group without a frame at index 0 is malformed; one whose first frame
    /// is not that header is out of sequence.
    pub fn decode(frames: &[Frame]) -> Result<Self> {
        let header = frames
            .first()
            .ok_or_else(|| Error::MalformedGroup("empty frame group".into()))?;

        if !frames.iter().any(|frame| frame.index() == 0) {
            return Err(Error::MalformedGroup("no header frame".into()));
        }
        if header.index() != 0 {
            return Err(Error::SequenceError {
                position: 0,
                expected: 0,
                actual: header.index().into(),
            });
        }

        match ProtocolVersion::try_from(header.as_bytes()[3])? {
            ProtocolVersion::V1 => v1::decode(frames).map(Self::V1),
            ProtocolVersion::V2 => {
                v2::decode(frames).map(|(instruction, dims)| Self::V2 { instruction, dims })
            }
            ProtocolVersion::V3 => {
                v3::decode(frames).map(|(instruction, dims)| Self::V3 { instruction, dims })
            }
            ProtocolVersion::V4 => v4::decode(frames).map(Self::V4),
        }
    }

    /// Group size announced by a request header frame
    pub fn expected_frames(header: &Frame) -> Result<usize> {
        if header.index() != 0 {
            return Err(Error::SequenceError {
                position: 0,
                expected: 0,
                actual: header.index().into(),
            });
        }

        Ok(match ProtocolVersion::try_from(header.as_bytes()[3])? {
            ProtocolVersion::V1 => v1::FRAME_COUNT,
            ProtocolVersion::V2 => v2::FRAME_COUNT,
            ProtocolVersion::V3 => v3::FRAME_COUNT,
            ProtocolVersion::V4 => v4::frame_count(header.as_bytes()[5].into()),
        })
    }
}

impl From<BatchInstruction> for Instruction {
    fn from(batch: BatchInstruction) -> Self {
        Self::V4(batch)
    }
}

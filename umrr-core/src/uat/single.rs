//! Frame layouts shared by UAT format versions 1 to 3
//!
//! ```text
//! header     ┌ UAT-ID (2) ┬ 0 ┬ version ┬ parameter number (2) ┬ CRC (2) ┐
//! parameter  ├ UAT-ID (2) ┼ 1 ┼ dev|type┼ value (4)                     ┤
//! dimensions └ UAT-ID (2) ┴ n ┴ 0       ┴ dim n..n+3 (4)                ┘
//! ```
//!
//! Byte 3 of the parameter frame packs the device id into its high nibble
//! and the parameter type into its low nibble, which caps device ids at 15.
//! The parameter type travels only there; the header carries just the
//! parameter number, so a group whose parameter frame is lost cannot be
//! typed.

use tracing::trace;

use crate::constants::MAX_SINGLE_DEVICE_ID;
use crate::crc;
use crate::error::{Error, Result};
use crate::frame::{self, Frame, FrameWriter};
use crate::protocol::{ParameterType, ProtocolVersion, Value};

const DIMS_PER_FRAME: usize = 4;

/// A single parameter or status instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleInstruction {
    /// Parameter section the instruction addresses
    pub uat_id: u16,

    /// Target device on a shared bus (0-15)
    pub device_id: u8,

    pub parameter_number: u16,

    /// Access and data format of `value`
    pub parameter_type: ParameterType,

    pub value: Value,
}

impl SingleInstruction {
    /// Check field ranges and that the value matches the parameter type
    pub fn validate(&self) -> Result<()> {
        if self.device_id > MAX_SINGLE_DEVICE_ID {
            return Err(Error::FieldOutOfRange {
                field: "device id",
                value: self.device_id.into(),
                max: MAX_SINGLE_DEVICE_ID.into(),
            });
        }
        self.value.expect_format(self.parameter_type.format())
    }
}

fn header(uat_id: u16, version: ProtocolVersion, parameter_number: u16, crc: u16) -> Frame {
    FrameWriter::new(uat_id)
        .u8(0)
        .u8(version.into())
        .u16(parameter_number)
        .u16(crc)
        .finish()
}

/// Header bytes 0-5 followed by every data frame
pub(crate) fn crc_input(frames: &[Frame]) -> Vec<u8> {
    let Some((header, data)) = frames.split_first() else {
        return Vec::new();
    };

    let mut buf = Vec::with_capacity(6 + data.len() * Frame::SIZE);
    buf.extend_from_slice(&header.as_bytes()[..6]);
    for frame in data {
        buf.extend_from_slice(frame.as_bytes());
    }
    buf
}

pub(crate) fn encode<const D: usize>(
    version: ProtocolVersion,
    instruction: &SingleInstruction,
    dims: &[u8; D],
) -> Result<Vec<Frame>> {
    debug_assert_eq!(D, version.dimensions());
    instruction.validate()?;

    let uat_id = instruction.uat_id;
    let mut frames = Vec::with_capacity(2 + D / DIMS_PER_FRAME);
    frames.push(header(uat_id, version, instruction.parameter_number, 0));
    frames.push(
        FrameWriter::new(uat_id)
            .u8(1)
            .u8(instruction.device_id << 4 | instruction.parameter_type as u8)
            .bytes(&instruction.value.to_le_bytes())
            .finish(),
    );
    for (i, chunk) in dims.chunks(DIMS_PER_FRAME).enumerate() {
        frames.push(
            FrameWriter::new(uat_id)
                .u8(2 + i as u8)
                .u8(0)
                .bytes(chunk)
                .finish(),
        );
    }

    let crc = crc::calculate(&crc_input(&frames));
    frames[0] = header(uat_id, version, instruction.parameter_number, crc);

    trace!(
        version = %version,
        uat_id = uat_id,
        parameter = instruction.parameter_number,
        frames = frames.len(),
        "Encoded instruction"
    );

    Ok(frames)
}

pub(crate) fn decode<const D: usize>(
    version: ProtocolVersion,
    frames: &[Frame],
) -> Result<(SingleInstruction, [u8; D])> {
    frame::expect_count(frames, 2 + D / DIMS_PER_FRAME)?;

    let header = &frames[0];
    let actual = header.as_bytes()[3];
    if actual != u8::from(version) {
        return Err(Error::VersionMismatch {
            expected: u8::from(version).into(),
            actual: actual.into(),
        });
    }

    frame::expect_sequence(frames)?;
    let uat_id = frame::expect_uniform_channel(frames)?;

    let received = header.u16_at(6);
    let calculated = crc::calculate(&crc_input(frames));
    if calculated != received {
        return Err(Error::CrcError {
            calculated,
            received,
        });
    }

    let packed = frames[1].as_bytes()[3];
    let parameter_type = ParameterType::try_from(packed & 0x0F)?;
    let value = Value::from_le_bytes(parameter_type.format(), frames[1].word_at(4));

    let mut dims = [0u8; D];
    for (chunk, frame) in dims.chunks_mut(DIMS_PER_FRAME).zip(&frames[2..]) {
        chunk.copy_from_slice(&frame.as_bytes()[4..8]);
    }

    Ok((
        SingleInstruction {
            uat_id,
            device_id: packed >> 4,
            parameter_number: header.u16_at(4),
            parameter_type,
            value,
        },
        dims,
    ))
}

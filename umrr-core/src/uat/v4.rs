//! UAT format version 4: batched sub-instructions
//!
//! ```text
//! header       ┌ UAT-ID (2) ┬ 0      ┬ 4       ┬ device ┬ count ┬ CRC (2)          ┐
//! instruction  ├ UAT-ID (2) ┼ 1 + 2i ┼ msgtype ┼ parameter (2)   ┼ dim0 ┼ dim1      ┤
//! value        └ UAT-ID (2) ┴ 2 + 2i ┴ format  ┴ value (4)                          ┘
//! ```

use tracing::trace;

use crate::constants::MAX_BATCH_INSTRUCTIONS;
use crate::crc;
use crate::error::{Error, Result};
use crate::frame::{self, Frame, FrameWriter};
use crate::protocol::{DataFormat, MessageType, ProtocolVersion, Value};

const VERSION: u8 = 4;

/// One instruction inside a v4 batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubInstruction {
    /// Position of this instruction inside its batch
    pub index: u8,

    pub message_type: MessageType,

    pub parameter_number: u16,

    pub dims: [u8; 2],

    /// Declared representation of `value`
    pub data_format: DataFormat,

    pub value: Value,
}

impl SubInstruction {
    /// Parameter access carrying `value` in its own format
    pub fn new(message_type: MessageType, parameter_number: u16, value: Value) -> Self {
        Self {
            index: 0,
            message_type,
            parameter_number,
            dims: [0, 0],
            data_format: value.format(),
            value,
        }
    }

    pub fn with_dims(mut self, dims: [u8; 2]) -> Self {
        self.dims = dims;
        self
    }
}

/// A batch of sub-instructions sharing one UAT-ID and device
#[derive(Debug, Clone, PartialEq)]
pub struct BatchInstruction {
    pub uat_id: u16,
    pub device_id: u8,
    pub instructions: Vec<SubInstruction>,
}

impl BatchInstruction {
    pub fn new(uat_id: u16, device_id: u8) -> Self {
        Self {
            uat_id,
            device_id,
            instructions: Vec::new(),
        }
    }

    /// Append a sub-instruction, assigning it the next index
    pub fn with_instruction(mut self, mut instruction: SubInstruction) -> Self {
        instruction.index = self.instructions.len() as u8;
        self.instructions.push(instruction);
        self
    }

    /// Check batch size, index order and value formats
    pub fn validate(&self) -> Result<()> {
        if self.instructions.len() > MAX_BATCH_INSTRUCTIONS {
            return Err(Error::FieldOutOfRange {
                field: "instruction count",
                value: self.instructions.len() as u32,
                max: MAX_BATCH_INSTRUCTIONS as u32,
            });
        }

        for (position, instruction) in self.instructions.iter().enumerate() {
            if usize::from(instruction.index) != position {
                return Err(Error::SequenceError {
                    position,
                    expected: position as u16,
                    actual: instruction.index.into(),
                });
            }
            instruction.value.expect_format(instruction.data_format)?;
        }
        Ok(())
    }
}

/// Frames in a v4 group carrying `instructions` sub-instructions
pub fn frame_count(instructions: usize) -> usize {
    1 + 2 * instructions
}

fn header(uat_id: u16, device_id: u8, count: u8, crc: u16) -> Frame {
    FrameWriter::new(uat_id)
        .u8(0)
        .u8(VERSION)
        .u8(device_id)
        .u8(count)
        .u16(crc)
        .finish()
}

/// Bytes protected by the header CRC: header bytes 0-5, then every instruction frame
pub fn crc_input(frames: &[Frame]) -> Vec<u8> {
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

pub fn encode(batch: &BatchInstruction) -> Result<Vec<Frame>> {
    batch.validate()?;

    let uat_id = batch.uat_id;
    let count = batch.instructions.len() as u8;
    let mut frames = Vec::with_capacity(frame_count(batch.instructions.len()));
    frames.push(header(uat_id, batch.device_id, count, 0));

    for instruction in &batch.instructions {
        let index = 1 + 2 * instruction.index;
        frames.push(
            FrameWriter::new(uat_id)
                .u8(index)
                .u8(instruction.message_type as u8)
                .u16(instruction.parameter_number)
                .bytes(&instruction.dims)
                .finish(),
        );
        frames.push(
            FrameWriter::new(uat_id)
                .u8(index + 1)
                .u8(instruction.data_format as u8)
                .bytes(&instruction.value.to_le_bytes())
                .finish(),
        );
    }

    let crc = crc::calculate(&crc_input(&frames));
    frames[0] = header(uat_id, batch.device_id, count, crc);

    trace!(
        version = %ProtocolVersion::V4,
        uat_id = uat_id,
        instructions = count,
        "Encoded instruction batch"
    );

    Ok(frames)
}

pub fn decode(frames: &[Frame]) -> Result<BatchInstruction> {
    let Some(header) = frames.first() else {
        return Err(Error::MalformedGroup("empty frame group".into()));
    };

    let version = header.as_bytes()[3];
    if version != VERSION {
        return Err(Error::VersionMismatch {
            expected: VERSION.into(),
            actual: version.into(),
        });
    }

    let count = usize::from(header.as_bytes()[5]);
    frame::expect_count(frames, frame_count(count))?;
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

    let mut instructions = Vec::with_capacity(count);
    for (index, pair) in frames[1..].chunks_exact(2).enumerate() {
        let (first, second) = (pair[0].as_bytes(), pair[1].as_bytes());
        let data_format = DataFormat::try_from(second[3])?;
        instructions.push(SubInstruction {
            index: index as u8,
            message_type: MessageType::try_from(first[3])?,
            parameter_number: pair[0].u16_at(4),
            dims: [first[6], first[7]],
            data_format,
            value: Value::from_le_bytes(data_format, pair[1].word_at(4)),
        });
    }

    Ok(BatchInstruction {
        uat_id,
        device_id: header.as_bytes()[4],
        instructions,
    })
}

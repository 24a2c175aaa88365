//! UDT type 17000 version 5: answer to a UAT v4 batch
//!
//! ```text
//! header       ┌ 17000 (2) ┬ version 5 (2)     ┬ device  ┬ count ┬ CRC (2)    ┐
//! instruction  ├ 17016 (2) ┼ counter ┼ msgtype ┼ UAT-ID (2)      ┼ param (2)  ┤
//! result       ├ 17017 (2) ┼ counter ┼ result  ┼ value (4)                    ┤
//! format       └ 17018 (2) ┴ counter ┴ format  ┴ dim0    ┴ dim1  ┴ 0 0        ┘
//! ```
//!
//! There is no footer; the CRC covers the instruction frames only.

use tracing::trace;

use crate::constants::{MAX_BATCH_INSTRUCTIONS, udt};
use crate::crc;
use crate::error::{Error, Result};
use crate::frame::{self, Frame, FrameWriter};
use crate::protocol::{DataFormat, MessageType, ResultCode, Value};

use super::single::{expect_header, expect_slots};

const VERSION: u16 = 5;

/// Sensor answer to one sub-instruction of a v4 batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstructionResult {
    /// Counter shared by the three frames of this result
    pub counter: u8,

    pub message_type: MessageType,

    pub uat_id: u16,

    pub parameter_number: u16,

    pub result: ResultCode,

    pub data_format: DataFormat,

    pub dims: [u8; 2],

    pub value: Value,
}

/// Sensor answer to a v4 batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    pub device_id: u8,
    pub results: Vec<InstructionResult>,
}

impl BatchResponse {
    pub fn validate(&self) -> Result<()> {
        if self.results.len() > MAX_BATCH_INSTRUCTIONS {
            return Err(Error::FieldOutOfRange {
                field: "instruction count",
                value: self.results.len() as u32,
                max: MAX_BATCH_INSTRUCTIONS as u32,
            });
        }
        for result in &self.results {
            result.value.expect_format(result.data_format)?;
        }
        Ok(())
    }
}

/// Frames in a version 5 group carrying `instructions` results
pub fn frame_count(instructions: usize) -> usize {
    1 + 3 * instructions
}

fn header(device_id: u8, count: u8, crc: u16) -> Frame {
    FrameWriter::new(udt::HEADER)
        .u16(VERSION)
        .u8(device_id)
        .u8(count)
        .u16(crc)
        .finish()
}

/// UDT index expected at `position` of a group
pub fn slot_index(position: usize) -> u16 {
    match position {
        0 => udt::HEADER,
        p => match (p - 1) % 3 {
            0 => udt::V5_INSTRUCTION,
            1 => udt::V5_RESULT,
            _ => udt::V5_FORMAT,
        },
    }
}

/// Bytes protected by the CRC: every instruction frame, header excluded
pub fn crc_input(frames: &[Frame]) -> Vec<u8> {
    frames
        .iter()
        .skip(1)
        .flat_map(|frame| frame.as_bytes().iter().copied())
        .collect()
}

pub fn encode(response: &BatchResponse) -> Result<Vec<Frame>> {
    response.validate()?;

    let count = response.results.len() as u8;
    let mut frames = Vec::with_capacity(frame_count(response.results.len()));
    frames.push(header(response.device_id, count, 0));

    for result in &response.results {
        frames.push(
            FrameWriter::new(udt::V5_INSTRUCTION)
                .u8(result.counter)
                .u8(result.message_type as u8)
                .u16(result.uat_id)
                .u16(result.parameter_number)
                .finish(),
        );
        frames.push(
            FrameWriter::new(udt::V5_RESULT)
                .u8(result.counter)
                .u8(result.result.into())
                .bytes(&result.value.to_le_bytes())
                .finish(),
        );
        frames.push(
            FrameWriter::new(udt::V5_FORMAT)
                .u8(result.counter)
                .u8(result.data_format as u8)
                .bytes(&result.dims)
                .finish(),
        );
    }

    let crc = crc::calculate(&crc_input(&frames));
    frames[0] = header(response.device_id, count, crc);

    trace!(
        udt_version = VERSION,
        results = count,
        "Encoded batch response"
    );

    Ok(frames)
}

pub fn decode(frames: &[Frame]) -> Result<BatchResponse> {
    let Some(header) = frames.first() else {
        return Err(Error::MalformedGroup("empty frame group".into()));
    };
    expect_header(header, VERSION)?;

    let count = usize::from(header.as_bytes()[5]);
    frame::expect_count(frames, frame_count(count))?;
    expect_slots(frames, slot_index)?;

    let received = header.u16_at(6);
    let calculated = crc::calculate(&crc_input(frames));
    if calculated != received {
        return Err(Error::CrcError {
            calculated,
            received,
        });
    }

    let mut results = Vec::with_capacity(count);
    for triple in frames[1..].chunks_exact(3) {
        let (instruction, result, format) =
            (triple[0].as_bytes(), triple[1].as_bytes(), triple[2].as_bytes());

        let counter = instruction[2];
        for actual in [result[2], format[2]] {
            if actual != counter {
                return Err(Error::CounterMismatch {
                    expected: counter,
                    actual,
                });
            }
        }

        let data_format = DataFormat::try_from(format[3])?;
        results.push(InstructionResult {
            counter,
            message_type: MessageType::try_from(instruction[3])?,
            uat_id: triple[0].u16_at(4),
            parameter_number: triple[0].u16_at(6),
            result: ResultCode::from(result[3]),
            data_format,
            dims: [format[4], format[5]],
            value: Value::from_le_bytes(data_format, triple[1].word_at(4)),
        });
    }

    Ok(BatchResponse {
        device_id: header.as_bytes()[4],
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(counter: u8, parameter_number: u16, value: Value) -> InstructionResult {
        InstructionResult {
            counter,
            message_type: MessageType::ParameterWriteRead,
            uat_id: 2010,
            parameter_number,
            result: ResultCode::Success,
            data_format: value.format(),
            dims: [0, 1],
            value,
        }
    }

    fn response() -> BatchResponse {
        BatchResponse {
            device_id: 3,
            results: vec![
                result(1, 10, Value::Integer(-7)),
                result(2, 11, Value::Float(2.5)),
                result(3, 12, Value::Integer(99)),
            ],
        }
    }

    #[test]
    fn test_layout() {
        let frames = encode(&response()).unwrap();

        assert_eq!(frames.len(), 10);
        assert_eq!(&frames[0].as_bytes()[..6], &[0x68, 0x42, 5, 0, 3, 3]);
        assert_eq!(frames[4].as_bytes(), &[0x98, 0x42, 2, 4, 0xDA, 0x07, 11, 0]);
        assert_eq!(frames[6].as_bytes(), &[0x9A, 0x42, 2, 1, 0, 1, 0, 0]);
        assert_eq!(crc_input(&frames).len(), 9 * 8);
        assert_eq!(crc::calculate(&crc_input(&frames)), frames[0].u16_at(6));
    }

    #[test]
    fn test_round_trip() {
        let original = response();
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_empty_batch_is_header_only() {
        let empty = BatchResponse {
            device_id: 0,
            results: Vec::new(),
        };
        let frames = encode(&empty).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].u16_at(6), 0xFFFF);
        assert_eq!(decode(&frames).unwrap(), empty);
    }

    #[test]
    fn test_reject_counter_mismatch() {
        let mut frames = encode(&response()).unwrap();
        let mut raw = *frames[6].as_bytes();
        raw[2] = 7;
        frames[6] = Frame::new(raw);

        let crc = crc::calculate(&crc_input(&frames));
        let mut head = *frames[0].as_bytes();
        head[6..8].copy_from_slice(&crc.to_le_bytes());
        frames[0] = Frame::new(head);

        assert_eq!(
            decode(&frames).unwrap_err(),
            Error::CounterMismatch { expected: 2, actual: 7 }
        );
    }

    #[test]
    fn test_reject_shuffled_triple() {
        let mut frames = encode(&response()).unwrap();
        frames.swap(4, 5);
        assert_eq!(
            decode(&frames).unwrap_err(),
            Error::SequenceError { position: 4, expected: 17016, actual: 17017 }
        );
    }

    #[test]
    fn test_reject_truncated_group() {
        let frames = encode(&response()).unwrap();
        assert!(matches!(decode(&frames[..9]), Err(Error::MalformedGroup(_))));
    }

    #[test]
    fn test_reject_corrupted_value() {
        let mut frames = encode(&response()).unwrap();
        let mut raw = *frames[2].as_bytes();
        raw[5] ^= 0x80;
        frames[2] = Frame::new(raw);
        assert!(matches!(decode(&frames), Err(Error::CrcError { .. })));
    }
}

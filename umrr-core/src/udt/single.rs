//! Frame layouts shared by UDT type 17000 versions 2 to 4
//!
//! ```text
//! header      ┌ 17000 (2)  ┬ version (2)      ┬ 0 0 0 0                       ┐
//! parameter   ├ base (2)   ┼ counter ┼ result ┼ device ┼ type ┼ parameter (2) ┤
//! crc         ├ base+1 (2) ┼ counter ┼ 0      ┼ UAT-ID (2)    ┼ CRC (2)       ┤
//! dimensions  ├ base+2..   ┼ counter ┼ 0      ┼ dim a  ┼ dim b ┼ 0 0          ┤
//! value       ├ last (2)   ┼ counter ┼ 0      ┼ value (4)                     ┤
//! footer      └ 17000 (2)  ┴ version (2)      ┴ 0 0 0 0                       ┘
//! ```

use tracing::trace;

use crate::constants::udt;
use crate::crc;
use crate::error::{Error, Result};
use crate::frame::{self, Frame, FrameWriter};
use crate::protocol::{ParameterType, ResultCode, Value};

const DIMS_PER_FRAME: usize = 2;

/// Slot positions of one single-instruction response layout
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    /// UDT type 17000 version
    pub version: u16,
    /// UDT index of the parameter-type frame
    pub base: u16,
}

impl Layout {
    pub(crate) const fn frame_count(&self, dims: usize) -> usize {
        5 + dims / DIMS_PER_FRAME
    }

    /// UDT index expected at each position of the group
    pub(crate) fn slot_index(&self, position: usize, frames: usize) -> u16 {
        if position == 0 || position == frames - 1 {
            udt::HEADER
        } else {
            self.base + (position as u16 - 1)
        }
    }
}

/// A sensor answer to one UAT v1-v3 instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleResponse {
    /// Section the answered instruction addressed
    pub uat_id: u16,

    /// Message counter shared by all frames of the group
    pub counter: u8,

    pub result: ResultCode,

    pub device_id: u8,

    pub parameter_number: u16,

    pub parameter_type: ParameterType,

    pub value: Value,
}

impl SingleResponse {
    pub fn validate(&self) -> Result<()> {
        self.value.expect_format(self.parameter_type.format())
    }
}

fn header(version: u16) -> Frame {
    FrameWriter::new(udt::HEADER).u16(version).finish()
}

/// Parameter-type bytes 2-7, CRC-frame bytes 2-5, then bytes 2-7 of each later
/// frame up to the footer
pub(crate) fn crc_input(frames: &[Frame]) -> Vec<u8> {
    if frames.len() < 4 {
        return Vec::new();
    }

    let body = &frames[1..frames.len() - 1];
    let mut buf = Vec::with_capacity(body.len() * 6);
    buf.extend_from_slice(&body[0].as_bytes()[2..8]);
    buf.extend_from_slice(&body[1].as_bytes()[2..6]);
    for frame in &body[2..] {
        buf.extend_from_slice(&frame.as_bytes()[2..8]);
    }
    buf
}

fn crc_frame(layout: &Layout, response: &SingleResponse, crc: u16) -> Frame {
    FrameWriter::new(layout.base + 1)
        .u8(response.counter)
        .u8(0)
        .u16(response.uat_id)
        .u16(crc)
        .finish()
}

pub(crate) fn encode<const D: usize>(
    layout: Layout,
    response: &SingleResponse,
    dims: &[u8; D],
) -> Result<Vec<Frame>> {
    response.validate()?;

    let counter = response.counter;
    let mut frames = Vec::with_capacity(layout.frame_count(D));
    frames.push(header(layout.version));
    frames.push(
        FrameWriter::new(layout.base)
            .u8(counter)
            .u8(response.result.into())
            .u8(response.device_id)
            .u8(response.parameter_type as u8)
            .u16(response.parameter_number)
            .finish(),
    );
    frames.push(crc_frame(&layout, response, 0));

    let mut index = layout.base + 2;
    for chunk in dims.chunks(DIMS_PER_FRAME) {
        frames.push(FrameWriter::new(index).u8(counter).u8(0).bytes(chunk).finish());
        index += 1;
    }
    frames.push(
        FrameWriter::new(index)
            .u8(counter)
            .u8(0)
            .bytes(&response.value.to_le_bytes())
            .finish(),
    );
    frames.push(header(layout.version));

    let crc = crc::calculate(&crc_input(&frames));
    frames[2] = crc_frame(&layout, response, crc);

    trace!(
        udt_version = layout.version,
        uat_id = response.uat_id,
        frames = frames.len(),
        "Encoded response"
    );

    Ok(frames)
}

/// Reject a response group whose UDT indices do not fill their slots
pub(crate) fn expect_slots(frames: &[Frame], slot: impl Fn(usize) -> u16) -> Result<()> {
    for (position, frame) in frames.iter().enumerate() {
        let expected = slot(position);
        let actual = frame.channel_id();
        if actual == expected {
            continue;
        }
        if !udt::is_family(actual) {
            return Err(Error::ChannelIdMismatch { expected, actual });
        }
        return Err(Error::SequenceError {
            position,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Reject a group whose header is not a type 17000 header of `version`
pub(crate) fn expect_header(header: &Frame, version: u16) -> Result<()> {
    if header.channel_id() != udt::HEADER {
        return Err(Error::ChannelIdMismatch {
            expected: udt::HEADER,
            actual: header.channel_id(),
        });
    }
    let actual = header.u16_at(2);
    if actual != version {
        return Err(Error::VersionMismatch {
            expected: version,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn decode<const D: usize>(
    layout: Layout,
    frames: &[Frame],
) -> Result<(SingleResponse, [u8; D])> {
    let count = layout.frame_count(D);
    frame::expect_count(frames, count)?;
    expect_header(&frames[0], layout.version)?;

    if frames[count - 1] != frames[0] {
        return Err(Error::FooterMismatch);
    }
    expect_slots(frames, |position| layout.slot_index(position, count))?;

    let crc_frame = &frames[2];
    let received = crc_frame.u16_at(6);
    let calculated = crc::calculate(&crc_input(frames));
    if calculated != received {
        return Err(Error::CrcError {
            calculated,
            received,
        });
    }

    let body = &frames[1..count - 1];
    let counter = body[0].as_bytes()[2];
    for frame in &body[1..] {
        let actual = frame.as_bytes()[2];
        if actual != counter {
            return Err(Error::CounterMismatch {
                expected: counter,
                actual,
            });
        }
    }

    let parameter = body[0].as_bytes();
    let parameter_type = ParameterType::try_from(parameter[5])?;
    let value_frame = &body[body.len() - 1];

    let mut dims = [0u8; D];
    for (chunk, frame) in dims.chunks_mut(DIMS_PER_FRAME).zip(&body[2..]) {
        chunk.copy_from_slice(&frame.as_bytes()[4..6]);
    }

    Ok((
        SingleResponse {
            uat_id: crc_frame.u16_at(4),
            counter,
            result: ResultCode::from(parameter[3]),
            device_id: parameter[4],
            parameter_number: body[0].u16_at(6),
            parameter_type,
            value: Value::from_le_bytes(parameter_type.format(), value_frame.word_at(4)),
        },
        dims,
    ))
}

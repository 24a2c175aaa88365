//! UAT format version 1: a header and one parameter frame

use crate::error::Result;
use crate::frame::Frame;
use crate::protocol::ProtocolVersion;

use super::single::{self, SingleInstruction};

/// Frames in every v1 group
pub const FRAME_COUNT: usize = 2;

pub fn encode(instruction: &SingleInstruction) -> Result<Vec<Frame>> {
    single::encode(ProtocolVersion::V1, instruction, &[])
}

pub fn decode(frames: &[Frame]) -> Result<SingleInstruction> {
    single::decode::<0>(ProtocolVersion::V1, frames).map(|(instruction, _)| instruction)
}

/// Bytes protected by the header CRC: header bytes 0-5, then the parameter frame
pub fn crc_input(frames: &[Frame]) -> Vec<u8> {
    single::crc_input(frames)
}

//! UDT type 17000 version 4: answer to a UAT v3 instruction

use crate::constants::udt;
use crate::error::Result;
use crate::frame::Frame;

use super::single::{self, Layout, SingleResponse};

const LAYOUT: Layout = Layout {
    version: 4,
    base: udt::V4_BASE,
};

/// Frames in every version 4 group
pub const FRAME_COUNT: usize = LAYOUT.frame_count(8);

pub fn encode(response: &SingleResponse, dims: &[u8; 8]) -> Result<Vec<Frame>> {
    single::encode(LAYOUT, response, dims)
}

pub fn decode(frames: &[Frame]) -> Result<(SingleResponse, [u8; 8])> {
    single::decode(LAYOUT, frames)
}

/// UDT index expected at `position` of a group
pub fn slot_index(position: usize) -> u16 {
    LAYOUT.slot_index(position, FRAME_COUNT)
}

/// Bytes protected by the CRC: parameter-type bytes 2-7, CRC-frame bytes 2-5,
/// then bytes 2-7 of the four dimension frames and the value frame
pub fn crc_input(frames: &[Frame]) -> Vec<u8> {
    single::crc_input(frames)
}

//! UDT type 17000 version 3: answer to a UAT v2 instruction

use crate::constants::udt;
use crate::error::Result;
use crate::frame::Frame;

use super::single::{self, Layout, SingleResponse};

const LAYOUT: Layout = Layout {
    version: 3,
    base: udt::V3_BASE,
};

/// Frames in every version 3 group
pub const FRAME_COUNT: usize = LAYOUT.frame_count(4);

pub fn encode(response: &SingleResponse, dims: &[u8; 4]) -> Result<Vec<Frame>> {
    single::encode(LAYOUT, response, dims)
}

pub fn decode(frames: &[Frame]) -> Result<(SingleResponse, [u8; 4])> {
    single::decode(LAYOUT, frames)
}

/// UDT index expected at `position` of a group
pub fn slot_index(position: usize) -> u16 {
    LAYOUT.slot_index(position, FRAME_COUNT)
}

/// Bytes protected by the CRC: parameter-type bytes 2-7, CRC-frame bytes 2-5,
/// then bytes 2-7 of both dimension frames and the value frame
pub fn crc_input(frames: &[Frame]) -> Vec<u8> {
    single::crc_input(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::{DataFormat, ParameterType, ResultCode, Value};
    use pretty_assertions::assert_eq;

    fn response() -> SingleResponse {
        SingleResponse {
            uat_id: 3010,
            counter: 1,
            result: ResultCode::Success,
            device_id: 2,
            parameter_number: 8,
            parameter_type: ParameterType::FloatReadWrite,
            value: Value::Float(3.5),
        }
    }

    #[test]
    fn test_layout() {
        let frames = encode(&response(), &[10, 20, 30, 40]).unwrap();

        assert_eq!(frames.len(), FRAME_COUNT);
        let indices: Vec<u16> = frames.iter().map(Frame::channel_id).collect();
        assert_eq!(indices, vec![17000, 17004, 17005, 17006, 17007, 17008, 17000]);
        assert_eq!(&frames[3].as_bytes()[4..], &[10, 20, 0, 0]);
        assert_eq!(&frames[4].as_bytes()[4..], &[30, 40, 0, 0]);
        assert_eq!(crc_input(&frames).len(), 6 + 4 + 3 * 6);
    }

    #[test]
    fn test_round_trip() {
        let frames = encode(&response(), &[1, 2, 3, 4]).unwrap();
        assert_eq!(decode(&frames).unwrap(), (response(), [1, 2, 3, 4]));
    }

    #[test]
    fn test_value_type_mismatch_produces_no_frames() {
        let crafted = SingleResponse {
            value: Value::Integer(3),
            ..response()
        };
        assert_eq!(
            encode(&crafted, &[0, 1, 2, 3]).unwrap_err(),
            Error::TypeMismatch {
                declared: DataFormat::Float,
                actual: DataFormat::Integer,
            }
        );
    }
}

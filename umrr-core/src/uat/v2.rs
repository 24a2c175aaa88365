//! UAT format version 2: v1 plus one frame of four dimension bytes

use crate::error::Result;
use crate::frame::Frame;
use crate::protocol::ProtocolVersion;

use super::single::{self, SingleInstruction};

/// Frames in every v2 group
pub const FRAME_COUNT: usize = 3;

pub fn encode(instruction: &SingleInstruction, dims: &[u8; 4]) -> Result<Vec<Frame>> {
    single::encode(ProtocolVersion::V2, instruction, dims)
}

pub fn decode(frames: &[Frame]) -> Result<(SingleInstruction, [u8; 4])> {
    single::decode(ProtocolVersion::V2, frames)
}

/// Bytes protected by the header CRC: header bytes 0-5, the parameter frame, the dimension frame
pub fn crc_input(frames: &[Frame]) -> Vec<u8> {
    single::crc_input(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::{ParameterType, Value};
    use pretty_assertions::assert_eq;

    fn instruction() -> SingleInstruction {
        SingleInstruction {
            uat_id: 3010,
            device_id: 3,
            parameter_number: 12,
            parameter_type: ParameterType::IntegerReadWrite,
            value: Value::Integer(-40),
        }
    }

    #[test]
    fn test_dimension_frame_layout() {
        let frames = encode(&instruction(), &[1, 2, 3, 4]).unwrap();

        assert_eq!(frames.len(), FRAME_COUNT);
        assert_eq!(frames[0].as_bytes()[3], 2);
        assert_eq!(frames[2].as_bytes(), &[0xC2, 0x0B, 2, 0, 1, 2, 3, 4]);
        assert_eq!(crc_input(&frames).len(), 6 + 2 * 8);
    }

    #[test]
    fn test_round_trip() {
        let frames = encode(&instruction(), &[9, 8, 7, 6]).unwrap();
        assert_eq!(decode(&frames).unwrap(), (instruction(), [9, 8, 7, 6]));
    }

    #[test]
    fn test_dimension_change_breaks_crc() {
        let frames = encode(&instruction(), &[1, 2, 3, 4]).unwrap();
        let mut dims = *frames[2].as_bytes();
        dims[7] = 5;
        let tampered = [frames[0], frames[1], Frame::new(dims)];
        assert!(matches!(decode(&tampered), Err(Error::CrcError { .. })));
    }

    #[test]
    fn test_reject_v1_group() {
        let frames = super::super::v1::encode(&instruction()).unwrap();
        assert!(matches!(decode(&frames), Err(Error::MalformedGroup(_))));
    }
}

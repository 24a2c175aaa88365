//! UAT format version 3: v1 plus two frames of four dimension bytes

use crate::error::Result;
use crate::frame::Frame;
use crate::protocol::ProtocolVersion;

use super::single::{self, SingleInstruction};

/// Frames in every v3 group
pub const FRAME_COUNT: usize = 4;

pub fn encode(instruction: &SingleInstruction, dims: &[u8; 8]) -> Result<Vec<Frame>> {
    single::encode(ProtocolVersion::V3, instruction, dims)
}

pub fn decode(frames: &[Frame]) -> Result<(SingleInstruction, [u8; 8])> {
    single::decode(ProtocolVersion::V3, frames)
}

/// Bytes protected by the header CRC: header bytes 0-5 and all three data frames
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
            uat_id: 3300,
            device_id: 1,
            parameter_number: 2,
            parameter_type: ParameterType::FloatReadWrite,
            value: Value::Float(0.5),
        }
    }

    #[test]
    fn test_round_trip() {
        let dims = [0, 1, 2, 3, 4, 5, 6, 7];
        let frames = encode(&instruction(), &dims).unwrap();

        assert_eq!(frames.len(), FRAME_COUNT);
        assert_eq!(frames[3].index(), 3);
        assert_eq!(&frames[3].as_bytes()[4..], &[4, 5, 6, 7]);
        assert_eq!(crc_input(&frames).len(), 6 + 3 * 8);
        assert_eq!(decode(&frames).unwrap(), (instruction(), dims));
    }

    #[test]
    fn test_reject_out_of_order_dimension_frames() {
        let frames = encode(&instruction(), &[0; 8]).unwrap();
        let shuffled = [frames[0], frames[1], frames[3], frames[2]];
        assert_eq!(
            decode(&shuffled).unwrap_err(),
            Error::SequenceError { position: 2, expected: 2, actual: 3 }
        );
    }
}

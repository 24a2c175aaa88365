//! UDT type 17000 version 2: answer to a UAT v1 instruction

use crate::constants::udt;
use crate::error::Result;
use crate::frame::Frame;

use super::single::{self, Layout, SingleResponse};

const LAYOUT: Layout = Layout {
    version: 2,
    base: udt::V2_BASE,
};

/// Frames in every version 2 group
pub const FRAME_COUNT: usize = LAYOUT.frame_count(0);

pub fn encode(response: &SingleResponse) -> Result<Vec<Frame>> {
    single::encode(LAYOUT, response, &[])
}

pub fn decode(frames: &[Frame]) -> Result<SingleResponse> {
    single::decode::<0>(LAYOUT, frames).map(|(response, _)| response)
}

/// UDT index expected at `position` of a group
pub fn slot_index(position: usize) -> u16 {
    LAYOUT.slot_index(position, FRAME_COUNT)
}

/// Bytes protected by the CRC: parameter-type bytes 2-7, CRC-frame bytes 2-5, value bytes 2-7
pub fn crc_input(frames: &[Frame]) -> Vec<u8> {
    single::crc_input(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc;
    use crate::error::Error;
    use crate::protocol::{ParameterType, ResultCode, Value};
    use pretty_assertions::assert_eq;

    fn response() -> SingleResponse {
        SingleResponse {
            uat_id: 0x3FB,
            counter: 9,
            result: ResultCode::Success,
            device_id: 0,
            parameter_number: 3042,
            parameter_type: ParameterType::IntegerRead,
            value: Value::Integer(1234),
        }
    }

    #[test]
    fn test_layout() {
        let frames = encode(&response()).unwrap();

        assert_eq!(frames.len(), FRAME_COUNT);
        assert_eq!(frames[0].as_bytes(), &[0x68, 0x42, 2, 0, 0, 0, 0, 0]);
        assert_eq!(frames[4], frames[0]);
        assert_eq!(frames[1].channel_id(), 17001);
        assert_eq!(&frames[1].as_bytes()[2..], &[9, 0, 0, 0, 0xE2, 0x0B]);
        assert_eq!(frames[2].channel_id(), 17002);
        assert_eq!(frames[2].u16_at(4), 0x3FB);
        assert_eq!(frames[3].channel_id(), 17003);
        assert_eq!(frames[3].word_at(4), 1234i32.to_le_bytes());
    }

    #[test]
    fn test_crc_span() {
        let frames = encode(&response()).unwrap();
        let input = crc_input(&frames);

        assert_eq!(input.len(), 6 + 4 + 6);
        assert_eq!(crc::calculate(&input), frames[2].u16_at(6));
    }

    #[test]
    fn test_round_trip_failure_code() {
        let failed = SingleResponse {
            result: ResultCode::Failure(4),
            ..response()
        };
        assert_eq!(decode(&encode(&failed).unwrap()).unwrap(), failed);
    }

    #[test]
    fn test_reject_footer_mismatch() {
        let mut frames = encode(&response()).unwrap();
        let mut footer = *frames[4].as_bytes();
        footer[7] = 1;
        frames[4] = Frame::new(footer);
        assert_eq!(decode(&frames).unwrap_err(), Error::FooterMismatch);
    }

    #[test]
    fn test_reject_counter_mismatch() {
        let mut frames = encode(&response()).unwrap();
        let mut value = *frames[3].as_bytes();
        value[2] = 10;
        frames[3] = Frame::new(value);

        let crc = crc::calculate(&crc_input(&frames));
        let mut crc_frame = *frames[2].as_bytes();
        crc_frame[6..8].copy_from_slice(&crc.to_le_bytes());
        frames[2] = Frame::new(crc_frame);

        assert_eq!(
            decode(&frames).unwrap_err(),
            Error::CounterMismatch { expected: 9, actual: 10 }
        );
    }

    #[test]
    fn test_reject_wrong_slot() {
        let frames = encode(&response()).unwrap();
        let shuffled = [frames[0], frames[2], frames[1], frames[3], frames[4]];
        assert_eq!(
            decode(&shuffled).unwrap_err(),
            Error::SequenceError { position: 1, expected: 17001, actual: 17002 }
        );
    }

    #[test]
    fn test_reject_foreign_frame() {
        let mut frames = encode(&response()).unwrap();
        let mut raw = *frames[3].as_bytes();
        raw[0..2].copy_from_slice(&0x0400u16.to_le_bytes());
        frames[3] = Frame::new(raw);
        assert_eq!(
            decode(&frames).unwrap_err(),
            Error::ChannelIdMismatch { expected: 17003, actual: 0x0400 }
        );
    }

    #[test]
    fn test_reject_version_3_group() {
        let mut frames = encode(&response()).unwrap();
        let header = Frame::new([0x68, 0x42, 3, 0, 0, 0, 0, 0]);
        frames[0] = header;
        frames[4] = header;
        assert_eq!(
            decode(&frames).unwrap_err(),
            Error::VersionMismatch { expected: 2, actual: 3 }
        );
    }
}

//! UDT type 17000 response codecs (sensor to host)
//!
//! | UDT version | answers | frames  |
//! |-------------|---------|---------|
//! | 2           | UAT v1  | 5       |
//! | 3           | UAT v2  | 7       |
//! | 4           | UAT v3  | 9       |
//! | 5           | UAT v4  | 1 + 3n  |

pub mod single;
pub mod v2;
pub mod v3;
pub mod v4;
pub mod v5;

use crate::constants::udt;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::protocol::{ProtocolVersion, ResultCode, Value};
use crate::uat::Instruction;

pub use single::SingleResponse;
pub use v5::{BatchResponse, InstructionResult};

/// A decoded instruction response, tagged by its UDT version
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    V2(SingleResponse),
    V3 {
        response: SingleResponse,
        dims: [u8; 4],
    },
    V4 {
        response: SingleResponse,
        dims: [u8; 8],
    },
    V5(BatchResponse),
}

impl Response {
    /// UDT type 17000 version on the wire
    pub fn udt_version(&self) -> u16 {
        match self {
            Self::V2(_) => 2,
            Self::V3 { .. } => 3,
            Self::V4 { .. } => 4,
            Self::V5(_) => 5,
        }
    }

    /// Request format this response answers
    pub fn answers(&self) -> ProtocolVersion {
        match self {
            Self::V2(_) => ProtocolVersion::V1,
            Self::V3 { .. } => ProtocolVersion::V2,
            Self::V4 { .. } => ProtocolVersion::V3,
            Self::V5(_) => ProtocolVersion::V4,
        }
    }

    /// Result code of every answered instruction, in order
    pub fn results(&self) -> Vec<ResultCode> {
        match self {
            Self::V2(response) | Self::V3 { response, .. } | Self::V4 { response, .. } => {
                vec![response.result]
            }
            Self::V5(batch) => batch.results.iter().map(|r| r.result).collect(),
        }
    }

    /// Value of the first answered instruction
    pub fn value(&self) -> Option<Value> {
        match self {
            Self::V2(response) | Self::V3 { response, .. } | Self::V4 { response, .. } => {
                Some(response.value)
            }
            Self::V5(batch) => batch.results.first().map(|r| r.value),
        }
    }

    /// Whether this response echoes the UAT-ID and parameter numbers of `instruction`
    pub fn is_answer_to(&self, instruction: &Instruction) -> bool {
        match (self, instruction) {
            (Self::V2(response), Instruction::V1(request))
            | (Self::V3 { response, .. }, Instruction::V2 { instruction: request, .. })
            | (Self::V4 { response, .. }, Instruction::V3 { instruction: request, .. }) => {
                response.uat_id == request.uat_id
                    && response.parameter_number == request.parameter_number
            }
            (Self::V5(batch), Instruction::V4(request)) => {
                batch.results.len() == request.instructions.len()
                    && batch
                        .results
                        .iter()
                        .zip(&request.instructions)
                        .all(|(result, sub)| {
                            result.uat_id == request.uat_id
                                && result.parameter_number == sub.parameter_number
                        })
            }
            _ => false,
        }
    }

    /// Fail with the first non-zero result code
    pub fn ensure_success(&self) -> Result<()> {
        match self.results().into_iter().find(|r| !r.is_success()) {
            Some(code) => Err(Error::Rejected { code: code.into() }),
            None => Ok(()),
        }
    }

    pub fn encode(&self) -> Result<Vec<Frame>> {
        match self {
            Self::V2(response) => v2::encode(response),
            Self::V3 { response, dims } => v3::encode(response, dims),
            Self::V4 { response, dims } => v4::encode(response, dims),
            Self::V5(batch) => v5::encode(batch),
        }
    }

    /// Decode a complete group of any supported version
    pub fn decode(frames: &[Frame]) -> Result<Self> {
        let header = frames
            .first()
            .ok_or_else(|| Error::MalformedGroup("empty frame group".into()))?;
        if header.channel_id() != udt::HEADER {
            return Err(Error::ChannelIdMismatch {
                expected: udt::HEADER,
                actual: header.channel_id(),
            });
        }

        match header.u16_at(2) {
            2 => v2::decode(frames).map(Self::V2),
            3 => v3::decode(frames).map(|(response, dims)| Self::V3 { response, dims }),
            4 => v4::decode(frames).map(|(response, dims)| Self::V4 { response, dims }),
            5 => v5::decode(frames).map(Self::V5),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    /// Group size announced by a frame, or `None` when it is not a response header
    pub fn expected_frames(header: &Frame) -> Result<Option<usize>> {
        if header.channel_id() != udt::HEADER {
            return Ok(None);
        }

        let count = match header.u16_at(2) {
            2 => v2::FRAME_COUNT,
            3 => v3::FRAME_COUNT,
            4 => v4::FRAME_COUNT,
            5 => v5::frame_count(header.as_bytes()[5].into()),
            other => return Err(Error::UnsupportedVersion(other)),
        };
        Ok(Some(count))
    }

    /// UDT index the frame at `position` of the group `header` opens must carry
    ///
    /// Returns `None` when `header` is not a supported response header.
    pub fn expected_index(header: &Frame, position: usize) -> Option<u16> {
        if header.channel_id() != udt::HEADER {
            return None;
        }

        match header.u16_at(2) {
            2 => Some(v2::slot_index(position)),
            3 => Some(v3::slot_index(position)),
            4 => Some(v4::slot_index(position)),
            5 => Some(v5::slot_index(position)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DataFormat, MessageType, ParameterType};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn value_strategy(format: DataFormat) -> BoxedStrategy<Value> {
        match format {
            DataFormat::Integer => any::<i32>().prop_map(Value::Integer).boxed(),
            DataFormat::Float => any::<f32>().prop_map(Value::Float).boxed(),
        }
    }

    fn single_strategy() -> impl Strategy<Value = SingleResponse> {
        (any::<u16>(), any::<u8>(), any::<u8>(), any::<u8>(), any::<u16>(), 0u8..=5)
            .prop_flat_map(|(uat_id, counter, result, device_id, parameter_number, ty)| {
                let parameter_type = ParameterType::try_from(ty).unwrap();
                value_strategy(parameter_type.format()).prop_map(move |value| SingleResponse {
                    uat_id,
                    counter,
                    result: ResultCode::from(result),
                    device_id,
                    parameter_number,
                    parameter_type,
                    value,
                })
            })
    }

    fn result_strategy() -> impl Strategy<Value = InstructionResult> {
        (any::<u8>(), 0u8..=4, any::<u16>(), any::<u16>(), any::<u8>(), any::<[u8; 2]>(), prop::bool::ANY)
            .prop_flat_map(|(counter, ty, uat_id, parameter_number, result, dims, float)| {
                let data_format = if float { DataFormat::Float } else { DataFormat::Integer };
                value_strategy(data_format).prop_map(move |value| InstructionResult {
                    counter,
                    message_type: MessageType::try_from(ty).unwrap(),
                    uat_id,
                    parameter_number,
                    result: ResultCode::from(result),
                    data_format,
                    dims,
                    value,
                })
            })
    }

    /// Decode with the codec of one UDT version, bypassing header dispatch
    fn decode_as(version: u16, frames: &[Frame]) -> Result<Response> {
        match version {
            2 => v2::decode(frames).map(Response::V2),
            3 => v3::decode(frames).map(|(response, dims)| Response::V3 { response, dims }),
            4 => v4::decode(frames).map(|(response, dims)| Response::V4 { response, dims }),
            _ => v5::decode(frames).map(Response::V5),
        }
    }

    /// Number of frames between the header and the footer (or group end)
    fn body_len(response: &Response, frames: &[Frame]) -> usize {
        match response {
            Response::V5(_) => frames.len() - 1,
            _ => frames.len() - 2,
        }
    }

    fn response_strategy() -> impl Strategy<Value = Response> {
        prop_oneof![
            single_strategy().prop_map(Response::V2),
            (single_strategy(), any::<[u8; 4]>())
                .prop_map(|(response, dims)| Response::V3 { response, dims }),
            (single_strategy(), any::<[u8; 8]>())
                .prop_map(|(response, dims)| Response::V4 { response, dims }),
            (any::<u8>(), prop::collection::vec(result_strategy(), 0..6))
                .prop_map(|(device_id, results)| Response::V5(BatchResponse { device_id, results })),
        ]
    }

    #[test]
    fn test_expected_frames() {
        let header = |version: u16, count: u8| {
            let v = version.to_le_bytes();
            Frame::new([0x68, 0x42, v[0], v[1], 0, count, 0, 0])
        };

        assert_eq!(Response::expected_frames(&header(2, 0)).unwrap(), Some(5));
        assert_eq!(Response::expected_frames(&header(3, 0)).unwrap(), Some(7));
        assert_eq!(Response::expected_frames(&header(4, 0)).unwrap(), Some(9));
        assert_eq!(Response::expected_frames(&header(5, 0)).unwrap(), Some(1));
        assert_eq!(Response::expected_frames(&header(5, 4)).unwrap(), Some(13));
        assert_eq!(
            Response::expected_frames(&header(7, 0)).unwrap_err(),
            Error::UnsupportedVersion(7)
        );
        assert_eq!(
            Response::expected_frames(&Frame::new([0x69, 0x42, 0, 0, 0, 0, 0, 0])).unwrap(),
            None
        );
    }

    #[test]
    fn test_expected_index() {
        let v2 = Frame::new([0x68, 0x42, 2, 0, 0, 0, 0, 0]);
        let slots: Vec<_> = (1..5).filter_map(|p| Response::expected_index(&v2, p)).collect();
        assert_eq!(slots, vec![17001, 17002, 17003, 17000]);

        let v4 = Frame::new([0x68, 0x42, 4, 0, 0, 0, 0, 0]);
        assert_eq!(Response::expected_index(&v4, 1), Some(17009));
        assert_eq!(Response::expected_index(&v4, 8), Some(17000));

        let v5 = Frame::new([0x68, 0x42, 5, 0, 0, 2, 0, 0]);
        assert_eq!(Response::expected_index(&v5, 1), Some(17016));
        assert_eq!(Response::expected_index(&v5, 5), Some(17017));
        assert_eq!(Response::expected_index(&v5, 6), Some(17018));

        assert_eq!(Response::expected_index(&Frame::new([0x69, 0x42, 2, 0, 0, 0, 0, 0]), 1), None);
        assert_eq!(Response::expected_index(&Frame::new([0x68, 0x42, 9, 0, 0, 0, 0, 0]), 1), None);
    }

    #[test]
    fn test_ensure_success() {
        let response = |codes: &[u8]| {
            Response::V5(BatchResponse {
                device_id: 0,
                results: codes
                    .iter()
                    .map(|&code| InstructionResult {
                        counter: 0,
                        message_type: MessageType::Status,
                        uat_id: 1,
                        parameter_number: 1,
                        result: ResultCode::from(code),
                        data_format: DataFormat::Integer,
                        dims: [0, 0],
                        value: Value::Integer(0),
                    })
                    .collect(),
            })
        };

        assert!(response(&[0, 0]).ensure_success().is_ok());
        assert_eq!(response(&[0, 6, 2]).ensure_success().unwrap_err(), Error::Rejected { code: 6 });
        assert_eq!(response(&[0, 6]).results(), vec![ResultCode::Success, ResultCode::Failure(6)]);
    }

    #[test]
    fn test_is_answer_to() {
        let request = Instruction::V1(crate::uat::SingleInstruction {
            uat_id: 2010,
            device_id: 0,
            parameter_number: 3,
            parameter_type: ParameterType::IntegerRead,
            value: Value::Integer(0),
        });
        let answer = SingleResponse {
            uat_id: 2010,
            counter: 0,
            result: ResultCode::Success,
            device_id: 0,
            parameter_number: 3,
            parameter_type: ParameterType::IntegerRead,
            value: Value::Integer(4),
        };

        assert!(Response::V2(answer).is_answer_to(&request));
        assert!(!Response::V2(SingleResponse { parameter_number: 4, ..answer }).is_answer_to(&request));
        assert!(!Response::V2(SingleResponse { uat_id: 2011, ..answer }).is_answer_to(&request));
        assert!(!Response::V3 { response: answer, dims: [0; 4] }.is_answer_to(&request));

        let batch = crate::uat::BatchInstruction::new(2010, 0).with_instruction(
            crate::uat::SubInstruction::new(MessageType::ParameterRead, 3, Value::Integer(0)),
        );
        let result = InstructionResult {
            counter: 0,
            message_type: MessageType::ParameterRead,
            uat_id: 2010,
            parameter_number: 3,
            result: ResultCode::Success,
            data_format: DataFormat::Integer,
            dims: [0, 0],
            value: Value::Integer(4),
        };
        let response = Response::V5(BatchResponse { device_id: 0, results: vec![result] });
        assert!(response.is_answer_to(&batch.clone().into()));
        let empty = Response::V5(BatchResponse { device_id: 0, results: Vec::new() });
        assert!(!empty.is_answer_to(&batch.into()));
    }

    #[test]
    fn test_decode_rejects_non_header() {
        let frame = Frame::new([0x69, 0x42, 2, 0, 0, 0, 0, 0]);
        assert_eq!(
            Response::decode(&[frame]).unwrap_err(),
            Error::ChannelIdMismatch { expected: 17000, actual: 17001 }
        );
        assert_eq!(
            Response::decode(&[Frame::new([0x68, 0x42, 9, 0, 0, 0, 0, 0])]).unwrap_err(),
            Error::UnsupportedVersion(9)
        );
    }

    proptest! {
        #[test]
        fn prop_round_trip(response in response_strategy()) {
            let frames = response.encode().unwrap();
            prop_assert_eq!(Response::expected_frames(&frames[0]).unwrap(), Some(frames.len()));
            prop_assert_eq!(Response::decode(&frames).unwrap(), response);
        }

        #[test]
        fn prop_any_bit_flip_is_rejected(
            response in response_strategy(),
            frame_pick in any::<prop::sample::Index>(),
            byte in 0usize..8,
            bit in 0u8..8,
        ) {
            let mut frames = response.encode().unwrap();
            let frame = frame_pick.index(frames.len());
            // the version 5 header device id sits outside the CRC
            prop_assume!(!(matches!(response, Response::V5(_)) && frame == 0 && byte == 4));

            let mut raw = *frames[frame].as_bytes();
            raw[byte] ^= 1 << bit;
            frames[frame] = Frame::new(raw);

            prop_assert!(Response::decode(&frames).is_err());
        }

        #[test]
        fn prop_dropped_frame_is_rejected(
            response in response_strategy(),
            drop in any::<prop::sample::Index>(),
        ) {
            let mut frames = response.encode().unwrap();
            prop_assume!(frames.len() > 1);
            frames.remove(drop.index(frames.len()));

            prop_assert!(Response::decode(&frames).is_err());
        }

        #[test]
        fn prop_dropped_body_frame_is_malformed(
            response in response_strategy(),
            drop in any::<prop::sample::Index>(),
        ) {
            let mut frames = response.encode().unwrap();
            prop_assume!(frames.len() > 1);
            frames.remove(1 + drop.index(frames.len() - 1));

            let malformed = matches!(Response::decode(&frames), Err(Error::MalformedGroup(_)));
            prop_assert!(malformed);
            let malformed = matches!(
                decode_as(response.udt_version(), &frames),
                Err(Error::MalformedGroup(_))
            );
            prop_assert!(malformed);
        }

        #[test]
        fn prop_swapped_body_frames_are_sequence_errors(
            response in response_strategy(),
            a in any::<prop::sample::Index>(),
            b in any::<prop::sample::Index>(),
        ) {
            let mut frames = response.encode().unwrap();
            let body = body_len(&response, &frames);
            prop_assume!(body > 1);
            let (a, b) = (1 + a.index(body), 1 + b.index(body));
            prop_assume!(frames[a].channel_id() != frames[b].channel_id());
            frames.swap(a, b);

            let out_of_sequence = matches!(Response::decode(&frames), Err(Error::SequenceError { .. }));
            prop_assert!(out_of_sequence);
            let out_of_sequence = matches!(
                decode_as(response.udt_version(), &frames),
                Err(Error::SequenceError { .. })
            );
            prop_assert!(out_of_sequence);
        }
    }
}

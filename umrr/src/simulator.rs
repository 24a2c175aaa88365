//! Loopback sensor simulator
//!
//! Answers UAT instructions arriving on a [`LoopbackTransport`] from an
//! in-memory parameter store, and publishes target lists on demand. Lets
//! demos and tests run a [`Sensor`](crate::Sensor) without hardware.

use std::collections::HashMap;

use tracing::{debug, info, trace};
use umrr_core::constants::{UAT_REQUEST_CAN_ID, UDT_RESPONSE_CAN_ID};
use umrr_core::{
    BatchResponse, CanMessage, DataFormat, Frame, Instruction, InstructionResult, MessageType,
    ResultCode, SingleInstruction, SingleResponse, Value,
};
use umrr_core::{Access, Response};
use umrr_transport::{FrameTransport, LoopbackTransport};

use crate::error::Result;

/// Result code reported for reads whose stored value has another format
pub const FORMAT_REJECTED: u8 = 1;

/// Sensor side of a loopback link
pub struct Simulator {
    transport: LoopbackTransport,
    request_can_id: u32,
    response_can_id: u32,
    parameters: HashMap<(u16, u16), Value>,
    counter: u8,
}

impl Simulator {
    pub fn new(transport: LoopbackTransport) -> Self {
        Self {
            transport,
            request_can_id: UAT_REQUEST_CAN_ID,
            response_can_id: UDT_RESPONSE_CAN_ID,
            parameters: HashMap::new(),
            counter: 0,
        }
    }

    /// Preload a parameter or status value
    pub fn with_parameter(mut self, section: u16, number: u16, value: Value) -> Self {
        self.parameters.insert((section, number), value);
        self
    }

    pub fn parameter(&self, section: u16, number: u16) -> Option<Value> {
        self.parameters.get(&(section, number)).copied()
    }

    /// Wait for the next complete instruction group on the request id
    pub async fn receive_instruction(&self) -> Result<Instruction> {
        let (header, expected) = loop {
            let message = self.transport.receive().await?;
            if message.id != self.request_can_id {
                trace!("Simulator ignoring {}", message);
                continue;
            }
            match Instruction::expected_frames(&message.frame) {
                Ok(expected) => break (message.frame, expected),
                Err(e) => debug!("Simulator skipping {}: {}", message, e),
            }
        };

        let mut frames = vec![header];
        while frames.len() < expected {
            let message = self.transport.receive().await?;
            if message.id == self.request_can_id {
                frames.push(message.frame);
            }
        }
        Ok(Instruction::decode(&frames)?)
    }

    /// Read a stored value in the requested format
    fn read(&self, section: u16, number: u16, format: DataFormat) -> (ResultCode, Value) {
        match self.parameter(section, number) {
            Some(value) if value.format() == format => (ResultCode::Success, value),
            Some(_) => (ResultCode::Failure(FORMAT_REJECTED), Value::zero(format)),
            None => (ResultCode::Success, Value::zero(format)),
        }
    }

    fn next_counter(&mut self) -> u8 {
        let counter = self.counter;
        self.counter = self.counter.wrapping_add(1);
        counter
    }

    fn apply_single(&mut self, instruction: &SingleInstruction) -> SingleResponse {
        let ty = instruction.parameter_type;
        let key = (instruction.uat_id, instruction.parameter_number);
        if matches!(ty.access(), Access::Write | Access::ReadWrite) {
            self.parameters.insert(key, instruction.value);
        }
        let (result, value) = self.read(key.0, key.1, ty.format());

        SingleResponse {
            uat_id: instruction.uat_id,
            counter: self.next_counter(),
            result,
            device_id: instruction.device_id,
            parameter_number: instruction.parameter_number,
            parameter_type: ty,
            value,
        }
    }

    /// Apply an instruction to the parameter store and build the answer
    pub fn respond_to(&mut self, instruction: &Instruction) -> Response {
        match instruction {
            Instruction::V1(single) => Response::V2(self.apply_single(single)),
            Instruction::V2 { instruction, dims } => Response::V3 {
                response: self.apply_single(instruction),
                dims: *dims,
            },
            Instruction::V3 { instruction, dims } => Response::V4 {
                response: self.apply_single(instruction),
                dims: *dims,
            },
            Instruction::V4(batch) => {
                let mut results = Vec::with_capacity(batch.instructions.len());
                for sub in &batch.instructions {
                    let key = (batch.uat_id, sub.parameter_number);
                    if matches!(
                        sub.message_type,
                        MessageType::ParameterWrite | MessageType::ParameterWriteRead
                    ) {
                        self.parameters.insert(key, sub.value);
                    }
                    let (result, value) = match sub.message_type {
                        MessageType::Command => (ResultCode::Success, sub.value),
                        _ => self.read(key.0, key.1, sub.data_format),
                    };

                    results.push(InstructionResult {
                        counter: self.next_counter(),
                        message_type: sub.message_type,
                        uat_id: batch.uat_id,
                        parameter_number: sub.parameter_number,
                        result,
                        data_format: sub.data_format,
                        dims: sub.dims,
                        value,
                    });
                }
                Response::V5(BatchResponse {
                    device_id: batch.device_id,
                    results,
                })
            }
        }
    }

    pub async fn send_response(&self, response: &Response) -> Result<()> {
        let frames = response.encode()?;
        for message in CanMessage::group(self.response_can_id, &frames) {
            self.transport.send(&message).await?;
        }
        Ok(())
    }

    /// Receive one instruction, apply it and answer it
    pub async fn serve_one(&mut self) -> Result<Instruction> {
        let instruction = self.receive_instruction().await?;
        let response = self.respond_to(&instruction);
        debug!(
            "Simulator answering {} for UAT-ID {}",
            instruction.version(),
            instruction.uat_id()
        );
        self.send_response(&response).await?;
        Ok(instruction)
    }

    /// Answer instructions until the host side closes
    pub async fn run(mut self) -> Result<()> {
        info!("Simulator serving on {}", self.transport.interface());
        loop {
            match self.serve_one().await {
                Ok(_) => {}
                Err(crate::Error::Transport(e)) if e.is_closed() => {
                    info!("Simulator link closed");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Publish a target list: the header followed by the object frames
    pub async fn send_target_list(&self, header: CanMessage, objects: &[CanMessage]) -> Result<()> {
        self.transport.send(&header).await?;
        for object in objects {
            self.transport.send(object).await?;
        }
        Ok(())
    }

    /// Send an arbitrary frame, e.g. to inject noise
    pub async fn send_frame(&self, id: u32, frame: Frame) -> Result<()> {
        Ok(self.transport.send(&CanMessage::new(id, frame)).await?)
    }

    /// Every frame the host has sent that was not consumed yet
    pub async fn drain(&self) -> Vec<CanMessage> {
        self.transport.drain().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use umrr_core::{BatchInstruction, ParameterType, SubInstruction};

    fn simulator() -> (LoopbackTransport, Simulator) {
        let (host, radar) = LoopbackTransport::pair();
        (host, Simulator::new(radar).with_parameter(2010, 3, Value::Integer(11)))
    }

    #[test]
    fn test_single_write_then_read() {
        let (_host, mut sim) = simulator();
        let write = Instruction::V1(SingleInstruction {
            uat_id: 2010,
            device_id: 0,
            parameter_number: 4,
            parameter_type: ParameterType::FloatWrite,
            value: Value::Float(2.5),
        });
        let Response::V2(answer) = sim.respond_to(&write) else {
            panic!("expected a version 2 response");
        };
        assert_eq!(answer.value, Value::Float(2.5));
        assert_eq!(sim.parameter(2010, 4), Some(Value::Float(2.5)));
    }

    #[test]
    fn test_batch_results_are_independent() {
        let (_host, mut sim) = simulator();
        let batch = BatchInstruction::new(2010, 1)
            .with_instruction(SubInstruction::new(MessageType::ParameterRead, 3, Value::Integer(0)))
            .with_instruction(SubInstruction::new(MessageType::ParameterRead, 3, Value::Float(0.0)))
            .with_instruction(SubInstruction::new(MessageType::ParameterWrite, 9, Value::Integer(5)));

        let Response::V5(answer) = sim.respond_to(&batch.into()) else {
            panic!("expected a version 5 response");
        };
        assert_eq!(answer.results.len(), 3);
        assert_eq!(answer.results[0].value, Value::Integer(11));
        assert_eq!(answer.results[1].result, ResultCode::Failure(FORMAT_REJECTED));
        assert_eq!(answer.results[2].value, Value::Integer(5));
        assert_eq!(answer.results[2].counter, 2);
    }

    #[tokio::test]
    async fn test_serve_one_over_loopback() {
        let (host, mut sim) = simulator();
        let request = Instruction::V1(SingleInstruction {
            uat_id: 2010,
            device_id: 0,
            parameter_number: 3,
            parameter_type: ParameterType::IntegerRead,
            value: Value::Integer(0),
        });
        for frame in request.encode().unwrap() {
            host.send(&CanMessage::new(0x3FB, frame)).await.unwrap();
        }

        assert_eq!(sim.serve_one().await.unwrap(), request);

        let mut frames = Vec::new();
        for _ in 0..5 {
            let message = host.receive().await.unwrap();
            assert_eq!(message.id, 0x700);
            frames.push(message.frame);
        }
        assert_eq!(Response::decode(&frames).unwrap().value(), Some(Value::Integer(11)));
    }
}

//! Parameter, status and command request builders
//!
//! Builders turn the user-level description of a request into an
//! [`Instruction`] for the configured protocol version. They perform no I/O.

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Access, DataFormat, MessageType, ParameterType, ProtocolVersion, Value};
use crate::uat::{BatchInstruction, Instruction, SingleInstruction, SubInstruction};

/// Builds requests in one protocol version
///
/// # Examples
///
/// ```
/// use umrr_core::builder::RequestBuilder;
/// use umrr_core::{Access, DataFormat, ProtocolVersion, Value};
///
/// let builder = RequestBuilder::new(ProtocolVersion::V4).unwrap();
/// let instruction = builder
///     .parameter(2010, 3, Value::Integer(1), 0, DataFormat::Integer, Access::Write)
///     .unwrap();
/// assert_eq!(instruction.encode().unwrap().len(), 3);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder {
    version: ProtocolVersion,
}

impl RequestBuilder {
    /// Create a builder; only versions 1 and 4 are supported for building
    pub fn new(version: ProtocolVersion) -> Result<Self> {
        match version {
            ProtocolVersion::V1 | ProtocolVersion::V4 => Ok(Self { version }),
            other => Err(Error::ConfigurationError(format!(
                "request builders support UAT v1 and v4, not {}",
                other
            ))),
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Read and/or write one parameter
    pub fn parameter(
        &self,
        section: u16,
        parameter_number: u16,
        value: Value,
        device_id: u8,
        format: DataFormat,
        access: Access,
    ) -> Result<Instruction> {
        value.expect_format(format)?;

        let instruction = match self.version {
            ProtocolVersion::V4 => batch(
                section,
                device_id,
                MessageType::for_access(access),
                parameter_number,
                format,
                value,
            ),
            _ => Instruction::V1(SingleInstruction {
                uat_id: section,
                device_id,
                parameter_number,
                parameter_type: ParameterType::new(format, access),
                value,
            }),
        };

        debug!(
            version = %self.version,
            section = section,
            parameter = parameter_number,
            ?access,
            "Built parameter request"
        );

        instruction.validate()?;
        Ok(instruction)
    }

    /// Query one status value
    pub fn status(
        &self,
        section: u16,
        parameter_number: u16,
        device_id: u8,
        format: DataFormat,
    ) -> Result<Instruction> {
        let value = Value::zero(format);
        let instruction = match self.version {
            ProtocolVersion::V4 => batch(
                section,
                device_id,
                MessageType::Status,
                parameter_number,
                format,
                value,
            ),
            _ => Instruction::V1(SingleInstruction {
                uat_id: section,
                device_id,
                parameter_number,
                parameter_type: ParameterType::new(format, Access::Read),
                value,
            }),
        };

        debug!(
            version = %self.version,
            section = section,
            status = parameter_number,
            "Built status request"
        );

        instruction.validate()?;
        Ok(instruction)
    }

    /// Trigger a sensor command; only UAT v4 carries commands
    pub fn command(
        &self,
        section: u16,
        command_number: u16,
        argument: i32,
        device_id: u8,
    ) -> Result<Instruction> {
        if self.version != ProtocolVersion::V4 {
            return Err(Error::ConfigurationError(format!(
                "commands require UAT v4, builder uses {}",
                self.version
            )));
        }

        let instruction = batch(
            section,
            device_id,
            MessageType::Command,
            command_number,
            DataFormat::Integer,
            Value::Integer(argument),
        );
        debug!(section = section, command = command_number, "Built command request");
        Ok(instruction)
    }
}

fn batch(
    section: u16,
    device_id: u8,
    message_type: MessageType,
    parameter_number: u16,
    format: DataFormat,
    value: Value,
) -> Instruction {
    let mut sub = SubInstruction::new(message_type, parameter_number, value);
    sub.data_format = format;
    BatchInstruction::new(section, device_id)
        .with_instruction(sub)
        .into()
}

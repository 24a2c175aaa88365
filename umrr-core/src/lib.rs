//! # umrr-core
//!
//! Protocol primitives for smartmicro UMRR radar sensors.
//!
//! This crate provides:
//! - The 8-byte CAN frame type
//! - The CRC-16 protecting instruction and response groups
//! - UAT instruction codecs (format versions 1 to 4)
//! - UDT type 17000 response codecs (versions 2 to 5)
//! - Parameter, status and command request builders
//!
//! Nothing in this crate performs I/O.

pub mod builder;
pub mod constants;
pub mod crc;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod uat;
pub mod udt;

pub use builder::RequestBuilder;
pub use error::{Error, Result};
pub use frame::{CanMessage, Frame};
pub use protocol::{Access, DataFormat, MessageType, ParameterType, ProtocolVersion, ResultCode, Value};
pub use uat::{BatchInstruction, Instruction, SingleInstruction, SubInstruction};
pub use udt::{BatchResponse, InstructionResult, Response, SingleResponse};

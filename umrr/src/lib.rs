//! # umrr
//!
//! Host-side client for smartmicro UMRR radar sensors over CAN.
//!
//! ## Features
//!
//! - UAT instruction encoding (versions 1 to 4) with CRC protection
//! - UDT type 17000 response decoding (versions 2 to 5)
//! - A background dispatcher routing inbound frames by CAN identifier
//! - Per-channel group correlation with per-call timeouts
//! - Target list decoding from a configurable signal layout
//! - A loopback sensor simulator for running without hardware
//!
//! ## Quick Start
//!
//! ```no_run
//! use umrr::simulator::Simulator;
//! use umrr::{DataFormat, LoopbackTransport, Sensor, SensorConfig, Value};
//!
//! #[tokio::main]
//! async fn main() -> umrr::Result<()> {
//!     let (host, radar) = LoopbackTransport::pair();
//!     let simulator = Simulator::new(radar).with_parameter(2010, 3042, Value::Integer(7));
//!     tokio::spawn(simulator.run());
//!
//!     let sensor = Sensor::new(host, SensorConfig::default())?;
//!     let response = sensor.request_status(2010, 3042, 0, DataFormat::Integer).await?;
//!     println!("{:?}", response.value());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod correlate;
pub mod dispatch;
pub mod error;
pub mod routing;
pub mod sensor;
pub mod simulator;

// Re-exports
pub use config::SensorConfig;
pub use dispatch::DispatchStats;
pub use error::{Error, Result};
pub use routing::{LogicalChannel, RoutingTable};
pub use sensor::Sensor;

// Re-export protocol types
pub use umrr_core::{
    Access, BatchInstruction, BatchResponse, CanMessage, DataFormat, Frame, Instruction,
    InstructionResult, MessageType, ParameterType, ProtocolVersion, RequestBuilder, Response,
    ResultCode, SingleInstruction, SingleResponse, SubInstruction, Value,
};
pub use umrr_transport::{FrameTransport, LoopbackTransport};
pub use umrr_types::{ObjectListLayout, Signal, TargetList, TargetObject};

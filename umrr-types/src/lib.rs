//! Decoded data types for UMRR sensors

pub mod error;
pub mod signal;
pub mod target;

pub use error::{Error, Result};
pub use signal::Signal;
pub use target::{ObjectListLayout, RawFrame, TargetList, TargetObject};

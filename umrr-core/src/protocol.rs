//! Wire-level enumerations and values of the UAT/UDT protocol

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// UAT instruction format version
///
/// Each request version is answered by UDT type 17000 at version + 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ProtocolVersion {
    V1 = 1,
    V2 = 2,
    V3 = 3,
    V4 = 4,
}

impl ProtocolVersion {
    /// Number of dimension bytes carried per instruction
    pub fn dimensions(self) -> usize {
        match self {
            Self::V1 => 0,
            Self::V2 => 4,
            Self::V3 => 8,
            Self::V4 => 2,
        }
    }

    /// UDT type 17000 version that answers this request version
    pub fn response_version(self) -> u16 {
        u16::from(self as u8) + 1
    }

    /// Request version answered by a UDT type 17000 version
    pub fn from_response_version(version: u16) -> Result<Self> {
        match version {
            2 => Ok(Self::V1),
            3 => Ok(Self::V2),
            4 => Ok(Self::V3),
            5 => Ok(Self::V4),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            other => Err(Error::UnsupportedVersion(other.into())),
        }
    }
}

impl From<ProtocolVersion> for u8 {
    fn from(version: ProtocolVersion) -> u8 {
        version as u8
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UATv{}", *self as u8)
    }
}

/// Kind of a UAT v4 sub-instruction
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Command = 0,
    Status = 1,
    ParameterWrite = 2,
    ParameterRead = 3,
    ParameterWriteRead = 4,
}

impl MessageType {
    /// Message type that carries a parameter access
    pub fn for_access(access: Access) -> Self {
        match access {
            Access::Read => Self::ParameterRead,
            Access::Write => Self::ParameterWrite,
            Access::ReadWrite => Self::ParameterWriteRead,
        }
    }

    /// Get human-readable message type name
    pub fn name(self) -> &'static str {
        match self {
            Self::Command => "COMMAND",
            Self::Status => "STATUS",
            Self::ParameterWrite => "PARAMETER_WRITE",
            Self::ParameterRead => "PARAMETER_READ",
            Self::ParameterWriteRead => "PARAMETER_WRITE_READ",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Command),
            1 => Ok(Self::Status),
            2 => Ok(Self::ParameterWrite),
            3 => Ok(Self::ParameterRead),
            4 => Ok(Self::ParameterWriteRead),
            other => Err(Error::UnknownEnumValue {
                field: "message type",
                value: other,
            }),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), *self as u8)
    }
}

/// Binary representation of a 4-byte value
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataFormat {
    /// Signed 32-bit integer, little-endian
    Integer = 0,
    /// IEEE-754 single precision, little-endian
    Float = 1,
}

impl TryFrom<u8> for DataFormat {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Integer),
            1 => Ok(Self::Float),
            other => Err(Error::UnknownEnumValue {
                field: "data format",
                value: other,
            }),
        }
    }
}

impl FromStr for DataFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "integer" | "int" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            other => Err(Error::ConfigurationError(format!(
                "unknown parameter type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
        }
    }
}

/// Requested parameter access
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl FromStr for Access {
    type Err = Error;

    /// Parse the short forms `r`, `w` and `rw`
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            "rw" => Ok(Self::ReadWrite),
            other => Err(Error::ConfigurationError(format!(
                "unknown message type '{}'",
                other
            ))),
        }
    }
}

/// Parameter type of UAT v1-v3 instructions: access and data format in one code
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParameterType {
    IntegerRead = 0,
    IntegerWrite = 1,
    IntegerReadWrite = 2,
    FloatRead = 3,
    FloatWrite = 4,
    FloatReadWrite = 5,
}

impl ParameterType {
    pub fn new(format: DataFormat, access: Access) -> Self {
        match (format, access) {
            (DataFormat::Integer, Access::Read) => Self::IntegerRead,
            (DataFormat::Integer, Access::Write) => Self::IntegerWrite,
            (DataFormat::Integer, Access::ReadWrite) => Self::IntegerReadWrite,
            (DataFormat::Float, Access::Read) => Self::FloatRead,
            (DataFormat::Float, Access::Write) => Self::FloatWrite,
            (DataFormat::Float, Access::ReadWrite) => Self::FloatReadWrite,
        }
    }

    pub fn format(self) -> DataFormat {
        match self {
            Self::IntegerRead | Self::IntegerWrite | Self::IntegerReadWrite => DataFormat::Integer,
            Self::FloatRead | Self::FloatWrite | Self::FloatReadWrite => DataFormat::Float,
        }
    }

    pub fn access(self) -> Access {
        match self {
            Self::IntegerRead | Self::FloatRead => Access::Read,
            Self::IntegerWrite | Self::FloatWrite => Access::Write,
            Self::IntegerReadWrite | Self::FloatReadWrite => Access::ReadWrite,
        }
    }
}

impl TryFrom<u8> for ParameterType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::IntegerRead),
            1 => Ok(Self::IntegerWrite),
            2 => Ok(Self::IntegerReadWrite),
            3 => Ok(Self::FloatRead),
            4 => Ok(Self::FloatWrite),
            5 => Ok(Self::FloatReadWrite),
            other => Err(Error::UnknownEnumValue {
                field: "parameter type",
                value: other,
            }),
        }
    }
}

/// Outcome the sensor reports for one instruction
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    Failure(u8),
}

impl ResultCode {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<u8> for ResultCode {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Success,
            other => Self::Failure(other),
        }
    }
}

impl From<ResultCode> for u8 {
    fn from(code: ResultCode) -> u8 {
        match code {
            ResultCode::Success => 0,
            ResultCode::Failure(other) => other,
        }
    }
}

/// A 4-byte instruction value
///
/// Floats compare by bit pattern so decoded values round-trip exactly.
#[derive(Debug, Copy, Clone)]
pub enum Value {
    Integer(i32),
    Float(f32),
}

impl Value {
    /// Zero in the given format, used by read and status instructions
    pub fn zero(format: DataFormat) -> Self {
        match format {
            DataFormat::Integer => Self::Integer(0),
            DataFormat::Float => Self::Float(0.0),
        }
    }

    pub fn format(&self) -> DataFormat {
        match self {
            Self::Integer(_) => DataFormat::Integer,
            Self::Float(_) => DataFormat::Float,
        }
    }

    /// Reject a value whose representation differs from `declared`
    pub fn expect_format(&self, declared: DataFormat) -> Result<()> {
        if self.format() != declared {
            return Err(Error::TypeMismatch {
                declared,
                actual: self.format(),
            });
        }
        Ok(())
    }

    pub fn to_le_bytes(&self) -> [u8; 4] {
        match self {
            Self::Integer(v) => v.to_le_bytes(),
            Self::Float(v) => v.to_le_bytes(),
        }
    }

    pub fn from_le_bytes(format: DataFormat, bytes: [u8; 4]) -> Self {
        match format {
            DataFormat::Integer => Self::Integer(i32::from_le_bytes(bytes)),
            DataFormat::Float => Self::Float(f32::from_le_bytes(bytes)),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(_) => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

//! Protocol constants

/// CAN identifier the sensor accepts UAT instructions on
pub const UAT_REQUEST_CAN_ID: u32 = 0x3FB;

/// CAN identifier the sensor answers UAT instructions on
pub const UDT_RESPONSE_CAN_ID: u32 = 0x700;

/// First CAN identifier of the target list block
pub const TARGET_LIST_CAN_ID: u32 = 0x400;

/// Width of the target list block above [`TARGET_LIST_CAN_ID`]
pub const TARGET_LIST_CAN_ID_RANGE: u32 = 0x7F;

/// Default wait for a complete instruction response (milliseconds)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 2000;

/// Default wait for a complete target list (milliseconds)
pub const DEFAULT_TARGET_TIMEOUT_MS: u64 = 5000;

/// Default number of frames buffered per logical channel
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Largest device id the v1-v3 parameter frame can carry (one nibble)
pub const MAX_SINGLE_DEVICE_ID: u8 = 0x0F;

/// Largest sub-instruction count whose frame indices fit in one byte
pub const MAX_BATCH_INSTRUCTIONS: usize = 127;

/// UDT type 17000 frame indices
pub mod udt {
    /// Header (and footer) of every instruction response
    pub const HEADER: u16 = 17000;

    /// Highest index belonging to the type 17000 family
    pub const LAST: u16 = 17018;

    /// First index of the version 2 frames (answer to UAT v1)
    pub const V2_BASE: u16 = 17001;

    /// First index of the version 3 frames (answer to UAT v2)
    pub const V3_BASE: u16 = 17004;

    /// First index of the version 4 frames (answer to UAT v3)
    pub const V4_BASE: u16 = 17009;

    /// Instruction frames of version 5 (answer to UAT v4)
    pub const V5_INSTRUCTION: u16 = 17016;
    pub const V5_RESULT: u16 = 17017;
    pub const V5_FORMAT: u16 = 17018;

    /// Whether an index belongs to the type 17000 family
    pub fn is_family(index: u16) -> bool {
        (HEADER..=LAST).contains(&index)
    }
}

//! Bit-field signals inside an 8-byte CAN payload

use crate::error::{Error, Result};

/// A scaled bit field, numbered from the least significant bit of the
/// little-endian payload
///
/// # Examples
///
/// ```
/// use umrr_types::Signal;
///
/// // 8-bit count in byte 0
/// let count = Signal::new(0, 8).unwrap();
/// assert_eq!(count.extract(&[5, 0, 0, 0, 0, 0, 0, 0]), 5.0);
///
/// // signed 12-bit position in bits 8..20, 0.1 m per step
/// let x = Signal::new(8, 12).unwrap().signed().scaled(0.1, 0.0);
/// assert_eq!(x.extract(&[0, 0xF6, 0x0F, 0, 0, 0, 0, 0]), -1.0);
/// ```
///
/// Fields are only set through [`Signal::new`], so every signal fits the
/// 64-bit payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    start_bit: u8,
    length: u8,
    signed: bool,
    factor: f64,
    offset: f64,
}

impl Signal {
    /// Unsigned, unscaled field of `length` bits starting at `start_bit`
    pub fn new(start_bit: u8, length: u8) -> Result<Self> {
        if length == 0 || u16::from(start_bit) + u16::from(length) > 64 {
            return Err(Error::Validation(format!(
                "signal at bit {} with length {} does not fit 64 bits",
                start_bit, length
            )));
        }

        Ok(Self {
            start_bit,
            length,
            signed: false,
            factor: 1.0,
            offset: 0.0,
        })
    }

    /// Interpret the field as two's complement
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Physical value = raw * factor + offset
    pub fn scaled(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    pub fn start_bit(&self) -> u8 {
        self.start_bit
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Raw field bits, sign-extended when the signal is signed
    pub fn raw(&self, payload: &[u8; 8]) -> i64 {
        let word = u64::from_le_bytes(*payload)
            .checked_shr(u32::from(self.start_bit))
            .unwrap_or(0);
        // All ones below bit `length`; a 64-bit field keeps the whole word
        let mask = 1u64
            .checked_shl(u32::from(self.length))
            .map_or(u64::MAX, |bit| bit.wrapping_sub(1));
        let bits = word & mask;

        let sign_bit = u32::from(self.length.saturating_sub(1));
        if self.signed && mask != u64::MAX && (bits >> sign_bit) & 1 == 1 {
            (bits | !mask) as i64
        } else {
            bits as i64
        }
    }

    /// Physical value of the field
    pub fn extract(&self, payload: &[u8; 8]) -> f64 {
        self.raw(payload) as f64 * self.factor + self.offset
    }
}

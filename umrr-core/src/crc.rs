//! CRC-16 protecting UAT and UDT frame groups
//!
//! Polynomial 0x1021, register seeded with 0xFFFF, no input or output
//! reflection and no final XOR. The `crc` catalogue lists these parameters
//! as CRC-16/IBM-3740 (also known as CRC-16/CCITT-FALSE).

use ::crc::{CRC_16_IBM_3740, Crc};
use tracing::trace;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Calculate the CRC of a contiguous byte span
///
/// # Examples
///
/// ```
/// use umrr_core::crc;
///
/// assert_eq!(crc::calculate(b"123456789"), 0x29B1);
/// ```
pub fn calculate(data: &[u8]) -> u16 {
    let crc = CRC16.checksum(data);

    trace!(
        len = data.len(),
        crc = format!("0x{:04X}", crc),
        "Calculated CRC"
    );

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(calculate(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_empty_input_is_seed() {
        assert_eq!(calculate(&[]), 0xFFFF);
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let data = [0xFBu8, 0x03, 0x00, 0x01, 0xE2, 0x0B, 0x2A, 0x00];
        let crc = calculate(&data);

        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data;
                flipped[byte] ^= 1 << bit;
                assert_ne!(calculate(&flipped), crc, "byte {} bit {}", byte, bit);
            }
        }
    }
}

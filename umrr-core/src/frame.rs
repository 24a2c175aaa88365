//! CAN frame primitives shared by every UAT and UDT codec

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, BytesMut};
use std::fmt;

use crate::error::{Error, Result};

/// One 8-byte CAN payload
///
/// # Frame Structure
///
/// ```text
/// ┌─────────────┬─────────────┬──────────────────────────────┐
/// │ Channel ID  │    Index    │            Body              │
/// │   2 bytes   │   1 byte    │           5 bytes            │
/// │  (LE u16)   │    (u8)     │   (layout depends on codec)  │
/// └─────────────┴─────────────┴──────────────────────────────┘
/// ```
///
/// The channel identifier is the UAT-ID on request frames and the UDT index
/// on response frames. UDT frames do not use byte 2 as an index.
///
/// # Examples
///
/// ```
/// use umrr_core::Frame;
///
/// let frame = Frame::new([0xFB, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
/// assert_eq!(frame.channel_id(), 0x03FB);
/// assert_eq!(frame.index(), 0);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Frame([u8; Frame::SIZE]);

impl Frame {
    /// Payload size of every frame
    pub const SIZE: usize = 8;

    /// Wrap raw payload bytes
    pub const fn new(bytes: [u8; Self::SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a frame from a byte slice that must be exactly 8 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; Self::SIZE] = bytes.try_into().map_err(|_| {
            Error::MalformedGroup(format!(
                "frame must be {} bytes, got {} bytes",
                Self::SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    /// Build a frame group from byte slices, rejecting any that is not 8 bytes
    pub fn group_from_slices<B: AsRef<[u8]>>(frames: &[B]) -> Result<Vec<Self>> {
        frames.iter().map(|f| Self::from_slice(f.as_ref())).collect()
    }

    /// Raw payload bytes
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }

    /// Channel identifier in bytes 0-1
    pub fn channel_id(&self) -> u16 {
        LittleEndian::read_u16(&self.0[0..2])
    }

    /// Message index in byte 2
    pub fn index(&self) -> u8 {
        self.0[2]
    }

    /// Read a little-endian u16 starting at `offset`
    pub fn u16_at(&self, offset: usize) -> u16 {
        LittleEndian::read_u16(&self.0[offset..offset + 2])
    }

    /// Read four raw bytes starting at `offset`
    pub fn word_at(&self, offset: usize) -> [u8; 4] {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.0[offset..offset + 4]);
        word
    }
}

impl From<[u8; Frame::SIZE]> for Frame {
    fn from(bytes: [u8; Frame::SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<Frame> for [u8; Frame::SIZE] {
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", hex::encode_upper(self.0))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// A frame tagged with the CAN identifier it travelled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanMessage {
    /// CAN arbitration identifier
    pub id: u32,

    /// Frame payload
    pub frame: Frame,
}

impl CanMessage {
    /// Tag a frame with a CAN identifier
    pub const fn new(id: u32, frame: Frame) -> Self {
        Self { id, frame }
    }

    /// Tag every frame of a group with the same CAN identifier
    pub fn group(id: u32, frames: &[Frame]) -> Vec<Self> {
        frames.iter().map(|frame| Self::new(id, *frame)).collect()
    }
}

impl fmt::Display for CanMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03X} [{}]", self.id, self.frame)
    }
}

/// Incremental frame writer, zero-padding the unused tail
pub(crate) struct FrameWriter {
    buf: BytesMut,
}

impl FrameWriter {
    /// Start a frame with its channel identifier
    pub(crate) fn new(channel_id: u16) -> Self {
        let mut buf = BytesMut::with_capacity(Frame::SIZE);
        buf.put_u16_le(channel_id);
        Self { buf }
    }

    pub(crate) fn u8(mut self, value: u8) -> Self {
        self.buf.put_u8(value);
        self
    }

    pub(crate) fn u16(mut self, value: u16) -> Self {
        self.buf.put_u16_le(value);
        self
    }

    pub(crate) fn bytes(mut self, value: &[u8]) -> Self {
        self.buf.put_slice(value);
        self
    }

    pub(crate) fn finish(mut self) -> Frame {
        debug_assert!(self.buf.len() <= Frame::SIZE, "frame overflow: {} bytes", self.buf.len());
        self.buf.resize(Frame::SIZE, 0);
        let mut raw = [0u8; Frame::SIZE];
        raw.copy_from_slice(&self.buf[..Frame::SIZE]);
        Frame(raw)
    }
}

/// Reject a group whose frame count differs from `expected`
pub(crate) fn expect_count(frames: &[Frame], expected: usize) -> Result<()> {
    if frames.len() != expected {
        return Err(Error::MalformedGroup(format!(
            "expected {} frames, got {}",
            expected,
            frames.len()
        )));
    }
    Ok(())
}

/// Reject a request group whose frames do not count up from zero in byte 2
pub(crate) fn expect_sequence(frames: &[Frame]) -> Result<()> {
    for (position, frame) in frames.iter().enumerate() {
        if usize::from(frame.index()) != position {
            return Err(Error::SequenceError {
                position,
                expected: position as u16,
                actual: frame.index().into(),
            });
        }
    }
    Ok(())
}

/// Reject a group whose frames do not all carry the header's channel identifier
pub(crate) fn expect_uniform_channel(frames: &[Frame]) -> Result<u16> {
    let Some(first) = frames.first() else {
        return Err(Error::MalformedGroup("empty frame group".into()));
    };
    let expected = first.channel_id();

    for frame in &frames[1..] {
        if frame.channel_id() != expected {
            return Err(Error::ChannelIdMismatch {
                expected,
                actual: frame.channel_id(),
            });
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_accessors() {
        let frame = Frame::new([0x68, 0x42, 0x05, 0x00, 0xE2, 0x0B, 0xAA, 0xBB]);
        assert_eq!(frame.channel_id(), 17000);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.u16_at(4), 3042);
        assert_eq!(frame.word_at(4), [0xE2, 0x0B, 0xAA, 0xBB]);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = Frame::from_slice(&[0u8; 7]).unwrap_err();
        assert!(matches!(err, Error::MalformedGroup(_)));

        let err = Frame::group_from_slices(&[vec![0u8; 8], vec![0u8; 9]]).unwrap_err();
        assert!(matches!(err, Error::MalformedGroup(_)));

        assert!(Frame::from_slice(&[0u8; 8]).is_ok());
    }

    #[test]
    fn test_writer_pads_with_zero() {
        let frame = FrameWriter::new(0x03FB).u8(1).u16(0x1234).finish();
        assert_eq!(frame.as_bytes(), &[0xFB, 0x03, 0x01, 0x34, 0x12, 0, 0, 0]);
    }

    #[test]
    fn test_display() {
        let frame = Frame::new([0xFB, 0x03, 0x00, 0x01, 0x00, 0x00, 0xAB, 0xCD]);
        assert_eq!(frame.to_string(), "FB 03 00 01 00 00 AB CD");
        assert_eq!(format!("{:?}", frame), "Frame(FB0300010000ABCD)");

        let message = CanMessage::new(0x3FB, frame);
        assert_eq!(message.to_string(), "0x3FB [FB 03 00 01 00 00 AB CD]");
    }

    #[test]
    fn test_sequence_check() {
        let good = [
            FrameWriter::new(1).u8(0).finish(),
            FrameWriter::new(1).u8(1).finish(),
        ];
        assert!(expect_sequence(&good).is_ok());

        let bad = [good[1], good[0]];
        assert_eq!(
            expect_sequence(&bad).unwrap_err(),
            Error::SequenceError { position: 0, expected: 0, actual: 1 }
        );
    }

    #[test]
    fn test_uniform_channel_check() {
        let frames = [
            FrameWriter::new(7).u8(0).finish(),
            FrameWriter::new(8).u8(1).finish(),
        ];
        assert_eq!(
            expect_uniform_channel(&frames).unwrap_err(),
            Error::ChannelIdMismatch { expected: 7, actual: 8 }
        );
        assert!(matches!(
            expect_uniform_channel(&[]).unwrap_err(),
            Error::MalformedGroup(_)
        ));
    }
}

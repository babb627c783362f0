//! Wire format encoding and decoding.
//!
//! Implements the 8-byte frame header:
//! ```text
//! ┌──────────┬──────────┬──────────┬───────────┐
//! │ Version  │ Flags    │ Size     │ SizeActual│
//! │ 2 bytes  │ 2 bytes  │ 2 bytes  │ 2 bytes   │
//! │ uint16 LE│ uint16 LE│ uint16 LE│ uint16 LE │
//! └──────────┴──────────┴──────────┴───────────┘
//! ```
//!
//! All multi-byte integers are Little Endian. `Size` covers everything that
//! follows the header in the segment: the 16-bit sub-length field, the
//! concatenated operation bytes, and the trailing handle table. `SizeActual`
//! is the uncompressed size and equals `Size` whenever no transform flag is
//! set.

use crate::error::{Result, RopwireError};

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// The only defined header version.
pub const HEADER_VERSION: u16 = 0x0000;

/// Size in bytes of the 16-bit sub-length field that leads the payload.
pub const ROP_SIZE_FIELD: usize = 2;

/// Size in bytes of one handle-table entry.
pub const HANDLE_SIZE: usize = 4;

/// Flag constants for the frame header.
pub mod flags {
    /// Payload is compressed (transform not performed by this core).
    pub const COMPRESSED: u16 = 0x0001;
    /// Payload is obfuscated (transform not performed by this core).
    pub const OBFUSCATED: u16 = 0x0002;
    /// No further segment follows this one.
    pub const LAST: u16 = 0x0004;

    /// Transform bits this core refuses to decode through.
    pub const TRANSFORM_MASK: u16 = COMPRESSED | OBFUSCATED;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u16, flag: u16) -> bool {
        flags & flag != 0
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Header version (must be [`HEADER_VERSION`]).
    pub version: u16,
    /// Flags word (see `flags` module).
    pub flags: u16,
    /// Declared size of the payload + handle-table region.
    pub size: u16,
    /// Uncompressed size of the same region.
    pub size_actual: u16,
}

impl FrameHeader {
    /// Create a new header.
    pub fn new(flags: u16, size: u16, size_actual: u16) -> Self {
        Self {
            version: HEADER_VERSION,
            flags,
            size,
            size_actual,
        }
    }

    /// Create the header used for a single-segment request of `size` bytes.
    pub fn last_segment(size: u16) -> Self {
        Self::new(flags::LAST, size, size)
    }

    /// Encode header to bytes (Little Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use ropwire::protocol::{flags, FrameHeader};
    ///
    /// let header = FrameHeader::last_segment(100);
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), 8);
    /// assert_eq!(bytes[2], flags::LAST as u8);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (8 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0..2].copy_from_slice(&self.version.to_le_bytes());
        buf[2..4].copy_from_slice(&self.flags.to_le_bytes());
        buf[4..6].copy_from_slice(&self.size.to_le_bytes());
        buf[6..8].copy_from_slice(&self.size_actual.to_le_bytes());
    }

    /// Decode header from bytes (Little Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            version: u16::from_le_bytes([buf[0], buf[1]]),
            flags: u16::from_le_bytes([buf[2], buf[3]]),
            size: u16::from_le_bytes([buf[4], buf[5]]),
            size_actual: u16::from_le_bytes([buf[6], buf[7]]),
        })
    }

    /// Validate the header against the transforms this core supports.
    ///
    /// Transform flags mark payloads this core cannot read through; they are
    /// rejected rather than misinterpreted as raw bytes.
    pub fn validate(&self) -> Result<()> {
        if self.flags & flags::TRANSFORM_MASK != 0 {
            return Err(RopwireError::UnsupportedTransform { flags: self.flags });
        }
        Ok(())
    }

    /// Check if this is the final segment of the stream.
    #[inline]
    pub fn is_last(&self) -> bool {
        flags::has_flag(self.flags, flags::LAST)
    }

    /// Check if the payload is compressed.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        flags::has_flag(self.flags, flags::COMPRESSED)
    }

    /// Check if the payload is obfuscated.
    #[inline]
    pub fn is_obfuscated(&self) -> bool {
        flags::has_flag(self.flags, flags::OBFUSCATED)
    }
}

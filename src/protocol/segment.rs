//! Response segment with typed accessors.
//!
//! One header-delimited chunk of a response stream. The operation-response
//! payload stays an undifferentiated byte blob at this layer; splitting it
//! into individual responses requires the operation-type catalog and is the
//! correlator's job. Uses `bytes::Bytes` for zero-copy blob sharing.

use bytes::Bytes;

use super::handle_table::HandleTable;
use super::wire_format::FrameHeader;

/// A decoded response segment.
#[derive(Debug, Clone)]
pub struct ResponseSegment {
    /// Decoded header.
    pub header: FrameHeader,
    /// Concatenated operation-response bytes (zero-copy via `bytes::Bytes`).
    pub rops: Bytes,
    /// Handle table parsed from the remainder of the segment.
    pub handles: HandleTable,
}

impl ResponseSegment {
    /// Create a segment from its parts.
    pub fn new(header: FrameHeader, rops: Bytes, handles: HandleTable) -> Self {
        Self {
            header,
            rops,
            handles,
        }
    }

    /// Get a reference to the operation-response blob.
    #[inline]
    pub fn rops(&self) -> &[u8] {
        &self.rops
    }

    /// Get a cheap zero-copy clone of the blob.
    #[inline]
    pub fn rops_bytes(&self) -> Bytes {
        self.rops.clone()
    }

    /// Blob length in bytes.
    #[inline]
    pub fn rops_len(&self) -> usize {
        self.rops.len()
    }

    /// Handle table entries attached to this segment.
    #[inline]
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Check if this is the final segment of the stream.
    #[inline]
    pub fn is_last(&self) -> bool {
        self.header.is_last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire_format::flags;

    #[test]
    fn test_segment_accessors() {
        let header = FrameHeader::last_segment(14);
        let segment = ResponseSegment::new(
            header,
            Bytes::from_static(&[0x07, 0x00]),
            HandleTable::from_handles(vec![0x11, 0x22]),
        );

        assert_eq!(segment.rops(), &[0x07, 0x00]);
        assert_eq!(segment.rops_len(), 2);
        assert_eq!(segment.handles().len(), 2);
        assert!(segment.is_last());
    }

    #[test]
    fn test_rops_bytes_zero_copy() {
        let blob = Bytes::from_static(b"\x07\x00response");
        let segment = ResponseSegment::new(
            FrameHeader::new(flags::LAST, 12, 12),
            blob.clone(),
            HandleTable::new(),
        );

        assert_eq!(segment.rops_bytes().as_ptr(), blob.as_ptr());
    }
}

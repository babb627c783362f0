//! Frame codec: batch framing and response-stream decoding.
//!
//! A request frame is one header followed by a 16-bit sub-length field, the
//! concatenated operation bytes, and the handle table:
//! ```text
//! ┌────────┬─────────┬──────────────┬──────────────┐
//! │ Header │ RopSize │ Operations   │ Handle table │
//! │ 8 bytes│ u16 LE  │ RopSize − 2  │ 4 × entries  │
//! └────────┴─────────┴──────────────┴──────────────┘
//! ```
//! `RopSize` counts itself plus the operation bytes; the header's `size`
//! field additionally counts the handle table.
//!
//! A response stream is a chain of such segments terminated by one header
//! with the `LAST` flag. Decoding walks the chain and returns every segment;
//! the caller decides how many segments it supports.

use bytes::{BufMut, Bytes};

use super::handle_table::HandleTable;
use super::segment::ResponseSegment;
use super::wire_format::{FrameHeader, HEADER_SIZE, HEADER_VERSION, ROP_SIZE_FIELD};
use crate::batch::Operation;
use crate::error::{Result, RopwireError};

/// Encode a batch of operations and a handle table into one request frame.
///
/// Operations are emitted in input order; the frame is always a single
/// segment with the `LAST` flag set. No side effects beyond allocation.
///
/// # Errors
///
/// Returns [`RopwireError::FrameTooLarge`] when the operation bytes overflow
/// the 16-bit sub-length field, or when operations plus handle table
/// overflow the header's 16-bit size field.
///
/// # Example
///
/// ```
/// use ropwire::protocol::{encode_request, HandleTable, HEADER_SIZE};
/// use ropwire::Operation;
///
/// let ops = vec![Operation::new(0x02, vec![0x02, 0x00, 0x01])];
/// let handles = HandleTable::from_handles(vec![0x10]);
/// let frame = encode_request(&ops, &handles).unwrap();
/// assert_eq!(frame.len(), HEADER_SIZE + 2 + 3 + 4);
/// ```
pub fn encode_request(operations: &[Operation], handles: &HandleTable) -> Result<Vec<u8>> {
    let rop_size = ROP_SIZE_FIELD + operations.iter().map(Operation::size).sum::<usize>();
    if rop_size > u16::MAX as usize {
        return Err(RopwireError::FrameTooLarge { size: rop_size });
    }

    let declared = rop_size + handles.encoded_len();
    if declared > u16::MAX as usize {
        return Err(RopwireError::FrameTooLarge { size: declared });
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + declared);
    buf.extend_from_slice(&FrameHeader::last_segment(declared as u16).encode());
    buf.put_u16_le(rop_size as u16);
    for op in operations {
        buf.extend_from_slice(op.as_bytes());
    }
    handles.encode_into(&mut buf);

    Ok(buf)
}

/// Decode a response byte stream into its ordered segments.
///
/// Walks header-delimited segments until one carries the `LAST` flag. Each
/// segment's operation-response payload is returned as an undifferentiated
/// blob; operation boundaries are not self-delimiting at this layer and are
/// recovered by the correlator against the operation-type catalog.
///
/// # Errors
///
/// [`RopwireError::MalformedFrame`] when the buffer truncates mid-segment, a
/// declared size reads past the end, the handle-table remainder is not a
/// multiple of 4, or the stream ends with no terminating segment.
/// [`RopwireError::UnsupportedTransform`] when a header declares compression
/// or obfuscation.
pub fn decode_response(buf: Bytes) -> Result<Vec<ResponseSegment>> {
    let mut segments = Vec::new();
    let mut offset = 0usize;

    loop {
        if buf.len() - offset < HEADER_SIZE {
            let reason = if offset == buf.len() {
                "stream ended with no segment marked last".to_string()
            } else {
                "truncated frame header".to_string()
            };
            return Err(RopwireError::MalformedFrame { offset, reason });
        }

        let header = FrameHeader::decode(&buf[offset..]).expect("length checked above");
        if header.version != HEADER_VERSION {
            return Err(RopwireError::MalformedFrame {
                offset,
                reason: format!("unsupported header version {:#06x}", header.version),
            });
        }
        header.validate()?;

        let declared = header.size as usize;
        let body = offset + HEADER_SIZE;
        if body + declared > buf.len() {
            return Err(RopwireError::MalformedFrame {
                offset,
                reason: format!(
                    "declared size {declared} reads past end of {}-byte buffer",
                    buf.len()
                ),
            });
        }
        if declared < ROP_SIZE_FIELD {
            return Err(RopwireError::MalformedFrame {
                offset: body,
                reason: format!("declared size {declared} too small for sub-length field"),
            });
        }

        let sub_len = u16::from_le_bytes([buf[body], buf[body + 1]]) as usize;
        if sub_len < ROP_SIZE_FIELD || sub_len > declared {
            return Err(RopwireError::MalformedFrame {
                offset: body,
                reason: format!("sub-length {sub_len} outside segment of declared size {declared}"),
            });
        }

        let rops = buf.slice(body + ROP_SIZE_FIELD..body + sub_len);
        let table_offset = body + sub_len;
        let handles = HandleTable::decode(&buf[table_offset..body + declared], table_offset)?;

        let last = header.is_last();
        segments.push(ResponseSegment::new(header, rops, handles));
        offset = body + declared;

        if last {
            return Ok(segments);
        }
    }
}

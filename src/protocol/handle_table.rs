//! Handle table encoding and decoding.
//!
//! A handle table is the ordered array of 32-bit server-side object handles
//! that trails the operation bytes in a frame. Slot 0 is conventionally the
//! handle the first operation acts on. Handles are unique per slot, not
//! globally, and are encoded as consecutive 32-bit Little Endian words.

use bytes::BufMut;

use super::wire_format::HANDLE_SIZE;
use crate::batch::Operation;
use crate::catalog::OperationCatalog;
use crate::error::{Result, RopwireError};

/// Sentinel value for a handle slot the server is expected to populate.
pub const UNSET_HANDLE: u32 = 0xFFFF_FFFF;

/// Ordered table of server-side object handles.
///
/// # Example
///
/// ```
/// use ropwire::protocol::{HandleTable, UNSET_HANDLE};
///
/// let mut table = HandleTable::new();
/// table.push(0x11);
/// table.push_unset();
/// assert_eq!(table.as_slice(), &[0x11, UNSET_HANDLE]);
/// assert_eq!(table.encoded_len(), 8);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandleTable {
    handles: Vec<u32>,
}

impl HandleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Create a table from existing handles.
    pub fn from_handles(handles: Vec<u32>) -> Self {
        Self { handles }
    }

    /// Append a handle.
    pub fn push(&mut self, handle: u32) {
        self.handles.push(handle);
    }

    /// Append an unset slot for a handle the server will populate.
    pub fn push_unset(&mut self) {
        self.handles.push(UNSET_HANDLE);
    }

    /// Reserve one trailing unset slot per operation whose kind declares an
    /// output handle, in batch order.
    pub fn reserve_output_slots<C: OperationCatalog>(&mut self, catalog: &C, operations: &[Operation]) {
        for op in operations {
            if catalog.has_output_handle(op.kind()) {
                self.push_unset();
            }
        }
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Encoded size in bytes (4 per entry).
    pub fn encoded_len(&self) -> usize {
        self.handles.len() * HANDLE_SIZE
    }

    /// View the entries as a slice.
    pub fn as_slice(&self) -> &[u32] {
        &self.handles
    }

    /// Consume the table, yielding its entries.
    pub fn into_vec(self) -> Vec<u32> {
        self.handles
    }

    /// Encode each entry as a 32-bit Little Endian word.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        for &handle in &self.handles {
            buf.put_u32_le(handle);
        }
    }

    /// Decode a table from the trailing bytes of a segment.
    ///
    /// `offset` is the position of `buf` within the enclosing response
    /// buffer, used only for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`RopwireError::MalformedFrame`] when the byte count is not a
    /// multiple of 4.
    pub fn decode(buf: &[u8], offset: usize) -> Result<Self> {
        if buf.len() % HANDLE_SIZE != 0 {
            return Err(RopwireError::MalformedFrame {
                offset,
                reason: format!(
                    "handle table of {} bytes is not a multiple of {HANDLE_SIZE}",
                    buf.len()
                ),
            });
        }

        let handles = buf
            .chunks_exact(HANDLE_SIZE)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(Self { handles })
    }
}

impl From<Vec<u32>> for HandleTable {
    fn from(handles: Vec<u32>) -> Self {
        Self::from_handles(handles)
    }
}

//! Batched operation units.
//!
//! Both sides of a round trip move opaque, already-serialized byte blobs:
//! [`Operation`] on the request side, [`ResponseOp`] on the response side.
//! The per-operation field layouts live behind the operation-type catalog;
//! this core only needs each unit's byte length and its one-byte kind
//! discriminant for routing.

use bytes::Bytes;

/// One already-serialized operation in a batched request.
///
/// Owned by the caller and immutable once handed to the multiplexer. The
/// kind discriminant routes the operation through the catalog (release-type?
/// output handle?); it is never used for field access.
///
/// # Example
///
/// ```
/// use ropwire::Operation;
///
/// let op = Operation::new(0x02, vec![0x02, 0x00, 0x01]);
/// assert_eq!(op.kind(), 0x02);
/// assert_eq!(op.size(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    kind: u8,
    payload: Bytes,
}

impl Operation {
    /// Create an operation from its kind discriminant and serialized bytes.
    pub fn new(kind: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Kind discriminant identifying this operation.
    #[inline]
    pub fn kind(&self) -> u8 {
        self.kind
    }

    /// Serialized size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Raw serialized bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }
}

/// One operation response sliced out of a segment's payload blob.
///
/// The leading byte of `bytes` is the response's kind discriminant. Slicing
/// is zero-copy via `bytes::Bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOp {
    kind: u8,
    bytes: Bytes,
}

impl ResponseOp {
    /// Create a response unit from its delimited bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is empty; a response always carries at least its
    /// kind discriminant.
    pub fn new(bytes: Bytes) -> Self {
        let kind = bytes[0];
        Self { kind, bytes }
    }

    /// Kind discriminant (leading byte).
    #[inline]
    pub fn kind(&self) -> u8 {
        self.kind
    }

    /// Delimited size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Raw response bytes, kind discriminant included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap zero-copy clone of the response bytes.
    #[inline]
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }
}

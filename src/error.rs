//! Error types for ropwire.

use thiserror::Error;

/// Main error type for all ropwire operations.
#[derive(Debug, Error)]
pub enum RopwireError {
    /// I/O error reported by the transport collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Batch payload too large for the 16-bit length fields.
    #[error("batch of {size} bytes exceeds the 16-bit frame size field")]
    FrameTooLarge {
        /// Size the frame would have needed to declare.
        size: usize,
    },

    /// Structural violation while decoding a response stream.
    #[error("malformed frame at byte {offset}: {reason}")]
    MalformedFrame {
        /// Byte offset of the violation within the response buffer.
        offset: usize,
        /// What was wrong at that offset.
        reason: String,
    },

    /// Segment declares a compression or obfuscation transform this core
    /// does not perform.
    #[error("segment declares unsupported transform flags {flags:#06x}")]
    UnsupportedTransform {
        /// Raw flags word from the offending header.
        flags: u16,
    },

    /// Response stream decoded to a number of segments other than one.
    #[error("expected a single response segment, stream contained {0}")]
    SegmentCount(usize),

    /// Request was rejected as malformed before execution (fatal, no retry).
    #[error("request rejected as malformed before execution")]
    MalformedRequest,

    /// Reply would have exceeded the response buffer bound given to the
    /// transport. Not retried automatically; callers may re-invoke with a
    /// larger bound.
    #[error("response exceeds the {requested}-byte reply bound")]
    ResponseTooBig {
        /// The bound the call was made with.
        requested: u32,
    },

    /// Remote side signalled that a different endpoint owns this session.
    /// Following the redirect is session-collaborator policy.
    #[error("remote endpoint redirected the session")]
    Redirect,

    /// Transport returned a status code not otherwise classified.
    #[error("transport failed with status {0:#x}")]
    Transport(u32),

    /// The operation-type catalog has no response length rule for a kind
    /// found in the response stream.
    #[error("no response length known for operation kind {kind:#04x}")]
    UnknownResponseKind {
        /// The unrecognized leading discriminant byte.
        kind: u8,
    },

    /// A registered verifier rejected a paired response.
    #[error("response of kind {kind:#04x} failed verification: {reason}")]
    Verification {
        /// Kind discriminant of the offending response.
        kind: u8,
        /// Verifier-provided diagnostic.
        reason: String,
    },
}

/// Result type alias using RopwireError.
pub type Result<T> = std::result::Result<T, RopwireError>;

//! Round-trip multiplexer.
//!
//! The [`Multiplexer`] owns one round trip: it frames a batch of operations
//! and a handle table into a request, hands it to the transport, classifies
//! the returned status word, and decodes the reply into the single segment
//! this core supports. It performs no retries and no reconnects; every
//! non-success path is a single typed outcome and retry policy belongs to
//! the caller.
//!
//! # Example
//!
//! ```ignore
//! use ropwire::{Multiplexer, MultiplexerConfig, Operation};
//! use ropwire::protocol::HandleTable;
//!
//! let mut mux = Multiplexer::new(transport);
//! let round_trip = mux.execute(&ops, &handles, 0x10008)?;
//! let result = correlator.pair(&ops, &round_trip.segment)?;
//! ```

use bytes::Bytes;

use crate::batch::Operation;
use crate::error::{Result, RopwireError};
use crate::protocol::{decode_response, encode_request, HandleTable, ResponseSegment};
use crate::transport::{Transport, STATUS_SUCCESS};

/// Request was rejected as malformed before execution.
pub const STATUS_FORMAT_ERROR: u32 = 0x4B6;

/// Reply would have exceeded the response buffer bound.
pub const STATUS_RESPONSE_TOO_BIG: u32 = 0x4DB;

/// A different endpoint owns this session.
pub const STATUS_WRONG_ENDPOINT: u32 = 0x478;

/// Configuration fixed at multiplexer construction.
///
/// Redirect-following is policy owned by the connection/session
/// collaborator; the flag is carried here so that collaborator can query the
/// mode this multiplexer was built for, but the multiplexer itself only ever
/// surfaces [`RopwireError::Redirect`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiplexerConfig {
    /// Whether the owning session intends to follow endpoint redirects.
    pub follow_redirects: bool,
}

/// Outcome of one successful round trip.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    /// The single decoded response segment.
    pub segment: ResponseSegment,
    /// Raw response bytes as returned by the transport.
    pub raw: Bytes,
    /// Status word the transport reported (always success here).
    pub status: u32,
}

/// Owns one transport and drives one round trip at a time.
///
/// Synchronous and single-threaded per call: `execute` performs at most one
/// outbound transport invocation and blocks until it returns. Threads
/// wanting concurrency own independent multiplexer/transport pairs.
pub struct Multiplexer<T: Transport> {
    transport: T,
    config: MultiplexerConfig,
}

impl<T: Transport> Multiplexer<T> {
    /// Create a multiplexer with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, MultiplexerConfig::default())
    }

    /// Create a multiplexer with explicit configuration.
    pub fn with_config(transport: T, config: MultiplexerConfig) -> Self {
        Self { transport, config }
    }

    /// The redirect mode this multiplexer was constructed with.
    pub fn follow_redirects(&self) -> bool {
        self.config.follow_redirects
    }

    /// Execute one batched round trip.
    ///
    /// Frames `operations` and `handles`, ships the frame with
    /// `max_response_size` as the bound on the reply buffer, classifies the
    /// status word and decodes the reply. Exactly one response segment is
    /// required; a chunked reply is an unsupported-protocol condition at
    /// this layer.
    ///
    /// # Errors
    ///
    /// [`RopwireError::FrameTooLarge`] from framing;
    /// [`RopwireError::MalformedRequest`], [`RopwireError::ResponseTooBig`],
    /// [`RopwireError::Redirect`] or [`RopwireError::Transport`] from the
    /// status word; [`RopwireError::MalformedFrame`],
    /// [`RopwireError::UnsupportedTransform`] or
    /// [`RopwireError::SegmentCount`] from decoding.
    pub fn execute(
        &mut self,
        operations: &[Operation],
        handles: &HandleTable,
        max_response_size: u32,
    ) -> Result<RoundTrip> {
        let request = encode_request(operations, handles)?;
        tracing::debug!(
            operations = operations.len(),
            handles = handles.len(),
            request_bytes = request.len(),
            "executing batched round trip"
        );

        let (status, response) = self.transport.send(&request, max_response_size)?;
        if status != STATUS_SUCCESS {
            return Err(self.classify_failure(status, max_response_size));
        }

        let raw = Bytes::from(response);
        let mut segments = decode_response(raw.clone())?;
        if segments.len() != 1 {
            tracing::warn!(
                segments = segments.len(),
                "response stream chunked across multiple segments"
            );
            return Err(RopwireError::SegmentCount(segments.len()));
        }

        let segment = segments.remove(0);
        tracing::debug!(
            rop_bytes = segment.rops_len(),
            handles = segment.handles().len(),
            "round trip complete"
        );

        Ok(RoundTrip {
            segment,
            raw,
            status,
        })
    }

    fn classify_failure(&self, status: u32, max_response_size: u32) -> RopwireError {
        match status {
            STATUS_FORMAT_ERROR => {
                tracing::error!(status, "request rejected as malformed");
                RopwireError::MalformedRequest
            }
            STATUS_RESPONSE_TOO_BIG => {
                tracing::warn!(
                    status,
                    requested = max_response_size,
                    "reply exceeded response buffer bound"
                );
                RopwireError::ResponseTooBig {
                    requested: max_response_size,
                }
            }
            STATUS_WRONG_ENDPOINT => {
                tracing::warn!(
                    status,
                    follow_redirects = self.config.follow_redirects,
                    "session redirected to another endpoint"
                );
                RopwireError::Redirect
            }
            other => {
                tracing::error!(status = other, "transport reported failure");
                RopwireError::Transport(other)
            }
        }
    }
}

//! Transport boundary.
//!
//! The protocol core consumes exactly one synchronous call contract; the
//! implementation behind it owns connection establishment, credentials,
//! redirect target resolution, timeouts and cancellation. A transport that
//! wants cancellation surfaces it as a status code.

use crate::error::Result;

/// Transport status word for a successful exchange.
pub const STATUS_SUCCESS: u32 = 0;

/// One synchronous request/response exchange.
///
/// `send` ships a complete request frame and returns the remote status word
/// together with the raw response bytes. `max_response_size` is the upper
/// bound on the reply buffer the remote side may use; a reply that would
/// exceed it is reported through the status word, not truncated.
pub trait Transport {
    /// Ship `request` and collect the status word and response bytes.
    fn send(&mut self, request: &[u8], max_response_size: u32) -> Result<(u32, Vec<u8>)>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, request: &[u8], max_response_size: u32) -> Result<(u32, Vec<u8>)> {
        (**self).send(request, max_response_size)
    }
}

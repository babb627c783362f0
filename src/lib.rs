//! # ropwire
//!
//! Client-side framing and call multiplexing for batched remote operations.
//!
//! A batch of already-serialized operations and a table of server-side
//! object handles are framed into one length-delimited binary request; the
//! reply stream is decoded into a frame segment and each contained response
//! is correlated back to the operation that produced it — including
//! operations that produce no response (release-type) and responses the
//! server inserts without a matching request (notifications, pending
//! markers).
//!
//! ## Architecture
//!
//! - **Frame codec** (`protocol`): header + sub-length + operation bytes +
//!   trailing handle table, all little-endian.
//! - **Multiplexer**: one round trip — encode, send, classify the transport
//!   status word, decode.
//! - **Correlator**: walks decoded responses against the ordered batch using
//!   the operation-type catalog.
//!
//! Connection management, per-operation payload formats and conformance
//! verification are external collaborators behind the [`transport::Transport`],
//! [`catalog::OperationCatalog`] and [`verifier::VerifierRegistry`] seams.
//!
//! ## Example
//!
//! ```ignore
//! use ropwire::{Correlator, Multiplexer, Operation};
//! use ropwire::protocol::HandleTable;
//!
//! let ops = vec![Operation::new(0x02, open_bytes)];
//! let mut handles = HandleTable::from_handles(vec![root_handle]);
//! handles.reserve_output_slots(&catalog, &ops);
//!
//! let mut mux = Multiplexer::new(transport);
//! let round_trip = mux.execute(&ops, &handles, 0x10008)?;
//! let paired = Correlator::new(&catalog).pair(&ops, &round_trip.segment)?;
//! ```

pub mod batch;
pub mod catalog;
pub mod correlator;
pub mod error;
pub mod multiplexer;
pub mod protocol;
pub mod transport;
pub mod verifier;

pub use batch::{Operation, ResponseOp};
pub use correlator::{CorrelationResult, Correlator, PartialResponse};
pub use error::RopwireError;
pub use multiplexer::{Multiplexer, MultiplexerConfig, RoundTrip};

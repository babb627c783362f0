//! Request/response correlation.
//!
//! A response segment carries one undifferentiated blob of concatenated
//! operation responses whose chunking is independent of operation
//! boundaries. The correlator recovers those boundaries through the
//! operation-type catalog and walks them against the original ordered batch,
//! honoring two asymmetries:
//!
//! - **release-type** operations are fire-and-forget: the server emits no
//!   response for them, so the request cursor advances without consuming one;
//! - **unsolicited** responses (notifications, pending markers) are inserted
//!   into the stream without a matching request, so they are consumed on
//!   their own and the next real response still matches the pending request.
//!
//! The walk is an explicit three-branch rule rather than index rewinding, so
//! each tie-break condition is testable in isolation.

use crate::batch::{Operation, ResponseOp};
use crate::catalog::OperationCatalog;
use crate::error::{Result, RopwireError};
use crate::protocol::{HandleTable, ResponseSegment};

/// Reported when responses ran out before the batch did.
///
/// Not fatal: the caller decides whether a short reply is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialResponse {
    /// Requests that received their expected outcome.
    pub consumed: usize,
    /// Requests in the batch.
    pub total: usize,
}

/// One pairing produced by the walk.
#[derive(Debug, Clone)]
pub struct CorrelationEntry {
    /// Index into the request batch; absent for unsolicited responses.
    pub request: Option<usize>,
    /// The delimited response; absent for release-type requests.
    pub response: Option<ResponseOp>,
    /// Handle-table slice distributed to this response.
    pub handles: HandleTable,
}

impl CorrelationEntry {
    /// Entry for a response the server inserted without a matching request.
    pub fn is_unsolicited(&self) -> bool {
        self.request.is_none()
    }

    /// Entry for a release-type request the server never answers.
    pub fn is_suppressed(&self) -> bool {
        self.request.is_some() && self.response.is_none()
    }
}

/// Ordered outcome of one correlation pass.
///
/// Constructed fresh per round trip and consumed immediately; nothing here
/// is retained across calls.
#[derive(Debug, Clone)]
pub struct CorrelationResult {
    /// Pairings in emission order.
    pub entries: Vec<CorrelationEntry>,
    /// Handle-table entries left after distribution, in table order.
    pub extra_handles: Vec<u32>,
    /// Set when non-release requests were left without responses.
    pub partial: Option<PartialResponse>,
}

impl CorrelationResult {
    /// Number of entries carrying a response.
    pub fn response_count(&self) -> usize {
        self.entries.iter().filter(|e| e.response.is_some()).count()
    }
}

/// Walks decoded segments against the originating batch.
pub struct Correlator<'a, C: OperationCatalog> {
    catalog: &'a C,
}

impl<'a, C: OperationCatalog> Correlator<'a, C> {
    /// Create a correlator over the given catalog.
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Pair a decoded segment's responses with the batch that produced them.
    ///
    /// # Errors
    ///
    /// [`RopwireError::UnknownResponseKind`] when the catalog cannot delimit
    /// a response in the blob; [`RopwireError::MalformedFrame`] when a
    /// delimited response overruns the blob.
    pub fn pair(&self, operations: &[Operation], segment: &ResponseSegment) -> Result<CorrelationResult> {
        let responses = self.split_responses(segment)?;
        let table = segment.handles().as_slice();

        let mut entries = Vec::with_capacity(operations.len());
        let mut next_handle = 0usize;
        let mut resp = 0usize;
        let mut req = 0usize;

        while req < operations.len() {
            let kind = operations[req].kind();

            // Release-type: advance the request cursor without consuming a
            // response.
            if self.catalog.is_release(kind) {
                entries.push(CorrelationEntry {
                    request: Some(req),
                    response: None,
                    handles: HandleTable::new(),
                });
                req += 1;
                continue;
            }

            if resp >= responses.len() {
                break;
            }

            // Consume exactly one response for this request.
            let handles = if self.catalog.has_output_handle(kind) {
                take_handle(table, &mut next_handle)
            } else {
                HandleTable::new()
            };
            entries.push(CorrelationEntry {
                request: Some(req),
                response: Some(responses[resp].clone()),
                handles,
            });
            resp += 1;

            // Unsolicited responses are consumed on their own so the next
            // real response still matches the next pending request.
            while resp < responses.len() && self.catalog.is_unsolicited(responses[resp].kind()) {
                entries.push(CorrelationEntry {
                    request: None,
                    response: Some(responses[resp].clone()),
                    handles: HandleTable::new(),
                });
                resp += 1;
            }

            req += 1;
        }

        let partial = (req < operations.len()).then(|| PartialResponse {
            consumed: req,
            total: operations.len(),
        });

        Ok(CorrelationResult {
            entries,
            extra_handles: table[next_handle..].to_vec(),
            partial,
        })
    }

    /// Split the segment blob into individually-delimited responses.
    fn split_responses(&self, segment: &ResponseSegment) -> Result<Vec<ResponseOp>> {
        let blob = segment.rops_bytes();
        let mut responses = Vec::new();
        let mut offset = 0usize;

        while offset < blob.len() {
            let len = match self.catalog.response_len(&blob[offset..]) {
                Ok(len) => len,
                // Catalog offsets are relative to the slice it was handed.
                Err(RopwireError::MalformedFrame { offset: rel, reason }) => {
                    return Err(RopwireError::MalformedFrame {
                        offset: offset + rel,
                        reason,
                    })
                }
                Err(e) => return Err(e),
            };

            if len == 0 || offset + len > blob.len() {
                return Err(RopwireError::MalformedFrame {
                    offset,
                    reason: format!(
                        "delimited response of {len} bytes overruns {}-byte blob",
                        blob.len()
                    ),
                });
            }

            responses.push(ResponseOp::new(blob.slice(offset..offset + len)));
            offset += len;
        }

        Ok(responses)
    }

}

fn take_handle(table: &[u32], next: &mut usize) -> HandleTable {
    match table.get(*next) {
        Some(&handle) => {
            *next += 1;
            HandleTable::from_handles(vec![handle])
        }
        None => HandleTable::new(),
    }
}

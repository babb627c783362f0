//! Conformance verifier registry.
//!
//! Protocol-conformance checking ("does this response match what the
//! request permits") is an external concern: the core may consult it but
//! never requires it. Verifiers are registered per response-kind
//! discriminant at startup; a kind without a verifier passes trivially.
//!
//! # Example
//!
//! ```
//! use ropwire::verifier::VerifierRegistry;
//!
//! let mut registry = VerifierRegistry::new();
//! registry.register_fn(0x07, |_request, response| {
//!     if response.size() < 4 {
//!         return Err("short acknowledgement".into());
//!     }
//!     Ok(())
//! });
//! ```

use std::collections::HashMap;

use crate::batch::{Operation, ResponseOp};
use crate::correlator::CorrelationResult;
use crate::error::{Result, RopwireError};

/// Outcome of one verifier invocation; the message becomes the diagnostic
/// in [`RopwireError::Verification`].
pub type VerifyOutcome = std::result::Result<(), String>;

/// Conformance check for one response kind.
///
/// `request` is the originating operation when the response was paired with
/// one, absent for unsolicited responses.
pub trait ResponseVerifier: Send + Sync {
    /// Check the response against its originating request.
    fn verify(&self, request: Option<&Operation>, response: &ResponseOp) -> VerifyOutcome;
}

impl<F> ResponseVerifier for F
where
    F: Fn(Option<&Operation>, &ResponseOp) -> VerifyOutcome + Send + Sync,
{
    fn verify(&self, request: Option<&Operation>, response: &ResponseOp) -> VerifyOutcome {
        self(request, response)
    }
}

/// Registry mapping response-kind discriminants to verifier capabilities.
///
/// Populated at startup, read-only afterwards. Absence of a verifier for a
/// kind is not an error.
#[derive(Default)]
pub struct VerifierRegistry {
    verifiers: HashMap<u8, Box<dyn ResponseVerifier>>,
}

impl VerifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            verifiers: HashMap::new(),
        }
    }

    /// Register a verifier for a response kind. Re-registering replaces the
    /// previous verifier.
    pub fn register(&mut self, kind: u8, verifier: Box<dyn ResponseVerifier>) {
        self.verifiers.insert(kind, verifier);
    }

    /// Register a closure as the verifier for a response kind.
    pub fn register_fn<F>(&mut self, kind: u8, f: F)
    where
        F: Fn(Option<&Operation>, &ResponseOp) -> VerifyOutcome + Send + Sync + 'static,
    {
        self.register(kind, Box::new(f));
    }

    /// Check if a verifier is registered for a kind.
    pub fn contains(&self, kind: u8) -> bool {
        self.verifiers.contains_key(&kind)
    }

    /// Verify one response against its originating request, if a verifier
    /// is registered for its kind.
    pub fn verify(&self, request: Option<&Operation>, response: &ResponseOp) -> Result<()> {
        let Some(verifier) = self.verifiers.get(&response.kind()) else {
            return Ok(());
        };
        verifier
            .verify(request, response)
            .map_err(|reason| RopwireError::Verification {
                kind: response.kind(),
                reason,
            })
    }

    /// Run every applicable verifier over a correlation result.
    ///
    /// Stops at the first failing verifier; entries without responses
    /// (release-type suppressions) are skipped.
    pub fn verify_result(&self, operations: &[Operation], result: &CorrelationResult) -> Result<()> {
        for entry in &result.entries {
            let Some(response) = &entry.response else {
                continue;
            };
            let request = entry.request.map(|index| &operations[index]);
            self.verify(request, response)?;
        }
        Ok(())
    }
}

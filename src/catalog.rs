//! Operation-type catalog.
//!
//! The catalog is the external collaborator that knows, per kind
//! discriminant: whether an operation is release-type (fire-and-forget, no
//! response), whether it declares an output handle slot, whether a response
//! kind is unsolicited (notification or pending marker), and how many bytes
//! its response occupies given the response's leading bytes.
//!
//! [`StaticCatalog`] is an explicit registry populated at startup and
//! read-only afterwards; kinds map to [`KindEntry`] metadata the same way the
//! wire core looks them up at correlation time.
//!
//! # Example
//!
//! ```
//! use ropwire::catalog::{KindEntry, OperationCatalog, StaticCatalog};
//!
//! let mut catalog = StaticCatalog::new();
//! catalog.register(0x02, KindEntry::fixed(6).with_output_handle());
//! catalog.register_release(0x01);
//!
//! assert!(catalog.is_release(0x01));
//! assert!(catalog.has_output_handle(0x02));
//! assert_eq!(catalog.response_len(&[0x02, 0, 0, 0, 0, 0]).unwrap(), 6);
//! ```

use std::collections::HashMap;

use crate::error::{Result, RopwireError};

/// Length rule computing a response's byte count from its leading bytes.
///
/// The slice starts at the response's kind discriminant and extends to the
/// end of the segment blob; `None` means the bytes present are not enough to
/// delimit the response.
pub type ResponseLenFn = fn(&[u8]) -> Option<usize>;

/// How to delimit a response of a given kind.
#[derive(Clone, Copy)]
pub enum ResponseLen {
    /// Every response of this kind occupies exactly this many bytes.
    Fixed(usize),
    /// Length depends on the response's own leading fields.
    Dynamic(ResponseLenFn),
}

impl std::fmt::Debug for ResponseLen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(n) => f.debug_tuple("Fixed").field(n).finish(),
            Self::Dynamic(_) => f.debug_tuple("Dynamic").finish(),
        }
    }
}

/// Metadata for one operation kind.
#[derive(Debug, Clone)]
pub struct KindEntry {
    release: bool,
    output_handle: bool,
    unsolicited: bool,
    len: Option<ResponseLen>,
}

impl KindEntry {
    /// Kind whose responses are always `len` bytes.
    pub fn fixed(len: usize) -> Self {
        Self {
            release: false,
            output_handle: false,
            unsolicited: false,
            len: Some(ResponseLen::Fixed(len)),
        }
    }

    /// Kind whose response length is computed from the response bytes.
    pub fn dynamic(f: ResponseLenFn) -> Self {
        Self {
            release: false,
            output_handle: false,
            unsolicited: false,
            len: Some(ResponseLen::Dynamic(f)),
        }
    }

    /// Release-type kind: the server never emits a response for it.
    pub fn release() -> Self {
        Self {
            release: true,
            output_handle: false,
            unsolicited: false,
            len: None,
        }
    }

    /// Mark the kind as declaring an output handle slot.
    pub fn with_output_handle(mut self) -> Self {
        self.output_handle = true;
        self
    }

    /// Mark the kind as unsolicited (inserted into the stream without a
    /// matching request).
    pub fn unsolicited(mut self) -> Self {
        self.unsolicited = true;
        self
    }
}

/// Per-kind metadata lookups the wire core performs.
///
/// Implementations are read-only after initialization; the core never writes
/// through this trait.
pub trait OperationCatalog {
    /// Is the kind release-type (elicits no response)?
    fn is_release(&self, kind: u8) -> bool;

    /// Does the kind declare an output handle slot to append?
    fn has_output_handle(&self, kind: u8) -> bool;

    /// Is the kind an unsolicited response (notification/pending marker)?
    fn is_unsolicited(&self, kind: u8) -> bool;

    /// Byte length of the response starting at `response[0]` (its kind
    /// discriminant).
    ///
    /// # Errors
    ///
    /// [`RopwireError::UnknownResponseKind`] when the kind has no length
    /// rule; [`RopwireError::MalformedFrame`] when the bytes present cannot
    /// delimit the response (offset relative to `response`).
    fn response_len(&self, response: &[u8]) -> Result<usize>;
}

/// Registry mapping kind discriminants to [`KindEntry`] metadata.
///
/// Populated at startup via [`register`](Self::register) and the focused
/// helpers, then consulted read-only by the correlator and the handle-table
/// builder.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    kinds: HashMap<u8, KindEntry>,
}

impl StaticCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Register metadata for a kind. Re-registering a kind replaces the
    /// previous entry.
    pub fn register(&mut self, kind: u8, entry: KindEntry) {
        self.kinds.insert(kind, entry);
    }

    /// Register a fixed-length kind.
    pub fn register_fixed(&mut self, kind: u8, len: usize, output_handle: bool) {
        let mut entry = KindEntry::fixed(len);
        if output_handle {
            entry = entry.with_output_handle();
        }
        self.register(kind, entry);
    }

    /// Register a release-type kind.
    pub fn register_release(&mut self, kind: u8) {
        self.register(kind, KindEntry::release());
    }

    /// Register an unsolicited fixed-length response kind.
    pub fn register_unsolicited(&mut self, kind: u8, len: usize) {
        self.register(kind, KindEntry::fixed(len).unsolicited());
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Check if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    fn entry(&self, kind: u8) -> Option<&KindEntry> {
        self.kinds.get(&kind)
    }
}

impl OperationCatalog for StaticCatalog {
    fn is_release(&self, kind: u8) -> bool {
        self.entry(kind).is_some_and(|e| e.release)
    }

    fn has_output_handle(&self, kind: u8) -> bool {
        self.entry(kind).is_some_and(|e| e.output_handle)
    }

    fn is_unsolicited(&self, kind: u8) -> bool {
        self.entry(kind).is_some_and(|e| e.unsolicited)
    }

    fn response_len(&self, response: &[u8]) -> Result<usize> {
        let kind = *response
            .first()
            .ok_or(RopwireError::UnknownResponseKind { kind: 0 })?;
        let rule = self
            .entry(kind)
            .and_then(|e| e.len)
            .ok_or(RopwireError::UnknownResponseKind { kind })?;

        let len = match rule {
            ResponseLen::Fixed(n) => Some(n),
            ResponseLen::Dynamic(f) => f(response),
        };
        len.ok_or_else(|| RopwireError::MalformedFrame {
            offset: 0,
            reason: format!("response of kind {kind:#04x} cannot be delimited"),
        })
    }
}

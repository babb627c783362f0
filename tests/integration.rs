//! Integration tests for ropwire.
//!
//! These tests drive the full round trip: frame a batch, ship it through a
//! scripted transport, decode the reply and correlate it back to the batch.

use bytes::BufMut;

use ropwire::catalog::StaticCatalog;
use ropwire::error::Result;
use ropwire::multiplexer::{
    STATUS_FORMAT_ERROR, STATUS_RESPONSE_TOO_BIG, STATUS_WRONG_ENDPOINT,
};
use ropwire::protocol::{
    flags, FrameHeader, HandleTable, ROP_SIZE_FIELD, UNSET_HANDLE,
};
use ropwire::transport::{Transport, STATUS_SUCCESS};
use ropwire::verifier::VerifierRegistry;
use ropwire::{Correlator, Multiplexer, MultiplexerConfig, Operation, RopwireError};

const RELEASE: u8 = 0x01;
const OPEN: u8 = 0x02; // declares an output handle, 6-byte response
const ACK: u8 = 0x07; // 4-byte response
const NOTIFY: u8 = 0x94; // unsolicited, 3-byte response

fn catalog() -> StaticCatalog {
    let mut c = StaticCatalog::new();
    c.register_release(RELEASE);
    c.register_fixed(OPEN, 6, true);
    c.register_fixed(ACK, 4, false);
    c.register_unsolicited(NOTIFY, 3);
    c
}

/// Transport that replies with a canned status and body.
struct ScriptedTransport {
    status: u32,
    body: Vec<u8>,
}

impl ScriptedTransport {
    fn success(body: Vec<u8>) -> Self {
        Self {
            status: STATUS_SUCCESS,
            body,
        }
    }

    fn failing(status: u32) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, _request: &[u8], _max_response_size: u32) -> Result<(u32, Vec<u8>)> {
        Ok((self.status, self.body.clone()))
    }
}

/// Build one raw response segment.
fn response_segment(header_flags: u16, rops: &[u8], handles: &[u32]) -> Vec<u8> {
    let sub_len = (ROP_SIZE_FIELD + rops.len()) as u16;
    let declared = sub_len + (handles.len() * 4) as u16;
    let mut bytes = FrameHeader::new(header_flags, declared, declared)
        .encode()
        .to_vec();
    bytes.put_u16_le(sub_len);
    bytes.extend_from_slice(rops);
    for &h in handles {
        bytes.put_u32_le(h);
    }
    bytes
}

fn ack_response(tag: u8) -> Vec<u8> {
    vec![ACK, tag, 0x00, 0x00]
}

fn open_response(tag: u8) -> Vec<u8> {
    vec![OPEN, tag, 0x00, 0x00, 0x00, 0x00]
}

/// Full round trip: N operations and an M-entry handle table come back in
/// original order with every handle entry accounted for.
#[test]
fn test_round_trip_pairing() {
    let catalog = catalog();
    let ops = vec![
        Operation::new(OPEN, vec![OPEN, 0x00, 0x01]),
        Operation::new(ACK, vec![ACK, 0x00]),
    ];

    let mut rops = open_response(1);
    rops.extend(ack_response(2));
    let table = [0x11, 0x22, 0x33]; // M = 3
    let body = response_segment(flags::LAST, &rops, &table);

    let mut mux = Multiplexer::new(ScriptedTransport::success(body));
    let round_trip = mux.execute(&ops, &HandleTable::new(), 0x10008).unwrap();
    let result = Correlator::new(&catalog)
        .pair(&ops, &round_trip.segment)
        .unwrap();

    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.entries[0].request, Some(0));
    assert_eq!(result.entries[0].response.as_ref().unwrap().kind(), OPEN);
    assert_eq!(result.entries[1].request, Some(1));
    assert_eq!(result.entries[1].response.as_ref().unwrap().kind(), ACK);

    // Every table entry is distributed or exposed, none dropped.
    let distributed: usize = result.entries.iter().map(|e| e.handles.len()).sum();
    assert_eq!(distributed + result.extra_handles.len(), table.len());
    assert_eq!(result.entries[0].handles.as_slice(), &[0x11]);
    assert_eq!(result.extra_handles, vec![0x22, 0x33]);
}

/// A release-type operation in the middle of a batch suppresses exactly one
/// response slot.
#[test]
fn test_release_suppression_end_to_end() {
    let catalog = catalog();
    let ops = vec![
        Operation::new(ACK, vec![ACK, 0x00]),
        Operation::new(RELEASE, vec![RELEASE, 0x00]),
        Operation::new(ACK, vec![ACK, 0x01]),
    ];

    let mut rops = ack_response(1);
    rops.extend(ack_response(2));
    let body = response_segment(flags::LAST, &rops, &[]);

    let mut mux = Multiplexer::new(ScriptedTransport::success(body));
    let round_trip = mux.execute(&ops, &HandleTable::new(), 0x10008).unwrap();
    let result = Correlator::new(&catalog)
        .pair(&ops, &round_trip.segment)
        .unwrap();

    assert_eq!(result.entries.len(), 3);
    assert_eq!(result.response_count(), 2);
    assert!(result.entries[1].is_suppressed());
    assert_eq!(result.entries[2].request, Some(2));
    assert_eq!(
        result.entries[2].response.as_ref().unwrap().as_bytes()[1],
        2
    );
    assert!(result.partial.is_none());
}

/// An unsolicited response inserted mid-stream is consumed on its own; the
/// request cursor must not skip the following request.
#[test]
fn test_unsolicited_insertion_end_to_end() {
    let catalog = catalog();
    let ops = vec![
        Operation::new(ACK, vec![ACK, 0x00]),
        Operation::new(ACK, vec![ACK, 0x01]),
    ];

    let mut rops = ack_response(1);
    rops.extend([NOTIFY, 0x00, 0x00]);
    rops.extend(ack_response(2));
    let body = response_segment(flags::LAST, &rops, &[]);

    let mut mux = Multiplexer::new(ScriptedTransport::success(body));
    let round_trip = mux.execute(&ops, &HandleTable::new(), 0x10008).unwrap();
    let result = Correlator::new(&catalog)
        .pair(&ops, &round_trip.segment)
        .unwrap();

    assert_eq!(result.entries.len(), 3);
    assert_eq!(result.entries[0].request, Some(0));
    assert!(result.entries[1].is_unsolicited());
    assert_eq!(result.entries[2].request, Some(1));
    assert_eq!(
        result.entries[2].response.as_ref().unwrap().as_bytes()[1],
        2
    );
}

/// Encoding a batch whose sub-length totals exactly 65535 succeeds; one
/// byte more fails.
#[test]
fn test_size_boundary() {
    let at_limit = vec![Operation::new(0x40, vec![0x40; 65533])];
    assert!(ropwire::protocol::encode_request(&at_limit, &HandleTable::new()).is_ok());

    let over_limit = vec![Operation::new(0x40, vec![0x40; 65534])];
    assert!(matches!(
        ropwire::protocol::encode_request(&over_limit, &HandleTable::new()),
        Err(RopwireError::FrameTooLarge { size: 65536 })
    ));
}

/// A reply whose final header never sets the last flag is corrupt.
#[test]
fn test_missing_terminal_segment_detected() {
    let body = response_segment(0, &ack_response(1), &[]);
    let ops = vec![Operation::new(ACK, vec![ACK, 0x00])];

    let mut mux = Multiplexer::new(ScriptedTransport::success(body));
    let err = mux.execute(&ops, &HandleTable::new(), 0x10008).unwrap_err();
    assert!(matches!(err, RopwireError::MalformedFrame { .. }));
}

/// A handle-table remainder of 3 bytes is a framing corruption.
#[test]
fn test_handle_remainder_corruption_detected() {
    let mut body = FrameHeader::new(flags::LAST, 9, 9).encode().to_vec();
    body.put_u16_le(6);
    body.extend_from_slice(&ack_response(1));
    body.extend_from_slice(&[0x01, 0x02, 0x03]);

    let ops = vec![Operation::new(ACK, vec![ACK, 0x00])];
    let mut mux = Multiplexer::new(ScriptedTransport::success(body));
    let err = mux.execute(&ops, &HandleTable::new(), 0x10008).unwrap_err();
    match err {
        RopwireError::MalformedFrame { reason, .. } => {
            assert!(reason.contains("not a multiple of 4"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Three non-release requests against two responses report a partial
/// response instead of failing.
#[test]
fn test_partial_response_reported() {
    let catalog = catalog();
    let ops = vec![
        Operation::new(ACK, vec![ACK, 0x00]),
        Operation::new(ACK, vec![ACK, 0x01]),
        Operation::new(ACK, vec![ACK, 0x02]),
    ];

    let mut rops = ack_response(1);
    rops.extend(ack_response(2));
    let body = response_segment(flags::LAST, &rops, &[]);

    let mut mux = Multiplexer::new(ScriptedTransport::success(body));
    let round_trip = mux.execute(&ops, &HandleTable::new(), 0x10008).unwrap();
    let result = Correlator::new(&catalog)
        .pair(&ops, &round_trip.segment)
        .unwrap();

    assert_eq!(result.entries.len(), 2);
    let partial = result.partial.unwrap();
    assert_eq!(partial.consumed, 2);
    assert_eq!(partial.total, 3);
}

/// Transport status words map to the documented error taxonomy.
#[test]
fn test_status_classification() {
    let ops = vec![Operation::new(ACK, vec![ACK, 0x00])];

    let mut mux = Multiplexer::new(ScriptedTransport::failing(STATUS_FORMAT_ERROR));
    assert!(matches!(
        mux.execute(&ops, &HandleTable::new(), 0x10008),
        Err(RopwireError::MalformedRequest)
    ));

    let mut mux = Multiplexer::new(ScriptedTransport::failing(STATUS_RESPONSE_TOO_BIG));
    assert!(matches!(
        mux.execute(&ops, &HandleTable::new(), 0x4000),
        Err(RopwireError::ResponseTooBig { requested: 0x4000 })
    ));

    let mut mux = Multiplexer::with_config(
        ScriptedTransport::failing(STATUS_WRONG_ENDPOINT),
        MultiplexerConfig {
            follow_redirects: true,
        },
    );
    assert!(matches!(
        mux.execute(&ops, &HandleTable::new(), 0x10008),
        Err(RopwireError::Redirect)
    ));

    let mut mux = Multiplexer::new(ScriptedTransport::failing(0xDEAD));
    assert!(matches!(
        mux.execute(&ops, &HandleTable::new(), 0x10008),
        Err(RopwireError::Transport(0xDEAD))
    ));
}

/// Output-slot reservation flows through framing and back into the paired
/// result once the server populates the slot.
#[test]
fn test_output_slot_reservation_flow() {
    let catalog = catalog();
    let ops = vec![Operation::new(OPEN, vec![OPEN, 0x00, 0x01])];

    let mut request_handles = HandleTable::from_handles(vec![0x10]);
    request_handles.reserve_output_slots(&catalog, &ops);
    assert_eq!(request_handles.as_slice(), &[0x10, UNSET_HANDLE]);

    // Server populates the reserved slot in its reply table.
    let body = response_segment(flags::LAST, &open_response(1), &[0x77, 0x10]);
    let mut mux = Multiplexer::new(ScriptedTransport::success(body));
    let round_trip = mux.execute(&ops, &request_handles, 0x10008).unwrap();
    let result = Correlator::new(&catalog)
        .pair(&ops, &round_trip.segment)
        .unwrap();

    assert_eq!(result.entries[0].handles.as_slice(), &[0x77]);
    assert_eq!(result.extra_handles, vec![0x10]);
}

/// A registered verifier runs over every paired response; absence of one is
/// never an error.
#[test]
fn test_verifier_pass_over_round_trip() {
    let catalog = catalog();
    let ops = vec![
        Operation::new(ACK, vec![ACK, 0x00]),
        Operation::new(OPEN, vec![OPEN, 0x00, 0x01]),
    ];

    let mut rops = ack_response(0x2A);
    rops.extend(open_response(1));
    let body = response_segment(flags::LAST, &rops, &[0x11]);

    let mut mux = Multiplexer::new(ScriptedTransport::success(body));
    let round_trip = mux.execute(&ops, &HandleTable::new(), 0x10008).unwrap();
    let result = Correlator::new(&catalog)
        .pair(&ops, &round_trip.segment)
        .unwrap();

    // Only ACK has a verifier; OPEN passes by absence.
    let mut registry = VerifierRegistry::new();
    registry.register_fn(ACK, |request, response| {
        if request.is_none() {
            return Err("acknowledgement without a request".into());
        }
        if response.as_bytes()[1] != 0x2A {
            return Err("unexpected tag".into());
        }
        Ok(())
    });
    assert!(registry.verify_result(&ops, &result).is_ok());

    // A rejecting verifier surfaces a typed error.
    registry.register_fn(ACK, |_req, _resp| Err("forced failure".into()));
    assert!(matches!(
        registry.verify_result(&ops, &result),
        Err(RopwireError::Verification { kind, .. }) if kind == ACK
    ));
}

//! Response Framer (§4.5 item 6, §6.3): turns a handler's result into an outbound WebSocket
//! frame, JSON for control/metadata actions and length-prefixed binary for block and
//! raw-metadata responses.

use serde::Serialize;

/// Message-kind constant written at `[24:32]` of the raw-meta frame (§6.3.b). The reference
/// implementation references a `TMQRawMessage` constant at this offset, but its defining file
/// was not part of the distillation inputs available here; `1` is a chosen literal, not one
/// recovered from the original source (see DESIGN.md).
pub const TMQ_RAW_MESSAGE: u64 = 1;

/// An encoded frame ready to hand to the outbound socket half.
#[derive(Debug)]
pub enum OutboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Serialize `value` as a text frame.
pub fn json(value: &impl Serialize) -> Result<OutboundFrame, serde_json::Error> {
    Ok(OutboundFrame::Text(serde_json::to_string(value)?))
}

/// Write the three headers shared by both binary layouts (§6.3): `timing_ns`, `req_id`,
/// `message_id`, each a little-endian `u64`. Both frame builders below call this first so the
/// two layouts cannot drift apart (§9, Resolved Open Question 3).
fn write_common_header(buffer: &mut Vec<u8>, timing_ns: u64, req_id: u64, message_id: u64) {
    buffer.extend_from_slice(&timing_ns.to_le_bytes());
    buffer.extend_from_slice(&req_id.to_le_bytes());
    buffer.extend_from_slice(&message_id.to_le_bytes());
}

/// Build the `fetch_block` binary frame (§6.3.a): a 24-byte header followed by the raw block
/// bytes. `body` already contains the header's 24 reserved bytes (written by `fetch`, §4.7)
/// with the leading 8 stamped by `fetch_block` itself (§4.8) — this helper is for tests and
/// any caller building the frame from scratch rather than via the message buffer's in-place
/// stamp.
pub fn data_block_frame(timing_ns: u64, req_id: u64, message_id: u64, raw_block: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(24 + raw_block.len());
    write_common_header(&mut buffer, timing_ns, req_id, message_id);
    buffer.extend_from_slice(raw_block);
    buffer
}

/// Build the `fetch_raw` binary frame (§6.3.b): header, `message_kind`, `payload_length`,
/// `meta_type`, then the payload.
pub fn raw_meta_frame(
    timing_ns: u64,
    req_id: u64,
    message_id: u64,
    meta_type: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(38 + payload.len());
    write_common_header(&mut buffer, timing_ns, req_id, message_id);
    buffer.extend_from_slice(&TMQ_RAW_MESSAGE.to_le_bytes());
    buffer.extend_from_slice(&u32::try_from(payload.len()).unwrap_or(u32::MAX).to_le_bytes());
    buffer.extend_from_slice(&meta_type.to_le_bytes());
    buffer.extend_from_slice(payload);
    buffer
}

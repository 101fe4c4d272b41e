//! Record envelope codec
//!
//! Every record is stored as one self-describing, checksummed blob:
//!
//! ```text
//! ┌──────────────┬───────────────────┬─────────────────────┐
//! │ offset (8 B) │ payload (N bytes) │ SHA-256 (32 bytes)  │
//! │  big-endian  │      opaque       │ over offset‖payload │
//! └──────────────┴───────────────────┴─────────────────────┘
//! ```
//!
//! The offset sits inside the checksum scope, so an intact envelope moved to
//! another offset's key is still detected by the read path.

use crate::error::EnvelopeError;
use sha2::{Digest, Sha256};

/// Size of the big-endian offset field
pub const OFFSET_LEN: usize = 8;

/// Size of the SHA-256 checksum trailer
pub const CHECKSUM_LEN: usize = 32;

/// Smallest valid envelope (empty payload)
pub const MIN_ENVELOPE_LEN: usize = OFFSET_LEN + CHECKSUM_LEN;

/// Total envelope size for a payload of `payload_len` bytes
pub const fn encoded_len(payload_len: usize) -> usize {
    OFFSET_LEN + payload_len + CHECKSUM_LEN
}

/// Compute the checksum of `be64(offset) || payload`
pub fn checksum(offset: u64, payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    digest(&offset.to_be_bytes(), payload)
}

fn digest(offset_field: &[u8], payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(offset_field);
    hasher.update(payload);
    hasher.finalize().into()
}

/// Encode a record into its envelope bytes
pub fn encode(offset: u64, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_len(payload.len()));
    bytes.extend_from_slice(&offset.to_be_bytes());
    bytes.extend_from_slice(payload);
    let sum = digest(&bytes[..OFFSET_LEN], payload);
    bytes.extend_from_slice(&sum);
    bytes
}

/// Verify an envelope and return its payload
pub fn decode_and_verify(bytes: &[u8]) -> Result<&[u8], EnvelopeError> {
    decode(bytes).map(|envelope| envelope.payload())
}

/// Verify an envelope and return a borrowed view of its fields
pub fn decode(bytes: &[u8]) -> Result<Envelope<'_>, EnvelopeError> {
    if bytes.len() < MIN_ENVELOPE_LEN {
        return Err(EnvelopeError::Malformed { len: bytes.len() });
    }

    let (body, stored) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let (offset_field, payload) = body.split_at(OFFSET_LEN);

    if digest(offset_field, payload).as_slice() != stored {
        return Err(EnvelopeError::ChecksumMismatch);
    }

    let mut offset = [0u8; OFFSET_LEN];
    offset.copy_from_slice(offset_field);
    let mut checksum = [0u8; CHECKSUM_LEN];
    checksum.copy_from_slice(stored);

    Ok(Envelope {
        offset: u64::from_be_bytes(offset),
        payload,
        checksum,
    })
}

/// A verified envelope borrowed from the stored bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    offset: u64,
    payload: &'a [u8],
    checksum: [u8; CHECKSUM_LEN],
}

impl<'a> Envelope<'a> {
    /// Offset recorded inside the envelope
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn checksum(&self) -> &[u8; CHECKSUM_LEN] {
        &self.checksum
    }
}

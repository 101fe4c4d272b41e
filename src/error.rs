//! Error types for log operations

use thiserror::Error;

/// Log operation result type
pub type Result<T> = std::result::Result<T, WalError>;

/// Store operation result type
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Envelope decoding errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Blob is shorter than the smallest possible envelope
    #[error("Malformed envelope: {len} bytes (minimum 40)")]
    Malformed { len: usize },

    /// Stored checksum does not match the recomputed digest
    #[error("Envelope checksum verification failed")]
    ChecksumMismatch,
}

/// Errors reported by an object store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store or transport failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its deadline
    #[error("Store call timed out")]
    Timeout,

    /// Key rejected by the store
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Log operation errors
#[derive(Error, Debug)]
pub enum WalError {
    /// Object at the offset's key is too short to be an envelope
    #[error("Malformed record at offset {offset}: {len} bytes")]
    Malformed { offset: u64, len: usize },

    /// Record failed checksum verification
    #[error("Corrupt record at offset {offset}")]
    Corrupt { offset: u64 },

    /// Envelope is valid but was written for another offset
    #[error("Offset mismatch: key is for offset {expected}, envelope says {found}")]
    OffsetMismatch { expected: u64, found: u64 },

    /// Conditional write found an existing object
    #[error("Conflict: offset {0} already exists")]
    Conflict(u64),

    /// Nothing stored at the offset's key
    #[error("Record not found at offset {0}")]
    NotFound(u64),

    /// Store failed while handling the offset; the outcome of a write is unknown
    #[error("Store unavailable at offset {offset}: {source}")]
    StoreUnavailable {
        offset: u64,
        #[source]
        source: StoreError,
    },

    /// Store refused the offset's key; retrying cannot succeed
    #[error("Key rejected by store at offset {offset}: {source}")]
    KeyRejected {
        offset: u64,
        #[source]
        source: StoreError,
    },

    /// Payload exceeds the configured bound
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Offsets start at 1
    #[error("Invalid offset: {0}")]
    InvalidOffset(u64),

    /// Key prefix failed validation
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Configuration failed to parse or validate
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalError::StoreUnavailable { .. })
    }

    /// Offset the error refers to, if any
    pub fn offset(&self) -> Option<u64> {
        match self {
            WalError::Malformed { offset, .. }
            | WalError::Corrupt { offset }
            | WalError::StoreUnavailable { offset, .. }
            | WalError::KeyRejected { offset, .. } => Some(*offset),
            WalError::OffsetMismatch { expected, .. } => Some(*expected),
            WalError::Conflict(offset)
            | WalError::NotFound(offset)
            | WalError::InvalidOffset(offset) => Some(*offset),
            WalError::PayloadTooLarge { .. }
            | WalError::InvalidNamespace(_)
            | WalError::Config(_) => None,
        }
    }

    /// Wrap a store failure for `offset`, separating rejected keys from
    /// transport failures
    pub(crate) fn from_store(offset: u64, source: StoreError) -> Self {
        match source {
            StoreError::InvalidKey(_) => WalError::KeyRejected { offset, source },
            source => WalError::StoreUnavailable { offset, source },
        }
    }

    pub(crate) fn from_envelope(offset: u64, err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Malformed { len } => WalError::Malformed { offset, len },
            EnvelopeError::ChecksumMismatch => WalError::Corrupt { offset },
        }
    }
}

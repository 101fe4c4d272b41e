//! Append and read protocol
//!
//! A [`Wal`] allocates offsets from a local cursor, places each record with a
//! conditional write at its offset's key, and verifies every record it reads
//! back. The store's create-if-absent write is the only exclusivity mechanism:
//! of all attempts at one offset, at most one lands.

use crate::addressing::Namespace;
use crate::config::WalConfig;
use crate::envelope;
use crate::error::{Result, WalError};
use crate::store::{ObjectStore, PutOutcome};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// A record read back from the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: u64,
    pub payload: Vec<u8>,
}

/// Verdict of reading back an append whose outcome is unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Our envelope is stored at the offset
    Landed,
    /// Nothing is stored at the offset
    Absent,
    /// A different record occupies the offset
    Taken,
}

/// Write-ahead log over an object store
///
/// The cursor is the only mutable state. It is read under a lock to pick the
/// next candidate offset and raised under the same lock once the conditional
/// write succeeds; the lock is never held across store I/O.
pub struct Wal<S> {
    store: S,
    namespace: Namespace,
    config: WalConfig,
    cursor: Mutex<u64>,
}

impl<S: ObjectStore> Wal<S> {
    /// Create a log over `store` under `prefix` with default limits
    ///
    /// The cursor starts at 0; the store is not probed.
    pub fn new(store: S, prefix: impl Into<String>) -> Result<Self> {
        Self::with_config(store, WalConfig::new(prefix))
    }

    /// Create a log from a validated configuration without probing the store
    pub fn with_config(store: S, config: WalConfig) -> Result<Self> {
        config.validate()?;
        let namespace = config.namespace()?;
        info!(
            "Created WAL at '{}' (max payload {} bytes)",
            namespace, config.max_payload_size
        );

        Ok(Wal {
            store,
            namespace,
            config,
            cursor: Mutex::new(0),
        })
    }

    /// Create a log and, if the configuration asks for it, discover its tail
    pub fn open(store: S, config: WalConfig) -> Result<Self> {
        let discover = config.discover_tail;
        let wal = Self::with_config(store, config)?;
        if discover {
            wal.discover_tail()?;
        }
        Ok(wal)
    }

    /// Append a record, returning its offset
    ///
    /// On any error the cursor is unchanged. After `StoreUnavailable` the
    /// write may still have landed; use
    /// [`confirm_append`](Self::confirm_append) before retrying.
    /// `KeyRejected` means the store cannot hold this namespace's keys.
    pub fn append(&self, payload: &[u8]) -> Result<u64> {
        if payload.len() > self.config.max_payload_size {
            return Err(WalError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        let candidate = {
            let cursor = self.cursor.lock();
            // offset space exhausted
            cursor.checked_add(1).ok_or(WalError::InvalidOffset(*cursor))?
        };

        let key = self.namespace.key(candidate);
        let body = envelope::encode(candidate, payload);

        match self.store.put_if_absent(&key, &body) {
            Ok(PutOutcome::Created) => {
                let mut cursor = self.cursor.lock();
                *cursor = (*cursor).max(candidate);
                debug!("Appended offset {} ({} bytes) at {}", candidate, payload.len(), key);
                Ok(candidate)
            }
            Ok(PutOutcome::AlreadyExists) => {
                warn!("Append conflict at offset {} ({})", candidate, key);
                Err(WalError::Conflict(candidate))
            }
            Err(source) => {
                warn!("Append to {} failed: {}", key, source);
                Err(WalError::from_store(candidate, source))
            }
        }
    }

    /// Read and verify the record at `offset`
    pub fn read(&self, offset: u64) -> Result<Record> {
        if offset == 0 {
            return Err(WalError::InvalidOffset(0));
        }

        let key = self.namespace.key(offset);
        let bytes = self
            .store
            .get(&key)
            .map_err(|source| WalError::from_store(offset, source))?
            .ok_or(WalError::NotFound(offset))?;

        let envelope = envelope::decode(&bytes).map_err(|e| {
            warn!("Rejected record at {} ({} bytes): {}", key, bytes.len(), e);
            WalError::from_envelope(offset, e)
        })?;

        if envelope.offset() != offset {
            warn!(
                "Record at {} belongs to offset {} (checksum {})",
                key,
                envelope.offset(),
                hex::encode(envelope.checksum())
            );
            return Err(WalError::OffsetMismatch {
                expected: offset,
                found: envelope.offset(),
            });
        }

        debug!("Read offset {} ({} bytes)", offset, envelope.payload().len());
        Ok(Record {
            offset,
            payload: envelope.payload().to_vec(),
        })
    }

    /// Resolve an append that failed with `StoreUnavailable`
    ///
    /// Reads back `offset` and compares it with what `append` would have
    /// written for `payload`. On `Landed` the cursor is raised to `offset`.
    pub fn confirm_append(&self, offset: u64, payload: &[u8]) -> Result<Confirmation> {
        let confirmation = match self.read(offset) {
            Ok(record) if record.payload == payload => {
                self.advance_cursor(offset);
                Confirmation::Landed
            }
            Ok(_) => Confirmation::Taken,
            Err(WalError::NotFound(_)) => Confirmation::Absent,
            Err(e) => return Err(e),
        };

        info!("Confirmed offset {}: {:?}", offset, confirmation);
        Ok(confirmation)
    }

    /// Find the highest offset present in the store and raise the cursor to it
    ///
    /// Assumes records are contiguous from offset 1. Gallops over offsets
    /// 1, 2, 4, ... to the first absent one, then binary searches the gap, so
    /// a log of N records costs O(log N) existence checks.
    pub fn discover_tail(&self) -> Result<u64> {
        if !self.exists(1)? {
            info!("Discovered empty WAL at '{}'", self.namespace);
            return Ok(0);
        }

        // lo is always present, hi always absent
        let mut lo = 1u64;
        let hi = loop {
            let next = lo.saturating_mul(2);
            if next == lo {
                break None;
            }
            if self.exists(next)? {
                lo = next;
            } else {
                break Some(next);
            }
        };

        if let Some(mut hi) = hi {
            while hi - lo > 1 {
                let mid = lo + (hi - lo) / 2;
                if self.exists(mid)? {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
        }

        let cursor = self.advance_cursor(lo);
        info!(
            "Discovered tail of '{}' at offset {} (cursor {})",
            self.namespace, lo, cursor
        );
        Ok(lo)
    }

    fn exists(&self, offset: u64) -> Result<bool> {
        self.store
            .exists(&self.namespace.key(offset))
            .map_err(|source| WalError::from_store(offset, source))
    }

    /// Iterate records from `offset` up to the first missing one
    pub fn iter_from(&self, offset: u64) -> RecordIter<'_, S> {
        RecordIter {
            wal: self,
            next: offset,
            done: false,
        }
    }

    /// Highest offset this instance believes it has appended
    pub fn cursor(&self) -> u64 {
        *self.cursor.lock()
    }

    /// Raise the cursor to `offset` if it is behind, returning the new cursor
    pub fn advance_cursor(&self, offset: u64) -> u64 {
        let mut cursor = self.cursor.lock();
        *cursor = (*cursor).max(offset);
        *cursor
    }

    /// Store key of `offset`
    pub fn key(&self, offset: u64) -> String {
        self.namespace.key(offset)
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn config(&self) -> &WalConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Sequential reader returned by [`Wal::iter_from`]
///
/// Ends cleanly at the first missing offset. Any other error is yielded once
/// and ends the iteration.
pub struct RecordIter<'a, S> {
    wal: &'a Wal<S>,
    next: u64,
    done: bool,
}

impl<'a, S: ObjectStore> Iterator for RecordIter<'a, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.wal.read(self.next) {
            Ok(record) => {
                match self.next.checked_add(1) {
                    Some(next) => self.next = next,
                    None => self.done = true,
                }
                Some(Ok(record))
            }
            Err(WalError::NotFound(_)) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

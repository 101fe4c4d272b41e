//! # s3-wal - Write-Ahead Log on an Object Store
//!
//! `s3-wal` turns any key-object store with a conditional "create if absent"
//! write into an append-only, offset-addressed log:
//!
//! - **Ordered offsets**: every successful append returns the next offset (1, 2, 3, ...)
//! - **One object per record**: keys are `<prefix>/<offset padded to 20 digits>`,
//!   so listing order is log order
//! - **Exclusive placement**: the conditional write guarantees at most one record per offset
//! - **Verified reads**: each record carries a SHA-256 checksum over its offset and
//!   payload; corruption is reported, never returned as data
//!
//! ## Quick Start
//!
//! ```rust
//! use s3_wal::{MemoryStore, Wal, WalError};
//!
//! # fn main() -> s3_wal::Result<()> {
//! let wal = Wal::new(MemoryStore::new(), "log")?;
//!
//! let offset = wal.append(b"a")?;
//! assert_eq!(offset, 1);
//! assert_eq!(wal.key(offset), "log/00000000000000000001");
//!
//! let record = wal.read(1)?;
//! assert_eq!(record.payload, b"a");
//!
//! assert!(matches!(wal.read(2), Err(WalError::NotFound(2))));
//! # Ok(())
//! # }
//! ```
//!
//! ## Restarting Against an Existing Log
//!
//! A log created with [`Wal::new`] starts with an empty cursor and will
//! conflict on every offset that is already stored. [`Wal::open`] with tail
//! discovery enabled probes the store first:
//!
//! ```rust
//! use s3_wal::{DirStore, Wal, WalConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::TempDir::new()?;
//! let store = DirStore::open(dir.path())?;
//! let config = WalConfig::new("orders/wal").with_tail_discovery(true);
//!
//! let wal = Wal::open(store, config)?;
//! let next = wal.append(b"order placed")?;
//! assert_eq!(next, wal.cursor());
//! # Ok(())
//! # }
//! ```
//!
//! ## Failures
//!
//! Appends never retry internally. A `Conflict` means the offset is taken; a
//! `StoreUnavailable` means the write may or may not have landed, and
//! [`Wal::confirm_append`] reads it back to decide. A `KeyRejected` means the
//! store cannot hold the log's keys at all, and retrying will not help.

pub mod addressing;
pub mod config;
pub mod envelope;
pub mod error;
pub mod store;
pub mod wal;

pub use addressing::Namespace;
pub use config::WalConfig;
pub use envelope::{decode_and_verify, encode, Envelope};
pub use error::{EnvelopeError, Result, StoreError, StoreResult, WalError};
pub use store::{DirStore, FaultPlan, MemoryStore, ObjectStore, PutOutcome};
pub use wal::{Confirmation, Record, RecordIter, Wal};

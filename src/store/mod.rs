//! Object store capability
//!
//! The log only needs two primitives from its backing store: a conditional
//! "create if absent" write and a plain read. Anything offering those (S3 with
//! `If-None-Match: *`, GCS with `ifGenerationMatch=0`, a local directory) can
//! back a [`Wal`](crate::Wal).

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::{FaultPlan, MemoryStore};

use crate::error::StoreResult;
use std::sync::Arc;

/// Result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Object was created by this call
    Created,
    /// An object already existed; it was left untouched
    AlreadyExists,
}

/// Key-object store with create-if-absent writes
///
/// Implementations must make `put_if_absent` atomic per key: of any number of
/// concurrent calls for the same key, at most one reports `Created`, and a
/// reader never observes a partially written body.
pub trait ObjectStore: Send + Sync {
    /// Create `key` with `body` only if no object exists at `key`
    fn put_if_absent(&self, key: &str, body: &[u8]) -> StoreResult<PutOutcome>;

    /// Fetch the object at `key`, or `None` if there is none
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Whether an object exists at `key`
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn put_if_absent(&self, key: &str, body: &[u8]) -> StoreResult<PutOutcome> {
        (**self).put_if_absent(key, body)
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        (**self).exists(key)
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn put_if_absent(&self, key: &str, body: &[u8]) -> StoreResult<PutOutcome> {
        (**self).put_if_absent(key, body)
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        (**self).exists(key)
    }
}

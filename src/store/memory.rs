//! In-memory object store
//!
//! Thread-safe map from key to body. Besides serving as a lightweight backend,
//! it can inject store failures so callers can exercise the unhappy paths of
//! the append protocol.

use super::{ObjectStore, PutOutcome};
use crate::error::{StoreError, StoreResult};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use tracing::debug;

/// Failures to inject into upcoming store calls
///
/// Each counter is consumed one call at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Puts that fail before the object is stored
    pub fail_puts: usize,
    /// Puts that time out before the object is stored
    pub timeouts: usize,
    /// Puts that store the object and then report a failure
    pub lose_put_acks: usize,
    /// Gets that fail
    pub fail_gets: usize,
}

/// In-memory object store
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    faults: Mutex<FaultPlan>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending fault plan
    pub fn inject(&self, plan: FaultPlan) {
        *self.faults.lock() = plan;
    }

    /// Remaining faults that have not fired yet
    pub fn pending_faults(&self) -> FaultPlan {
        self.faults.lock().clone()
    }

    /// Store `body` at `key` unconditionally, bypassing faults
    ///
    /// Used to plant foreign or damaged objects.
    pub fn insert_raw(&self, key: impl Into<String>, body: Vec<u8>) {
        self.objects.write().insert(key.into(), body);
    }

    /// Remove the object at `key`, returning its body
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.write().remove(key)
    }

    /// All keys in lexicographic order
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn take_fault(counter: &mut usize) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }
}

impl ObjectStore for MemoryStore {
    fn put_if_absent(&self, key: &str, body: &[u8]) -> StoreResult<PutOutcome> {
        let (fail, timeout, lose_ack) = {
            let mut faults = self.faults.lock();
            let fail = Self::take_fault(&mut faults.fail_puts);
            let timeout = !fail && Self::take_fault(&mut faults.timeouts);
            let lose_ack = !fail && !timeout && Self::take_fault(&mut faults.lose_put_acks);
            (fail, timeout, lose_ack)
        };

        if timeout {
            debug!("Injected put timeout for {}", key);
            return Err(StoreError::Timeout);
        }

        if fail {
            debug!("Injected put failure for {}", key);
            return Err(StoreError::Unavailable(format!("injected put failure: {}", key)));
        }

        let outcome = {
            let mut objects = self.objects.write();
            if objects.contains_key(key) {
                PutOutcome::AlreadyExists
            } else {
                objects.insert(key.to_string(), body.to_vec());
                PutOutcome::Created
            }
        };

        if lose_ack {
            debug!("Injected lost acknowledgement for {} ({:?})", key, outcome);
            return Err(StoreError::Unavailable(format!("injected lost ack: {}", key)));
        }

        Ok(outcome)
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if Self::take_fault(&mut self.faults.lock().fail_gets) {
            debug!("Injected get failure for {}", key);
            return Err(StoreError::Unavailable(format!("injected get failure: {}", key)));
        }

        Ok(self.objects.read().get(key).cloned())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        if Self::take_fault(&mut self.faults.lock().fail_gets) {
            return Err(StoreError::Unavailable(format!("injected get failure: {}", key)));
        }

        Ok(self.objects.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_if_absent() {
        let store = MemoryStore::new();

        assert_eq!(store.put_if_absent("k", b"one").unwrap(), PutOutcome::Created);
        assert_eq!(
            store.put_if_absent("k", b"two").unwrap(),
            PutOutcome::AlreadyExists
        );

        // Existing object is untouched
        assert_eq!(store.get("k").unwrap().unwrap(), b"one");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());
        assert!(!store.exists("missing").unwrap());
    }

    #[test]
    fn test_failed_put_stores_nothing() {
        let store = MemoryStore::new();
        store.inject(FaultPlan {
            fail_puts: 1,
            ..Default::default()
        });

        assert!(matches!(
            store.put_if_absent("k", b"v"),
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.is_empty());

        // Fault is consumed
        assert_eq!(store.put_if_absent("k", b"v").unwrap(), PutOutcome::Created);
    }

    #[test]
    fn test_timed_out_put_stores_nothing() {
        let store = MemoryStore::new();
        store.inject(FaultPlan {
            timeouts: 1,
            ..Default::default()
        });

        assert!(matches!(
            store.put_if_absent("k", b"v"),
            Err(StoreError::Timeout)
        ));
        assert!(store.is_empty());
        assert_eq!(store.pending_faults(), FaultPlan::default());
        assert_eq!(store.put_if_absent("k", b"v").unwrap(), PutOutcome::Created);
    }

    #[test]
    fn test_lost_ack_stores_object() {
        let store = MemoryStore::new();
        store.inject(FaultPlan {
            lose_put_acks: 1,
            ..Default::default()
        });

        assert!(store.put_if_absent("k", b"v").is_err());
        assert_eq!(store.get("k").unwrap().unwrap(), b"v");
        assert_eq!(store.pending_faults(), FaultPlan::default());
    }

    #[test]
    fn test_failed_gets() {
        let store = MemoryStore::new();
        store.insert_raw("k", b"v".to_vec());
        store.inject(FaultPlan {
            fail_gets: 2,
            ..Default::default()
        });

        assert!(store.get("k").is_err());
        assert!(store.exists("k").is_err());
        assert!(store.exists("k").unwrap());
    }

    #[test]
    fn test_keys_sorted() {
        let store = MemoryStore::new();
        store.insert_raw("b", vec![]);
        store.insert_raw("a", vec![]);
        store.insert_raw("c", vec![]);
        assert_eq!(store.keys(), vec!["a", "b", "c"]);

        assert_eq!(store.remove("b"), Some(vec![]));
        assert_eq!(store.keys(), vec!["a", "c"]);
    }
}

//! Record corruption detection tests
//!
//! Plants damaged, truncated, foreign, and misplaced objects in the store and
//! checks that reads report them distinctly instead of returning bad data.

use s3_wal::{envelope, MemoryStore, ObjectStore, Wal, WalError};

/// Helper: log with `count` records appended
fn populated(count: u64) -> Wal<MemoryStore> {
    let wal = Wal::new(MemoryStore::new(), "wal").unwrap();
    for i in 1..=count {
        wal.append(format!("record {}", i).as_bytes()).unwrap();
    }
    wal
}

/// Helper: flip one bit of the stored object at `offset`
fn flip_bit(wal: &Wal<MemoryStore>, offset: u64, index: usize) {
    let key = wal.key(offset);
    let mut bytes = wal.store().remove(&key).unwrap();
    bytes[index] ^= 0x80;
    wal.store().insert_raw(key, bytes);
}

#[test]
fn test_flipped_offset_field() {
    let wal = populated(3);
    flip_bit(&wal, 2, 0);
    assert!(matches!(wal.read(2), Err(WalError::Corrupt { offset: 2 })));

    // Neighbours unaffected
    assert!(wal.read(1).is_ok());
    assert!(wal.read(3).is_ok());
}

#[test]
fn test_flipped_payload() {
    let wal = populated(1);
    flip_bit(&wal, 1, envelope::OFFSET_LEN + 2);
    assert!(matches!(wal.read(1), Err(WalError::Corrupt { offset: 1 })));
}

#[test]
fn test_flipped_checksum() {
    let wal = populated(1);
    let stored_len = envelope::encoded_len("record 1".len());
    flip_bit(&wal, 1, stored_len - 1);
    assert!(matches!(wal.read(1), Err(WalError::Corrupt { offset: 1 })));
}

#[test]
fn test_truncated_object_is_malformed() {
    let wal = populated(1);
    wal.store().insert_raw(wal.key(2), vec![0xAB; 39]);
    wal.store().insert_raw(wal.key(3), Vec::new());

    assert!(matches!(
        wal.read(2),
        Err(WalError::Malformed { offset: 2, len: 39 })
    ));
    assert!(matches!(
        wal.read(3),
        Err(WalError::Malformed { offset: 3, len: 0 })
    ));
}

#[test]
fn test_truncated_tail_is_corrupt() {
    let wal = populated(1);
    let key = wal.key(1);
    let mut bytes = wal.store().remove(&key).unwrap();
    bytes.truncate(bytes.len() - 1);
    wal.store().insert_raw(key, bytes);

    assert!(matches!(wal.read(1), Err(WalError::Corrupt { offset: 1 })));
}

#[test]
fn test_swapped_envelope_is_offset_mismatch() {
    let wal = populated(7);
    let seven = wal.store().get(&wal.key(7)).unwrap().unwrap();
    wal.store().remove(&wal.key(3));
    wal.store().insert_raw(wal.key(3), seven);

    assert!(matches!(
        wal.read(3),
        Err(WalError::OffsetMismatch {
            expected: 3,
            found: 7
        })
    ));
}

#[test]
fn test_corruption_is_not_not_found() {
    let wal = populated(2);
    flip_bit(&wal, 1, 10);

    let corrupt = wal.read(1).unwrap_err();
    let missing = wal.read(3).unwrap_err();

    assert!(matches!(corrupt, WalError::Corrupt { .. }));
    assert!(matches!(missing, WalError::NotFound(3)));
    assert!(!corrupt.is_retryable());
    assert!(!missing.is_retryable());
}

#[test]
fn test_corrupt_record_blocks_append_at_its_offset() {
    let wal = Wal::new(MemoryStore::new(), "wal").unwrap();
    wal.store().insert_raw(wal.key(1), b"garbage that is not an envelope at all!!".to_vec());

    // The damaged object still occupies the key; the log never overwrites it
    assert!(matches!(wal.append(b"x"), Err(WalError::Conflict(1))));
    assert!(matches!(wal.read(1), Err(WalError::Corrupt { offset: 1 })));
    assert!(matches!(
        wal.confirm_append(1, b"x"),
        Err(WalError::Corrupt { offset: 1 })
    ));
}

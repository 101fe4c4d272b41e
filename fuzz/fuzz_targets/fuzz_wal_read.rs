#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use s3_wal::{MemoryStore, Wal, WalError};

#[derive(Arbitrary, Debug)]
struct Input {
    offset: u64,
    planted_at: u64,
    blob: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let wal = match Wal::new(MemoryStore::new(), "fuzz") {
        Ok(w) => w,
        Err(_) => return,
    };
    wal.store().insert_raw(wal.key(input.planted_at), input.blob);

    // A planted blob is only ever returned if it is a valid envelope for the requested offset
    match wal.read(input.offset) {
        Ok(record) => assert_eq!(record.offset, input.offset),
        Err(WalError::NotFound(o)) => assert_ne!(o, input.planted_at),
        Err(_) => {}
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;
use s3_wal::envelope;

fuzz_target!(|data: &[u8]| {
    // Arbitrary blobs must be rejected or decoded, never panic
    if let Ok(env) = envelope::decode(data) {
        assert_eq!(envelope::encode(env.offset(), env.payload()), data);
    }
});

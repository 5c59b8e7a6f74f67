#![no_main]

use imsframe::prelude::*;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must end in a result or an error, never a panic
    let source = JsonLinesScanSource::new("fuzz.jsonl", Cursor::new(data));
    if let Ok(ImportOutcome::Completed(file)) =
        RawFileBuilder::new(MemoryStorage::new()).build(source, MobilityType::Tims)
    {
        for frame in file.frames() {
            assert_eq!(frame.storage_offsets().len(), frame.bucket_count());
            for bucket in 0..frame.bucket_count() {
                let _ = frame.mobility_scan(bucket, file.storage());
            }
        }
    }
});

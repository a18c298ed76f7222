//! Fuzz target for TarIndex::scan with arbitrary byte input.
//!
//! This target exercises header parsing, numeric field decoding and the
//! GNU/PAX extension handling with malformed or adversarial input, looking
//! for panics, hangs or runaway allocations.
//!
//! Run with: cargo +nightly fuzz run tar_index

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use iconpack::tar::TarIndex;

fuzz_target!(|data: &[u8]| {
    let Ok(index) = TarIndex::scan(&mut Cursor::new(data)) else {
        return;
    };

    // Every indexed member must lie inside the scanned region.
    for entry in index.entries() {
        assert!(entry.offset <= entry.header_offset);
        assert!(entry.end() <= index.end_offset());
    }
    assert!(index.end_offset() <= index.stream_len());
});

//! Fuzz target for DSSE envelope and in-toto statement decoding.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_envelope
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = chainguard_repo::fuzz::parse_envelope(text);
    }
});

//! Fuzz target for `chainguard.lock` parsing.
//!
//! Goal: the parser should **never panic** on any input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_lock_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = chainguard_repo::fuzz::parse_lock_manifest(text);
    }
});

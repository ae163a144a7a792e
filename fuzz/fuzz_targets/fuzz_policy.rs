//! Fuzz target for policy loading: TOML parse, validation and key decoding.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_policy
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = chainguard_settings::load_policy_str(text, Default::default());
    }
});

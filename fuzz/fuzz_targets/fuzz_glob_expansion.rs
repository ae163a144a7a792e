//! Fuzz target for attestation discovery glob matching.
//!
//! Goal: matching should **never panic**; invalid patterns are errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_glob_expansion
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct GlobInput {
    /// Discovery patterns (e.g. "attestations/**/*.intoto.json")
    patterns: Vec<String>,
    /// Repo-relative candidate paths
    candidates: Vec<String>,
}

fuzz_target!(|input: GlobInput| {
    if input.patterns.len() > 20 || input.candidates.len() > 100 {
        return;
    }
    let patterns: Vec<String> = input.patterns.into_iter().filter(|p| p.len() <= 256).collect();
    let candidates: Vec<String> = input
        .candidates
        .into_iter()
        .filter(|c| c.len() <= 512)
        .collect();

    let _ = chainguard_repo::fuzz::expand_globs(&patterns, &candidates);
});

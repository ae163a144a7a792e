//! Pure trust evaluation (no IO).
//!
//! Input: a policy and an artifact graph constructed elsewhere.
//! Output: per-artifact verdicts + overall decision + summary counts.

#![forbid(unsafe_code)]

pub mod attestation;
pub mod chain;
pub mod model;
pub mod policy;
pub mod report;
pub mod run;
pub mod verify;

mod engine;
mod fingerprint;

pub use engine::{effective_workers, evaluate};
pub use fingerprint::fingerprint_for_verdict;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

//! Repository adapters: read the scope manifest, attestation files and artifact contents.
//!
//! This crate is allowed to do filesystem IO. It does not verify anything; the
//! graph it returns goes to the domain engine untouched.

#![forbid(unsafe_code)]

mod discover;
mod error;
mod lock;
mod resolve;

pub use discover::discover_attestation_files;
pub use error::ResolutionError;
pub use lock::{LockArtifact, LockFile, parse_lock};
pub use resolve::{ResolveOptions, resolve_artifacts};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use super::*;
    use chainguard_types::{DsseEnvelope, RepoPath};

    /// Parse arbitrary text as a `chainguard.lock` manifest.
    ///
    /// **Never panics** on any input.
    pub fn parse_lock_manifest(text: &str) -> Result<(), ResolutionError> {
        let path = RepoPath::new("chainguard.lock");
        let _ = lock::parse_lock(&path, text)?;
        Ok(())
    }

    /// Parse arbitrary text as a DSSE envelope and decode its statement.
    ///
    /// **Never panics** on any input.
    pub fn parse_envelope(text: &str) -> Result<(), String> {
        let env = DsseEnvelope::parse_json(text).map_err(|e| e.to_string())?;
        let _ = env.decode_statement()?;
        Ok(())
    }

    /// Match discovery globs against candidate paths without touching the filesystem.
    ///
    /// **Never panics** on any input.
    pub fn expand_globs(
        patterns: &[String],
        candidates: &[String],
    ) -> Result<Vec<String>, ResolutionError> {
        let set = discover::build_globset(patterns)?;
        Ok(candidates
            .iter()
            .filter(|c| set.is_match(c.as_str()))
            .cloned()
            .collect())
    }
}

use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for an artifact verdict.
///
/// Identity fields, joined with `|`:
/// - reason code (or the status when there is none)
/// - artifact digest (empty for digest-less placeholders)
/// - `name@version` label
pub fn fingerprint_for_verdict(code: &str, digest: Option<&str>, label: &str) -> String {
    let canonical = [code, digest.unwrap_or(""), label].join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

//! Stable reason codes.
//!
//! Codes are short kebab-case discriminators attached to verdicts and to
//! individual attestation outcomes. They are part of the report contract.

// Codes: own verification
pub const CODE_MISSING_ATTESTATION: &str = "missing-attestation";
pub const CODE_INVALID_SIGNATURE: &str = "invalid-signature";
pub const CODE_UNTRUSTED_SIGNER: &str = "untrusted-signer";
pub const CODE_SUBJECT_MISMATCH: &str = "subject-mismatch";
pub const CODE_MALFORMED_ATTESTATION: &str = "malformed-attestation";
pub const CODE_UNSUPPORTED_ATTESTATION: &str = "unsupported-attestation";
pub const CODE_INVALID_PREDICATE: &str = "invalid-predicate";
pub const CODE_DISALLOWED_ORIGIN: &str = "disallowed-origin";
pub const CODE_DIGEST_MISMATCH: &str = "digest-mismatch";

// Codes: chain evaluation
pub const CODE_UNRESOLVED_DEPENDENCY: &str = "unresolved-dependency";
pub const CODE_UNTRUSTED_DEPENDENCY: &str = "untrusted-dependency";
pub const CODE_CYCLIC_DEPENDENCY: &str = "cyclic-dependency";

// Attestation kinds (policy and report spelling)
pub const KIND_PROVENANCE: &str = "provenance";
pub const KIND_SBOM: &str = "sbom";
pub const KIND_VULN_SCAN: &str = "vuln-scan";
pub const KIND_TEST_RESULT: &str = "test-result";

/// Payload type accepted inside DSSE envelopes.
pub const PAYLOAD_TYPE_IN_TOTO: &str = "application/vnd.in-toto+json";

/// Schema identifiers for the user-facing input files.
pub const SCHEMA_POLICY_V1: &str = "chainguard.policy.v1";
pub const SCHEMA_LOCK_V1: &str = "chainguard.lock.v1";

/// Missing or malformed trust configuration. Always fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read policy {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse policy TOML")]
    Parse(#[from] toml::de::Error),
    #[error("unsupported policy schema '{0}' (expected chainguard.policy.v1)")]
    UnsupportedSchema(String),
    #[error("unknown profile '{0}' (expected strict or lenient)")]
    UnknownProfile(String),
    #[error("policy defines no trusted signers")]
    NoSigners,
    #[error("signer #{0} has an empty id")]
    EmptySignerId(usize),
    #[error("signer '{0}' is defined more than once")]
    DuplicateSigner(String),
    #[error("invalid public key for signer '{id}': {reason}")]
    InvalidKey { id: String, reason: String },
    #[error("invalid glob in {field}: {pattern}")]
    InvalidGlob {
        field: &'static str,
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("unknown attestation kind '{0}' (expected provenance, sbom, vuln-scan or test-result)")]
    UnknownKind(String),
}

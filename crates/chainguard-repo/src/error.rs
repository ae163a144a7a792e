use chainguard_domain::run::TimeoutError;
use chainguard_types::DigestError;

/// An artifact or file in scope could not be located. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("failed to read manifest {path}")]
    ManifestRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {message}")]
    ManifestParse { path: String, message: String },
    #[error("artifact {artifact} has an invalid digest")]
    InvalidDigest {
        artifact: String,
        #[source]
        source: DigestError,
    },
    #[error("artifact {artifact} is declared twice with different digests")]
    DuplicateArtifact { artifact: String },
    #[error("{artifact} references unknown artifact '{reference}'")]
    UnknownReference { artifact: String, reference: String },
    #[error("{path} (referenced by {artifact}) does not exist")]
    MissingFile { artifact: String, path: String },
    #[error("{path} is outside the repository root")]
    OutsideRoot { path: String },
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid attestation discovery glob: {pattern}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

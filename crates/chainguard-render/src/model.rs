use chainguard_types::{AttestationStatus, TrustStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableLocation {
    pub path: String,
    pub line: Option<u32>,
    pub col: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableAttestation {
    pub source: String,
    pub kind: Option<String>,
    pub signer: Option<String>,
    pub status: AttestationStatus,
    pub code: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableVerdict {
    /// `name@version`.
    pub label: String,
    pub digest: Option<String>,
    pub status: TrustStatus,
    pub code: Option<String>,
    pub message: String,
    pub location: Option<RenderableLocation>,
    pub untrusted_dependencies: Vec<String>,
    pub attestations: Vec<RenderableAttestation>,
    /// One-line remediation hint for `code`, when the explain registry has one.
    pub help: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableData {
    pub profile: String,
    pub manifest: String,
    pub artifacts_scanned: u32,
    pub attestations_scanned: u32,
    pub attestations_valid: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub decision: TrustStatus,
    pub failing: Vec<String>,
    pub verdicts: Vec<RenderableVerdict>,
    pub data: RenderableData,
}

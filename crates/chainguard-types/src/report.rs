use crate::{Digest, RepoPath};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stable schema identifier for chainguard reports.
pub const SCHEMA_REPORT_V1: &str = "chainguard.report.v1";

/// Trust state of a single artifact, or of the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrustStatus {
    Trusted,
    Untrusted,
    Unknown,
}

impl TrustStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TrustStatus::Trusted => "trusted",
            TrustStatus::Untrusted => "untrusted",
            TrustStatus::Unknown => "unknown",
        }
    }
}

/// Outcome of one attestation check (or of a required kind with no attestation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttestationStatus {
    Valid,
    Invalid,
    Absent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    pub path: RepoPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactRef {
    pub name: String,
    pub version: String,
    /// Absent only for unresolved placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
}

impl ArtifactRef {
    /// `name@version` label used in messages and the failing list; the bare
    /// name when the version is empty.
    pub fn label(&self) -> String {
        if self.version.is_empty() {
            return self.name.clone();
        }
        format!("{}@{}", self.name, self.version)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttestationOutcome {
    /// Repo-relative file the envelope came from (`-` for absent outcomes).
    pub source: RepoPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    pub status: AttestationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// Verdict for one artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VerdictEntry {
    pub artifact: ArtifactRef,
    pub status: TrustStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Direct dependencies as `name@version` labels, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Direct dependencies that are not trusted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub untrusted_dependencies: Vec<String>,
    #[serde(default)]
    pub attestations: Vec<AttestationOutcome>,
    /// Stable identifier for dedup and trending: hash of code + digest + label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusCounts {
    pub trusted: u32,
    pub untrusted: u32,
    pub unknown: u32,
}

/// Overall run decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Decision {
    /// `trusted` or `untrusted`; never `unknown`.
    pub status: TrustStatus,
    /// Labels of artifacts that are not trusted, in ascending digest order.
    #[serde(default)]
    pub failing: Vec<String>,
    pub counts: StatusCounts,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunMeta {
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "Option<String>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Chainguard-specific summary payload for the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ChainguardData {
    pub profile: String,
    pub manifest: RepoPath,
    pub artifacts_scanned: u32,
    pub attestations_scanned: u32,
    pub attestations_valid: u32,
    pub workers: u32,
}

/// Report envelope.
///
/// Generic over the tool-specific data block so the outer shape stays stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportEnvelope<TData = ChainguardData> {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    pub run: RunMeta,
    pub decision: Decision,
    pub verdicts: Vec<VerdictEntry>,
    pub data: TData,
}

pub type ChainguardReport = ReportEnvelope<ChainguardData>;

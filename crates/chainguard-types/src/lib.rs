//! Stable DTOs and IDs used across the chainguard workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted report
//! - stable reason codes
//! - content digests and repo-relative paths
//! - DSSE / in-toto wire types for attestations
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod digest;
pub mod dsse;
pub mod explain;
pub mod ids;
pub mod path;
pub mod report;

pub use digest::{Digest, DigestError};
pub use dsse::{DsseEnvelope, DsseSignature, InTotoStatement, ResourceDescriptor};
pub use explain::{lookup_explanation, ExamplePair, Explanation};
pub use path::RepoPath;
pub use report::{
    ArtifactRef, AttestationOutcome, AttestationStatus, ChainguardData, ChainguardReport,
    Decision, Location, ReportEnvelope, RunMeta, StatusCounts, ToolMeta, TrustStatus,
    VerdictEntry, SCHEMA_REPORT_V1,
};

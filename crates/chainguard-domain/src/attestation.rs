//! Attestation kinds and their predicate rules.
//!
//! The set of kinds is closed. A predicate type that does not map to one of
//! them is rejected as unsupported, never accepted unverified.

use crate::policy::Policy;
use chainguard_types::ids;
use serde_json::Value as JsonValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttestationKind {
    Provenance,
    Sbom,
    VulnScan,
    TestResult,
}

/// Statement `_type` values accepted for verification.
pub const ACCEPTED_STATEMENT_TYPES: &[&str] = &[
    chainguard_types::dsse::IN_TOTO_STATEMENT_V1,
    "https://in-toto.io/Statement/v0.1",
];

impl AttestationKind {
    pub const ALL: [AttestationKind; 4] = [
        AttestationKind::Provenance,
        AttestationKind::Sbom,
        AttestationKind::VulnScan,
        AttestationKind::TestResult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttestationKind::Provenance => ids::KIND_PROVENANCE,
            AttestationKind::Sbom => ids::KIND_SBOM,
            AttestationKind::VulnScan => ids::KIND_VULN_SCAN,
            AttestationKind::TestResult => ids::KIND_TEST_RESULT,
        }
    }

    /// Parse the spelling used in policy files.
    pub fn from_config_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn from_predicate_type(predicate_type: &str) -> Option<Self> {
        let p = predicate_type;
        if p.starts_with("https://slsa.dev/provenance/") {
            Some(AttestationKind::Provenance)
        } else if p.starts_with("https://spdx.dev/Document") || p.starts_with("https://cyclonedx.org/bom") {
            Some(AttestationKind::Sbom)
        } else if p.starts_with("https://in-toto.io/attestation/vulns") {
            Some(AttestationKind::VulnScan)
        } else if p.starts_with("https://in-toto.io/attestation/test-result") {
            Some(AttestationKind::TestResult)
        } else {
            None
        }
    }
}

/// Typed view of the predicate fields each kind is checked on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    Provenance { builder_id: String },
    Sbom,
    VulnScan { scanner_uri: String },
    TestResult { result: String },
}

impl Predicate {
    /// Extract the fields for `kind`. Missing required fields are an error.
    pub fn parse(kind: AttestationKind, predicate: &JsonValue) -> Result<Self, String> {
        match kind {
            AttestationKind::Provenance => {
                let builder = predicate
                    .pointer("/runDetails/builder/id")
                    .or_else(|| predicate.pointer("/builder/id"))
                    .and_then(JsonValue::as_str)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| "provenance predicate has no builder id".to_string())?;
                Ok(Predicate::Provenance {
                    builder_id: builder.to_string(),
                })
            }
            AttestationKind::Sbom => {
                if predicate.is_object() {
                    Ok(Predicate::Sbom)
                } else {
                    Err("sbom predicate is not a JSON object".to_string())
                }
            }
            AttestationKind::VulnScan => predicate
                .pointer("/scanner/uri")
                .and_then(JsonValue::as_str)
                .filter(|s| !s.is_empty())
                .map(|uri| Predicate::VulnScan {
                    scanner_uri: uri.to_string(),
                })
                .ok_or_else(|| "vulnerability scan predicate has no scanner.uri".to_string()),
            AttestationKind::TestResult => predicate
                .get("result")
                .and_then(JsonValue::as_str)
                .map(|r| Predicate::TestResult {
                    result: r.to_string(),
                })
                .ok_or_else(|| "test result predicate has no result".to_string()),
        }
    }

    /// Apply the policy rules for this kind.
    pub fn check(&self, policy: &Policy) -> Result<(), String> {
        match self {
            Predicate::Provenance { builder_id } => {
                if policy.allowed_builders.matches(builder_id) {
                    Ok(())
                } else {
                    Err(format!("builder '{builder_id}' is not in allowed_builders"))
                }
            }
            Predicate::Sbom | Predicate::VulnScan { .. } => Ok(()),
            Predicate::TestResult { result } => {
                if result == "PASSED" {
                    Ok(())
                } else {
                    Err(format!("test result is '{result}', expected 'PASSED'"))
                }
            }
        }
    }
}

//! Attestation verification for a single artifact.
//!
//! Checks run in a fixed order and stop at the first failure: envelope shape,
//! payload type, signer membership, signature, statement decode, subject
//! binding, kind, predicate. Nothing in the payload is interpreted until a
//! trusted signature over it has verified.

use crate::attestation::{ACCEPTED_STATEMENT_TYPES, AttestationKind, Predicate};
use crate::model::{Artifact, Attestation, AttestationBody};
use crate::policy::Policy;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chainguard_types::dsse::pae;
use chainguard_types::ids;
use chainguard_types::{
    AttestationOutcome, AttestationStatus, DsseEnvelope, InTotoStatement, RepoPath, TrustStatus,
};
use ed25519_dalek::Signature;

/// A signature or attestation failure. Recorded in the verdict, never fatal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct VerificationError {
    pub code: &'static str,
    pub message: String,
}

impl VerificationError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result of checking one attestation. `kind` and `signer` are filled in as
/// far as verification got.
#[derive(Clone, Debug)]
pub struct AttestationCheck {
    pub source: RepoPath,
    pub kind: Option<AttestationKind>,
    pub signer: Option<String>,
    pub result: Result<(), VerificationError>,
}

impl AttestationCheck {
    pub fn is_valid(&self) -> bool {
        self.result.is_ok()
    }

    fn to_outcome(&self) -> AttestationOutcome {
        let (status, code, message) = match &self.result {
            Ok(()) => (AttestationStatus::Valid, None, "verified".to_string()),
            Err(e) => (
                AttestationStatus::Invalid,
                Some(e.code.to_string()),
                e.message.clone(),
            ),
        };
        AttestationOutcome {
            source: self.source.clone(),
            kind: self.kind.map(|k| k.as_str().to_string()),
            signer: self.signer.clone(),
            status,
            code,
            message,
        }
    }
}

/// An artifact's verdict from its own evidence, before dependencies are considered.
#[derive(Clone, Debug)]
pub struct OwnVerdict {
    pub status: TrustStatus,
    pub code: Option<&'static str>,
    pub message: String,
    pub attestations: Vec<AttestationOutcome>,
    pub valid_count: usize,
}

pub struct AttestationVerifier<'p> {
    policy: &'p Policy,
}

impl<'p> AttestationVerifier<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    pub fn verify_artifact(&self, artifact: &Artifact) -> OwnVerdict {
        if let crate::model::Resolution::Unresolved { reference } = &artifact.resolution {
            return OwnVerdict {
                status: TrustStatus::Unknown,
                code: Some(ids::CODE_UNRESOLVED_DEPENDENCY),
                message: format!("dependency '{reference}' could not be resolved"),
                attestations: Vec::new(),
                valid_count: 0,
            };
        }

        let checks: Vec<AttestationCheck> = artifact
            .attestations
            .iter()
            .map(|a| self.verify_attestation(artifact, a))
            .collect();
        let valid_count = checks.iter().filter(|c| c.is_valid()).count();
        let mut outcomes: Vec<AttestationOutcome> = checks.iter().map(|c| c.to_outcome()).collect();

        tracing::trace!(
            artifact = %artifact.label(),
            attestations = checks.len(),
            valid = valid_count,
            "verified attestations"
        );

        let untrusted = |code: &'static str, message: String, outcomes: Vec<AttestationOutcome>| {
            OwnVerdict {
                status: TrustStatus::Untrusted,
                code: Some(code),
                message,
                attestations: outcomes,
                valid_count,
            }
        };

        if let (Some(declared), Some(observed)) = (&artifact.digest, &artifact.observed_digest)
            && declared != observed
        {
            return untrusted(
                ids::CODE_DIGEST_MISMATCH,
                format!("content digest {observed} does not match declared {declared}"),
                outcomes,
            );
        }

        if !self.policy.origin_allowed(artifact.origin.as_deref()) {
            let message = match &artifact.origin {
                Some(o) => format!("origin '{o}' is not in allowed_origins"),
                None => "artifact declares no origin but allowed_origins is set".to_string(),
            };
            return untrusted(ids::CODE_DISALLOWED_ORIGIN, message, outcomes);
        }

        if self.policy.required_kinds.is_empty() {
            if valid_count > 0 {
                return self.trusted(&checks, outcomes, valid_count);
            }
            return match checks.iter().find(|c| !c.is_valid()) {
                Some(first) => {
                    let err = first.result.as_ref().err();
                    let code = err.map(|e| e.code).unwrap_or(ids::CODE_MISSING_ATTESTATION);
                    untrusted(code, format!("no valid attestation ({code})"), outcomes)
                }
                None => {
                    outcomes.push(absent(None));
                    untrusted(
                        ids::CODE_MISSING_ATTESTATION,
                        "artifact has no attestations".to_string(),
                        outcomes,
                    )
                }
            };
        }

        let mut first_failure: Option<&'static str> = None;
        let mut unmet: Vec<&'static str> = Vec::new();
        for kind in &self.policy.required_kinds {
            if checks.iter().any(|c| c.is_valid() && c.kind == Some(*kind)) {
                continue;
            }
            unmet.push(kind.as_str());
            let candidate = checks
                .iter()
                .find(|c| !c.is_valid() && c.kind == Some(*kind))
                .or_else(|| checks.iter().find(|c| !c.is_valid() && c.kind.is_none()));
            let code = match candidate.and_then(|c| c.result.as_ref().err()) {
                Some(err) => err.code,
                None => {
                    outcomes.push(absent(Some(*kind)));
                    ids::CODE_MISSING_ATTESTATION
                }
            };
            first_failure.get_or_insert(code);
        }

        match first_failure {
            None => self.trusted(&checks, outcomes, valid_count),
            Some(code) => untrusted(
                code,
                format!("required attestation(s) not satisfied: {}", unmet.join(", ")),
                outcomes,
            ),
        }
    }

    fn trusted(
        &self,
        checks: &[AttestationCheck],
        outcomes: Vec<AttestationOutcome>,
        valid_count: usize,
    ) -> OwnVerdict {
        let mut kinds: Vec<&str> = checks
            .iter()
            .filter(|c| c.is_valid())
            .filter_map(|c| c.kind.map(AttestationKind::as_str))
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        OwnVerdict {
            status: TrustStatus::Trusted,
            code: None,
            message: format!("verified: {}", kinds.join(", ")),
            attestations: outcomes,
            valid_count,
        }
    }

    pub fn verify_attestation(&self, artifact: &Artifact, att: &Attestation) -> AttestationCheck {
        let mut check = AttestationCheck {
            source: att.source.clone(),
            kind: None,
            signer: None,
            result: Ok(()),
        };
        let envelope = match &att.body {
            AttestationBody::Envelope(env) => env,
            AttestationBody::Malformed(reason) => {
                check.result = Err(VerificationError::new(
                    ids::CODE_MALFORMED_ATTESTATION,
                    format!("not a DSSE envelope: {reason}"),
                ));
                return check;
            }
        };
        check.result = self.verify_envelope(artifact, envelope, &mut check);
        check
    }

    fn verify_envelope(
        &self,
        artifact: &Artifact,
        envelope: &DsseEnvelope,
        check: &mut AttestationCheck,
    ) -> Result<(), VerificationError> {
        if envelope.payload_type != ids::PAYLOAD_TYPE_IN_TOTO {
            return Err(VerificationError::new(
                ids::CODE_UNSUPPORTED_ATTESTATION,
                format!("unsupported payload type '{}'", envelope.payload_type),
            ));
        }

        let trusted: Vec<_> = envelope
            .signatures
            .iter()
            .filter_map(|s| self.policy.signer(&s.keyid).map(|signer| (s, signer)))
            .collect();
        if trusted.is_empty() {
            let message = if envelope.signatures.is_empty() {
                "envelope carries no signatures".to_string()
            } else {
                let names: Vec<&str> = envelope.signatures.iter().map(|s| s.keyid.as_str()).collect();
                format!("no trusted signer among [{}]", names.join(", "))
            };
            return Err(VerificationError::new(ids::CODE_UNTRUSTED_SIGNER, message));
        }

        let body = envelope.payload_bytes().map_err(|e| {
            VerificationError::new(
                ids::CODE_MALFORMED_ATTESTATION,
                format!("payload is not valid base64: {e}"),
            )
        })?;
        let message = pae(&envelope.payload_type, &body);

        let verified = trusted.iter().find(|(sig, signer)| {
            decode_signature(&sig.sig)
                .map(|s| signer.key.verify_strict(&message, &s).is_ok())
                .unwrap_or(false)
        });
        let Some((_, signer)) = verified else {
            check.signer = Some(trusted[0].1.id.clone());
            return Err(VerificationError::new(
                ids::CODE_INVALID_SIGNATURE,
                format!("signature by '{}' does not verify", trusted[0].1.id),
            ));
        };
        check.signer = Some(signer.id.clone());

        let statement: InTotoStatement = serde_json::from_slice(&body).map_err(|e| {
            VerificationError::new(
                ids::CODE_MALFORMED_ATTESTATION,
                format!("payload is not an in-toto statement: {e}"),
            )
        })?;
        if !ACCEPTED_STATEMENT_TYPES.contains(&statement.statement_type.as_str()) {
            return Err(VerificationError::new(
                ids::CODE_UNSUPPORTED_ATTESTATION,
                format!("unsupported statement type '{}'", statement.statement_type),
            ));
        }

        let bound = artifact.digest.as_ref().is_some_and(|d| {
            statement
                .subject
                .iter()
                .filter_map(|s| s.sha256())
                .any(|h| h.eq_ignore_ascii_case(d.hex()))
        });
        if !bound {
            return Err(VerificationError::new(
                ids::CODE_SUBJECT_MISMATCH,
                format!("no statement subject matches {}", artifact.order_key()),
            ));
        }

        let kind = AttestationKind::from_predicate_type(&statement.predicate_type).ok_or_else(|| {
            VerificationError::new(
                ids::CODE_UNSUPPORTED_ATTESTATION,
                format!("unsupported predicate type '{}'", statement.predicate_type),
            )
        })?;
        check.kind = Some(kind);

        Predicate::parse(kind, &statement.predicate)
            .and_then(|p| p.check(self.policy))
            .map_err(|m| VerificationError::new(ids::CODE_INVALID_PREDICATE, m))
    }
}

fn decode_signature(sig: &str) -> Option<Signature> {
    let raw = STANDARD.decode(sig.trim()).ok()?;
    Signature::from_slice(&raw).ok()
}

fn absent(kind: Option<AttestationKind>) -> AttestationOutcome {
    let message = match kind {
        Some(k) => format!("no {} attestation", k.as_str()),
        None => "no attestation".to_string(),
    };
    AttestationOutcome {
        source: RepoPath::new("-"),
        kind: kind.map(|k| k.as_str().to_string()),
        signer: None,
        status: AttestationStatus::Absent,
        code: Some(ids::CODE_MISSING_ATTESTATION.to_string()),
        message,
    }
}

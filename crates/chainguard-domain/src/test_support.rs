use crate::attestation::AttestationKind;
use crate::model::{Artifact, ArtifactGraph, Attestation, AttestationBody};
use crate::policy::{PatternSet, Policy, TrustedSigner};
use crate::verify::OwnVerdict;
use chainguard_test_util::signing::{TEST_BUILDER, TestSigner, provenance_statement};
use chainguard_types::{ArtifactRef, Digest, DsseEnvelope, RepoPath, TrustStatus, VerdictEntry};
use sha2::Digest as _;
use std::collections::{BTreeMap, BTreeSet};

/// Digest of the UTF-8 bytes of `seed`; distinct seeds give distinct digests.
pub fn digest_of(seed: &str) -> Digest {
    Digest::from_sha256_bytes(sha2::Sha256::digest(seed.as_bytes()).as_slice())
}

/// Strict-style policy: provenance required, any builder, any origin.
pub fn policy_with_signers(signers: &[&TestSigner]) -> Policy {
    let signers: BTreeMap<String, TrustedSigner> = signers
        .iter()
        .map(|s| {
            (
                s.id().to_string(),
                TrustedSigner {
                    id: s.id().to_string(),
                    key: s.verifying_key(),
                },
            )
        })
        .collect();
    Policy {
        profile: "test".to_string(),
        signers,
        allowed_origins: PatternSet::default(),
        allowed_builders: PatternSet::default(),
        required_kinds: BTreeSet::from([AttestationKind::Provenance]),
        allow_unresolved: false,
        workers: 2,
    }
}

pub fn envelope_attestation(envelope: DsseEnvelope) -> Attestation {
    Attestation {
        source: RepoPath::new("attestations/test.intoto.json"),
        body: AttestationBody::Envelope(envelope),
    }
}

pub fn signed_provenance(signer: &TestSigner, subject: &Digest) -> Attestation {
    envelope_attestation(signer.sign_statement(&provenance_statement(subject, TEST_BUILDER)))
}

pub fn artifact_with(name: &str, digest: Digest, attestations: Vec<Attestation>) -> Artifact {
    let mut a = Artifact::new(name, "1.0.0", digest);
    a.attestations = attestations;
    a
}

/// `app@1.0` (attested by `signer`) depending on `lib@2.0`, which is attested
/// only when `lib_attested` is set.
pub fn scenario_app_lib(signer: &TestSigner, lib_attested: bool) -> ArtifactGraph {
    let d1 = digest_of("app");
    let d2 = digest_of("lib");
    let mut app = Artifact::new("app", "1.0", d1.clone());
    app.attestations.push(signed_provenance(signer, &d1));
    let mut lib = Artifact::new("lib", "2.0", d2.clone());
    if lib_attested {
        lib.attestations.push(signed_provenance(signer, &d2));
    }

    let mut b = ArtifactGraph::builder();
    let (app_idx, _) = b.insert(app);
    let (lib_idx, _) = b.insert(lib);
    b.add_edge(app_idx, lib_idx);
    b.build()
}

pub fn own_trusted() -> OwnVerdict {
    OwnVerdict {
        status: TrustStatus::Trusted,
        code: None,
        message: "verified: provenance".to_string(),
        attestations: Vec::new(),
        valid_count: 1,
    }
}

pub fn own_untrusted(code: &'static str) -> OwnVerdict {
    OwnVerdict {
        status: TrustStatus::Untrusted,
        code: Some(code),
        message: code.to_string(),
        attestations: Vec::new(),
        valid_count: 0,
    }
}

pub fn verdict(name: &str, status: TrustStatus) -> VerdictEntry {
    VerdictEntry {
        artifact: ArtifactRef {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            digest: Some(digest_of(name)),
        },
        status,
        code: None,
        message: String::new(),
        location: None,
        dependencies: Vec::new(),
        untrusted_dependencies: Vec::new(),
        attestations: Vec::new(),
        fingerprint: None,
    }
}

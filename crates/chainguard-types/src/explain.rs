//! Explain registry for reason codes.
//!
//! Maps reason codes to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for a reason code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the code.
    pub title: &'static str,
    /// What the code means and when it is emitted.
    pub description: &'static str,
    /// How to fix it.
    pub remediation: &'static str,
    /// Before/after configuration examples.
    pub examples: ExamplePair,
}

/// Before and after examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Configuration that produces the code.
    pub before: &'static str,
    /// Configuration that resolves it.
    pub after: &'static str,
}

/// Look up an explanation by reason code.
///
/// Returns `None` if the code is not recognized.
pub fn lookup_explanation(code: &str) -> Option<Explanation> {
    match code {
        ids::CODE_MISSING_ATTESTATION => Some(explain_missing_attestation()),
        ids::CODE_INVALID_SIGNATURE => Some(explain_invalid_signature()),
        ids::CODE_UNTRUSTED_SIGNER => Some(explain_untrusted_signer()),
        ids::CODE_SUBJECT_MISMATCH => Some(explain_subject_mismatch()),
        ids::CODE_MALFORMED_ATTESTATION => Some(explain_malformed_attestation()),
        ids::CODE_UNSUPPORTED_ATTESTATION => Some(explain_unsupported_attestation()),
        ids::CODE_INVALID_PREDICATE => Some(explain_invalid_predicate()),
        ids::CODE_DISALLOWED_ORIGIN => Some(explain_disallowed_origin()),
        ids::CODE_DIGEST_MISMATCH => Some(explain_digest_mismatch()),
        ids::CODE_UNRESOLVED_DEPENDENCY => Some(explain_unresolved_dependency()),
        ids::CODE_UNTRUSTED_DEPENDENCY => Some(explain_untrusted_dependency()),
        ids::CODE_CYCLIC_DEPENDENCY => Some(explain_cyclic_dependency()),
        _ => None,
    }
}

/// List all known reason codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_MISSING_ATTESTATION,
        ids::CODE_INVALID_SIGNATURE,
        ids::CODE_UNTRUSTED_SIGNER,
        ids::CODE_SUBJECT_MISMATCH,
        ids::CODE_MALFORMED_ATTESTATION,
        ids::CODE_UNSUPPORTED_ATTESTATION,
        ids::CODE_INVALID_PREDICATE,
        ids::CODE_DISALLOWED_ORIGIN,
        ids::CODE_DIGEST_MISMATCH,
        ids::CODE_UNRESOLVED_DEPENDENCY,
        ids::CODE_UNTRUSTED_DEPENDENCY,
        ids::CODE_CYCLIC_DEPENDENCY,
    ]
}

fn explain_missing_attestation() -> Explanation {
    Explanation {
        title: "Missing required attestation",
        description: "The policy requires an attestation of this kind, but the artifact has none. \
Chainguard fails closed: an artifact without the required evidence is untrusted, never \
assumed trusted.",
        remediation: "Produce and sign the required attestation (for example SLSA provenance from \
your build system) and reference it from the artifact entry in chainguard.lock, or add a \
discovery glob that picks it up.",
        examples: ExamplePair {
            before: r#"[[artifact]]
name = "lib"
version = "2.0.0"
digest = "sha256:..."
attestations = []"#,
            after: r#"[[artifact]]
name = "lib"
version = "2.0.0"
digest = "sha256:..."
attestations = ["attestations/lib.intoto.json"]"#,
        },
    }
}

fn explain_invalid_signature() -> Explanation {
    Explanation {
        title: "Attestation signature does not verify",
        description: "The envelope names a trusted signer, but the ed25519 signature over the DSSE \
pre-authentication encoding does not verify with that signer's key. The payload was altered \
after signing, or it was signed with a different key.",
        remediation: "Re-sign the attestation with the key registered for the signer, or update the \
signer's public key in chainguard.toml if the key was rotated.",
        examples: ExamplePair {
            before: r#"[[signers]]
id = "ci"
public_key = "<old key>""#,
            after: r#"[[signers]]
id = "ci"
public_key = "<current key>""#,
        },
    }
}

fn explain_untrusted_signer() -> Explanation {
    Explanation {
        title: "Attestation signed by an untrusted identity",
        description: "None of the envelope's signatures come from a signer listed in the policy. \
Signatures are only checked against keys of trusted identities.",
        remediation: "Add the signer to the policy if it is legitimate, or obtain an attestation \
signed by an identity the policy already trusts.",
        examples: ExamplePair {
            before: r#"# policy trusts only "release"
[[signers]]
id = "release"
public_key = "...""#,
            after: r#"[[signers]]
id = "release"
public_key = "..."

[[signers]]
id = "ci"
public_key = "...""#,
        },
    }
}

fn explain_subject_mismatch() -> Explanation {
    Explanation {
        title: "Attestation does not bind to this artifact",
        description: "The statement is validly signed, but none of its subjects carry this \
artifact's sha256 digest. The attestation describes some other artifact.",
        remediation: "Attach the attestation that was produced for this exact artifact, or fix the \
digest declared in chainguard.lock.",
        examples: ExamplePair {
            before: r#"digest = "sha256:aaaa...""#,
            after: r#"digest = "sha256:<digest named in the statement subject>""#,
        },
    }
}

fn explain_malformed_attestation() -> Explanation {
    Explanation {
        title: "Attestation cannot be parsed",
        description: "The attestation file is not a DSSE envelope, or its payload is not a base64 \
encoded in-toto statement.",
        remediation: "Regenerate the attestation with a DSSE-capable signer and check that the \
referenced file is the envelope, not the bare statement.",
        examples: ExamplePair {
            before: r#"{"_type": "https://in-toto.io/Statement/v1", ...}"#,
            after: r#"{"payloadType": "application/vnd.in-toto+json", "payload": "...", "signatures": [...]}"#,
        },
    }
}

fn explain_unsupported_attestation() -> Explanation {
    Explanation {
        title: "Unsupported attestation type",
        description: "The envelope payload type is not in-toto, or the statement's predicateType is \
not one of the kinds chainguard verifies (provenance, sbom, vuln-scan, test-result).",
        remediation: "Use a supported predicate type. Unknown kinds are rejected rather than \
accepted unverified.",
        examples: ExamplePair {
            before: r#""predicateType": "https://example.com/custom/v1""#,
            after: r#""predicateType": "https://slsa.dev/provenance/v1""#,
        },
    }
}

fn explain_invalid_predicate() -> Explanation {
    Explanation {
        title: "Attestation predicate fails its kind's checks",
        description: "The attestation is signed and bound to the artifact, but its predicate does \
not satisfy the rules for its kind: provenance without a builder id or from a builder outside \
allowed_builders, an sbom that is not an object, a vulnerability scan without a scanner, or a \
test result that did not pass.",
        remediation: "Fix the producing tool's output, or widen allowed_builders if the builder is \
legitimate.",
        examples: ExamplePair {
            before: r#"allowed_builders = ["https://github.com/actions/*"]"#,
            after: r#"allowed_builders = ["https://github.com/actions/*", "https://ci.internal/*"]"#,
        },
    }
}

fn explain_disallowed_origin() -> Explanation {
    Explanation {
        title: "Artifact origin is not allowed",
        description: "The policy restricts artifact sources with allowed_origins and this \
artifact's origin matches none of the patterns (or it declares no origin).",
        remediation: "Fetch the artifact from an allowed source, or add its origin to \
allowed_origins after review.",
        examples: ExamplePair {
            before: r#"allowed_origins = ["https://github.com/acme/*"]
# artifact origin = "https://mirror.example.net/lib""#,
            after: r#"allowed_origins = ["https://github.com/acme/*"]
# artifact origin = "https://github.com/acme/lib""#,
        },
    }
}

fn explain_digest_mismatch() -> Explanation {
    Explanation {
        title: "Artifact content does not match its digest",
        description: "The artifact entry points at a local file whose sha256 differs from the \
digest declared in chainguard.lock. Attestations bind to the declared digest, so the file on \
disk is not the attested artifact.",
        remediation: "Rebuild or re-download the artifact, or update the declared digest if the \
artifact legitimately changed (and re-attest it).",
        examples: ExamplePair {
            before: r#"path = "dist/app.tar.gz"
digest = "sha256:<stale digest>""#,
            after: r#"path = "dist/app.tar.gz"
digest = "sha256:<digest of the file>""#,
        },
    }
}

fn explain_unresolved_dependency() -> Explanation {
    Explanation {
        title: "Dependency could not be resolved",
        description: "A dependency reference names an artifact that is not in the manifest. With \
allow_unresolved the run continues: the placeholder is reported as unknown and everything that \
depends on it is untrusted.",
        remediation: "Add the missing artifact to chainguard.lock, or correct the reference.",
        examples: ExamplePair {
            before: r#"dependencies = ["lib@2.0.0"]
# no [[artifact]] entry for lib@2.0.0"#,
            after: r#"[[artifact]]
name = "lib"
version = "2.0.0"
digest = "sha256:...""#,
        },
    }
}

fn explain_untrusted_dependency() -> Explanation {
    Explanation {
        title: "Depends on an untrusted artifact",
        description: "The artifact's own attestations verify, but at least one direct dependency \
is not trusted. Trust is transitive: an artifact is only as trustworthy as what it is built from.",
        remediation: "Fix the dependencies listed in untrusted_dependencies; this artifact becomes \
trusted once they are.",
        examples: ExamplePair {
            before: r#"dependencies = ["lib@2.0.0"]  # lib is untrusted"#,
            after: r#"dependencies = ["lib@2.0.1"]  # attested release"#,
        },
    }
}

fn explain_cyclic_dependency() -> Explanation {
    Explanation {
        title: "Artifact participates in a dependency cycle",
        description: "The artifact is part of a cycle in the dependency graph. Trust cannot be \
established bottom-up through a cycle, so every artifact in it is untrusted.",
        remediation: "Break the cycle in the declared dependencies; artifacts in a supply chain \
should form a directed acyclic graph.",
        examples: ExamplePair {
            before: r#"# a depends on b, b depends on a
dependencies = ["b@1.0.0"]"#,
            after: r#"# b no longer depends on a
dependencies = []"#,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_has_a_complete_explanation() {
        for code in all_codes() {
            let exp = lookup_explanation(code).unwrap_or_else(|| panic!("missing {code}"));
            assert!(!exp.title.is_empty(), "{code} title");
            assert!(!exp.description.is_empty(), "{code} description");
            assert!(!exp.remediation.is_empty(), "{code} remediation");
            assert!(!exp.examples.before.is_empty(), "{code} before");
            assert!(!exp.examples.after.is_empty(), "{code} after");
        }
    }

    #[test]
    fn unknown_code_returns_none() {
        assert!(lookup_explanation("not-a-code").is_none());
    }
}

//! Deterministic ed25519 signers and in-toto statement builders.
//!
//! Keys are derived from a fixed seed byte so fixtures are reproducible
//! without checking private keys into the repository.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chainguard_types::dsse::{IN_TOTO_STATEMENT_V1, pae};
use chainguard_types::ids::PAYLOAD_TYPE_IN_TOTO;
use chainguard_types::{Digest, DsseEnvelope, DsseSignature};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde_json::{Value, json};

pub const SLSA_PROVENANCE_V1: &str = "https://slsa.dev/provenance/v1";
pub const SPDX_DOCUMENT: &str = "https://spdx.dev/Document";
pub const VULNS_V1: &str = "https://in-toto.io/attestation/vulns/v0.1";
pub const TEST_RESULT_V1: &str = "https://in-toto.io/attestation/test-result/v0.1";

/// Builder id accepted by the default test policies.
pub const TEST_BUILDER: &str = "https://github.com/actions/runner";

pub struct TestSigner {
    id: String,
    key: SigningKey,
}

impl TestSigner {
    pub fn from_seed(id: &str, seed: u8) -> Self {
        Self {
            id: id.to_string(),
            key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }

    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.key.verifying_key().to_bytes())
    }

    /// Sign an arbitrary payload under this signer's id.
    pub fn sign_payload(&self, payload_type: &str, body: &[u8]) -> DsseEnvelope {
        let sig = self.key.sign(&pae(payload_type, body));
        DsseEnvelope {
            payload_type: payload_type.to_string(),
            payload: STANDARD.encode(body),
            signatures: vec![DsseSignature {
                keyid: self.id.clone(),
                sig: STANDARD.encode(sig.to_bytes()),
            }],
        }
    }

    pub fn sign_statement(&self, statement: &Value) -> DsseEnvelope {
        let body = serde_json::to_vec(statement).unwrap_or_default();
        self.sign_payload(PAYLOAD_TYPE_IN_TOTO, &body)
    }
}

/// in-toto v1 statement with a single sha256 subject.
pub fn statement(subject: &Digest, predicate_type: &str, predicate: Value) -> Value {
    json!({
        "_type": IN_TOTO_STATEMENT_V1,
        "subject": [{ "name": "artifact", "digest": { "sha256": subject.hex() } }],
        "predicateType": predicate_type,
        "predicate": predicate,
    })
}

/// SLSA v1 provenance statement naming `builder_id`.
pub fn provenance_statement(subject: &Digest, builder_id: &str) -> Value {
    statement(
        subject,
        SLSA_PROVENANCE_V1,
        json!({
            "buildDefinition": { "buildType": "https://example.com/build/v1" },
            "runDetails": { "builder": { "id": builder_id } },
        }),
    )
}

pub fn envelope_json(envelope: &DsseEnvelope) -> String {
    serde_json::to_string_pretty(envelope).unwrap_or_default()
}

//! DSSE envelope and in-toto statement wire types.
//!
//! Only the subset needed for verification is modelled; unknown fields are
//! ignored on input.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Dead Simple Signing Envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseEnvelope {
    pub payload_type: String,
    /// Base64 (standard alphabet) encoded payload.
    pub payload: String,
    #[serde(default)]
    pub signatures: Vec<DsseSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsseSignature {
    /// Signer identity; matched against the policy's trusted signer ids.
    #[serde(default)]
    pub keyid: String,
    /// Base64 encoded signature over the pre-authentication encoding.
    pub sig: String,
}

/// in-toto v1 statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InTotoStatement {
    #[serde(rename = "_type")]
    pub statement_type: String,
    pub subject: Vec<ResourceDescriptor>,
    pub predicate_type: String,
    #[serde(default)]
    pub predicate: JsonValue,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub digest: BTreeMap<String, String>,
}

pub const IN_TOTO_STATEMENT_V1: &str = "https://in-toto.io/Statement/v1";

/// DSSE pre-authentication encoding:
/// `"DSSEv1" SP LEN(type) SP type SP LEN(body) SP body`.
pub fn pae(payload_type: &str, body: &[u8]) -> Vec<u8> {
    let header = format!(
        "DSSEv1 {} {} {} ",
        payload_type.len(),
        payload_type,
        body.len()
    );
    let mut out = Vec::with_capacity(header.len() + body.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(body);
    out
}

impl DsseEnvelope {
    pub fn parse_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decode the base64 payload into raw bytes.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.payload.trim())
    }

    /// Decode the payload as an in-toto statement.
    ///
    /// This does not verify anything; callers that need trust must check the
    /// signatures over [`pae`] first.
    pub fn decode_statement(&self) -> Result<InTotoStatement, String> {
        let bytes = self
            .payload_bytes()
            .map_err(|e| format!("payload is not valid base64: {e}"))?;
        serde_json::from_slice(&bytes).map_err(|e| format!("payload is not an in-toto statement: {e}"))
    }
}

impl ResourceDescriptor {
    pub fn sha256(&self) -> Option<&str> {
        self.digest.get("sha256").map(|s| s.as_str())
    }
}

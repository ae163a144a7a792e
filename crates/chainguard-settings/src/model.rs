use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `chainguard.toml` schema v1.
///
/// User-facing policy model. Unknown keys are ignored so newer files still load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyConfigV1 {
    /// Optional schema string for tooling (`chainguard.policy.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// `strict` (default) or `lenient`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Attestation kinds every artifact must carry. Overrides the profile when set;
    /// an empty list means any one valid attestation suffices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_attestations: Option<Vec<String>>,

    /// Glob patterns for artifact origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Glob patterns for provenance builder ids. Empty allows any builder.
    #[serde(default)]
    pub allowed_builders: Vec<String>,

    /// Treat unlocatable dependencies as unknown placeholders instead of failing the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_unresolved: Option<bool>,

    /// Verification worker count; `0` means one per CPU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u32>,

    /// Trusted signing identities.
    #[serde(default)]
    pub signers: Vec<SignerConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignerConfig {
    /// Identity matched against DSSE signature `keyid`.
    pub id: String,

    /// Ed25519 public key: 32 bytes as 64 hex characters or standard base64.
    pub public_key: String,
}

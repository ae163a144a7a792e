use crate::model::{PolicyConfigV1, SignerConfig};
use crate::{PolicyError, presets};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chainguard_domain::attestation::AttestationKind;
use chainguard_domain::policy::{PatternSet, Policy, TrustedSigner};
use chainguard_types::ids::SCHEMA_POLICY_V1;
use ed25519_dalek::VerifyingKey;
use globset::Glob;
use std::collections::{BTreeMap, BTreeSet};

/// CLI-level overrides. These win over the policy file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub workers: Option<usize>,
}

pub fn resolve_policy(cfg: PolicyConfigV1, overrides: Overrides) -> Result<Policy, PolicyError> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_POLICY_V1
    {
        return Err(PolicyError::UnsupportedSchema(schema.to_string()));
    }

    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "strict".to_string());
    let preset = presets::preset(&profile)?;

    let required_kinds = match &cfg.required_attestations {
        Some(names) => parse_kinds(names)?,
        None => preset.required_kinds,
    };

    let signers = resolve_signers(&cfg.signers)?;

    Ok(Policy {
        profile: preset.profile,
        signers,
        allowed_origins: pattern_set("allowed_origins", &cfg.allowed_origins)?,
        allowed_builders: pattern_set("allowed_builders", &cfg.allowed_builders)?,
        required_kinds,
        allow_unresolved: cfg.allow_unresolved.unwrap_or(preset.allow_unresolved),
        workers: overrides
            .workers
            .or(cfg.workers.map(|w| w as usize))
            .unwrap_or(0),
    })
}

fn parse_kinds(names: &[String]) -> Result<BTreeSet<AttestationKind>, PolicyError> {
    names
        .iter()
        .map(|n| {
            AttestationKind::from_config_name(n).ok_or_else(|| PolicyError::UnknownKind(n.clone()))
        })
        .collect()
}

fn resolve_signers(
    signers: &[SignerConfig],
) -> Result<BTreeMap<String, TrustedSigner>, PolicyError> {
    if signers.is_empty() {
        return Err(PolicyError::NoSigners);
    }
    let mut out = BTreeMap::new();
    for (i, s) in signers.iter().enumerate() {
        let id = s.id.trim();
        if id.is_empty() {
            return Err(PolicyError::EmptySignerId(i + 1));
        }
        if out.contains_key(id) {
            return Err(PolicyError::DuplicateSigner(id.to_string()));
        }
        let key = parse_public_key(&s.public_key).map_err(|reason| PolicyError::InvalidKey {
            id: id.to_string(),
            reason,
        })?;
        out.insert(
            id.to_string(),
            TrustedSigner {
                id: id.to_string(),
                key,
            },
        );
    }
    Ok(out)
}

/// Accepts 64 hex characters or standard base64 of the 32 key bytes.
pub fn parse_public_key(raw: &str) -> Result<VerifyingKey, String> {
    let raw = raw.trim();
    let bytes = if raw.len() == 64 && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        hex::decode(raw).map_err(|e| e.to_string())?
    } else {
        STANDARD
            .decode(raw)
            .map_err(|_| "expected 64 hex characters or base64".to_string())?
    };
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected 32 bytes, got {}", bytes.len()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| "not a valid ed25519 public key".to_string())
}

fn pattern_set(field: &'static str, patterns: &[String]) -> Result<PatternSet, PolicyError> {
    for pattern in patterns {
        Glob::new(pattern).map_err(|source| PolicyError::InvalidGlob {
            field,
            pattern: pattern.clone(),
            source,
        })?;
    }
    PatternSet::new(patterns).map_err(|source| PolicyError::InvalidGlob {
        field,
        pattern: patterns.join(", "),
        source,
    })
}

use crate::PolicyError;
use chainguard_domain::attestation::AttestationKind;
use std::collections::BTreeSet;

/// Profile defaults applied before file settings and overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preset {
    pub profile: String,
    pub required_kinds: BTreeSet<AttestationKind>,
    pub allow_unresolved: bool,
}

pub const PROFILES: &[&str] = &["strict", "lenient"];

pub fn preset(profile: &str) -> Result<Preset, PolicyError> {
    match profile {
        "strict" => Ok(strict_profile()),
        "lenient" => Ok(lenient_profile()),
        other => Err(PolicyError::UnknownProfile(other.to_string())),
    }
}

fn strict_profile() -> Preset {
    Preset {
        profile: "strict".to_string(),
        required_kinds: BTreeSet::from([AttestationKind::Provenance]),
        allow_unresolved: false,
    }
}

fn lenient_profile() -> Preset {
    // Any single valid attestation is enough; missing dependencies become unknown.
    Preset {
        profile: "lenient".to_string(),
        required_kinds: BTreeSet::new(),
        allow_unresolved: true,
    }
}

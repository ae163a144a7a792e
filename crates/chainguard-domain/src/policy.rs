use crate::attestation::AttestationKind;
use ed25519_dalek::VerifyingKey;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::{BTreeMap, BTreeSet};

/// Validated trust policy for one run. Immutable once built.
#[derive(Clone, Debug)]
pub struct Policy {
    pub profile: String,
    /// Trusted identities keyed by signer id.
    pub signers: BTreeMap<String, TrustedSigner>,
    pub allowed_origins: PatternSet,
    pub allowed_builders: PatternSet,
    /// Kinds every artifact must carry a valid attestation for. Empty means
    /// any single valid attestation suffices.
    pub required_kinds: BTreeSet<AttestationKind>,
    pub allow_unresolved: bool,
    /// Worker pool size; `0` means one per CPU.
    pub workers: usize,
}

#[derive(Clone, Debug)]
pub struct TrustedSigner {
    pub id: String,
    pub key: VerifyingKey,
}

/// Glob allow-list. An empty set allows everything.
#[derive(Clone, Debug, Default)]
pub struct PatternSet {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl PatternSet {
    pub fn new(patterns: &[String]) -> Result<Self, globset::Error> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let mut builder = GlobSetBuilder::new();
        for p in patterns {
            builder.add(Glob::new(p)?);
        }
        Ok(Self {
            patterns: patterns.to_vec(),
            set: Some(builder.build()?),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match &self.set {
            None => true,
            Some(set) => set.is_match(candidate),
        }
    }
}

impl Policy {
    pub fn signer(&self, id: &str) -> Option<&TrustedSigner> {
        self.signers.get(id)
    }

    /// `None` origin only passes when no origins are configured.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            Some(o) => self.allowed_origins.matches(o),
            None => self.allowed_origins.is_empty(),
        }
    }
}

//! Policy parsing and profile/preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves policy provided as strings.

#![forbid(unsafe_code)]

mod error;
mod model;
mod presets;
mod resolve;

pub use chainguard_domain::policy::Policy;
pub use error::PolicyError;
pub use model::{PolicyConfigV1, SignerConfig};
pub use presets::PROFILES;
pub use resolve::{Overrides, parse_public_key};

/// Parse `chainguard.toml` (or equivalent) into a typed model.
pub fn parse_policy_toml(input: &str) -> Result<PolicyConfigV1, PolicyError> {
    let cfg: PolicyConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the policy used by the engine (profile + file settings + overrides).
pub fn resolve_policy(cfg: PolicyConfigV1, overrides: Overrides) -> Result<Policy, PolicyError> {
    resolve::resolve_policy(cfg, overrides)
}

/// Parse and resolve in one step.
pub fn load_policy_str(input: &str, overrides: Overrides) -> Result<Policy, PolicyError> {
    resolve_policy(parse_policy_toml(input)?, overrides)
}

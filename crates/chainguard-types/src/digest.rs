use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Content digest in `algorithm:hex` form.
///
/// Only `sha256` is accepted. The hex part is normalized to lowercase so
/// digests compare and sort byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[schemars(with = "String")]
pub struct Digest(String);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    #[error("digest `{0}` is missing the `sha256:` prefix")]
    MissingAlgorithm(String),
    #[error("unsupported digest algorithm `{0}` (expected sha256)")]
    UnsupportedAlgorithm(String),
    #[error("digest `{0}` must be 64 hex characters")]
    InvalidHex(String),
}

impl Digest {
    pub const SHA256_PREFIX: &'static str = "sha256:";

    /// Build a digest from raw SHA-256 output bytes.
    pub fn from_sha256_bytes(bytes: &[u8]) -> Self {
        Self(format!("{}{}", Self::SHA256_PREFIX, hex::encode(bytes)))
    }

    /// Build a digest from a bare hex string (as found in in-toto subject digest maps).
    pub fn from_sha256_hex(hex_str: &str) -> Result<Self, DigestError> {
        let lower = hex_str.to_ascii_lowercase();
        if lower.len() != 64 || !lower.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DigestError::InvalidHex(hex_str.to_string()));
        }
        Ok(Self(format!("{}{}", Self::SHA256_PREFIX, lower)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex part without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.0[Self::SHA256_PREFIX.len()..]
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((algorithm, hex_part)) = s.split_once(':') else {
            return Err(DigestError::MissingAlgorithm(s.to_string()));
        };
        if !algorithm.eq_ignore_ascii_case("sha256") {
            return Err(DigestError::UnsupportedAlgorithm(algorithm.to_string()));
        }
        Self::from_sha256_hex(hex_part).map_err(|_| DigestError::InvalidHex(s.to_string()))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

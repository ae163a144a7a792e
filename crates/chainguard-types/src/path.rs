use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical repo-relative path used for manifests, attestation sources and report locations.
///
/// Normalization rules:
/// - always forward slashes (`/`)
/// - no leading `./`
/// - empty input becomes `.`
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct RepoPath(String);

impl Default for RepoPath {
    fn default() -> Self {
        RepoPath::new(".")
    }
}

impl RepoPath {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        let mut v = s.as_ref().replace('\\', "/");
        while v.starts_with("./") {
            v = v.trim_start_matches("./").to_string();
        }
        if v.is_empty() {
            v = ".".to_string();
        }
        Self(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_utf8_pathbuf(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.0.clone())
    }

    /// Join a path relative to the directory containing `self`.
    ///
    /// `attestations/a.json` referenced from `sub/chainguard.lock` resolves to
    /// `sub/attestations/a.json`.
    pub fn sibling(&self, relative: &str) -> RepoPath {
        let base = Utf8Path::new(self.as_str())
            .parent()
            .unwrap_or_else(|| Utf8Path::new(""));
        RepoPath::new(base.join(relative).as_str())
    }

    /// True when the path leaves the repo root (absolute or `..` components).
    pub fn escapes_root(&self) -> bool {
        let p = Utf8Path::new(self.as_str());
        p.is_absolute()
            || self.0.starts_with('/')
            || p.components()
                .any(|c| matches!(c, camino::Utf8Component::ParentDir))
    }
}

impl From<&Utf8Path> for RepoPath {
    fn from(value: &Utf8Path) -> Self {
        RepoPath::new(value.as_str())
    }
}

impl From<Utf8PathBuf> for RepoPath {
    fn from(value: Utf8PathBuf) -> Self {
        RepoPath::new(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dot_prefix() {
        assert_eq!(RepoPath::new(".\\a\\b.json").as_str(), "a/b.json");
        assert_eq!(RepoPath::new("./././x").as_str(), "x");
        assert_eq!(RepoPath::new("").as_str(), ".");
    }

    #[test]
    fn sibling_resolves_against_parent_dir() {
        let lock = RepoPath::new("sub/chainguard.lock");
        assert_eq!(lock.sibling("att/a.json").as_str(), "sub/att/a.json");
        let root_lock = RepoPath::new("chainguard.lock");
        assert_eq!(root_lock.sibling("att/a.json").as_str(), "att/a.json");
    }

    #[test]
    fn detects_root_escapes() {
        assert!(RepoPath::new("../outside.json").escapes_root());
        assert!(RepoPath::new("/etc/passwd").escapes_root());
        assert!(!RepoPath::new("attestations/a.json").escapes_root());
    }
}

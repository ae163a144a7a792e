use crate::ResolutionError;
use camino::{Utf8Path, Utf8PathBuf};
use chainguard_types::RepoPath;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

/// Directories never searched for attestations.
const SKIP_DIRS: &[&str] = &[".git", "target", "node_modules"];

/// Find attestation files under `repo_root` whose repo-relative path matches any of `globs`.
///
/// Results are sorted so attachment order does not depend on directory iteration order.
pub fn discover_attestation_files(
    repo_root: &Utf8Path,
    globs: &[String],
) -> Result<Vec<RepoPath>, ResolutionError> {
    let set = build_globset(globs)?;

    let mut out: Vec<RepoPath> = WalkDir::new(repo_root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| pathbuf_to_utf8(e.path().to_path_buf()))
        .filter_map(|abs| {
            let rel = abs
                .strip_prefix(repo_root)
                .unwrap_or(&abs)
                .as_str()
                .replace('\\', "/");
            set.is_match(&rel).then(|| RepoPath::new(&rel))
        })
        .collect();

    out.sort();
    out.dedup();
    Ok(out)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| SKIP_DIRS.contains(&n))
}

pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet, ResolutionError> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        let glob = Glob::new(p).map_err(|source| ResolutionError::InvalidGlob {
            pattern: p.clone(),
            source,
        })?;
        b.add(glob);
    }
    b.build().map_err(|source| ResolutionError::InvalidGlob {
        pattern: patterns.join(", "),
        source,
    })
}

fn pathbuf_to_utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    #[test]
    fn matches_relative_paths_and_sorts() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("attestations/b.intoto.json"), "{}");
        write_file(&root.join("attestations/nested/a.intoto.json"), "{}");
        write_file(&root.join("attestations/readme.md"), "");
        write_file(&root.join("other/c.intoto.json"), "{}");

        let found = discover_attestation_files(&root, &["attestations/**/*.json".to_string()])
            .expect("discover");
        let paths: Vec<&str> = found.iter().map(|p| p.as_str()).collect();
        assert_eq!(
            paths,
            vec!["attestations/b.intoto.json", "attestations/nested/a.intoto.json"]
        );
    }

    #[test]
    fn skips_vcs_and_build_dirs() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join(".git/x.json"), "{}");
        write_file(&root.join("target/y.json"), "{}");
        write_file(&root.join("z.json"), "{}");

        let found = discover_attestation_files(&root, &["**/*.json".to_string()]).expect("discover");
        let paths: Vec<&str> = found.iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["z.json"]);
    }

    #[test]
    fn invalid_glob_is_reported() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let err = discover_attestation_files(&root, &["[bad".to_string()]).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidGlob { .. }));
    }
}

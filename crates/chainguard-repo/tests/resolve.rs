use camino::{Utf8Path, Utf8PathBuf};
use chainguard_domain::model::{AttestationBody, Resolution};
use chainguard_domain::run::Deadline;
use chainguard_repo::{ResolutionError, ResolveOptions, resolve_artifacts};
use chainguard_test_util::signing::{TEST_BUILDER, TestSigner, envelope_json, provenance_statement};
use chainguard_types::{Digest, RepoPath};
use std::time::Duration;
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

fn digest(byte: char) -> Digest {
    format!("sha256:{}", byte.to_string().repeat(64))
        .parse()
        .expect("digest")
}

fn resolve(root: &Utf8Path) -> Result<chainguard_domain::model::ArtifactGraph, ResolutionError> {
    resolve_artifacts(root, &RepoPath::new("chainguard.lock"), &ResolveOptions::default())
}

fn write_provenance(root: &Utf8Path, rel: &str, subject: &Digest) {
    let signer = TestSigner::from_seed("S1", 1);
    let env = signer.sign_statement(&provenance_statement(subject, TEST_BUILDER));
    write_file(&root.join(rel), &envelope_json(&env));
}

#[test]
fn builds_graph_with_edges_attestations_and_locations() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let (d1, d2) = (digest('a'), digest('b'));
    write_provenance(&root, "att/app.json", &d1);
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            r#"[[artifact]]
name = "app"
version = "1.0.0"
digest = "{d1}"
dependencies = ["lib@2.0.0"]
attestations = ["att/app.json"]

[[artifact]]
name = "lib"
version = "2.0.0"
digest = "{d2}"
"#
        ),
    );

    let graph = resolve(&root).expect("resolve");
    assert_eq!(graph.len(), 2);
    let app = graph.find_by_label("app@1.0.0").expect("app");
    let lib = graph.find_by_label("lib@2.0.0").expect("lib");
    assert_eq!(graph.dependencies(app), &[lib]);

    let app_artifact = graph.artifact(app);
    assert_eq!(app_artifact.attestations.len(), 1);
    assert_eq!(app_artifact.attestations[0].source.as_str(), "att/app.json");
    assert!(matches!(
        app_artifact.attestations[0].body,
        AttestationBody::Envelope(_)
    ));
    let loc = app_artifact.location.as_ref().expect("location");
    assert_eq!(loc.path.as_str(), "chainguard.lock");
    assert_eq!(loc.line, Some(2));
    assert_eq!(graph.artifact(lib).location.as_ref().and_then(|l| l.line), Some(9));
}

#[test]
fn same_digest_entries_merge_into_one_artifact() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let d = digest('c');
    write_provenance(&root, "att/one.json", &d);
    write_provenance(&root, "att/two.json", &d);
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            r#"[[artifact]]
name = "lib"
version = "2.0.0"
digest = "{d}"
attestations = ["att/one.json"]

[[artifact]]
name = "lib-alias"
version = "2.0.0"
digest = "{d}"
attestations = ["att/two.json", "att/one.json"]
"#
        ),
    );

    let graph = resolve(&root).expect("resolve");
    assert_eq!(graph.len(), 1);
    let only = &graph.artifacts()[0];
    assert_eq!(only.name, "lib");
    assert_eq!(only.attestations.len(), 2);
}

#[test]
fn same_label_with_different_digest_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "[[artifact]]\nname = \"lib\"\nversion = \"1\"\ndigest = \"{}\"\n\n[[artifact]]\nname = \"lib\"\nversion = \"1\"\ndigest = \"{}\"\n",
            digest('1'),
            digest('2')
        ),
    );

    let err = resolve(&root).unwrap_err();
    assert!(matches!(err, ResolutionError::DuplicateArtifact { artifact } if artifact == "lib@1"));
}

#[test]
fn dangling_reference_fails_unless_allowed() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"{}\"\ndependencies = [\"ghost@9\", \"ghost@9\"]\n",
            digest('a')
        ),
    );

    let err = resolve(&root).unwrap_err();
    assert!(matches!(
        err,
        ResolutionError::UnknownReference { ref reference, .. } if reference == "ghost@9"
    ));

    let opts = ResolveOptions {
        allow_unresolved: true,
        deadline: Deadline::none(),
    };
    let graph = resolve_artifacts(&root, &RepoPath::new("chainguard.lock"), &opts).expect("resolve");
    assert_eq!(graph.len(), 2);
    let ghost = graph.find_by_label("ghost@9").expect("placeholder");
    assert_eq!(
        graph.artifact(ghost).resolution,
        Resolution::Unresolved {
            reference: "ghost@9".to_string()
        }
    );
    let app = graph.find_by_label("app@1").expect("app");
    assert_eq!(graph.dependencies(app), &[ghost]);
}

#[test]
fn dependencies_may_reference_digests() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let (d1, d2) = (digest('a'), digest('b'));
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"{d1}\"\ndependencies = [\"{d2}\"]\n\n[[artifact]]\nname = \"lib\"\nversion = \"2\"\ndigest = \"{d2}\"\n"
        ),
    );

    let graph = resolve(&root).expect("resolve");
    let app = graph.find_by_digest(&d1).expect("app");
    let lib = graph.find_by_digest(&d2).expect("lib");
    assert_eq!(graph.dependencies(app), &[lib]);
}

#[test]
fn missing_attestation_file_is_an_error() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"{}\"\nattestations = [\"att/nope.json\"]\n",
            digest('a')
        ),
    );

    let err = resolve(&root).unwrap_err();
    assert!(matches!(err, ResolutionError::MissingFile { ref path, .. } if path == "att/nope.json"));
}

#[test]
fn unparseable_attestation_is_attached_as_malformed() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    write_file(&root.join("att/bad.json"), "this is not json");
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"{}\"\nattestations = [\"att/bad.json\"]\n",
            digest('a')
        ),
    );

    let graph = resolve(&root).expect("resolve");
    assert!(matches!(
        graph.artifacts()[0].attestations[0].body,
        AttestationBody::Malformed(_)
    ));
}

#[test]
fn artifact_content_is_hashed() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    write_file(&root.join("dist/app.bin"), "hello world");
    // sha256("hello world")
    let real = "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"{real}\"\npath = \"dist/app.bin\"\n"
        ),
    );

    let graph = resolve(&root).expect("resolve");
    let a = &graph.artifacts()[0];
    assert_eq!(a.observed_digest.as_ref().map(|d| d.as_str()), Some(real));
    assert_eq!(a.observed_digest, a.digest);
}

#[test]
fn discovery_attaches_by_subject_and_skips_junk() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let (d1, d2) = (digest('a'), digest('b'));
    write_provenance(&root, "attestations/lib.intoto.json", &d2);
    write_file(&root.join("attestations/notes.json"), "{\"hello\": 1}");
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "attestations = [\"attestations/*.json\"]\n\n[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"{d1}\"\n\n[[artifact]]\nname = \"lib\"\nversion = \"2\"\ndigest = \"{d2}\"\n"
        ),
    );

    let graph = resolve(&root).expect("resolve");
    let app = graph.find_by_digest(&d1).expect("app");
    let lib = graph.find_by_digest(&d2).expect("lib");
    assert!(graph.artifact(app).attestations.is_empty());
    let lib_atts = &graph.artifact(lib).attestations;
    assert_eq!(lib_atts.len(), 1);
    assert_eq!(lib_atts[0].source.as_str(), "attestations/lib.intoto.json");
}

#[test]
fn targets_restrict_scope_to_reachable_artifacts() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let (d1, d2, d3) = (digest('a'), digest('b'), digest('c'));
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "targets = [\"app@1\"]\n\n[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"{d1}\"\ndependencies = [\"lib@2\"]\n\n[[artifact]]\nname = \"lib\"\nversion = \"2\"\ndigest = \"{d2}\"\n\n[[artifact]]\nname = \"tool\"\nversion = \"3\"\ndigest = \"{d3}\"\n"
        ),
    );

    let graph = resolve(&root).expect("resolve");
    assert_eq!(graph.len(), 2);
    assert!(graph.find_by_label("tool@3").is_none());
}

#[test]
fn invalid_digest_and_missing_manifest_are_errors() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    assert!(matches!(
        resolve(&root).unwrap_err(),
        ResolutionError::ManifestRead { .. }
    ));

    write_file(
        &root.join("chainguard.lock"),
        "[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"md5:abc\"\n",
    );
    assert!(matches!(
        resolve(&root).unwrap_err(),
        ResolutionError::InvalidDigest { .. }
    ));
}

#[test]
fn paths_outside_the_root_are_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    write_file(
        &root.join("chainguard.lock"),
        &format!(
            "[[artifact]]\nname = \"app\"\nversion = \"1\"\ndigest = \"{}\"\nattestations = [\"../escape.json\"]\n",
            digest('a')
        ),
    );
    assert!(matches!(
        resolve(&root).unwrap_err(),
        ResolutionError::OutsideRoot { .. }
    ));
}

#[test]
fn expired_deadline_is_a_timeout() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    write_file(&root.join("chainguard.lock"), "");
    let opts = ResolveOptions {
        allow_unresolved: false,
        deadline: Deadline::after(Duration::ZERO),
    };
    let err = resolve_artifacts(&root, &RepoPath::new("chainguard.lock"), &opts).unwrap_err();
    assert!(matches!(err, ResolutionError::Timeout(_)));
}

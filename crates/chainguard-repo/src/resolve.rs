use crate::ResolutionError;
use crate::discover::discover_attestation_files;
use crate::lock::{LockArtifact, parse_lock};
use camino::Utf8Path;
use chainguard_domain::model::{
    Artifact, ArtifactGraph, ArtifactIdx, Attestation, AttestationBody, GraphBuilder,
};
use chainguard_domain::run::Deadline;
use chainguard_types::{Digest, DsseEnvelope, Location, RepoPath};
use sha2::Sha256;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default)]
pub struct ResolveOptions {
    /// Insert unknown placeholders for dangling references instead of failing.
    pub allow_unresolved: bool,
    pub deadline: Deadline,
}

/// Build the artifact graph for the run from the scope manifest at `manifest`
/// (repo-relative).
pub fn resolve_artifacts(
    repo_root: &Utf8Path,
    manifest: &RepoPath,
    opts: &ResolveOptions,
) -> Result<ArtifactGraph, ResolutionError> {
    opts.deadline.check("artifact resolution")?;
    let manifest_abs = repo_root.join(manifest.as_str());
    let text = std::fs::read_to_string(&manifest_abs).map_err(|source| {
        ResolutionError::ManifestRead {
            path: manifest.as_str().to_string(),
            source,
        }
    })?;
    let lock = parse_lock(manifest, &text)?;
    tracing::debug!(
        manifest = manifest.as_str(),
        artifacts = lock.artifacts.len(),
        "parsed scope manifest"
    );

    let mut resolver = Resolver {
        repo_root,
        manifest,
        opts,
        builder: ArtifactGraph::builder(),
        labels: BTreeMap::new(),
        placeholders: BTreeMap::new(),
    };

    let mut entries: Vec<(ArtifactIdx, &LockArtifact)> = Vec::with_capacity(lock.artifacts.len());
    for entry in &lock.artifacts {
        let idx = resolver.add_artifact(entry)?;
        entries.push((idx, entry));
    }
    for (idx, entry) in &entries {
        for reference in &entry.dependencies {
            let dep = resolver.lookup_or_placeholder(&entry.label(), reference)?;
            resolver.builder.add_edge(*idx, dep);
        }
    }

    if !lock.attestation_globs.is_empty() {
        resolver.attach_discovered(&lock.attestation_globs)?;
    }

    let roots: Vec<ArtifactIdx> = lock
        .targets
        .iter()
        .map(|t| {
            resolver
                .lookup(t)
                .ok_or_else(|| ResolutionError::UnknownReference {
                    artifact: "targets".to_string(),
                    reference: t.clone(),
                })
        })
        .collect::<Result<_, _>>()?;

    let graph = resolver.builder.build();
    if roots.is_empty() {
        return Ok(graph);
    }
    let scoped = graph.reachable_from(&roots);
    tracing::debug!(
        total = graph.len(),
        in_scope = scoped.len(),
        "restricted scope to targets"
    );
    Ok(scoped)
}

struct Resolver<'a> {
    repo_root: &'a Utf8Path,
    manifest: &'a RepoPath,
    opts: &'a ResolveOptions,
    builder: GraphBuilder,
    labels: BTreeMap<String, ArtifactIdx>,
    placeholders: BTreeMap<String, ArtifactIdx>,
}

impl Resolver<'_> {
    fn add_artifact(&mut self, entry: &LockArtifact) -> Result<ArtifactIdx, ResolutionError> {
        let label = entry.label();
        let digest: Digest =
            entry
                .digest
                .parse()
                .map_err(|source| ResolutionError::InvalidDigest {
                    artifact: label.clone(),
                    source,
                })?;

        if let Some(existing) = self.labels.get(&label)
            && self.builder.lookup_digest(&digest) != Some(*existing)
        {
            return Err(ResolutionError::DuplicateArtifact { artifact: label });
        }

        let mut artifact = Artifact::new(&entry.name, &entry.version, digest);
        artifact.origin = entry.origin.clone();
        artifact.location = Some(Location {
            path: self.manifest.clone(),
            line: entry.line,
            col: None,
        });
        let (idx, fresh) = self.builder.insert(artifact);
        if !fresh {
            tracing::debug!(
                artifact = %label,
                "merged duplicate digest into existing artifact"
            );
            let existing = self.builder.artifact_mut(idx);
            if existing.origin.is_none() {
                existing.origin = entry.origin.clone();
            }
        }
        self.labels.insert(label.clone(), idx);

        if let Some(path) = &entry.path {
            let observed = self.hash_file(&label, path)?;
            let a = self.builder.artifact_mut(idx);
            if a.observed_digest.is_none() {
                a.observed_digest = Some(observed);
            }
        }

        for rel in &entry.attestations {
            let source = self.manifest.sibling(rel);
            let text = self.read_text(&label, &source)?;
            let body = match DsseEnvelope::parse_json(&text) {
                Ok(env) => AttestationBody::Envelope(env),
                Err(e) => AttestationBody::Malformed(e.to_string()),
            };
            self.attach(idx, Attestation { source, body });
        }

        Ok(idx)
    }

    fn lookup(&self, reference: &str) -> Option<ArtifactIdx> {
        if reference.starts_with(Digest::SHA256_PREFIX) {
            let digest: Digest = reference.parse().ok()?;
            return self.builder.lookup_digest(&digest);
        }
        self.labels.get(reference).copied()
    }

    fn lookup_or_placeholder(
        &mut self,
        from: &str,
        reference: &str,
    ) -> Result<ArtifactIdx, ResolutionError> {
        if let Some(idx) = self.lookup(reference) {
            return Ok(idx);
        }
        if !self.opts.allow_unresolved {
            return Err(ResolutionError::UnknownReference {
                artifact: from.to_string(),
                reference: reference.to_string(),
            });
        }
        if let Some(idx) = self.placeholders.get(reference) {
            return Ok(*idx);
        }
        tracing::warn!(
            artifact = from,
            reference,
            "dependency not found; recording unresolved placeholder"
        );
        let (idx, _) = self.builder.insert(Artifact::unresolved(reference));
        self.placeholders.insert(reference.to_string(), idx);
        Ok(idx)
    }

    fn attach_discovered(&mut self, globs: &[String]) -> Result<(), ResolutionError> {
        let files = discover_attestation_files(self.repo_root, globs)?;
        tracing::debug!(files = files.len(), "discovered attestation candidates");

        for source in files {
            self.opts.deadline.check("attestation discovery")?;
            let abs = self.repo_root.join(source.as_str());
            let text = match std::fs::read_to_string(&abs) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = source.as_str(), error = %e, "skipping unreadable attestation");
                    continue;
                }
            };
            let envelope = match DsseEnvelope::parse_json(&text) {
                Ok(env) => env,
                Err(e) => {
                    tracing::warn!(path = source.as_str(), error = %e, "skipping non-DSSE file");
                    continue;
                }
            };
            // Routing only: the statement is not trusted until the verifier checks it.
            let statement = match envelope.decode_statement() {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(path = source.as_str(), error = %e, "skipping undecodable attestation");
                    continue;
                }
            };
            let targets: Vec<ArtifactIdx> = statement
                .subject
                .iter()
                .filter_map(|s| s.sha256())
                .filter_map(|h| Digest::from_sha256_hex(h).ok())
                .filter_map(|d| self.builder.lookup_digest(&d))
                .collect();
            for idx in targets {
                self.attach(
                    idx,
                    Attestation {
                        source: source.clone(),
                        body: AttestationBody::Envelope(envelope.clone()),
                    },
                );
            }
        }
        Ok(())
    }

    fn attach(&mut self, idx: ArtifactIdx, attestation: Attestation) {
        let a = self.builder.artifact_mut(idx);
        if !a.attestations.iter().any(|x| x.source == attestation.source) {
            a.attestations.push(attestation);
        }
    }

    fn read_text(&self, artifact: &str, rel: &RepoPath) -> Result<String, ResolutionError> {
        let bytes = self.read_bytes(artifact, rel)?;
        String::from_utf8(bytes).map_err(|e| ResolutionError::Io {
            path: rel.as_str().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }

    fn read_bytes(&self, artifact: &str, rel: &RepoPath) -> Result<Vec<u8>, ResolutionError> {
        self.opts.deadline.check("artifact resolution")?;
        if rel.escapes_root() {
            return Err(ResolutionError::OutsideRoot {
                path: rel.as_str().to_string(),
            });
        }
        let abs = self.repo_root.join(rel.as_str());
        std::fs::read(&abs).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ResolutionError::MissingFile {
                    artifact: artifact.to_string(),
                    path: rel.as_str().to_string(),
                }
            } else {
                ResolutionError::Io {
                    path: rel.as_str().to_string(),
                    source,
                }
            }
        })
    }

    fn hash_file(&self, artifact: &str, path: &str) -> Result<Digest, ResolutionError> {
        use sha2::Digest as _;
        let rel = self.manifest.sibling(path);
        let bytes = self.read_bytes(artifact, &rel)?;
        Ok(Digest::from_sha256_bytes(Sha256::digest(&bytes).as_slice()))
    }
}

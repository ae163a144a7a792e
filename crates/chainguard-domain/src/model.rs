//! Artifact graph model.
//!
//! The graph is an arena: artifacts live in a `Vec` and edges are index lists,
//! so cycles in the dependency relation never become ownership cycles.

use chainguard_types::{ArtifactRef, Digest, DsseEnvelope, Location, RepoPath};
use std::collections::{BTreeMap, BTreeSet};

/// Position of an artifact in its graph's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactIdx(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    /// Placeholder for a dependency reference that could not be located.
    Unresolved { reference: String },
}

#[derive(Clone, Debug)]
pub struct Artifact {
    pub name: String,
    pub version: String,
    /// Declared content digest. Absent only for unresolved `name@version` placeholders.
    pub digest: Option<Digest>,
    pub origin: Option<String>,
    /// Digest computed from local content, when the manifest points at a file.
    pub observed_digest: Option<Digest>,
    pub location: Option<Location>,
    pub attestations: Vec<Attestation>,
    pub resolution: Resolution,
}

#[derive(Clone, Debug)]
pub struct Attestation {
    pub source: RepoPath,
    pub body: AttestationBody,
}

#[derive(Clone, Debug)]
pub enum AttestationBody {
    Envelope(DsseEnvelope),
    /// The file exists but is not a DSSE envelope; carries the parse error.
    Malformed(String),
}

impl Artifact {
    pub fn new(name: impl Into<String>, version: impl Into<String>, digest: Digest) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            digest: Some(digest),
            origin: None,
            observed_digest: None,
            location: None,
            attestations: Vec::new(),
            resolution: Resolution::Resolved,
        }
    }

    /// Placeholder for a reference that did not match any artifact.
    pub fn unresolved(reference: &str) -> Self {
        let (name, version, digest) = match reference.parse::<Digest>() {
            Ok(d) => (d.to_string(), String::new(), Some(d)),
            Err(_) => match reference.split_once('@') {
                Some((n, v)) => (n.to_string(), v.to_string(), None),
                None => (reference.to_string(), String::new(), None),
            },
        };
        Self {
            name,
            version,
            digest,
            origin: None,
            observed_digest: None,
            location: None,
            attestations: Vec::new(),
            resolution: Resolution::Unresolved {
                reference: reference.to_string(),
            },
        }
    }

    /// `name@version`, or the bare name for version-less placeholders.
    pub fn label(&self) -> String {
        if self.version.is_empty() {
            return self.name.clone();
        }
        format!("{}@{}", self.name, self.version)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution == Resolution::Resolved
    }

    pub fn to_ref(&self) -> ArtifactRef {
        ArtifactRef {
            name: self.name.clone(),
            version: self.version.clone(),
            digest: self.digest.clone(),
        }
    }

    /// Key for report ordering: the digest, with digest-less placeholders last.
    pub fn order_key(&self) -> String {
        match &self.digest {
            Some(d) => d.as_str().to_string(),
            None => format!("~{}", self.label()),
        }
    }
}

/// Read-only artifact graph produced by resolution.
#[derive(Clone, Debug, Default)]
pub struct ArtifactGraph {
    nodes: Vec<Artifact>,
    edges: Vec<Vec<ArtifactIdx>>,
}

impl ArtifactGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn artifact(&self, idx: ArtifactIdx) -> &Artifact {
        &self.nodes[idx.0]
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.nodes
    }

    /// Direct dependencies in declaration order.
    pub fn dependencies(&self, idx: ArtifactIdx) -> &[ArtifactIdx] {
        &self.edges[idx.0]
    }

    pub fn indices(&self) -> impl Iterator<Item = ArtifactIdx> + '_ {
        (0..self.nodes.len()).map(ArtifactIdx)
    }

    pub fn find_by_digest(&self, digest: &Digest) -> Option<ArtifactIdx> {
        self.nodes
            .iter()
            .position(|a| a.digest.as_ref() == Some(digest))
            .map(ArtifactIdx)
    }

    pub fn find_by_label(&self, label: &str) -> Option<ArtifactIdx> {
        self.nodes
            .iter()
            .position(|a| a.label() == label)
            .map(ArtifactIdx)
    }

    /// Sub-graph of everything reachable from `roots` (roots included).
    ///
    /// Relative order of surviving artifacts is preserved.
    pub fn reachable_from(&self, roots: &[ArtifactIdx]) -> ArtifactGraph {
        let mut keep: BTreeSet<usize> = BTreeSet::new();
        let mut pending: Vec<usize> = roots.iter().map(|r| r.0).collect();
        while let Some(i) = pending.pop() {
            if !keep.insert(i) {
                continue;
            }
            pending.extend(self.edges[i].iter().map(|d| d.0));
        }

        let remap: BTreeMap<usize, usize> = keep
            .iter()
            .enumerate()
            .map(|(new, old)| (*old, new))
            .collect();

        let nodes = keep.iter().map(|i| self.nodes[*i].clone()).collect();
        let edges = keep
            .iter()
            .map(|i| {
                self.edges[*i]
                    .iter()
                    .map(|d| ArtifactIdx(remap[&d.0]))
                    .collect()
            })
            .collect();

        ArtifactGraph { nodes, edges }
    }
}

/// Incrementally builds an [`ArtifactGraph`], deduplicating by digest.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Artifact>,
    edges: Vec<Vec<ArtifactIdx>>,
    by_digest: BTreeMap<Digest, ArtifactIdx>,
}

impl GraphBuilder {
    /// Insert an artifact, or return the index of the existing artifact with the same digest.
    ///
    /// The boolean is `true` when a new node was created.
    pub fn insert(&mut self, artifact: Artifact) -> (ArtifactIdx, bool) {
        if let Some(d) = &artifact.digest
            && let Some(existing) = self.by_digest.get(d)
        {
            return (*existing, false);
        }
        let idx = ArtifactIdx(self.nodes.len());
        if let Some(d) = &artifact.digest {
            self.by_digest.insert(d.clone(), idx);
        }
        self.nodes.push(artifact);
        self.edges.push(Vec::new());
        (idx, true)
    }

    pub fn artifact_mut(&mut self, idx: ArtifactIdx) -> &mut Artifact {
        &mut self.nodes[idx.0]
    }

    pub fn lookup_digest(&self, digest: &Digest) -> Option<ArtifactIdx> {
        self.by_digest.get(digest).copied()
    }

    /// Add a dependency edge; duplicate edges are ignored, first occurrence keeps its position.
    pub fn add_edge(&mut self, from: ArtifactIdx, to: ArtifactIdx) {
        let deps = &mut self.edges[from.0];
        if !deps.contains(&to) {
            deps.push(to);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn build(self) -> ArtifactGraph {
        ArtifactGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

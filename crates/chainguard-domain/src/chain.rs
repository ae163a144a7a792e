//! Transitive trust propagation over the artifact graph.
//!
//! Strongly connected components are found with an iterative Tarjan pass.
//! Tarjan emits components sinks-first, so by the time a component is
//! resolved every dependency outside it already has its final status. Every
//! member of a non-trivial component (or a self-loop) is untrusted with
//! `cyclic-dependency`.

use crate::model::{ArtifactGraph, ArtifactIdx};
use crate::verify::OwnVerdict;
use chainguard_types::{TrustStatus, ids};

/// Final verdict for one artifact after dependencies are considered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainVerdict {
    pub status: TrustStatus,
    pub code: Option<&'static str>,
    pub message: String,
    /// Labels of direct dependencies that are not trusted.
    pub untrusted_dependencies: Vec<String>,
}

/// Strongly connected components in reverse topological order (sinks first).
pub fn strongly_connected_components(graph: &ArtifactGraph) -> Vec<Vec<ArtifactIdx>> {
    const UNVISITED: usize = usize::MAX;

    let n = graph.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0usize;
    let mut components: Vec<Vec<ArtifactIdx>> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        // (node, position of the next edge to explore)
        let mut work: Vec<(usize, usize)> = vec![(root, 0)];
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(top) = work.last_mut() {
            let v = top.0;
            let deps = graph.dependencies(ArtifactIdx(v));
            if top.1 < deps.len() {
                let w = deps[top.1].0;
                top.1 += 1;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    work.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if lowlink[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(ArtifactIdx(w));
                    if w == v {
                        break;
                    }
                }
                component.sort();
                components.push(component);
            }
        }
    }

    components
}

/// Combine own verdicts with dependency verdicts. `own` is indexed like the graph.
pub fn evaluate_chain(graph: &ArtifactGraph, own: &[OwnVerdict]) -> Vec<ChainVerdict> {
    let mut out: Vec<Option<ChainVerdict>> = vec![None; graph.len()];

    for component in strongly_connected_components(graph) {
        let cyclic = component.len() > 1
            || graph.dependencies(component[0]).contains(&component[0]);

        if cyclic {
            let mut members: Vec<String> = component
                .iter()
                .map(|i| graph.artifact(*i).label())
                .collect();
            members.sort();
            tracing::debug!(members = ?members, "dependency cycle");
            for idx in &component {
                // Components arrive sinks-first, so dependencies outside this one are final.
                let untrusted_dependencies = graph
                    .dependencies(*idx)
                    .iter()
                    .filter(|d| {
                        component.contains(d)
                            || out[d.0]
                                .as_ref()
                                .is_none_or(|v| v.status != TrustStatus::Trusted)
                    })
                    .map(|d| graph.artifact(*d).label())
                    .collect();
                out[idx.0] = Some(ChainVerdict {
                    status: TrustStatus::Untrusted,
                    code: Some(ids::CODE_CYCLIC_DEPENDENCY),
                    message: format!("part of dependency cycle among {}", members.join(", ")),
                    untrusted_dependencies,
                });
            }
            continue;
        }

        let idx = component[0];
        let verdict = resolve_acyclic(graph, idx, &own[idx.0], &out);
        out[idx.0] = Some(verdict);
    }

    out.into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.unwrap_or_else(|| ChainVerdict {
                status: TrustStatus::Unknown,
                code: None,
                message: format!("{} was not evaluated", graph.artifact(ArtifactIdx(i)).label()),
                untrusted_dependencies: Vec::new(),
            })
        })
        .collect()
}

fn resolve_acyclic(
    graph: &ArtifactGraph,
    idx: ArtifactIdx,
    own: &OwnVerdict,
    done: &[Option<ChainVerdict>],
) -> ChainVerdict {
    let untrusted_dependencies: Vec<String> = graph
        .dependencies(idx)
        .iter()
        .filter(|d| {
            done[d.0]
                .as_ref()
                .is_none_or(|v| v.status != TrustStatus::Trusted)
        })
        .map(|d| graph.artifact(*d).label())
        .collect();

    match own.status {
        TrustStatus::Unknown => ChainVerdict {
            status: TrustStatus::Unknown,
            code: own.code,
            message: own.message.clone(),
            untrusted_dependencies,
        },
        TrustStatus::Untrusted => ChainVerdict {
            status: TrustStatus::Untrusted,
            code: own.code,
            message: own.message.clone(),
            untrusted_dependencies,
        },
        TrustStatus::Trusted if !untrusted_dependencies.is_empty() => ChainVerdict {
            status: TrustStatus::Untrusted,
            code: Some(ids::CODE_UNTRUSTED_DEPENDENCY),
            message: format!(
                "depends on untrusted artifact(s): {}",
                untrusted_dependencies.join(", ")
            ),
            untrusted_dependencies,
        },
        TrustStatus::Trusted => ChainVerdict {
            status: TrustStatus::Trusted,
            code: None,
            message: own.message.clone(),
            untrusted_dependencies,
        },
    }
}

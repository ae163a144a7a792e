use crate::chain::evaluate_chain;
use crate::fingerprint::fingerprint_for_verdict;
use crate::model::{ArtifactGraph, ArtifactIdx};
use crate::policy::Policy;
use crate::report::{DomainReport, compare_verdicts, decide};
use crate::run::{CancellationToken, RunError};
use crate::verify::{AttestationVerifier, OwnVerdict};
use chainguard_types::VerdictEntry;
use rayon::prelude::*;

/// Verify every artifact in parallel, then propagate trust across the graph.
///
/// Per-artifact verification runs on a pool of `policy.workers` threads. The
/// chain pass starts only after every artifact has been verified. A cancelled
/// token stops outstanding work and yields [`RunError::Cancelled`], never a
/// partial report.
pub fn evaluate(
    graph: &ArtifactGraph,
    policy: &Policy,
    cancel: &CancellationToken,
) -> Result<DomainReport, RunError> {
    let workers = effective_workers(policy.workers);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("chainguard-verify-{i}"))
        .build()
        .map_err(|e| RunError::WorkerPool(e.to_string()))?;

    tracing::debug!(artifacts = graph.len(), workers, "verifying attestations");

    let verifier = AttestationVerifier::new(policy);
    let own: Vec<OwnVerdict> = pool.install(|| {
        graph
            .artifacts()
            .par_iter()
            .map(|artifact| {
                if cancel.is_cancelled() {
                    return Err(RunError::Cancelled);
                }
                Ok(verifier.verify_artifact(artifact))
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    if cancel.is_cancelled() {
        return Err(RunError::Cancelled);
    }

    let chain = evaluate_chain(graph, &own);

    let attestations_scanned = graph
        .artifacts()
        .iter()
        .map(|a| a.attestations.len() as u32)
        .sum();
    let attestations_valid = own.iter().map(|o| o.valid_count as u32).sum();

    let mut verdicts: Vec<VerdictEntry> = own
        .into_iter()
        .zip(chain)
        .enumerate()
        .map(|(i, (own, chain))| {
            let idx = ArtifactIdx(i);
            let artifact = graph.artifact(idx);
            let label = artifact.label();
            let fingerprint = fingerprint_for_verdict(
                chain.code.unwrap_or(chain.status.as_str()),
                artifact.digest.as_ref().map(|d| d.as_str()),
                &label,
            );
            VerdictEntry {
                artifact: artifact.to_ref(),
                status: chain.status,
                code: chain.code.map(str::to_string),
                message: chain.message,
                location: artifact.location.clone(),
                dependencies: graph
                    .dependencies(idx)
                    .iter()
                    .map(|d| graph.artifact(*d).label())
                    .collect(),
                untrusted_dependencies: chain.untrusted_dependencies,
                attestations: own.attestations,
                fingerprint: Some(fingerprint),
            }
        })
        .collect();

    // Deterministic ordering independent of graph insertion order.
    verdicts.sort_by(compare_verdicts);

    let decision = decide(&verdicts);
    tracing::debug!(
        status = decision.status.as_str(),
        failing = decision.failing.len(),
        "chain evaluated"
    );

    Ok(DomainReport {
        decision,
        verdicts,
        artifacts_scanned: graph.len() as u32,
        attestations_scanned,
        attestations_valid,
        workers: workers as u32,
    })
}

/// `0` means one worker per available CPU.
pub fn effective_workers(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Verdict independence from graph insertion order
//! - Transitive propagation of untrusted dependencies
//! - Cycle marking
//! - Report determinism and idempotence

use crate::engine::evaluate;
use crate::model::{Artifact, ArtifactGraph, ArtifactIdx};
use crate::run::CancellationToken;
use crate::test_support::{digest_of, policy_with_signers, signed_provenance};
use chainguard_test_util::signing::TestSigner;
use chainguard_types::{TrustStatus, VerdictEntry, ids};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

// ============================================================================
// Strategies
// ============================================================================

/// A random graph: node count, which nodes carry a valid attestation, and
/// candidate edges (filtered per test).
fn arb_graph() -> impl Strategy<Value = (Vec<bool>, Vec<(usize, usize)>)> {
    (1usize..8).prop_flat_map(|n| {
        (
            prop::collection::vec(any::<bool>(), n),
            prop::collection::vec((0..n, 0..n), 0..(n * 2)),
        )
    })
}

/// Build the graph with nodes inserted in `order`. Node `i` is named `n{i}`.
fn build(
    signer: &TestSigner,
    attested: &[bool],
    edges: &[(usize, usize)],
    order: &[usize],
) -> ArtifactGraph {
    let mut b = ArtifactGraph::builder();
    let mut slot: BTreeMap<usize, ArtifactIdx> = BTreeMap::new();
    for &i in order {
        let name = format!("n{i}");
        let d = digest_of(&name);
        let mut a = Artifact::new(&name, "1", d.clone());
        if attested[i] {
            a.attestations.push(signed_provenance(signer, &d));
        }
        let (idx, _) = b.insert(a);
        slot.insert(i, idx);
    }
    for (from, to) in edges {
        b.add_edge(slot[from], slot[to]);
    }
    b.build()
}

fn by_label(verdicts: &[VerdictEntry]) -> BTreeMap<String, &VerdictEntry> {
    verdicts.iter().map(|v| (v.artifact.label(), v)).collect()
}

fn dag_edges(edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    edges.iter().copied().filter(|(a, b)| a < b).collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn insertion_order_does_not_change_report(
        (attested, edges) in arb_graph(),
        seed in any::<u64>(),
    ) {
        let signer = TestSigner::from_seed("S1", 1);
        let policy = policy_with_signers(&[&signer]);
        let n = attested.len();

        let natural: Vec<usize> = (0..n).collect();
        let mut shuffled = natural.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

        let cancel = CancellationToken::new();
        let a = evaluate(&build(&signer, &attested, &edges, &natural), &policy, &cancel)
            .expect("evaluate");
        let b = evaluate(&build(&signer, &attested, &edges, &shuffled), &policy, &cancel)
            .expect("evaluate");

        let labels_a: Vec<String> = a.verdicts.iter().map(|v| v.artifact.label()).collect();
        let labels_b: Vec<String> = b.verdicts.iter().map(|v| v.artifact.label()).collect();
        prop_assert_eq!(labels_a, labels_b);
        for (va, vb) in a.verdicts.iter().zip(b.verdicts.iter()) {
            prop_assert_eq!(va.status, vb.status);
            prop_assert_eq!(&va.code, &vb.code);
            prop_assert_eq!(&va.fingerprint, &vb.fingerprint);
        }
        prop_assert_eq!(a.decision, b.decision);
    }

    #[test]
    fn untrusted_dependency_implies_untrusted_dependent(
        (attested, edges) in arb_graph(),
    ) {
        let signer = TestSigner::from_seed("S1", 1);
        let policy = policy_with_signers(&[&signer]);
        let order: Vec<usize> = (0..attested.len()).collect();
        let graph = build(&signer, &attested, &edges, &order);

        let report = evaluate(&graph, &policy, &CancellationToken::new()).expect("evaluate");
        let index = by_label(&report.verdicts);
        for v in &report.verdicts {
            for dep in &v.dependencies {
                if index[dep].status != TrustStatus::Trusted {
                    prop_assert_ne!(v.status, TrustStatus::Trusted, "{} depends on {}", v.artifact.label(), dep);
                }
            }
        }
    }

    #[test]
    fn leaf_is_trusted_iff_attested(
        (attested, edges) in arb_graph(),
    ) {
        let signer = TestSigner::from_seed("S1", 1);
        let policy = policy_with_signers(&[&signer]);
        let edges = dag_edges(&edges);
        let order: Vec<usize> = (0..attested.len()).collect();
        let graph = build(&signer, &attested, &edges, &order);

        let report = evaluate(&graph, &policy, &CancellationToken::new()).expect("evaluate");
        for (i, is_attested) in attested.iter().enumerate() {
            let label = format!("n{i}@1");
            let v = report.verdicts.iter().find(|v| v.artifact.label() == label).expect("verdict");
            if v.dependencies.is_empty() {
                prop_assert_eq!(v.status == TrustStatus::Trusted, *is_attested);
            }
        }
    }

    #[test]
    fn closing_a_path_marks_every_member_cyclic(
        len in 2usize..6,
    ) {
        let signer = TestSigner::from_seed("S1", 1);
        let policy = policy_with_signers(&[&signer]);
        let attested = vec![true; len];
        let mut edges: Vec<(usize, usize)> = (0..len - 1).map(|i| (i, i + 1)).collect();
        edges.push((len - 1, 0));
        let order: Vec<usize> = (0..len).collect();

        let report = evaluate(&build(&signer, &attested, &edges, &order), &policy, &CancellationToken::new())
            .expect("evaluate");
        for v in &report.verdicts {
            prop_assert_eq!(v.status, TrustStatus::Untrusted);
            prop_assert_eq!(v.code.as_deref(), Some(ids::CODE_CYCLIC_DEPENDENCY));
        }
    }

    #[test]
    fn reevaluation_is_idempotent(
        (attested, edges) in arb_graph(),
    ) {
        let signer = TestSigner::from_seed("S1", 1);
        let policy = policy_with_signers(&[&signer]);
        let order: Vec<usize> = (0..attested.len()).collect();
        let graph = build(&signer, &attested, &edges, &order);
        let cancel = CancellationToken::new();

        let first = evaluate(&graph, &policy, &cancel).expect("first");
        let second = evaluate(&graph, &policy, &cancel).expect("second");
        prop_assert_eq!(first.verdicts, second.verdicts);
        prop_assert_eq!(first.decision, second.decision);
    }
}

use chainguard_types::{Decision, StatusCounts, TrustStatus, VerdictEntry};
use std::cmp::Ordering;

/// Output of [`crate::evaluate`]: everything the report envelope needs except run metadata.
#[derive(Clone, Debug)]
pub struct DomainReport {
    pub decision: Decision,
    /// Sorted by ascending digest; placeholders without a digest last.
    pub verdicts: Vec<VerdictEntry>,
    pub artifacts_scanned: u32,
    pub attestations_scanned: u32,
    pub attestations_valid: u32,
    pub workers: u32,
}

pub fn counts_from_verdicts(verdicts: &[VerdictEntry]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for v in verdicts {
        match v.status {
            TrustStatus::Trusted => counts.trusted += 1,
            TrustStatus::Untrusted => counts.untrusted += 1,
            TrustStatus::Unknown => counts.unknown += 1,
        }
    }
    counts
}

/// Overall decision over sorted verdicts. Trusted only if every verdict is trusted.
pub fn decide(verdicts: &[VerdictEntry]) -> Decision {
    let failing: Vec<String> = verdicts
        .iter()
        .filter(|v| v.status != TrustStatus::Trusted)
        .map(|v| v.artifact.label())
        .collect();
    Decision {
        status: if failing.is_empty() {
            TrustStatus::Trusted
        } else {
            TrustStatus::Untrusted
        },
        failing,
        counts: counts_from_verdicts(verdicts),
    }
}

pub fn compare_verdicts(a: &VerdictEntry, b: &VerdictEntry) -> Ordering {
    // Ordering priority:
    // 1) digest (missing last)
    // 2) name@version label
    let key = |v: &VerdictEntry| match &v.artifact.digest {
        Some(d) => d.as_str().to_string(),
        None => format!("~{}", v.artifact.label()),
    };
    key(a)
        .cmp(&key(b))
        .then_with(|| a.artifact.label().cmp(&b.artifact.label()))
}

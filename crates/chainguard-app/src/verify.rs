//! The `verify` use case: load policy, resolve artifacts, evaluate trust, produce a report.

use crate::ChainguardError;
use camino::Utf8Path;
use chainguard_domain::policy::Policy;
use chainguard_domain::run::{CancellationToken, Deadline};
use chainguard_repo::{ResolveOptions, resolve_artifacts};
use chainguard_settings::{Overrides, PolicyError};
use chainguard_types::{
    ChainguardData, ChainguardReport, RepoPath, RunMeta, SCHEMA_REPORT_V1, ToolMeta, TrustStatus,
};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use time::OffsetDateTime;

/// How often the caller wakes up to check cancellation while a bounded stage runs.
const STAGE_POLL: Duration = Duration::from_millis(50);

/// Input for the verify use case. Everything a run needs; nothing is shared across runs.
#[derive(Clone, Debug)]
pub struct VerifyInput<'a> {
    /// Repository root path.
    pub repo_root: &'a Utf8Path,
    /// Policy file, relative to `repo_root` unless absolute.
    pub policy_path: &'a Utf8Path,
    /// Scope manifest, relative to `repo_root`.
    pub manifest: &'a RepoPath,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Budget for policy loading and artifact resolution. `None` is unbounded.
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

/// Output from the verify use case.
#[derive(Clone, Debug)]
pub struct VerifyOutput {
    pub report: ChainguardReport,
    /// The resolved policy the run used.
    pub policy: Policy,
}

/// Run the verify use case.
///
/// Fails without a report on policy or resolution errors, on timeout during
/// the bounded stages, and on cancellation. Verification failures of
/// individual attestations are verdicts, not errors.
pub fn run_verify(input: VerifyInput<'_>) -> Result<VerifyOutput, ChainguardError> {
    let started_at = OffsetDateTime::now_utc();

    if !input.repo_root.is_dir() {
        return Err(ChainguardError::MissingRepoRoot(input.repo_root.to_string()));
    }

    let deadline = input.timeout.map_or_else(Deadline::none, Deadline::after);

    let policy_path = input.repo_root.join(input.policy_path);
    let overrides = input.overrides.clone();
    let policy = run_bounded("policy loading", deadline, &input.cancel, move || {
        load_policy(&policy_path, overrides)
    })?;
    tracing::info!(
        profile = %policy.profile,
        signers = policy.signers.len(),
        required = ?policy.required_kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "loaded policy"
    );

    let opts = ResolveOptions {
        allow_unresolved: policy.allow_unresolved,
        deadline,
    };
    let root = input.repo_root.to_path_buf();
    let manifest = input.manifest.clone();
    let graph = run_bounded("artifact resolution", deadline, &input.cancel, move || {
        resolve_artifacts(&root, &manifest, &opts)
    })?;
    tracing::info!(artifacts = graph.len(), "resolved artifacts");

    let domain = chainguard_domain::evaluate(&graph, &policy, &input.cancel)?;

    let ended_at = OffsetDateTime::now_utc();
    let duration_ms = (ended_at - started_at).whole_milliseconds().max(0) as u64;

    tracing::info!(
        decision = domain.decision.status.as_str(),
        trusted = domain.decision.counts.trusted,
        untrusted = domain.decision.counts.untrusted,
        unknown = domain.decision.counts.unknown,
        duration_ms,
        "verification finished"
    );

    let report = ChainguardReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "chainguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        run: RunMeta {
            started_at,
            ended_at: Some(ended_at),
            duration_ms: Some(duration_ms),
        },
        decision: domain.decision,
        verdicts: domain.verdicts,
        data: ChainguardData {
            profile: policy.profile.clone(),
            manifest: input.manifest.clone(),
            artifacts_scanned: domain.artifacts_scanned,
            attestations_scanned: domain.attestations_scanned,
            attestations_valid: domain.attestations_valid,
            workers: domain.workers,
        },
    };

    Ok(VerifyOutput { report, policy })
}

/// Map the overall decision to an exit code: 0 = trusted, 2 = untrusted.
pub fn decision_exit_code(status: TrustStatus) -> i32 {
    match status {
        TrustStatus::Trusted => 0,
        TrustStatus::Untrusted | TrustStatus::Unknown => 2,
    }
}

fn load_policy(path: &Utf8Path, overrides: Overrides) -> Result<Policy, PolicyError> {
    let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.to_string(),
        source,
    })?;
    chainguard_settings::load_policy_str(&text, overrides)
}

/// Run one bounded stage on a dedicated thread so a stalled read cannot
/// outlive the deadline and an interrupt is noticed while it is blocked.
///
/// On timeout or cancellation the worker is detached; its result is dropped.
fn run_bounded<T, E, F>(
    stage: &str,
    deadline: Deadline,
    cancel: &CancellationToken,
    job: F,
) -> Result<T, ChainguardError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    ChainguardError: From<E>,
{
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name(format!("chainguard {stage}"))
        .spawn(move || {
            // The receiver may be gone after a timeout; nothing left to report to.
            let _ = tx.send(job());
        })
        .map_err(|e| ChainguardError::Run(format!("failed to start {stage}: {e}")))?;

    loop {
        if cancel.is_cancelled() {
            tracing::debug!(stage, "stage cancelled");
            return Err(ChainguardError::Cancelled);
        }
        deadline.check(stage)?;
        let wait = deadline
            .remaining()
            .map_or(STAGE_POLL, |left| left.min(STAGE_POLL));
        match rx.recv_timeout(wait) {
            Ok(result) => return Ok(result?),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ChainguardError::Run(format!("{stage} stopped without a result")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use chainguard_test_util::signing::{
        TEST_BUILDER, TestSigner, envelope_json, provenance_statement,
    };
    use chainguard_types::{Digest, ids};
    use tempfile::TempDir;

    struct Workspace {
        _tmp: TempDir,
        root: Utf8PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let tmp = TempDir::new().expect("temp dir");
            let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");
            Self { _tmp: tmp, root }
        }

        fn write(&self, rel: &str, contents: &str) {
            let path = self.root.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create parent");
            }
            std::fs::write(path, contents).expect("write file");
        }
    }

    fn digest(c: char) -> Digest {
        Digest::from_sha256_hex(&c.to_string().repeat(64)).expect("digest")
    }

    /// Scenario workspace: `app@1.0` (attested) depends on `lib@2.0`.
    fn scenario(lib_attested: bool, extra_policy: &str) -> Workspace {
        let ws = Workspace::new();
        let signer = TestSigner::from_seed("S1", 1);
        let (d1, d2) = (digest('1'), digest('2'));
        ws.write(
            "chainguard.toml",
            &format!(
                "{extra_policy}[[signers]]\nid = \"S1\"\npublic_key = \"{}\"\n",
                signer.public_key_hex()
            ),
        );
        ws.write(
            "att/app.json",
            &envelope_json(&signer.sign_statement(&provenance_statement(&d1, TEST_BUILDER))),
        );
        let mut lib_atts = String::new();
        if lib_attested {
            ws.write(
                "att/lib.json",
                &envelope_json(&signer.sign_statement(&provenance_statement(&d2, TEST_BUILDER))),
            );
            lib_atts.push_str("attestations = [\"att/lib.json\"]\n");
        }
        ws.write(
            "chainguard.lock",
            &format!(
                "[[artifact]]\nname = \"app\"\nversion = \"1.0\"\ndigest = \"{d1}\"\ndependencies = [\"lib@2.0\"]\nattestations = [\"att/app.json\"]\n\n[[artifact]]\nname = \"lib\"\nversion = \"2.0\"\ndigest = \"{d2}\"\n{lib_atts}"
            ),
        );
        ws
    }

    fn run(ws: &Workspace, timeout: Option<Duration>, cancel: CancellationToken) -> Result<VerifyOutput, ChainguardError> {
        let manifest = RepoPath::new("chainguard.lock");
        run_verify(VerifyInput {
            repo_root: &ws.root,
            policy_path: Utf8Path::new("chainguard.toml"),
            manifest: &manifest,
            overrides: Overrides::default(),
            timeout,
            cancel,
        })
    }

    #[test]
    fn unattested_dependency_fails_the_run() {
        let ws = scenario(false, "");
        let out = run(&ws, Some(Duration::from_secs(30)), CancellationToken::new()).expect("verify");
        let report = out.report;

        assert_eq!(report.decision.status, TrustStatus::Untrusted);
        assert_eq!(report.decision.failing, vec!["app@1.0".to_string(), "lib@2.0".to_string()]);
        assert_eq!(report.verdicts[0].code.as_deref(), Some(ids::CODE_UNTRUSTED_DEPENDENCY));
        assert_eq!(report.verdicts[1].code.as_deref(), Some(ids::CODE_MISSING_ATTESTATION));
        assert_eq!(report.data.artifacts_scanned, 2);
        assert_eq!(report.data.attestations_valid, 1);
        assert_eq!(report.data.profile, "strict");
        assert_eq!(decision_exit_code(report.decision.status), 2);
    }

    #[test]
    fn fully_attested_chain_is_trusted() {
        let ws = scenario(true, "");
        let out = run(&ws, None, CancellationToken::new()).expect("verify");
        assert_eq!(out.report.decision.status, TrustStatus::Trusted);
        assert!(out.report.decision.failing.is_empty());
        assert_eq!(out.report.schema, SCHEMA_REPORT_V1);
        assert_eq!(out.report.tool.name, "chainguard");
        assert!(out.report.run.ended_at.is_some());
        assert_eq!(decision_exit_code(out.report.decision.status), 0);
    }

    #[test]
    fn missing_policy_is_a_policy_error() {
        let ws = Workspace::new();
        ws.write("chainguard.lock", "");
        let err = run(&ws, None, CancellationToken::new()).unwrap_err();
        assert!(matches!(err, ChainguardError::Policy(PolicyError::Read { .. })));
    }

    #[test]
    fn missing_repo_root_is_reported() {
        let ws = Workspace::new();
        let gone = ws.root.join("nope");
        let manifest = RepoPath::new("chainguard.lock");
        let err = run_verify(VerifyInput {
            repo_root: &gone,
            policy_path: Utf8Path::new("chainguard.toml"),
            manifest: &manifest,
            overrides: Overrides::default(),
            timeout: None,
            cancel: CancellationToken::new(),
        })
        .unwrap_err();
        assert!(matches!(err, ChainguardError::MissingRepoRoot(_)));
    }

    #[test]
    fn dangling_reference_is_fatal_under_strict() {
        let ws = scenario(true, "");
        ws.write(
            "chainguard.lock",
            &format!(
                "[[artifact]]\nname = \"app\"\nversion = \"1.0\"\ndigest = \"{}\"\ndependencies = [\"ghost@9\"]\n",
                digest('1')
            ),
        );
        let err = run(&ws, None, CancellationToken::new()).unwrap_err();
        assert!(matches!(err, ChainguardError::Resolution(_)));
    }

    #[test]
    fn lenient_profile_records_unknown_placeholder() {
        let ws = scenario(true, "profile = \"lenient\"\n");
        ws.write(
            "chainguard.lock",
            &format!(
                "[[artifact]]\nname = \"app\"\nversion = \"1.0\"\ndigest = \"{}\"\ndependencies = [\"ghost@9\"]\nattestations = [\"att/app.json\"]\n",
                digest('1')
            ),
        );
        let report = run(&ws, None, CancellationToken::new()).expect("verify").report;
        assert_eq!(report.decision.status, TrustStatus::Untrusted);
        assert_eq!(report.decision.counts.unknown, 1);
        let ghost = report
            .verdicts
            .iter()
            .find(|v| v.artifact.label() == "ghost@9")
            .expect("placeholder verdict");
        assert_eq!(ghost.status, TrustStatus::Unknown);
        assert_eq!(ghost.code.as_deref(), Some(ids::CODE_UNRESOLVED_DEPENDENCY));
        let app = report
            .verdicts
            .iter()
            .find(|v| v.artifact.label() == "app@1.0")
            .expect("app verdict");
        assert_eq!(app.status, TrustStatus::Untrusted);
    }

    #[test]
    fn zero_timeout_aborts_without_report() {
        let ws = scenario(true, "");
        let err = run(&ws, Some(Duration::ZERO), CancellationToken::new()).unwrap_err();
        assert!(matches!(err, ChainguardError::Timeout(_)));
    }

    #[cfg(unix)]
    fn make_fifo(path: &Utf8Path) {
        let status = std::process::Command::new("mkfifo")
            .arg(path.as_str())
            .status()
            .expect("run mkfifo");
        assert!(status.success(), "mkfifo failed");
    }

    #[cfg(unix)]
    #[test]
    fn stalled_policy_read_times_out() {
        let ws = scenario(true, "");
        let policy = ws.root.join("chainguard.toml");
        std::fs::remove_file(&policy).expect("remove policy");
        // Opening a FIFO with no writer blocks forever.
        make_fifo(&policy);

        let started = std::time::Instant::now();
        let err = run(&ws, Some(Duration::from_millis(300)), CancellationToken::new()).unwrap_err();
        assert!(
            matches!(&err, ChainguardError::Timeout(t) if t.stage == "policy loading"),
            "unexpected error: {err}"
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn stalled_policy_read_notices_cancellation() {
        let ws = scenario(true, "");
        let policy = ws.root.join("chainguard.toml");
        std::fs::remove_file(&policy).expect("remove policy");
        make_fifo(&policy);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });
        let started = std::time::Instant::now();
        let err = run(&ws, None, cancel).unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancelled_token_aborts_without_report() {
        let ws = scenario(true, "");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = run(&ws, None, cancel).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn rerun_is_identical_apart_from_run_metadata() {
        let ws = scenario(false, "");
        let a = run(&ws, None, CancellationToken::new()).expect("first").report;
        let b = run(&ws, None, CancellationToken::new()).expect("second").report;
        assert_eq!(a.decision, b.decision);
        assert_eq!(a.verdicts, b.verdicts);
        assert_eq!(a.data, b.data);
    }
}

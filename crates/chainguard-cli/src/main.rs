//! CLI entry point for chainguard.
//!
//! This module is intentionally thin: it handles argument parsing, logging setup,
//! interrupts and exit codes. All business logic lives in the `chainguard-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chainguard_app::{
    CancellationToken, ChainguardError, ExplainOutput, VerifyInput, VerifyOutput,
    decision_exit_code, parse_report_json, render_annotations, render_markdown, run_explain,
    run_verify, to_renderable, write_report, write_text,
};
use chainguard_settings::Overrides;
use chainguard_types::{ChainguardReport, RepoPath};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_REPORT_OUT: &str = "artifacts/chainguard/report.json";
const DEFAULT_MARKDOWN_OUT: &str = "artifacts/chainguard/comment.md";

/// Conventional exit status for a run stopped by SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "chainguard",
    version,
    about = "Supply-chain trust verifier for signed artifacts and their dependency chains"
)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Repository root; policy, manifest and attestation paths are relative to it.
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,

    /// Path to the trust policy TOML.
    #[arg(long, default_value = "chainguard.toml")]
    policy: Utf8PathBuf,

    /// Path to the scope manifest, relative to the repo root.
    #[arg(long, default_value = "chainguard.lock")]
    manifest: String,

    /// Override profile (strict|lenient).
    #[arg(long)]
    profile: Option<String>,

    /// Override the verification worker count (0 = one per CPU).
    #[arg(long)]
    workers: Option<usize>,

    /// Time budget for policy loading and artifact resolution, in seconds (0 = unbounded).
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify the artifacts in scope and write the report (default).
    Verify {
        /// Where to write the JSON report.
        #[arg(long, default_value = DEFAULT_REPORT_OUT)]
        report_out: Utf8PathBuf,

        /// Write a Markdown report alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (if enabled).
        #[arg(long, default_value = DEFAULT_MARKDOWN_OUT)]
        markdown_out: Utf8PathBuf,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = DEFAULT_REPORT_OUT)]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = DEFAULT_REPORT_OUT)]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain a reason code with remediation guidance.
    Explain {
        /// The reason code (e.g. "missing-attestation").
        code: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("chainguard error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let cmd = cli.cmd.unwrap_or(Commands::Verify {
        report_out: DEFAULT_REPORT_OUT.into(),
        write_markdown: false,
        markdown_out: DEFAULT_MARKDOWN_OUT.into(),
    });
    let job = VerifyJob {
        repo_root: cli
            .repo_root
            .canonicalize_utf8()
            .unwrap_or_else(|_| cli.repo_root.clone()),
        policy: cli.policy,
        manifest: RepoPath::new(&cli.manifest),
        overrides: Overrides {
            profile: cli.profile,
            workers: cli.workers,
        },
        timeout: (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs)),
    };

    match cmd {
        Commands::Verify {
            report_out,
            write_markdown,
            markdown_out,
        } => cmd_verify(job, &report_out, write_markdown.then_some(markdown_out.as_path())),
        Commands::Md { report, output } => cmd_md(&report, output.as_deref()),
        Commands::Annotations { report, max } => cmd_annotations(&report, max),
        Commands::Explain { code } => Ok(cmd_explain(&code)),
    }
}

/// Owned inputs for a verification run, so it can move onto a blocking thread.
struct VerifyJob {
    repo_root: Utf8PathBuf,
    policy: Utf8PathBuf,
    manifest: RepoPath,
    overrides: Overrides,
    timeout: Option<Duration>,
}

impl VerifyJob {
    fn run(self, cancel: CancellationToken) -> Result<VerifyOutput, ChainguardError> {
        run_verify(VerifyInput {
            repo_root: &self.repo_root,
            policy_path: &self.policy,
            manifest: &self.manifest,
            overrides: self.overrides,
            timeout: self.timeout,
            cancel,
        })
    }
}

fn cmd_verify(
    job: VerifyJob,
    report_out: &Utf8Path,
    markdown_out: Option<&Utf8Path>,
) -> anyhow::Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("start runtime")?;

    let output = match runtime.block_on(verify_until_interrupted(job))? {
        Ok(output) => output,
        Err(err) if err.is_cancelled() => {
            eprintln!("chainguard: verification cancelled; no report written");
            return Ok(EXIT_INTERRUPTED);
        }
        Err(err) => return Err(err.into()),
    };

    write_artifacts(&output.report, report_out, markdown_out)?;
    Ok(decision_exit_code(output.report.decision.status))
}

/// Run verification on a blocking thread; Ctrl-C cancels it and waits for it to stop.
async fn verify_until_interrupted(
    job: VerifyJob,
) -> anyhow::Result<Result<VerifyOutput, ChainguardError>> {
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let mut task = tokio::task::spawn_blocking(move || job.run(worker_cancel));

    tokio::select! {
        joined = &mut task => joined.context("verification task failed"),
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    tracing::warn!("interrupt received; cancelling verification");
                    cancel.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "failed to listen for interrupts"),
            }
            let joined = task.await.context("verification task failed")?;
            Ok(discard_if_cancelled(&cancel, joined))
        }
    }
}

/// Once the token is cancelled the run is discarded, even if it completed.
fn discard_if_cancelled<T>(
    cancel: &CancellationToken,
    result: Result<T, ChainguardError>,
) -> Result<T, ChainguardError> {
    if cancel.is_cancelled() {
        return Err(ChainguardError::Cancelled);
    }
    result
}

fn write_artifacts(
    report: &ChainguardReport,
    report_out: &Utf8Path,
    markdown_out: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    write_report(report_out, report).context("write report json")?;
    tracing::debug!(path = %report_out, "wrote report");

    if let Some(path) = markdown_out {
        let md = render_markdown(&to_renderable(report));
        write_text(path, &md).context("write markdown")?;
        tracing::debug!(path = %path, "wrote markdown");
    }
    Ok(())
}

fn read_report(path: &Utf8Path) -> anyhow::Result<ChainguardReport> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read report: {path}"))?;
    parse_report_json(&text)
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<i32> {
    let report = read_report(report_path)?;
    let md = render_markdown(&to_renderable(&report));

    match output {
        Some(out_path) => write_text(out_path, &md).context("write markdown output")?,
        None => print!("{md}"),
    }
    Ok(0)
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<i32> {
    let report = read_report(report_path)?;
    for annotation in render_annotations(&to_renderable(&report), max) {
        println!("{annotation}");
    }
    Ok(0)
}

fn cmd_explain(code: &str) -> i32 {
    match run_explain(code) {
        ExplainOutput::Found(exp) => {
            print!("{}", chainguard_app::format_explanation(&exp));
            0
        }
        ExplainOutput::NotFound {
            identifier,
            available_codes,
        } => {
            eprint!(
                "{}",
                chainguard_app::format_not_found(&identifier, available_codes)
            );
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_finishing_after_interrupt_is_discarded() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = discard_if_cancelled(&cancel, Ok::<_, ChainguardError>(()));
        assert!(result.expect_err("cancelled").is_cancelled());
    }

    #[test]
    fn uninterrupted_result_passes_through() {
        let cancel = CancellationToken::new();
        assert!(discard_if_cancelled(&cancel, Ok::<_, ChainguardError>(())).is_ok());

        let err = discard_if_cancelled::<()>(&cancel, Err(ChainguardError::Run("boom".into())))
            .expect_err("error");
        assert!(!err.is_cancelled());
    }
}

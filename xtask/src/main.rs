//! Developer tasks (schema generation, explanation coverage, fixture conformance).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use chainguard_test_util::normalize_nondeterministic;
use schemars::schema_for;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Project root (parent of the xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("cannot determine current directory")?,
    };
    if manifest_dir.ends_with("xtask") {
        return manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .context("xtask has no parent directory");
    }
    Ok(manifest_dir)
}

struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(chainguard_types::ChainguardReport)
}

fn generate_policy_schema() -> schemars::Schema {
    schema_for!(chainguard_settings::PolicyConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "chainguard.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "chainguard.policy.v1.json",
            generate: generate_policy_schema,
        },
    ]
}

/// Pretty JSON with a trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = project_root()?.join("schemas");
    fs::create_dir_all(&dir).context("failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Fails when a checked-in schema differs from what the types generate.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = project_root()?.join("schemas");
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    for name in &missing {
        eprintln!("  missing: {name}");
    }
    for name in &mismatched {
        eprintln!("  out of date: {name}");
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("schema validation failed")
}

/// Reason codes are lowercase kebab-case tokens.
fn is_valid_code(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    !s.ends_with('-') && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// No absolute paths, no `..`, forward slashes only.
fn is_clean_path(path: &str) -> bool {
    !(path.starts_with('/')
        || path.contains("..")
        || path.contains('\\')
        || (path.len() >= 2 && path.as_bytes()[1] == b':'))
}

fn chainguard_bin(root: &Path) -> PathBuf {
    let target = std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| root.join("target"));
    let bin = target.join("debug").join("chainguard");
    if cfg!(windows) {
        bin.with_extension("exe")
    } else {
        bin
    }
}

/// Hygiene checks on a produced report; returns one message per violation.
fn report_hygiene(report: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let verdicts = report
        .get("verdicts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut previous: Option<&str> = None;
    for (i, verdict) in verdicts.iter().enumerate() {
        if let Some(path) = verdict.pointer("/location/path").and_then(Value::as_str)
            && !is_clean_path(path)
        {
            errors.push(format!("verdicts[{i}].location.path '{path}' is not clean"));
        }
        if let Some(code) = verdict.get("code").and_then(Value::as_str)
            && !is_valid_code(code)
        {
            errors.push(format!("verdicts[{i}].code '{code}' is not a valid token"));
        }
        let attestations = verdict
            .get("attestations")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (j, outcome) in attestations.iter().enumerate() {
            if let Some(path) = outcome.get("source").and_then(Value::as_str)
                && path != "-"
                && !is_clean_path(path)
            {
                errors.push(format!("verdicts[{i}].attestations[{j}].source '{path}' is not clean"));
            }
        }
        if let Some(digest) = verdict.pointer("/artifact/digest").and_then(Value::as_str) {
            if previous.is_some_and(|p| p >= digest) {
                errors.push(format!("verdicts[{i}] is out of digest order"));
            }
            previous = Some(digest);
        }
    }
    errors
}

fn run_fixture(bin: &Path, fixture_dir: &Path) -> anyhow::Result<(Option<i32>, Value)> {
    let temp_dir = tempfile::tempdir().context("failed to create temp dir")?;
    let report_out = temp_dir.path().join("report.json");
    let output = Command::new(bin)
        .arg("--repo-root")
        .arg(fixture_dir)
        .arg("verify")
        .arg("--report-out")
        .arg(&report_out)
        .output()
        .with_context(|| format!("failed to run chainguard on {}", fixture_dir.display()))?;

    let text = fs::read_to_string(&report_out).with_context(|| {
        format!(
            "no report written (exit {:?}): {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        )
    })?;
    let report = serde_json::from_str(&text).context("report is not valid JSON")?;
    Ok((output.status.code(), report))
}

/// Run the built binary over `tests/fixtures/` and check every report.
///
/// Each report must validate against `schemas/chainguard.report.v1.json`, pass
/// path and code hygiene, match the fixture's expected exit code and decision,
/// and be identical across two runs once run metadata is normalized.
fn conform() -> anyhow::Result<()> {
    let root = project_root()?;
    let schema_path = root.join("schemas").join("chainguard.report.v1.json");
    let schema_text = fs::read_to_string(&schema_path).with_context(|| {
        format!(
            "{} not found; run `cargo xtask emit-schemas` first",
            schema_path.display()
        )
    })?;
    let schema: Value = serde_json::from_str(&schema_text).context("schema is not valid JSON")?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("failed to compile report schema: {e}"))?;

    let bin = chainguard_bin(&root);
    if !bin.exists() {
        bail!(
            "chainguard binary not found at {}; run `cargo build -p chainguard-cli` first",
            bin.display()
        );
    }

    let fixtures_dir = root.join("tests").join("fixtures");
    let mut fixtures: Vec<PathBuf> = fs::read_dir(&fixtures_dir)
        .context("failed to read tests/fixtures/")?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.join("expected.json").is_file())
        .collect();
    fixtures.sort();

    let mut errors = Vec::new();
    for fixture_dir in &fixtures {
        let name = fixture_dir
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let (code, report) = match run_fixture(&bin, fixture_dir) {
            Ok(run) => run,
            Err(e) => {
                errors.push(format!("{name}: {e:#}"));
                continue;
            }
        };

        for err in validator.iter_errors(&report) {
            errors.push(format!("{name}: schema validation: {err}"));
        }
        errors.extend(report_hygiene(&report).into_iter().map(|e| format!("{name}: {e}")));

        let expected: Value = serde_json::from_str(
            &fs::read_to_string(fixture_dir.join("expected.json"))
                .context("failed to read expected.json")?,
        )
        .with_context(|| format!("{name}: expected.json is not valid JSON"))?;
        if code.map(Value::from) != expected.get("exit_code").cloned() {
            errors.push(format!(
                "{name}: exit code {code:?}, expected {}",
                expected["exit_code"]
            ));
        }
        if report.pointer("/decision/status") != expected.get("decision") {
            errors.push(format!(
                "{name}: decision {}, expected {}",
                report["decision"]["status"], expected["decision"]
            ));
        }

        match run_fixture(&bin, fixture_dir) {
            Ok((_, second))
                if normalize_nondeterministic(second.clone())
                    != normalize_nondeterministic(report.clone()) =>
            {
                errors.push(format!("{name}: report differs between runs"));
            }
            Ok(_) => println!("  ✓ {name}"),
            Err(e) => errors.push(format!("{name}: second run: {e:#}")),
        }
    }

    if fixtures.is_empty() {
        bail!("no fixtures found in {}", fixtures_dir.display());
    }
    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("conformance failed with {} errors", errors.len());
    }
    println!("\n✓ All {} fixtures conform.", fixtures.len());
    Ok(())
}

/// Every reason code must have a complete explanation.
fn explain_coverage() -> anyhow::Result<()> {
    let codes = chainguard_types::explain::all_codes();
    let mut errors = Vec::new();

    for code in codes {
        if !is_valid_code(code) {
            errors.push(format!("code '{code}' is not a valid token"));
        }
        match chainguard_types::lookup_explanation(code) {
            Some(exp) => {
                for (field, value) in [
                    ("title", exp.title),
                    ("description", exp.description),
                    ("remediation", exp.remediation),
                ] {
                    if value.is_empty() {
                        errors.push(format!("code '{code}' has empty {field}"));
                    }
                }
            }
            None => errors.push(format!("code '{code}' has no explanation")),
        }
    }

    if errors.is_empty() {
        println!("✓ {} codes have explanations", codes.len());
        return Ok(());
    }
    for error in &errors {
        eprintln!("  - {error}");
    }
    bail!("explain coverage failed with {} errors", errors.len())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Run chainguard on tests/fixtures and validate the reports");
    eprintln!("  explain-coverage  Validate all reason codes have explanations");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(String::as_str).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}

use anyhow::Context;
use chainguard_render::{
    RenderableAttestation, RenderableData, RenderableLocation, RenderableReport, RenderableVerdict,
};
use chainguard_types::{
    AttestationOutcome, ChainguardReport, SCHEMA_REPORT_V1, VerdictEntry, lookup_explanation,
};

pub fn parse_report_json(text: &str) -> anyhow::Result<ChainguardReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: '{schema}' (expected {SCHEMA_REPORT_V1})");
    }

    serde_json::from_value(value).context("parse chainguard v1 report")
}

pub fn serialize_report(report: &ChainguardReport) -> anyhow::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(report).context("serialize report")?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn to_renderable(report: &ChainguardReport) -> RenderableReport {
    RenderableReport {
        decision: report.decision.status,
        failing: report.decision.failing.clone(),
        verdicts: report.verdicts.iter().map(renderable_verdict).collect(),
        data: RenderableData {
            profile: report.data.profile.clone(),
            manifest: report.data.manifest.as_str().to_string(),
            artifacts_scanned: report.data.artifacts_scanned,
            attestations_scanned: report.data.attestations_scanned,
            attestations_valid: report.data.attestations_valid,
        },
    }
}

fn renderable_verdict(v: &VerdictEntry) -> RenderableVerdict {
    RenderableVerdict {
        label: v.artifact.label(),
        digest: v.artifact.digest.as_ref().map(|d| d.to_string()),
        status: v.status,
        code: v.code.clone(),
        message: v.message.clone(),
        location: v.location.as_ref().map(|loc| RenderableLocation {
            path: loc.path.as_str().to_string(),
            line: loc.line,
            col: loc.col,
        }),
        untrusted_dependencies: v.untrusted_dependencies.clone(),
        attestations: v.attestations.iter().map(renderable_attestation).collect(),
        help: v.code.as_deref().and_then(help_for_code),
    }
}

fn renderable_attestation(a: &AttestationOutcome) -> RenderableAttestation {
    RenderableAttestation {
        source: a.source.as_str().to_string(),
        kind: a.kind.clone(),
        signer: a.signer.clone(),
        status: a.status,
        code: a.code.clone(),
        message: a.message.clone(),
    }
}

fn help_for_code(code: &str) -> Option<String> {
    lookup_explanation(code)
        .map(|exp| format!("{}. Run `chainguard explain {code}` for remediation.", exp.title))
}

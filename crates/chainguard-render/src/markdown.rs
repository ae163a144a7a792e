use crate::{RenderableReport, RenderableVerdict};
use chainguard_types::{AttestationStatus, TrustStatus};

fn status_label(status: TrustStatus) -> &'static str {
    match status {
        TrustStatus::Trusted => "TRUSTED",
        TrustStatus::Untrusted => "UNTRUSTED",
        TrustStatus::Unknown => "UNKNOWN",
    }
}

fn attestation_label(status: AttestationStatus) -> &'static str {
    match status {
        AttestationStatus::Valid => "valid",
        AttestationStatus::Invalid => "invalid",
        AttestationStatus::Absent => "absent",
    }
}

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Chainguard report\n\n");
    out.push_str(&format!(
        "- Decision: **{}**\n- Profile: `{}`\n- Manifest: `{}`\n- Artifacts: {} scanned\n- Attestations: {} valid / {} scanned\n\n",
        status_label(report.decision),
        report.data.profile,
        report.data.manifest,
        report.data.artifacts_scanned,
        report.data.attestations_valid,
        report.data.attestations_scanned,
    ));

    if report.verdicts.is_empty() {
        out.push_str("No artifacts in scope.\n");
        return out;
    }

    if !report.failing.is_empty() {
        out.push_str("## Failing artifacts\n\n");
        for label in &report.failing {
            out.push_str(&format!("- `{label}`\n"));
        }
        out.push('\n');
    }

    out.push_str("## Verdicts\n\n");
    for v in &report.verdicts {
        render_verdict(&mut out, v);
    }

    out
}

fn render_verdict(out: &mut String, v: &RenderableVerdict) {
    let code = v
        .code
        .as_deref()
        .map(|c| format!(" `{c}`"))
        .unwrap_or_default();
    let at = match &v.location {
        Some(loc) => match loc.line {
            Some(line) => format!(" (`{}`:{})", loc.path, line),
            None => format!(" (`{}`)", loc.path),
        },
        None => String::new(),
    };
    out.push_str(&format!(
        "- [{}] `{}`{} - {}{}\n",
        status_label(v.status),
        v.label,
        code,
        v.message,
        at
    ));

    if let Some(digest) = &v.digest {
        out.push_str(&format!("  - digest: `{digest}`\n"));
    }
    if !v.untrusted_dependencies.is_empty() {
        out.push_str(&format!(
            "  - untrusted dependencies: {}\n",
            v.untrusted_dependencies
                .iter()
                .map(|d| format!("`{d}`"))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    for a in &v.attestations {
        let mut detail = Vec::new();
        if let Some(kind) = &a.kind {
            detail.push(kind.clone());
        }
        if let Some(signer) = &a.signer {
            detail.push(format!("signer {signer}"));
        }
        let detail = if detail.is_empty() {
            String::new()
        } else {
            format!(" ({})", detail.join(", "))
        };
        let code = a
            .code
            .as_deref()
            .map(|c| format!(" `{c}`"))
            .unwrap_or_default();
        out.push_str(&format!(
            "  - attestation `{}`{}: {}{} - {}\n",
            a.source,
            detail,
            attestation_label(a.status),
            code,
            a.message
        ));
    }
    if let Some(help) = &v.help {
        out.push_str(&format!("  - help: {help}\n"));
    }
}

use crate::RenderableReport;
use chainguard_types::TrustStatus;

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Render non-trusted verdicts as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level} file={path},line={line}::{message}`
///
/// Untrusted verdicts are errors; unknown placeholders are warnings. Trusted
/// verdicts produce nothing.
pub fn render_github_annotations(report: &RenderableReport) -> Vec<String> {
    let mut out = Vec::new();

    for v in &report.verdicts {
        let level = match v.status {
            TrustStatus::Trusted => continue,
            TrustStatus::Untrusted => "error",
            TrustStatus::Unknown => "warning",
        };

        let mut meta = String::new();
        if let Some(loc) = &v.location {
            meta.push_str(&format!("file={}", loc.path));
            if let Some(line) = loc.line {
                meta.push_str(&format!(",line={line}"));
            }
            if let Some(col) = loc.col {
                meta.push_str(&format!(",col={col}"));
            }
        }

        let code = v.code.as_deref().unwrap_or(v.status.as_str());
        let message = escape_data(&format!("[chainguard:{}] {}: {}", code, v.label, v.message));

        if meta.is_empty() {
            out.push(format!("::{level}::{message}"));
        } else {
            out.push(format!("::{level} {meta}::{message}"));
        }
    }

    out
}

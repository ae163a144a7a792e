//! The `explain` use case: look up reason code documentation.

use chainguard_types::explain::{self, Explanation};

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found(Explanation),
    /// Unknown identifier; includes the known codes.
    NotFound {
        identifier: String,
        available_codes: &'static [&'static str],
    },
}

pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier.trim()) {
        Some(exp) => ExplainOutput::Found(exp),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_codes: explain::all_codes(),
        },
    }
}

/// Format an explanation for terminal display.
pub fn format_explanation(exp: &Explanation) -> String {
    let mut out = String::new();

    out.push_str(exp.title);
    out.push('\n');
    out.push_str(&"=".repeat(exp.title.len()));
    out.push_str("\n\n");
    out.push_str(exp.description);
    out.push_str("\n\nRemediation\n-----------\n");
    out.push_str(exp.remediation);
    out.push_str("\n\nExamples\n--------\n\n");
    out.push_str("Before:\n```toml\n");
    out.push_str(exp.examples.before);
    out.push_str("\n```\n\nAfter:\n```toml\n");
    out.push_str(exp.examples.after);
    out.push_str("\n```\n");

    out
}

pub fn format_not_found(identifier: &str, codes: &[&'static str]) -> String {
    let mut out = format!("Unknown reason code: {identifier}\n\nAvailable codes:\n");
    for code in codes {
        out.push_str(&format!("  - {code}\n"));
    }
    out
}

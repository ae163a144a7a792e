//! Render use cases: markdown and GitHub annotations, plus artifact writing.

use anyhow::Context;
use camino::Utf8Path;
use chainguard_render::RenderableReport;
use chainguard_types::ChainguardReport;

pub fn render_markdown(report: &RenderableReport) -> String {
    chainguard_render::render_markdown(report)
}

pub fn render_annotations(report: &RenderableReport, max: usize) -> Vec<String> {
    chainguard_render::render_github_annotations(report)
        .into_iter()
        .take(max)
        .collect()
}

/// Write the JSON report, creating parent directories.
pub fn write_report(path: &Utf8Path, report: &ChainguardReport) -> anyhow::Result<()> {
    let data = crate::serialize_report(report)?;
    write_bytes(path, &data).with_context(|| format!("write report: {path}"))
}

pub fn write_text(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    write_bytes(path, text.as_bytes()).with_context(|| format!("write text: {path}"))
}

fn write_bytes(path: &Utf8Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

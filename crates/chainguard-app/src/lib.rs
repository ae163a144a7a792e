//! Use case orchestration for chainguard.
//!
//! This crate provides the application layer: use cases that coordinate the domain, repo, and
//! render layers. It is intentionally thin and delegates heavy lifting to the appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing, signals and exit codes.

#![forbid(unsafe_code)]

mod error;
mod explain;
mod render;
mod report;
mod verify;

pub use chainguard_domain::run::CancellationToken;
pub use error::ChainguardError;
pub use explain::{ExplainOutput, format_explanation, format_not_found, run_explain};
pub use render::{render_annotations, render_markdown, write_report, write_text};
pub use report::{parse_report_json, serialize_report, to_renderable};
pub use verify::{VerifyInput, VerifyOutput, decision_exit_code, run_verify};

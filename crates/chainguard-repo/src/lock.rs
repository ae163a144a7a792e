//! `chainguard.lock` parsing with line tracking.

use crate::ResolutionError;
use chainguard_types::RepoPath;
use chainguard_types::ids::SCHEMA_LOCK_V1;
use toml_edit::{ImDocument, Item, Table};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LockFile {
    pub schema: Option<String>,
    /// `name@version` or digest references; empty means every artifact is in scope.
    pub targets: Vec<String>,
    /// Discovery globs for attestation files, relative to the repo root.
    pub attestation_globs: Vec<String>,
    pub artifacts: Vec<LockArtifact>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LockArtifact {
    pub name: String,
    pub version: String,
    pub digest: String,
    pub origin: Option<String>,
    pub path: Option<String>,
    pub dependencies: Vec<String>,
    pub attestations: Vec<String>,
    pub line: Option<u32>,
}

impl LockArtifact {
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Calculate the 1-based line number from a byte offset in the source text.
fn byte_offset_to_line(source: &str, offset: usize) -> u32 {
    let line_count = source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count();
    (line_count + 1) as u32
}

pub fn parse_lock(manifest_path: &RepoPath, text: &str) -> Result<LockFile, ResolutionError> {
    let fail = |message: String| ResolutionError::ManifestParse {
        path: manifest_path.as_str().to_string(),
        message,
    };

    let doc: ImDocument<&str> = ImDocument::parse(text).map_err(|e| fail(e.to_string()))?;

    let schema = doc.get("schema").and_then(Item::as_str).map(str::to_string);
    if let Some(s) = schema.as_deref()
        && s != SCHEMA_LOCK_V1
    {
        return Err(fail(format!(
            "unsupported schema '{s}' (expected {SCHEMA_LOCK_V1})"
        )));
    }

    let targets = string_list(doc.get("targets"), "targets").map_err(&fail)?;
    let attestation_globs = string_list(doc.get("attestations"), "attestations").map_err(&fail)?;

    let mut artifacts = Vec::new();
    match doc.get("artifact") {
        None => {}
        Some(Item::ArrayOfTables(tables)) => {
            for (i, table) in tables.iter().enumerate() {
                artifacts.push(parse_artifact(table, i, text).map_err(&fail)?);
            }
        }
        Some(_) => return Err(fail("`artifact` must be an array of [[artifact]] tables".to_string())),
    }

    Ok(LockFile {
        schema,
        targets,
        attestation_globs,
        artifacts,
    })
}

fn parse_artifact(table: &Table, index: usize, source: &str) -> Result<LockArtifact, String> {
    let required = |key: &str| -> Result<String, String> {
        table
            .get(key)
            .and_then(Item::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("artifact #{} is missing string field `{key}`", index + 1))
    };
    let optional = |key: &str| table.get(key).and_then(Item::as_str).map(str::to_string);

    let line = table
        .get("name")
        .and_then(|item| item.span())
        .map(|span| byte_offset_to_line(source, span.start));

    Ok(LockArtifact {
        name: required("name")?,
        version: required("version")?,
        digest: required("digest")?,
        origin: optional("origin"),
        path: optional("path"),
        dependencies: string_list(table.get("dependencies"), "dependencies")?,
        attestations: string_list(table.get("attestations"), "attestations")?,
        line,
    })
}

fn string_list(item: Option<&Item>, key: &str) -> Result<Vec<String>, String> {
    let Some(item) = item else {
        return Ok(Vec::new());
    };
    let arr = item
        .as_array()
        .ok_or_else(|| format!("`{key}` must be an array of strings"))?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("`{key}` must be an array of strings"))
        })
        .collect()
}

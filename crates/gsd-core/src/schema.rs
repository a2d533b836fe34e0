//! Required-field validation for planning documents: set-difference over
//! the parsed frontmatter, layered on top of the parser's output.

use crate::error::{GsdError, Result};
use crate::frontmatter::Mapping;
use serde::Serialize;

const PLAN_FIELDS: &[&str] = &[
    "phase",
    "plan",
    "type",
    "wave",
    "depends_on",
    "files_modified",
    "autonomous",
    "must_haves",
];

const SUMMARY_FIELDS: &[&str] = &[
    "phase",
    "plan",
    "subsystem",
    "tags",
    "duration",
    "completed",
];

#[derive(Debug, Serialize)]
pub struct SchemaReport {
    pub valid: bool,
    pub missing: Vec<String>,
}

/// Check the mapping against the named document kind (`plan` or `summary`).
/// Unknown kinds are a hard error — the caller chose the schema, not the
/// document.
pub fn validate(map: &Mapping, kind: &str) -> Result<SchemaReport> {
    let required = match kind {
        "plan" => PLAN_FIELDS,
        "summary" => SUMMARY_FIELDS,
        other => return Err(GsdError::UnknownSchema(other.to_string())),
    };
    let missing: Vec<String> = required
        .iter()
        .filter(|f| !map.contains_key(f))
        .map(|f| f.to_string())
        .collect();
    Ok(SchemaReport {
        valid: missing.is_empty(),
        missing,
    })
}

//! Requirement check-off in `.planning/REQUIREMENTS.md`: flip checkbox
//! bullets and traceability-table status cells by requirement ID.

use crate::error::Result;
use crate::io::atomic_write;
use crate::paths;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct MarkCompleteOutcome {
    pub updated: bool,
    pub marked_complete: Vec<String>,
    pub not_found: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Normalize requirement-ID input: tokens may be comma-separated, space
/// separated, or a bracket-wrapped list (`[REQ-01, REQ-02]`).
pub fn parse_ids(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .flat_map(|t| t.split(','))
        .map(|t| t.trim().trim_matches(|c| c == '[' || c == ']').trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Mark the given requirement IDs complete: `- [ ] **REQ-NN**` becomes
/// `- [x]`, and a table row carrying the ID has its `Pending` cell flipped
/// to `Complete`. Unknown IDs are reported, not errors.
pub fn mark_complete(root: &Path, ids: &[String]) -> Result<MarkCompleteOutcome> {
    let path = paths::requirements_path(root);
    if !path.exists() {
        return Ok(MarkCompleteOutcome {
            updated: false,
            marked_complete: Vec::new(),
            not_found: Vec::new(),
            reason: Some("REQUIREMENTS.md not found".to_string()),
        });
    }

    let text = std::fs::read_to_string(&path)?;
    let mut lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    let mut marked = Vec::new();
    let mut not_found = Vec::new();

    for id in ids {
        let mut found = false;
        for line in lines.iter_mut() {
            if checkbox_for(line, id) {
                *line = line.replacen("- [ ]", "- [x]", 1);
                found = true;
            } else if table_row_for(line, id) {
                if let Some(flipped) = flip_pending_cell(line) {
                    *line = flipped;
                    found = true;
                }
            }
        }
        if found {
            marked.push(id.clone());
        } else {
            not_found.push(id.clone());
        }
    }

    let updated = !marked.is_empty();
    if updated {
        let mut result = lines.join("\n");
        if text.ends_with('\n') {
            result.push('\n');
        }
        atomic_write(&path, result.as_bytes())?;
    }

    Ok(MarkCompleteOutcome {
        updated,
        marked_complete: marked,
        not_found,
        reason: None,
    })
}

fn checkbox_for(line: &str, id: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("- [ ]") && trimmed.contains(&format!("**{id}**"))
}

fn table_row_for(line: &str, id: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('|') && trimmed.split('|').any(|cell| cell.trim() == id)
}

fn flip_pending_cell(line: &str) -> Option<String> {
    let pos = line.rfind("Pending")?;
    let mut out = String::with_capacity(line.len() + 1);
    out.push_str(&line[..pos]);
    out.push_str("Complete");
    out.push_str(&line[pos + "Pending".len()..]);
    Some(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

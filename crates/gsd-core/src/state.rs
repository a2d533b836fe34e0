//! Operations on `.planning/STATE.md` — a human-readable markdown state
//! file mutated incrementally over a project's lifetime. All edits are
//! line-oriented patches on the raw text (bold fields, `##` sections,
//! bullet lists, tables); the file is never reflowed, and literal text
//! such as dollar amounts passes through untouched.

use crate::error::{GsdError, Result};
use crate::io::atomic_write;
use crate::paths;
use crate::phases;
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub phase: String,
    pub summary: String,
    pub rationale: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Session {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct StateSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_phases: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_plans_in_phase: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<String>,
    pub decisions: Vec<Decision>,
    pub blockers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

// ---------------------------------------------------------------------------
// Text primitives
// ---------------------------------------------------------------------------

/// Read a `**Field Name:** value` line.
pub fn bold_field(text: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r"(?m)^\*\*{}:\*\*[ \t]*(.*)$",
        regex::escape(name)
    ))
    .ok()?;
    re.captures(text)
        .map(|c| c[1].trim_end_matches('\r').trim().to_string())
}

/// Rewrite a `**Field Name:** value` line. The replacement is spliced as
/// literal text, so values containing `$` survive verbatim. Returns `None`
/// when the field is absent.
pub fn set_bold_field(text: &str, name: &str, value: &str) -> Option<String> {
    let re = Regex::new(&format!(r"(?m)^\*\*{}:\*\*.*$", regex::escape(name))).ok()?;
    let m = re.find(text)?;
    let mut out = String::with_capacity(text.len() + value.len());
    out.push_str(&text[..m.start()]);
    out.push_str(&format!("**{name}:** {value}"));
    out.push_str(&text[m.end()..]);
    Some(out)
}

/// Body text of the first `## Heading` whose title starts with `name`
/// (so `Decisions` also matches `Decisions Made`).
pub fn section(text: &str, name: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let (start, end) = section_bounds(&lines, name)?;
    Some(lines[start + 1..end].join("\n"))
}

fn section_bounds(lines: &[&str], name: &str) -> Option<(usize, usize)> {
    let start = lines.iter().position(|l| {
        l.strip_prefix("## ")
            .is_some_and(|title| title.trim().starts_with(name))
    })?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.starts_with("## "))
        .map(|p| start + 1 + p)
        .unwrap_or(lines.len());
    Some((start, end))
}

/// Append a line to a section's list, dropping any placeholder lines
/// (`None`, `No decisions yet.`, …). The heading itself is never touched,
/// so it cannot be duplicated.
fn append_to_section(
    text: &str,
    name: &str,
    entry: &str,
    placeholders: &[&str],
) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let (start, end) = section_bounds(&lines, name)?;

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 1);
    out.extend(lines[..=start].iter().map(|l| l.to_string()));

    let body: Vec<&str> = lines[start + 1..end]
        .iter()
        .filter(|l| !placeholders.contains(&l.trim()))
        .copied()
        .collect();
    let last_content = body.iter().rposition(|l| !l.trim().is_empty());
    let insert_at = last_content.map(|p| p + 1).unwrap_or(0);
    out.extend(body[..insert_at].iter().map(|l| l.to_string()));
    out.push(entry.to_string());
    out.extend(body[insert_at..].iter().map(|l| l.to_string()));

    out.extend(lines[end..].iter().map(|l| l.to_string()));
    let mut result = out.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    Some(result)
}

fn read_state(root: &Path) -> Result<String> {
    let path = paths::state_path(root);
    if !path.exists() {
        return Err(GsdError::StateNotFound);
    }
    Ok(std::fs::read_to_string(&path)?)
}

fn write_state(root: &Path, text: &str) -> Result<()> {
    atomic_write(&paths::state_path(root), text.as_bytes())
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Extract a structured snapshot from STATE.md text. Every field is
/// best-effort; nothing here fails.
pub fn snapshot(text: &str) -> StateSnapshot {
    let parse_u32 = |s: String| s.parse::<u32>().ok();

    let decisions = section(text, "Decisions")
        .map(|body| parse_decision_table(&body))
        .unwrap_or_default();

    let blockers = section(text, "Blockers")
        .map(|body| parse_bullets(&body))
        .unwrap_or_default();

    let session = section(text, "Session").map(|body| Session {
        last_date: bold_field(&body, "Last Date"),
        stopped_at: bold_field(&body, "Stopped At"),
        resume_file: bold_field(&body, "Resume File"),
    });

    StateSnapshot {
        current_phase: bold_field(text, "Current Phase"),
        current_phase_name: bold_field(text, "Current Phase Name"),
        total_phases: bold_field(text, "Total Phases").and_then(parse_u32),
        current_plan: bold_field(text, "Current Plan"),
        total_plans_in_phase: bold_field(text, "Total Plans in Phase").and_then(parse_u32),
        status: bold_field(text, "Status"),
        progress_percent: bold_field(text, "Progress")
            .map(|s| s.trim_end_matches('%').to_string())
            .and_then(parse_u32),
        last_activity: bold_field(text, "Last Activity"),
        last_activity_description: bold_field(text, "Last Activity Description"),
        paused_at: bold_field(text, "Paused At"),
        decisions,
        blockers,
        session,
    }
}

fn parse_decision_table(body: &str) -> Vec<Decision> {
    let mut rows = Vec::new();
    let mut seen_header = false;
    for line in body.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            continue;
        }
        let cells: Vec<&str> = trimmed
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim())
            .collect();
        if cells
            .iter()
            .all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-'))
        {
            continue; // separator row
        }
        if !seen_header {
            seen_header = true;
            continue;
        }
        if cells.len() >= 3 {
            rows.push(Decision {
                phase: cells[0].to_string(),
                summary: cells[1].to_string(),
                rationale: cells[2].to_string(),
            });
        }
    }
    rows
}

fn parse_bullets(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|l| l.trim().strip_prefix("- "))
        .filter(|item| *item != "None")
        .map(|item| item.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Field operations
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct UpdateOutcome {
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Patch a single bold field. Missing file or field is a soft outcome, not
/// an error — STATE.md is hand-edited and fields come and go.
pub fn update_field(root: &Path, name: &str, value: &str) -> Result<UpdateOutcome> {
    let text = match read_state(root) {
        Ok(t) => t,
        Err(GsdError::StateNotFound) => {
            return Ok(UpdateOutcome {
                updated: false,
                reason: Some("STATE.md not found".to_string()),
            })
        }
        Err(e) => return Err(e),
    };
    match set_bold_field(&text, name, value) {
        Some(updated) => {
            write_state(root, &updated)?;
            Ok(UpdateOutcome {
                updated: true,
                reason: None,
            })
        }
        None => Ok(UpdateOutcome {
            updated: false,
            reason: Some(format!("field '{name}' not found")),
        }),
    }
}

#[derive(Debug, Serialize)]
pub struct PatchOutcome {
    pub updated: Vec<String>,
    pub failed: Vec<String>,
}

/// Patch several bold fields in one pass; reports which stuck.
pub fn patch_fields(root: &Path, fields: &[(String, String)]) -> Result<PatchOutcome> {
    let mut text = read_state(root)?;
    let mut outcome = PatchOutcome {
        updated: Vec::new(),
        failed: Vec::new(),
    };
    for (name, value) in fields {
        match set_bold_field(&text, name, value) {
            Some(next) => {
                text = next;
                outcome.updated.push(name.clone());
            }
            None => outcome.failed.push(name.clone()),
        }
    }
    if !outcome.updated.is_empty() {
        write_state(root, &text)?;
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Plan advancement
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AdvanceOutcome {
    pub advanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_plan: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Move to the next plan, or mark the phase complete when already on the
/// last one.
pub fn advance_plan(root: &Path) -> Result<AdvanceOutcome> {
    let text = read_state(root)?;
    let current = bold_field(&text, "Current Plan").and_then(|s| s.parse::<u32>().ok());
    let total = bold_field(&text, "Total Plans in Phase").and_then(|s| s.parse::<u32>().ok());
    let (Some(current), Some(total)) = (current, total) else {
        return Err(GsdError::CannotParse(
            "Current Plan / Total Plans in Phase".to_string(),
        ));
    };

    if current >= total {
        let mut updated =
            set_bold_field(&text, "Status", "Phase complete - ready for verification")
                .unwrap_or(text);
        if let Some(next) = set_bold_field(&updated, "Last Activity", &today()) {
            updated = next;
        }
        write_state(root, &updated)?;
        return Ok(AdvanceOutcome {
            advanced: false,
            previous_plan: None,
            current_plan: None,
            reason: Some("last_plan".to_string()),
            status: Some("ready_for_verification".to_string()),
        });
    }

    let next_plan = current + 1;
    let mut updated =
        set_bold_field(&text, "Current Plan", &next_plan.to_string()).unwrap_or(text);
    if let Some(next) = set_bold_field(&updated, "Status", "Ready to execute") {
        updated = next;
    }
    if let Some(next) = set_bold_field(&updated, "Last Activity", &today()) {
        updated = next;
    }
    write_state(root, &updated)?;
    Ok(AdvanceOutcome {
        advanced: true,
        previous_plan: Some(current),
        current_plan: Some(next_plan),
        reason: None,
        status: None,
    })
}

// ---------------------------------------------------------------------------
// Metrics / progress
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MetricOutcome {
    pub recorded: bool,
}

/// Append a row to the `## Performance Metrics` table.
pub fn record_metric(
    root: &Path,
    phase: &str,
    plan: &str,
    duration: &str,
    tasks: Option<&str>,
    files: Option<&str>,
) -> Result<MetricOutcome> {
    let text = read_state(root)?;
    let row = format!(
        "| Phase {phase} P{plan} | {duration} | {} | {} |",
        tasks.unwrap_or("-"),
        files.unwrap_or("-")
    );
    let updated = append_to_section(&text, "Performance Metrics", &row, &["None yet"])
        .ok_or_else(|| GsdError::CannotParse("no Performance Metrics section".to_string()))?;
    write_state(root, &updated)?;
    Ok(MetricOutcome { recorded: true })
}

#[derive(Debug, Serialize)]
pub struct ProgressOutcome {
    pub updated: bool,
    pub percent: u32,
    pub completed: usize,
    pub total: usize,
}

/// Recompute progress from plan/summary counts and patch `**Progress:**`.
pub fn update_progress(root: &Path) -> Result<ProgressOutcome> {
    let progress = phases::compute_progress(root)?;
    let text = read_state(root)?;
    let updated = match set_bold_field(&text, "Progress", &format!("{}%", progress.percent)) {
        Some(next) => {
            write_state(root, &next)?;
            true
        }
        None => false,
    };
    Ok(ProgressOutcome {
        updated,
        percent: progress.percent,
        completed: progress.completed,
        total: progress.total,
    })
}

// ---------------------------------------------------------------------------
// Decisions / blockers
// ---------------------------------------------------------------------------

const DECISION_PLACEHOLDERS: &[&str] = &["None", "No decisions yet.", "No decisions yet"];
const BLOCKER_PLACEHOLDERS: &[&str] = &["None", "No blockers.", "No blockers"];

/// Append a decision bullet: `- [Phase NN]: summary — rationale`.
pub fn add_decision(
    root: &Path,
    phase: &str,
    summary: &str,
    rationale: Option<&str>,
) -> Result<bool> {
    let text = read_state(root)?;
    let entry = match rationale {
        Some(rationale) => format!("- [Phase {phase}]: {summary} — {rationale}"),
        None => format!("- [Phase {phase}]: {summary}"),
    };
    match append_to_section(&text, "Decisions", &entry, DECISION_PLACEHOLDERS) {
        Some(updated) => {
            write_state(root, &updated)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub fn add_blocker(root: &Path, blocker: &str) -> Result<bool> {
    let text = read_state(root)?;
    let entry = format!("- {blocker}");
    match append_to_section(&text, "Blockers", &entry, BLOCKER_PLACEHOLDERS) {
        Some(updated) => {
            write_state(root, &updated)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Remove the first blocker bullet containing `needle`; re-insert the
/// `None` placeholder when the list empties.
pub fn resolve_blocker(root: &Path, needle: &str) -> Result<bool> {
    let text = read_state(root)?;
    let lines: Vec<&str> = text.lines().collect();
    let Some((start, end)) = section_bounds(&lines, "Blockers") else {
        return Ok(false);
    };
    let Some(hit) = lines[start + 1..end]
        .iter()
        .position(|l| l.trim().starts_with("- ") && l.contains(needle))
        .map(|p| start + 1 + p)
    else {
        return Ok(false);
    };

    let mut out: Vec<String> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != hit)
        .map(|(_, l)| l.to_string())
        .collect();

    let remaining = lines[start + 1..end]
        .iter()
        .enumerate()
        .filter(|(i, _)| start + 1 + i != hit)
        .filter(|(_, l)| l.trim().starts_with("- "))
        .count();
    if remaining == 0 {
        // `hit` is gone, so indices up to it are unshifted.
        out.insert(hit, "None".to_string());
    }

    let mut result = out.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    write_state(root, &result)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionOutcome {
    pub recorded: bool,
    pub updated: Vec<String>,
}

/// Record where work stopped so the next session can resume. Dates are
/// stamped with today; only fields present in the file are touched.
pub fn record_session(
    root: &Path,
    stopped_at: Option<&str>,
    resume_file: Option<&str>,
) -> Result<SessionOutcome> {
    let mut text = read_state(root)?;
    let mut updated = Vec::new();

    let date = today();
    for field in ["Last session", "Last Date"] {
        if let Some(next) = set_bold_field(&text, field, &date) {
            text = next;
            updated.push(field.to_string());
        }
    }
    if let Some(value) = stopped_at {
        if let Some(next) = set_bold_field(&text, "Stopped At", value) {
            text = next;
            updated.push("Stopped At".to_string());
        }
    }
    if let Some(value) = resume_file {
        if let Some(next) = set_bold_field(&text, "Resume File", value) {
            text = next;
            updated.push("Resume File".to_string());
        }
    }

    let recorded = !updated.is_empty();
    if recorded {
        write_state(root, &text)?;
    }
    Ok(SessionOutcome { recorded, updated })
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LoadOutput {
    pub config: crate::config::PlanningConfig,
    pub config_exists: bool,
    pub state_exists: bool,
    pub roadmap_exists: bool,
    pub state_raw: String,
    pub roadmap_raw: String,
}

/// Gather everything a session needs to orient: config (with defaults),
/// plus raw STATE.md and ROADMAP.md contents when present.
pub fn load(root: &Path) -> Result<LoadOutput> {
    let (config, config_exists) = crate::config::PlanningConfig::load(root)?;
    let state_path = paths::state_path(root);
    let roadmap_path = paths::roadmap_path(root);
    let state_exists = state_path.exists();
    let roadmap_exists = roadmap_path.exists();
    Ok(LoadOutput {
        config,
        config_exists,
        state_exists,
        roadmap_exists,
        state_raw: if state_exists {
            std::fs::read_to_string(&state_path)?
        } else {
            String::new()
        },
        roadmap_raw: if roadmap_exists {
            std::fs::read_to_string(&roadmap_path)?
        } else {
            String::new()
        },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

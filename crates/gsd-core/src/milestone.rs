//! Milestone completion: archive the roadmap era that just shipped and
//! record it in MILESTONES.md. Archiving is whole-file moves into
//! `.planning/milestones/`; the milestone entry is appended, never
//! rewritten.

use crate::error::Result;
use crate::io::{append_text, atomic_write, ensure_dir};
use crate::paths;
use crate::phases;
use crate::state;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Default, Serialize)]
pub struct ArchivedFlags {
    pub roadmap: bool,
    pub requirements: bool,
    pub audit: bool,
    pub phases: bool,
}

#[derive(Debug, Serialize)]
pub struct MilestoneOutcome {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub phases: usize,
    pub plans: usize,
    pub tasks: usize,
    pub archived: ArchivedFlags,
    pub milestones_updated: bool,
}

/// Complete a milestone: gather stats and accomplishments from the phase
/// directories, archive the roadmap/requirements/audit files, append the
/// MILESTONES.md entry, and stamp STATE.md.
pub fn complete(
    root: &Path,
    version: &str,
    name: Option<&str>,
    archive_phases: bool,
) -> Result<MilestoneOutcome> {
    // Stats come first: archiving moves the directories they read.
    let phase_dirs = phases::phase_dirs(root)?;
    let mut plans = 0;
    let mut tasks = 0;
    let mut accomplishments = Vec::new();
    for dir in &phase_dirs {
        plans += count_plans(dir)?;
        tasks += phases::count_tasks(dir)?;
        accomplishments.extend(phases::collect_one_liners(dir)?);
    }

    let milestones_dir = paths::milestones_dir(root);
    ensure_dir(&milestones_dir)?;

    let mut archived = ArchivedFlags::default();
    archived.roadmap = archive_file(
        &paths::roadmap_path(root),
        &milestones_dir.join(format!("{version}-ROADMAP.md")),
    )?;
    archived.requirements = archive_file(
        &paths::requirements_path(root),
        &milestones_dir.join(format!("{version}-REQUIREMENTS.md")),
    )?;
    archived.audit = archive_file(
        &paths::planning_dir(root).join(format!("{version}-MILESTONE-AUDIT.md")),
        &milestones_dir.join(format!("{version}-MILESTONE-AUDIT.md")),
    )?;

    if archive_phases && !phase_dirs.is_empty() {
        let target = milestones_dir.join(format!("{version}-phases"));
        ensure_dir(&target)?;
        for dir in &phase_dirs {
            if let Some(dir_name) = dir.file_name() {
                std::fs::rename(dir, target.join(dir_name))?;
            }
        }
        archived.phases = true;
    }

    append_milestone_entry(
        root,
        version,
        name,
        phase_dirs.len(),
        plans,
        tasks,
        &accomplishments,
    )?;
    stamp_state(root, version)?;

    Ok(MilestoneOutcome {
        version: version.to_string(),
        name: name.map(|n| n.to_string()),
        phases: phase_dirs.len(),
        plans,
        tasks,
        archived,
        milestones_updated: true,
    })
}

fn count_plans(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if paths::plan_file_re().is_match(&file_name) {
            count += 1;
        }
    }
    Ok(count)
}

fn archive_file(from: &Path, to: &Path) -> Result<bool> {
    if !from.exists() {
        return Ok(false);
    }
    std::fs::rename(from, to)?;
    Ok(true)
}

fn append_milestone_entry(
    root: &Path,
    version: &str,
    name: Option<&str>,
    phase_count: usize,
    plans: usize,
    tasks: usize,
    accomplishments: &[String],
) -> Result<()> {
    let path = paths::milestones_path(root);
    if !path.exists() {
        atomic_write(&path, b"# Milestones\n\n")?;
    }

    let date = Utc::now().format("%Y-%m-%d");
    let title = match name {
        Some(name) => format!("{version} {name}"),
        None => version.to_string(),
    };
    let mut entry = format!("## {title} (Shipped: {date})\n\n");
    entry.push_str(&format!(
        "**Stats:** {phase_count} phases, {plans} plans, {tasks} tasks\n"
    ));
    if !accomplishments.is_empty() {
        entry.push_str("\n**Accomplishments:**\n");
        for line in accomplishments {
            entry.push_str(&format!("- {line}\n"));
        }
    }
    entry.push_str("\n---\n\n");
    append_text(&path, &entry)
}

/// Best-effort STATE.md stamp; a project without STATE.md still completes.
fn stamp_state(root: &Path, version: &str) -> Result<()> {
    let path = paths::state_path(root);
    if !path.exists() {
        return Ok(());
    }
    let mut text = std::fs::read_to_string(&path)?;
    for (field, value) in [
        ("Status", format!("{version} milestone complete")),
        ("Last Activity", Utc::now().format("%Y-%m-%d").to_string()),
        (
            "Last Activity Description",
            format!("{version} milestone completed and archived"),
        ),
    ] {
        if let Some(next) = state::set_bold_field(&text, field, &value) {
            text = next;
        }
    }
    atomic_write(&path, text.as_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

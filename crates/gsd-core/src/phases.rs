//! Discovery over `.planning/phases/`: phase directories by number,
//! plan/summary listings, progress and task counting, and summary
//! one-liner collection for milestone accomplishments.

use crate::error::Result;
use crate::frontmatter::extract_frontmatter;
use crate::paths;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Phase lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PhaseInfo {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    pub plans: Vec<String>,
    pub summaries: Vec<String>,
}

impl PhaseInfo {
    fn not_found() -> Self {
        Self {
            found: false,
            phase_number: None,
            phase_name: None,
            directory: None,
            plans: Vec::new(),
            summaries: Vec::new(),
        }
    }
}

/// Find a phase directory by number (`3` matches `03-api-layer`). Reports
/// its plan and summary files sorted by name so callers can derive
/// incomplete plans.
pub fn find_phase(root: &Path, number: &str) -> Result<PhaseInfo> {
    let padded = paths::pad_phase(number);
    let Some(dir) = phase_dirs(root)?
        .into_iter()
        .find(|d| dir_number(d).as_deref() == Some(padded.as_str()))
    else {
        return Ok(PhaseInfo::not_found());
    };

    let dir_name = file_name(&dir);
    let caps = paths::phase_dir_re().captures(&dir_name);
    let (number, name) = match caps {
        Some(c) => (c[1].to_string(), c[2].to_string()),
        None => return Ok(PhaseInfo::not_found()),
    };

    Ok(PhaseInfo {
        found: true,
        phase_number: Some(number),
        phase_name: Some(name),
        directory: Some(dir.display().to_string()),
        plans: list_matching(&dir, |n| paths::plan_file_re().is_match(n))?,
        summaries: list_matching(&dir, |n| paths::summary_file_re().is_match(n))?,
    })
}

/// All phase directories under `.planning/phases/`, sorted by name.
pub fn phase_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let phases = paths::phases_dir(root);
    if !phases.exists() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(&phases)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && paths::phase_dir_re().is_match(&file_name(&entry.path()))
        {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

/// Progress across all phases: completed = summary count, total = plan
/// count. Zero plans is 0%, not a division error.
pub fn compute_progress(root: &Path) -> Result<Progress> {
    let mut completed = 0;
    let mut total = 0;
    for dir in phase_dirs(root)? {
        total += list_matching(&dir, |n| paths::plan_file_re().is_match(n))?.len();
        completed += list_matching(&dir, |n| paths::summary_file_re().is_match(n))?.len();
    }
    let percent = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };
    Ok(Progress {
        completed,
        total,
        percent,
    })
}

/// Count `## Task` headings across a phase directory's summary files.
pub fn count_tasks(dir: &Path) -> Result<usize> {
    let mut tasks = 0;
    for summary in list_matching(dir, |n| paths::summary_file_re().is_match(n))? {
        let content = std::fs::read_to_string(dir.join(&summary))?;
        tasks += content
            .lines()
            .filter(|l| l.trim_start().starts_with("## Task"))
            .count();
    }
    Ok(tasks)
}

/// Collect the `one-liner` frontmatter field from every summary in a phase
/// directory, in file order.
pub fn collect_one_liners(dir: &Path) -> Result<Vec<String>> {
    let mut one_liners = Vec::new();
    for summary in list_matching(dir, |n| paths::summary_file_re().is_match(n))? {
        let content = std::fs::read_to_string(dir.join(&summary))?;
        let map = extract_frontmatter(&content);
        if let Some(line) = map.get("one-liner").and_then(|v| v.as_scalar()) {
            if !line.is_empty() {
                one_liners.push(line.to_string());
            }
        }
    }
    Ok(one_liners)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dir_number(dir: &Path) -> Option<String> {
    paths::phase_dir_re()
        .captures(&file_name(dir))
        .map(|c| c[1].to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn list_matching(dir: &Path, matches: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_file() && matches(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PLANNING_DIR: &str = ".planning";
pub const PHASES_DIR: &str = ".planning/phases";
pub const MILESTONES_DIR: &str = ".planning/milestones";

pub const STATE_FILE: &str = ".planning/STATE.md";
pub const ROADMAP_FILE: &str = ".planning/ROADMAP.md";
pub const REQUIREMENTS_FILE: &str = ".planning/REQUIREMENTS.md";
pub const MILESTONES_FILE: &str = ".planning/MILESTONES.md";
pub const CONFIG_FILE: &str = ".planning/config.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn planning_dir(root: &Path) -> PathBuf {
    root.join(PLANNING_DIR)
}

pub fn phases_dir(root: &Path) -> PathBuf {
    root.join(PHASES_DIR)
}

pub fn milestones_dir(root: &Path) -> PathBuf {
    root.join(MILESTONES_DIR)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn roadmap_path(root: &Path) -> PathBuf {
    root.join(ROADMAP_FILE)
}

pub fn requirements_path(root: &Path) -> PathBuf {
    root.join(REQUIREMENTS_FILE)
}

pub fn milestones_path(root: &Path) -> PathBuf {
    root.join(MILESTONES_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Naming conventions
// ---------------------------------------------------------------------------

static PHASE_DIR_RE: OnceLock<Regex> = OnceLock::new();
static PLAN_FILE_RE: OnceLock<Regex> = OnceLock::new();
static SUMMARY_FILE_RE: OnceLock<Regex> = OnceLock::new();

/// Phase directories are named `NN-slug`, e.g. `03-api-layer`.
pub fn phase_dir_re() -> &'static Regex {
    PHASE_DIR_RE.get_or_init(|| Regex::new(r"^(\d{2})-(.+)$").unwrap())
}

/// Plan files are named `NN-MM-PLAN.md`.
pub fn plan_file_re() -> &'static Regex {
    PLAN_FILE_RE.get_or_init(|| Regex::new(r"^\d{2}-\d{2}-PLAN\.md$").unwrap())
}

/// Summary files are named `NN-MM-SUMMARY.md`.
pub fn summary_file_re() -> &'static Regex {
    SUMMARY_FILE_RE.get_or_init(|| Regex::new(r"^\d{2}-\d{2}-SUMMARY\.md$").unwrap())
}

/// Zero-pad a phase number to the two-digit directory convention.
pub fn pad_phase(number: &str) -> String {
    match number.parse::<u32>() {
        Ok(n) => format!("{n:02}"),
        Err(_) => number.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

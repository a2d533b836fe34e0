use crate::output::{print_error, print_json, print_kv};
use anyhow::{bail, Context};
use clap::Subcommand;
use gsd_core::{paths, state, GsdError};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum StateSubcommand {
    /// Structured snapshot of STATE.md (fields, decisions, blockers, session)
    Snapshot,

    /// Load config and planning-file existence for session startup
    Load {
        /// Emit key=value lines instead of JSON
        #[arg(long)]
        raw: bool,
    },

    /// Print STATE.md, or a named bold field / ## section
    Get { name: Option<String> },

    /// Update a single bold field
    Update { field: String, value: String },

    /// Patch several bold fields: --<Field> <value> pairs
    Patch {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
        args: Vec<String>,
    },

    /// Advance to the next plan, or mark the phase complete on the last one
    AdvancePlan,

    /// Append a row to the Performance Metrics table
    RecordMetric {
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        plan: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        tasks: Option<String>,
        #[arg(long)]
        files: Option<String>,
    },

    /// Recompute progress from plan/summary counts
    UpdateProgress,

    /// Record a decision (file variants bypass shell quoting)
    AddDecision {
        #[arg(long)]
        phase: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        summary_file: Option<PathBuf>,
        #[arg(long)]
        rationale: Option<String>,
        #[arg(long)]
        rationale_file: Option<PathBuf>,
    },

    /// Record a blocker
    AddBlocker {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        text_file: Option<PathBuf>,
    },

    /// Remove the first blocker containing the given text
    ResolveBlocker {
        #[arg(long)]
        text: String,
    },

    /// Record session continuity fields for the next session
    RecordSession {
        #[arg(long)]
        stopped_at: Option<String>,
        #[arg(long)]
        resume_file: Option<String>,
    },
}

pub fn run(root: &Path, subcommand: StateSubcommand) -> anyhow::Result<()> {
    match subcommand {
        StateSubcommand::Snapshot => snapshot(root),
        StateSubcommand::Load { raw } => load(root, raw),
        StateSubcommand::Get { name } => get(root, name.as_deref()),
        StateSubcommand::Update { field, value } => update(root, &field, &value),
        StateSubcommand::Patch { args } => patch(root, &args),
        StateSubcommand::AdvancePlan => advance_plan(root),
        StateSubcommand::RecordMetric {
            phase,
            plan,
            duration,
            tasks,
            files,
        } => record_metric(root, phase, plan, duration, tasks, files),
        StateSubcommand::UpdateProgress => update_progress(root),
        StateSubcommand::AddDecision {
            phase,
            summary,
            summary_file,
            rationale,
            rationale_file,
        } => add_decision(root, &phase, summary, summary_file, rationale, rationale_file),
        StateSubcommand::AddBlocker { text, text_file } => add_blocker(root, text, text_file),
        StateSubcommand::ResolveBlocker { text } => resolve_blocker(root, &text),
        StateSubcommand::RecordSession {
            stopped_at,
            resume_file,
        } => record_session(root, stopped_at.as_deref(), resume_file.as_deref()),
    }
}

fn read_state_text(root: &Path) -> Option<String> {
    std::fs::read_to_string(paths::state_path(root)).ok()
}

fn snapshot(root: &Path) -> anyhow::Result<()> {
    match read_state_text(root) {
        Some(text) => print_json(&state::snapshot(&text)),
        None => print_error("STATE.md not found"),
    }
}

fn load(root: &Path, raw: bool) -> anyhow::Result<()> {
    let output = state::load(root)?;
    if raw {
        print_kv(&[
            ("model_profile", output.config.model_profile.clone()),
            ("commit_docs", output.config.commit_docs.to_string()),
            ("research", output.config.research.to_string()),
            ("config_exists", output.config_exists.to_string()),
            ("state_exists", output.state_exists.to_string()),
            ("roadmap_exists", output.roadmap_exists.to_string()),
        ]);
        return Ok(());
    }
    print_json(&output)
}

fn get(root: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(paths::state_path(root))
        .context("failed to read .planning/STATE.md")?;
    match name {
        None => print_json(&serde_json::json!({ "content": text })),
        Some(name) => {
            let value = state::bold_field(&text, name).or_else(|| state::section(&text, name));
            match value {
                Some(value) => print_json(&serde_json::json!({ name: value })),
                None => print_error(format!("'{name}' not found in STATE.md")),
            }
        }
    }
}

fn update(root: &Path, field: &str, value: &str) -> anyhow::Result<()> {
    print_json(&state::update_field(root, field, value)?)
}

/// Pairs arrive as raw `--<Field> <value>` tokens so field names can be
/// anything STATE.md contains, including spaces (`--"Current Phase" 03`).
fn patch(root: &Path, args: &[String]) -> anyhow::Result<()> {
    let mut fields = Vec::new();
    let mut iter = args.iter();
    while let Some(token) = iter.next() {
        let Some(name) = token.strip_prefix("--") else {
            bail!("expected --<Field> before '{token}'");
        };
        let Some(value) = iter.next() else {
            bail!("missing value for --{name}");
        };
        fields.push((name.to_string(), value.clone()));
    }
    if fields.is_empty() {
        bail!("no fields given: expected --<Field> <value> pairs");
    }
    match state::patch_fields(root, &fields) {
        Ok(outcome) => print_json(&outcome),
        Err(GsdError::StateNotFound) => print_error("STATE.md not found"),
        Err(e) => Err(e.into()),
    }
}

fn advance_plan(root: &Path) -> anyhow::Result<()> {
    match state::advance_plan(root) {
        Ok(outcome) => print_json(&outcome),
        Err(e @ (GsdError::StateNotFound | GsdError::CannotParse(_))) => print_error(e),
        Err(e) => Err(e.into()),
    }
}

fn record_metric(
    root: &Path,
    phase: Option<String>,
    plan: Option<String>,
    duration: Option<String>,
    tasks: Option<String>,
    files: Option<String>,
) -> anyhow::Result<()> {
    let (Some(phase), Some(plan), Some(duration)) = (phase, plan, duration) else {
        return print_error("--phase, --plan, and --duration are required");
    };
    match state::record_metric(
        root,
        &phase,
        &plan,
        &duration,
        tasks.as_deref(),
        files.as_deref(),
    ) {
        Ok(outcome) => print_json(&outcome),
        Err(e @ (GsdError::StateNotFound | GsdError::CannotParse(_))) => print_error(e),
        Err(e) => Err(e.into()),
    }
}

fn update_progress(root: &Path) -> anyhow::Result<()> {
    match state::update_progress(root) {
        Ok(outcome) => print_json(&outcome),
        Err(GsdError::StateNotFound) => print_error("STATE.md not found"),
        Err(e) => Err(e.into()),
    }
}

/// Inline flag or file content; files exist so callers can pass text the
/// shell would otherwise mangle (dollar signs, quotes).
fn text_arg(
    inline: Option<String>,
    file: Option<PathBuf>,
    what: &str,
) -> anyhow::Result<Option<String>> {
    match (inline, file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {} file {}", what, path.display()))?;
            Ok(Some(content.trim_end().to_string()))
        }
        (None, None) => Ok(None),
    }
}

fn add_decision(
    root: &Path,
    phase: &str,
    summary: Option<String>,
    summary_file: Option<PathBuf>,
    rationale: Option<String>,
    rationale_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let Some(summary) = text_arg(summary, summary_file, "summary")? else {
        bail!("either --summary or --summary-file is required");
    };
    let rationale = text_arg(rationale, rationale_file, "rationale")?;
    match state::add_decision(root, phase, &summary, rationale.as_deref()) {
        Ok(added) => print_json(&serde_json::json!({ "added": added })),
        Err(GsdError::StateNotFound) => print_error("STATE.md not found"),
        Err(e) => Err(e.into()),
    }
}

fn add_blocker(
    root: &Path,
    text: Option<String>,
    text_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let Some(text) = text_arg(text, text_file, "blocker")? else {
        bail!("either --text or --text-file is required");
    };
    match state::add_blocker(root, &text) {
        Ok(added) => print_json(&serde_json::json!({ "added": added })),
        Err(GsdError::StateNotFound) => print_error("STATE.md not found"),
        Err(e) => Err(e.into()),
    }
}

fn resolve_blocker(root: &Path, text: &str) -> anyhow::Result<()> {
    match state::resolve_blocker(root, text) {
        Ok(resolved) => print_json(&serde_json::json!({ "resolved": resolved })),
        Err(GsdError::StateNotFound) => print_error("STATE.md not found"),
        Err(e) => Err(e.into()),
    }
}

fn record_session(
    root: &Path,
    stopped_at: Option<&str>,
    resume_file: Option<&str>,
) -> anyhow::Result<()> {
    match state::record_session(root, stopped_at, resume_file) {
        Ok(outcome) => print_json(&outcome),
        Err(GsdError::StateNotFound) => print_error("STATE.md not found"),
        Err(e) => Err(e.into()),
    }
}

//! Planning configuration (`.planning/config.json`) and model-profile
//! resolution for spawned agents.

use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// PlanningConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    #[serde(default = "default_model_profile")]
    pub model_profile: String,
    #[serde(default = "default_true")]
    pub commit_docs: bool,
    #[serde(default = "default_true")]
    pub research: bool,
}

fn default_model_profile() -> String {
    "balanced".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            model_profile: default_model_profile(),
            commit_docs: true,
            research: true,
        }
    }
}

impl PlanningConfig {
    /// Load `.planning/config.json`, falling back to defaults when the file
    /// is absent. Returns the config and whether the file existed.
    pub fn load(root: &Path) -> Result<(Self, bool)> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        let data = std::fs::read_to_string(&path)?;
        let config: PlanningConfig = serde_json::from_str(&data)?;
        Ok((config, true))
    }
}

// ---------------------------------------------------------------------------
// Model resolution
// ---------------------------------------------------------------------------

/// Tier tables per profile. Agents the table doesn't name fall back to
/// sonnet, the workhorse tier.
fn tier_for(agent: &str, profile: &str) -> &'static str {
    match profile {
        "quality" => match agent {
            "gsd-planner" | "gsd-verifier" | "gsd-debugger" => "opus",
            "gsd-executor" | "gsd-researcher" | "gsd-codebase-mapper" => "sonnet",
            _ => "sonnet",
        },
        "budget" => match agent {
            "gsd-planner" => "sonnet",
            "gsd-executor" | "gsd-verifier" => "sonnet",
            "gsd-researcher" | "gsd-codebase-mapper" => "haiku",
            _ => "sonnet",
        },
        // balanced (and anything unrecognized)
        _ => match agent {
            "gsd-planner" | "gsd-debugger" => "opus",
            "gsd-executor" | "gsd-verifier" | "gsd-researcher" | "gsd-codebase-mapper" => "sonnet",
            _ => "sonnet",
        },
    }
}

/// Resolve the model for an agent under the configured profile. An opus
/// tier resolves to `inherit` — the orchestrating session already runs the
/// top tier, so the subagent inherits it rather than naming it.
pub fn resolve_model(agent: &str, profile: &str) -> &'static str {
    match tier_for(agent, profile) {
        "opus" => "inherit",
        tier => tier,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

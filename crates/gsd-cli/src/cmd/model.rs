use crate::output::print_json;
use gsd_core::config::{resolve_model, PlanningConfig};
use std::path::Path;

pub fn run(root: &Path, agent: &str) -> anyhow::Result<()> {
    let (config, _) = PlanningConfig::load(root)?;
    let model = resolve_model(agent, &config.model_profile);
    print_json(&serde_json::json!({
        "agent": agent,
        "profile": config.model_profile,
        "model": model,
    }))
}

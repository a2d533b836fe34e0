use crate::output::print_json;
use clap::Subcommand;
use gsd_core::requirements;
use std::path::Path;

#[derive(Subcommand)]
pub enum RequirementsSubcommand {
    /// Check off requirement IDs (comma/space separated, brackets tolerated)
    MarkComplete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

pub fn run(root: &Path, subcommand: RequirementsSubcommand) -> anyhow::Result<()> {
    match subcommand {
        RequirementsSubcommand::MarkComplete { ids } => {
            let ids = requirements::parse_ids(&ids);
            let outcome = requirements::mark_complete(root, &ids)?;
            print_json(&outcome)
        }
    }
}

use crate::output::print_json;
use clap::Subcommand;
use gsd_core::milestone;
use std::path::Path;

#[derive(Subcommand)]
pub enum MilestoneSubcommand {
    /// Archive the shipped roadmap era and record it in MILESTONES.md
    Complete {
        /// Milestone version, e.g. v1.0
        #[arg(id = "milestone_version", value_name = "VERSION")]
        version: String,

        /// Display name, e.g. --name MVP Foundation
        #[arg(long, num_args = 1..)]
        name: Vec<String>,

        /// Move phase directories into the milestone archive
        #[arg(long)]
        archive_phases: bool,
    },
}

pub fn run(root: &Path, subcommand: MilestoneSubcommand) -> anyhow::Result<()> {
    match subcommand {
        MilestoneSubcommand::Complete {
            version,
            name,
            archive_phases,
        } => {
            let name = if name.is_empty() {
                None
            } else {
                Some(name.join(" "))
            };
            let outcome = milestone::complete(root, &version, name.as_deref(), archive_phases)?;
            print_json(&outcome)
        }
    }
}

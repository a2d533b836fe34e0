mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    frontmatter::FrontmatterSubcommand, milestone::MilestoneSubcommand,
    requirements::RequirementsSubcommand, state::StateSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gsd",
    about = "Planning-document toolkit — frontmatter, state files, milestones for AI-agent workflows",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .planning/ or .git/)
    #[arg(long, global = true, env = "GSD_CWD")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read, write, and validate document frontmatter
    Frontmatter {
        #[command(subcommand)]
        subcommand: FrontmatterSubcommand,
    },

    /// Inspect and mutate .planning/STATE.md
    State {
        #[command(subcommand)]
        subcommand: StateSubcommand,
    },

    /// Complete and archive milestones
    Milestone {
        #[command(subcommand)]
        subcommand: MilestoneSubcommand,
    },

    /// Check off requirements
    Requirements {
        #[command(subcommand)]
        subcommand: RequirementsSubcommand,
    },

    /// Find a phase directory by number
    FindPhase { number: String },

    /// Resolve the model for an agent type under the configured profile
    ResolveModel { agent: String },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let result = root::resolve_root(cli.cwd.as_deref()).and_then(|root| match cli.command {
        Commands::Frontmatter { subcommand } => cmd::frontmatter::run(&root, subcommand),
        Commands::State { subcommand } => cmd::state::run(&root, subcommand),
        Commands::Milestone { subcommand } => cmd::milestone::run(&root, subcommand),
        Commands::Requirements { subcommand } => cmd::requirements::run(&root, subcommand),
        Commands::FindPhase { number } => cmd::phase::run(&root, &number),
        Commands::ResolveModel { agent } => cmd::model::run(&root, &agent),
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lumetry")]
#[command(version)]
#[command(about = "Declarative management of Lumetry projects and API keys", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the desired-state configuration file
    #[arg(short, long, global = true, default_value = "lumetry.toml")]
    pub config: PathBuf,

    /// Path to the observed-state file
    #[arg(long, global = true, default_value = "lumetry.state.json")]
    pub state: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preview the operations needed to reach the desired state
    Plan,

    /// Make the remote state match the desired state
    Apply(ApplyArgs),

    /// Delete every resource tracked in the state file
    Destroy(DestroyArgs),

    /// Adopt an existing remote resource into the state file
    #[command(subcommand)]
    Import(ImportCommand),

    /// Show the tracked observed state
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would be done without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Number of parallel workers for independent resources
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would be destroyed without doing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum ImportCommand {
    /// Import a project by its remote id
    Project {
        /// Configuration entry name to record it under
        name: String,
        /// Remote project id
        id: String,
    },
    /// Import an API key by its remote id (not supported by the API)
    ApiKey {
        /// Configuration entry name to record it under
        name: String,
        /// Remote API key id
        id: String,
    },
}

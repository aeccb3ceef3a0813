//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, process::ProcessArgs,
    stats::StatsArgs, upload::UploadArgs, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "formcase")]
#[command(author, version, about = "Clinical form test case builder and Azure DevOps uploader")]
#[command(long_about = "Turns a CSV of clinical form test requirements into structured test cases, exports them for bulk import, and uploads them to Azure DevOps as Test Case work items.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Connection settings shared by `validate` and `upload`
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ConnectionArgs {
    /// Azure DevOps organization name
    #[arg(long, env = "FORMCASE_ORGANIZATION")]
    pub organization: Option<String>,

    /// Azure DevOps project name
    #[arg(long, env = "FORMCASE_PROJECT")]
    pub project: Option<String>,

    /// Personal access token (prompted for when omitted on a terminal)
    #[arg(long, env = "FORMCASE_PAT", hide_env_values = true)]
    pub pat: Option<String>,

    /// Service root URL (default: https://dev.azure.com)
    #[arg(long, env = "FORMCASE_BASE_URL")]
    pub base_url: Option<String>,

    /// Never prompt for a missing token
    #[arg(long)]
    pub no_prompt: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics for a requirements CSV
    Stats(StatsArgs),

    /// Build test cases from a requirements CSV and optionally export them
    Process(ProcessArgs),

    /// Check that the Azure DevOps credentials can reach the project
    Validate(ValidateArgs),

    /// Build test cases and upload them as work items
    Upload(UploadArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

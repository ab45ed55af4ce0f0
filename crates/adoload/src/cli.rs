//! Clap CLI definitions for the `adoload` command.

use clap::{Args, Parser, Subcommand};

/// adoload -- load a YAML backlog into Azure DevOps.
///
/// Reads a three-level backlog plan (features, user stories, tasks) and
/// creates linked work items, with field mappings configurable per work
/// item type through a template document.
#[derive(Parser, Debug)]
#[command(
    name = "adoload",
    about = "Load a YAML backlog into Azure DevOps work items",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the parameters file.
    #[arg(long, global = true, default_value = "parameters.yaml")]
    pub config: String,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create every work item in the plan, in hierarchy order.
    Run(RunArgs),

    /// Dry run: build every payload without creating anything.
    Check(CheckArgs),

    /// Show the resolved field mappings per work item type.
    Templates(TemplatesArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Plan file override (default: file_paths.plan_file from config).
    #[arg(long)]
    pub plan: Option<String>,

    /// Template file override (default: file_paths.template_file).
    #[arg(long)]
    pub template: Option<String>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Plan file override (default: file_paths.plan_file from config).
    #[arg(long)]
    pub plan: Option<String>,

    /// Template file override (default: file_paths.template_file).
    #[arg(long)]
    pub template: Option<String>,
}

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Template file override (default: file_paths.template_file).
    #[arg(long)]
    pub template: Option<String>,
}

//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use plugsmith::core::Mode;
use plugsmith::util::shell::ColorChoice;

/// plugsmith - patch, build and deploy a Dalamud plugin for API 12 or API 13
#[derive(Parser)]
#[command(name = "plugsmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for pipeline events
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Patch the project for the selected target, restore, build and deploy
    Build(BuildArgs),

    /// Patch sources and project files for the selected target without building
    Patch(PatchArgs),

    /// Check the .NET toolchain and report which targets can be built
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that touches the project.
#[derive(Args, Clone, Debug)]
pub struct ProjectArgs {
    /// Repository root searched for the .csproj [default: current directory]
    #[arg(long, env = "PLUGSMITH_ROOT")]
    pub root: Option<PathBuf>,

    /// Internal plugin name [default: the .csproj file name]
    #[arg(long, env = "PLUGSMITH_INTERNAL")]
    pub internal: Option<String>,

    /// Target selection: auto, net8 (API 12), net9 (API 13)
    #[arg(long, env = "PLUGSMITH_MODE")]
    pub mode: Option<Mode>,

    /// Dalamud.NET.Sdk version used for API 12
    #[arg(long, value_name = "VERSION")]
    pub sdk12: Option<String>,

    /// DalamudPackager version used for API 13
    #[arg(long, value_name = "VERSION")]
    pub packager13: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Folder the built artifacts are copied to [default: <root>/Drop]
    #[arg(long, env = "PLUGSMITH_DEPLOY")]
    pub deploy: Option<PathBuf>,

    /// Build configuration [default: Release]
    #[arg(short, long)]
    pub configuration: Option<String>,

    /// Do not clear the local NuGet caches before restoring
    #[arg(long)]
    pub no_clear_cache: bool,
}

#[derive(Args)]
pub struct PatchArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Do not query installed SDKs; requires --mode net8 or net9
    #[arg(long)]
    pub skip_detect: bool,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Also inspect the project under this directory
    #[arg(long, env = "PLUGSMITH_ROOT")]
    pub root: Option<PathBuf>,

    /// Internal plugin name used to pick the .csproj
    #[arg(long, env = "PLUGSMITH_INTERNAL")]
    pub internal: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

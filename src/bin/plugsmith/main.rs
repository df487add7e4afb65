//! plugsmith CLI - patch, build and deploy a Dalamud plugin

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use plugsmith::util::diagnostic::{diagnose, emit, exit_code, failure_tail};
use plugsmith::util::Shell;

fn main() {
    let cli = Cli::parse();

    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    );

    if let Err(e) = run(cli, &shell) {
        if let Some(tail) = failure_tail(&e) {
            eprintln!("{}", tail.trim_end());
            eprintln!();
        }
        if shell.is_json() {
            shell.error(format!("{:#}", e));
        } else {
            emit(&diagnose(&e), shell.use_color());
        }
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("plugsmith=debug")
    } else if cli.quiet || shell.is_json() {
        EnvFilter::new("plugsmith=error")
    } else {
        EnvFilter::new("plugsmith=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Patch(args) => commands::patch::execute(args, shell),
        Commands::Doctor(args) => commands::doctor::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

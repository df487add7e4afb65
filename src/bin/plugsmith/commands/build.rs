//! `plugsmith build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::pipeline_options;
use plugsmith::ops::build;
use plugsmith::util::process::SystemRunner;
use plugsmith::util::Shell;

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let mut opts = pipeline_options(&args.project, args.deploy)?;
    if let Some(configuration) = args.configuration {
        opts.configuration = configuration;
    }
    if args.no_clear_cache {
        opts.clear_cache = false;
    }

    let report = build(&SystemRunner, &opts, shell)?;

    if !shell.is_json() && !shell.is_quiet() {
        eprintln!();
        eprintln!("Restore log: {}", report.restore_log.display());
        eprintln!("Build log:   {}", report.build_log.display());
        eprintln!("Drop folder: {}", report.deploy_dir.display());
    }

    Ok(())
}

//! `plugsmith patch` command

use anyhow::Result;

use crate::cli::PatchArgs;
use crate::commands::pipeline_options;
use plugsmith::ops::prepare;
use plugsmith::util::process::SystemRunner;
use plugsmith::util::shell::Status;
use plugsmith::util::Shell;

pub fn execute(args: PatchArgs, shell: &Shell) -> Result<()> {
    let mut opts = pipeline_options(&args.project, None)?;
    opts.skip_detect = args.skip_detect;

    let prepared = prepare(&SystemRunner, &opts, shell)?;

    shell.status(
        Status::Finished,
        format!(
            "{} patched for {} ({} sanitized, {} patched, {} descriptor edit(s))",
            prepared.project.internal(),
            prepared.target.label(),
            prepared.sanitized,
            prepared.patched,
            prepared.edits.len()
        ),
    );

    Ok(())
}

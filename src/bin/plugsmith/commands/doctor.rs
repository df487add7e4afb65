//! `plugsmith doctor` command

use anyhow::Result;

use crate::cli::DoctorArgs;
use plugsmith::ops::{doctor, format_report, DoctorOptions};
use plugsmith::util::process::SystemRunner;
use plugsmith::util::Shell;

pub fn execute(args: DoctorArgs, shell: &Shell) -> Result<()> {
    let options = DoctorOptions {
        root: args.root,
        internal: args.internal,
    };

    let report = doctor(&SystemRunner, &options)?;

    if !shell.is_quiet() || !report.all_required_passed() {
        print!("{}", format_report(&report, shell.is_verbose()));
    }

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}

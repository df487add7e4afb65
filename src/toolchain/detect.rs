//! SDK detection and target selection.

use anyhow::Result;

use crate::core::{Mode, Target};
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessError};

use super::{InstalledSdks, ToolchainError, DOTNET};

/// List installed SDKs with `dotnet --list-sdks`.
///
/// A missing `dotnet` executable is fatal. A nonzero exit is logged and the
/// output parsed anyway; an empty listing simply means nothing is installed.
pub fn detect_sdks<R>(runner: &R) -> Result<InstalledSdks>
where
    R: CommandRunner + ?Sized,
{
    let cmd = ProcessBuilder::new(DOTNET).arg("--list-sdks");

    let out = match runner.run(&cmd) {
        Ok(out) => out,
        Err(ProcessError::NotFound { .. }) => return Err(ToolchainError::NotInstalled.into()),
        Err(e) => return Err(e.into()),
    };

    if !out.is_success() {
        tracing::debug!(
            "`{}` exited with {:?}; parsing output anyway",
            cmd.display_command(),
            out.code
        );
    }

    let sdks = InstalledSdks::parse(&out.output);
    tracing::debug!("installed SDKs: {:?}", sdks.versions());
    Ok(sdks)
}

/// Resolve `mode` to a concrete target.
///
/// `auto` picks .NET 9 when any 9.x SDK is installed and .NET 8 otherwise.
pub fn select_target(mode: Mode, sdks: &InstalledSdks) -> Target {
    match mode.forced() {
        Some(target) => target,
        None if sdks.supports(Target::Net9) => Target::Net9,
        None => Target::Net8,
    }
}

/// Fail unless an SDK with the target's major version is installed.
pub fn require_target(target: Target, sdks: &InstalledSdks) -> Result<(), ToolchainError> {
    if sdks.supports(target) {
        return Ok(());
    }
    Err(ToolchainError::MissingMajor {
        major: target.sdk_major(),
        target,
        installed: sdks.versions().to_vec(),
    })
}

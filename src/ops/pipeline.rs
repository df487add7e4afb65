//! The build-and-deploy pipeline.
//!
//! Steps run strictly in order:
//!
//! 1. detect installed SDKs and select the target
//! 2. locate the project descriptor
//! 3. ensure `nuget.config`
//! 4. sanitize sources, then patch them for the target
//! 5. reconcile the descriptor, create the manifest, reconcile `global.json`
//! 6. clear NuGet caches (best-effort), restore, build
//! 7. locate the output directory and deploy
//!
//! Steps 1-5 make up [`prepare`], which is also what `plugsmith patch` runs.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};

use crate::core::{Mode, Project, Target};
use crate::ops::deploy::{deploy, locate_output_dir};
use crate::ops::descriptor::{patch_descriptor, DescriptorSettings, Edit};
use crate::ops::events::{EventSink, PipelineEvent, Step};
use crate::ops::global_json::{reconcile_global_json, PinOutcome, GLOBAL_JSON};
use crate::ops::locate::find_descriptor;
use crate::ops::manifest::{ensure_manifest, ManifestMeta};
use crate::ops::nuget_config::{ensure_nuget_config, NugetOutcome};
use crate::ops::{api_patch, sanitize};
use crate::toolchain::{detect_sdks, require_target, select_target, InstalledSdks, DOTNET};
use crate::util::process::{run_logged, CommandRunner, ProcessBuilder, ProcessError};

/// Everything the pipeline needs to know; resolved by the caller.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory searched for the descriptor and sources.
    pub root: PathBuf,
    /// Internal (assembly) name; the descriptor's stem when unset.
    pub internal: Option<String>,
    pub deploy_dir: PathBuf,
    pub mode: Mode,
    /// Plugin SDK version pinned for API 12.
    pub sdk12: String,
    /// Packager version referenced for API 13.
    pub packager13: String,
    /// MSBuild configuration, e.g. `Release`.
    pub configuration: String,
    pub clear_cache: bool,
    pub manifest: ManifestMeta,
    /// Do not run `dotnet --list-sdks`; requires an explicit mode.
    pub skip_detect: bool,
}

/// Result of the file-mutating half of the pipeline.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub target: Target,
    pub project: Project,
    pub sdks: InstalledSdks,
    pub sanitized: usize,
    pub patched: usize,
    pub edits: Vec<Edit>,
    pub manifest_created: bool,
    pub pin: Option<PinOutcome>,
}

/// Result of a full build and deploy.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub prepared: Prepared,
    pub output_dir: PathBuf,
    pub deployed: Vec<PathBuf>,
    pub deploy_dir: PathBuf,
    pub restore_log: PathBuf,
    pub build_log: PathBuf,
}

/// Detect SDKs (unless skipped) and resolve the target.
pub fn resolve_target<R>(
    runner: &R,
    opts: &PipelineOptions,
    sink: &dyn EventSink,
) -> Result<(Target, InstalledSdks)>
where
    R: CommandRunner + ?Sized,
{
    let (target, sdks) = if opts.skip_detect {
        let Some(target) = opts.mode.forced() else {
            bail!("SDK detection can only be skipped with an explicit mode (net8 or net9)");
        };
        (target, InstalledSdks::default())
    } else {
        let sdks = detect_sdks(runner)?;
        let target = select_target(opts.mode, &sdks);
        require_target(target, &sdks)?;
        (target, sdks)
    };

    tracing::info!("target selected: {} ({})", target, target.label());
    sink.emit(PipelineEvent::TargetSelected {
        mode: opts.mode,
        target,
        api_level: target.api_level(),
    });

    Ok((target, sdks))
}

/// Select the target and bring every project file in line with it.
pub fn prepare<R>(runner: &R, opts: &PipelineOptions, sink: &dyn EventSink) -> Result<Prepared>
where
    R: CommandRunner + ?Sized,
{
    let (target, sdks) = resolve_target(runner, opts, sink)?;

    let descriptor = find_descriptor(&opts.root, opts.internal.as_deref())?;
    let project = match &opts.internal {
        Some(internal) => Project::new(descriptor, internal.clone()),
        None => Project::from_descriptor(descriptor),
    };
    tracing::info!("project: {}", project.descriptor().display());
    sink.emit(PipelineEvent::ProjectLocated {
        descriptor: project.descriptor().to_path_buf(),
        internal: project.internal().to_string(),
    });

    match ensure_nuget_config(project.dir())? {
        NugetOutcome::Created(path) => sink.emit(PipelineEvent::file_changed(path, "created")),
        NugetOutcome::SourceAdded(path) => {
            sink.emit(PipelineEvent::file_changed(path, "added nuget.org source"))
        }
        NugetOutcome::Unrecognized(path) => sink.emit(PipelineEvent::skipped(
            "nuget.config",
            format!("{} has no <configuration> element", path.display()),
        )),
        NugetOutcome::Present(_) => {}
    }

    // Sanitizing first keeps smart quotes and zero-width marks from hiding
    // `using` lines from the patcher.
    let sanitized = sanitize::sanitize_sources(&opts.root)?;
    sink.emit(PipelineEvent::SourcesSanitized { count: sanitized });

    let patched = api_patch::patch_sources(&opts.root, target)?;
    sink.emit(PipelineEvent::SourcesPatched {
        count: patched,
        target,
    });

    let settings = DescriptorSettings {
        target,
        internal: project.internal().to_string(),
        sdk12: opts.sdk12.clone(),
        packager13: opts.packager13.clone(),
    };
    let edits = patch_descriptor(project.descriptor(), &settings)?;
    sink.emit(PipelineEvent::DescriptorPatched {
        path: project.descriptor().to_path_buf(),
        edits: edits.iter().map(ToString::to_string).collect(),
    });

    let manifest_created = ensure_manifest(&project, target, &opts.manifest)?;
    if manifest_created {
        sink.emit(PipelineEvent::file_changed(project.manifest_path(), "created"));
    }

    let pin = if opts.skip_detect {
        if opts.root.join(GLOBAL_JSON).is_file() {
            sink.emit(PipelineEvent::skipped(GLOBAL_JSON, "SDK detection was skipped"));
        }
        None
    } else {
        let outcome = reconcile_global_json(&opts.root, target, &sdks)?;
        match &outcome {
            PinOutcome::Switched { .. } => sink.emit(PipelineEvent::file_changed(
                opts.root.join(GLOBAL_JSON),
                outcome.to_string(),
            )),
            PinOutcome::Skipped { reason } => {
                sink.emit(PipelineEvent::skipped(GLOBAL_JSON, reason.clone()))
            }
            PinOutcome::NoCompatibleSdk { .. } => {
                sink.emit(PipelineEvent::skipped(GLOBAL_JSON, outcome.to_string()))
            }
            _ => {}
        }
        Some(outcome)
    };

    Ok(Prepared {
        target,
        project,
        sdks,
        sanitized,
        patched,
        edits,
        manifest_created,
        pin,
    })
}

/// Run the whole pipeline: prepare, restore, build, deploy.
pub fn build<R>(runner: &R, opts: &PipelineOptions, sink: &dyn EventSink) -> Result<BuildReport>
where
    R: CommandRunner + ?Sized,
{
    let start = Instant::now();
    let prepared = prepare(runner, opts, sink)?;
    let project = &prepared.project;

    if opts.clear_cache {
        clear_caches(runner, project, sink);
    } else {
        sink.emit(PipelineEvent::skipped(Step::ClearCache.name(), "disabled"));
    }

    let restore_log = project.restore_log();
    let build_log = project.build_log();

    run_step(
        runner,
        sink,
        Step::Restore,
        &restore_command(project),
        Some(restore_log.clone()),
    )?;
    run_step(
        runner,
        sink,
        Step::Build,
        &build_command(project, &opts.configuration),
        Some(build_log.clone()),
    )?;

    let output_dir = locate_output_dir(project, &opts.configuration, prepared.target)?;
    tracing::info!("output root: {}", output_dir.display());
    sink.emit(PipelineEvent::OutputLocated {
        dir: output_dir.clone(),
    });

    let deployed = deploy(&output_dir, project, &opts.deploy_dir)?;
    for path in &deployed {
        sink.emit(PipelineEvent::ArtifactDeployed { path: path.clone() });
    }

    sink.emit(PipelineEvent::Finished {
        success: true,
        duration_ms: start.elapsed().as_millis() as u64,
        deploy_dir: Some(opts.deploy_dir.clone()),
        logs: vec![restore_log.clone(), build_log.clone()],
    });

    Ok(BuildReport {
        prepared,
        output_dir,
        deployed,
        deploy_dir: opts.deploy_dir.clone(),
        restore_log,
        build_log,
    })
}

/// `dotnet nuget locals all --clear`
pub fn clear_cache_command(project: &Project) -> ProcessBuilder {
    ProcessBuilder::new(DOTNET)
        .args(["nuget", "locals", "all", "--clear"])
        .cwd(project.dir())
}

pub fn restore_command(project: &Project) -> ProcessBuilder {
    ProcessBuilder::new(DOTNET)
        .arg("restore")
        .arg(project.descriptor().display().to_string())
        .args(["--no-cache", "--verbosity", "minimal"])
        .cwd(project.dir())
}

pub fn build_command(project: &Project, configuration: &str) -> ProcessBuilder {
    ProcessBuilder::new(DOTNET)
        .arg("build")
        .arg(project.descriptor().display().to_string())
        .args(["-c", configuration])
        .args(["/p:MakeZip=true", "-v", "m", "/clp:Summary;ErrorsOnly"])
        .cwd(project.dir())
}

/// Clearing caches only guards against stale packages; failure is noted.
fn clear_caches<R>(runner: &R, project: &Project, sink: &dyn EventSink)
where
    R: CommandRunner + ?Sized,
{
    match run_step(runner, sink, Step::ClearCache, &clear_cache_command(project), None) {
        Ok(()) => tracing::info!("NuGet caches cleared"),
        Err(e) => {
            tracing::warn!("NuGet cache clear skipped: {}", e);
            sink.emit(PipelineEvent::skipped(Step::ClearCache.name(), e.to_string()));
        }
    }
}

fn run_step<R>(
    runner: &R,
    sink: &dyn EventSink,
    step: Step,
    cmd: &ProcessBuilder,
    log: Option<PathBuf>,
) -> Result<(), ProcessError>
where
    R: CommandRunner + ?Sized,
{
    sink.emit(PipelineEvent::StepStarted {
        step,
        log: log.clone(),
    });

    let start = Instant::now();
    let result = run_logged(runner, cmd, log.as_deref());

    sink.emit(PipelineEvent::StepFinished {
        step,
        success: result.is_ok(),
        duration_ms: start.elapsed().as_millis() as u64,
    });

    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::deploy::DeployError;
    use crate::test_support::{write_build_output, MockRunner, PluginFixture, RecordingSink};
    use crate::toolchain::ToolchainError;
    use crate::util::process::CommandOutput;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const BOTH_SDKS: &str = "8.0.404 [/usr/share/dotnet/sdk]\n9.0.301 [/usr/share/dotnet/sdk]\n";

    fn options(root: &Path) -> PipelineOptions {
        PipelineOptions {
            root: root.to_path_buf(),
            internal: Some("Nunu".to_string()),
            deploy_dir: root.join("Drop"),
            mode: Mode::Auto,
            sdk12: "12.0.2".to_string(),
            packager13: "13.1.0".to_string(),
            configuration: "Release".to_string(),
            clear_cache: true,
            manifest: ManifestMeta::default(),
            skip_detect: false,
        }
    }

    fn runner_with(listing: &str) -> MockRunner {
        MockRunner::new().on("dotnet --list-sdks", CommandOutput::success(listing))
    }

    #[test]
    fn test_full_build_and_deploy() {
        let tmp = TempDir::new().unwrap();
        let descriptor = PluginFixture::standard("Nunu").write(tmp.path());
        let project_dir = descriptor.parent().unwrap().to_path_buf();
        write_build_output(&project_dir.join("bin/Release/net9.0"), &["Nunu.dll", "Nunu.pdb", "latest.zip"]);

        let runner = runner_with(BOTH_SDKS);
        let sink = RecordingSink::default();
        let report = build(&runner, &options(tmp.path()), &sink).unwrap();

        assert_eq!(report.prepared.target, Target::Net9);
        assert_eq!(report.prepared.patched, 1);
        assert!(report.prepared.manifest_created);

        let calls = runner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], "dotnet --list-sdks");
        assert_eq!(calls[1], "dotnet nuget locals all --clear");
        assert!(calls[2].starts_with("dotnet restore "));
        assert!(calls[2].ends_with(" --no-cache --verbosity minimal"));
        assert!(calls[3].starts_with("dotnet build "));
        assert!(calls[3].ends_with(" -c Release /p:MakeZip=true -v m /clp:Summary;ErrorsOnly"));

        let drop = tmp.path().join("Drop");
        for name in ["Nunu.dll", "Nunu.pdb", "Nunu.yaml", "latest.zip"] {
            assert!(drop.join(name).is_file(), "{} not deployed", name);
        }
        assert!(project_dir.join("plugsmith-build.log").is_file());
        assert!(project_dir.join("nuget.config").is_file());

        let events = sink.events();
        assert!(matches!(events.first(), Some(PipelineEvent::TargetSelected { target: Target::Net9, .. })));
        assert!(matches!(events.last(), Some(PipelineEvent::Finished { success: true, .. })));
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        PluginFixture::standard("Nunu").write(tmp.path());
        let runner = runner_with(BOTH_SDKS);
        let mut opts = options(tmp.path());
        opts.mode = Mode::Net8;

        let first = prepare(&runner, &opts, &RecordingSink::default()).unwrap();
        assert_eq!(first.target, Target::Net8);
        assert!(!first.edits.is_empty());

        let second = prepare(&runner, &opts, &RecordingSink::default()).unwrap();
        assert_eq!(second.sanitized, 0);
        assert_eq!(second.patched, 0);
        assert!(second.edits.is_empty());
        assert!(!second.manifest_created);
    }

    #[test]
    fn test_global_json_pin_follows_target() {
        let tmp = TempDir::new().unwrap();
        PluginFixture::standard("Nunu").write(tmp.path());
        fs::write(tmp.path().join("global.json"), r#"{"sdk":{"version":"8.0.100"}}"#).unwrap();

        let prepared = prepare(&runner_with(BOTH_SDKS), &options(tmp.path()), &RecordingSink::default()).unwrap();
        assert_eq!(
            prepared.pin,
            Some(PinOutcome::Switched {
                from: "8.0.100".to_string(),
                to: "9.0.301".to_string(),
            })
        );
    }

    #[test]
    fn test_explicit_mode_requires_sdk() {
        let tmp = TempDir::new().unwrap();
        PluginFixture::standard("Nunu").write(tmp.path());
        let mut opts = options(tmp.path());
        opts.mode = Mode::Net9;

        let err = prepare(&runner_with("8.0.404 [sdk]\n"), &opts, &RecordingSink::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolchainError>(),
            Some(ToolchainError::MissingMajor { major: 9, .. })
        ));
    }

    #[test]
    fn test_skip_detect_needs_explicit_mode() {
        let tmp = TempDir::new().unwrap();
        PluginFixture::standard("Nunu").write(tmp.path());
        let runner = MockRunner::new();
        let mut opts = options(tmp.path());
        opts.skip_detect = true;

        assert!(prepare(&runner, &opts, &RecordingSink::default()).is_err());

        opts.mode = Mode::Net8;
        let prepared = prepare(&runner, &opts, &RecordingSink::default()).unwrap();
        assert_eq!(prepared.target, Target::Net8);
        assert_eq!(prepared.pin, None);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_build_failure_propagates_exit_code() {
        let tmp = TempDir::new().unwrap();
        let descriptor = PluginFixture::standard("Nunu").write(tmp.path());
        let runner = runner_with(BOTH_SDKS)
            .on("dotnet build", CommandOutput::failure(3, "error CS0246: ImGuiNET not found"));

        let err = build(&runner, &options(tmp.path()), &RecordingSink::default()).unwrap_err();
        let process = err.downcast_ref::<ProcessError>().unwrap();
        assert_eq!(process.exit_code(), 3);

        let log = descriptor.parent().unwrap().join("plugsmith-build.log");
        assert_eq!(fs::read_to_string(log).unwrap(), "error CS0246: ImGuiNET not found");
        assert!(!tmp.path().join("Drop").exists());
    }

    #[test]
    fn test_cache_clear_failure_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let descriptor = PluginFixture::standard("Nunu").write(tmp.path());
        write_build_output(&descriptor.parent().unwrap().join("bin/Release/net9.0"), &["Nunu.dll"]);
        let runner = runner_with(BOTH_SDKS).on("dotnet nuget locals", CommandOutput::failure(1, "locked"));
        let sink = RecordingSink::default();

        build(&runner, &options(tmp.path()), &sink).unwrap();
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, PipelineEvent::Skipped { what, .. } if what == "cache clear")));
    }

    #[test]
    fn test_missing_output_is_fatal() {
        let tmp = TempDir::new().unwrap();
        PluginFixture::standard("Nunu").write(tmp.path());
        let mut opts = options(tmp.path());
        opts.clear_cache = false;

        let err = build(&runner_with(BOTH_SDKS), &opts, &RecordingSink::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::OutputNotFound { .. })
        ));
    }
}

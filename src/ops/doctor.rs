//! Environment and toolchain health checks.
//!
//! `plugsmith doctor` answers "can this machine build the plugin, and for
//! which API level?" without touching any project file.
//!
//! ## Checks Performed
//!
//! - `dotnet` CLI availability and version
//! - Installed SDKs for API 12 (.NET 8) and API 13 (.NET 9)
//! - Whether at least one target is buildable
//! - Project descriptor discovery (when a root is given)
//! - `global.json` pin compatibility (when present)

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::Value;

use crate::core::{Mode, Target};
use crate::ops::global_json::GLOBAL_JSON;
use crate::ops::locate::find_descriptor;
use crate::toolchain::{detect_sdks, major_of, select_target, InstalledSdks, ToolchainError, DOTNET};
use crate::util::process::{find_executable, CommandRunner, ProcessBuilder, ProcessError};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// Human-readable status message
    pub message: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..Self::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub checks: Vec<CheckResult>,
    pub total_duration: Duration,
    /// Environment information
    pub environment: BTreeMap<String, String>,
    /// Target `auto` mode would pick, if any SDK is usable.
    pub auto_target: Option<Target>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Project root to inspect; toolchain checks only when unset.
    pub root: Option<PathBuf>,
    /// Preferred descriptor name.
    pub internal: Option<String>,
}

/// Run the doctor checks.
pub fn doctor<R>(runner: &R, options: &DoctorOptions) -> Result<DoctorReport>
where
    R: CommandRunner + ?Sized,
{
    let start = Instant::now();
    let mut report = DoctorReport::new();

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());
    if let Ok(root) = std::env::var("DOTNET_ROOT") {
        report.environment.insert("DOTNET_ROOT".to_string(), root);
    }

    let cli = check_dotnet(runner);
    let cli_found = cli.passed;
    report.add(cli);

    let sdks = if cli_found {
        match detect_sdks(runner) {
            Ok(sdks) => sdks,
            Err(e) => {
                report.add(CheckResult::fail("SDK listing", format!("{:#}", e)));
                InstalledSdks::default()
            }
        }
    } else {
        InstalledSdks::default()
    };

    for target in Target::ALL {
        report.add(check_target_sdk(&sdks, target));
    }

    let buildable = Target::ALL.iter().any(|t| sdks.supports(*t));
    if buildable {
        let auto = select_target(Mode::Auto, &sdks);
        report.auto_target = Some(auto);
        report.add(CheckResult::pass(
            "Buildable target",
            format!("auto mode selects {} ({})", auto, auto.label()),
        ));
    } else {
        report.add(CheckResult::fail(
            "Buildable target",
            "install the .NET 8 SDK (API 12) or .NET 9 SDK (API 13)",
        ));
    }

    if let Some(root) = &options.root {
        report.add(check_descriptor(root, options.internal.as_deref()));
        if let Some(check) = check_global_json(root, report.auto_target) {
            report.add(check);
        }
    }

    report.total_duration = start.elapsed();
    Ok(report)
}

fn check_dotnet<R>(runner: &R) -> CheckResult
where
    R: CommandRunner + ?Sized,
{
    let cmd = ProcessBuilder::new(DOTNET).arg("--version");
    match runner.run(&cmd) {
        Ok(out) => {
            let version = out.output.trim().to_string();
            let mut check = CheckResult::pass(".NET CLI", format!("found {}", DOTNET));
            if let Some(path) = find_executable(DOTNET) {
                check = check.with_path(path);
            }
            if !version.is_empty() {
                check = check.with_version(version);
            }
            check
        }
        Err(ProcessError::NotFound { .. }) => {
            CheckResult::fail(".NET CLI", ToolchainError::NotInstalled.to_string())
        }
        Err(e) => CheckResult::fail(".NET CLI", e.to_string()),
    }
}

fn check_target_sdk(sdks: &InstalledSdks, target: Target) -> CheckResult {
    let name = format!("{} (.NET {} SDK)", target.label(), target.sdk_major());
    match sdks.highest_for_major(target.sdk_major()) {
        Some(version) => CheckResult::pass(name, format!("{} can be built", target))
            .with_version(version)
            .optional(),
        None => CheckResult::fail(name, format!("no .NET {} SDK installed", target.sdk_major()))
            .optional(),
    }
}

fn check_descriptor(root: &std::path::Path, internal: Option<&str>) -> CheckResult {
    let check = match find_descriptor(root, internal) {
        Ok(path) => CheckResult::pass("Project descriptor", "found").with_path(path),
        Err(e) => CheckResult::fail("Project descriptor", e.to_string()),
    };
    check.optional()
}

fn check_global_json(root: &std::path::Path, target: Option<Target>) -> Option<CheckResult> {
    let path = root.join(GLOBAL_JSON);
    if !path.is_file() {
        return None;
    }

    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));
    let check = match parsed {
        Err(e) => CheckResult::fail("global.json", format!("unreadable: {}", e)),
        Ok(doc) => match doc.pointer("/sdk/version").and_then(Value::as_str) {
            None => CheckResult::pass("global.json", "no SDK pin"),
            Some(pin) => match target {
                Some(t) if major_of(pin) != Some(t.sdk_major()) => CheckResult::fail(
                    "global.json",
                    format!("pins {}; `plugsmith build` will switch it for {}", pin, t),
                )
                .with_version(pin),
                _ => CheckResult::pass("global.json", "pin is compatible").with_version(pin),
            },
        },
    };
    Some(check.with_path(path).optional())
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "plugsmith doctor");
    let _ = writeln!(output, "================\n");

    if verbose {
        let _ = writeln!(output, "Environment:");
        for (key, value) in &report.environment {
            let _ = writeln!(output, "  {}: {}", key, value);
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };
        let version = check
            .version
            .as_deref()
            .map(|v| format!(" {}", v))
            .unwrap_or_default();

        let _ = writeln!(output, "  {} {}{}{}", status, check.name, version, required);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
        }
    }

    let _ = writeln!(output);

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\nWarning: {} required check(s) failed. The plugin cannot be built.",
            required_failed
        );
    } else if let Some(target) = report.auto_target {
        let _ = writeln!(output, "\nReady to build for {} ({}).", target, target.label());
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockRunner, PluginFixture};
    use crate::util::process::CommandOutput;
    use tempfile::TempDir;

    #[test]
    fn test_check_result_optional() {
        let result = CheckResult::fail("test", "missing").optional();
        assert!(!result.passed);
        assert!(!result.required);
    }

    #[test]
    fn test_doctor_with_both_sdks() {
        let runner = MockRunner::new()
            .on("dotnet --version", CommandOutput::success("9.0.301\n"))
            .on(
                "dotnet --list-sdks",
                CommandOutput::success("8.0.404 [sdk]\n9.0.301 [sdk]\n"),
            );

        let report = doctor(&runner, &DoctorOptions::default()).unwrap();
        assert!(report.all_required_passed());
        assert_eq!(report.auto_target, Some(Target::Net9));
        assert_eq!(report.failed_count(), 0);

        let text = format_report(&report, false);
        assert!(text.contains("[OK] .NET CLI 9.0.301"));
        assert!(text.contains("Ready to build for net9 (API 13)."));
    }

    #[test]
    fn test_doctor_without_dotnet() {
        let runner = MockRunner::new().not_found("dotnet");

        let report = doctor(&runner, &DoctorOptions::default()).unwrap();
        assert!(!report.all_required_passed());
        assert_eq!(report.auto_target, None);
        assert_eq!(runner.calls(), vec!["dotnet --version"]);
        assert!(format_report(&report, false).contains("required check(s) failed"));
    }

    #[test]
    fn test_doctor_inspects_project() {
        let tmp = TempDir::new().unwrap();
        PluginFixture::new("Nunu").write(tmp.path());
        std::fs::write(tmp.path().join("global.json"), r#"{"sdk":{"version":"9.0.100"}}"#).unwrap();

        let runner = MockRunner::new()
            .on("dotnet --version", CommandOutput::success("8.0.404"))
            .on("dotnet --list-sdks", CommandOutput::success("8.0.404 [sdk]\n"));
        let options = DoctorOptions {
            root: Some(tmp.path().to_path_buf()),
            internal: None,
        };

        let report = doctor(&runner, &options).unwrap();
        assert!(report.all_required_passed());

        let descriptor = report
            .checks
            .iter()
            .find(|c| c.name == "Project descriptor")
            .unwrap();
        assert!(descriptor.passed);

        let pin = report.checks.iter().find(|c| c.name == "global.json").unwrap();
        assert!(!pin.passed);
        assert!(pin.message.contains("will switch it for net8"));
    }
}

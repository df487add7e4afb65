//! CLI integration tests for plugsmith.
//!
//! These run the binary against plugin trees in temporary directories. None
//! of them need a .NET toolchain: `patch --skip-detect` never invokes
//! `dotnet`, and the failure paths stop before it would.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const CSPROJ: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net7.0-windows</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="Dalamud">
      <HintPath>$(DalamudLibPath)Dalamud.dll</HintPath>
    </Reference>
  </ItemGroup>
</Project>
"#;

const CHAT_ROUTER: &str = "using Dalamud.Bindings.ImGui;\r\n\
                           \r\n\
                           public sealed class ChatRouter\r\n\
                           {\r\n\
                           \x20   public void Route(string text, int senderId) { }\r\n\
                           }\r\n";

/// Get the plugsmith binary command, isolated from the caller's config.
fn plugsmith(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("plugsmith").unwrap();
    cmd.env("HOME", home)
        .env_remove("PLUGSMITH_ROOT")
        .env_remove("PLUGSMITH_INTERNAL")
        .env_remove("PLUGSMITH_DEPLOY")
        .env_remove("PLUGSMITH_MODE");
    cmd
}

/// Write a minimal plugin tree under `root/src/Nunu`.
fn write_plugin(root: &Path) {
    let project = root.join("src").join("Nunu");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("Nunu.csproj"), CSPROJ).unwrap();
    fs::write(project.join("ChatRouter.cs"), CHAT_ROUTER).unwrap();
    fs::write(project.join("Plugin.cs"), "// \u{201C}Nunu\u{201D} plugin\n").unwrap();
}

// ============================================================================
// plugsmith --help / completions
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();

    plugsmith(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("patch"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    plugsmith(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plugsmith"));
}

#[test]
fn test_invalid_mode_rejected() {
    let tmp = TempDir::new().unwrap();

    plugsmith(tmp.path())
        .args(["patch", "--mode", "net7", "--skip-detect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid mode"));
}

// ============================================================================
// plugsmith patch
// ============================================================================

#[test]
fn test_patch_for_api12() {
    let tmp = TempDir::new().unwrap();
    write_plugin(tmp.path());
    let project = tmp.path().join("src/Nunu");

    plugsmith(tmp.path())
        .args(["patch", "--mode", "net8", "--skip-detect", "--color", "never"])
        .arg("--root")
        .arg(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("API 12"));

    let router = fs::read_to_string(project.join("ChatRouter.cs")).unwrap();
    assert!(router.contains("using ImGuiNET;\r\n"));
    assert!(router.contains("uint senderId"));

    let plugin = fs::read_to_string(project.join("Plugin.cs")).unwrap();
    assert_eq!(plugin, "// \"Nunu\" plugin\r\n");

    let csproj = fs::read_to_string(project.join("Nunu.csproj")).unwrap();
    assert!(csproj.contains("Dalamud.NET.Sdk/12.0.2"));
    assert!(csproj.contains("<TargetFramework>net8.0</TargetFramework>"));
    assert!(!csproj.contains("<Reference Include=\"Dalamud\""));

    let manifest = fs::read_to_string(project.join("Nunu.yaml")).unwrap();
    assert!(manifest.contains("using Dalamud API 12."));

    let nuget = fs::read_to_string(project.join("nuget.config")).unwrap();
    assert!(nuget.contains("https://api.nuget.org/v3/index.json"));
}

#[test]
fn test_patch_twice_is_stable() {
    let tmp = TempDir::new().unwrap();
    write_plugin(tmp.path());
    let project = tmp.path().join("src/Nunu");

    let run = || {
        plugsmith(tmp.path())
            .args(["patch", "--mode", "net9", "--skip-detect"])
            .arg("--root")
            .arg(tmp.path())
            .assert()
            .success();
    };

    run();
    let first = fs::read_to_string(project.join("Nunu.csproj")).unwrap();
    run();
    let second = fs::read_to_string(project.join("Nunu.csproj")).unwrap();

    assert_eq!(first, second);
    assert!(second.contains("<PackageReference Include=\"DalamudPackager\" Version=\"13.1.0\""));
    assert!(fs::read_to_string(project.join("ChatRouter.cs"))
        .unwrap()
        .contains("int senderId"));
}

#[test]
fn test_patch_json_events() {
    let tmp = TempDir::new().unwrap();
    write_plugin(tmp.path());

    plugsmith(tmp.path())
        .args(["patch", "--mode", "net9", "--skip-detect", "--message-format", "json"])
        .arg("--root")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""reason":"target-selected""#))
        .stdout(predicate::str::contains(r#""reason":"descriptor-patched""#));
}

#[test]
fn test_project_config_supplies_versions() {
    let tmp = TempDir::new().unwrap();
    write_plugin(tmp.path());
    fs::create_dir_all(tmp.path().join(".plugsmith")).unwrap();
    fs::write(
        tmp.path().join(".plugsmith/config.toml"),
        "[build]\nmode = \"net8\"\n\n[versions]\nsdk12 = \"12.0.9\"\n",
    )
    .unwrap();

    plugsmith(tmp.path())
        .args(["patch", "--skip-detect"])
        .arg("--root")
        .arg(tmp.path())
        .assert()
        .success();

    let csproj = fs::read_to_string(tmp.path().join("src/Nunu/Nunu.csproj")).unwrap();
    assert!(csproj.contains("Dalamud.NET.Sdk/12.0.9"));
}

#[test]
fn test_skip_detect_requires_mode() {
    let tmp = TempDir::new().unwrap();
    write_plugin(tmp.path());

    plugsmith(tmp.path())
        .args(["patch", "--skip-detect"])
        .arg("--root")
        .arg(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("explicit mode"));

    // Nothing was touched.
    let router = fs::read_to_string(tmp.path().join("src/Nunu/ChatRouter.cs")).unwrap();
    assert_eq!(router, CHAT_ROUTER);
}

#[test]
fn test_missing_descriptor() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();

    plugsmith(tmp.path())
        .args(["patch", "--mode", "net9", "--skip-detect"])
        .arg("--root")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no .csproj found"))
        .stderr(predicate::str::contains("--root"));
}

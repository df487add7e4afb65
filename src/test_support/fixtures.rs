//! Test fixtures for plugin project trees.
//!
//! Mirrors the layout of a small Dalamud plugin: a project descriptor, a few
//! C# sources (one of them `ChatRouter.cs`), and optionally build output.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// API 12 era descriptor with direct host references and an explicit packager.
pub const LEGACY_CSPROJ: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net7.0-windows</TargetFramework>
    <Nullable>disable</Nullable>
  </PropertyGroup>
  <ItemGroup Label="DalamudRefs">
    <Reference Include="Dalamud">
      <HintPath>$(DalamudLibPath)Dalamud.dll</HintPath>
    </Reference>
  </ItemGroup>
  <ItemGroup>
    <Reference Include="ImGui.NET">
      <HintPath>$(DalamudLibPath)ImGui.NET.dll</HintPath>
    </Reference>
    <Reference Include="Newtonsoft.Json" />
    <PackageReference Include="DalamudPackager" Version="2.1.13" />
  </ItemGroup>
</Project>
"#;

/// Descriptor with no `PropertyGroup` at all.
pub const BARE_CSPROJ: &str = r#"<Project Sdk="Dalamud.NET.Sdk">
  <ItemGroup>
    <Compile Include="Plugin.cs" />
  </ItemGroup>
</Project>
"#;

/// Chat router source using API 13 bindings and the signed sender id.
pub const CHAT_ROUTER_API13: &str = concat!(
    "using System;\r\n",
    "using Dalamud.Bindings.ImGui;\r\n",
    "\r\n",
    "namespace NunuCompanionAppV2.Core;\r\n",
    "\r\n",
    "public sealed class ChatRouter\r\n",
    "{\r\n",
    "    public void Route(string text, int senderId, int senderIdLength)\r\n",
    "    {\r\n",
    "        // using ImGuiNET; would be the API 12 spelling\r\n",
    "    }\r\n",
    "}\r\n",
);

/// Window source with all three binding imports in API 12 spelling.
pub const MAIN_WINDOW_API12: &str = concat!(
    "using System.Numerics;\r\n",
    "using ImGuiNET;\r\n",
    "  using ImPlotNET;  \r\n",
    "using ImGuizmoNET;\r\n",
    "\r\n",
    "namespace NunuCompanionAppV2.Windows;\r\n",
    "\r\n",
    "public sealed class MainWindow { }\r\n",
);

/// Builder for an on-disk plugin project tree.
#[derive(Debug, Clone)]
pub struct PluginFixture {
    /// Internal (assembly) name.
    pub internal: String,
    /// Directory of the project relative to the root.
    pub project_dir: PathBuf,
    /// Descriptor content.
    pub descriptor: String,
    /// Extra files (path relative to the project directory -> content).
    pub files: BTreeMap<PathBuf, Vec<u8>>,
}

impl PluginFixture {
    /// A plugin named `internal` in `src/<internal>/` with the legacy descriptor.
    pub fn new(internal: impl Into<String>) -> Self {
        let internal = internal.into();
        PluginFixture {
            project_dir: PathBuf::from("src").join(&internal),
            internal,
            descriptor: LEGACY_CSPROJ.to_string(),
            files: BTreeMap::new(),
        }
    }

    /// A plugin with the standard chat router and main window sources.
    pub fn standard(internal: impl Into<String>) -> Self {
        Self::new(internal)
            .with_file("Core/ChatRouter.cs", CHAT_ROUTER_API13)
            .with_file("Windows/MainWindow.cs", MAIN_WINDOW_API12)
    }

    /// Replace the descriptor content.
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = descriptor.into();
        self
    }

    /// Add a file relative to the project directory.
    pub fn with_file(mut self, rel: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(rel.as_ref().to_path_buf(), content.into());
        self
    }

    /// Write the tree under `root`, returning the descriptor path.
    pub fn write(&self, root: &Path) -> PathBuf {
        let dir = root.join(&self.project_dir);
        fs::create_dir_all(&dir).expect("create project dir");

        let descriptor = dir.join(format!("{}.csproj", self.internal));
        fs::write(&descriptor, &self.descriptor).expect("write descriptor");

        for (rel, content) in &self.files {
            let path = dir.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create fixture dir");
            }
            fs::write(&path, content).expect("write fixture file");
        }

        descriptor
    }
}

/// Populate a fake build output directory with the given file names.
pub fn write_build_output(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).expect("create output dir");
    for name in names {
        fs::write(dir.join(name), format!("artifact {}", name)).expect("write artifact");
    }
}

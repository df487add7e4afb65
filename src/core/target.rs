//! Build target selection.
//!
//! A plugin is built either against Dalamud API 12 (.NET 8, legacy
//! `ImGuiNET`-style bindings) or API 13 (.NET 9, `Dalamud.Bindings.*`).
//! Every file mutation the pipeline performs is a function of the selected
//! [`Target`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name of the plugin SDK used as the project `Sdk` attribute.
pub const PLUGIN_SDK: &str = "Dalamud.NET.Sdk";

/// A concrete build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Dalamud API 12 on .NET 8.
    Net8,
    /// Dalamud API 13 on .NET 9.
    Net9,
}

impl Target {
    /// Both targets, lowest first.
    pub const ALL: [Target; 2] = [Target::Net8, Target::Net9];

    /// Required .NET SDK major version.
    pub fn sdk_major(self) -> u64 {
        match self {
            Target::Net8 => 8,
            Target::Net9 => 9,
        }
    }

    /// Dalamud API level.
    pub fn api_level(self) -> u32 {
        match self {
            Target::Net8 => 12,
            Target::Net9 => 13,
        }
    }

    /// Target framework moniker.
    pub fn framework(self) -> &'static str {
        match self {
            Target::Net8 => "net8.0",
            Target::Net9 => "net9.0",
        }
    }

    /// The other target.
    pub fn opposite(self) -> Target {
        match self {
            Target::Net8 => Target::Net9,
            Target::Net9 => Target::Net8,
        }
    }

    /// Project `Sdk` attribute value. API 12 needs the last SDK release that
    /// still shipped API 12 bindings, so it is pinned.
    pub fn sdk_reference(self, api12_sdk_version: &str) -> String {
        match self {
            Target::Net8 => format!("{}/{}", PLUGIN_SDK, api12_sdk_version),
            Target::Net9 => PLUGIN_SDK.to_string(),
        }
    }

    /// Whether the project references the packager explicitly.
    ///
    /// The API 12 SDK bundles it; on API 13 the project carries its own
    /// `PackageReference`.
    pub fn needs_explicit_packager(self) -> bool {
        matches!(self, Target::Net9)
    }

    /// Namespace a binding module is imported from on this target.
    pub fn binding_namespace(self, module: &BindingModule) -> &'static str {
        match self {
            Target::Net8 => module.legacy,
            Target::Net9 => module.modern,
        }
    }

    /// Declared type of the chat sender id on this target.
    pub fn sender_id_type(self) -> &'static str {
        match self {
            Target::Net8 => "uint",
            Target::Net9 => "int",
        }
    }

    /// Short descriptive label used in generated text.
    pub fn label(self) -> String {
        format!("API {}", self.api_level())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Net8 => write!(f, "net8"),
            Target::Net9 => write!(f, "net9"),
        }
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "net8" | "api12" => Ok(Target::Net8),
            "net9" | "api13" => Ok(Target::Net9),
            _ => Err(format!(
                "invalid target '{}'; expected 'net8' or 'net9'",
                s
            )),
        }
    }
}

/// How the target is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Prefer the highest installed SDK major.
    #[default]
    Auto,
    Net8,
    Net9,
}

impl Mode {
    /// The forced target, if any.
    pub fn forced(self) -> Option<Target> {
        match self {
            Mode::Auto => None,
            Mode::Net8 => Some(Target::Net8),
            Mode::Net9 => Some(Target::Net9),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Auto => write!(f, "auto"),
            Mode::Net8 => write!(f, "net8"),
            Mode::Net9 => write!(f, "net9"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Mode::Auto);
        }
        match s.parse::<Target>() {
            Ok(Target::Net8) => Ok(Mode::Net8),
            Ok(Target::Net9) => Ok(Mode::Net9),
            Err(_) => Err(format!(
                "invalid mode '{}'; expected 'auto', 'net8', or 'net9'",
                s
            )),
        }
    }
}

/// One UI binding module and its namespace in each binding generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingModule {
    /// Namespace in the API 12 generation (ImGui.NET and friends).
    pub legacy: &'static str,
    /// Namespace in the API 13 generation (bundled with Dalamud).
    pub modern: &'static str,
}

/// The binding modules whose imports are rewritten per target.
pub const BINDING_MODULES: [BindingModule; 3] = [
    BindingModule {
        legacy: "ImGuiNET",
        modern: "Dalamud.Bindings.ImGui",
    },
    BindingModule {
        legacy: "ImPlotNET",
        modern: "Dalamud.Bindings.ImPlot",
    },
    BindingModule {
        legacy: "ImGuizmoNET",
        modern: "Dalamud.Bindings.ImGuizmo",
    },
];

//! A located plugin project and its well-known paths.

use std::path::{Path, PathBuf};

use crate::core::target::Target;

/// Prefix for the log files written next to the descriptor.
pub const LOG_PREFIX: &str = "plugsmith";

/// A plugin project: its descriptor and internal (assembly) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    descriptor: PathBuf,
    dir: PathBuf,
    internal: String,
}

impl Project {
    /// Create a project from its descriptor path.
    pub fn new(descriptor: impl Into<PathBuf>, internal: impl Into<String>) -> Self {
        let descriptor = descriptor.into();
        let dir = descriptor
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Project {
            descriptor,
            dir,
            internal: internal.into(),
        }
    }

    /// Create a project whose internal name is the descriptor's file stem.
    pub fn from_descriptor(descriptor: impl Into<PathBuf>) -> Self {
        let descriptor = descriptor.into();
        let internal = descriptor
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(descriptor, internal)
    }

    /// Path to the `.csproj`.
    pub fn descriptor(&self) -> &Path {
        &self.descriptor
    }

    /// Directory containing the descriptor.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Assembly and root namespace name.
    pub fn internal(&self) -> &str {
        &self.internal
    }

    /// File name of the plugin manifest (`<internal>.yaml`).
    pub fn manifest_file_name(&self) -> String {
        format!("{}.yaml", self.internal)
    }

    /// Path of the plugin manifest in the project directory.
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(self.manifest_file_name())
    }

    /// File name of the compiled plugin assembly.
    pub fn primary_binary(&self) -> String {
        format!("{}.dll", self.internal)
    }

    /// File name of the assembly's debug symbols.
    pub fn symbols(&self) -> String {
        format!("{}.pdb", self.internal)
    }

    /// Where restore output is logged.
    pub fn restore_log(&self) -> PathBuf {
        self.dir.join(format!("{}-restore.log", LOG_PREFIX))
    }

    /// Where build output is logged.
    pub fn build_log(&self) -> PathBuf {
        self.dir.join(format!("{}-build.log", LOG_PREFIX))
    }

    /// `bin/<configuration>` under the project directory.
    pub fn configuration_dir(&self, configuration: &str) -> PathBuf {
        self.dir.join("bin").join(configuration)
    }

    /// The conventional MSBuild output directory for `target`.
    pub fn conventional_output_dir(&self, configuration: &str, target: Target) -> PathBuf {
        self.configuration_dir(configuration).join(target.framework())
    }
}

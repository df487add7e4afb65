//! Configuration file handling.
//!
//! Settings are read from a global `~/.plugsmith/config.toml` and a project
//! `<root>/.plugsmith/config.toml`. Every field is optional so that a layer
//! only overrides what it sets; command line flags sit on top of both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::Mode;
use crate::ops::manifest::ManifestMeta;

/// Directory holding plugsmith's own files, globally and per project.
pub const CONFIG_DIR: &str = ".plugsmith";

pub const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_CONFIGURATION: &str = "Release";
pub const DEFAULT_SDK12: &str = "12.0.2";
pub const DEFAULT_PACKAGER13: &str = "13.1.0";
/// Deploy directory name, relative to the root.
pub const DEFAULT_DEPLOY_DIR: &str = "Drop";

/// Plugsmith configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub build: BuildConfig,
    pub versions: VersionsConfig,
    pub manifest: ManifestConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Internal (assembly) name
    pub internal: Option<String>,
    /// Deploy directory; relative paths are taken from the root
    pub deploy: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub mode: Option<Mode>,
    /// MSBuild configuration
    pub configuration: Option<String>,
    /// Clear NuGet caches before restoring
    pub clear_cache: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    /// Plugin SDK version for API 12
    pub sdk12: Option<String>,
    /// Packager version for API 13
    pub packager13: Option<String>,
}

/// Overrides for a newly created plugin manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    pub name: Option<String>,
    pub author: Option<String>,
    pub punchline: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ManifestConfig {
    /// Apply the configured values over the built-in manifest text.
    pub fn meta(&self) -> ManifestMeta {
        let mut meta = ManifestMeta::default();
        if let Some(name) = &self.name {
            meta.name = name.clone();
        }
        if let Some(author) = &self.author {
            meta.author = author.clone();
        }
        if let Some(punchline) = &self.punchline {
            meta.punchline = punchline.clone();
        }
        if let Some(description) = &self.description {
            meta.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            meta.tags = tags.clone();
        }
        meta
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        merge_opt(&mut self.project.internal, other.project.internal);
        merge_opt(&mut self.project.deploy, other.project.deploy);

        merge_opt(&mut self.build.mode, other.build.mode);
        merge_opt(&mut self.build.configuration, other.build.configuration);
        merge_opt(&mut self.build.clear_cache, other.build.clear_cache);

        merge_opt(&mut self.versions.sdk12, other.versions.sdk12);
        merge_opt(&mut self.versions.packager13, other.versions.packager13);

        merge_opt(&mut self.manifest.name, other.manifest.name);
        merge_opt(&mut self.manifest.author, other.manifest.author);
        merge_opt(&mut self.manifest.punchline, other.manifest.punchline);
        merge_opt(&mut self.manifest.description, other.manifest.description);
        merge_opt(&mut self.manifest.tags, other.manifest.tags);
    }

    pub fn mode(&self) -> Mode {
        self.build.mode.unwrap_or_default()
    }

    pub fn configuration(&self) -> String {
        self.build
            .configuration
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string())
    }

    pub fn clear_cache(&self) -> bool {
        self.build.clear_cache.unwrap_or(true)
    }

    pub fn sdk12(&self) -> String {
        self.versions
            .sdk12
            .clone()
            .unwrap_or_else(|| DEFAULT_SDK12.to_string())
    }

    pub fn packager13(&self) -> String {
        self.versions
            .packager13
            .clone()
            .unwrap_or_else(|| DEFAULT_PACKAGER13.to_string())
    }

    /// The deploy directory for `root`.
    pub fn deploy_dir(&self, root: &Path) -> PathBuf {
        match &self.project.deploy {
            Some(dir) => root.join(dir),
            None => root.join(DEFAULT_DEPLOY_DIR),
        }
    }
}

fn merge_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.plugsmith/config.toml)
/// 2. Global config (~/.plugsmith/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Load the configuration that applies to `root`.
pub fn load_for_root(root: &Path) -> Config {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(root))
}

/// Get the global plugsmith config directory (~/.plugsmith).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the global config path (~/.plugsmith/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Get the project config path (<root>/.plugsmith/config.toml).
pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

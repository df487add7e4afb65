//! .NET toolchain discovery.
//!
//! The only things plugsmith asks of the `dotnet` CLI up front are which SDK
//! versions are installed; [`InstalledSdks`] keeps both the parsed versions
//! and the raw listing for later pin reconciliation.

pub mod detect;

use std::cmp::Ordering;

use thiserror::Error;

use crate::core::Target;

pub use detect::{detect_sdks, require_target, select_target};

/// The .NET CLI executable.
pub const DOTNET: &str = "dotnet";

/// Installed SDKs as reported by `dotnet --list-sdks`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSdks {
    versions: Vec<String>,
    raw: String,
}

impl InstalledSdks {
    /// Parse a listing, taking the first whitespace-separated token of each
    /// non-empty line as a version.
    pub fn parse(listing: &str) -> Self {
        let versions = listing
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect();

        InstalledSdks {
            versions,
            raw: listing.to_string(),
        }
    }

    /// All listed versions, in listing order.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// The unparsed listing.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether any SDK with the given major version is installed.
    pub fn has_major(&self, major: u64) -> bool {
        self.versions_for_major(major).next().is_some()
    }

    /// Whether the SDK required by `target` is installed.
    pub fn supports(&self, target: Target) -> bool {
        self.has_major(target.sdk_major())
    }

    /// Installed versions whose major matches.
    pub fn versions_for_major(&self, major: u64) -> impl Iterator<Item = &str> {
        let prefix = format!("{}.", major);
        self.versions
            .iter()
            .map(String::as_str)
            .filter(move |v| v.starts_with(&prefix))
    }

    /// Highest installed version with the given major.
    pub fn highest_for_major(&self, major: u64) -> Option<&str> {
        self.versions_for_major(major)
            .max_by(|a, b| compare_versions(a, b))
    }
}

/// Order two SDK version strings.
///
/// Semver ordering when both parse (so `9.0.301` > `9.0.99`), plain string
/// ordering otherwise.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

/// Leading major component of a version string, if numeric.
pub fn major_of(version: &str) -> Option<u64> {
    version.trim().split('.').next()?.parse().ok()
}

/// Toolchain prerequisites that cannot be satisfied.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error(".NET SDK not found in PATH; install the .NET 8 or .NET 9 SDK")]
    NotInstalled,

    #[error(".NET {major} SDK is required for {target} but is not installed{}", installed_list(.installed))]
    MissingMajor {
        major: u64,
        target: Target,
        installed: Vec<String>,
    },
}

fn installed_list(installed: &[String]) -> String {
    if installed.is_empty() {
        String::new()
    } else {
        format!(" (installed: {})", installed.join(", "))
    }
}

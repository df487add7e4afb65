//! Build output discovery and artifact deployment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::{Project, Target};
use crate::util::fs::{ensure_dir, newest_file_named};

/// Packager outputs copied when present.
pub const OPTIONAL_ARTIFACTS: [&str; 3] = ["manifest.json", "latest.zip", "icon.png"];

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("{binary} not found in {}", dir.display())]
    MissingPrimary { binary: String, dir: PathBuf },

    #[error("build output not found for {binary} in {}", dir.display())]
    OutputNotFound { binary: String, dir: PathBuf },
}

/// Find the directory holding the built plugin.
///
/// The conventional `bin/<configuration>/<framework>` is used when it
/// exists; otherwise the directory of the most recently modified primary
/// binary below `bin/<configuration>`. If the chosen directory has a
/// subdirectory named after the plugin (the packager's layout), that wins.
pub fn locate_output_dir(
    project: &Project,
    configuration: &str,
    target: Target,
) -> Result<PathBuf, DeployError> {
    let conventional = project.conventional_output_dir(configuration, target);

    let dir = if conventional.is_dir() {
        conventional
    } else {
        let search_root = project.configuration_dir(configuration);
        let binary = project.primary_binary();
        newest_file_named(&search_root, &binary)
            .and_then(|path| path.parent().map(Path::to_path_buf))
            .ok_or(DeployError::OutputNotFound {
                binary,
                dir: search_root,
            })?
    };

    let nested = dir.join(project.internal());
    if nested.is_dir() {
        return Ok(nested);
    }
    Ok(dir)
}

/// The files [`deploy`] would copy from `output_dir`, in copy order.
///
/// Fails only when the primary binary is missing.
pub fn collect_artifacts(output_dir: &Path, project: &Project) -> Result<Vec<PathBuf>, DeployError> {
    let binary = output_dir.join(project.primary_binary());
    if !binary.is_file() {
        return Err(DeployError::MissingPrimary {
            binary: project.primary_binary(),
            dir: output_dir.to_path_buf(),
        });
    }

    let mut items = vec![binary];

    let symbols = output_dir.join(project.symbols());
    if symbols.is_file() {
        items.push(symbols);
    }

    let built_manifest = output_dir.join(project.manifest_file_name());
    let source_manifest = project.manifest_path();
    if built_manifest.is_file() {
        items.push(built_manifest);
    } else if source_manifest.is_file() {
        items.push(source_manifest);
    } else {
        tracing::warn!(
            "{} not found in output or project directory; not deployed",
            project.manifest_file_name()
        );
    }

    items.extend(
        OPTIONAL_ARTIFACTS
            .iter()
            .map(|name| output_dir.join(name))
            .filter(|path| path.is_file()),
    );

    Ok(items)
}

/// Copy the plugin's artifacts from `output_dir` into `deploy_dir`.
///
/// Returns the destination paths.
pub fn deploy(output_dir: &Path, project: &Project, deploy_dir: &Path) -> Result<Vec<PathBuf>> {
    let items = collect_artifacts(output_dir, project)?;
    ensure_dir(deploy_dir)?;

    let mut deployed = Vec::with_capacity(items.len());
    for item in items {
        let Some(name) = item.file_name() else {
            continue;
        };
        let dest = deploy_dir.join(name);
        fs::copy(&item, &dest).with_context(|| {
            format!("failed to copy {} to {}", item.display(), dest.display())
        })?;
        tracing::info!("deployed {}", name.to_string_lossy());
        deployed.push(dest);
    }

    Ok(deployed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_build_output;
    use tempfile::TempDir;

    fn project(root: &Path) -> Project {
        Project::new(root.join("Nunu.csproj"), "Nunu")
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_deploy_tolerates_missing_optionals() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path());
        let out = tmp.path().join("bin/Release/net9.0");
        write_build_output(&out, &["Nunu.dll", "latest.zip"]);
        fs::write(project.manifest_path(), "name: Nunu\n").unwrap();

        let drop = tmp.path().join("Drop");
        let deployed = deploy(&out, &project, &drop).unwrap();

        assert_eq!(names(&deployed), ["Nunu.dll", "Nunu.yaml", "latest.zip"]);
        assert_eq!(fs::read_to_string(drop.join("Nunu.yaml")).unwrap(), "name: Nunu\n");
    }

    #[test]
    fn test_output_manifest_preferred() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path());
        let out = tmp.path().join("out");
        write_build_output(&out, &["Nunu.dll", "Nunu.pdb", "Nunu.yaml", "icon.png", "manifest.json"]);
        fs::write(project.manifest_path(), "stale").unwrap();

        let items = collect_artifacts(&out, &project).unwrap();
        assert_eq!(
            names(&items),
            ["Nunu.dll", "Nunu.pdb", "Nunu.yaml", "manifest.json", "icon.png"]
        );
        assert_eq!(items[2], out.join("Nunu.yaml"));
    }

    #[test]
    fn test_missing_primary_fails() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path());
        let out = tmp.path().join("out");
        write_build_output(&out, &["Nunu.pdb"]);

        let err = deploy(&out, &project, &tmp.path().join("Drop")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::MissingPrimary { .. })
        ));
        assert!(!tmp.path().join("Drop").exists());
    }

    #[test]
    fn test_locate_output_dir() {
        let tmp = TempDir::new().unwrap();
        let project = project(tmp.path());

        assert!(matches!(
            locate_output_dir(&project, "Release", Target::Net9),
            Err(DeployError::OutputNotFound { .. })
        ));

        // Non-conventional layout: found by searching for the binary.
        let other = tmp.path().join("bin/Release/net9.0-windows/win-x64");
        write_build_output(&other, &["Nunu.dll"]);
        assert_eq!(locate_output_dir(&project, "Release", Target::Net9).unwrap(), other);

        // Conventional layout with a packager subdirectory.
        let conventional = tmp.path().join("bin/Release/net9.0");
        write_build_output(&conventional.join("Nunu"), &["Nunu.dll"]);
        assert_eq!(
            locate_output_dir(&project, "Release", Target::Net9).unwrap(),
            conventional.join("Nunu")
        );
    }
}

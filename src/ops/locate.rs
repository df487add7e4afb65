//! Project descriptor discovery.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::util::fs::walk_files;

/// Extension of MSBuild C# project files.
pub const DESCRIPTOR_EXTENSION: &str = "csproj";

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no .csproj found under {}", root.display())]
    NotFound { root: PathBuf },
}

/// Find the project descriptor under `root`.
///
/// Build output (`bin/`, `obj/`) is ignored. A descriptor whose file stem
/// equals `preferred` (ignoring case) wins; otherwise the candidate with the
/// lexicographically smallest lowercased path is chosen, so the pick is
/// stable regardless of directory iteration order.
pub fn find_descriptor(root: &Path, preferred: Option<&str>) -> Result<PathBuf, LocateError> {
    let candidates = walk_files(root, DESCRIPTOR_EXTENSION);
    tracing::debug!("descriptor candidates: {:?}", candidates);

    if let Some(name) = preferred {
        let exact = candidates.iter().find(|p| {
            p.file_stem()
                .map(|s| s.to_string_lossy().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        });
        if let Some(path) = exact {
            return Ok(path.clone());
        }
    }

    candidates
        .into_iter()
        .min_by_key(|p| p.to_string_lossy().to_lowercase())
        .ok_or_else(|| LocateError::NotFound {
            root: root.to_path_buf(),
        })
}

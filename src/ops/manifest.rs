//! Plugin manifest (`<internal>.yaml`) creation.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::{Project, Target};
use crate::util::fs::write_string;

/// Values substituted into a newly created manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestMeta {
    pub name: String,
    pub author: String,
    pub punchline: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl Default for ManifestMeta {
    fn default() -> Self {
        ManifestMeta {
            name: "Nunu Companion App V2.0".to_string(),
            author: "The Nunu".to_string(),
            punchline: "Minimal chat capture window.".to_string(),
            description: "Simple chat capture and viewer".to_string(),
            tags: vec!["utility".to_string(), "chat".to_string()],
        }
    }
}

/// Render the manifest text for `target`.
pub fn render_manifest(meta: &ManifestMeta, target: Target) -> String {
    format!(
        "name: {}\n\
         author: {}\n\
         punchline: {}\n\
         description: |\n  \
         {} using Dalamud {}.\n\
         tags: [{}]\n",
        meta.name,
        meta.author,
        meta.punchline,
        meta.description,
        target.label(),
        meta.tags.join(", ")
    )
}

/// Create the project's manifest unless one already exists.
///
/// Returns whether a file was written. An existing manifest is never
/// touched, even if it was generated for the other target.
pub fn ensure_manifest(project: &Project, target: Target, meta: &ManifestMeta) -> Result<bool> {
    let path = project.manifest_path();
    if path.exists() {
        tracing::debug!("manifest exists: {}", path.display());
        return Ok(false);
    }

    write_string(&path, &render_manifest(meta, target))?;
    tracing::info!("manifest created: {}", path.display());
    Ok(true)
}

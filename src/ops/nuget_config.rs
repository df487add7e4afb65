//! `nuget.config` next to the project, so restore can always reach nuget.org
//! even when the machine-wide config has been stripped down.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::util::fs::{read_to_string, write_string};

pub const NUGET_CONFIG: &str = "nuget.config";

const NUGET_ORG_KEY: &str = "nuget.org";
const NUGET_ORG_SOURCE: &str =
    r#"<add key="nuget.org" value="https://api.nuget.org/v3/index.json" protocolVersion="3" />"#;

static EMPTY_SOURCES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<packageSources\s*/>").expect("valid packageSources regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NugetOutcome {
    Created(PathBuf),
    SourceAdded(PathBuf),
    Present(PathBuf),
    /// The file exists but has neither `packageSources` nor `configuration`.
    Unrecognized(PathBuf),
}

fn default_config() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <configuration>\n  \
         <packageSources>\n    \
         {}\n  \
         </packageSources>\n\
         </configuration>\n",
        NUGET_ORG_SOURCE
    )
}

/// Find an existing config in `dir`; NuGet matches the name case-insensitively.
fn find_config(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .map(|n| n.to_string_lossy().eq_ignore_ascii_case(NUGET_CONFIG))
                    .unwrap_or(false)
        })
}

/// Add the nuget.org source to `text`, if it can be placed.
pub fn add_nuget_org(text: &str) -> Option<String> {
    if let Some(index) = text.find("</packageSources>") {
        let mut out = String::with_capacity(text.len() + NUGET_ORG_SOURCE.len() + 8);
        out.push_str(&text[..index]);
        out.push_str("  ");
        out.push_str(NUGET_ORG_SOURCE);
        out.push_str("\n  ");
        out.push_str(&text[index..]);
        return Some(out);
    }

    if let Some(found) = EMPTY_SOURCES.find(text) {
        let mut out = String::with_capacity(text.len() + NUGET_ORG_SOURCE.len() + 40);
        out.push_str(&text[..found.start()]);
        out.push_str("<packageSources>\n    ");
        out.push_str(NUGET_ORG_SOURCE);
        out.push_str("\n  </packageSources>");
        out.push_str(&text[found.end()..]);
        return Some(out);
    }

    let index = text.find("</configuration>")?;
    let mut out = String::with_capacity(text.len() + NUGET_ORG_SOURCE.len() + 48);
    out.push_str(&text[..index]);
    out.push_str("  <packageSources>\n    ");
    out.push_str(NUGET_ORG_SOURCE);
    out.push_str("\n  </packageSources>\n");
    out.push_str(&text[index..]);
    Some(out)
}

/// Make sure `project_dir` has a NuGet config that lists nuget.org.
pub fn ensure_nuget_config(project_dir: &Path) -> Result<NugetOutcome> {
    let Some(path) = find_config(project_dir) else {
        let path = project_dir.join(NUGET_CONFIG);
        write_string(&path, &default_config())?;
        return Ok(NugetOutcome::Created(path));
    };

    let text = read_to_string(&path)?;
    if text.to_lowercase().contains(NUGET_ORG_KEY) {
        return Ok(NugetOutcome::Present(path));
    }

    match add_nuget_org(&text) {
        Some(updated) => {
            write_string(&path, &updated)?;
            Ok(NugetOutcome::SourceAdded(path))
        }
        None => {
            tracing::warn!("{} has no <configuration>; not modified", path.display());
            Ok(NugetOutcome::Unrecognized(path))
        }
    }
}

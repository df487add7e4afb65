//! Command implementations

pub mod build;
pub mod completions;
pub mod doctor;
pub mod patch;

use std::path::PathBuf;

use anyhow::{Context, Result};

use plugsmith::ops::PipelineOptions;
use plugsmith::util::config::load_for_root;

use crate::cli::ProjectArgs;

/// Resolve the pipeline options: command line, then project and global
/// config, then defaults.
pub(crate) fn pipeline_options(args: &ProjectArgs, deploy: Option<PathBuf>) -> Result<PipelineOptions> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("failed to read the current directory")?,
    };
    let config = load_for_root(&root);

    let deploy_dir = match deploy {
        Some(dir) => dir,
        None => config.deploy_dir(&root),
    };

    Ok(PipelineOptions {
        internal: args.internal.clone().or_else(|| config.project.internal.clone()),
        deploy_dir,
        mode: args.mode.unwrap_or_else(|| config.mode()),
        sdk12: args.sdk12.clone().unwrap_or_else(|| config.sdk12()),
        packager13: args.packager13.clone().unwrap_or_else(|| config.packager13()),
        configuration: config.configuration(),
        clear_cache: config.clear_cache(),
        manifest: config.manifest.meta(),
        skip_detect: false,
        root,
    })
}

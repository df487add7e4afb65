//! Pipeline events.
//!
//! The pipeline reports progress by emitting [`PipelineEvent`]s to an
//! [`EventSink`]. The shell renders them as status lines, or as one JSON
//! object per line with `--message-format=json`.
//!
//! The JSON schema is tagged by `reason`; fields may be added but existing
//! ones are not renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::{Mode, Target};

/// A step of the pipeline that runs an external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    ClearCache,
    Restore,
    Build,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::ClearCache => "cache clear",
            Step::Restore => "restore",
            Step::Build => "build",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum PipelineEvent {
    /// The build target was chosen.
    TargetSelected {
        mode: Mode,
        target: Target,
        api_level: u32,
    },

    /// The project descriptor was found.
    ProjectLocated {
        descriptor: PathBuf,
        internal: String,
    },

    /// A file was created or modified.
    FileChanged { path: PathBuf, action: String },

    SourcesSanitized { count: usize },

    SourcesPatched { count: usize, target: Target },

    /// The descriptor was reconciled; `edits` is empty when it already matched.
    DescriptorPatched { path: PathBuf, edits: Vec<String> },

    /// A step was skipped or a best-effort action failed.
    Skipped { what: String, detail: String },

    /// A long-running command started.
    StepStarted {
        step: Step,
        #[serde(skip_serializing_if = "Option::is_none")]
        log: Option<PathBuf>,
    },

    StepFinished {
        step: Step,
        success: bool,
        duration_ms: u64,
    },

    /// The output directory used for deployment.
    OutputLocated { dir: PathBuf },

    ArtifactDeployed { path: PathBuf },

    /// The pipeline completed.
    Finished {
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        deploy_dir: Option<PathBuf>,
        logs: Vec<PathBuf>,
    },
}

impl PipelineEvent {
    pub fn file_changed(path: impl Into<PathBuf>, action: impl Into<String>) -> Self {
        PipelineEvent::FileChanged {
            path: path.into(),
            action: action.into(),
        }
    }

    pub fn skipped(what: impl Into<String>, detail: impl Into<String>) -> Self {
        PipelineEvent::Skipped {
            what: what.into(),
            detail: detail.into(),
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receiver of pipeline events.
pub trait EventSink {
    fn emit(&self, event: PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}

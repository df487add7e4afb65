//! Centralized shell output and progress management.
//!
//! Every user-facing line goes through [`Shell`]:
//! - status messages with a right-aligned, optionally colored status word
//! - a spinner while `dotnet restore` / `dotnet build` run
//! - JSON output mode, one pipeline event per line on stdout
//!
//! Human and JSON output are mutually exclusive. Human output goes to stderr.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::ops::events::{EventSink, PipelineEvent, Step};

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors and a spinner.
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    /// Machine-readable JSON output only.
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no spinner
    Quiet,
    #[default]
    Normal,
    /// --verbose: per-edit detail, step timings, no spinner
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Selected,
    Located,
    Sanitized,
    Patched,
    Updated,
    Deployed,
    Finished,

    // In-progress statuses (cyan)
    Clearing,
    Restoring,
    Building,

    Info,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Selected => "Selected",
            Status::Located => "Located",
            Status::Sanitized => "Sanitized",
            Status::Patched => "Patched",
            Status::Updated => "Updated",
            Status::Deployed => "Deployed",
            Status::Finished => "Finished",
            Status::Clearing => "Clearing",
            Status::Restoring => "Restoring",
            Status::Building => "Building",
            Status::Info => "Info",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Selected
            | Status::Located
            | Status::Sanitized
            | Status::Patched
            | Status::Updated
            | Status::Deployed
            | Status::Finished => "\x1b[1;32m",
            Status::Clearing | Status::Restoring | Status::Building => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }

    /// Width the status word is right-aligned to.
    const WIDTH: usize = 12;

    fn for_step(step: Step) -> Status {
        match step {
            Step::ClearCache => Status::Clearing,
            Step::Restore => Status::Restoring,
            Step::Build => Status::Building,
        }
    }
}

/// Central shell for all CLI output.
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
    /// Spinner for the command currently running, if any.
    spinner: Mutex<Option<ProgressBar>>,
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell {
            mode,
            use_color,
            spinner: Mutex::new(None),
        }
    }

    /// Create a shell from CLI flags.
    ///
    /// JSON mode takes precedence over quiet/verbose.
    pub fn from_flags(
        quiet: bool,
        verbose: bool,
        color: ColorChoice,
        message_format_json: bool,
    ) -> Self {
        let mode = if message_format_json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    pub fn mode(&self) -> &ShellMode {
        &self.mode
    }

    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`
    ///
    /// In quiet mode, only Error status is printed. In JSON mode nothing is.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() {
            return;
        }

        if self.is_quiet() && status != Status::Error {
            return;
        }

        let line = format!("{} {}", self.format_status(status), msg);
        match self.active_spinner() {
            Some(spinner) => spinner.println(line),
            None => eprintln!("{}", line),
        }
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print an error message.
    ///
    /// In JSON mode, this outputs a JSON error event.
    pub fn error(&self, msg: impl Display) {
        if self.is_json() {
            let event = serde_json::json!({
                "reason": "error",
                "message": msg.to_string()
            });
            self.json_line(&event.to_string());
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// Print an indented detail line (Human mode, not quiet).
    pub fn detail(&self, msg: impl Display) {
        if self.is_json() || self.is_quiet() {
            return;
        }
        eprintln!("{:width$} {}", "", msg, width = Status::WIDTH);
    }

    fn json_line(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();

        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = Status::WIDTH
            )
        } else {
            format!("{:>width$}", text, width = Status::WIDTH)
        }
    }

    fn active_spinner(&self) -> Option<ProgressBar> {
        self.spinner.lock().ok().and_then(|s| s.clone())
    }

    fn start_spinner(&self, msg: String) {
        if self.is_json() || self.is_quiet() || self.is_verbose() {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} {elapsed}") {
            spinner.set_style(style);
        }
        spinner.set_message(msg);
        spinner.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(spinner);
        }
    }

    fn stop_spinner(&self) {
        if let Some(spinner) = self.spinner.lock().ok().and_then(|mut s| s.take()) {
            spinner.finish_and_clear();
        }
    }

    fn render(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::TargetSelected { mode, target, .. } => self.status(
                Status::Selected,
                format!("{} ({}, mode {})", target, target.label(), mode),
            ),
            PipelineEvent::ProjectLocated {
                descriptor,
                internal,
            } => self.status(
                Status::Located,
                format!("{} ({})", descriptor.display(), internal),
            ),
            PipelineEvent::FileChanged { path, action } => {
                self.status(Status::Updated, format!("{} ({})", path.display(), action))
            }
            PipelineEvent::SourcesSanitized { count } => {
                self.status(Status::Sanitized, format!("{} file(s)", count))
            }
            PipelineEvent::SourcesPatched { count, target } => self.status(
                Status::Patched,
                format!("{} source file(s) for {}", count, target.label()),
            ),
            PipelineEvent::DescriptorPatched { path, edits } => {
                if edits.is_empty() {
                    self.status(Status::Patched, format!("{} (up to date)", file_name(path)));
                } else {
                    self.status(
                        Status::Patched,
                        format!("{} ({} edit(s))", file_name(path), edits.len()),
                    );
                    if self.is_verbose() {
                        for edit in edits {
                            self.detail(edit);
                        }
                    }
                }
            }
            PipelineEvent::Skipped { what, detail } => {
                self.status(Status::Skipped, format!("{}: {}", what, detail))
            }
            PipelineEvent::StepStarted { step, log } => {
                let msg = match log {
                    Some(log) => format!("dotnet {} (log: {})", step.name(), log.display()),
                    None => format!("dotnet {}", step.name()),
                };
                self.status(Status::for_step(*step), &msg);
                self.start_spinner(msg);
            }
            PipelineEvent::StepFinished {
                step,
                success,
                duration_ms,
            } => {
                self.stop_spinner();
                if *success && self.is_verbose() {
                    self.status(
                        Status::Finished,
                        format!(
                            "{} in {}",
                            step.name(),
                            format_duration(Duration::from_millis(*duration_ms))
                        ),
                    );
                }
            }
            PipelineEvent::OutputLocated { dir } => {
                self.status(Status::Located, format!("output {}", dir.display()))
            }
            PipelineEvent::ArtifactDeployed { path } => {
                self.status(Status::Deployed, file_name(path))
            }
            PipelineEvent::Finished { duration_ms, .. } => self.status(
                Status::Finished,
                format!(
                    "build and deploy in {}",
                    format_duration(Duration::from_millis(*duration_ms))
                ),
            ),
        }
    }
}

impl EventSink for Shell {
    fn emit(&self, event: PipelineEvent) {
        if self.is_json() {
            self.json_line(&event.to_json());
        } else {
            self.render(&event);
        }
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("mode", &self.mode)
            .field("use_color", &self.use_color)
            .finish()
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format a duration in a human-readable way.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

//! User-friendly diagnostic messages.
//!
//! Fatal errors are printed with the failing cause and, when the cause is
//! one plugsmith knows about, a suggested fix.

use std::fmt;
use std::path::PathBuf;

use crate::core::Target;
use crate::ops::deploy::DeployError;
use crate::ops::descriptor::DescriptorError;
use crate::ops::locate::LocateError;
use crate::toolchain::ToolchainError;
use crate::util::process::ProcessError;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when the `dotnet` CLI is missing.
    pub const INSTALL_DOTNET: &str =
        "help: Install the .NET 9 SDK (API 13) or the .NET 8 SDK (API 12) from https://dot.net";

    /// Suggestion when no project descriptor is found.
    pub const NO_DESCRIPTOR: &str =
        "help: Pass --root pointing at the plugin repository, or run from inside it";

    /// Suggestion when the descriptor cannot be parsed.
    pub const BAD_DESCRIPTOR: &str =
        "help: Fix the XML in the .csproj; plugsmith only edits well-formed project files";

    /// Suggestion when restore or build fails.
    pub const BUILD_FAILED: &str = "help: See the full log, or run `plugsmith build --verbose`";

    /// Suggestion when the build output cannot be found.
    pub const OUTPUT_NOT_FOUND: &str =
        "help: Check that --configuration matches the configuration that was built";

    /// Suggestion for checking the environment.
    pub const RUN_DOCTOR: &str = "help: Run `plugsmith doctor` to see the installed SDKs";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Self::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m",
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m",
            (false, Severity::Error) => "error",
            (false, Severity::Warning) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            for suggestion in &self.suggestions {
                if color {
                    let text = suggestion.strip_prefix("help: ").unwrap_or(suggestion);
                    output.push_str(&format!("\x1b[1;32mhelp\x1b[0m: {}\n", text));
                } else {
                    output.push_str(&format!("{}\n", suggestion));
                }
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Build the diagnostic printed for a fatal error.
///
/// The message is the full context chain; suggestions come from the first
/// recognized error in the chain.
pub fn diagnose(err: &anyhow::Error) -> Diagnostic {
    let mut diag = Diagnostic::error(format!("{:#}", err));

    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ToolchainError>() {
            diag = match e {
                ToolchainError::NotInstalled => diag.with_suggestion(suggestions::INSTALL_DOTNET),
                ToolchainError::MissingMajor { target, .. } => diag
                    .with_suggestion(install_hint(*target))
                    .with_suggestion(format!(
                        "help: Or build for {} with --mode {}",
                        target.opposite().label(),
                        target.opposite()
                    )),
            };
            return diag.with_suggestion(suggestions::RUN_DOCTOR);
        }
        if let Some(LocateError::NotFound { root }) = cause.downcast_ref::<LocateError>() {
            return diag
                .with_location(root.clone())
                .with_suggestion(suggestions::NO_DESCRIPTOR);
        }
        if cause.downcast_ref::<DescriptorError>().is_some() {
            return diag.with_suggestion(suggestions::BAD_DESCRIPTOR);
        }
        if let Some(e) = cause.downcast_ref::<DeployError>() {
            let dir = match e {
                DeployError::MissingPrimary { dir, .. } | DeployError::OutputNotFound { dir, .. } => dir,
            };
            return diag
                .with_location(dir.clone())
                .with_suggestion(suggestions::OUTPUT_NOT_FOUND);
        }
        if let Some(e) = cause.downcast_ref::<ProcessError>() {
            return match e {
                ProcessError::NotFound { .. } => diag.with_suggestion(suggestions::INSTALL_DOTNET),
                ProcessError::Failed { .. } => diag.with_suggestion(suggestions::BUILD_FAILED),
                _ => diag,
            };
        }
    }

    diag
}

fn install_hint(target: Target) -> String {
    format!(
        "help: Install the .NET {} SDK to build for {}",
        target.sdk_major(),
        target.label()
    )
}

/// Exit code for a fatal error: the failed subprocess's code when there is
/// one, otherwise 1.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ProcessError>())
        .map(ProcessError::exit_code)
        .unwrap_or(1)
}

/// The captured output tail of a failed subprocess in the chain.
pub fn failure_tail(err: &anyhow::Error) -> Option<&str> {
    err.chain().find_map(|cause| match cause.downcast_ref::<ProcessError>() {
        Some(ProcessError::Failed { tail, .. }) if !tail.trim().is_empty() => Some(tail.as_str()),
        _ => None,
    })
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

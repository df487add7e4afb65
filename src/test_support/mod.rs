//! Test utilities and mocks for plugsmith unit tests.
//!
//! [`MockRunner`] stands in for the .NET CLI: responses are keyed by command
//! prefix and every invocation is recorded so tests can assert on the exact
//! sequence of subprocess calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use plugsmith::test_support::MockRunner;
//! use plugsmith::util::process::CommandOutput;
//!
//! let runner = MockRunner::new()
//!     .on("dotnet --list-sdks", CommandOutput::success("9.0.301 [/usr/share/dotnet/sdk]\n"));
//! ```

pub mod fixtures;

use std::sync::Mutex;

use crate::ops::events::{EventSink, PipelineEvent};
use crate::util::process::{CommandOutput, CommandRunner, ProcessBuilder, ProcessError};

pub use fixtures::*;

/// Scripted response for a command prefix.
#[derive(Debug, Clone)]
enum MockResponse {
    Output(CommandOutput),
    NotFound,
}

/// Mock command runner for testing without spawning processes.
///
/// Commands with no matching expectation succeed with empty output.
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: Vec<(String, MockResponse)>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    /// Create a runner with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to commands starting with `prefix` with `output`.
    pub fn on(mut self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        self.responses
            .push((prefix.into(), MockResponse::Output(output)));
        self
    }

    /// Pretend the program behind commands starting with `prefix` is not installed.
    pub fn not_found(mut self, prefix: impl Into<String>) -> Self {
        self.responses.push((prefix.into(), MockResponse::NotFound));
        self
    }

    /// All commands run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Whether any command starting with `prefix` was run.
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput, ProcessError> {
        let line = cmd.display_command();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        let response = self
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, r)| r.clone());

        match response {
            Some(MockResponse::Output(out)) => Ok(out),
            Some(MockResponse::NotFound) => Err(ProcessError::NotFound {
                program: cmd.get_program().display().to_string(),
            }),
            None => Ok(CommandOutput::success("")),
        }
    }
}

/// Event sink that keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_matches_prefix_and_records_calls() {
        let runner = MockRunner::new()
            .on("dotnet --list-sdks", CommandOutput::success("8.0.404 [sdk]"))
            .not_found("nuget");

        let out = runner
            .run(&ProcessBuilder::new("dotnet").arg("--list-sdks"))
            .unwrap();
        assert_eq!(out.output, "8.0.404 [sdk]");

        let err = runner.run(&ProcessBuilder::new("nuget")).unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { .. }));

        let out = runner
            .run(&ProcessBuilder::new("dotnet").arg("restore"))
            .unwrap();
        assert!(out.is_success());

        assert_eq!(
            runner.calls(),
            vec!["dotnet --list-sdks", "nuget", "dotnet restore"]
        );
        assert!(runner.was_called("dotnet restore"));
        assert!(!runner.was_called("dotnet build"));
    }
}

//! Subprocess execution utilities.
//!
//! Every external command goes through the [`CommandRunner`] trait so the
//! pipeline can be driven by a scripted runner in tests. [`SystemRunner`] is
//! the real implementation: it blocks until the child exits and captures
//! stdout and stderr interleaved into a single transcript.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// Number of trailing output lines surfaced when a command fails.
pub const FAILURE_TAIL_LINES: usize = 160;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command with stderr merged into stdout and wait for it.
    ///
    /// Both streams are pointed at the same anonymous temp file, so the
    /// transcript keeps the order in which the child wrote it.
    pub fn exec_merged(&self) -> Result<CommandOutput, ProcessError> {
        let command = self.display_command();
        let io_err = |source| ProcessError::Io {
            command: command.clone(),
            source,
        };

        let mut sink = tempfile::tempfile().map_err(io_err)?;
        let stdout = sink.try_clone().map_err(io_err)?;
        let stderr = sink.try_clone().map_err(io_err)?;

        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        let status = match cmd.status() {
            Ok(status) => status,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProcessError::NotFound {
                    program: self.program.display().to_string(),
                });
            }
            Err(source) => return Err(ProcessError::Spawn { command, source }),
        };

        let output = read_transcript(&mut sink).map_err(io_err)?;

        Ok(CommandOutput {
            code: status.code(),
            output,
        })
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn read_transcript(sink: &mut File) -> io::Result<String> {
    sink.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    sink.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Combined stdout and stderr.
    pub output: String,
}

impl CommandOutput {
    /// A successful run with the given output.
    pub fn success(output: impl Into<String>) -> Self {
        CommandOutput {
            code: Some(0),
            output: output.into(),
        }
    }

    /// A failed run with the given exit code and output.
    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        CommandOutput {
            code: Some(code),
            output: output.into(),
        }
    }

    /// Whether the process exited with status zero.
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Errors raised while running external commands.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("`{program}` was not found on PATH")]
    NotFound { program: String },

    #[error("failed to launch `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with exit code {}", display_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        /// Last lines of the combined output.
        tail: String,
    },

    #[error("failed to capture output of `{command}`")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Exit code to propagate from the tool itself.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProcessError::Failed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

/// Capability to run an external command to completion.
pub trait CommandRunner {
    /// Run `cmd`, returning its exit code and combined output.
    ///
    /// A nonzero exit is not an error at this level.
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput, ProcessError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput, ProcessError> {
        cmd.exec_merged()
    }
}

/// Run a command and require success.
///
/// The transcript is written to `log` when given. Failing to write the log is
/// reported and otherwise ignored. On a nonzero exit the error carries the
/// last [`FAILURE_TAIL_LINES`] lines of output.
pub fn run_logged<R>(
    runner: &R,
    cmd: &ProcessBuilder,
    log: Option<&Path>,
) -> Result<String, ProcessError>
where
    R: CommandRunner + ?Sized,
{
    let command = cmd.display_command();
    tracing::info!("Run: {}", command);

    let out = runner.run(cmd)?;

    if let Some(log) = log {
        if let Err(e) = std::fs::write(log, &out.output) {
            tracing::warn!("could not write log {}: {}", log.display(), e);
        }
    }

    if !out.is_success() {
        return Err(ProcessError::Failed {
            command,
            code: out.code,
            tail: tail_lines(&out.output, FAILURE_TAIL_LINES),
        });
    }

    Ok(out.output)
}

/// Keep the last `n` lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

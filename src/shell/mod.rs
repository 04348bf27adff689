pub mod default;
pub mod scripted;

pub use default::DefaultShell;
pub use scripted::ScriptedShell;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while running a child process
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Execution of '{command}' failed with exit status {exit_code}")]
    Failed { command: String, exit_code: i32 },

    #[error("Execution of '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("IO error while running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No scripted output for '{0}'")]
    Unscripted(String),
}

/// A program and its argument vector
///
/// Displays as the space-joined command string, which is what gets logged
/// and what [`ScriptedShell`] matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Create a command line for `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build a `git <args...>` command line
    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git").args(args)
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Options for a single process invocation
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Working directory for the child, or the caller's when `None`
    pub directory: Option<PathBuf>,
    /// Environment variables set for the child only
    pub set_env_vars: Vec<(String, String)>,
    /// Environment variables removed from the child's environment
    pub clear_env_vars: Vec<String>,
    /// Return [`ShellError::Failed`] on a non-zero exit status
    pub raise_on_failure: bool,
    /// Kill the child once this much wall-clock time has elapsed
    pub timeout: Option<Duration>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            directory: None,
            set_env_vars: Vec::new(),
            clear_env_vars: Vec::new(),
            raise_on_failure: true,
            timeout: None,
        }
    }
}

/// Runs command lines on behalf of a repository
///
/// [`DefaultShell`] spawns real processes; [`ScriptedShell`] replays canned
/// output for tests.
pub trait Shell: Send + Sync {
    /// Run the command, streaming combined stdout/stderr to stdout.
    ///
    /// Returns the exit status of the command.
    fn execute(&self, cmd: &CommandLine, opts: &ExecOptions) -> Result<i32, ShellError>;

    /// Run the command and return its combined stdout/stderr.
    fn output_for(&self, cmd: &CommandLine, opts: &ExecOptions) -> Result<String, ShellError>;
}

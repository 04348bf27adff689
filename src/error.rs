use std::io;
use std::path::PathBuf;
use thiserror::Error;

// Import module-level errors for GitError
use crate::config::settings::ConfigError;
use crate::git::branch::BranchError;
use crate::git::commit::CommitError;
use crate::git::tag::TagError;
use crate::shell::ShellError;

/// Errors that can occur while driving the git binary
///
/// Module-specific errors (shell, branch, commit, tag, config) convert into
/// `GitError` via the `From` trait so callers can use `?` across the crate
/// while still matching on the specific cause.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("A valid repository directory is required: {0}")]
    InvalidRepoDir(PathBuf),

    #[error("Not a git repository")]
    NotARepository,

    #[error("Destination is already a git repository: {0}")]
    AlreadyARepository(PathBuf),

    #[error("Failed to clone {url:?} to {destination:?}")]
    CloneFailed { url: String, destination: PathBuf },

    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("Unexpected output from git {command}: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    #[error("Cannot parse 'git diff {refs}' output {line:?}: {reason}")]
    DiffParse {
        refs: String,
        line: String,
        reason: String,
    },

    #[error("Failed to parse git output: {0}")]
    Parse(String),

    #[error("git {found} is too old, {required} or newer is required")]
    UnsupportedGitVersion { found: String, required: String },

    #[error(transparent)]
    Shell(#[from] ShellError),

    #[error(transparent)]
    Branch(#[from] BranchError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

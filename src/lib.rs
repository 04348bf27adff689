pub mod config;
pub mod error;
pub mod git;
pub mod shell;

// Re-export commonly used types for convenience
pub use config::Settings;
pub use error::{GitError, GitResult};
pub use git::{
    Branch, BranchCollection, BranchError, Commit, CommitError, Diff, DiffStat, GitVersion,
    Repository, RepositoryOptions, Tag, TagError,
};
pub use shell::{CommandLine, DefaultShell, ExecOptions, ScriptedShell, Shell, ShellError};

use crate::error::{GitError, GitResult};
use crate::shell::{CommandLine, ExecOptions, Shell};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::debug;

static VERSION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^git version (\d+)\.(\d+)(?:\.(\d+))?").unwrap_or_else(|_| unreachable!())
});

/// Oldest git whose porcelain output this crate parses
const MIN_GIT_VERSION: (u32, u32) = (2, 0);

/// Installed git version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Run `git --version` through `shell`
    pub fn detect(shell: &dyn Shell) -> GitResult<Self> {
        Self::detect_with(shell, &ExecOptions::default())
    }

    /// Run `git --version` through `shell` with explicit options
    pub fn detect_with(shell: &dyn Shell, opts: &ExecOptions) -> GitResult<Self> {
        let output = shell.output_for(&CommandLine::git(["--version"]), opts)?;
        let version = Self::parse(&output)?;
        debug!("Detected git {}", version);
        Ok(version)
    }

    /// Parse output such as `git version 2.39.2` or
    /// `git version 2.39.2.windows.1`
    pub fn parse(version_str: &str) -> GitResult<Self> {
        let trimmed = version_str.trim();
        let caps = VERSION_LINE.captures(trimmed).ok_or_else(|| {
            GitError::Parse(format!("Unexpected git version format: {:?}", trimmed))
        })?;

        let number = |i: usize| -> GitResult<u32> {
            match caps.get(i) {
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|_| GitError::Parse(format!("Invalid version number: {}", m.as_str()))),
                None => Ok(0),
            }
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
        })
    }

    /// Whether this version meets the minimum requirement
    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) >= MIN_GIT_VERSION
    }

    /// Detect the version and fail when it is too old
    pub fn validate(shell: &dyn Shell) -> GitResult<Self> {
        let version = Self::detect(shell)?;
        if !version.is_supported() {
            return Err(GitError::UnsupportedGitVersion {
                found: version.to_string(),
                required: format!("{}.{}", MIN_GIT_VERSION.0, MIN_GIT_VERSION.1),
            });
        }
        Ok(version)
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

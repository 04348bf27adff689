use crate::error::GitResult;
use crate::git::repository::Repository;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

const BRANCH_NAME: &str = r"[#A-Za-z0-9._/+-]+";

/// One line of `git branch` output: marker, name, optional `-> target`
static BRANCH_INFO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\* |  )?({BRANCH_NAME})( -> {BRANCH_NAME})?$"))
        .unwrap_or_else(|_| unreachable!())
});

static BRANCH_FULLNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(remotes/)?({BRANCH_NAME})$")).unwrap_or_else(|_| unreachable!())
});

/// Column width used by callers that have no better idea
pub const DEFAULT_DISPLAY_WIDTH: usize = 40;

const ELLIPSIS: &str = "...";

#[derive(Debug, Error)]
pub enum BranchError {
    #[error("Unrecognized branch info: {0:?}")]
    UnrecognizedLine(String),
}

/// A local or remote branch as listed by `git branch`
///
/// Equality, ordering and hashing consider the fullname only.
#[derive(Clone)]
pub struct Branch<'r> {
    repo: &'r Repository,
    fullname: String,
    remote: bool,
}

impl<'r> Branch<'r> {
    /// Parse a `git branch -a` line, or a bare branch name
    ///
    /// A `remotes/` prefix is dropped from the fullname. The branch counts as
    /// remote when that prefix was present or the name contains a `/`.
    pub fn parse(repo: &'r Repository, line: &str) -> Result<Self, BranchError> {
        let line = line.trim_end();
        let unrecognized = || BranchError::UnrecognizedLine(line.to_string());

        let info = BRANCH_INFO.captures(line).ok_or_else(unrecognized)?;
        let listed = info.get(2).ok_or_else(unrecognized)?.as_str();
        let names = BRANCH_FULLNAME.captures(listed).ok_or_else(unrecognized)?;
        let fullname = names.get(2).ok_or_else(unrecognized)?.as_str();

        Ok(Self {
            repo,
            fullname: fullname.to_string(),
            remote: names.get(1).is_some() || fullname.contains('/'),
        })
    }

    /// Repository the branch belongs to
    pub fn repo(&self) -> &'r Repository {
        self.repo
    }

    /// Name as listed, including any remote name (`origin/master`)
    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    /// Whether this is a remote-tracking branch
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Name without the remote (`origin/master` becomes `master`)
    pub fn name(&self) -> &str {
        if self.remote {
            self.fullname
                .split_once('/')
                .map_or(self.fullname.as_str(), |(_, rest)| rest)
        } else {
            &self.fullname
        }
    }

    /// Fullname padded to `width` columns, truncated with `...` if it would
    /// not fit
    pub fn display(&self, width: usize) -> String {
        let length = self.fullname.chars().count();
        if length >= width {
            let keep = width.saturating_sub(ELLIPSIS.len());
            let shown: String = self
                .fullname
                .chars()
                .take(keep)
                .chain(ELLIPSIS.chars())
                .take(width)
                .collect();
            format!("{:<width$}", shown)
        } else {
            format!("{:<width$}", self.fullname)
        }
    }

    /// Delete the branch; remote branches are deleted by pushing to origin
    pub fn delete(&self) -> GitResult<()> {
        if self.remote {
            self.repo
                .vet_output(["push".to_string(), "origin".to_string(), format!(":{}", self.name())])
        } else {
            self.repo.vet_output(["branch", "-D", self.fullname.as_str()])
        }
    }
}

impl fmt::Display for Branch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname)
    }
}

impl fmt::Debug for Branch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Branch").field(&self.fullname).finish()
    }
}

impl PartialEq for Branch<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.fullname == other.fullname
    }
}

impl Eq for Branch<'_> {}

impl PartialOrd for Branch<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Branch<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fullname.cmp(&other.fullname)
    }
}

impl Hash for Branch<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fullname.hash(state);
    }
}

use crate::error::{GitError, GitResult};
use crate::git::repository::Repository;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::collections::BTreeMap;

static NUMSTAT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+)\s+(\S+)\s+(.+)$").unwrap_or_else(|_| unreachable!()));

/// Lines changed in one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffStat {
    pub inserted: u64,
    pub deleted: u64,
}

/// Changes between revisions, computed on first use
///
/// `refs` is one revision or two joined by a range operator such as `...`.
/// Nothing runs until [`Diff::stats`] is called; the result is cached.
pub struct Diff<'r> {
    repo: &'r Repository,
    refs: String,
    stats: OnceCell<BTreeMap<String, DiffStat>>,
}

impl<'r> Diff<'r> {
    /// Create a diff for `refs`; git is not called yet
    pub fn new(repo: &'r Repository, refs: &str) -> Self {
        Self {
            repo,
            refs: refs.to_string(),
            stats: OnceCell::new(),
        }
    }

    /// Repository the diff runs against
    pub fn repo(&self) -> &'r Repository {
        self.repo
    }

    /// Revision or range passed to `git diff`
    pub fn refs(&self) -> &str {
        &self.refs
    }

    /// Inserted and deleted line counts keyed by path
    ///
    /// Binary files have no line counts and are left out.
    pub fn stats(&self) -> GitResult<&BTreeMap<String, DiffStat>> {
        self.stats.get_or_try_init(|| {
            let output = self
                .repo
                .git_output(["diff", self.refs.as_str(), "--numstat"])?;
            parse_numstat(&self.refs, &output)
        })
    }
}

/// Parse `git diff --numstat` output
///
/// `refs` only serves to annotate errors.
pub fn parse_numstat(refs: &str, output: &str) -> GitResult<BTreeMap<String, DiffStat>> {
    let mut stats = BTreeMap::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parse_error = |reason: String| GitError::DiffParse {
            refs: refs.to_string(),
            line: line.to_string(),
            reason,
        };

        let caps = NUMSTAT_LINE
            .captures(line)
            .ok_or_else(|| parse_error("expected <inserted> <deleted> <path>".to_string()))?;
        let (inserted, deleted, path) = (&caps[1], &caps[2], &caps[3]);

        // Binary files show "-" in place of counts
        if is_marker(inserted) || is_marker(deleted) {
            continue;
        }

        let inserted = inserted
            .parse::<u64>()
            .map_err(|e| parse_error(format!("inserted count {:?}: {}", inserted, e)))?;
        let deleted = deleted
            .parse::<u64>()
            .map_err(|e| parse_error(format!("deleted count {:?}: {}", deleted, e)))?;

        stats.insert(path.to_string(), DiffStat { inserted, deleted });
    }

    Ok(stats)
}

fn is_marker(field: &str) -> bool {
    field.starts_with('+') || field.starts_with('-')
}

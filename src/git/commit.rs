use crate::git::repository::Repository;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

static COMMIT_INFO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9A-Fa-f]+) ([0-9]+) (.*)$").unwrap_or_else(|_| unreachable!()));

static COMMIT_SHA1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").unwrap_or_else(|_| unreachable!()));

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Unrecognized commit summary: {0:?}")]
    UnrecognizedSummary(String),

    #[error("Commit timestamp out of range: {0:?}")]
    InvalidTimestamp(String),
}

/// A commit summary from one line of `git log`
pub struct Commit<'r> {
    repo: &'r Repository,
    hash: String,
    timestamp: DateTime<Utc>,
    author: String,
    comment: Option<String>,
}

impl<'r> Commit<'r> {
    /// `git log` format: abbreviated hash, author time, author email
    pub const LOG_FORMAT: &'static str = "%h %at %aE";

    /// `git log` format: full hash, author time, author email
    pub const LOG_FORMAT_LONG: &'static str = "%H %at %aE";

    /// Appended to a log format to request the subject line
    pub const SUBJECT_SUFFIX: &'static str = " %s";

    /// The `--format` string matching how [`Commit::parse`] or
    /// [`Commit::parse_with_subject`] will read the output
    pub fn log_format(full_hashes: bool, subjects: bool) -> String {
        let base = if full_hashes {
            Self::LOG_FORMAT_LONG
        } else {
            Self::LOG_FORMAT
        };
        if subjects {
            format!("{}{}", base, Self::SUBJECT_SUFFIX)
        } else {
            base.to_string()
        }
    }

    /// Parse `<hash> <epoch-seconds> <author>`
    ///
    /// Everything after the timestamp is taken as the author.
    pub fn parse(repo: &'r Repository, line: &str) -> Result<Self, CommitError> {
        let (hash, timestamp, rest) = split_summary(line)?;
        Ok(Self {
            repo,
            hash,
            timestamp,
            author: rest.to_string(),
            comment: None,
        })
    }

    /// Parse `<hash> <epoch-seconds> <author-email> <subject>`
    ///
    /// Emails contain no spaces, so the author ends at the first space after
    /// the timestamp. A missing subject yields an empty comment.
    pub fn parse_with_subject(repo: &'r Repository, line: &str) -> Result<Self, CommitError> {
        let (hash, timestamp, rest) = split_summary(line)?;
        let (author, comment) = rest.split_once(' ').unwrap_or((rest, ""));
        Ok(Self {
            repo,
            hash,
            timestamp,
            author: author.to_string(),
            comment: Some(comment.to_string()),
        })
    }

    /// Whether `revision` is a full 40-character SHA rather than an
    /// abbreviation or a symbolic name
    pub fn is_sha(revision: &str) -> bool {
        COMMIT_SHA1.is_match(revision)
    }

    /// Repository the commit was read from
    pub fn repo(&self) -> &'r Repository {
        self.repo
    }

    /// Commit hash as printed by git, possibly abbreviated
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Author time
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Author time in seconds since the Unix epoch
    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }

    /// Author email, or the whole remainder when subjects were not requested
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Subject line, present only when the log was requested with subjects
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

fn split_summary(line: &str) -> Result<(String, DateTime<Utc>, &str), CommitError> {
    let caps = COMMIT_INFO
        .captures(line)
        .ok_or_else(|| CommitError::UnrecognizedSummary(line.to_string()))?;

    let timestamp = caps[2]
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| CommitError::InvalidTimestamp(caps[2].to_string()))?;

    let rest = caps.get(3).map_or("", |m| m.as_str());
    Ok((caps[1].to_string(), timestamp, rest))
}

impl Clone for Commit<'_> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo,
            hash: self.hash.clone(),
            timestamp: self.timestamp,
            author: self.author.clone(),
            comment: self.comment.clone(),
        }
    }
}

impl PartialEq for Commit<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.timestamp == other.timestamp
            && self.author == other.author
            && self.comment == other.comment
    }
}

impl fmt::Debug for Commit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commit")
            .field("hash", &self.hash)
            .field("timestamp", &self.timestamp.timestamp())
            .field("author", &self.author)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::scripted_repo;
    use crate::shell::ScriptedShell;
    use chrono::TimeZone;

    #[test]
    fn test_parse_summary() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());
        let commit = Commit::parse(&repo, "abc1234 1609459200 dev@example.com").unwrap();

        assert_eq!(commit.hash(), "abc1234");
        assert_eq!(commit.epoch_seconds(), 1_609_459_200);
        assert_eq!(
            commit.timestamp(),
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(commit.author(), "dev@example.com");
        assert_eq!(commit.comment(), None);
    }

    #[test]
    fn test_parse_keeps_rest_as_author() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());
        let commit = Commit::parse(&repo, "ABCDEF0 42 Jane Q. Developer").unwrap();

        assert_eq!(commit.hash(), "ABCDEF0");
        assert_eq!(commit.epoch_seconds(), 42);
        assert_eq!(commit.author(), "Jane Q. Developer");
    }

    #[test]
    fn test_parse_with_subject() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());
        let commit =
            Commit::parse_with_subject(&repo, "abc1234 1609459200 dev@example.com Fix the build")
                .unwrap();

        assert_eq!(commit.author(), "dev@example.com");
        assert_eq!(commit.comment(), Some("Fix the build"));
    }

    #[test]
    fn test_parse_with_empty_subject() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());
        let commit = Commit::parse_with_subject(&repo, "abc1234 1 dev@example.com").unwrap();

        assert_eq!(commit.author(), "dev@example.com");
        assert_eq!(commit.comment(), Some(""));
    }

    #[test]
    fn test_parse_malformed_lines() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());

        for line in [
            "",
            "abc1234",
            "abc1234 1609459200",
            "abc1234 notanumber dev@example.com",
            "xyz1234 1609459200 dev@example.com",
            "abc1234 -5 dev@example.com",
        ] {
            assert!(
                matches!(Commit::parse(&repo, line), Err(CommitError::UnrecognizedSummary(_))),
                "expected failure for {line:?}"
            );
        }
    }

    #[test]
    fn test_parse_timestamp_overflow() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());
        let result = Commit::parse(&repo, "abc1234 99999999999999999999 dev@example.com");

        assert!(matches!(result, Err(CommitError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_log_format() {
        assert_eq!(Commit::log_format(false, false), "%h %at %aE");
        assert_eq!(Commit::log_format(true, false), "%H %at %aE");
        assert_eq!(Commit::log_format(false, true), "%h %at %aE %s");
        assert_eq!(Commit::log_format(true, true), "%H %at %aE %s");
    }

    #[test]
    fn test_is_sha() {
        assert!(Commit::is_sha("0123456789abcdef0123456789ABCDEF01234567"));
        assert!(!Commit::is_sha("abc1234"));
        assert!(!Commit::is_sha("master"));
        assert!(!Commit::is_sha("0123456789abcdef0123456789abcdef012345678"));
        assert!(!Commit::is_sha("g123456789abcdef0123456789abcdef01234567"));
    }

    #[test]
    fn test_debug_form() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());
        let commit = Commit::parse(&repo, "abc1234 7 dev@example.com").unwrap();

        assert_eq!(
            format!("{:?}", commit),
            "Commit { hash: \"abc1234\", timestamp: 7, author: \"dev@example.com\", .. }"
        );
    }
}

use crate::error::GitResult;
use crate::git::repository::Repository;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

// Whitespace and file-system special characters. git itself is stricter;
// this only rejects names that could never be tags.
static INVALID_TAG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s|[:\\?*<>|]"#).unwrap_or_else(|_| unreachable!()));

#[derive(Debug, Error)]
pub enum TagError {
    #[error("Tag name is invalid: {0:?}")]
    InvalidName(String),
}

/// A tag in the repository
#[derive(Clone)]
pub struct Tag<'r> {
    repo: &'r Repository,
    name: String,
}

impl<'r> Tag<'r> {
    /// Validate `name` and build a tag value; git is not called
    pub fn new(repo: &'r Repository, name: &str) -> Result<Self, TagError> {
        if INVALID_TAG_CHARS.is_match(name) {
            return Err(TagError::InvalidName(name.to_string()));
        }
        Ok(Self {
            repo,
            name: name.to_string(),
        })
    }

    /// Repository the tag belongs to
    pub fn repo(&self) -> &'r Repository {
        self.repo
    }

    /// Tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delete the tag locally with `git tag -d`
    pub fn delete(&self) -> GitResult<()> {
        self.repo.vet_output(["tag", "-d", self.name.as_str()])
    }
}

impl fmt::Display for Tag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Tag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tag").field(&self.name).finish()
    }
}

impl PartialEq for Tag<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag<'_> {}

impl PartialOrd for Tag<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for Tag<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::scripted_repo;
    use crate::shell::ScriptedShell;

    #[test]
    fn test_valid_names() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());

        for name in ["v1.0", "release-2013_07", "feature/tag", "a+b#c", "ünïcode"] {
            let tag = Tag::new(&repo, name).unwrap();
            assert_eq!(tag.name(), name);
            assert_eq!(tag.to_string(), name);
        }
    }

    #[test]
    fn test_invalid_names() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());

        for name in [
            "has space", "tab\there", "line\nbreak", "a:b", "a\\b", "a?b", "a*b", "a<b", "a>b",
            "a|b",
        ] {
            assert!(
                matches!(Tag::new(&repo, name), Err(TagError::InvalidName(_))),
                "expected failure for {name:?}"
            );
        }
    }

    #[test]
    fn test_equality_and_ordering() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());
        let a = Tag::new(&repo, "v1.0").unwrap();
        let b = Tag::new(&repo, "v1.1").unwrap();

        assert_eq!(a, Tag::new(&repo, "v1.0").unwrap());
        assert_ne!(a, b);
        assert!(a < b);

        let mut tags = vec![b.clone(), a.clone()];
        tags.sort();
        assert_eq!(tags, vec![a, b]);
    }

    #[test]
    fn test_debug_form() {
        let (_shell, repo) = scripted_repo(ScriptedShell::new());
        let tag = Tag::new(&repo, "v2").unwrap();

        assert_eq!(format!("{:?}", tag), "Tag(\"v2\")");
    }

    #[test]
    fn test_delete() {
        let (shell, repo) =
            scripted_repo(ScriptedShell::new().reply("git tag -d v1.0", "Deleted tag 'v1.0'\n"));
        let tag = Tag::new(&repo, "v1.0").unwrap();

        tag.delete().unwrap();
        assert_eq!(shell.commands(), vec!["git tag -d v1.0"]);
    }
}

use crate::error::{GitError, GitResult};
use crate::git::branch::{Branch, BranchError};
use crate::git::repository::Repository;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::{Bound, Index, RangeBounds};

/// `* (no branch)`, `* (detached from v1.0)` and friends
static NOT_A_BRANCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\* \(.*\)$").unwrap_or_else(|_| unreachable!()));

static HEAD_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^refs/heads/(.+)$").unwrap_or_else(|_| unreachable!()));

/// An ordered list of branches with git-aware filters
///
/// Filters return new collections; a collection is never mutated once built.
/// Order is the order git listed the branches in.
#[derive(Clone)]
pub struct BranchCollection<'r> {
    repo: &'r Repository,
    branches: Vec<Branch<'r>>,
}

impl<'r> BranchCollection<'r> {
    /// Enumerate every local and remote branch with `git branch -a`
    pub fn load(repo: &'r Repository) -> GitResult<Self> {
        let output = repo.git_output(["branch", "-a"])?;
        Ok(Self::from_branches(repo, parse_listing(repo, &output)?))
    }

    /// Wrap an already parsed list without calling git
    pub fn from_branches(repo: &'r Repository, branches: Vec<Branch<'r>>) -> Self {
        Self { repo, branches }
    }

    /// Repository the branches belong to
    pub fn repo(&self) -> &'r Repository {
        self.repo
    }

    /// Only local branches
    pub fn local(&self) -> Self {
        self.filter(|branch| !branch.is_remote())
    }

    /// Only remote-tracking branches
    pub fn remote(&self) -> Self {
        self.filter(Branch::is_remote)
    }

    /// Members of this collection reachable from `revision`
    pub fn merged(&self, revision: &str) -> GitResult<Self> {
        let output = self.repo.git_output(["branch", "-a", "--merged", revision])?;
        let all_merged = parse_listing(self.repo, &output)?;

        Ok(self.filter(|candidate| all_merged.iter().any(|merged| merged == candidate)))
    }

    /// The checked-out branch, if HEAD points at a member of this collection
    ///
    /// Returns `None` for a detached HEAD.
    pub fn current(&self) -> GitResult<Option<&Branch<'r>>> {
        let output = self.repo.git_output_unchecked(["symbolic-ref", "HEAD"])?;
        let lines: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let unexpected = || GitError::UnexpectedOutput {
            command: "symbolic-ref HEAD".to_string(),
            output: output.clone(),
        };

        let [line] = lines.as_slice() else {
            return Err(unexpected());
        };

        if let Some(caps) = HEAD_REF.captures(line) {
            let name = &caps[1];
            Ok(self.branches.iter().find(|branch| branch.fullname() == name))
        } else if line.contains("not a symbolic ref") {
            Ok(None)
        } else {
            Err(unexpected())
        }
    }

    /// Look up a member by branch name (`master`, `remotes/origin/master`)
    pub fn find(&self, name: &str) -> Result<Option<&Branch<'r>>, BranchError> {
        let target = Branch::parse(self.repo, name)?;
        Ok(self.branches.iter().find(|branch| **branch == target))
    }

    /// Branch at `index`, if any
    pub fn get(&self, index: usize) -> Option<&Branch<'r>> {
        self.branches.get(index)
    }

    /// Positional sub-collection, `None` when the range is out of bounds
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Option<Self> {
        let bounds: (Bound<usize>, Bound<usize>) =
            (range.start_bound().cloned(), range.end_bound().cloned());
        self.branches
            .get(bounds)
            .map(|branches| Self::from_branches(self.repo, branches.to_vec()))
    }

    /// Number of branches
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Whether the collection has no branches
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// First branch in listing order
    pub fn first(&self) -> Option<&Branch<'r>> {
        self.branches.first()
    }

    /// Last branch in listing order
    pub fn last(&self) -> Option<&Branch<'r>> {
        self.branches.last()
    }

    /// Whether a branch with the same fullname is a member
    pub fn contains(&self, branch: &Branch<'_>) -> bool {
        self.branches.iter().any(|member| member.fullname() == branch.fullname())
    }

    /// Iterate in listing order
    pub fn iter(&self) -> std::slice::Iter<'_, Branch<'r>> {
        self.branches.iter()
    }

    /// Members matching `predicate`, as a new collection
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Branch<'r>) -> bool,
    {
        let branches = self
            .branches
            .iter()
            .filter(|branch| predicate(branch))
            .cloned()
            .collect();
        Self::from_branches(self.repo, branches)
    }

    /// Apply `f` to every member
    pub fn map<T, F>(&self, f: F) -> Vec<T>
    where
        F: FnMut(&Branch<'r>) -> T,
    {
        self.branches.iter().map(f).collect()
    }

    /// Sorted by fullname
    pub fn sorted(&self) -> Self {
        let mut branches = self.branches.clone();
        branches.sort();
        Self::from_branches(self.repo, branches)
    }

    /// Fullnames in listing order
    pub fn fullnames(&self) -> Vec<&str> {
        self.branches.iter().map(Branch::fullname).collect()
    }

    /// Unwrap into the underlying list
    pub fn into_vec(self) -> Vec<Branch<'r>> {
        self.branches
    }
}

/// Parse `git branch` output, skipping placeholder lines for a detached HEAD
fn parse_listing<'r>(repo: &'r Repository, output: &str) -> Result<Vec<Branch<'r>>, BranchError> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !NOT_A_BRANCH.is_match(line))
        .map(|line| Branch::parse(repo, line))
        .collect()
}

impl<'r> Index<usize> for BranchCollection<'r> {
    type Output = Branch<'r>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.branches[index]
    }
}

impl<'a, 'r> IntoIterator for &'a BranchCollection<'r> {
    type Item = &'a Branch<'r>;
    type IntoIter = std::slice::Iter<'a, Branch<'r>>;

    fn into_iter(self) -> Self::IntoIter {
        self.branches.iter()
    }
}

impl<'r> IntoIterator for BranchCollection<'r> {
    type Item = Branch<'r>;
    type IntoIter = std::vec::IntoIter<Branch<'r>>;

    fn into_iter(self) -> Self::IntoIter {
        self.branches.into_iter()
    }
}

impl fmt::Display for BranchCollection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.fullnames().join(", "))
    }
}

impl fmt::Debug for BranchCollection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BranchCollection").field(&self.branches).finish()
    }
}
